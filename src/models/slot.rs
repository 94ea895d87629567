//! Availability slot model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::enums::SlotStatus;
use super::interval::DateRange;

/// A concrete sub-range of an availability window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ItemAvailabilitySlot {
    pub id: i32,
    pub availability_id: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: SlotStatus,
    /// Request whose acceptance produced this slot
    pub loan_request_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ItemAvailabilitySlot {
    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.start_date,
            end: self.end_date,
        }
    }
}

/// Create slot request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateSlot {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Defaults to `reserved` (owner blocks the dates)
    pub status: Option<SlotStatus>,
}

/// Update slot request
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateSlot {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<SlotStatus>,
}

/// Insert payload for the store
#[derive(Debug, Clone)]
pub struct NewSlot {
    pub availability_id: i32,
    pub range: DateRange,
    pub status: SlotStatus,
    pub loan_request_id: Option<i32>,
}

/// Slot filter set; unset fields match everything
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct SlotFilter {
    pub availability_id: Option<i32>,
    pub item_id: Option<i32>,
    pub loan_request_id: Option<i32>,
    pub status: Option<SlotStatus>,
}

impl SlotFilter {
    pub fn for_availability(availability_id: i32) -> Self {
        Self {
            availability_id: Some(availability_id),
            ..Default::default()
        }
    }

    pub fn for_item(item_id: i32) -> Self {
        Self {
            item_id: Some(item_id),
            ..Default::default()
        }
    }

    pub fn for_loan_request(loan_request_id: i32) -> Self {
        Self {
            loan_request_id: Some(loan_request_id),
            ..Default::default()
        }
    }
}

/// Slot conflict query parameters
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct SlotConflictQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub exclude_slot_id: Option<i32>,
}
