//! Availability window model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::enums::AvailabilityStatus;
use super::interval::DateRange;

/// A window during which an item is offered for loan
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ItemAvailability {
    pub id: i32,
    pub item_id: i32,
    /// First offered day
    pub start_date: NaiveDate,
    /// First day after the window
    pub end_date: NaiveDate,
    pub status: AvailabilityStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ItemAvailability {
    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.start_date,
            end: self.end_date,
        }
    }
}

/// Publish availability request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateAvailability {
    /// Start date (YYYY-MM-DD)
    pub start_date: NaiveDate,
    /// End date (YYYY-MM-DD), exclusive
    pub end_date: NaiveDate,
    pub status: Option<AvailabilityStatus>,
}

/// Update availability request
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateAvailability {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<AvailabilityStatus>,
}

/// Insert payload for the store
#[derive(Debug, Clone)]
pub struct NewAvailability {
    pub item_id: i32,
    pub range: DateRange,
    pub status: AvailabilityStatus,
}

/// Date range query parameters (`start_date` / `end_date`)
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct RangeQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Availability check response
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AvailabilityCheck {
    pub item_id: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub available: bool,
    /// Window that would host a loan for this range
    pub availability_id: Option<i32>,
}
