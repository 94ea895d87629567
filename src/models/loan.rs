//! Loan (borrow) model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::enums::LoanStatus;
use super::interval::DateRange;

/// Loan model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i32,
    pub loan_request_id: i32,
    pub item_id: i32,
    pub borrower_id: i32,
    pub start_date: NaiveDate,
    /// Day the item is due back
    pub end_date: NaiveDate,
    pub actual_return_date: Option<NaiveDate>,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.start_date,
            end: self.end_date,
        }
    }

    /// Active loan whose due date has passed
    pub fn is_past_due(&self, today: NaiveDate) -> bool {
        self.status == LoanStatus::Active && self.end_date < today
    }
}

/// Return loan request
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ReturnLoan {
    /// Defaults to today
    pub actual_return_date: Option<NaiveDate>,
}

/// Insert payload for the store
#[derive(Debug, Clone)]
pub struct NewLoan {
    pub loan_request_id: i32,
    pub item_id: i32,
    pub borrower_id: i32,
    pub range: DateRange,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct LoanFilter {
    pub item_id: Option<i32>,
    pub borrower_id: Option<i32>,
    /// Owner of the lent item
    pub owner_id: Option<i32>,
    /// Borrower or owner
    pub participant_id: Option<i32>,
    pub status: Option<LoanStatus>,
}
