//! Loan request (borrow proposal) model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::LoanRequestStatus;
use super::interval::DateRange;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoanRequest {
    pub id: i32,
    pub item_id: i32,
    pub borrower_id: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub message: Option<String>,
    pub status: LoanRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LoanRequest {
    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.start_date,
            end: self.end_date,
        }
    }
}

/// Create loan request payload
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateLoanRequest {
    pub item_id: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[validate(length(max = 1000, message = "Message is limited to 1000 characters"))]
    pub message: Option<String>,
}

/// Insert payload for the store
#[derive(Debug, Clone)]
pub struct NewLoanRequest {
    pub item_id: i32,
    pub borrower_id: i32,
    pub range: DateRange,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct LoanRequestFilter {
    pub item_id: Option<i32>,
    pub borrower_id: Option<i32>,
    /// Owner of the requested item
    pub owner_id: Option<i32>,
    pub status: Option<LoanRequestStatus>,
}
