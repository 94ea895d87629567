//! Status enums for the lending scheduler (stored as PostgreSQL enum types)

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// AvailabilityStatus
// ---------------------------------------------------------------------------

/// Status of an availability window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "availability_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    Available,
    PartiallyBooked,
    Unavailable,
}

impl AvailabilityStatus {
    /// Whether loans may be placed inside a window with this status
    pub fn is_bookable(&self) -> bool {
        !matches!(self, AvailabilityStatus::Unavailable)
    }
}

impl Default for AvailabilityStatus {
    fn default() -> Self {
        AvailabilityStatus::Available
    }
}

impl std::fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AvailabilityStatus::Available => "available",
            AvailabilityStatus::PartiallyBooked => "partially_booked",
            AvailabilityStatus::Unavailable => "unavailable",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// SlotStatus
// ---------------------------------------------------------------------------

/// Status of a slot inside an availability window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "slot_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Available,
    Reserved,
    Occupied,
}

impl SlotStatus {
    /// Reserved and occupied slots make their dates unavailable
    pub fn blocks_dates(&self) -> bool {
        matches!(self, SlotStatus::Reserved | SlotStatus::Occupied)
    }
}

impl Default for SlotStatus {
    fn default() -> Self {
        SlotStatus::Available
    }
}

impl std::fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SlotStatus::Available => "available",
            SlotStatus::Reserved => "reserved",
            SlotStatus::Occupied => "occupied",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// LoanRequestStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "loan_request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LoanRequestStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

impl LoanRequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoanRequestStatus::Pending)
    }
}

impl std::fmt::Display for LoanRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LoanRequestStatus::Pending => "pending",
            LoanRequestStatus::Accepted => "accepted",
            LoanRequestStatus::Rejected => "rejected",
            LoanRequestStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// LoanStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "loan_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Active,
    PendingReturn,
    Returned,
    Overdue,
}

impl LoanStatus {
    /// Loan not yet closed: the item is still out and its dates stay blocked
    pub fn is_outstanding(&self) -> bool {
        !matches!(self, LoanStatus::Returned)
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LoanStatus::Active => "active",
            LoanStatus::PendingReturn => "pending_return",
            LoanStatus::Returned => "returned",
            LoanStatus::Overdue => "overdue",
        };
        write!(f, "{}", label)
    }
}
