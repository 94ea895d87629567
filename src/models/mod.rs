//! Data models for Lendhood

pub mod availability;
pub mod enums;
pub mod interval;
pub mod item;
pub mod loan;
pub mod loan_request;
pub mod slot;
pub mod user;

// Re-export commonly used types
pub use availability::ItemAvailability;
pub use enums::{AvailabilityStatus, LoanRequestStatus, LoanStatus, SlotStatus};
pub use interval::{overlaps, DateRange};
pub use item::Item;
pub use loan::Loan;
pub use loan_request::LoanRequest;
pub use slot::ItemAvailabilitySlot;
pub use user::UserClaims;
