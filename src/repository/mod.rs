//! Repository layer for database operations.
//!
//! Every service operation runs inside one [`LendingTx`] obtained from a
//! [`LendingStore`]. A transaction is discarded unless [`LendingTx::commit`]
//! is called, so an early `?` return rolls back everything written so far.
//!
//! `*_lock` reads take a row lock for the rest of the transaction. Scheduling
//! writes lock the item row first, which serializes concurrent accepts and
//! slot writes for the same item.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    error::AppResult,
    models::{
        availability::{ItemAvailability, NewAvailability},
        enums::{LoanRequestStatus, SlotStatus},
        item::{CreateItem, Item, ItemQuery, UpdateItem},
        loan::{Loan, LoanFilter, NewLoan},
        loan_request::{LoanRequest, LoanRequestFilter, NewLoanRequest},
        slot::{ItemAvailabilitySlot, NewSlot, SlotFilter},
    },
};

pub use memory::{MemoryMembership, MemoryStore};
pub use postgres::{PgMembership, PgStore};

#[async_trait]
pub trait LendingStore: Send + Sync {
    async fn begin(&self) -> AppResult<Box<dyn LendingTx>>;
}

#[async_trait]
pub trait LendingTx: Send {
    // ---- Items ----
    async fn items_insert(&mut self, owner_id: i32, data: &CreateItem) -> AppResult<Item>;
    async fn items_get(&mut self, id: i32) -> AppResult<Option<Item>>;
    async fn items_lock(&mut self, id: i32) -> AppResult<Option<Item>>;
    async fn items_list(&mut self, query: &ItemQuery) -> AppResult<Vec<Item>>;
    async fn items_update(&mut self, id: i32, data: &UpdateItem) -> AppResult<Item>;
    async fn items_delete(&mut self, id: i32) -> AppResult<()>;

    // ---- Availability windows ----
    async fn availabilities_insert(&mut self, data: &NewAvailability) -> AppResult<ItemAvailability>;
    async fn availabilities_get(&mut self, id: i32) -> AppResult<Option<ItemAvailability>>;
    /// Windows of an item ordered by start date
    async fn availabilities_list_by_item(&mut self, item_id: i32) -> AppResult<Vec<ItemAvailability>>;
    async fn availabilities_update(&mut self, availability: &ItemAvailability) -> AppResult<ItemAvailability>;
    async fn availabilities_delete(&mut self, id: i32) -> AppResult<()>;

    // ---- Slots ----
    async fn slots_insert(&mut self, data: &NewSlot) -> AppResult<ItemAvailabilitySlot>;
    async fn slots_get(&mut self, id: i32) -> AppResult<Option<ItemAvailabilitySlot>>;
    /// Slots matching the filter ordered by start date
    async fn slots_list(&mut self, filter: &SlotFilter) -> AppResult<Vec<ItemAvailabilitySlot>>;
    async fn slots_update(&mut self, slot: &ItemAvailabilitySlot) -> AppResult<ItemAvailabilitySlot>;
    async fn slots_set_status(&mut self, id: i32, status: SlotStatus) -> AppResult<ItemAvailabilitySlot>;
    async fn slots_delete(&mut self, id: i32) -> AppResult<()>;

    // ---- Loan requests ----
    async fn loan_requests_insert(&mut self, data: &NewLoanRequest) -> AppResult<LoanRequest>;
    async fn loan_requests_get(&mut self, id: i32) -> AppResult<Option<LoanRequest>>;
    async fn loan_requests_lock(&mut self, id: i32) -> AppResult<Option<LoanRequest>>;
    /// Requests matching the filter, newest first
    async fn loan_requests_list(&mut self, filter: &LoanRequestFilter) -> AppResult<Vec<LoanRequest>>;
    async fn loan_requests_set_status(&mut self, id: i32, status: LoanRequestStatus) -> AppResult<LoanRequest>;
    async fn loan_requests_delete(&mut self, id: i32) -> AppResult<()>;

    // ---- Loans ----
    async fn loans_insert(&mut self, data: &NewLoan) -> AppResult<Loan>;
    async fn loans_get(&mut self, id: i32) -> AppResult<Option<Loan>>;
    async fn loans_lock(&mut self, id: i32) -> AppResult<Option<Loan>>;
    /// Loans matching the filter ordered by end date
    async fn loans_list(&mut self, filter: &LoanFilter) -> AppResult<Vec<Loan>>;
    async fn loans_update(&mut self, loan: &Loan) -> AppResult<Loan>;
    /// ACTIVE -> OVERDUE when `end_date < today`, checked against the current
    /// row; `None` when the loan no longer qualifies
    async fn loans_mark_overdue(&mut self, id: i32, today: NaiveDate) -> AppResult<Option<Loan>>;
    async fn loans_delete(&mut self, id: i32) -> AppResult<()>;

    async fn commit(self: Box<Self>) -> AppResult<()>;
}

/// Neighborhood membership, owned by the wider platform
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MembershipDirectory: Send + Sync {
    async fn is_member(&self, user_id: i32, neighborhood_id: i32) -> AppResult<bool>;
}
