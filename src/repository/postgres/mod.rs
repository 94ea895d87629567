//! PostgreSQL-backed store

mod availabilities;
mod items;
mod loan_requests;
mod loans;
mod slots;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres, Transaction};

use super::{LendingStore, LendingTx, MembershipDirectory};
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

#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl LendingStore for PgStore {
    async fn begin(&self) -> AppResult<Box<dyn LendingTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }
}

/// One database transaction; rolled back by sqlx on drop unless committed
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LendingTx for PgTx {
    // ---- Items ----

    async fn items_insert(&mut self, owner_id: i32, data: &CreateItem) -> AppResult<Item> {
        items::insert(&mut self.tx, owner_id, data).await
    }

    async fn items_get(&mut self, id: i32) -> AppResult<Option<Item>> {
        items::get(&mut self.tx, id, false).await
    }

    async fn items_lock(&mut self, id: i32) -> AppResult<Option<Item>> {
        items::get(&mut self.tx, id, true).await
    }

    async fn items_list(&mut self, query: &ItemQuery) -> AppResult<Vec<Item>> {
        items::list(&mut self.tx, query).await
    }

    async fn items_update(&mut self, id: i32, data: &UpdateItem) -> AppResult<Item> {
        items::update(&mut self.tx, id, data).await
    }

    async fn items_delete(&mut self, id: i32) -> AppResult<()> {
        items::delete(&mut self.tx, id).await
    }

    // ---- Availability windows ----

    async fn availabilities_insert(&mut self, data: &NewAvailability) -> AppResult<ItemAvailability> {
        availabilities::insert(&mut self.tx, data).await
    }

    async fn availabilities_get(&mut self, id: i32) -> AppResult<Option<ItemAvailability>> {
        availabilities::get(&mut self.tx, id).await
    }

    async fn availabilities_list_by_item(&mut self, item_id: i32) -> AppResult<Vec<ItemAvailability>> {
        availabilities::list_by_item(&mut self.tx, item_id).await
    }

    async fn availabilities_update(&mut self, availability: &ItemAvailability) -> AppResult<ItemAvailability> {
        availabilities::update(&mut self.tx, availability).await
    }

    async fn availabilities_delete(&mut self, id: i32) -> AppResult<()> {
        availabilities::delete(&mut self.tx, id).await
    }

    // ---- Slots ----

    async fn slots_insert(&mut self, data: &NewSlot) -> AppResult<ItemAvailabilitySlot> {
        slots::insert(&mut self.tx, data).await
    }

    async fn slots_get(&mut self, id: i32) -> AppResult<Option<ItemAvailabilitySlot>> {
        slots::get(&mut self.tx, id).await
    }

    async fn slots_list(&mut self, filter: &SlotFilter) -> AppResult<Vec<ItemAvailabilitySlot>> {
        slots::list(&mut self.tx, filter).await
    }

    async fn slots_update(&mut self, slot: &ItemAvailabilitySlot) -> AppResult<ItemAvailabilitySlot> {
        slots::update(&mut self.tx, slot).await
    }

    async fn slots_set_status(&mut self, id: i32, status: SlotStatus) -> AppResult<ItemAvailabilitySlot> {
        slots::set_status(&mut self.tx, id, status).await
    }

    async fn slots_delete(&mut self, id: i32) -> AppResult<()> {
        slots::delete(&mut self.tx, id).await
    }

    // ---- Loan requests ----

    async fn loan_requests_insert(&mut self, data: &NewLoanRequest) -> AppResult<LoanRequest> {
        loan_requests::insert(&mut self.tx, data).await
    }

    async fn loan_requests_get(&mut self, id: i32) -> AppResult<Option<LoanRequest>> {
        loan_requests::get(&mut self.tx, id, false).await
    }

    async fn loan_requests_lock(&mut self, id: i32) -> AppResult<Option<LoanRequest>> {
        loan_requests::get(&mut self.tx, id, true).await
    }

    async fn loan_requests_list(&mut self, filter: &LoanRequestFilter) -> AppResult<Vec<LoanRequest>> {
        loan_requests::list(&mut self.tx, filter).await
    }

    async fn loan_requests_set_status(&mut self, id: i32, status: LoanRequestStatus) -> AppResult<LoanRequest> {
        loan_requests::set_status(&mut self.tx, id, status).await
    }

    async fn loan_requests_delete(&mut self, id: i32) -> AppResult<()> {
        loan_requests::delete(&mut self.tx, id).await
    }

    // ---- Loans ----

    async fn loans_insert(&mut self, data: &NewLoan) -> AppResult<Loan> {
        loans::insert(&mut self.tx, data).await
    }

    async fn loans_get(&mut self, id: i32) -> AppResult<Option<Loan>> {
        loans::get(&mut self.tx, id, false).await
    }

    async fn loans_lock(&mut self, id: i32) -> AppResult<Option<Loan>> {
        loans::get(&mut self.tx, id, true).await
    }

    async fn loans_list(&mut self, filter: &LoanFilter) -> AppResult<Vec<Loan>> {
        loans::list(&mut self.tx, filter).await
    }

    async fn loans_update(&mut self, loan: &Loan) -> AppResult<Loan> {
        loans::update(&mut self.tx, loan).await
    }

    async fn loans_mark_overdue(&mut self, id: i32, today: NaiveDate) -> AppResult<Option<Loan>> {
        loans::mark_overdue(&mut self.tx, id, today).await
    }

    async fn loans_delete(&mut self, id: i32) -> AppResult<()> {
        loans::delete(&mut self.tx, id).await
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Membership
// ---------------------------------------------------------------------------

/// Reads the platform's `neighborhood_members` table
#[derive(Clone)]
pub struct PgMembership {
    pool: Pool<Postgres>,
}

impl PgMembership {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipDirectory for PgMembership {
    async fn is_member(&self, user_id: i32, neighborhood_id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM neighborhood_members WHERE user_id = $1 AND neighborhood_id = $2)",
        )
        .bind(user_id)
        .bind(neighborhood_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}
