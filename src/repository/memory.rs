//! In-process store
//!
//! Keeps every table in ordered maps behind one async mutex. A transaction
//! holds the mutex for its whole lifetime and works on a private copy of the
//! state, which replaces the shared state on commit. Dropping an uncommitted
//! transaction discards the copy.

use std::{
    collections::{BTreeMap, HashSet},
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{LendingStore, LendingTx, MembershipDirectory};
use crate::{
    error::{AppError, AppResult, ErrorCode},
    models::{
        availability::{ItemAvailability, NewAvailability},
        enums::{LoanRequestStatus, LoanStatus, SlotStatus},
        item::{CreateItem, Item, ItemQuery, UpdateItem},
        loan::{Loan, LoanFilter, NewLoan},
        loan_request::{LoanRequest, LoanRequestFilter, NewLoanRequest},
        slot::{ItemAvailabilitySlot, NewSlot, SlotFilter},
    },
};

#[derive(Debug, Clone)]
struct Table<T> {
    rows: BTreeMap<i32, T>,
    last_id: i32,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<T> Table<T> {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    fn remove(&mut self, id: i32, entity: &str) -> AppResult<T> {
        self.rows
            .remove(&id)
            .ok_or_else(|| AppError::not_found(entity, id))
    }
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    items: Table<Item>,
    availabilities: Table<ItemAvailability>,
    slots: Table<ItemAvailabilitySlot>,
    loan_requests: Table<LoanRequest>,
    loans: Table<Loan>,
}

impl MemoryState {
    fn item_owner(&self, item_id: i32) -> Option<i32> {
        self.items.rows.get(&item_id).map(|item| item.owner_id)
    }

    fn slot_matches(&self, slot: &ItemAvailabilitySlot, filter: &SlotFilter) -> bool {
        let item_matches = filter.item_id.map_or(true, |item_id| {
            self.availabilities
                .rows
                .get(&slot.availability_id)
                .is_some_and(|a| a.item_id == item_id)
        });
        item_matches
            && filter.availability_id.map_or(true, |id| slot.availability_id == id)
            && filter.loan_request_id.map_or(true, |id| slot.loan_request_id == Some(id))
            && filter.status.map_or(true, |status| slot.status == status)
    }

    /// Same rule as the `no_overlapping_slots` exclusion constraint
    fn ensure_no_slot_overlap(&self, candidate: &ItemAvailabilitySlot) -> AppResult<()> {
        let clash = self.slots.rows.values().any(|other| {
            other.id != candidate.id
                && other.availability_id == candidate.availability_id
                && other.range().overlaps(&candidate.range())
        });
        if clash {
            return Err(AppError::Conflict(
                ErrorCode::SlotOverlap,
                "Slot overlaps another slot of the same availability".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LendingStore for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn LendingTx>> {
        let guard = self.state.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryTx { guard, work }))
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    work: MemoryState,
}

#[async_trait]
impl LendingTx for MemoryTx {
    // ---- Items ----

    async fn items_insert(&mut self, owner_id: i32, data: &CreateItem) -> AppResult<Item> {
        let id = self.work.items.next_id();
        let item = Item {
            id,
            name: data.name.clone(),
            description: data.description.clone(),
            category: data.category.clone(),
            image_url: data.image_url.clone(),
            owner_id,
            neighborhood_id: data.neighborhood_id,
            created_at: Utc::now(),
        };
        self.work.items.rows.insert(id, item.clone());
        Ok(item)
    }

    async fn items_get(&mut self, id: i32) -> AppResult<Option<Item>> {
        Ok(self.work.items.rows.get(&id).cloned())
    }

    async fn items_lock(&mut self, id: i32) -> AppResult<Option<Item>> {
        self.items_get(id).await
    }

    async fn items_list(&mut self, query: &ItemQuery) -> AppResult<Vec<Item>> {
        Ok(self
            .work
            .items
            .rows
            .values()
            .rev()
            .filter(|item| query.matches(item))
            .cloned()
            .collect())
    }

    async fn items_update(&mut self, id: i32, data: &UpdateItem) -> AppResult<Item> {
        let item = self
            .work
            .items
            .rows
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Item", id))?;
        if let Some(ref name) = data.name {
            item.name = name.clone();
        }
        if data.description.is_some() {
            item.description = data.description.clone();
        }
        if data.category.is_some() {
            item.category = data.category.clone();
        }
        if data.image_url.is_some() {
            item.image_url = data.image_url.clone();
        }
        Ok(item.clone())
    }

    async fn items_delete(&mut self, id: i32) -> AppResult<()> {
        self.work.items.remove(id, "Item").map(|_| ())
    }

    // ---- Availability windows ----

    async fn availabilities_insert(&mut self, data: &NewAvailability) -> AppResult<ItemAvailability> {
        let id = self.work.availabilities.next_id();
        let now = Utc::now();
        let availability = ItemAvailability {
            id,
            item_id: data.item_id,
            start_date: data.range.start,
            end_date: data.range.end,
            status: data.status,
            created_at: now,
            updated_at: now,
        };
        self.work.availabilities.rows.insert(id, availability.clone());
        Ok(availability)
    }

    async fn availabilities_get(&mut self, id: i32) -> AppResult<Option<ItemAvailability>> {
        Ok(self.work.availabilities.rows.get(&id).cloned())
    }

    async fn availabilities_list_by_item(&mut self, item_id: i32) -> AppResult<Vec<ItemAvailability>> {
        let mut windows: Vec<ItemAvailability> = self
            .work
            .availabilities
            .rows
            .values()
            .filter(|a| a.item_id == item_id)
            .cloned()
            .collect();
        windows.sort_by_key(|a| (a.start_date, a.id));
        Ok(windows)
    }

    async fn availabilities_update(&mut self, availability: &ItemAvailability) -> AppResult<ItemAvailability> {
        let row = self
            .work
            .availabilities
            .rows
            .get_mut(&availability.id)
            .ok_or_else(|| AppError::not_found("Availability", availability.id))?;
        row.start_date = availability.start_date;
        row.end_date = availability.end_date;
        row.status = availability.status;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn availabilities_delete(&mut self, id: i32) -> AppResult<()> {
        self.work.availabilities.remove(id, "Availability").map(|_| ())
    }

    // ---- Slots ----

    async fn slots_insert(&mut self, data: &NewSlot) -> AppResult<ItemAvailabilitySlot> {
        let now = Utc::now();
        let mut slot = ItemAvailabilitySlot {
            id: 0,
            availability_id: data.availability_id,
            start_date: data.range.start,
            end_date: data.range.end,
            status: data.status,
            loan_request_id: data.loan_request_id,
            created_at: now,
            updated_at: now,
        };
        self.work.ensure_no_slot_overlap(&slot)?;
        slot.id = self.work.slots.next_id();
        self.work.slots.rows.insert(slot.id, slot.clone());
        Ok(slot)
    }

    async fn slots_get(&mut self, id: i32) -> AppResult<Option<ItemAvailabilitySlot>> {
        Ok(self.work.slots.rows.get(&id).cloned())
    }

    async fn slots_list(&mut self, filter: &SlotFilter) -> AppResult<Vec<ItemAvailabilitySlot>> {
        let mut slots: Vec<ItemAvailabilitySlot> = self
            .work
            .slots
            .rows
            .values()
            .filter(|slot| self.work.slot_matches(slot, filter))
            .cloned()
            .collect();
        slots.sort_by_key(|s| (s.start_date, s.id));
        Ok(slots)
    }

    async fn slots_update(&mut self, slot: &ItemAvailabilitySlot) -> AppResult<ItemAvailabilitySlot> {
        if !self.work.slots.rows.contains_key(&slot.id) {
            return Err(AppError::not_found("Slot", slot.id));
        }
        self.work.ensure_no_slot_overlap(slot)?;
        let mut updated = slot.clone();
        updated.updated_at = Utc::now();
        self.work.slots.rows.insert(updated.id, updated.clone());
        Ok(updated)
    }

    async fn slots_set_status(&mut self, id: i32, status: SlotStatus) -> AppResult<ItemAvailabilitySlot> {
        let slot = self
            .work
            .slots
            .rows
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Slot", id))?;
        slot.status = status;
        slot.updated_at = Utc::now();
        Ok(slot.clone())
    }

    async fn slots_delete(&mut self, id: i32) -> AppResult<()> {
        self.work.slots.remove(id, "Slot").map(|_| ())
    }

    // ---- Loan requests ----

    async fn loan_requests_insert(&mut self, data: &NewLoanRequest) -> AppResult<LoanRequest> {
        let id = self.work.loan_requests.next_id();
        let now = Utc::now();
        let request = LoanRequest {
            id,
            item_id: data.item_id,
            borrower_id: data.borrower_id,
            start_date: data.range.start,
            end_date: data.range.end,
            message: data.message.clone(),
            status: LoanRequestStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.work.loan_requests.rows.insert(id, request.clone());
        Ok(request)
    }

    async fn loan_requests_get(&mut self, id: i32) -> AppResult<Option<LoanRequest>> {
        Ok(self.work.loan_requests.rows.get(&id).cloned())
    }

    async fn loan_requests_lock(&mut self, id: i32) -> AppResult<Option<LoanRequest>> {
        self.loan_requests_get(id).await
    }

    async fn loan_requests_list(&mut self, filter: &LoanRequestFilter) -> AppResult<Vec<LoanRequest>> {
        let state = &self.work;
        Ok(state
            .loan_requests
            .rows
            .values()
            .rev()
            .filter(|r| {
                filter.item_id.map_or(true, |id| r.item_id == id)
                    && filter.borrower_id.map_or(true, |id| r.borrower_id == id)
                    && filter.owner_id.map_or(true, |id| state.item_owner(r.item_id) == Some(id))
                    && filter.status.map_or(true, |status| r.status == status)
            })
            .cloned()
            .collect())
    }

    async fn loan_requests_set_status(&mut self, id: i32, status: LoanRequestStatus) -> AppResult<LoanRequest> {
        let request = self
            .work
            .loan_requests
            .rows
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Loan request", id))?;
        request.status = status;
        request.updated_at = Utc::now();
        Ok(request.clone())
    }

    async fn loan_requests_delete(&mut self, id: i32) -> AppResult<()> {
        self.work.loan_requests.remove(id, "Loan request").map(|_| ())
    }

    // ---- Loans ----

    async fn loans_insert(&mut self, data: &NewLoan) -> AppResult<Loan> {
        let id = self.work.loans.next_id();
        let now = Utc::now();
        let loan = Loan {
            id,
            loan_request_id: data.loan_request_id,
            item_id: data.item_id,
            borrower_id: data.borrower_id,
            start_date: data.range.start,
            end_date: data.range.end,
            actual_return_date: None,
            status: LoanStatus::Active,
            created_at: now,
            updated_at: now,
        };
        self.work.loans.rows.insert(id, loan.clone());
        Ok(loan)
    }

    async fn loans_get(&mut self, id: i32) -> AppResult<Option<Loan>> {
        Ok(self.work.loans.rows.get(&id).cloned())
    }

    async fn loans_lock(&mut self, id: i32) -> AppResult<Option<Loan>> {
        self.loans_get(id).await
    }

    async fn loans_list(&mut self, filter: &LoanFilter) -> AppResult<Vec<Loan>> {
        let state = &self.work;
        let mut loans: Vec<Loan> = state
            .loans
            .rows
            .values()
            .filter(|l| {
                let owner = state.item_owner(l.item_id);
                filter.item_id.map_or(true, |id| l.item_id == id)
                    && filter.borrower_id.map_or(true, |id| l.borrower_id == id)
                    && filter.owner_id.map_or(true, |id| owner == Some(id))
                    && filter
                        .participant_id
                        .map_or(true, |id| l.borrower_id == id || owner == Some(id))
                    && filter.status.map_or(true, |status| l.status == status)
            })
            .cloned()
            .collect();
        loans.sort_by_key(|l| (l.end_date, l.id));
        Ok(loans)
    }

    async fn loans_update(&mut self, loan: &Loan) -> AppResult<Loan> {
        let row = self
            .work
            .loans
            .rows
            .get_mut(&loan.id)
            .ok_or_else(|| AppError::not_found("Loan", loan.id))?;
        row.status = loan.status;
        row.actual_return_date = loan.actual_return_date;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn loans_mark_overdue(&mut self, id: i32, today: NaiveDate) -> AppResult<Option<Loan>> {
        let Some(row) = self.work.loans.rows.get_mut(&id) else {
            return Ok(None);
        };
        if !row.is_past_due(today) {
            return Ok(None);
        }
        row.status = LoanStatus::Overdue;
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn loans_delete(&mut self, id: i32) -> AppResult<()> {
        self.work.loans.remove(id, "Loan").map(|_| ())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryTx { mut guard, work } = *self;
        *guard = work;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Membership
// ---------------------------------------------------------------------------

/// Membership set kept in process, filled by `add_member`
#[derive(Debug, Default)]
pub struct MemoryMembership {
    members: RwLock<HashSet<(i32, i32)>>,
}

impl MemoryMembership {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_member(&self, user_id: i32, neighborhood_id: i32) {
        self.members
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert((user_id, neighborhood_id));
    }

    pub fn remove_member(&self, user_id: i32, neighborhood_id: i32) {
        self.members
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&(user_id, neighborhood_id));
    }
}

#[async_trait]
impl MembershipDirectory for MemoryMembership {
    async fn is_member(&self, user_id: i32, neighborhood_id: i32) -> AppResult<bool> {
        let members = self.members.read().unwrap_or_else(|e| e.into_inner());
        Ok(members.contains(&(user_id, neighborhood_id)))
    }
}
