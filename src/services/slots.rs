//! Slot management within availability windows

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult, ErrorCode},
    models::{
        availability::ItemAvailability,
        enums::SlotStatus,
        interval::DateRange,
        slot::{CreateSlot, ItemAvailabilitySlot, NewSlot, SlotFilter, UpdateSlot},
    },
    repository::{LendingStore, LendingTx},
};

use super::{availability::refresh_window_status, items::owned_item};

/// Slots among `slots` overlapping `range`, skipping `exclude_slot_id`.
///
/// Every slot conflict question (boolean check or listing) goes through here.
pub fn conflicting<'a>(
    slots: &'a [ItemAvailabilitySlot],
    range: &DateRange,
    exclude_slot_id: Option<i32>,
) -> Vec<&'a ItemAvailabilitySlot> {
    slots
        .iter()
        .filter(|s| Some(s.id) != exclude_slot_id)
        .filter(|s| s.range().overlaps(range))
        .collect()
}

pub(crate) async fn overlapping_slots(
    tx: &mut dyn LendingTx,
    availability_id: i32,
    range: &DateRange,
    exclude_slot_id: Option<i32>,
) -> AppResult<Vec<ItemAvailabilitySlot>> {
    let slots = tx.slots_list(&SlotFilter::for_availability(availability_id)).await?;
    Ok(conflicting(&slots, range, exclude_slot_id)
        .into_iter()
        .cloned()
        .collect())
}

pub(crate) async fn check_overlap(
    tx: &mut dyn LendingTx,
    availability_id: i32,
    range: &DateRange,
    exclude_slot_id: Option<i32>,
) -> AppResult<bool> {
    Ok(!overlapping_slots(tx, availability_id, range, exclude_slot_id)
        .await?
        .is_empty())
}

/// Write an OCCUPIED slot for an accepted request.
///
/// AVAILABLE slots under the range are split so only their uncovered parts
/// remain. Any reserved or occupied slot under the range is a conflict.
pub(crate) async fn occupy(
    tx: &mut dyn LendingTx,
    window: &ItemAvailability,
    range: DateRange,
    loan_request_id: i32,
) -> AppResult<ItemAvailabilitySlot> {
    for slot in overlapping_slots(tx, window.id, &range, None).await? {
        if slot.status.blocks_dates() {
            return Err(AppError::Conflict(
                ErrorCode::ItemNoLongerAvailable,
                format!("Dates {} are already taken by slot {}", range, slot.id),
            ));
        }
        tx.slots_delete(slot.id).await?;
        for rest in slot.range().subtract(&range) {
            tx.slots_insert(&NewSlot {
                availability_id: window.id,
                range: rest,
                status: SlotStatus::Available,
                loan_request_id: slot.loan_request_id,
            })
            .await?;
        }
    }

    let occupied = tx
        .slots_insert(&NewSlot {
            availability_id: window.id,
            range,
            status: SlotStatus::Occupied,
            loan_request_id: Some(loan_request_id),
        })
        .await?;
    refresh_window_status(tx, window.id).await?;
    Ok(occupied)
}

/// Drop the slots tied to a request, keeping OCCUPIED ones unless `occupied_too`
pub(crate) async fn release_for_request(
    tx: &mut dyn LendingTx,
    loan_request_id: i32,
    occupied_too: bool,
) -> AppResult<usize> {
    let slots = tx.slots_list(&SlotFilter::for_loan_request(loan_request_id)).await?;
    let mut released = 0;
    for slot in slots {
        if slot.status == SlotStatus::Occupied && !occupied_too {
            continue;
        }
        tx.slots_delete(slot.id).await?;
        refresh_window_status(tx, slot.availability_id).await?;
        released += 1;
    }
    Ok(released)
}

fn ensure_inside(window: &ItemAvailability, range: &DateRange) -> AppResult<()> {
    if !window.range().contains(range) {
        return Err(AppError::Conflict(
            ErrorCode::SlotOutsideAvailability,
            format!("Slot {} is outside availability {}", range, window.range()),
        ));
    }
    Ok(())
}

fn ensure_not_occupied_status(status: SlotStatus) -> AppResult<()> {
    if status == SlotStatus::Occupied {
        return Err(AppError::invalid_input(
            "Occupied slots are only created by accepting a loan request",
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct SlotsService {
    store: Arc<dyn LendingStore>,
}

impl SlotsService {
    pub fn new(store: Arc<dyn LendingStore>) -> Self {
        Self { store }
    }

    async fn load(tx: &mut dyn LendingTx, slot_id: i32) -> AppResult<ItemAvailabilitySlot> {
        tx.slots_get(slot_id)
            .await?
            .ok_or_else(|| AppError::not_found("Slot", slot_id))
    }

    async fn load_window(tx: &mut dyn LendingTx, availability_id: i32) -> AppResult<ItemAvailability> {
        tx.availabilities_get(availability_id)
            .await?
            .ok_or_else(|| AppError::not_found("Availability", availability_id))
    }

    /// Owner blocks (or re-opens) part of a window
    pub async fn create(&self, availability_id: i32, actor_id: i32, data: CreateSlot) -> AppResult<ItemAvailabilitySlot> {
        let status = data.status.unwrap_or(SlotStatus::Reserved);
        ensure_not_occupied_status(status)?;
        let range = DateRange::new(data.start_date, data.end_date)?;

        let mut tx = self.store.begin().await?;
        let window = Self::load_window(tx.as_mut(), availability_id).await?;
        owned_item(tx.as_mut(), window.item_id, actor_id).await?;
        ensure_inside(&window, &range)?;
        if check_overlap(tx.as_mut(), availability_id, &range, None).await? {
            return Err(AppError::Conflict(
                ErrorCode::SlotOverlap,
                format!("Slot {} overlaps an existing slot", range),
            ));
        }

        let slot = tx
            .slots_insert(&NewSlot {
                availability_id,
                range,
                status,
                loan_request_id: None,
            })
            .await?;
        refresh_window_status(tx.as_mut(), availability_id).await?;
        tx.commit().await?;

        tracing::info!("Slot {} {} ({}) created in availability {}", slot.id, range, status, availability_id);
        Ok(slot)
    }

    pub async fn get(&self, slot_id: i32) -> AppResult<ItemAvailabilitySlot> {
        let mut tx = self.store.begin().await?;
        Self::load(tx.as_mut(), slot_id).await
    }

    pub async fn list(&self, filter: &SlotFilter) -> AppResult<Vec<ItemAvailabilitySlot>> {
        let mut tx = self.store.begin().await?;
        tx.slots_list(filter).await
    }

    pub async fn list_by_availability(&self, availability_id: i32) -> AppResult<Vec<ItemAvailabilitySlot>> {
        let mut tx = self.store.begin().await?;
        Self::load_window(tx.as_mut(), availability_id).await?;
        tx.slots_list(&SlotFilter::for_availability(availability_id)).await
    }

    /// Slots produced by a loan request; visible to its borrower and item owner
    pub async fn list_by_loan_request(&self, loan_request_id: i32, actor_id: i32) -> AppResult<Vec<ItemAvailabilitySlot>> {
        let mut tx = self.store.begin().await?;
        let request = tx
            .loan_requests_get(loan_request_id)
            .await?
            .ok_or_else(|| AppError::not_found("Loan request", loan_request_id))?;
        let item = tx
            .items_get(request.item_id)
            .await?
            .ok_or_else(|| AppError::not_found("Item", request.item_id))?;
        if request.borrower_id != actor_id && !item.is_owned_by(actor_id) {
            return Err(AppError::forbidden("Only the borrower or the item owner can see these slots"));
        }
        tx.slots_list(&SlotFilter::for_loan_request(loan_request_id)).await
    }

    pub async fn update(&self, slot_id: i32, actor_id: i32, data: UpdateSlot) -> AppResult<ItemAvailabilitySlot> {
        let mut tx = self.store.begin().await?;
        let mut slot = Self::load(tx.as_mut(), slot_id).await?;
        let window = Self::load_window(tx.as_mut(), slot.availability_id).await?;
        owned_item(tx.as_mut(), window.item_id, actor_id).await?;

        if slot.status == SlotStatus::Occupied {
            return Err(AppError::Conflict(
                ErrorCode::SlotOccupied,
                format!("Slot {} backs a loan and cannot be edited", slot_id),
            ));
        }
        if let Some(status) = data.status {
            ensure_not_occupied_status(status)?;
            slot.status = status;
        }

        let range = DateRange::new(
            data.start_date.unwrap_or(slot.start_date),
            data.end_date.unwrap_or(slot.end_date),
        )?;
        ensure_inside(&window, &range)?;
        if check_overlap(tx.as_mut(), window.id, &range, Some(slot_id)).await? {
            return Err(AppError::Conflict(
                ErrorCode::SlotOverlap,
                format!("Slot {} overlaps an existing slot", range),
            ));
        }
        slot.start_date = range.start;
        slot.end_date = range.end;

        let slot = tx.slots_update(&slot).await?;
        refresh_window_status(tx.as_mut(), window.id).await?;
        tx.commit().await?;
        Ok(slot)
    }

    pub async fn delete(&self, slot_id: i32, actor_id: i32) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        let slot = Self::load(tx.as_mut(), slot_id).await?;
        let window = Self::load_window(tx.as_mut(), slot.availability_id).await?;
        owned_item(tx.as_mut(), window.item_id, actor_id).await?;

        if slot.status == SlotStatus::Occupied {
            return Err(AppError::Conflict(
                ErrorCode::SlotOccupied,
                format!("Slot {} backs a loan and cannot be deleted", slot_id),
            ));
        }
        tx.slots_delete(slot_id).await?;
        refresh_window_status(tx.as_mut(), window.id).await?;
        tx.commit().await?;

        tracing::info!("Slot {} deleted", slot_id);
        Ok(())
    }

    /// Release a RESERVED slot back to AVAILABLE
    pub async fn cancel(&self, slot_id: i32, actor_id: i32) -> AppResult<ItemAvailabilitySlot> {
        let mut tx = self.store.begin().await?;
        let slot = Self::load(tx.as_mut(), slot_id).await?;
        let window = Self::load_window(tx.as_mut(), slot.availability_id).await?;
        owned_item(tx.as_mut(), window.item_id, actor_id).await?;

        if slot.status != SlotStatus::Reserved {
            return Err(AppError::InvalidTransition(
                ErrorCode::SlotNotReserved,
                format!("Slot {} is {}, only reserved slots can be cancelled", slot_id, slot.status),
            ));
        }
        let slot = tx.slots_set_status(slot_id, SlotStatus::Available).await?;
        refresh_window_status(tx.as_mut(), window.id).await?;
        tx.commit().await?;

        tracing::info!("Slot {} cancelled", slot_id);
        Ok(slot)
    }

    /// AVAILABLE slots of a window, optionally only those overlapping `range`
    pub async fn available_slots(
        &self,
        availability_id: i32,
        range: Option<DateRange>,
    ) -> AppResult<Vec<ItemAvailabilitySlot>> {
        let mut tx = self.store.begin().await?;
        Self::load_window(tx.as_mut(), availability_id).await?;
        let slots = tx
            .slots_list(&SlotFilter {
                availability_id: Some(availability_id),
                status: Some(SlotStatus::Available),
                ..Default::default()
            })
            .await?;
        Ok(match range {
            Some(range) => conflicting(&slots, &range, None).into_iter().cloned().collect(),
            None => slots,
        })
    }

    /// Slots of a window that a candidate range would collide with
    pub async fn conflicts(
        &self,
        availability_id: i32,
        range: DateRange,
        exclude_slot_id: Option<i32>,
    ) -> AppResult<Vec<ItemAvailabilitySlot>> {
        let mut tx = self.store.begin().await?;
        Self::load_window(tx.as_mut(), availability_id).await?;
        overlapping_slots(tx.as_mut(), availability_id, &range, exclude_slot_id).await
    }
}
