//! Availability windows and the "is this item free" check

use std::sync::Arc;

use crate::{
    clock::Clock,
    error::{AppError, AppResult, ErrorCode},
    models::{
        availability::{AvailabilityCheck, CreateAvailability, ItemAvailability, NewAvailability, UpdateAvailability},
        enums::{AvailabilityStatus, SlotStatus},
        interval::DateRange,
        loan::LoanFilter,
        slot::{ItemAvailabilitySlot, SlotFilter},
    },
    repository::{LendingStore, LendingTx},
};

use super::items::owned_item;

// ---------------------------------------------------------------------------
// Shared checks (run inside a caller's transaction)
// ---------------------------------------------------------------------------

/// Slots across all windows of an item that overlap `range`
pub(crate) async fn item_overlapping_slots(
    tx: &mut dyn LendingTx,
    item_id: i32,
    range: &DateRange,
) -> AppResult<Vec<ItemAvailabilitySlot>> {
    let slots = tx.slots_list(&SlotFilter::for_item(item_id)).await?;
    Ok(slots.into_iter().filter(|s| s.range().overlaps(range)).collect())
}

/// Window that can host a loan over `range`, if the item is free then.
///
/// Free means: a bookable window covers the range, no reserved or occupied
/// slot of the item overlaps it and no outstanding loan overlaps it.
pub(crate) async fn find_free_window(
    tx: &mut dyn LendingTx,
    item_id: i32,
    range: &DateRange,
) -> AppResult<Option<ItemAvailability>> {
    let windows = tx.availabilities_list_by_item(item_id).await?;
    let Some(window) = windows
        .into_iter()
        .find(|w| w.status.is_bookable() && w.range().contains(range))
    else {
        return Ok(None);
    };

    let blocked = item_overlapping_slots(tx, item_id, range)
        .await?
        .iter()
        .any(|s| s.status.blocks_dates());
    if blocked {
        return Ok(None);
    }

    let loans = tx
        .loans_list(&LoanFilter {
            item_id: Some(item_id),
            ..Default::default()
        })
        .await?;
    if loans
        .iter()
        .any(|l| l.status.is_outstanding() && l.range().overlaps(range))
    {
        return Ok(None);
    }

    Ok(Some(window))
}

/// Flip a window between AVAILABLE and PARTIALLY_BOOKED to match its slots.
/// UNAVAILABLE is owner-controlled and left alone.
pub(crate) async fn refresh_window_status(tx: &mut dyn LendingTx, availability_id: i32) -> AppResult<()> {
    let Some(mut window) = tx.availabilities_get(availability_id).await? else {
        return Ok(());
    };
    if window.status == AvailabilityStatus::Unavailable {
        return Ok(());
    }

    let slots = tx.slots_list(&SlotFilter::for_availability(availability_id)).await?;
    let desired = if slots.iter().any(|s| s.status.blocks_dates()) {
        AvailabilityStatus::PartiallyBooked
    } else {
        AvailabilityStatus::Available
    };

    if window.status != desired {
        tracing::debug!("Availability {} status {} -> {}", window.id, window.status, desired);
        window.status = desired;
        tx.availabilities_update(&window).await?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AvailabilityService {
    store: Arc<dyn LendingStore>,
    clock: Arc<dyn Clock>,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn LendingStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Publish a window for an item the actor owns
    pub async fn create(&self, item_id: i32, owner_id: i32, data: CreateAvailability) -> AppResult<ItemAvailability> {
        let mut tx = self.store.begin().await?;
        owned_item(tx.as_mut(), item_id, owner_id).await?;
        let range = DateRange::new_from(data.start_date, data.end_date, self.clock.today())?;

        let window = tx
            .availabilities_insert(&NewAvailability {
                item_id,
                range,
                status: data.status.unwrap_or_default(),
            })
            .await?;
        tx.commit().await?;

        tracing::info!("Availability {} published for item {} over {}", window.id, item_id, range);
        Ok(window)
    }

    pub async fn get(&self, availability_id: i32) -> AppResult<ItemAvailability> {
        let mut tx = self.store.begin().await?;
        tx.availabilities_get(availability_id)
            .await?
            .ok_or_else(|| AppError::not_found("Availability", availability_id))
    }

    pub async fn list_by_item(&self, item_id: i32) -> AppResult<Vec<ItemAvailability>> {
        let mut tx = self.store.begin().await?;
        if tx.items_get(item_id).await?.is_none() {
            return Err(AppError::not_found("Item", item_id));
        }
        tx.availabilities_list_by_item(item_id).await
    }

    /// Move or re-status a window; its slots must still fit inside
    pub async fn update(
        &self,
        availability_id: i32,
        actor_id: i32,
        data: UpdateAvailability,
    ) -> AppResult<ItemAvailability> {
        let mut tx = self.store.begin().await?;
        let mut window = tx
            .availabilities_get(availability_id)
            .await?
            .ok_or_else(|| AppError::not_found("Availability", availability_id))?;
        owned_item(tx.as_mut(), window.item_id, actor_id).await?;

        let range = DateRange::new(
            data.start_date.unwrap_or(window.start_date),
            data.end_date.unwrap_or(window.end_date),
        )?;
        if data.start_date.is_some() && range.start < self.clock.today() {
            return Err(AppError::InvalidInput(
                ErrorCode::PastDate,
                format!("start_date {} is in the past", range.start),
            ));
        }

        let slots = tx.slots_list(&SlotFilter::for_availability(availability_id)).await?;
        if let Some(outside) = slots.iter().find(|s| !range.contains(&s.range())) {
            return Err(AppError::Conflict(
                ErrorCode::SlotOutsideAvailability,
                format!("Slot {} {} would fall outside {}", outside.id, outside.range(), range),
            ));
        }

        window.start_date = range.start;
        window.end_date = range.end;
        if let Some(status) = data.status {
            window.status = status;
        }
        tx.availabilities_update(&window).await?;
        refresh_window_status(tx.as_mut(), availability_id).await?;

        let window = tx
            .availabilities_get(availability_id)
            .await?
            .ok_or_else(|| AppError::not_found("Availability", availability_id))?;
        tx.commit().await?;

        tracing::info!("Availability {} updated to {} ({})", window.id, range, window.status);
        Ok(window)
    }

    /// Withdraw a window together with its slots
    pub async fn delete(&self, availability_id: i32, actor_id: i32) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        let window = tx
            .availabilities_get(availability_id)
            .await?
            .ok_or_else(|| AppError::not_found("Availability", availability_id))?;
        owned_item(tx.as_mut(), window.item_id, actor_id).await?;

        let slots = tx.slots_list(&SlotFilter::for_availability(availability_id)).await?;
        if slots.iter().any(|s| s.status == SlotStatus::Occupied) {
            return Err(AppError::Conflict(
                ErrorCode::SlotOccupied,
                format!("Availability {} backs an outstanding loan", availability_id),
            ));
        }
        for slot in &slots {
            tx.slots_delete(slot.id).await?;
        }
        tx.availabilities_delete(availability_id).await?;
        tx.commit().await?;

        tracing::info!("Availability {} deleted with {} slots", availability_id, slots.len());
        Ok(())
    }

    /// Answer whether the item is free for `[start_date, end_date)`
    pub async fn check(&self, item_id: i32, range: DateRange) -> AppResult<AvailabilityCheck> {
        let mut tx = self.store.begin().await?;
        if tx.items_get(item_id).await?.is_none() {
            return Err(AppError::not_found("Item", item_id));
        }
        let window = find_free_window(tx.as_mut(), item_id, &range).await?;
        Ok(AvailabilityCheck {
            item_id,
            start_date: range.start,
            end_date: range.end,
            available: window.is_some(),
            availability_id: window.map(|w| w.id),
        })
    }
}
