//! Item catalog service

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::{AppError, AppResult, ErrorCode},
    models::{
        item::{CreateItem, Item, ItemQuery, UpdateItem},
        loan::LoanFilter,
        loan_request::LoanRequestFilter,
        slot::SlotFilter,
    },
    repository::{LendingStore, LendingTx, MembershipDirectory},
};

/// Load an item and lock its row, failing unless `actor_id` owns it
pub(crate) async fn owned_item(tx: &mut dyn LendingTx, item_id: i32, actor_id: i32) -> AppResult<Item> {
    let item = tx
        .items_lock(item_id)
        .await?
        .ok_or_else(|| AppError::not_found("Item", item_id))?;
    if !item.is_owned_by(actor_id) {
        return Err(AppError::forbidden("Only the item owner can do this"));
    }
    Ok(item)
}

#[derive(Clone)]
pub struct ItemsService {
    store: Arc<dyn LendingStore>,
    membership: Arc<dyn MembershipDirectory>,
}

impl ItemsService {
    pub fn new(store: Arc<dyn LendingStore>, membership: Arc<dyn MembershipDirectory>) -> Self {
        Self { store, membership }
    }

    /// Register an item in one of the owner's neighborhoods
    pub async fn create(&self, owner_id: i32, data: CreateItem) -> AppResult<Item> {
        data.validate()?;
        if !self.membership.is_member(owner_id, data.neighborhood_id).await? {
            return Err(AppError::Forbidden(
                ErrorCode::NotMemberOfNeighborhood,
                format!("User {} is not a member of neighborhood {}", owner_id, data.neighborhood_id),
            ));
        }

        let mut tx = self.store.begin().await?;
        let item = tx.items_insert(owner_id, &data).await?;
        tx.commit().await?;

        tracing::info!("Item {} created by user {}", item.id, owner_id);
        Ok(item)
    }

    pub async fn get(&self, item_id: i32) -> AppResult<Item> {
        let mut tx = self.store.begin().await?;
        tx.items_get(item_id)
            .await?
            .ok_or_else(|| AppError::not_found("Item", item_id))
    }

    pub async fn list(&self, query: &ItemQuery) -> AppResult<Vec<Item>> {
        let mut tx = self.store.begin().await?;
        tx.items_list(query).await
    }

    pub async fn update(&self, item_id: i32, actor_id: i32, data: UpdateItem) -> AppResult<Item> {
        data.validate()?;
        let mut tx = self.store.begin().await?;
        owned_item(tx.as_mut(), item_id, actor_id).await?;
        let item = tx.items_update(item_id, &data).await?;
        tx.commit().await?;
        Ok(item)
    }

    /// Delete an item with everything hanging off it.
    ///
    /// Children go first (slots, loans, loan requests, windows) so the
    /// foreign keys never dangle; all of it commits or none of it does.
    pub async fn delete(&self, item_id: i32, actor_id: i32) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        owned_item(tx.as_mut(), item_id, actor_id).await?;

        let slots = tx.slots_list(&SlotFilter::for_item(item_id)).await?;
        for slot in &slots {
            tx.slots_delete(slot.id).await?;
        }

        let loans = tx
            .loans_list(&LoanFilter {
                item_id: Some(item_id),
                ..Default::default()
            })
            .await?;
        for loan in &loans {
            tx.loans_delete(loan.id).await?;
        }

        let requests = tx
            .loan_requests_list(&LoanRequestFilter {
                item_id: Some(item_id),
                ..Default::default()
            })
            .await?;
        for request in &requests {
            tx.loan_requests_delete(request.id).await?;
        }

        let windows = tx.availabilities_list_by_item(item_id).await?;
        for window in &windows {
            tx.availabilities_delete(window.id).await?;
        }

        tx.items_delete(item_id).await?;
        tx.commit().await?;

        tracing::info!(
            "Item {} deleted ({} windows, {} slots, {} requests, {} loans)",
            item_id,
            windows.len(),
            slots.len(),
            requests.len(),
            loans.len()
        );
        Ok(())
    }
}
