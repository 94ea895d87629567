//! Loan request engine
//!
//! A request starts PENDING and ends in exactly one of ACCEPTED, REJECTED or
//! CANCELLED. Overlapping pending requests may coexist; the first one accepted
//! wins and later accepts fail with `item_no_longer_available`.

use std::sync::Arc;

use validator::Validate;

use crate::{
    clock::Clock,
    error::{AppError, AppResult, ErrorCode},
    models::{
        enums::LoanRequestStatus,
        interval::DateRange,
        item::Item,
        loan::{Loan, NewLoan},
        loan_request::{CreateLoanRequest, LoanRequest, LoanRequestFilter, NewLoanRequest},
    },
    repository::{LendingStore, LendingTx, MembershipDirectory},
};

use super::{
    availability::find_free_window,
    slots::{occupy, release_for_request},
};

/// Request with its item, both row-locked, item first
async fn lock_request(tx: &mut dyn LendingTx, request_id: i32) -> AppResult<(LoanRequest, Item)> {
    let request = tx
        .loan_requests_get(request_id)
        .await?
        .ok_or_else(|| AppError::not_found("Loan request", request_id))?;
    let item = tx
        .items_lock(request.item_id)
        .await?
        .ok_or_else(|| AppError::not_found("Item", request.item_id))?;
    let request = tx
        .loan_requests_lock(request_id)
        .await?
        .ok_or_else(|| AppError::not_found("Loan request", request_id))?;
    Ok((request, item))
}

fn ensure_pending(request: &LoanRequest) -> AppResult<()> {
    if request.status != LoanRequestStatus::Pending {
        return Err(AppError::InvalidTransition(
            ErrorCode::RequestNotPending,
            format!("Loan request {} is already {}", request.id, request.status),
        ));
    }
    Ok(())
}

fn ensure_owner(item: &Item, actor_id: i32) -> AppResult<()> {
    if !item.is_owned_by(actor_id) {
        return Err(AppError::forbidden("Only the item owner can decide on this request"));
    }
    Ok(())
}

#[derive(Clone)]
pub struct LoanRequestsService {
    store: Arc<dyn LendingStore>,
    membership: Arc<dyn MembershipDirectory>,
    clock: Arc<dyn Clock>,
}

impl LoanRequestsService {
    pub fn new(
        store: Arc<dyn LendingStore>,
        membership: Arc<dyn MembershipDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { store, membership, clock }
    }

    /// Ask to borrow an item for `[start_date, end_date)`
    pub async fn create(&self, borrower_id: i32, data: CreateLoanRequest) -> AppResult<LoanRequest> {
        data.validate()?;

        let mut tx = self.store.begin().await?;
        let item = tx.items_lock(data.item_id).await?.ok_or_else(|| {
            AppError::NotFound(ErrorCode::ItemNotFound, format!("Item {} not found", data.item_id))
        })?;

        if item.is_owned_by(borrower_id) {
            return Err(AppError::Forbidden(
                ErrorCode::CannotBorrowOwnItem,
                "You cannot borrow your own item".to_string(),
            ));
        }
        if !self.membership.is_member(borrower_id, item.neighborhood_id).await? {
            return Err(AppError::Forbidden(
                ErrorCode::NotMemberOfNeighborhood,
                format!("User {} is not a member of neighborhood {}", borrower_id, item.neighborhood_id),
            ));
        }

        let range = DateRange::new_from(data.start_date, data.end_date, self.clock.today())?;
        if find_free_window(tx.as_mut(), item.id, &range).await?.is_none() {
            return Err(AppError::Conflict(
                ErrorCode::ItemNotAvailable,
                format!("Item {} is not available for {}", item.id, range),
            ));
        }

        let request = tx
            .loan_requests_insert(&NewLoanRequest {
                item_id: item.id,
                borrower_id,
                range,
                message: data.message,
            })
            .await?;
        tx.commit().await?;

        tracing::info!(
            "Loan request {} created by user {} for item {} over {}",
            request.id,
            borrower_id,
            item.id,
            range
        );
        Ok(request)
    }

    /// Accept a pending request and open the loan.
    ///
    /// Availability is checked again under the item lock; the OCCUPIED slot,
    /// the status change and the loan commit together.
    pub async fn accept(&self, request_id: i32, owner_id: i32) -> AppResult<Loan> {
        let mut tx = self.store.begin().await?;
        let (request, item) = lock_request(tx.as_mut(), request_id).await?;
        ensure_owner(&item, owner_id)?;
        ensure_pending(&request)?;

        let range = request.range();
        let window = find_free_window(tx.as_mut(), item.id, &range)
            .await?
            .ok_or_else(|| {
                AppError::Conflict(
                    ErrorCode::ItemNoLongerAvailable,
                    format!("Item {} is no longer available for {}", item.id, range),
                )
            })?;

        occupy(tx.as_mut(), &window, range, request.id).await?;
        tx.loan_requests_set_status(request.id, LoanRequestStatus::Accepted)
            .await?;
        let loan = tx
            .loans_insert(&NewLoan {
                loan_request_id: request.id,
                item_id: item.id,
                borrower_id: request.borrower_id,
                range,
            })
            .await?;
        tx.commit().await?;

        tracing::info!(
            "Loan request {} accepted by user {}; loan {} opened for {}",
            request.id,
            owner_id,
            loan.id,
            range
        );
        Ok(loan)
    }

    pub async fn reject(&self, request_id: i32, owner_id: i32) -> AppResult<LoanRequest> {
        let mut tx = self.store.begin().await?;
        let (request, item) = lock_request(tx.as_mut(), request_id).await?;
        ensure_owner(&item, owner_id)?;
        ensure_pending(&request)?;

        let request = tx
            .loan_requests_set_status(request.id, LoanRequestStatus::Rejected)
            .await?;
        release_for_request(tx.as_mut(), request.id, false).await?;
        tx.commit().await?;

        tracing::info!("Loan request {} rejected by user {}", request.id, owner_id);
        Ok(request)
    }

    pub async fn cancel(&self, request_id: i32, borrower_id: i32) -> AppResult<LoanRequest> {
        let mut tx = self.store.begin().await?;
        let (request, _item) = lock_request(tx.as_mut(), request_id).await?;
        if request.borrower_id != borrower_id {
            return Err(AppError::forbidden("Only the borrower can cancel this request"));
        }
        if request.status != LoanRequestStatus::Pending {
            return Err(AppError::InvalidTransition(
                ErrorCode::CannotCancelNonPending,
                format!("Loan request {} is {} and can no longer be cancelled", request.id, request.status),
            ));
        }

        let request = tx
            .loan_requests_set_status(request.id, LoanRequestStatus::Cancelled)
            .await?;
        release_for_request(tx.as_mut(), request.id, false).await?;
        tx.commit().await?;

        tracing::info!("Loan request {} cancelled by user {}", request.id, borrower_id);
        Ok(request)
    }

    /// Single request, visible to its borrower and the item owner
    pub async fn get(&self, request_id: i32, actor_id: i32) -> AppResult<LoanRequest> {
        let mut tx = self.store.begin().await?;
        let request = tx
            .loan_requests_get(request_id)
            .await?
            .ok_or_else(|| AppError::not_found("Loan request", request_id))?;
        let item = tx
            .items_get(request.item_id)
            .await?
            .ok_or_else(|| AppError::not_found("Item", request.item_id))?;
        if request.borrower_id != actor_id && !item.is_owned_by(actor_id) {
            return Err(AppError::forbidden("Only the borrower or the item owner can see this request"));
        }
        Ok(request)
    }

    /// Incoming requests for one of the actor's items
    pub async fn list_for_item(
        &self,
        item_id: i32,
        actor_id: i32,
        status: Option<LoanRequestStatus>,
    ) -> AppResult<Vec<LoanRequest>> {
        let mut tx = self.store.begin().await?;
        let item = tx
            .items_get(item_id)
            .await?
            .ok_or_else(|| AppError::not_found("Item", item_id))?;
        ensure_owner(&item, actor_id)?;
        tx.loan_requests_list(&LoanRequestFilter {
            item_id: Some(item_id),
            status,
            ..Default::default()
        })
        .await
    }

    /// Outgoing requests of a borrower
    pub async fn list_for_borrower(
        &self,
        borrower_id: i32,
        status: Option<LoanRequestStatus>,
    ) -> AppResult<Vec<LoanRequest>> {
        let mut tx = self.store.begin().await?;
        tx.loan_requests_list(&LoanRequestFilter {
            borrower_id: Some(borrower_id),
            status,
            ..Default::default()
        })
        .await
    }
}
