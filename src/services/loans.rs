//! Loan engine: returns, return requests and overdue tracking

use std::sync::Arc;

use chrono::NaiveDate;

use crate::{
    clock::Clock,
    error::{AppError, AppResult, ErrorCode},
    models::{
        enums::LoanStatus,
        loan::{Loan, LoanFilter},
    },
    repository::{LendingStore, LendingTx},
};

use super::slots::release_for_request;

/// Move every past-due ACTIVE loan in `loans` to OVERDUE.
///
/// `loans` may be stale; the store re-checks each row so a loan returned
/// after the listing keeps its RETURNED state.
async fn mark_overdue(tx: &mut dyn LendingTx, loans: &[Loan], today: NaiveDate) -> AppResult<usize> {
    let mut marked = 0;
    for candidate in loans.iter().filter(|l| l.is_past_due(today)) {
        if let Some(loan) = tx.loans_mark_overdue(candidate.id, today).await? {
            tracing::info!("Loan {} is overdue (due {})", loan.id, loan.end_date);
            marked += 1;
        }
    }
    Ok(marked)
}

#[derive(Clone)]
pub struct LoansService {
    store: Arc<dyn LendingStore>,
    clock: Arc<dyn Clock>,
}

impl LoansService {
    pub fn new(store: Arc<dyn LendingStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Loan with its item owner, both row-locked
    async fn lock_loan(tx: &mut dyn LendingTx, loan_id: i32) -> AppResult<(Loan, i32)> {
        let loan = tx
            .loans_get(loan_id)
            .await?
            .ok_or_else(|| AppError::not_found("Loan", loan_id))?;
        let item = tx
            .items_lock(loan.item_id)
            .await?
            .ok_or_else(|| AppError::not_found("Item", loan.item_id))?;
        let loan = tx
            .loans_lock(loan_id)
            .await?
            .ok_or_else(|| AppError::not_found("Loan", loan_id))?;
        Ok((loan, item.owner_id))
    }

    /// Close a loan. Borrower or owner; any outstanding status may be returned.
    pub async fn return_loan(
        &self,
        loan_id: i32,
        actor_id: i32,
        actual_return_date: Option<NaiveDate>,
    ) -> AppResult<Loan> {
        let mut tx = self.store.begin().await?;
        let (mut loan, owner_id) = Self::lock_loan(tx.as_mut(), loan_id).await?;
        if actor_id != loan.borrower_id && actor_id != owner_id {
            return Err(AppError::forbidden("Only the borrower or the item owner can return this loan"));
        }
        if !loan.status.is_outstanding() {
            return Err(AppError::InvalidTransition(
                ErrorCode::LoanNotActive,
                format!("Loan {} is already returned", loan_id),
            ));
        }

        let returned_on = actual_return_date.unwrap_or_else(|| self.clock.today());
        if returned_on < loan.start_date {
            return Err(AppError::InvalidInput(
                ErrorCode::InvalidDates,
                format!("Return date {} is before the loan start {}", returned_on, loan.start_date),
            ));
        }

        loan.status = LoanStatus::Returned;
        loan.actual_return_date = Some(returned_on);
        let loan = tx.loans_update(&loan).await?;
        release_for_request(tx.as_mut(), loan.loan_request_id, true).await?;
        tx.commit().await?;

        tracing::info!("Loan {} returned on {} (actor {})", loan.id, returned_on, actor_id);
        Ok(loan)
    }

    /// Borrower reports the item handed back; the owner confirms with a return
    pub async fn request_return(&self, loan_id: i32, borrower_id: i32) -> AppResult<Loan> {
        let mut tx = self.store.begin().await?;
        let (mut loan, _owner_id) = Self::lock_loan(tx.as_mut(), loan_id).await?;
        if loan.borrower_id != borrower_id {
            return Err(AppError::forbidden("Only the borrower can request a return"));
        }
        if !matches!(loan.status, LoanStatus::Active | LoanStatus::Overdue) {
            return Err(AppError::InvalidTransition(
                ErrorCode::LoanNotActive,
                format!("Loan {} is {}", loan_id, loan.status),
            ));
        }

        loan.status = LoanStatus::PendingReturn;
        let loan = tx.loans_update(&loan).await?;
        tx.commit().await?;

        tracing::info!("Return requested for loan {}", loan.id);
        Ok(loan)
    }

    /// Single loan, visible to its borrower and the item owner
    pub async fn get(&self, loan_id: i32, actor_id: i32) -> AppResult<Loan> {
        let mut tx = self.store.begin().await?;
        let loan = tx
            .loans_get(loan_id)
            .await?
            .ok_or_else(|| AppError::not_found("Loan", loan_id))?;
        let item = tx
            .items_get(loan.item_id)
            .await?
            .ok_or_else(|| AppError::not_found("Item", loan.item_id))?;
        if loan.borrower_id != actor_id && !item.is_owned_by(actor_id) {
            return Err(AppError::forbidden("Only the borrower or the item owner can see this loan"));
        }
        Ok(loan)
    }

    /// Loans where the user is borrower or item owner
    pub async fn list_for_user(&self, user_id: i32, status: Option<LoanStatus>) -> AppResult<Vec<Loan>> {
        let mut tx = self.store.begin().await?;
        tx.loans_list(&LoanFilter {
            participant_id: Some(user_id),
            status,
            ..Default::default()
        })
        .await
    }

    /// Overdue loans of a user (as borrower or owner), sweeping theirs first
    pub async fn list_overdue(&self, user_id: i32) -> AppResult<Vec<Loan>> {
        let today = self.clock.today();
        let mut tx = self.store.begin().await?;

        let active = tx
            .loans_list(&LoanFilter {
                participant_id: Some(user_id),
                status: Some(LoanStatus::Active),
                ..Default::default()
            })
            .await?;
        mark_overdue(tx.as_mut(), &active, today).await?;

        let overdue = tx
            .loans_list(&LoanFilter {
                participant_id: Some(user_id),
                status: Some(LoanStatus::Overdue),
                ..Default::default()
            })
            .await?;
        tx.commit().await?;
        Ok(overdue)
    }

    /// Mark every past-due ACTIVE loan OVERDUE; returns how many changed
    pub async fn sweep_overdue(&self) -> AppResult<usize> {
        let today = self.clock.today();
        let mut tx = self.store.begin().await?;
        let active = tx
            .loans_list(&LoanFilter {
                status: Some(LoanStatus::Active),
                ..Default::default()
            })
            .await?;
        let marked = mark_overdue(tx.as_mut(), &active, today).await?;
        tx.commit().await?;
        Ok(marked)
    }
}
