//! Scheduler facade
//!
//! The end-to-end lending workflow in one place: publish availability,
//! request, decide, return, plus the overdue and slot queries. Each call is
//! a thin composition over the underlying services, which own the rules.

use chrono::NaiveDate;

use crate::{
    error::{AppError, AppResult, ErrorCode},
    models::{
        availability::{CreateAvailability, ItemAvailability},
        interval::DateRange,
        loan::Loan,
        loan_request::{CreateLoanRequest, LoanRequest},
        slot::ItemAvailabilitySlot,
    },
};

use super::{
    availability::AvailabilityService, loan_requests::LoanRequestsService, loans::LoansService,
    slots::SlotsService,
};

#[derive(Clone)]
pub struct Scheduler {
    availability: AvailabilityService,
    loan_requests: LoanRequestsService,
    loans: LoansService,
    slots: SlotsService,
}

impl Scheduler {
    pub fn new(
        availability: AvailabilityService,
        loan_requests: LoanRequestsService,
        loans: LoansService,
        slots: SlotsService,
    ) -> Self {
        Self {
            availability,
            loan_requests,
            loans,
            slots,
        }
    }

    pub async fn create_availability(
        &self,
        item_id: i32,
        owner_id: i32,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> AppResult<ItemAvailability> {
        self.availability
            .create(
                item_id,
                owner_id,
                CreateAvailability {
                    start_date,
                    end_date,
                    status: None,
                },
            )
            .await
    }

    pub async fn create_loan_request(
        &self,
        item_id: i32,
        borrower_id: i32,
        start_date: NaiveDate,
        end_date: NaiveDate,
        message: Option<String>,
    ) -> AppResult<LoanRequest> {
        self.loan_requests
            .create(
                borrower_id,
                CreateLoanRequest {
                    item_id,
                    start_date,
                    end_date,
                    message,
                },
            )
            .await
    }

    pub async fn accept_loan_request(&self, request_id: i32, owner_id: i32) -> AppResult<Loan> {
        self.loan_requests.accept(request_id, owner_id).await
    }

    pub async fn reject_loan_request(&self, request_id: i32, owner_id: i32) -> AppResult<LoanRequest> {
        self.loan_requests.reject(request_id, owner_id).await
    }

    pub async fn cancel_loan_request(&self, request_id: i32, borrower_id: i32) -> AppResult<LoanRequest> {
        self.loan_requests.cancel(request_id, borrower_id).await
    }

    pub async fn return_loan(
        &self,
        loan_id: i32,
        actor_id: i32,
        actual_return_date: Option<NaiveDate>,
    ) -> AppResult<Loan> {
        self.loans.return_loan(loan_id, actor_id, actual_return_date).await
    }

    /// Overdue loans of the user; newly past-due loans are marked on the way
    pub async fn list_overdue_loans(&self, user_id: i32) -> AppResult<Vec<Loan>> {
        self.loans.list_overdue(user_id).await
    }

    pub async fn check_slot_conflicts(
        &self,
        availability_id: i32,
        start_date: NaiveDate,
        end_date: NaiveDate,
        exclude_slot_id: Option<i32>,
    ) -> AppResult<Vec<ItemAvailabilitySlot>> {
        let range = DateRange::new(start_date, end_date)?;
        self.slots.conflicts(availability_id, range, exclude_slot_id).await
    }

    /// AVAILABLE slots of a window, optionally only those overlapping
    /// `[start_date, end_date)`. The bounds come as a pair.
    pub async fn get_available_slots(
        &self,
        availability_id: i32,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> AppResult<Vec<ItemAvailabilitySlot>> {
        let range = match (start_date, end_date) {
            (Some(start), Some(end)) => Some(DateRange::new(start, end)?),
            (None, None) => None,
            _ => {
                return Err(AppError::InvalidInput(
                    ErrorCode::InvalidDates,
                    "start_date and end_date must be given together".to_string(),
                ))
            }
        };
        self.slots.available_slots(availability_id, range).await
    }
}
