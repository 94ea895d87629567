//! Business logic services

pub mod availability;
pub mod items;
pub mod loan_requests;
pub mod loans;
pub mod overdue;
pub mod scheduler;
pub mod slots;

use std::sync::Arc;

use crate::{
    clock::Clock,
    error::AppResult,
    repository::{LendingStore, MembershipDirectory},
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub items: items::ItemsService,
    pub availability: availability::AvailabilityService,
    pub slots: slots::SlotsService,
    pub loan_requests: loan_requests::LoanRequestsService,
    pub loans: loans::LoansService,
    pub scheduler: scheduler::Scheduler,
    store: Arc<dyn LendingStore>,
}

impl Services {
    /// Create all services over one store, membership directory and clock
    pub fn new(
        store: Arc<dyn LendingStore>,
        membership: Arc<dyn MembershipDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let items = items::ItemsService::new(store.clone(), membership.clone());
        let availability = availability::AvailabilityService::new(store.clone(), clock.clone());
        let slots = slots::SlotsService::new(store.clone());
        let loan_requests = loan_requests::LoanRequestsService::new(store.clone(), membership, clock.clone());
        let loans = loans::LoansService::new(store.clone(), clock);
        let scheduler = scheduler::Scheduler::new(
            availability.clone(),
            loan_requests.clone(),
            loans.clone(),
            slots.clone(),
        );

        Self {
            items,
            availability,
            slots,
            loan_requests,
            loans,
            scheduler,
            store,
        }
    }

    /// Open and drop a store transaction to prove the backend is reachable
    pub async fn ping(&self) -> AppResult<()> {
        self.store.begin().await.map(|_| ())
    }
}
