//! End-to-end lending workflows against the in-process store

use std::sync::Arc;

use chrono::NaiveDate;
use lendhood_server::{
    clock::FixedClock,
    error::{AppError, ErrorCode},
    models::{
        availability::{CreateAvailability, ItemAvailability, UpdateAvailability},
        enums::{AvailabilityStatus, LoanRequestStatus, LoanStatus, SlotStatus},
        interval::DateRange,
        item::{CreateItem, Item},
        slot::{CreateSlot, SlotFilter, UpdateSlot},
    },
    repository::{MemoryMembership, MemoryStore},
    services::Services,
};

const OWNER: i32 = 1;
const BORROWER: i32 = 2;
const NEIGHBOR: i32 = 3;
const STRANGER: i32 = 4;
const HOOD: i32 = 10;

fn d(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).expect("valid date")
}

struct Harness {
    services: Services,
    clock: Arc<FixedClock>,
    membership: Arc<MemoryMembership>,
}

impl Harness {
    fn new() -> Self {
        let clock = Arc::new(FixedClock::new(d(5, 20)));
        let membership = Arc::new(MemoryMembership::new());
        for user in [OWNER, BORROWER, NEIGHBOR] {
            membership.add_member(user, HOOD);
        }
        let services = Services::new(Arc::new(MemoryStore::new()), membership.clone(), clock.clone());
        Self {
            services,
            clock,
            membership,
        }
    }

    async fn item(&self) -> Item {
        self.services
            .items
            .create(
                OWNER,
                CreateItem {
                    name: "Pressure washer".to_string(),
                    description: None,
                    category: Some("garden".to_string()),
                    image_url: None,
                    neighborhood_id: HOOD,
                },
            )
            .await
            .expect("create item")
    }

    /// Item with one window `[06-01, 06-10)`
    async fn item_with_window(&self) -> (Item, ItemAvailability) {
        let item = self.item().await;
        let window = self
            .services
            .scheduler
            .create_availability(item.id, OWNER, d(6, 1), d(6, 10))
            .await
            .expect("publish window");
        (item, window)
    }
}

fn code<T: std::fmt::Debug>(result: Result<T, AppError>) -> ErrorCode {
    result.expect_err("operation should fail").code()
}

// ---------------------------------------------------------------------------
// Request / accept round trip
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_accepted_dates_block_later_requests() {
    let h = Harness::new();
    let (item, window) = h.item_with_window().await;
    let scheduler = &h.services.scheduler;

    let request = scheduler
        .create_loan_request(item.id, BORROWER, d(6, 3), d(6, 5), Some("For the patio".to_string()))
        .await
        .expect("request");
    assert_eq!(request.status, LoanRequestStatus::Pending);

    let loan = scheduler
        .accept_loan_request(request.id, OWNER)
        .await
        .expect("accept");
    assert_eq!(loan.status, LoanStatus::Active);
    assert_eq!(loan.borrower_id, BORROWER);
    assert_eq!((loan.start_date, loan.end_date), (d(6, 3), d(6, 5)));

    let window = h.services.availability.get(window.id).await.expect("window");
    assert_eq!(window.status, AvailabilityStatus::PartiallyBooked);

    let err = scheduler
        .create_loan_request(item.id, NEIGHBOR, d(6, 4), d(6, 6), None)
        .await;
    assert_eq!(code(err), ErrorCode::ItemNotAvailable);
}

#[tokio::test]
async fn test_second_overlapping_accept_fails() {
    let h = Harness::new();
    let (item, _) = h.item_with_window().await;
    let scheduler = &h.services.scheduler;

    let first = scheduler
        .create_loan_request(item.id, BORROWER, d(6, 3), d(6, 5), None)
        .await
        .expect("first request");
    let second = scheduler
        .create_loan_request(item.id, NEIGHBOR, d(6, 4), d(6, 6), None)
        .await
        .expect("overlapping pending requests may coexist");

    scheduler.accept_loan_request(first.id, OWNER).await.expect("accept first");
    let err = scheduler.accept_loan_request(second.id, OWNER).await;
    assert_eq!(code(err), ErrorCode::ItemNoLongerAvailable);

    let second = h
        .services
        .loan_requests
        .get(second.id, NEIGHBOR)
        .await
        .expect("second request");
    assert_eq!(second.status, LoanRequestStatus::Pending);
}

#[tokio::test]
async fn test_touching_ranges_do_not_conflict() {
    let h = Harness::new();
    let (item, _) = h.item_with_window().await;
    let scheduler = &h.services.scheduler;

    let first = scheduler
        .create_loan_request(item.id, BORROWER, d(6, 1), d(6, 5), None)
        .await
        .expect("first request");
    scheduler.accept_loan_request(first.id, OWNER).await.expect("accept first");

    let second = scheduler
        .create_loan_request(item.id, NEIGHBOR, d(6, 5), d(6, 10), None)
        .await
        .expect("request starting on the previous end date");
    scheduler
        .accept_loan_request(second.id, OWNER)
        .await
        .expect("accept touching range");
}

#[tokio::test]
async fn test_request_outside_any_window_is_unavailable() {
    let h = Harness::new();
    let (item, _) = h.item_with_window().await;

    let err = h
        .services
        .scheduler
        .create_loan_request(item.id, BORROWER, d(6, 8), d(6, 12), None)
        .await;
    assert_eq!(code(err), ErrorCode::ItemNotAvailable);
}

#[tokio::test]
async fn test_request_validation_errors() {
    let h = Harness::new();
    let (item, _) = h.item_with_window().await;
    let scheduler = &h.services.scheduler;

    let err = scheduler.create_loan_request(999, BORROWER, d(6, 3), d(6, 5), None).await;
    assert_eq!(code(err), ErrorCode::ItemNotFound);

    let err = scheduler.create_loan_request(item.id, BORROWER, d(6, 5), d(6, 5), None).await;
    assert_eq!(code(err), ErrorCode::InvalidDates);

    let err = scheduler.create_loan_request(item.id, BORROWER, d(6, 6), d(6, 3), None).await;
    assert_eq!(code(err), ErrorCode::InvalidDates);

    let err = scheduler.create_loan_request(item.id, BORROWER, d(5, 19), d(6, 3), None).await;
    assert_eq!(code(err), ErrorCode::PastDate);

    let err = scheduler.create_loan_request(item.id, STRANGER, d(6, 3), d(6, 5), None).await;
    assert_eq!(code(err), ErrorCode::NotMemberOfNeighborhood);

    let err = scheduler
        .create_loan_request(item.id, BORROWER, d(6, 3), d(6, 5), Some("x".repeat(1001)))
        .await;
    assert_eq!(code(err), ErrorCode::InvalidInput);
}

#[tokio::test]
async fn test_own_item_guard_ignores_availability() {
    let h = Harness::new();
    let item = h.item().await;

    // no window at all: the own-item rule still wins
    let err = h
        .services
        .scheduler
        .create_loan_request(item.id, OWNER, d(6, 3), d(6, 5), None)
        .await;
    assert_eq!(code(err), ErrorCode::CannotBorrowOwnItem);
}

#[tokio::test]
async fn test_membership_revocation_blocks_new_requests() {
    let h = Harness::new();
    let (item, _) = h.item_with_window().await;

    h.membership.remove_member(BORROWER, HOOD);
    let err = h
        .services
        .scheduler
        .create_loan_request(item.id, BORROWER, d(6, 3), d(6, 5), None)
        .await;
    assert_eq!(code(err), ErrorCode::NotMemberOfNeighborhood);
}

// ---------------------------------------------------------------------------
// Ownership and state machines
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_decisions_belong_to_the_right_party() {
    let h = Harness::new();
    let (item, _) = h.item_with_window().await;
    let scheduler = &h.services.scheduler;

    let request = scheduler
        .create_loan_request(item.id, BORROWER, d(6, 3), d(6, 5), None)
        .await
        .expect("request");

    assert_eq!(code(scheduler.accept_loan_request(request.id, BORROWER).await), ErrorCode::Forbidden);
    assert_eq!(code(scheduler.reject_loan_request(request.id, STRANGER).await), ErrorCode::Forbidden);
    assert_eq!(code(scheduler.cancel_loan_request(request.id, OWNER).await), ErrorCode::Forbidden);
    assert_eq!(code(h.services.loan_requests.get(request.id, STRANGER).await), ErrorCode::Forbidden);

    let loan = scheduler.accept_loan_request(request.id, OWNER).await.expect("accept");
    let err = scheduler.return_loan(loan.id, STRANGER, Some(d(6, 4))).await;
    assert_eq!(code(err), ErrorCode::Forbidden);

    let returned = scheduler
        .return_loan(loan.id, OWNER, Some(d(6, 4)))
        .await
        .expect("owner may return");
    assert_eq!(returned.status, LoanStatus::Returned);
}

#[tokio::test]
async fn test_ownership_checked_before_pending_state() {
    let h = Harness::new();
    let (item, _) = h.item_with_window().await;
    let scheduler = &h.services.scheduler;

    let request = scheduler
        .create_loan_request(item.id, BORROWER, d(6, 3), d(6, 5), None)
        .await
        .expect("request");
    scheduler.reject_loan_request(request.id, OWNER).await.expect("reject");

    assert_eq!(code(scheduler.accept_loan_request(request.id, STRANGER).await), ErrorCode::Forbidden);
    assert_eq!(code(scheduler.cancel_loan_request(request.id, STRANGER).await), ErrorCode::Forbidden);
}

#[tokio::test]
async fn test_terminal_requests_stay_terminal() {
    let h = Harness::new();
    let (item, _) = h.item_with_window().await;
    let scheduler = &h.services.scheduler;

    let accepted = scheduler
        .create_loan_request(item.id, BORROWER, d(6, 1), d(6, 3), None)
        .await
        .expect("request");
    scheduler.accept_loan_request(accepted.id, OWNER).await.expect("accept");

    assert_eq!(code(scheduler.accept_loan_request(accepted.id, OWNER).await), ErrorCode::RequestNotPending);
    assert_eq!(code(scheduler.reject_loan_request(accepted.id, OWNER).await), ErrorCode::RequestNotPending);
    assert_eq!(
        code(scheduler.cancel_loan_request(accepted.id, BORROWER).await),
        ErrorCode::CannotCancelNonPending
    );

    let cancelled = scheduler
        .create_loan_request(item.id, BORROWER, d(6, 5), d(6, 7), None)
        .await
        .expect("request");
    let cancelled = scheduler
        .cancel_loan_request(cancelled.id, BORROWER)
        .await
        .expect("cancel");
    assert_eq!(cancelled.status, LoanRequestStatus::Cancelled);
    assert_eq!(code(scheduler.accept_loan_request(cancelled.id, OWNER).await), ErrorCode::RequestNotPending);

    let rejected = scheduler
        .create_loan_request(item.id, NEIGHBOR, d(6, 7), d(6, 9), None)
        .await
        .expect("request");
    let rejected = scheduler.reject_loan_request(rejected.id, OWNER).await.expect("reject");
    assert_eq!(rejected.status, LoanRequestStatus::Rejected);
    assert_eq!(
        code(scheduler.cancel_loan_request(rejected.id, NEIGHBOR).await),
        ErrorCode::CannotCancelNonPending
    );
}

#[tokio::test]
async fn test_returned_loan_is_closed() {
    let h = Harness::new();
    let (item, _) = h.item_with_window().await;
    let scheduler = &h.services.scheduler;

    let request = scheduler
        .create_loan_request(item.id, BORROWER, d(6, 3), d(6, 5), None)
        .await
        .expect("request");
    let loan = scheduler.accept_loan_request(request.id, OWNER).await.expect("accept");

    let err = scheduler.return_loan(loan.id, BORROWER, Some(d(6, 2))).await;
    assert_eq!(code(err), ErrorCode::InvalidDates);

    let pending = h
        .services
        .loans
        .request_return(loan.id, BORROWER)
        .await
        .expect("request return");
    assert_eq!(pending.status, LoanStatus::PendingReturn);
    assert_eq!(code(h.services.loans.request_return(loan.id, OWNER).await), ErrorCode::Forbidden);

    let returned = scheduler
        .return_loan(loan.id, OWNER, Some(d(6, 5)))
        .await
        .expect("confirm return");
    assert_eq!(returned.actual_return_date, Some(d(6, 5)));

    assert_eq!(code(scheduler.return_loan(loan.id, BORROWER, None).await), ErrorCode::LoanNotActive);
    assert_eq!(code(h.services.loans.request_return(loan.id, BORROWER).await), ErrorCode::LoanNotActive);
}

#[tokio::test]
async fn test_return_frees_the_dates() {
    let h = Harness::new();
    let (item, window) = h.item_with_window().await;
    let scheduler = &h.services.scheduler;

    let request = scheduler
        .create_loan_request(item.id, BORROWER, d(6, 3), d(6, 5), None)
        .await
        .expect("request");
    let loan = scheduler.accept_loan_request(request.id, OWNER).await.expect("accept");
    scheduler.return_loan(loan.id, BORROWER, Some(d(6, 4))).await.expect("return");

    let window = h.services.availability.get(window.id).await.expect("window");
    assert_eq!(window.status, AvailabilityStatus::Available);
    let range = DateRange::new(d(6, 3), d(6, 5)).expect("range");
    let check = h.services.availability.check(item.id, range).await.expect("check");
    assert!(check.available);
    assert_eq!(check.availability_id, Some(window.id));

    scheduler
        .create_loan_request(item.id, NEIGHBOR, d(6, 3), d(6, 5), None)
        .await
        .expect("dates are free again");
}

// ---------------------------------------------------------------------------
// Overdue
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_overdue_marking_is_idempotent() {
    let h = Harness::new();
    let (item, _) = h.item_with_window().await;
    let scheduler = &h.services.scheduler;

    let request = scheduler
        .create_loan_request(item.id, BORROWER, d(6, 3), d(6, 5), None)
        .await
        .expect("request");
    let loan = scheduler.accept_loan_request(request.id, OWNER).await.expect("accept");

    h.clock.set(d(6, 5));
    assert!(scheduler.list_overdue_loans(BORROWER).await.expect("list").is_empty());

    h.clock.set(d(6, 6));
    let overdue = scheduler.list_overdue_loans(BORROWER).await.expect("list");
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].id, loan.id);
    assert_eq!(overdue[0].status, LoanStatus::Overdue);

    // the owner sees it too, and nothing changes on a second pass
    let again = scheduler.list_overdue_loans(OWNER).await.expect("list");
    assert_eq!(again, overdue);
    assert_eq!(h.services.loans.sweep_overdue().await.expect("sweep"), 0);
    assert!(scheduler.list_overdue_loans(NEIGHBOR).await.expect("list").is_empty());

    let returned = scheduler
        .return_loan(loan.id, BORROWER, None)
        .await
        .expect("overdue loans can be returned");
    assert_eq!(returned.actual_return_date, Some(d(6, 6)));
}

#[tokio::test]
async fn test_sweep_covers_every_loan() {
    let h = Harness::new();
    let (item, _) = h.item_with_window().await;
    let scheduler = &h.services.scheduler;

    for (borrower, start, end) in [(BORROWER, 1, 3), (NEIGHBOR, 3, 5), (BORROWER, 7, 9)] {
        let request = scheduler
            .create_loan_request(item.id, borrower, d(6, start), d(6, end), None)
            .await
            .expect("request");
        scheduler.accept_loan_request(request.id, OWNER).await.expect("accept");
    }

    h.clock.set(d(6, 6));
    assert_eq!(h.services.loans.sweep_overdue().await.expect("sweep"), 2);
    assert_eq!(h.services.loans.sweep_overdue().await.expect("sweep"), 0);

    let active = h
        .services
        .loans
        .list_for_user(OWNER, Some(LoanStatus::Active))
        .await
        .expect("list");
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].start_date, d(6, 7));
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_accepts_yield_one_loan() {
    let h = Harness::new();
    let (item, _) = h.item_with_window().await;
    let scheduler = h.services.scheduler.clone();

    let a = scheduler
        .create_loan_request(item.id, BORROWER, d(6, 2), d(6, 6), None)
        .await
        .expect("request a");
    let b = scheduler
        .create_loan_request(item.id, NEIGHBOR, d(6, 4), d(6, 8), None)
        .await
        .expect("request b");

    let first = tokio::spawn({
        let scheduler = scheduler.clone();
        async move { scheduler.accept_loan_request(a.id, OWNER).await }
    });
    let second = tokio::spawn({
        let scheduler = scheduler.clone();
        async move { scheduler.accept_loan_request(b.id, OWNER).await }
    });

    let results = [first.await.expect("join"), second.await.expect("join")];
    let accepted = results.iter().filter(|r| r.is_ok()).count();
    let refused: Vec<ErrorCode> = results
        .iter()
        .filter_map(|r| r.as_ref().err().map(AppError::code))
        .collect();
    assert_eq!(accepted, 1);
    assert_eq!(refused, vec![ErrorCode::ItemNoLongerAvailable]);

    let loans = h.services.loans.list_for_user(OWNER, None).await.expect("loans");
    assert_eq!(loans.len(), 1);
}

// ---------------------------------------------------------------------------
// Slots and windows
// ---------------------------------------------------------------------------

fn slot(start: NaiveDate, end: NaiveDate, status: Option<SlotStatus>) -> CreateSlot {
    CreateSlot {
        start_date: start,
        end_date: end,
        status,
    }
}

#[tokio::test]
async fn test_reserved_slot_blocks_requests_until_cancelled() {
    let h = Harness::new();
    let (item, window) = h.item_with_window().await;
    let slots = &h.services.slots;

    let reserved = slots
        .create(window.id, OWNER, slot(d(6, 2), d(6, 4), None))
        .await
        .expect("reserve");
    assert_eq!(reserved.status, SlotStatus::Reserved);
    let current = h.services.availability.get(window.id).await.expect("window");
    assert_eq!(current.status, AvailabilityStatus::PartiallyBooked);

    let err = h
        .services
        .scheduler
        .create_loan_request(item.id, BORROWER, d(6, 3), d(6, 5), None)
        .await;
    assert_eq!(code(err), ErrorCode::ItemNotAvailable);

    let released = slots.cancel(reserved.id, OWNER).await.expect("cancel");
    assert_eq!(released.status, SlotStatus::Available);
    assert_eq!(code(slots.cancel(reserved.id, OWNER).await), ErrorCode::SlotNotReserved);
    let current = h.services.availability.get(window.id).await.expect("window");
    assert_eq!(current.status, AvailabilityStatus::Available);

    h.services
        .scheduler
        .create_loan_request(item.id, BORROWER, d(6, 3), d(6, 5), None)
        .await
        .expect("dates free after cancel");
}

#[tokio::test]
async fn test_slot_write_rules() {
    let h = Harness::new();
    let (_, window) = h.item_with_window().await;
    let slots = &h.services.slots;

    let first = slots
        .create(window.id, OWNER, slot(d(6, 2), d(6, 4), None))
        .await
        .expect("slot");

    assert_eq!(
        code(slots.create(window.id, BORROWER, slot(d(6, 6), d(6, 7), None)).await),
        ErrorCode::Forbidden
    );
    assert_eq!(
        code(slots.create(window.id, OWNER, slot(d(6, 3), d(6, 5), None)).await),
        ErrorCode::SlotOverlap
    );
    assert_eq!(
        code(slots.create(window.id, OWNER, slot(d(6, 8), d(6, 12), None)).await),
        ErrorCode::SlotOutsideAvailability
    );
    assert_eq!(
        code(slots.create(window.id, OWNER, slot(d(6, 5), d(6, 6), Some(SlotStatus::Occupied))).await),
        ErrorCode::InvalidInput
    );
    assert_eq!(
        code(slots.create(window.id, OWNER, slot(d(6, 6), d(6, 6), None)).await),
        ErrorCode::InvalidDates
    );

    // touching the existing slot is fine
    let second = slots
        .create(window.id, OWNER, slot(d(6, 4), d(6, 6), Some(SlotStatus::Available)))
        .await
        .expect("adjacent slot");

    let moved = slots
        .update(
            first.id,
            OWNER,
            UpdateSlot {
                start_date: Some(d(6, 1)),
                ..Default::default()
            },
        )
        .await
        .expect("extend left");
    assert_eq!(moved.start_date, d(6, 1));

    let err = slots
        .update(
            second.id,
            OWNER,
            UpdateSlot {
                start_date: Some(d(6, 3)),
                ..Default::default()
            },
        )
        .await;
    assert_eq!(code(err), ErrorCode::SlotOverlap);

    slots.delete(second.id, OWNER).await.expect("delete");
    assert_eq!(code(slots.get(second.id).await), ErrorCode::NotFound);
}

#[tokio::test]
async fn test_occupied_slot_is_locked_and_splits_available_slots() {
    let h = Harness::new();
    let (item, window) = h.item_with_window().await;
    let slots = &h.services.slots;
    let scheduler = &h.services.scheduler;

    slots
        .create(window.id, OWNER, slot(d(6, 1), d(6, 10), Some(SlotStatus::Available)))
        .await
        .expect("open whole window");

    let request = scheduler
        .create_loan_request(item.id, BORROWER, d(6, 3), d(6, 5), None)
        .await
        .expect("request");
    scheduler.accept_loan_request(request.id, OWNER).await.expect("accept");

    let all = slots.list_by_availability(window.id).await.expect("slots");
    let layout: Vec<(NaiveDate, NaiveDate, SlotStatus)> =
        all.iter().map(|s| (s.start_date, s.end_date, s.status)).collect();
    assert_eq!(
        layout,
        vec![
            (d(6, 1), d(6, 3), SlotStatus::Available),
            (d(6, 3), d(6, 5), SlotStatus::Occupied),
            (d(6, 5), d(6, 10), SlotStatus::Available),
        ]
    );

    let occupied = all
        .iter()
        .find(|s| s.status == SlotStatus::Occupied)
        .expect("occupied slot");
    assert_eq!(occupied.loan_request_id, Some(request.id));
    assert_eq!(code(slots.delete(occupied.id, OWNER).await), ErrorCode::SlotOccupied);
    assert_eq!(code(slots.cancel(occupied.id, OWNER).await), ErrorCode::SlotNotReserved);
    assert_eq!(
        code(slots.update(occupied.id, OWNER, UpdateSlot::default()).await),
        ErrorCode::SlotOccupied
    );

    let available = scheduler
        .get_available_slots(window.id, None, None)
        .await
        .expect("available");
    assert_eq!(available.len(), 2);
    let available = scheduler
        .get_available_slots(window.id, Some(d(6, 4)), Some(d(6, 6)))
        .await
        .expect("available in range");
    assert_eq!(available.len(), 1);
    assert_eq!(available[0].start_date, d(6, 5));
    assert_eq!(
        code(scheduler.get_available_slots(window.id, Some(d(6, 4)), None).await),
        ErrorCode::InvalidDates
    );
    assert_eq!(
        code(scheduler.get_available_slots(window.id, None, Some(d(6, 6))).await),
        ErrorCode::InvalidDates
    );

    let conflicts = scheduler
        .check_slot_conflicts(window.id, d(6, 2), d(6, 4), None)
        .await
        .expect("conflicts");
    assert_eq!(conflicts.len(), 2);
    let conflicts = scheduler
        .check_slot_conflicts(window.id, d(6, 2), d(6, 4), Some(occupied.id))
        .await
        .expect("conflicts excluding the occupied slot");
    assert_eq!(conflicts.len(), 1);

    let by_request = slots
        .list_by_loan_request(request.id, BORROWER)
        .await
        .expect("request slots");
    assert_eq!(by_request.len(), 1);
    assert_eq!(
        code(slots.list_by_loan_request(request.id, STRANGER).await),
        ErrorCode::Forbidden
    );
    let filtered = slots
        .list(&SlotFilter {
            item_id: Some(item.id),
            status: Some(SlotStatus::Occupied),
            ..Default::default()
        })
        .await
        .expect("filter");
    assert_eq!(filtered.len(), 1);
}

#[tokio::test]
async fn test_window_update_keeps_slots_inside() {
    let h = Harness::new();
    let (item, window) = h.item_with_window().await;
    let availability = &h.services.availability;

    h.services
        .slots
        .create(window.id, OWNER, slot(d(6, 6), d(6, 8), None))
        .await
        .expect("slot");

    let err = availability
        .update(
            window.id,
            OWNER,
            UpdateAvailability {
                end_date: Some(d(6, 7)),
                ..Default::default()
            },
        )
        .await;
    assert_eq!(code(err), ErrorCode::SlotOutsideAvailability);

    let err = availability
        .update(
            window.id,
            OWNER,
            UpdateAvailability {
                start_date: Some(d(5, 1)),
                ..Default::default()
            },
        )
        .await;
    assert_eq!(code(err), ErrorCode::PastDate);

    let updated = availability
        .update(
            window.id,
            OWNER,
            UpdateAvailability {
                end_date: Some(d(6, 20)),
                ..Default::default()
            },
        )
        .await
        .expect("extend window");
    assert_eq!(updated.end_date, d(6, 20));
    assert_eq!(updated.status, AvailabilityStatus::PartiallyBooked);

    let closed = availability
        .update(
            window.id,
            OWNER,
            UpdateAvailability {
                status: Some(AvailabilityStatus::Unavailable),
                ..Default::default()
            },
        )
        .await
        .expect("close window");
    assert_eq!(closed.status, AvailabilityStatus::Unavailable);

    let err = h
        .services
        .scheduler
        .create_loan_request(item.id, BORROWER, d(6, 10), d(6, 12), None)
        .await;
    assert_eq!(code(err), ErrorCode::ItemNotAvailable);
}

#[tokio::test]
async fn test_window_delete_cascades_slots_but_not_loans() {
    let h = Harness::new();
    let (item, window) = h.item_with_window().await;

    h.services
        .slots
        .create(window.id, OWNER, slot(d(6, 6), d(6, 8), None))
        .await
        .expect("slot");
    let second = h
        .services
        .availability
        .create(
            item.id,
            OWNER,
            CreateAvailability {
                start_date: d(7, 1),
                end_date: d(7, 10),
                status: None,
            },
        )
        .await
        .expect("second window");
    let request = h
        .services
        .scheduler
        .create_loan_request(item.id, BORROWER, d(7, 2), d(7, 4), None)
        .await
        .expect("request");
    h.services
        .scheduler
        .accept_loan_request(request.id, OWNER)
        .await
        .expect("accept");

    assert_eq!(
        code(h.services.availability.delete(window.id, BORROWER).await),
        ErrorCode::Forbidden
    );
    assert_eq!(
        code(h.services.availability.delete(second.id, OWNER).await),
        ErrorCode::SlotOccupied
    );

    h.services
        .availability
        .delete(window.id, OWNER)
        .await
        .expect("delete first window");
    let remaining = h.services.availability.list_by_item(item.id).await.expect("windows");
    assert_eq!(remaining.len(), 1);
    assert!(h
        .services
        .slots
        .list(&SlotFilter::for_availability(window.id))
        .await
        .expect("slots")
        .is_empty());
}

#[tokio::test]
async fn test_publishing_requires_ownership_and_future_dates() {
    let h = Harness::new();
    let item = h.item().await;
    let scheduler = &h.services.scheduler;

    assert_eq!(
        code(scheduler.create_availability(item.id, BORROWER, d(6, 1), d(6, 10)).await),
        ErrorCode::Forbidden
    );
    assert_eq!(
        code(scheduler.create_availability(item.id, OWNER, d(5, 1), d(6, 10)).await),
        ErrorCode::PastDate
    );
    assert_eq!(
        code(scheduler.create_availability(item.id, OWNER, d(6, 10), d(6, 1)).await),
        ErrorCode::InvalidDates
    );
    assert_eq!(
        code(scheduler.create_availability(999, OWNER, d(6, 1), d(6, 10)).await),
        ErrorCode::NotFound
    );
}

// ---------------------------------------------------------------------------
// Item lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_item_delete_cascades_everything() {
    let h = Harness::new();
    let (item, window) = h.item_with_window().await;
    let scheduler = &h.services.scheduler;

    h.services
        .slots
        .create(window.id, OWNER, slot(d(6, 8), d(6, 9), None))
        .await
        .expect("slot");
    let accepted = scheduler
        .create_loan_request(item.id, BORROWER, d(6, 1), d(6, 3), None)
        .await
        .expect("request");
    let loan = scheduler.accept_loan_request(accepted.id, OWNER).await.expect("accept");
    scheduler
        .create_loan_request(item.id, NEIGHBOR, d(6, 4), d(6, 6), None)
        .await
        .expect("pending request");

    assert_eq!(code(h.services.items.delete(item.id, BORROWER).await), ErrorCode::Forbidden);
    h.services.items.delete(item.id, OWNER).await.expect("delete item");

    assert_eq!(code(h.services.items.get(item.id).await), ErrorCode::NotFound);
    assert_eq!(code(h.services.availability.get(window.id).await), ErrorCode::NotFound);
    assert_eq!(code(h.services.loans.get(loan.id, BORROWER).await), ErrorCode::NotFound);
    assert!(h
        .services
        .loan_requests
        .list_for_borrower(NEIGHBOR, None)
        .await
        .expect("requests")
        .is_empty());
    assert!(h
        .services
        .slots
        .list(&SlotFilter::for_item(item.id))
        .await
        .expect("slots")
        .is_empty());
}

#[tokio::test]
async fn test_listings() {
    let h = Harness::new();
    let (item, _) = h.item_with_window().await;
    let scheduler = &h.services.scheduler;

    let first = scheduler
        .create_loan_request(item.id, BORROWER, d(6, 1), d(6, 3), None)
        .await
        .expect("request");
    let second = scheduler
        .create_loan_request(item.id, NEIGHBOR, d(6, 4), d(6, 6), None)
        .await
        .expect("request");
    scheduler.accept_loan_request(first.id, OWNER).await.expect("accept");

    let incoming = h
        .services
        .loan_requests
        .list_for_item(item.id, OWNER, None)
        .await
        .expect("incoming");
    assert_eq!(incoming.iter().map(|r| r.id).collect::<Vec<_>>(), vec![second.id, first.id]);

    let pending = h
        .services
        .loan_requests
        .list_for_item(item.id, OWNER, Some(LoanRequestStatus::Pending))
        .await
        .expect("pending");
    assert_eq!(pending.len(), 1);
    assert_eq!(
        code(h.services.loan_requests.list_for_item(item.id, BORROWER, None).await),
        ErrorCode::Forbidden
    );

    let outgoing = h
        .services
        .loan_requests
        .list_for_borrower(NEIGHBOR, None)
        .await
        .expect("outgoing");
    assert_eq!(outgoing.len(), 1);

    assert_eq!(h.services.loans.list_for_user(BORROWER, None).await.expect("loans").len(), 1);
    assert_eq!(h.services.loans.list_for_user(OWNER, None).await.expect("loans").len(), 1);
    assert!(h.services.loans.list_for_user(NEIGHBOR, None).await.expect("loans").is_empty());

    let items = h
        .services
        .items
        .list(&lendhood_server::models::item::ItemQuery {
            category: Some("garden".to_string()),
            ..Default::default()
        })
        .await
        .expect("items");
    assert_eq!(items.len(), 1);
}
