//! Service-level tests for `BookingService` over the in-memory seams.
//!
//! These cover the properties the whole system exists for: no oversell
//! under concurrency, the lock released on every branch (including forced
//! cancellation), strict capacity monotonicity, and atomicity of failed
//! attempts.

#![allow(clippy::expect_used, clippy::panic)] // Test code panics loudly on failure

use gatekeeper_booking::{BookingError, BookingService};
use gatekeeper_core::{CapacityStore, LockCoordinator, LockError, LockToken, StoreError, Ticket};
use gatekeeper_testing::{InMemoryCapacityStore, InMemoryLockCoordinator};
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

fn service(
    lock: &Arc<InMemoryLockCoordinator>,
    store: &Arc<InMemoryCapacityStore>,
) -> Arc<BookingService> {
    let lock_dyn: Arc<dyn LockCoordinator> = lock.clone();
    let store_dyn: Arc<dyn CapacityStore> = store.clone();
    Arc::new(BookingService::new(lock_dyn, store_dyn))
}

/// Book with caller-side retry on `Busy`, the way an HTTP client would.
/// `Busy` is backpressure, so terminal outcomes are ticket or exhaustion.
async fn book_until_terminal(
    service: &BookingService,
    concert_id: i64,
    category_id: i64,
) -> Result<Ticket, BookingError> {
    loop {
        match service.book(concert_id, category_id).await {
            Err(BookingError::Busy) => tokio::task::yield_now().await,
            terminal => return terminal,
        }
    }
}

#[tokio::test]
async fn capacity_one_two_concurrent_bookings_issue_one_ticket() {
    // Scenario: the last ticket is contested by two concurrent buyers.
    let lock = Arc::new(InMemoryLockCoordinator::new());
    let store = Arc::new(InMemoryCapacityStore::new());
    store.insert_concert(1, 1);
    let service = service(&lock, &store);

    let a = tokio::spawn({
        let service = Arc::clone(&service);
        async move { book_until_terminal(&service, 1, 10).await }
    });
    let b = tokio::spawn({
        let service = Arc::clone(&service);
        async move { book_until_terminal(&service, 1, 10).await }
    });

    let outcomes = [a.await.expect("no panic"), b.await.expect("no panic")];
    let wins = outcomes.iter().filter(|r| r.is_ok()).count();
    let exhausted = outcomes
        .iter()
        .filter(|r| matches!(r, Err(BookingError::CapacityExhausted)))
        .count();

    assert_eq!(wins, 1, "exactly one buyer gets the last ticket");
    assert_eq!(exhausted, 1);
    assert_eq!(store.ticket_count(1), 1);
    assert_eq!(store.remaining_capacity(1), Some(0));
}

#[tokio::test]
async fn held_lock_means_busy_and_zero_store_interaction() {
    // Scenario: another in-flight booking holds the concert's lock.
    let lock = Arc::new(InMemoryLockCoordinator::new());
    let store = Arc::new(InMemoryCapacityStore::new());
    store.insert_concert(1, 5);
    let service = service(&lock, &store);

    let held = lock
        .acquire(&service.lock_key(1))
        .await
        .expect("simulated in-flight booking");

    let outcome = service.book(1, 10).await;
    assert_eq!(outcome, Err(BookingError::Busy));
    assert_eq!(store.book_calls(), 0, "Busy must never reach the store");
    assert_eq!(store.remaining_capacity(1), Some(5));

    lock.release(held).await.expect("release");
    assert!(service.book(1, 10).await.is_ok(), "free lock books normally");
}

#[tokio::test]
async fn sequential_bookings_are_monotonic_with_distinct_serials() {
    // Scenario: five sequential bookings drain a capacity of five.
    let lock = Arc::new(InMemoryLockCoordinator::new());
    let store = Arc::new(InMemoryCapacityStore::new());
    store.insert_concert(1, 5);
    let service = service(&lock, &store);

    let mut serials = HashSet::new();
    for expected_remaining in (0..5).rev() {
        let ticket = service.book(1, 10).await.expect("within capacity");
        assert!(serials.insert(ticket.serial_number));
        assert_eq!(store.remaining_capacity(1), Some(expected_remaining));
        assert!(
            !lock.is_held(&service.lock_key(1)),
            "lock released after every booking"
        );
    }

    assert_eq!(
        service.book(1, 10).await,
        Err(BookingError::CapacityExhausted)
    );
    assert_eq!(store.ticket_count(1), 5);
}

#[tokio::test]
async fn transaction_failure_is_internal_and_leaves_no_trace() {
    // Scenario: the store transaction dies mid-commit.
    let lock = Arc::new(InMemoryLockCoordinator::new());
    let store = Arc::new(InMemoryCapacityStore::new());
    store.insert_concert(1, 5);
    let service = service(&lock, &store);

    store.fail_next_booking();
    let outcome = service.book(1, 10).await;
    assert!(matches!(outcome, Err(BookingError::Internal(_))));

    assert_eq!(store.remaining_capacity(1), Some(5), "capacity unchanged");
    assert_eq!(store.ticket_count(1), 0, "no ticket row");
    assert!(!lock.is_held(&service.lock_key(1)), "lock released");

    // Subsequent attempts proceed normally.
    assert!(service.book(1, 10).await.is_ok());
    assert_eq!(store.remaining_capacity(1), Some(4));
}

#[tokio::test]
async fn unknown_concert_maps_to_not_found_and_releases() {
    let lock = Arc::new(InMemoryLockCoordinator::new());
    let store = Arc::new(InMemoryCapacityStore::new());
    let service = service(&lock, &store);

    assert_eq!(service.book(404, 10).await, Err(BookingError::NotFound));
    assert!(!lock.is_held(&service.lock_key(404)));
}

#[tokio::test]
async fn no_oversell_under_heavy_concurrency() {
    let lock = Arc::new(InMemoryLockCoordinator::new());
    let store = Arc::new(InMemoryCapacityStore::new());
    store.insert_concert(1, 3);
    let service = service(&lock, &store);

    let mut handles = Vec::new();
    for _ in 0..12 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(
            async move { book_until_terminal(&service, 1, 10).await },
        ));
    }

    let mut wins = 0;
    let mut exhausted = 0;
    for handle in handles {
        match handle.await.expect("no panic") {
            Ok(_) => wins += 1,
            Err(BookingError::CapacityExhausted) => exhausted += 1,
            Err(other) => panic!("unexpected terminal outcome: {other}"),
        }
    }

    assert_eq!(wins, 3, "tickets issued == min(attempts, capacity)");
    assert_eq!(exhausted, 9);
    assert_eq!(store.ticket_count(1), 3);
    assert_eq!(store.remaining_capacity(1), Some(0));
}

#[tokio::test]
async fn concerts_do_not_contend_with_each_other() {
    let lock = Arc::new(InMemoryLockCoordinator::new());
    let store = Arc::new(InMemoryCapacityStore::new());
    store.insert_concert(1, 1);
    store.insert_concert(2, 1);
    let service = service(&lock, &store);

    // Hold concert 1's lock; concert 2 books regardless.
    let held = lock
        .acquire(&service.lock_key(1))
        .await
        .expect("hold concert 1");
    assert!(service.book(2, 10).await.is_ok());
    lock.release(held).await.expect("release");
}

/// Store whose `book` never completes, standing in for a wedged
/// transaction: lets the test cancel the service future mid-critical-section.
struct HangingStore;

impl CapacityStore for HangingStore {
    fn book(
        &self,
        _concert_id: i64,
        _category_id: i64,
    ) -> Pin<Box<dyn Future<Output = Result<Ticket, StoreError>> + Send + '_>> {
        Box::pin(std::future::pending())
    }
}

#[tokio::test]
async fn cancellation_mid_transaction_still_releases_the_lock() {
    let lock = Arc::new(InMemoryLockCoordinator::new());
    let lock_dyn: Arc<dyn LockCoordinator> = lock.clone();
    let service = Arc::new(BookingService::new(lock_dyn, Arc::new(HangingStore)));
    let key = service.lock_key(1);

    let in_flight = tokio::spawn({
        let service = Arc::clone(&service);
        async move { service.book(1, 10).await }
    });

    // Let the booking acquire the lock and park in the store call.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(lock.is_held(&key), "booking is inside the critical section");

    // Cancel the request; the guard's Drop must spawn the release.
    in_flight.abort();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!lock.is_held(&key), "cancellation must not leak the lock");
}

/// Lock whose backend always fails, to pin the `Internal` mapping.
struct BrokenLock;

impl LockCoordinator for BrokenLock {
    fn acquire<'a>(
        &'a self,
        _key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<LockToken, LockError>> + Send + 'a>> {
        Box::pin(async { Err(LockError::Backend("connection refused".into())) })
    }

    fn release(
        &self,
        _token: LockToken,
    ) -> Pin<Box<dyn Future<Output = Result<(), LockError>> + Send + '_>> {
        Box::pin(async { Ok(()) })
    }
}

#[tokio::test]
async fn lock_backend_failure_maps_to_internal() {
    let store = Arc::new(InMemoryCapacityStore::new());
    store.insert_concert(1, 1);
    let store_dyn: Arc<dyn CapacityStore> = store.clone();
    let service = BookingService::new(Arc::new(BrokenLock), store_dyn);

    let outcome = service.book(1, 10).await;
    assert!(matches!(outcome, Err(BookingError::Internal(_))));
    assert_eq!(store.book_calls(), 0);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Sequential draining: successes == min(attempts, capacity), and
        /// the counter lands exactly at capacity - successes.
        #[test]
        fn sequential_attempts_never_oversell(capacity in 0i64..12, attempts in 0usize..24) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .expect("runtime");
            runtime.block_on(async move {
                let lock = Arc::new(InMemoryLockCoordinator::new());
                let store = Arc::new(InMemoryCapacityStore::new());
                store.insert_concert(1, capacity);
                let service = service(&lock, &store);

                let mut successes = 0i64;
                for _ in 0..attempts {
                    match service.book(1, 10).await {
                        Ok(_) => successes += 1,
                        Err(BookingError::CapacityExhausted) => {}
                        Err(other) => panic!("unexpected outcome: {other}"),
                    }
                }

                let expected = capacity.min(i64::try_from(attempts).expect("small"));
                prop_assert_eq!(successes, expected);
                prop_assert_eq!(store.remaining_capacity(1), Some(capacity - successes));
                prop_assert_eq!(store.ticket_count(1), usize::try_from(successes).expect("small"));
                Ok(())
            })?;
        }
    }
}
