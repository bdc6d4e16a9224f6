//! Booking orchestration for Gatekeeper.
//!
//! [`BookingService`] composes the two seams from `gatekeeper-core` into the
//! single externally visible operation of the system:
//!
//! 1. Acquire the concert's booking lock. Unavailable → fail immediately
//!    with [`BookingError::Busy`]; the store is never touched.
//! 2. Run the store's transactional check-and-decrement while the lock is
//!    held.
//! 3. Release the lock on every exit path - awaited explicitly after the
//!    store call (success or failure alike), and spawned from the guard's
//!    `Drop` if the in-flight future is cancelled. There is no path that
//!    leaves the lock held.
//! 4. Map store outcomes 1:1 into the service taxonomy.
//!
//! ```text
//! Idle ─► LockHeld ─► TransactionOpen ─► {Committed | RolledBack}
//!                                              │
//!                        Idle ◄── LockReleased ◄┘
//! ```
//!
//! # Lock scope
//!
//! Lock keys are per concert (`{prefix}:concert:{id}`), so bookings for
//! unrelated concerts proceed concurrently while each concert's capacity
//! check stays serialized. The store's row lock remains the safety net for
//! the one window the distributed lock cannot cover: two holders of
//! different lock generations overlapping across a TTL expiry.
//!
//! Nothing here retries, and nothing caches capacity: every attempt
//! re-reads the counter under lock and transaction. Retrying a `Busy`
//! outcome is the caller's policy.

use gatekeeper_core::{
    CapacityStore, ConcertId, LockCoordinator, LockError, LockGuard, StoreError, Ticket,
    TicketCategoryId,
};
use std::sync::Arc;
use thiserror::Error;

/// Default prefix for booking lock keys.
const DEFAULT_LOCK_KEY_PREFIX: &str = "booking";

/// Errors a booking attempt can surface to callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// Another booking holds this concert's critical section right now.
    ///
    /// Backpressure, retryable by the caller; the store was not touched.
    #[error("booking service busy, retry later")]
    Busy,

    /// The referenced concert (or ticket category) does not exist.
    #[error("concert or ticket category not found")]
    NotFound,

    /// The concert is sold out.
    ///
    /// An expected business outcome, distinct from operational faults.
    #[error("concert is sold out")]
    CapacityExhausted,

    /// An operational fault: lock backend or database failure.
    #[error("internal booking failure: {0}")]
    Internal(String),
}

/// Orchestrates the booking critical section.
///
/// Both collaborators are injected at construction - the lock handle is an
/// explicit dependency, never ambient process state.
pub struct BookingService {
    lock: Arc<dyn LockCoordinator>,
    store: Arc<dyn CapacityStore>,
    lock_key_prefix: String,
}

impl BookingService {
    /// Create a service with the default lock key prefix.
    #[must_use]
    pub fn new(lock: Arc<dyn LockCoordinator>, store: Arc<dyn CapacityStore>) -> Self {
        Self::with_lock_key_prefix(lock, store, DEFAULT_LOCK_KEY_PREFIX)
    }

    /// Create a service whose lock keys start with `prefix`.
    ///
    /// Deployments sharing one Redis instance across environments use the
    /// prefix to keep their critical sections apart.
    #[must_use]
    pub fn with_lock_key_prefix(
        lock: Arc<dyn LockCoordinator>,
        store: Arc<dyn CapacityStore>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            lock,
            store,
            lock_key_prefix: prefix.into(),
        }
    }

    /// The lock key serializing bookings for `concert_id`.
    #[must_use]
    pub fn lock_key(&self, concert_id: ConcertId) -> String {
        format!("{}:concert:{}", self.lock_key_prefix, concert_id)
    }

    /// Book one ticket for `concert_id` under `category_id`.
    ///
    /// # Errors
    ///
    /// - [`BookingError::Busy`]: the concert's lock is held elsewhere; no
    ///   store access was attempted.
    /// - [`BookingError::NotFound`]: no such concert or category.
    /// - [`BookingError::CapacityExhausted`]: sold out.
    /// - [`BookingError::Internal`]: lock backend or transaction failure;
    ///   nothing was persisted.
    pub async fn book(
        &self,
        concert_id: ConcertId,
        category_id: TicketCategoryId,
    ) -> Result<Ticket, BookingError> {
        let key = self.lock_key(concert_id);

        let token = match self.lock.acquire(&key).await {
            Ok(token) => token,
            Err(LockError::Unavailable(_)) => {
                tracing::info!(concert_id, key = %key, "booking lock unavailable");
                return Err(BookingError::Busy);
            }
            Err(LockError::Backend(reason)) => {
                tracing::error!(concert_id, %reason, "lock backend failure");
                return Err(BookingError::Internal(reason));
            }
        };
        tracing::info!(concert_id, key = %key, "booking lock acquired");

        // From here to release() the guard owns the critical section; if
        // this future is dropped mid-transaction the guard's Drop still
        // spawns the release.
        let guard = LockGuard::new(Arc::clone(&self.lock), token);

        let outcome = self.store.book(concert_id, category_id).await;

        // Unconditional cleanup, awaited so the release is observable
        // before we return, whatever the outcome was.
        match guard.release().await {
            Ok(()) => tracing::info!(concert_id, key = %key, "booking lock released"),
            Err(error) => {
                tracing::warn!(concert_id, %error, "lock release failed, TTL will reclaim");
            }
        }

        match outcome {
            Ok(ticket) => {
                tracing::info!(
                    concert_id,
                    ticket_id = ticket.id,
                    serial_number = %ticket.serial_number,
                    "booking succeeded"
                );
                Ok(ticket)
            }
            Err(StoreError::NotFound) => {
                tracing::info!(concert_id, "booking failed: concert or category not found");
                Err(BookingError::NotFound)
            }
            Err(StoreError::CapacityExhausted) => {
                tracing::info!(concert_id, "booking failed: sold out");
                Err(BookingError::CapacityExhausted)
            }
            Err(StoreError::Database(reason)) => {
                tracing::error!(concert_id, %reason, "booking transaction failed");
                Err(BookingError::Internal(reason))
            }
        }
    }
}
