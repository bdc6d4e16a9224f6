//! Capacity store seam.
//!
//! The store owns the transactional side of the booking critical section:
//! inside one database transaction it re-reads the concert's remaining
//! capacity, refuses to issue a ticket when the counter is zero, and
//! otherwise inserts the ticket row and decrements the counter by exactly
//! one. Any failure between begin and commit rolls the whole attempt back.
//!
//! The transaction's isolation (row-level locking on the concert row) is the
//! secondary safety net behind the distributed lock: even if two holders of
//! different lock generations overlap across a lock-expiry race, two
//! concurrently committing transactions cannot both observe
//! `remaining_capacity > 0` when only one unit remains.

use crate::{ConcertId, Ticket, TicketCategoryId};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur while booking a ticket in the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The referenced concert (or ticket category) does not exist.
    #[error("concert or ticket category not found")]
    NotFound,

    /// The concert's remaining capacity is zero.
    ///
    /// An expected business outcome, distinct from system failures so
    /// callers can translate it into "sold out" rather than a server error.
    #[error("concert capacity exhausted")]
    CapacityExhausted,

    /// The transaction failed and was rolled back; nothing was persisted.
    #[error("database error: {0}")]
    Database(String),
}

/// Atomic check-and-decrement of a concert's remaining capacity.
///
/// # Implementations
///
/// - `PostgresStore` (`gatekeeper-postgres`): production, one sqlx
///   transaction with `SELECT ... FOR UPDATE` on the concert row.
/// - `InMemoryCapacityStore` (`gatekeeper-testing`): deterministic tests.
///
/// # Dyn Compatibility
///
/// Explicit `Pin<Box<dyn Future>>` returns so the store can be injected as
/// `Arc<dyn CapacityStore>`.
pub trait CapacityStore: Send + Sync {
    /// Issue one ticket for `concert_id` under `category_id`, decrementing
    /// the concert's remaining capacity by exactly one, all in a single
    /// transaction.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`]: no such concert (or category).
    /// - [`StoreError::CapacityExhausted`]: remaining capacity is zero; no
    ///   ticket row is created and the counter is untouched.
    /// - [`StoreError::Database`]: the transaction failed and rolled back;
    ///   capacity and ticket set are unchanged.
    fn book(
        &self,
        concert_id: ConcertId,
        category_id: TicketCategoryId,
    ) -> Pin<Box<dyn Future<Output = Result<Ticket, StoreError>> + Send + '_>>;
}
