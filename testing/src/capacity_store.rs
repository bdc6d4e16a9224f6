//! In-memory capacity store for tests.

use chrono::Utc;
use gatekeeper_core::{CapacityStore, ConcertId, StoreError, Ticket, TicketCategoryId};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

struct Inner {
    remaining: HashMap<ConcertId, i64>,
    tickets: Vec<Ticket>,
    next_ticket_id: i64,
    fail_next: bool,
}

/// In-memory [`CapacityStore`] with the production store's all-or-nothing
/// semantics: a booking either creates exactly one ticket and decrements the
/// concert's counter by one, or leaves both untouched.
///
/// [`fail_next_booking`](Self::fail_next_booking) injects a transaction
/// failure so tests can observe the rolled-back path.
pub struct InMemoryCapacityStore {
    inner: Mutex<Inner>,
    book_calls: AtomicUsize,
}

impl InMemoryCapacityStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                remaining: HashMap::new(),
                tickets: Vec::new(),
                next_ticket_id: 1,
                fail_next: false,
            }),
            book_calls: AtomicUsize::new(0),
        }
    }

    /// How many times `book` has been invoked, successful or not.
    ///
    /// Lets tests assert that a `Busy` rejection never reached the store.
    #[must_use]
    pub fn book_calls(&self) -> usize {
        self.book_calls.load(Ordering::SeqCst)
    }

    /// Register a concert with an initial capacity.
    pub fn insert_concert(&self, concert_id: ConcertId, capacity: i64) {
        self.locked().remaining.insert(concert_id, capacity);
    }

    /// Make the next `book` call fail as a rolled-back transaction,
    /// leaving capacity and tickets untouched.
    pub fn fail_next_booking(&self) {
        self.locked().fail_next = true;
    }

    /// Remaining capacity of a concert, if it exists.
    #[must_use]
    pub fn remaining_capacity(&self, concert_id: ConcertId) -> Option<i64> {
        self.locked().remaining.get(&concert_id).copied()
    }

    /// Number of tickets issued for a concert.
    #[must_use]
    pub fn ticket_count(&self, concert_id: ConcertId) -> usize {
        self.locked()
            .tickets
            .iter()
            .filter(|t| t.concert_id == concert_id)
            .count()
    }

    /// All issued tickets, in creation order.
    #[must_use]
    pub fn tickets(&self) -> Vec<Ticket> {
        self.locked().tickets.clone()
    }

    #[allow(clippy::unwrap_used)] // Mutex poison is unrecoverable in tests
    fn locked(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }
}

impl Default for InMemoryCapacityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CapacityStore for InMemoryCapacityStore {
    fn book(
        &self,
        concert_id: ConcertId,
        category_id: TicketCategoryId,
    ) -> Pin<Box<dyn Future<Output = Result<Ticket, StoreError>> + Send + '_>> {
        Box::pin(async move {
            self.book_calls.fetch_add(1, Ordering::SeqCst);
            let mut inner = self.locked();
            if inner.fail_next {
                inner.fail_next = false;
                return Err(StoreError::Database("injected transaction failure".into()));
            }
            let Some(remaining) = inner.remaining.get(&concert_id).copied() else {
                return Err(StoreError::NotFound);
            };
            if remaining == 0 {
                return Err(StoreError::CapacityExhausted);
            }
            let id = inner.next_ticket_id;
            inner.next_ticket_id += 1;
            let now = Utc::now();
            let ticket = Ticket {
                id,
                serial_number: format!("SN-{id:06}"),
                concert_id,
                ticket_category_id: category_id,
                created_at: now,
                updated_at: now,
            };
            inner.remaining.insert(concert_id, remaining - 1);
            inner.tickets.push(ticket.clone());
            Ok(ticket)
        })
    }
}
