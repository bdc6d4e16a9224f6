//! Application state for the Gatekeeper HTTP server.

use gatekeeper_booking::BookingService;
use gatekeeper_postgres::PostgresStore;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply via `Arc`) for each request. Every dependency is
/// injected here at startup - handlers never reach for ambient globals,
/// and in particular the lock handle lives inside the booking service it
/// was constructed with.
#[derive(Clone)]
pub struct AppState {
    /// Query surface for concerts, tickets and categories.
    pub store: Arc<PostgresStore>,
    /// The booking critical section (lock + transactional decrement).
    pub booking: Arc<BookingService>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub const fn new(store: Arc<PostgresStore>, booking: Arc<BookingService>) -> Self {
        Self { store, booking }
    }
}
