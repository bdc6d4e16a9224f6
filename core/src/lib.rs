//! # Gatekeeper Core
//!
//! Domain types and coordination seams for the Gatekeeper booking backend.
//!
//! The one genuinely hard problem in this system is preventing oversell of a
//! concert's remaining ticket capacity under concurrent booking requests that
//! may arrive at independent server processes. This crate defines the two
//! seams that problem is solved across:
//!
//! - [`lock::LockCoordinator`] - cross-process mutual exclusion on a named
//!   key, with a TTL bounding worst-case unavailability if a holder crashes.
//! - [`store::CapacityStore`] - the transactional read-check-decrement-insert
//!   that issues a ticket only while capacity remains.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  BookingService  │  (gatekeeper-booking)
//! └───────┬──────────┘
//!         │ acquire / release          book (one transaction)
//!         ▼                            ▼
//! ┌──────────────────┐        ┌──────────────────┐
//! │ LockCoordinator  │        │  CapacityStore   │
//! └───────┬──────────┘        └───────┬──────────┘
//!         │                           │
//!         ▼                           ▼
//!   Redis (gatekeeper-lock)     PostgreSQL (gatekeeper-postgres)
//! ```
//!
//! Both traits are dyn-compatible so implementations can be injected as
//! `Arc<dyn ...>` - the lock handle is an explicit constructor dependency,
//! never a process-wide singleton.
//!
//! # Implementations
//!
//! - `RedisLockCoordinator` / `PostgresStore` (production)
//! - `InMemoryLockCoordinator` / `InMemoryCapacityStore`
//!   (`gatekeeper-testing`, fast and deterministic)

pub mod category;
pub mod concert;
pub mod lock;
pub mod store;
pub mod ticket;

pub use category::{NewTicketCategory, TicketCategory, TicketCategoryUpdate};
pub use concert::{Concert, ConcertUpdate, NewConcert};
pub use lock::{LockCoordinator, LockError, LockGuard, LockToken};
pub use store::{CapacityStore, StoreError};
pub use ticket::Ticket;

/// Identifier of a concert row, assigned by the store.
pub type ConcertId = i64;

/// Identifier of a ticket category row, assigned by the store.
pub type TicketCategoryId = i64;

/// Identifier of a ticket row, assigned by the store.
pub type TicketId = i64;
