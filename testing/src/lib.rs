//! # Gatekeeper Testing
//!
//! In-memory implementations of Gatekeeper's coordination seams for fast,
//! deterministic tests:
//!
//! - [`InMemoryLockCoordinator`] - single-process stand-in for the Redis
//!   lock: non-blocking acquire, TTL expiry, holder-checked release.
//! - [`InMemoryCapacityStore`] - stand-in for the `PostgreSQL` store with the
//!   same all-or-nothing semantics, plus failure injection for exercising
//!   rolled-back transactions.
//!
//! Neither double touches the network; both honor the exact error taxonomy
//! of the production implementations so service-level tests exercise every
//! branch the real system has.
//!
//! ## Example
//!
//! ```
//! use gatekeeper_core::{CapacityStore, LockCoordinator};
//! use gatekeeper_testing::{InMemoryCapacityStore, InMemoryLockCoordinator};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let lock = InMemoryLockCoordinator::new();
//! let store = InMemoryCapacityStore::new();
//! store.insert_concert(1, 2);
//!
//! let token = lock.acquire("booking:concert:1").await.unwrap();
//! let ticket = store.book(1, 10).await.unwrap();
//! lock.release(token).await.unwrap();
//!
//! assert_eq!(store.remaining_capacity(1), Some(1));
//! assert_eq!(ticket.concert_id, 1);
//! # }
//! ```

mod capacity_store;
mod lock;

pub use capacity_store::InMemoryCapacityStore;
pub use lock::InMemoryLockCoordinator;
