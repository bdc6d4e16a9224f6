//! `PostgreSQL` store for Gatekeeper.
//!
//! This crate provides [`PostgresStore`], the production implementation of
//! the booking system's persistence: the transactional check-and-decrement
//! that implements `gatekeeper_core::CapacityStore`, plus the concert /
//! ticket / ticket-category query surface the HTTP layer manages rows with.
//!
//! # The booking transaction
//!
//! One sqlx transaction per booking attempt:
//!
//! 1. `SELECT remaining_capacity ... FOR UPDATE` - takes the row lock on the
//!    concert; absent row fails `NotFound`.
//! 2. Zero capacity → rollback, `CapacityExhausted`. No ticket row is
//!    created and the counter is untouched.
//! 3. `INSERT INTO ticket ... RETURNING` - the `serial_number` column default
//!    assigns the unique serial at row creation.
//! 4. `UPDATE concert SET remaining_capacity = remaining_capacity - 1`.
//! 5. Commit. Any earlier failure rolls the whole attempt back.
//!
//! The `FOR UPDATE` row lock is what makes the decrement correct under
//! `PostgreSQL`'s default read-committed isolation: two concurrently
//! committing bookings against the same concert serialize on the row, so
//! they can never both observe `remaining_capacity > 0` when only one unit
//! remains - even if the distributed lock above this layer is bypassed or
//! expires mid-flight.
//!
//! # Example
//!
//! ```no_run
//! use gatekeeper_postgres::PostgresStore;
//!
//! # async fn example() -> Result<(), gatekeeper_core::StoreError> {
//! let store = PostgresStore::new("postgres://localhost/gatekeeper").await?;
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

mod store;

pub use store::PostgresStore;
