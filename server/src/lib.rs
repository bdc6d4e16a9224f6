//! Gatekeeper HTTP server.
//!
//! Axum application exposing the booking operation and the row management
//! around it:
//!
//! - `POST /api/tickets` - the booking critical section (lock + transaction)
//! - `GET/DELETE /api/tickets/{id}` - ticket lookup and cancellation
//! - `/api/concerts`, `/api/ticket-categories` - CRUD for the managed rows
//! - `/health`, `/ready` - liveness and readiness probes
//!
//! The binary wires configuration, the `PostgreSQL` store, the Redis lock
//! coordinator, and the booking service together in `main`; everything is
//! injected through [`server::AppState`], nothing is reached through
//! process-wide globals.

pub mod api;
pub mod config;
pub mod error;
pub mod server;

pub use config::Config;
pub use error::AppError;
