//! HTTP API handlers.
//!
//! Request and response bodies are explicit typed structures deserialized
//! at the boundary; handlers translate domain outcomes through
//! [`crate::error::AppError`] and never leak storage details.

pub mod concerts;
pub mod ticket_categories;
pub mod tickets;
