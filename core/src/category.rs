//! Ticket category domain types.
//!
//! Categories describe what a ticket is (description, price, validity
//! window). They are independent of capacity accounting - the counter lives
//! on the concert.

use crate::{ConcertId, TicketCategoryId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A ticket category belonging to a concert.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TicketCategory {
    /// Store-assigned identifier.
    pub id: TicketCategoryId,
    /// Owning concert.
    pub concert_id: ConcertId,
    /// Human-readable description (e.g. "VIP", "Festival A").
    pub description: String,
    /// Ticket price.
    pub price: f64,
    /// Start of the validity window.
    pub start_date: DateTime<Utc>,
    /// End of the validity window.
    pub end_date: DateTime<Utc>,
    /// Row creation instant.
    pub created_at: DateTime<Utc>,
    /// Last row update instant.
    pub updated_at: DateTime<Utc>,
}

/// Arguments for creating a ticket category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewTicketCategory {
    /// Owning concert.
    pub concert_id: ConcertId,
    /// Human-readable description.
    pub description: String,
    /// Ticket price.
    pub price: f64,
    /// Start of the validity window.
    pub start_date: DateTime<Utc>,
    /// End of the validity window.
    pub end_date: DateTime<Utc>,
}

/// Partial update of a ticket category. `None` fields are left unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketCategoryUpdate {
    /// New description, if any.
    pub description: Option<String>,
    /// New price, if any.
    pub price: Option<f64>,
    /// New validity window start, if any.
    pub start_date: Option<DateTime<Utc>>,
    /// New validity window end, if any.
    pub end_date: Option<DateTime<Utc>>,
}
