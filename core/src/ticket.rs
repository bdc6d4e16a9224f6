//! Ticket domain type.

use crate::{ConcertId, TicketCategoryId, TicketId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A ticket issued for a concert.
///
/// Created exactly once per successful booking, inside the same transaction
/// that decrements the concert's remaining capacity. Never mutated
/// afterwards; cancellation deletes the row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Store-assigned identifier.
    pub id: TicketId,
    /// Unique serial number, assigned by the store on creation.
    pub serial_number: String,
    /// Concert this ticket admits to.
    pub concert_id: ConcertId,
    /// Category the ticket was sold under.
    pub ticket_category_id: TicketCategoryId,
    /// Row creation instant.
    pub created_at: DateTime<Utc>,
    /// Last row update instant.
    pub updated_at: DateTime<Utc>,
}
