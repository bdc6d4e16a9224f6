//! Concert domain types.
//!
//! A concert owns the capacity counter the whole system exists to protect:
//! `remaining_capacity` only decreases through a successful booking
//! transaction or an explicit administrative update, and it never goes
//! negative.

use crate::ConcertId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A concert with a finite ticket capacity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Concert {
    /// Store-assigned identifier.
    pub id: ConcertId,
    /// Concert name.
    pub name: String,
    /// Owning artist reference.
    pub artist_id: i64,
    /// Owning venue reference.
    pub venue_id: i64,
    /// When the concert takes place.
    pub date: DateTime<Utc>,
    /// Tickets this concert may still issue. Never negative.
    pub remaining_capacity: i64,
    /// Row creation instant.
    pub created_at: DateTime<Utc>,
    /// Last row update instant.
    pub updated_at: DateTime<Utc>,
}

/// Arguments for creating a concert.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewConcert {
    /// Concert name.
    pub name: String,
    /// Owning artist reference.
    pub artist_id: i64,
    /// Owning venue reference.
    pub venue_id: i64,
    /// When the concert takes place.
    pub date: DateTime<Utc>,
    /// Initial ticket capacity.
    pub capacity: i64,
}

/// Partial update of a concert.
///
/// `None` fields are left unchanged. Setting `remaining_capacity` is the
/// administrative capacity adjustment - the only capacity mutation outside
/// the booking transaction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConcertUpdate {
    /// New name, if any.
    pub name: Option<String>,
    /// New artist reference, if any.
    pub artist_id: Option<i64>,
    /// New venue reference, if any.
    pub venue_id: Option<i64>,
    /// New date, if any.
    pub date: Option<DateTime<Utc>>,
    /// New remaining capacity, if any.
    pub remaining_capacity: Option<i64>,
}

impl ConcertUpdate {
    /// Whether the update would change anything.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.artist_id.is_none()
            && self.venue_id.is_none()
            && self.date.is_none()
            && self.remaining_capacity.is_none()
    }
}
