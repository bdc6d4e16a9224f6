//! `PostgresStore` implementation.

use chrono::{DateTime, Utc};
use gatekeeper_core::{
    CapacityStore, Concert, ConcertId, ConcertUpdate, NewConcert, NewTicketCategory, StoreError,
    Ticket, TicketCategory, TicketCategoryId, TicketCategoryUpdate, TicketId,
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::future::Future;
use std::pin::Pin;

/// Row shape shared by every concert-returning query.
type ConcertRow = (
    i64,
    String,
    i64,
    i64,
    DateTime<Utc>,
    i64,
    DateTime<Utc>,
    DateTime<Utc>,
);

/// Row shape shared by every ticket-returning query.
type TicketRow = (i64, String, i64, i64, DateTime<Utc>, DateTime<Utc>);

/// Row shape shared by every category-returning query.
type CategoryRow = (
    i64,
    i64,
    String,
    f64,
    DateTime<Utc>,
    DateTime<Utc>,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn concert_from_row(row: ConcertRow) -> Concert {
    let (id, name, artist_id, venue_id, date, remaining_capacity, created_at, updated_at) = row;
    Concert {
        id,
        name,
        artist_id,
        venue_id,
        date,
        remaining_capacity,
        created_at,
        updated_at,
    }
}

fn ticket_from_row(row: TicketRow) -> Ticket {
    let (id, serial_number, concert_id, ticket_category_id, created_at, updated_at) = row;
    Ticket {
        id,
        serial_number,
        concert_id,
        ticket_category_id,
        created_at,
        updated_at,
    }
}

fn category_from_row(row: CategoryRow) -> TicketCategory {
    let (id, concert_id, description, price, start_date, end_date, created_at, updated_at) = row;
    TicketCategory {
        id,
        concert_id,
        description,
        price,
        start_date,
        end_date,
        created_at,
        updated_at,
    }
}

/// Map a sqlx error into the store taxonomy.
///
/// Foreign-key violations surface as `NotFound` - the referenced concert or
/// category does not exist. Everything else is a rolled-back transaction.
fn storage_error(context: &str, error: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_error) = &error {
        if db_error.is_foreign_key_violation() {
            return StoreError::NotFound;
        }
    }
    StoreError::Database(format!("{context}: {error}"))
}

/// `PostgreSQL`-backed booking store.
///
/// Owns the connection pool; cheap to clone.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect to `PostgreSQL` at `database_url` with default pool sizing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the connection fails.
    pub async fn new(database_url: &str) -> Result<Self, StoreError> {
        Self::with_max_connections(database_url, 10).await
    }

    /// Connect with an explicit pool size.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the connection fails.
    pub async fn with_max_connections(
        database_url: &str,
        max_connections: u32,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Database(format!("failed to connect: {e}")))?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool (used by tests that manage their own pool).
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    ///
    /// Useful for health checks or custom queries.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations, creating the booking schema if absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("migration failed: {e}")))?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Booking critical section
    // ------------------------------------------------------------------

    /// Issue one ticket and decrement the concert's capacity, atomically.
    ///
    /// See the crate docs for the transaction walkthrough. This is the
    /// method behind the `CapacityStore` impl.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`]: no such concert, or the category
    ///   reference is invalid.
    /// - [`StoreError::CapacityExhausted`]: remaining capacity is zero.
    /// - [`StoreError::Database`]: the transaction failed and rolled back.
    pub async fn book_ticket(
        &self,
        concert_id: ConcertId,
        category_id: TicketCategoryId,
    ) -> Result<Ticket, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Database(format!("failed to begin transaction: {e}")))?;

        // Row lock on the concert: concurrent bookings of the same concert
        // serialize here until our commit or rollback.
        let remaining: Option<(i64,)> =
            sqlx::query_as("SELECT remaining_capacity FROM concert WHERE id = $1 FOR UPDATE")
                .bind(concert_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| storage_error("failed to read capacity", e))?;

        let Some((remaining,)) = remaining else {
            let _ = tx.rollback().await; // Ignore rollback errors
            return Err(StoreError::NotFound);
        };

        if remaining == 0 {
            let _ = tx.rollback().await;
            return Err(StoreError::CapacityExhausted);
        }

        let ticket_row: TicketRow = sqlx::query_as(
            "INSERT INTO ticket (concert_id, ticket_category_id)
             VALUES ($1, $2)
             RETURNING id, serial_number, concert_id, ticket_category_id,
                       created_at, updated_at",
        )
        .bind(concert_id)
        .bind(category_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| storage_error("failed to insert ticket", e))?;

        sqlx::query(
            "UPDATE concert
             SET remaining_capacity = remaining_capacity - 1, updated_at = now()
             WHERE id = $1",
        )
        .bind(concert_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| storage_error("failed to decrement capacity", e))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Database(format!("failed to commit booking: {e}")))?;

        let ticket = ticket_from_row(ticket_row);
        tracing::debug!(
            concert_id,
            ticket_id = ticket.id,
            serial_number = %ticket.serial_number,
            "ticket booked"
        );
        Ok(ticket)
    }

    // ------------------------------------------------------------------
    // Concerts
    // ------------------------------------------------------------------

    /// Create a concert with its initial capacity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the insert fails.
    pub async fn create_concert(&self, new: &NewConcert) -> Result<Concert, StoreError> {
        let row: ConcertRow = sqlx::query_as(
            "INSERT INTO concert (name, artist_id, venue_id, date, remaining_capacity)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, name, artist_id, venue_id, date, remaining_capacity,
                       created_at, updated_at",
        )
        .bind(&new.name)
        .bind(new.artist_id)
        .bind(new.venue_id)
        .bind(new.date)
        .bind(new.capacity)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_error("failed to create concert", e))?;
        Ok(concert_from_row(row))
    }

    /// Fetch a concert by id.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`]: no such concert.
    /// - [`StoreError::Database`]: the query failed.
    pub async fn get_concert(&self, id: ConcertId) -> Result<Concert, StoreError> {
        let row: Option<ConcertRow> = sqlx::query_as(
            "SELECT id, name, artist_id, venue_id, date, remaining_capacity,
                    created_at, updated_at
             FROM concert WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("failed to fetch concert", e))?;
        row.map(concert_from_row).ok_or(StoreError::NotFound)
    }

    /// Apply a partial update to a concert.
    ///
    /// Unset fields keep their current values. Setting `remaining_capacity`
    /// is the administrative capacity adjustment.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`]: no such concert.
    /// - [`StoreError::Database`]: the update failed.
    pub async fn update_concert(
        &self,
        id: ConcertId,
        update: &ConcertUpdate,
    ) -> Result<Concert, StoreError> {
        let row: Option<ConcertRow> = sqlx::query_as(
            "UPDATE concert
             SET name = COALESCE($2, name),
                 artist_id = COALESCE($3, artist_id),
                 venue_id = COALESCE($4, venue_id),
                 date = COALESCE($5, date),
                 remaining_capacity = COALESCE($6, remaining_capacity),
                 updated_at = now()
             WHERE id = $1
             RETURNING id, name, artist_id, venue_id, date, remaining_capacity,
                       created_at, updated_at",
        )
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.artist_id)
        .bind(update.venue_id)
        .bind(update.date)
        .bind(update.remaining_capacity)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("failed to update concert", e))?;
        row.map(concert_from_row).ok_or(StoreError::NotFound)
    }

    /// Delete a concert (categories cascade).
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`]: no such concert.
    /// - [`StoreError::Database`]: the delete failed.
    pub async fn delete_concert(&self, id: ConcertId) -> Result<Concert, StoreError> {
        let row: Option<ConcertRow> = sqlx::query_as(
            "DELETE FROM concert WHERE id = $1
             RETURNING id, name, artist_id, venue_id, date, remaining_capacity,
                       created_at, updated_at",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("failed to delete concert", e))?;
        row.map(concert_from_row).ok_or(StoreError::NotFound)
    }

    // ------------------------------------------------------------------
    // Ticket categories
    // ------------------------------------------------------------------

    /// Create a ticket category under a concert.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`]: the owning concert does not exist.
    /// - [`StoreError::Database`]: the insert failed.
    pub async fn create_ticket_category(
        &self,
        new: &NewTicketCategory,
    ) -> Result<TicketCategory, StoreError> {
        let row: CategoryRow = sqlx::query_as(
            "INSERT INTO ticket_category (concert_id, description, price, start_date, end_date)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, concert_id, description, price, start_date, end_date,
                       created_at, updated_at",
        )
        .bind(new.concert_id)
        .bind(&new.description)
        .bind(new.price)
        .bind(new.start_date)
        .bind(new.end_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_error("failed to create ticket category", e))?;
        Ok(category_from_row(row))
    }

    /// Fetch a ticket category by id.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`]: no such category.
    /// - [`StoreError::Database`]: the query failed.
    pub async fn get_ticket_category(
        &self,
        id: TicketCategoryId,
    ) -> Result<TicketCategory, StoreError> {
        let row: Option<CategoryRow> = sqlx::query_as(
            "SELECT id, concert_id, description, price, start_date, end_date,
                    created_at, updated_at
             FROM ticket_category WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("failed to fetch ticket category", e))?;
        row.map(category_from_row).ok_or(StoreError::NotFound)
    }

    /// Apply a partial update to a ticket category.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`]: no such category.
    /// - [`StoreError::Database`]: the update failed.
    pub async fn update_ticket_category(
        &self,
        id: TicketCategoryId,
        update: &TicketCategoryUpdate,
    ) -> Result<TicketCategory, StoreError> {
        let row: Option<CategoryRow> = sqlx::query_as(
            "UPDATE ticket_category
             SET description = COALESCE($2, description),
                 price = COALESCE($3, price),
                 start_date = COALESCE($4, start_date),
                 end_date = COALESCE($5, end_date),
                 updated_at = now()
             WHERE id = $1
             RETURNING id, concert_id, description, price, start_date, end_date,
                       created_at, updated_at",
        )
        .bind(id)
        .bind(update.description.as_deref())
        .bind(update.price)
        .bind(update.start_date)
        .bind(update.end_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("failed to update ticket category", e))?;
        row.map(category_from_row).ok_or(StoreError::NotFound)
    }

    /// Delete a ticket category.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`]: no such category.
    /// - [`StoreError::Database`]: the delete failed.
    pub async fn delete_ticket_category(
        &self,
        id: TicketCategoryId,
    ) -> Result<TicketCategory, StoreError> {
        let row: Option<CategoryRow> = sqlx::query_as(
            "DELETE FROM ticket_category WHERE id = $1
             RETURNING id, concert_id, description, price, start_date, end_date,
                       created_at, updated_at",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("failed to delete ticket category", e))?;
        row.map(category_from_row).ok_or(StoreError::NotFound)
    }

    // ------------------------------------------------------------------
    // Tickets
    // ------------------------------------------------------------------

    /// Fetch a ticket by id.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`]: no such ticket.
    /// - [`StoreError::Database`]: the query failed.
    pub async fn get_ticket(&self, id: TicketId) -> Result<Ticket, StoreError> {
        let row: Option<TicketRow> = sqlx::query_as(
            "SELECT id, serial_number, concert_id, ticket_category_id,
                    created_at, updated_at
             FROM ticket WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("failed to fetch ticket", e))?;
        row.map(ticket_from_row).ok_or(StoreError::NotFound)
    }

    /// Cancel (delete) a ticket.
    ///
    /// Does not restore the concert's capacity; that is an administrative
    /// concert update.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`]: no such ticket.
    /// - [`StoreError::Database`]: the delete failed.
    pub async fn cancel_ticket(&self, id: TicketId) -> Result<Ticket, StoreError> {
        let row: Option<TicketRow> = sqlx::query_as(
            "DELETE FROM ticket WHERE id = $1
             RETURNING id, serial_number, concert_id, ticket_category_id,
                       created_at, updated_at",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("failed to cancel ticket", e))?;
        row.map(ticket_from_row).ok_or(StoreError::NotFound)
    }
}

impl CapacityStore for PostgresStore {
    fn book(
        &self,
        concert_id: ConcertId,
        category_id: TicketCategoryId,
    ) -> Pin<Box<dyn Future<Output = Result<Ticket, StoreError>> + Send + '_>> {
        Box::pin(self.book_ticket(concert_id, category_id))
    }
}
