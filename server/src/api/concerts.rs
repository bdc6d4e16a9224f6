//! Concert management endpoints.
//!
//! - `POST /api/concerts` - Create a concert with its initial capacity
//! - `GET /api/concerts/{id}` - Get concert details
//! - `PUT /api/concerts/{id}` - Partial update (including administrative
//!   capacity adjustment)
//! - `DELETE /api/concerts/{id}` - Delete a concert

use crate::error::AppError;
use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use gatekeeper_core::{Concert, ConcertId, ConcertUpdate, NewConcert};
use serde::Deserialize;

/// Request to create a concert.
#[derive(Debug, Deserialize)]
pub struct CreateConcertRequest {
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

/// Request to partially update a concert. Omitted fields keep their values.
#[derive(Debug, Deserialize)]
pub struct UpdateConcertRequest {
    /// New name, if any.
    pub name: Option<String>,
    /// New artist reference, if any.
    pub artist_id: Option<i64>,
    /// New venue reference, if any.
    pub venue_id: Option<i64>,
    /// New date, if any.
    pub date: Option<DateTime<Utc>>,
    /// New remaining capacity, if any (administrative adjustment).
    pub remaining_capacity: Option<i64>,
}

/// Create a concert.
///
/// # Errors
///
/// - 500 if the insert fails.
pub async fn create_concert(
    State(state): State<AppState>,
    Json(req): Json<CreateConcertRequest>,
) -> Result<(StatusCode, Json<Concert>), AppError> {
    let concert = state
        .store
        .create_concert(&NewConcert {
            name: req.name,
            artist_id: req.artist_id,
            venue_id: req.venue_id,
            date: req.date,
            capacity: req.capacity,
        })
        .await?;
    tracing::info!(concert_id = concert.id, name = %concert.name, "concert created");
    Ok((StatusCode::CREATED, Json(concert)))
}

/// Get concert details.
///
/// # Errors
///
/// - 404 if the concert does not exist.
/// - 500 if the query fails.
pub async fn get_concert(
    State(state): State<AppState>,
    Path(id): Path<ConcertId>,
) -> Result<Json<Concert>, AppError> {
    let concert = state.store.get_concert(id).await?;
    Ok(Json(concert))
}

/// Partially update a concert.
///
/// # Errors
///
/// - 404 if the concert does not exist.
/// - 500 if the update fails.
pub async fn update_concert(
    State(state): State<AppState>,
    Path(id): Path<ConcertId>,
    Json(req): Json<UpdateConcertRequest>,
) -> Result<Json<Concert>, AppError> {
    let concert = state
        .store
        .update_concert(
            id,
            &ConcertUpdate {
                name: req.name,
                artist_id: req.artist_id,
                venue_id: req.venue_id,
                date: req.date,
                remaining_capacity: req.remaining_capacity,
            },
        )
        .await?;
    tracing::info!(concert_id = concert.id, "concert updated");
    Ok(Json(concert))
}

/// Delete a concert.
///
/// # Errors
///
/// - 404 if the concert does not exist.
/// - 500 if the delete fails.
pub async fn delete_concert(
    State(state): State<AppState>,
    Path(id): Path<ConcertId>,
) -> Result<Json<Concert>, AppError> {
    let concert = state.store.delete_concert(id).await?;
    tracing::info!(concert_id = concert.id, "concert deleted");
    Ok(Json(concert))
}
