//! Ticket category management endpoints.
//!
//! - `POST /api/ticket-categories` - Create a category under a concert
//! - `PUT /api/ticket-categories/{id}` - Partial update
//! - `DELETE /api/ticket-categories/{id}` - Delete a category

use crate::error::AppError;
use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use gatekeeper_core::{
    ConcertId, NewTicketCategory, TicketCategory, TicketCategoryId, TicketCategoryUpdate,
};
use serde::Deserialize;

/// Request to create a ticket category.
#[derive(Debug, Deserialize)]
pub struct CreateTicketCategoryRequest {
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

/// Request to partially update a category. Omitted fields keep their values.
#[derive(Debug, Deserialize)]
pub struct UpdateTicketCategoryRequest {
    /// New description, if any.
    pub description: Option<String>,
    /// New price, if any.
    pub price: Option<f64>,
    /// New validity window start, if any.
    pub start_date: Option<DateTime<Utc>>,
    /// New validity window end, if any.
    pub end_date: Option<DateTime<Utc>>,
}

/// Create a ticket category.
///
/// # Errors
///
/// - 404 if the owning concert does not exist.
/// - 500 if the insert fails.
pub async fn create_category(
    State(state): State<AppState>,
    Json(req): Json<CreateTicketCategoryRequest>,
) -> Result<(StatusCode, Json<TicketCategory>), AppError> {
    let category = state
        .store
        .create_ticket_category(&NewTicketCategory {
            concert_id: req.concert_id,
            description: req.description,
            price: req.price,
            start_date: req.start_date,
            end_date: req.end_date,
        })
        .await?;
    tracing::info!(
        category_id = category.id,
        concert_id = category.concert_id,
        "ticket category created"
    );
    Ok((StatusCode::CREATED, Json(category)))
}

/// Partially update a ticket category.
///
/// # Errors
///
/// - 404 if the category does not exist.
/// - 500 if the update fails.
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<TicketCategoryId>,
    Json(req): Json<UpdateTicketCategoryRequest>,
) -> Result<Json<TicketCategory>, AppError> {
    let category = state
        .store
        .update_ticket_category(
            id,
            &TicketCategoryUpdate {
                description: req.description,
                price: req.price,
                start_date: req.start_date,
                end_date: req.end_date,
            },
        )
        .await?;
    tracing::info!(category_id = category.id, "ticket category updated");
    Ok(Json(category))
}

/// Delete a ticket category.
///
/// # Errors
///
/// - 404 if the category does not exist.
/// - 500 if the delete fails.
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<TicketCategoryId>,
) -> Result<Json<TicketCategory>, AppError> {
    let category = state.store.delete_ticket_category(id).await?;
    tracing::info!(category_id = category.id, "ticket category deleted");
    Ok(Json(category))
}
