//! Ticket endpoints: the booking path plus lookup and cancellation.
//!
//! - `POST /api/tickets` - Buy a ticket (the booking critical section)
//! - `GET /api/tickets/{id}` - Get ticket details
//! - `DELETE /api/tickets/{id}` - Cancel a ticket

use crate::error::AppError;
use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use gatekeeper_core::{ConcertId, Ticket, TicketCategoryId, TicketId};
use serde::{Deserialize, Serialize};

/// Request to buy a ticket.
#[derive(Debug, Deserialize)]
pub struct BuyTicketRequest {
    /// Concert to book a ticket for.
    pub concert_id: ConcertId,
    /// Category to sell the ticket under.
    pub ticket_category_id: TicketCategoryId,
}

/// Response after a successful booking.
#[derive(Debug, Serialize)]
pub struct BuyTicketResponse {
    /// Success message.
    pub message: String,
    /// The created ticket.
    pub ticket: Ticket,
}

/// Buy a ticket.
///
/// Runs the booking critical section: acquire the concert's distributed
/// lock, decrement capacity and create the ticket row in one transaction,
/// release the lock.
///
/// # Errors
///
/// - 429 if the concert's booking lock is held elsewhere (retry later).
/// - 404 if the concert or category does not exist.
/// - 409 if the concert is sold out.
/// - 500 on lock backend or transaction failure.
pub async fn buy_ticket(
    State(state): State<AppState>,
    Json(req): Json<BuyTicketRequest>,
) -> Result<(StatusCode, Json<BuyTicketResponse>), AppError> {
    let ticket = state
        .booking
        .book(req.concert_id, req.ticket_category_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(BuyTicketResponse {
            message: "booking succeeded".to_string(),
            ticket,
        }),
    ))
}

/// Get ticket details.
///
/// # Errors
///
/// - 404 if the ticket does not exist.
/// - 500 if the query fails.
pub async fn get_ticket(
    State(state): State<AppState>,
    Path(id): Path<TicketId>,
) -> Result<Json<Ticket>, AppError> {
    let ticket = state.store.get_ticket(id).await?;
    Ok(Json(ticket))
}

/// Cancel (delete) a ticket.
///
/// Does not restore the concert's capacity.
///
/// # Errors
///
/// - 404 if the ticket does not exist.
/// - 500 if the delete fails.
pub async fn cancel_ticket(
    State(state): State<AppState>,
    Path(id): Path<TicketId>,
) -> Result<Json<Ticket>, AppError> {
    let ticket = state.store.cancel_ticket(id).await?;
    tracing::info!(ticket_id = ticket.id, serial_number = %ticket.serial_number, "ticket cancelled");
    Ok(Json(ticket))
}
