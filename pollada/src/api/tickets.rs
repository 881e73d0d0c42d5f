//! Ticket display and search.
//!
//! Public endpoints - no authentication required.

use crate::api::AppError;
use crate::office::TicketCard;
use crate::server::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
};
use pollada_core::TicketStore;
use pollada_core::types::TicketView;
use serde::{Deserialize, Serialize};

/// Get a ticket by code (any case).
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/api/tickets/a1b2c3d4
/// ```
pub async fn get_ticket<S: TicketStore>(
    State(state): State<AppState<S>>,
    Path(code): Path<String>,
) -> Result<Json<TicketView>, AppError> {
    Ok(Json(state.office.get_ticket(&code).await?))
}

/// Get a ticket with its redemption link and QR image.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/api/tickets/A1B2C3D4/card
/// ```
pub async fn get_ticket_card<S: TicketStore>(
    State(state): State<AppState<S>>,
    Path(code): Path<String>,
) -> Result<Json<TicketCard>, AppError> {
    Ok(Json(state.office.ticket_card(&code).await?))
}

/// Search query parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Name or phone substring
    #[serde(default)]
    pub q: String,
}

/// Search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// The query as received
    pub query: String,
    /// Matching tickets, by customer name
    pub tickets: Vec<TicketView>,
}

/// Tickets of every customer whose name or phone contains `q`.
///
/// # Example
///
/// ```bash
/// curl "http://localhost:8080/api/tickets/search?q=torres"
/// ```
pub async fn search_tickets<S: TicketStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    let tickets = state.office.search_tickets_by_customer(&query.q).await?;
    Ok(Json(SearchResponse {
        query: query.q,
        tickets,
    }))
}
