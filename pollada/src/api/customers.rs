//! Customer registration and ticket issuance.
//!
//! Public endpoints - no authentication required.

use crate::api::{AppError, parse_path_id};
use crate::office::CustomerForm;
use crate::server::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use pollada_core::TicketStore;
use pollada_core::types::{Customer, CustomerId, InventoryItem, ItemId, TicketView};
use serde::{Deserialize, Serialize};

/// Register a customer, or update the one with the same phone number.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/customers \
///   -H "Content-Type: application/json" \
///   -d '{"name":"Ana Torres","phone":"912345678","delivery_mode":"pickup"}'
/// ```
pub async fn register_customer<S: TicketStore>(
    State(state): State<AppState<S>>,
    Json(form): Json<CustomerForm>,
) -> Result<Json<Customer>, AppError> {
    Ok(Json(state.office.register_or_update_customer(&form).await?))
}

/// Items with stock left, for the selection screen.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/api/items/available
/// ```
pub async fn available_items<S: TicketStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<InventoryItem>>, AppError> {
    Ok(Json(state.office.available_items().await?))
}

/// Ticket issuance request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueTicketRequest {
    /// Item to buy
    pub item_id: ItemId,
}

/// Issue a ticket for the selected item.
///
/// Answers 409 `OUT_OF_STOCK` when the item sold out in the meantime.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/customers/550e8400-e29b-41d4-a716-446655440000/tickets \
///   -H "Content-Type: application/json" \
///   -d '{"item_id":"6ba7b810-9dad-11d1-80b4-00c04fd430c8"}'
/// ```
pub async fn issue_ticket<S: TicketStore>(
    State(state): State<AppState<S>>,
    Path(customer_id): Path<String>,
    Json(request): Json<IssueTicketRequest>,
) -> Result<(StatusCode, Json<TicketView>), AppError> {
    let customer_id = CustomerId::from_uuid(parse_path_id("customer_id", &customer_id)?);
    let ticket = state
        .office
        .issue_ticket(customer_id, request.item_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}
