//! Administrative endpoints: items, stock and payment confirmation.
//!
//! All endpoints require a staff login.

use crate::api::{AppError, parse_path_id};
use crate::auth::StaffSession;
use crate::office::ItemForm;
use crate::server::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use pollada_core::TicketStore;
use pollada_core::types::{InventoryItem, ItemId, TicketFilter, TicketView};
use serde::{Deserialize, Serialize};

/// Every item, including sold-out ones.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/api/admin/items -H "Authorization: Bearer $STAFF_TOKEN"
/// ```
pub async fn list_items<S: TicketStore>(
    State(state): State<AppState<S>>,
    _staff: StaffSession,
) -> Result<Json<Vec<InventoryItem>>, AppError> {
    Ok(Json(state.office.list_items().await?))
}

/// Add an item; `price` defaults to 20.00.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/admin/items \
///   -H "Authorization: Bearer $STAFF_TOKEN" \
///   -H "Content-Type: application/json" \
///   -d '{"name":"Pierna","remaining":40,"price":"20.00"}'
/// ```
pub async fn create_item<S: TicketStore>(
    State(state): State<AppState<S>>,
    staff: StaffSession,
    Json(form): Json<ItemForm>,
) -> Result<(StatusCode, Json<InventoryItem>), AppError> {
    let item = state.office.create_item(&form, &staff.actor).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Stock update request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetStockRequest {
    /// New remaining count
    pub remaining: u32,
}

/// Overwrite an item's remaining stock.
///
/// # Example
///
/// ```bash
/// curl -X PUT http://localhost:8080/api/admin/items/6ba7b810-9dad-11d1-80b4-00c04fd430c8/stock \
///   -H "Authorization: Bearer $STAFF_TOKEN" \
///   -H "Content-Type: application/json" \
///   -d '{"remaining":10}'
/// ```
pub async fn set_item_stock<S: TicketStore>(
    State(state): State<AppState<S>>,
    staff: StaffSession,
    Path(item_id): Path<String>,
    Json(request): Json<SetStockRequest>,
) -> Result<Json<InventoryItem>, AppError> {
    let item_id = ItemId::from_uuid(parse_path_id("item_id", &item_id)?);
    let item = state
        .office
        .set_item_stock(item_id, request.remaining, &staff.actor)
        .await?;
    Ok(Json(item))
}

/// Ticket list filters, e.g. `?paid=false&q=torres`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketListQuery {
    /// Only paid / unpaid
    pub paid: Option<bool>,
    /// Only redeemed / unredeemed
    pub redeemed: Option<bool>,
    /// Code, name or phone substring
    pub q: Option<String>,
}

/// Filtered ticket list, newest first.
///
/// # Example
///
/// ```bash
/// curl "http://localhost:8080/api/admin/tickets?paid=false" -H "Authorization: Bearer $STAFF_TOKEN"
/// ```
pub async fn list_tickets<S: TicketStore>(
    State(state): State<AppState<S>>,
    _staff: StaffSession,
    Query(query): Query<TicketListQuery>,
) -> Result<Json<Vec<TicketView>>, AppError> {
    let filter = TicketFilter {
        paid: query.paid,
        redeemed: query.redeemed,
        query: query.q,
    };
    Ok(Json(state.office.list_tickets(&filter).await?))
}

/// Payment confirmation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkPaidRequest {
    /// Ticket codes, any case
    pub codes: Vec<String>,
}

/// Payment confirmation result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkPaidResponse {
    /// Codes that matched a ticket
    pub updated: u64,
}

/// Mark tickets as paid.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/admin/tickets/mark-paid \
///   -H "Authorization: Bearer $STAFF_TOKEN" \
///   -H "Content-Type: application/json" \
///   -d '{"codes":["A1B2C3D4","E5F6G7H8"]}'
/// ```
pub async fn mark_paid<S: TicketStore>(
    State(state): State<AppState<S>>,
    staff: StaffSession,
    Json(request): Json<MarkPaidRequest>,
) -> Result<Json<MarkPaidResponse>, AppError> {
    let updated = state.office.mark_paid(&request.codes, &staff.actor).await?;
    Ok(Json(MarkPaidResponse { updated }))
}
