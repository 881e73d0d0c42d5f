//! Router configuration for the ticket office.
//!
//! Builds the complete Axum router with all endpoints.

use super::health::{health_check, readiness_check};
use super::state::AppState;
use crate::api::{admin, customers, redemption, reports, tickets};
use axum::{
    Router,
    http::HeaderName,
    routing::{get, post, put},
};
use pollada_core::TicketStore;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

/// Header carrying the request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the complete Axum router.
///
/// - `/health`, `/ready`: probes (no authentication)
/// - `/api/...`: customer flow, ticket display and search, reports
/// - `/api/redeem` (GET from a scanned ticket, POST from the counter) and
///   `/api/admin/...`: staff only
///
/// Every response carries an `x-request-id` header, taken from the request
/// when present and generated otherwise.
pub fn build_router<S: TicketStore>(state: AppState<S>) -> Router {
    let admin_routes = Router::new()
        .route(
            "/items",
            get(admin::list_items::<S>).post(admin::create_item::<S>),
        )
        .route("/items/:id/stock", put(admin::set_item_stock::<S>))
        .route("/tickets", get(admin::list_tickets::<S>))
        .route("/tickets/mark-paid", post(admin::mark_paid::<S>));

    let api_routes = Router::new()
        // Customer flow
        .route("/customers", post(customers::register_customer::<S>))
        .route("/customers/:id/tickets", post(customers::issue_ticket::<S>))
        .route("/items/available", get(customers::available_items::<S>))
        // Tickets
        .route("/tickets/search", get(tickets::search_tickets::<S>))
        .route("/tickets/:code", get(tickets::get_ticket::<S>))
        .route("/tickets/:code/card", get(tickets::get_ticket_card::<S>))
        // Counter
        .route(
            "/redeem",
            get(redemption::redeem_ticket::<S>).post(redemption::redeem_ticket::<S>),
        )
        // Reports
        .route("/reports", get(reports::get_report::<S>))
        .nest("/admin", admin_routes);

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check::<S>))
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id)),
        )
        .with_state(state)
}
