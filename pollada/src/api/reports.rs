//! Sales and inventory report.

use crate::api::AppError;
use crate::server::AppState;
use axum::{Json, extract::State};
use pollada_core::TicketStore;
use pollada_core::types::Report;

/// Current report.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/api/reports
/// ```
pub async fn get_report<S: TicketStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Report>, AppError> {
    Ok(Json(state.office.get_report().await?))
}
