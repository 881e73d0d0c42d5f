//! The redemption counter.
//!
//! Requires a staff login. Every guard outcome comes back in the same body
//! shape, colored for the counter screen, with a status code per outcome.

use crate::api::AppError;
use crate::auth::StaffSession;
use crate::office::RedemptionOutcome;
use crate::server::AppState;
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use pollada_core::TicketStore;
use pollada_core::types::TicketView;
use serde::{Deserialize, Serialize};

/// Code given as `?code=`, as scanned from a ticket's QR image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedeemQuery {
    /// Ticket code
    #[serde(default)]
    pub code: Option<String>,
}

/// Code typed at the counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemRequest {
    /// Ticket code
    pub code: String,
}

/// Redemption result for the counter screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedemptionResponse {
    /// What happened
    pub outcome: RedemptionOutcome,
    /// Message to show staff
    pub message: String,
    /// `green` on success, `red` otherwise
    pub color: String,
    /// The ticket, when one was found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket: Option<TicketView>,
}

/// Redeem a ticket.
///
/// The code is read from the JSON body or, failing that, from `?code=`.
/// Scanning a ticket's QR image opens `GET /api/redeem?code=...`, which
/// lands here too.
///
/// # Example
///
/// ```bash
/// curl "http://localhost:8080/api/redeem?code=A1B2C3D4" \
///   -H "Authorization: Bearer $STAFF_TOKEN"
///
/// curl -X POST http://localhost:8080/api/redeem \
///   -H "Authorization: Bearer $STAFF_TOKEN" \
///   -H "Content-Type: application/json" \
///   -d '{"code":"a1b2c3d4"}'
/// ```
pub async fn redeem_ticket<S: TicketStore>(
    State(state): State<AppState<S>>,
    staff: StaffSession,
    Query(query): Query<RedeemQuery>,
    body: Option<Json<RedeemRequest>>,
) -> Result<(StatusCode, Json<RedemptionResponse>), AppError> {
    let code = body
        .map(|Json(request)| request.code)
        .or(query.code)
        .filter(|code| !code.trim().is_empty())
        .ok_or_else(|| AppError::validation("code", "Ticket code is required."))?;

    match state.office.redeem_ticket(&code, &staff.actor).await {
        Ok(ticket) => {
            let outcome = RedemptionOutcome::Redeemed;
            Ok((
                StatusCode::OK,
                Json(RedemptionResponse {
                    outcome,
                    message: format!("Ticket redeemed: {}.", ticket.item.name),
                    color: outcome.color().to_string(),
                    ticket: Some(ticket),
                }),
            ))
        }
        Err(error) => {
            let Some(outcome) = RedemptionOutcome::from_error(&error) else {
                return Err(error.into());
            };
            let message = error.user_message();
            let status = AppError::from(error).status();
            let ticket = match outcome {
                RedemptionOutcome::NotFound => None,
                _ => state.office.get_ticket(&code).await.ok(),
            };
            Ok((
                status,
                Json(RedemptionResponse {
                    outcome,
                    message,
                    color: outcome.color().to_string(),
                    ticket,
                }),
            ))
        }
    }
}
