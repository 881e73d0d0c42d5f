//! Error type for HTTP handlers.
//!
//! Bridges [`PolladaError`] and HTTP responses: every domain error kind gets
//! its own status and machine-readable code, with the user-facing message
//! taken from [`PolladaError::user_message`].

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pollada_core::PolladaError;
use serde::Serialize;
use std::fmt;

/// Application error type for HTTP handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler(State(state): State<AppState<S>>) -> Result<Json<TicketView>, AppError> {
///     let ticket = state.office.get_ticket(&code).await?;
///     Ok(Json(ticket))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: &'static str,
    /// Offending field, for validation errors
    field: Option<&'static str>,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>, code: &'static str) -> Self {
        Self {
            status,
            message: message.into(),
            code,
            field: None,
            source: None,
        }
    }

    /// Attach the error that caused this one.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message, "UNAUTHORIZED")
    }

    /// Create a 422 Unprocessable Entity error.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        let mut error = Self::new(StatusCode::UNPROCESSABLE_ENTITY, message, "VALIDATION_ERROR");
        error.field = Some(field);
        error
    }

    /// HTTP status
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<PolladaError> for AppError {
    fn from(error: PolladaError) -> Self {
        let message = error.user_message();
        let (status, code) = match &error {
            PolladaError::Validation { field, .. } => {
                return Self::validation(*field, message);
            }
            PolladaError::OutOfStock { .. } => (StatusCode::CONFLICT, "OUT_OF_STOCK"),
            PolladaError::TicketNotFound { .. } => (StatusCode::NOT_FOUND, "TICKET_NOT_FOUND"),
            PolladaError::NotPaid { .. } => (StatusCode::CONFLICT, "NOT_PAID"),
            PolladaError::AlreadyRedeemed { .. } => (StatusCode::CONFLICT, "ALREADY_REDEEMED"),
            PolladaError::CustomerNotFound(_) => (StatusCode::NOT_FOUND, "CUSTOMER_NOT_FOUND"),
            PolladaError::ItemNotFound(_) => (StatusCode::NOT_FOUND, "ITEM_NOT_FOUND"),
            PolladaError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            PolladaError::DuplicateCode { .. } | PolladaError::ImageEncoding(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR")
            }
            PolladaError::CodeAllocationExhausted { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "CODE_ALLOCATION_EXHAUSTED")
            }
            PolladaError::Storage(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
        };

        let app_error = Self::new(status, message, code);
        if error.is_user_error() {
            app_error
        } else {
            app_error.with_source(error)
        }
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: &'static str,
    /// Human-readable error message.
    message: String,
    /// Offending field for validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Internal server error"
                );
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
            field: self.field,
        };

        (self.status, Json(body)).into_response()
    }
}
