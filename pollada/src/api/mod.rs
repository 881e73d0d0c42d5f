//! API endpoints for the ticket office.
//!
//! Handlers are organized by audience:
//! - Customers: registration, available items, ticket issuance
//! - Tickets: display, redemption card, search
//! - Redemption: the staff counter
//! - Reports: sales and inventory statistics
//! - Admin: items, stock and payment confirmation (staff only)

pub mod admin;
pub mod customers;
pub mod error;
pub mod redemption;
pub mod reports;
pub mod tickets;

pub use error::AppError;

use uuid::Uuid;

/// Parse an identifier taken from the request path.
///
/// Malformed ids answer 422 on `field` in the usual error body instead of
/// axum's plain-text path rejection.
pub(crate) fn parse_path_id(field: &'static str, raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::validation(field, format!("'{raw}' is not a valid {field}.")))
}
