//! Application state for the pollada HTTP server.

use crate::office::TicketOffice;
use axum::extract::FromRef;
use pollada_core::environment::StaffAuthenticator;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply via `Arc`) for each request.
pub struct AppState<S> {
    /// Ticket sales, redemption and reporting
    pub office: Arc<TicketOffice<S>>,

    /// Resolves bearer tokens into staff members
    pub staff: Arc<dyn StaffAuthenticator>,
}

impl<S> AppState<S> {
    /// Create a new application state.
    #[must_use]
    pub fn new(office: TicketOffice<S>, staff: Arc<dyn StaffAuthenticator>) -> Self {
        Self {
            office: Arc::new(office),
            staff,
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            office: Arc::clone(&self.office),
            staff: Arc::clone(&self.staff),
        }
    }
}

// Lets the `StaffSession` extractor reach the authenticator.
impl<S> FromRef<AppState<S>> for Arc<dyn StaffAuthenticator> {
    fn from_ref(state: &AppState<S>) -> Self {
        Arc::clone(&state.staff)
    }
}
