//! HTTP server module for the ticket office.
//!
//! This module provides the Axum-based HTTP server with:
//! - Application state management
//! - Health check endpoints
//! - Router configuration with request tracing

pub mod health;
pub mod routes;
pub mod state;

pub use health::{health_check, readiness_check};
pub use routes::build_router;
pub use state::AppState;
