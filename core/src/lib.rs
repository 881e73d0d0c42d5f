//! # Pollada Core
//!
//! Domain types and seams for the pollada ticket office: customers register,
//! pick a chicken part, receive a ticket with a unique code, staff mark the
//! ticket paid and a redemption counter consumes it exactly once.
//!
//! This crate contains no I/O. It provides:
//!
//! - **Types**: identifiers, money, ticket codes, validated registrations,
//!   ticket views and report shapes ([`types`])
//! - **Errors**: the discriminated outcome taxonomy ([`error`])
//! - **Environment**: injected collaborators such as the clock, the ticket code
//!   generator, the image encoder and the staff authenticator ([`environment`])
//! - **Store**: the persistence contract every backend implements ([`store`])
//!
//! ## Consistency Rules
//!
//! ```text
//! issue_ticket   : [customer exists] → [remaining > 0 ? remaining - 1] → [insert code]   (one unit)
//! redeem_ticket  : [lock ticket row] → [paid?] → [not redeemed?] → [redeemed = true]    (one unit)
//! ```
//!
//! The redemption guard itself is the pure function [`types::TicketFlags::redeem`];
//! stores only provide the exclusive section around it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod environment;
pub mod error;
pub mod store;
pub mod types;

pub use chrono::{DateTime, Utc};
pub use error::{PolladaError, Result};
pub use store::TicketStore;
