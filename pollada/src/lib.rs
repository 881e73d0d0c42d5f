//! Pollada - ticket sales and redemption for a chicken-meal fundraiser
//!
//! Customers register, pick a chicken part and receive a ticket carrying a
//! short unique code and a scannable redemption image. Staff confirm payment,
//! then consume the ticket once at the counter on the day of the event.
//!
//! # Architecture
//!
//! ```text
//!  HTTP (axum)                    Service                    Store
//! ┌──────────────┐          ┌────────────────┐        ┌───────────────────┐
//! │ api::*       │ ───────▶ │ TicketOffice   │ ─────▶ │ TicketStore       │
//! │ StaffSession │          │  clock, codes, │        │  Postgres (prod)  │
//! └──────────────┘          │  QR encoder    │        │  in-memory (test) │
//!                           └────────────────┘        └───────────────────┘
//! ```
//!
//! The two guarantees that matter live in the store:
//!
//! - issuing a ticket consumes exactly one unit of stock, never below zero
//! - a paid ticket is redeemed at most once, however many counters scan it
//!
//! # Usage
//!
//! ```ignore
//! let office = TicketOffice::new(store, Arc::new(SystemClock), Arc::new(RandomCodeGenerator), Arc::new(QrImageEncoder));
//! let customer = office.register_or_update_customer(&form).await?;
//! let ticket = office.issue_ticket(customer.id, item_id).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod auth;
pub mod config;
pub mod metrics;
pub mod office;
pub mod qr;
pub mod server;

pub use auth::{StaffSession, StaticTokenAuthenticator};
pub use config::Config;
pub use office::{CustomerForm, ItemForm, RedemptionOutcome, TicketCard, TicketOffice};
pub use qr::QrImageEncoder;
pub use server::{AppState, build_router};
