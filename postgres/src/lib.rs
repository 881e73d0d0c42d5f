//! `PostgreSQL` ticket store for the pollada ticket office.
//!
//! This crate provides the production implementation of the `TicketStore`
//! trait from `pollada-core`. It uses sqlx with a connection pool and
//! relies on the database for the two atomic operations:
//!
//! - Ticket issuance decrements stock and inserts the ticket in one transaction
//! - Redemption locks the single ticket row with `SELECT ... FOR UPDATE`
//!
//! Schema migrations live in `migrations/` and are embedded at compile time.
//!
//! # Example
//!
//! ```no_run
//! use pollada_postgres::PostgresTicketStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PostgresTicketStore::connect("postgres://localhost/pollada").await?;
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod rows;
mod store;

pub use store::PostgresTicketStore;
