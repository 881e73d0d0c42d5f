//! Business metrics for the ticket office.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `pollada_customers_registered_total` - Registrations and re-registrations
//! - `pollada_tickets_issued_total{item}` - Tickets issued per item
//! - `pollada_tickets_marked_paid_total` - Tickets confirmed as paid
//! - `pollada_redemptions_total{outcome}` - Redemption attempts by outcome
//!   (`redeemed`, `not_paid`, `already_redeemed`, `not_found`, `error`)
//! - `pollada_code_collisions_total` - Ticket code candidates rejected as taken

use metrics::describe_counter;

/// Customers registered or updated.
pub const CUSTOMERS_REGISTERED: &str = "pollada_customers_registered_total";
/// Tickets issued.
pub const TICKETS_ISSUED: &str = "pollada_tickets_issued_total";
/// Tickets marked as paid.
pub const TICKETS_MARKED_PAID: &str = "pollada_tickets_marked_paid_total";
/// Redemption attempts.
pub const REDEMPTIONS: &str = "pollada_redemptions_total";
/// Code collisions during issuance.
pub const CODE_COLLISIONS: &str = "pollada_code_collisions_total";

/// Register all business metric descriptions.
///
/// Call once at startup, after the recorder is installed.
pub fn register_business_metrics() {
    describe_counter!(
        CUSTOMERS_REGISTERED,
        "Total number of customer registrations, including updates by phone"
    );
    describe_counter!(TICKETS_ISSUED, "Total number of tickets issued, by item");
    describe_counter!(
        TICKETS_MARKED_PAID,
        "Total number of tickets confirmed as paid by staff"
    );
    describe_counter!(
        REDEMPTIONS,
        "Total number of redemption attempts by outcome"
    );
    describe_counter!(
        CODE_COLLISIONS,
        "Total number of generated ticket codes that were already taken"
    );

    tracing::info!("Business metrics registered");
}
