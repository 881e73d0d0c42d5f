//! Persistence contract for the ticket office.
//!
//! A `TicketStore` is the sole shared mutable resource: nothing is cached
//! between calls, and every check reads current persisted state.
//!
//! # Atomicity
//!
//! Two operations carry the consistency guarantees of the system:
//!
//! - [`TicketStore::issue_ticket`] decrements stock only if it is positive and
//!   inserts the ticket in the same unit. If either fails, neither happens.
//! - [`TicketStore::redeem_ticket`] runs [`TicketFlags::redeem`] under an
//!   exclusive lock on that one ticket. Concurrent attempts on the same code
//!   are totally ordered; attempts on different codes do not wait for each other.
//!
//! The two are never combined into one unit.
//!
//! [`TicketFlags::redeem`]: crate::types::TicketFlags::redeem

use crate::error::Result;
use crate::types::{
    Customer, CustomerId, CustomerRegistration, InventoryItem, IssueTicket, ItemId, NewItem,
    Report, TicketCode, TicketFilter, TicketView,
};
use chrono::{DateTime, Utc};
use std::future::Future;

/// Durable storage for customers, items and tickets.
///
/// Implemented by the `PostgreSQL` store in production and by an in-memory
/// store in tests.
pub trait TicketStore: Send + Sync + 'static {
    /// Insert a customer, or overwrite every mutable field of the customer
    /// already registered under the same phone number.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PolladaError::Storage`] if the store fails.
    fn upsert_customer(
        &self,
        registration: &CustomerRegistration,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Customer>> + Send;

    /// Get a customer by ID.
    ///
    /// # Errors
    ///
    /// - [`crate::PolladaError::CustomerNotFound`] if no such customer exists
    /// - [`crate::PolladaError::Storage`] if the store fails
    fn get_customer(&self, id: CustomerId) -> impl Future<Output = Result<Customer>> + Send;

    /// Create an inventory item.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PolladaError::Storage`] if the store fails.
    fn create_item(&self, item: &NewItem) -> impl Future<Output = Result<InventoryItem>> + Send;

    /// Get an inventory item by ID.
    ///
    /// # Errors
    ///
    /// - [`crate::PolladaError::ItemNotFound`] if no such item exists
    /// - [`crate::PolladaError::Storage`] if the store fails
    fn get_item(&self, id: ItemId) -> impl Future<Output = Result<InventoryItem>> + Send;

    /// List items by name, optionally only those with stock left.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PolladaError::Storage`] if the store fails.
    fn list_items(
        &self,
        only_available: bool,
    ) -> impl Future<Output = Result<Vec<InventoryItem>>> + Send;

    /// Overwrite an item's remaining count (administrative restock).
    ///
    /// # Errors
    ///
    /// - [`crate::PolladaError::ItemNotFound`] if no such item exists
    /// - [`crate::PolladaError::Storage`] if the store fails
    fn set_item_stock(
        &self,
        id: ItemId,
        remaining: u32,
    ) -> impl Future<Output = Result<InventoryItem>> + Send;

    /// Consume one unit of stock and create the ticket, atomically.
    ///
    /// Checks run in the order customer, item and stock, code.
    ///
    /// # Errors
    ///
    /// - [`crate::PolladaError::CustomerNotFound`] / [`crate::PolladaError::ItemNotFound`]
    /// - [`crate::PolladaError::OutOfStock`] if remaining is 0; nothing is written
    /// - [`crate::PolladaError::DuplicateCode`] if the code is taken; stock is untouched
    /// - [`crate::PolladaError::Storage`] if the store fails
    fn issue_ticket(&self, request: &IssueTicket) -> impl Future<Output = Result<TicketView>> + Send;

    /// Look up a ticket by normalized code.
    ///
    /// # Errors
    ///
    /// - [`crate::PolladaError::TicketNotFound`] if no ticket has this code
    /// - [`crate::PolladaError::Storage`] if the store fails
    fn find_ticket(&self, code: &TicketCode) -> impl Future<Output = Result<TicketView>> + Send;

    /// Flip a paid ticket to redeemed under an exclusive per-ticket lock.
    ///
    /// # Errors
    ///
    /// - [`crate::PolladaError::TicketNotFound`] if no ticket has this code
    /// - [`crate::PolladaError::NotPaid`] / [`crate::PolladaError::AlreadyRedeemed`]
    ///   from the redemption guard; nothing is written
    /// - [`crate::PolladaError::Storage`] if the store fails; nothing is written
    fn redeem_ticket(&self, code: &TicketCode) -> impl Future<Output = Result<TicketView>> + Send;

    /// Mark tickets as paid, returning how many codes matched a ticket.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PolladaError::Storage`] if the store fails.
    fn mark_paid(&self, codes: &[TicketCode]) -> impl Future<Output = Result<u64>> + Send;

    /// Tickets of every customer whose name or phone contains `query`.
    ///
    /// Ordered by customer name, then issuance time.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PolladaError::Storage`] if the store fails.
    fn search_by_customer(&self, query: &str) -> impl Future<Output = Result<Vec<TicketView>>> + Send;

    /// Administrative ticket list, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PolladaError::Storage`] if the store fails.
    fn list_tickets(
        &self,
        filter: &TicketFilter,
    ) -> impl Future<Output = Result<Vec<TicketView>>> + Send;

    /// Read-only aggregate statistics over a consistent snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PolladaError::Storage`] if the store fails.
    fn report(&self) -> impl Future<Output = Result<Report>> + Send;

    /// Check the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PolladaError::Storage`] if it is not.
    fn ping(&self) -> impl Future<Output = Result<()>> + Send;
}
