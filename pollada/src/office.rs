//! The ticket office: every operation the request-handling glue calls.
//!
//! `TicketOffice` owns no mutable state of its own. Each call validates its
//! input, reads or writes through the [`TicketStore`], and reports what
//! happened through `tracing` and `metrics`. Consistency guarantees
//! (inventory never negative, one redemption per ticket) live in the store.

use crate::metrics::{
    CODE_COLLISIONS, CUSTOMERS_REGISTERED, REDEMPTIONS, TICKETS_ISSUED, TICKETS_MARKED_PAID,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use pollada_core::environment::{Clock, CodeGenerator, ImageEncoder, StaffActor};
use pollada_core::types::{
    Customer, CustomerId, CustomerRegistration, DeliveryMode, InventoryItem, IssueTicket, ItemId,
    Money, NewItem, Report, TicketCode, TicketFilter, TicketView,
};
use pollada_core::{PolladaError, Result, TicketStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default public base URL for redemption links.
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080";

/// Raw customer registration as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerForm {
    /// Customer name, any case
    pub name: String,
    /// Nine-digit phone number
    pub phone: String,
    /// Pickup or delivery
    pub delivery_mode: DeliveryMode,
    /// Delivery address
    #[serde(default)]
    pub address: Option<String>,
    /// Delivery reference note
    #[serde(default)]
    pub reference: Option<String>,
}

/// Raw item submission from the administrative surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemForm {
    /// Display name
    pub name: String,
    /// Initial stock
    pub remaining: u32,
    /// Unit price such as `"20.00"`; defaults when absent
    #[serde(default)]
    pub price: Option<String>,
}

/// Redemption outcome a counter screen can display directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionOutcome {
    /// Ticket consumed now
    Redeemed,
    /// No ticket with that code
    NotFound,
    /// Payment not confirmed
    NotPaid,
    /// Consumed earlier
    AlreadyRedeemed,
}

impl RedemptionOutcome {
    /// Classify a redemption error, `None` for failures that are not outcomes.
    #[must_use]
    pub const fn from_error(error: &PolladaError) -> Option<Self> {
        match error {
            PolladaError::TicketNotFound { .. } => Some(Self::NotFound),
            PolladaError::NotPaid { .. } => Some(Self::NotPaid),
            PolladaError::AlreadyRedeemed { .. } => Some(Self::AlreadyRedeemed),
            _ => None,
        }
    }

    /// Metric label
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Redeemed => "redeemed",
            Self::NotFound => "not_found",
            Self::NotPaid => "not_paid",
            Self::AlreadyRedeemed => "already_redeemed",
        }
    }

    /// Status color shown at the counter
    #[must_use]
    pub const fn color(&self) -> &'static str {
        match self {
            Self::Redeemed => "green",
            Self::NotFound | Self::NotPaid | Self::AlreadyRedeemed => "red",
        }
    }
}

/// Encoded redemption image, base64 for transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardImage {
    /// MIME type
    pub media_type: String,
    /// Base64 (standard alphabet) image bytes
    pub base64: String,
}

/// A ticket as handed to the customer: details, redemption link and image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketCard {
    /// The ticket
    pub ticket: TicketView,
    /// URL the counter opens when the image is scanned
    pub redemption_url: String,
    /// Scannable image of `redemption_url`
    pub image: CardImage,
}

/// Ticket sales, redemption and reporting over a [`TicketStore`].
pub struct TicketOffice<S> {
    store: S,
    clock: Arc<dyn Clock>,
    codes: Arc<dyn CodeGenerator>,
    images: Arc<dyn ImageEncoder>,
    public_base_url: String,
    code_attempts: u32,
}

impl<S: TicketStore> TicketOffice<S> {
    /// Create a ticket office with the default base URL and code retry budget.
    #[must_use]
    pub fn new(
        store: S,
        clock: Arc<dyn Clock>,
        codes: Arc<dyn CodeGenerator>,
        images: Arc<dyn ImageEncoder>,
    ) -> Self {
        Self {
            store,
            clock,
            codes,
            images,
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            code_attempts: crate::config::DEFAULT_CODE_ATTEMPTS,
        }
    }

    /// Base URL used for redemption links.
    #[must_use]
    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = url.into();
        self
    }

    /// Number of code candidates tried per issuance (at least 1).
    #[must_use]
    pub fn with_code_attempts(mut self, attempts: u32) -> Self {
        self.code_attempts = attempts.max(1);
        self
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Register a customer, or update the one already using this phone number.
    ///
    /// # Errors
    ///
    /// - [`PolladaError::Validation`] naming the first malformed field
    /// - [`PolladaError::Storage`] if the store fails
    #[tracing::instrument(skip(self, form), fields(phone = %form.phone))]
    pub async fn register_or_update_customer(&self, form: &CustomerForm) -> Result<Customer> {
        let registration = CustomerRegistration::new(
            &form.name,
            &form.phone,
            form.delivery_mode,
            form.address.as_deref(),
            form.reference.as_deref(),
        )?;

        let customer = self
            .store
            .upsert_customer(&registration, self.clock.now())
            .await?;

        metrics::counter!(CUSTOMERS_REGISTERED).increment(1);
        tracing::info!(customer_id = %customer.id, mode = %customer.delivery_mode, "Customer registered");
        Ok(customer)
    }

    /// Issue one ticket for `item_id` to `customer_id`, consuming one unit of stock.
    ///
    /// A generated code that is already taken is replaced by a fresh one, up
    /// to the configured number of attempts.
    ///
    /// # Errors
    ///
    /// - [`PolladaError::CustomerNotFound`] / [`PolladaError::ItemNotFound`]
    /// - [`PolladaError::OutOfStock`] if nothing is left; no ticket is created
    /// - [`PolladaError::CodeAllocationExhausted`] if every candidate collided
    /// - [`PolladaError::Storage`] if the store fails
    #[tracing::instrument(skip(self))]
    pub async fn issue_ticket(&self, customer_id: CustomerId, item_id: ItemId) -> Result<TicketView> {
        for attempt in 1..=self.code_attempts {
            let request = IssueTicket {
                customer_id,
                item_id,
                code: self.codes.generate(),
                issued_at: self.clock.now(),
            };

            match self.store.issue_ticket(&request).await {
                Ok(ticket) => {
                    metrics::counter!(TICKETS_ISSUED, "item" => ticket.item.name.clone()).increment(1);
                    tracing::info!(
                        code = %ticket.code,
                        item = %ticket.item.name,
                        customer_id = %customer_id,
                        "Ticket issued"
                    );
                    return Ok(ticket);
                }
                Err(PolladaError::DuplicateCode { code }) => {
                    metrics::counter!(CODE_COLLISIONS).increment(1);
                    tracing::warn!(%code, attempt, "Ticket code already taken, retrying");
                }
                Err(error) => {
                    if let PolladaError::OutOfStock { item } = &error {
                        tracing::info!(%item, "Issuance refused, item sold out");
                    }
                    return Err(error);
                }
            }
        }

        tracing::error!(attempts = self.code_attempts, "No free ticket code found");
        Err(PolladaError::CodeAllocationExhausted {
            attempts: self.code_attempts,
        })
    }

    /// Look up a ticket by code, in any case.
    ///
    /// # Errors
    ///
    /// - [`PolladaError::TicketNotFound`] if no ticket has this code
    /// - [`PolladaError::Storage`] if the store fails
    pub async fn get_ticket(&self, code: &str) -> Result<TicketView> {
        self.store.find_ticket(&TicketCode::parse(code)).await
    }

    /// The ticket with its redemption link rendered to an image.
    ///
    /// # Errors
    ///
    /// - [`PolladaError::TicketNotFound`] if no ticket has this code
    /// - [`PolladaError::ImageEncoding`] if the image cannot be produced
    /// - [`PolladaError::Storage`] if the store fails
    pub async fn ticket_card(&self, code: &str) -> Result<TicketCard> {
        let ticket = self.get_ticket(code).await?;
        let redemption_url = ticket.code.redemption_url(&self.public_base_url);
        let image = self.images.encode(&redemption_url)?;

        Ok(TicketCard {
            ticket,
            redemption_url,
            image: CardImage {
                media_type: image.media_type,
                base64: STANDARD.encode(image.bytes),
            },
        })
    }

    /// Consume a paid ticket at the counter. At most one call per ticket succeeds.
    ///
    /// # Errors
    ///
    /// - [`PolladaError::TicketNotFound`] if no ticket has this code
    /// - [`PolladaError::NotPaid`] if payment is not confirmed
    /// - [`PolladaError::AlreadyRedeemed`] if the ticket was consumed before
    /// - [`PolladaError::Storage`] if the store fails; the ticket is unchanged
    #[tracing::instrument(skip(self, actor), fields(staff = %actor.name))]
    pub async fn redeem_ticket(&self, code: &str, actor: &StaffActor) -> Result<TicketView> {
        let code = TicketCode::parse(code);
        let result = self.store.redeem_ticket(&code).await;

        match &result {
            Ok(ticket) => {
                metrics::counter!(REDEMPTIONS, "outcome" => RedemptionOutcome::Redeemed.as_str())
                    .increment(1);
                tracing::info!(%code, item = %ticket.item.name, "Ticket redeemed");
            }
            Err(error) => match RedemptionOutcome::from_error(error) {
                Some(outcome) => {
                    metrics::counter!(REDEMPTIONS, "outcome" => outcome.as_str()).increment(1);
                    tracing::info!(%code, outcome = outcome.as_str(), "Redemption refused");
                }
                None => {
                    metrics::counter!(REDEMPTIONS, "outcome" => "error").increment(1);
                    tracing::error!(%code, %error, "Redemption failed");
                }
            },
        }
        result
    }

    /// Tickets of customers whose name or phone contains `query`.
    ///
    /// A blank query returns nothing.
    ///
    /// # Errors
    ///
    /// Returns [`PolladaError::Storage`] if the store fails.
    pub async fn search_tickets_by_customer(&self, query: &str) -> Result<Vec<TicketView>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.store.search_by_customer(query).await
    }

    /// Sales and inventory statistics.
    ///
    /// # Errors
    ///
    /// Returns [`PolladaError::Storage`] if the store fails.
    pub async fn get_report(&self) -> Result<Report> {
        self.store.report().await
    }

    // ------------------------------------------------------------------
    // Administrative surface
    // ------------------------------------------------------------------

    /// Add an item to the menu.
    ///
    /// # Errors
    ///
    /// - [`PolladaError::Validation`] on a malformed name or price
    /// - [`PolladaError::Storage`] if the store fails
    pub async fn create_item(&self, form: &ItemForm, actor: &StaffActor) -> Result<InventoryItem> {
        let price = form
            .price
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(str::parse::<Money>)
            .transpose()?;
        let item = self
            .store
            .create_item(&NewItem::new(&form.name, form.remaining, price)?)
            .await?;

        tracing::info!(item_id = %item.id, name = %item.name, remaining = item.remaining, price = %item.price, staff = %actor.name, "Item created");
        Ok(item)
    }

    /// Overwrite an item's remaining stock.
    ///
    /// # Errors
    ///
    /// - [`PolladaError::ItemNotFound`] if no such item exists
    /// - [`PolladaError::Storage`] if the store fails
    pub async fn set_item_stock(
        &self,
        item_id: ItemId,
        remaining: u32,
        actor: &StaffActor,
    ) -> Result<InventoryItem> {
        let item = self.store.set_item_stock(item_id, remaining).await?;
        tracing::info!(item_id = %item.id, remaining, staff = %actor.name, "Item stock set");
        Ok(item)
    }

    /// Every item, by name.
    ///
    /// # Errors
    ///
    /// Returns [`PolladaError::Storage`] if the store fails.
    pub async fn list_items(&self) -> Result<Vec<InventoryItem>> {
        self.store.list_items(false).await
    }

    /// Items that can still be sold, by name.
    ///
    /// # Errors
    ///
    /// Returns [`PolladaError::Storage`] if the store fails.
    pub async fn available_items(&self) -> Result<Vec<InventoryItem>> {
        self.store.list_items(true).await
    }

    /// Confirm payment for tickets, returning how many codes matched.
    ///
    /// Unknown codes are ignored; already-paid tickets count as matched.
    /// A code listed twice, in any case, counts once.
    ///
    /// # Errors
    ///
    /// Returns [`PolladaError::Storage`] if the store fails.
    pub async fn mark_paid(&self, codes: &[String], actor: &StaffActor) -> Result<u64> {
        let mut codes: Vec<TicketCode> = codes
            .iter()
            .map(|c| TicketCode::parse(c))
            .filter(|c| !c.as_str().is_empty())
            .collect();
        codes.sort_unstable();
        codes.dedup();
        if codes.is_empty() {
            return Ok(0);
        }

        let matched = self.store.mark_paid(&codes).await?;
        metrics::counter!(TICKETS_MARKED_PAID).increment(matched);
        tracing::info!(requested = codes.len(), matched, staff = %actor.name, "Tickets marked as paid");
        Ok(matched)
    }

    /// Administrative ticket list, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`PolladaError::Storage`] if the store fails.
    pub async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<TicketView>> {
        self.store.list_tickets(filter).await
    }

    /// Check the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`PolladaError::Storage`] if it is not.
    pub async fn ping(&self) -> Result<()> {
        self.store.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_colors() {
        assert_eq!(RedemptionOutcome::Redeemed.color(), "green");
        assert_eq!(RedemptionOutcome::NotPaid.color(), "red");
        assert_eq!(RedemptionOutcome::AlreadyRedeemed.color(), "red");
        assert_eq!(RedemptionOutcome::NotFound.color(), "red");
    }

    #[test]
    fn only_redemption_errors_are_outcomes() {
        let not_paid = PolladaError::NotPaid { code: "A".into() };
        assert_eq!(RedemptionOutcome::from_error(&not_paid), Some(RedemptionOutcome::NotPaid));
        assert_eq!(
            RedemptionOutcome::from_error(&PolladaError::Storage("down".into())),
            None
        );
    }
}
