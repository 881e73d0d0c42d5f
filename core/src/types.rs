//! Domain types for the pollada ticket office.
//!
//! Value objects (identifiers, money, codes, validated customer fields),
//! persisted records (customers, inventory items) and the read shapes
//! handed back to request-handling glue (ticket views, reports).

use crate::error::{PolladaError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a customer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(Uuid);

impl CustomerId {
    /// Creates a new random `CustomerId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `CustomerId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CustomerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an inventory item
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(Uuid);

impl ItemId {
    /// Creates a new random `ItemId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `ItemId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money
// ============================================================================

/// Fixed-point amount with two fractional digits, stored as cents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Create from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Add two amounts, saturating at the maximum
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Money {
    type Err = PolladaError;

    /// Parse `"20"`, `"20.5"` or `"20.00"`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || PolladaError::validation("price", format!("'{s}' is not a valid amount"));

        let s = s.trim();
        let (whole, fraction) = s.split_once('.').unwrap_or((s, ""));

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if fraction.len() > 2 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let whole: u64 = whole.parse().map_err(|_| invalid())?;
        let fraction: u64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        whole
            .checked_mul(100)
            .and_then(|cents| cents.checked_add(fraction))
            .map(Self)
            .ok_or_else(invalid)
    }
}

// ============================================================================
// Ticket Codes
// ============================================================================

/// Length of generated ticket codes.
pub const TICKET_CODE_LENGTH: usize = 8;

/// Characters generated ticket codes are drawn from.
pub const TICKET_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Public identifier printed on a ticket.
///
/// Codes match case-insensitively: every constructor trims and upper-cases
/// its input, so `" a1b2c3d4 "` and `"A1B2C3D4"` are the same code.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TicketCode(String);

impl TicketCode {
    /// Normalize a raw code as typed or scanned.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }

    /// The normalized code
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// URL the redemption counter opens when the ticket's QR is scanned.
    ///
    /// # Examples
    ///
    /// ```
    /// use pollada_core::types::TicketCode;
    ///
    /// let code = TicketCode::parse("a1b2c3d4");
    /// assert_eq!(
    ///     code.redemption_url("https://pollada.example/"),
    ///     "https://pollada.example/api/redeem?code=A1B2C3D4"
    /// );
    /// ```
    #[must_use]
    pub fn redemption_url(&self, base_url: &str) -> String {
        format!("{}/api/redeem?code={}", base_url.trim_end_matches('/'), self.0)
    }
}

impl From<String> for TicketCode {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<TicketCode> for String {
    fn from(code: TicketCode) -> Self {
        code.0
    }
}

impl fmt::Display for TicketCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Customers
// ============================================================================

/// Maximum stored length of a customer name.
pub const CUSTOMER_NAME_MAX_LEN: usize = 100;

/// Number of digits in a phone number.
pub const PHONE_DIGITS: usize = 9;

/// Customer name, trimmed and upper-cased.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CustomerName(String);

impl CustomerName {
    /// Validate and canonicalize a submitted name.
    ///
    /// # Errors
    ///
    /// Returns [`PolladaError::Validation`] on field `name` if the name is
    /// blank or, once upper-cased, longer than [`CUSTOMER_NAME_MAX_LEN`]
    /// characters.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PolladaError::validation("name", "Name is required."));
        }
        // Upper-casing can lengthen a name (`ß` becomes `SS`).
        let name = trimmed.to_uppercase();
        if name.chars().count() > CUSTOMER_NAME_MAX_LEN {
            return Err(PolladaError::validation(
                "name",
                format!("Name must be at most {CUSTOMER_NAME_MAX_LEN} characters."),
            ));
        }
        Ok(Self(name))
    }

    /// The canonical name
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Nine-digit phone number; the identity key of a customer.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Validate a submitted phone number.
    ///
    /// # Errors
    ///
    /// Returns [`PolladaError::Validation`] on field `phone` unless the
    /// trimmed input is exactly [`PHONE_DIGITS`] ASCII digits.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PolladaError::validation(
                "phone",
                "Phone number must contain only digits.",
            ));
        }
        if trimmed.len() != PHONE_DIGITS {
            return Err(PolladaError::validation(
                "phone",
                format!("Phone number must have exactly {PHONE_DIGITS} digits."),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The digits
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// How the customer receives the order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Picked up in person at the event
    #[serde(alias = "recojo")]
    Pickup,
    /// Delivered to the customer's address
    Delivery,
}

impl DeliveryMode {
    /// Stored representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::Delivery => "delivery",
        }
    }
}

impl FromStr for DeliveryMode {
    type Err = PolladaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pickup" | "recojo" => Ok(Self::Pickup),
            "delivery" => Ok(Self::Delivery),
            other => Err(PolladaError::validation(
                "delivery_mode",
                format!("Unknown delivery mode '{other}'."),
            )),
        }
    }
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated registration submission, ready to upsert by phone number.
///
/// Address and reference stay optional whatever the delivery mode; delivery
/// orders may be phoned in and the address collected separately.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomerRegistration {
    /// Canonical name
    pub name: CustomerName,
    /// Identity key
    pub phone: PhoneNumber,
    /// Pickup or delivery
    pub delivery_mode: DeliveryMode,
    /// Delivery address
    pub address: Option<String>,
    /// Delivery reference note
    pub reference: Option<String>,
}

impl CustomerRegistration {
    /// Validate a raw submission.
    ///
    /// # Errors
    ///
    /// Returns [`PolladaError::Validation`] naming the first offending field,
    /// checked in the order name, phone.
    pub fn new(
        name: &str,
        phone: &str,
        delivery_mode: DeliveryMode,
        address: Option<&str>,
        reference: Option<&str>,
    ) -> Result<Self> {
        Ok(Self {
            name: CustomerName::parse(name)?,
            phone: PhoneNumber::parse(phone)?,
            delivery_mode,
            address: non_blank(address),
            reference: non_blank(reference),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

/// A persisted customer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Customer ID
    pub id: CustomerId,
    /// Upper-cased name
    pub name: String,
    /// Nine-digit phone number (unique)
    pub phone: String,
    /// Pickup or delivery
    pub delivery_mode: DeliveryMode,
    /// Delivery address
    pub address: Option<String>,
    /// Delivery reference note
    pub reference: Option<String>,
}

// ============================================================================
// Inventory
// ============================================================================

/// Maximum stored length of an item name.
pub const ITEM_NAME_MAX_LEN: usize = 50;

/// Price used when an item is created without one.
pub const DEFAULT_ITEM_PRICE: Money = Money::from_cents(2000);

/// A sellable chicken part with finite stock.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Item ID
    pub id: ItemId,
    /// Display name, e.g. "Pierna"
    pub name: String,
    /// Units left to sell
    pub remaining: u32,
    /// Unit price
    pub price: Money,
}

impl InventoryItem {
    /// Whether at least one unit can still be sold
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.remaining > 0
    }
}

/// An item as submitted by the administrative surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewItem {
    /// Trimmed display name
    pub name: String,
    /// Initial stock
    pub remaining: u32,
    /// Unit price
    pub price: Money,
}

impl NewItem {
    /// Validate an item submission; a missing price defaults to [`DEFAULT_ITEM_PRICE`].
    ///
    /// # Errors
    ///
    /// Returns [`PolladaError::Validation`] on field `name` if it is blank
    /// or longer than [`ITEM_NAME_MAX_LEN`] characters.
    pub fn new(name: &str, remaining: u32, price: Option<Money>) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PolladaError::validation("name", "Item name is required."));
        }
        if name.chars().count() > ITEM_NAME_MAX_LEN {
            return Err(PolladaError::validation(
                "name",
                format!("Item name must be at most {ITEM_NAME_MAX_LEN} characters."),
            ));
        }
        Ok(Self {
            name: name.to_string(),
            remaining,
            price: price.unwrap_or(DEFAULT_ITEM_PRICE),
        })
    }
}

// ============================================================================
// Tickets
// ============================================================================

/// Request to issue one ticket, with the code already chosen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssueTicket {
    /// Owner
    pub customer_id: CustomerId,
    /// Item consumed from inventory
    pub item_id: ItemId,
    /// Candidate code; the store enforces uniqueness
    pub code: TicketCode,
    /// Issuance time, immutable once stored
    pub issued_at: DateTime<Utc>,
}

/// Lifecycle position of a ticket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Issued, payment not confirmed
    IssuedUnpaid,
    /// Payment confirmed, not yet consumed
    IssuedPaid,
    /// Consumed at the counter (terminal)
    Redeemed,
}

/// The two mutable flags of a ticket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketFlags {
    /// Payment confirmed by staff
    pub paid: bool,
    /// Consumed at the counter
    pub redeemed: bool,
}

impl TicketFlags {
    /// Current lifecycle position
    #[must_use]
    pub const fn status(&self) -> TicketStatus {
        match (self.paid, self.redeemed) {
            (_, true) => TicketStatus::Redeemed,
            (true, false) => TicketStatus::IssuedPaid,
            (false, false) => TicketStatus::IssuedUnpaid,
        }
    }

    /// Redemption guard: the only `Issued-Paid → Redeemed` transition.
    ///
    /// Must run inside the store's exclusive section for this ticket so the
    /// check and the write are one unit.
    ///
    /// # Errors
    ///
    /// - [`PolladaError::NotPaid`] if payment is not confirmed (checked first)
    /// - [`PolladaError::AlreadyRedeemed`] if the ticket was already consumed
    pub fn redeem(self, code: &TicketCode) -> Result<Self> {
        if !self.paid {
            return Err(PolladaError::NotPaid {
                code: code.to_string(),
            });
        }
        if self.redeemed {
            return Err(PolladaError::AlreadyRedeemed {
                code: code.to_string(),
            });
        }
        Ok(Self {
            paid: true,
            redeemed: true,
        })
    }
}

/// Customer fields shown alongside a ticket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketCustomer {
    /// Customer ID
    pub id: CustomerId,
    /// Upper-cased name
    pub name: String,
    /// Phone number
    pub phone: String,
    /// Pickup or delivery
    pub delivery_mode: DeliveryMode,
    /// Delivery address
    pub address: Option<String>,
    /// Delivery reference note
    pub reference: Option<String>,
}

impl From<Customer> for TicketCustomer {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            name: customer.name,
            phone: customer.phone,
            delivery_mode: customer.delivery_mode,
            address: customer.address,
            reference: customer.reference,
        }
    }
}

/// Item fields shown alongside a ticket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketItem {
    /// Item ID
    pub id: ItemId,
    /// Item name
    pub name: String,
    /// Unit price
    pub price: Money,
}

/// A ticket joined with its customer and item, as read from the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketView {
    /// Public code
    pub code: TicketCode,
    /// Owner
    pub customer: TicketCustomer,
    /// Purchased item
    pub item: TicketItem,
    /// Payment confirmed
    pub paid: bool,
    /// Consumed at the counter
    pub redeemed: bool,
    /// When the ticket was issued
    pub issued_at: DateTime<Utc>,
}

impl TicketView {
    /// Current flags
    #[must_use]
    pub const fn flags(&self) -> TicketFlags {
        TicketFlags {
            paid: self.paid,
            redeemed: self.redeemed,
        }
    }

    /// Current lifecycle position
    #[must_use]
    pub const fn status(&self) -> TicketStatus {
        self.flags().status()
    }

    /// Whether the owner's name or phone contains `query` (case-insensitive).
    #[must_use]
    pub fn customer_matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        self.customer.name.to_lowercase().contains(&needle)
            || self.customer.phone.contains(&needle)
    }
}

/// Criteria for the administrative ticket list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketFilter {
    /// Only paid (`true`) or unpaid (`false`) tickets
    pub paid: Option<bool>,
    /// Only redeemed (`true`) or unredeemed (`false`) tickets
    pub redeemed: Option<bool>,
    /// Substring of the code, customer name or phone
    pub query: Option<String>,
}

impl TicketFilter {
    /// The search text, if any non-blank text was given
    #[must_use]
    pub fn search_text(&self) -> Option<&str> {
        self.query.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    /// Whether `ticket` passes every criterion
    #[must_use]
    pub fn matches(&self, ticket: &TicketView) -> bool {
        if self.paid.is_some_and(|paid| ticket.paid != paid) {
            return false;
        }
        if self.redeemed.is_some_and(|redeemed| ticket.redeemed != redeemed) {
            return false;
        }
        self.search_text().is_none_or(|query| {
            ticket
                .code
                .as_str()
                .to_lowercase()
                .contains(&query.to_lowercase())
                || ticket.customer_matches(query)
        })
    }
}

// ============================================================================
// Reporting
// ============================================================================

/// Units sold for one item (paid or not).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSales {
    /// The item
    pub item: InventoryItem,
    /// Tickets issued against it
    pub sold: u64,
}

/// Scalar aggregates of the report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTotals {
    /// Sum of item prices over paid tickets
    pub revenue: Money,
    /// Sum of item prices over unpaid tickets
    pub pending: Money,
    /// Paid tickets
    pub paid_tickets: u64,
    /// Redeemed tickets
    pub redeemed_tickets: u64,
    /// Paid tickets whose customer chose delivery
    pub paid_delivery_tickets: u64,
}

/// Number of entries in [`Report::top_items`].
pub const TOP_ITEMS: usize = 3;

/// Read-only sales and inventory statistics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Scalar aggregates
    pub totals: ReportTotals,
    /// Paid delivery tickets not yet redeemed, by customer name
    pub pending_deliveries: Vec<TicketView>,
    /// Units sold per item, by item name
    pub sales_by_item: Vec<ItemSales>,
    /// Tickets still awaiting payment, oldest first
    pub unpaid_tickets: Vec<TicketView>,
    /// Best sellers, most sold first, ties by name
    pub top_items: Vec<ItemSales>,
}

impl Report {
    /// Assemble a report from aggregates a store already computed.
    ///
    /// Orders `sales_by_item` by item name and derives `top_items`.
    #[must_use]
    pub fn assemble(
        totals: ReportTotals,
        mut sales_by_item: Vec<ItemSales>,
        pending_deliveries: Vec<TicketView>,
        unpaid_tickets: Vec<TicketView>,
    ) -> Self {
        sales_by_item.sort_by(|a, b| a.item.name.cmp(&b.item.name));

        let mut top_items = sales_by_item.clone();
        top_items.sort_by(|a, b| match b.sold.cmp(&a.sold) {
            Ordering::Equal => a.item.name.cmp(&b.item.name),
            other => other,
        });
        top_items.truncate(TOP_ITEMS);

        Self {
            totals,
            pending_deliveries,
            sales_by_item,
            unpaid_tickets,
            top_items,
        }
    }

    /// Compute a report from every item and every ticket.
    ///
    /// Used by stores that cannot aggregate natively.
    #[must_use]
    pub fn compute(items: Vec<InventoryItem>, tickets: &[TicketView]) -> Self {
        let paid = || tickets.iter().filter(|t| t.paid);
        let is_delivery = |t: &&TicketView| t.customer.delivery_mode == DeliveryMode::Delivery;

        let totals = ReportTotals {
            revenue: paid().map(|t| t.item.price).sum(),
            pending: tickets.iter().filter(|t| !t.paid).map(|t| t.item.price).sum(),
            paid_tickets: paid().count() as u64,
            redeemed_tickets: tickets.iter().filter(|t| t.redeemed).count() as u64,
            paid_delivery_tickets: paid().filter(is_delivery).count() as u64,
        };

        let mut pending_deliveries: Vec<TicketView> = paid()
            .filter(is_delivery)
            .filter(|t| !t.redeemed)
            .cloned()
            .collect();
        pending_deliveries.sort_by(|a, b| {
            a.customer
                .name
                .cmp(&b.customer.name)
                .then(a.issued_at.cmp(&b.issued_at))
        });

        let mut unpaid_tickets: Vec<TicketView> =
            tickets.iter().filter(|t| !t.paid).cloned().collect();
        unpaid_tickets.sort_by(|a, b| a.issued_at.cmp(&b.issued_at).then(a.code.cmp(&b.code)));

        let sales_by_item = items
            .into_iter()
            .map(|item| {
                let sold = tickets.iter().filter(|t| t.item.id == item.id).count() as u64;
                ItemSales { item, sold }
            })
            .collect();

        Self::assemble(totals, sales_by_item, pending_deliveries, unpaid_tickets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn item(name: &str, price_cents: u64) -> InventoryItem {
        InventoryItem {
            id: ItemId::new(),
            name: name.to_string(),
            remaining: 10,
            price: Money::from_cents(price_cents),
        }
    }

    fn ticket(code: &str, customer: &str, mode: DeliveryMode, item: &InventoryItem, flags: TicketFlags) -> TicketView {
        TicketView {
            code: TicketCode::parse(code),
            customer: TicketCustomer {
                id: CustomerId::new(),
                name: customer.to_string(),
                phone: "912345678".to_string(),
                delivery_mode: mode,
                address: None,
                reference: None,
            },
            item: TicketItem {
                id: item.id,
                name: item.name.clone(),
                price: item.price,
            },
            paid: flags.paid,
            redeemed: flags.redeemed,
            issued_at: Utc::now(),
        }
    }

    const PAID: TicketFlags = TicketFlags { paid: true, redeemed: false };
    const UNPAID: TicketFlags = TicketFlags { paid: false, redeemed: false };
    const REDEEMED: TicketFlags = TicketFlags { paid: true, redeemed: true };

    #[test]
    fn money_parses_and_displays_two_decimals() {
        assert_eq!("20".parse::<Money>().ok(), Some(Money::from_cents(2000)));
        assert_eq!("20.5".parse::<Money>().ok(), Some(Money::from_cents(2050)));
        assert_eq!("15.00".parse::<Money>().ok(), Some(Money::from_cents(1500)));
        assert_eq!(Money::from_cents(2005).to_string(), "20.05");
        assert!("20.005".parse::<Money>().is_err());
        assert!("-1".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!(".50".parse::<Money>().is_err());
    }

    #[test]
    fn ticket_codes_normalize_case_and_whitespace() {
        assert_eq!(TicketCode::parse("  a1b2c3d4 "), TicketCode::parse("A1B2C3D4"));
        assert_eq!(TicketCode::parse("a1b2c3d4").as_str(), "A1B2C3D4");
    }

    #[test]
    fn ticket_code_deserializes_normalized() {
        let code: TicketCode = serde_json::from_str("\"ab12cd34\"").unwrap_or_else(|_| TicketCode::parse(""));
        assert_eq!(code.as_str(), "AB12CD34");
    }

    #[test]
    fn customer_name_is_upper_cased() {
        let name = CustomerName::parse("  ana torres ").map(|n| n.as_str().to_string());
        assert_eq!(name, Ok("ANA TORRES".to_string()));
    }

    #[test]
    fn name_length_is_checked_after_upper_casing() {
        let limit = "ß".repeat(CUSTOMER_NAME_MAX_LEN / 2);
        let stored = CustomerName::parse(&limit).map(|n| n.as_str().chars().count());
        assert_eq!(stored, Ok(CUSTOMER_NAME_MAX_LEN));

        let grows_past_limit = "ß".repeat(CUSTOMER_NAME_MAX_LEN / 2 + 1);
        assert!(matches!(
            CustomerName::parse(&grows_past_limit),
            Err(PolladaError::Validation { field: "name", .. })
        ));
        assert!(matches!(
            CustomerName::parse(&"ß".repeat(CUSTOMER_NAME_MAX_LEN)),
            Err(PolladaError::Validation { field: "name", .. })
        ));
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = CustomerName::parse("   ");
        assert!(matches!(err, Err(PolladaError::Validation { field: "name", .. })));
    }

    #[test]
    fn phone_must_be_nine_digits() {
        assert!(PhoneNumber::parse("912345678").is_ok());
        assert!(matches!(
            PhoneNumber::parse("91234567"),
            Err(PolladaError::Validation { field: "phone", .. })
        ));
        assert!(matches!(
            PhoneNumber::parse("91234567a"),
            Err(PolladaError::Validation { field: "phone", .. })
        ));
        assert!(matches!(
            PhoneNumber::parse(""),
            Err(PolladaError::Validation { field: "phone", .. })
        ));
    }

    #[test]
    fn registration_keeps_optional_fields_optional_for_delivery() {
        let registration =
            CustomerRegistration::new("ana", "912345678", DeliveryMode::Delivery, Some("  "), None);
        let registration = registration.map(|r| (r.address, r.reference));
        assert_eq!(registration, Ok((None, None)));
    }

    #[test]
    fn registration_reports_name_before_phone() {
        let err = CustomerRegistration::new("", "123", DeliveryMode::Pickup, None, None);
        assert!(matches!(err, Err(PolladaError::Validation { field: "name", .. })));
    }

    #[test]
    fn delivery_mode_accepts_legacy_pickup_value() {
        assert_eq!("recojo".parse::<DeliveryMode>(), Ok(DeliveryMode::Pickup));
        assert_eq!("Delivery".parse::<DeliveryMode>(), Ok(DeliveryMode::Delivery));
        let parsed: std::result::Result<DeliveryMode, _> = serde_json::from_str("\"recojo\"");
        assert_eq!(parsed.ok(), Some(DeliveryMode::Pickup));
    }

    #[test]
    fn new_item_defaults_price() {
        let item = NewItem::new(" Pierna ", 5, None).map(|i| (i.name, i.price));
        assert_eq!(item, Ok(("Pierna".to_string(), DEFAULT_ITEM_PRICE)));
    }

    #[test]
    fn redeem_guard_checks_payment_before_redemption() {
        let code = TicketCode::parse("A1B2C3D4");

        assert!(matches!(UNPAID.redeem(&code), Err(PolladaError::NotPaid { .. })));
        // A redeemed-but-unpaid row cannot exist, but the guard still reports payment first.
        let impossible = TicketFlags { paid: false, redeemed: true };
        assert!(matches!(impossible.redeem(&code), Err(PolladaError::NotPaid { .. })));
        assert!(matches!(REDEEMED.redeem(&code), Err(PolladaError::AlreadyRedeemed { .. })));
        assert_eq!(PAID.redeem(&code), Ok(REDEEMED));
    }

    #[test]
    fn status_follows_flags() {
        assert_eq!(UNPAID.status(), TicketStatus::IssuedUnpaid);
        assert_eq!(PAID.status(), TicketStatus::IssuedPaid);
        assert_eq!(REDEEMED.status(), TicketStatus::Redeemed);
    }

    #[test]
    fn filter_matches_code_name_and_phone() {
        let pierna = item("Pierna", 2000);
        let t = ticket("A1B2C3D4", "ANA TORRES", DeliveryMode::Pickup, &pierna, PAID);

        let by = |query: &str| TicketFilter {
            query: Some(query.to_string()),
            ..TicketFilter::default()
        };
        assert!(by("b2c3").matches(&t));
        assert!(by("torres").matches(&t));
        assert!(by("2345").matches(&t));
        assert!(!by("luis").matches(&t));
        assert!(by("   ").matches(&t));

        let unpaid_only = TicketFilter {
            paid: Some(false),
            ..TicketFilter::default()
        };
        assert!(!unpaid_only.matches(&t));
    }

    #[test]
    fn report_over_one_paid_and_one_unpaid_ticket() {
        let pierna = item("Pierna", 2000);
        let pecho = item("Pecho", 1500);
        let tickets = vec![
            ticket("AAAA0001", "ANA", DeliveryMode::Pickup, &pierna, PAID),
            ticket("AAAA0002", "LUIS", DeliveryMode::Pickup, &pecho, UNPAID),
        ];

        let report = Report::compute(vec![pierna, pecho], &tickets);

        assert_eq!(report.totals.revenue, Money::from_cents(2000));
        assert_eq!(report.totals.pending, Money::from_cents(1500));
        assert_eq!(report.totals.paid_tickets, 1);
        assert_eq!(report.unpaid_tickets.len(), 1);
        assert_eq!(report.unpaid_tickets[0].code.as_str(), "AAAA0002");
    }

    #[test]
    fn report_lists_pending_deliveries_by_customer_name() {
        let pierna = item("Pierna", 2000);
        let tickets = vec![
            ticket("AAAA0001", "ZOE", DeliveryMode::Delivery, &pierna, PAID),
            ticket("AAAA0002", "ANA", DeliveryMode::Delivery, &pierna, PAID),
            ticket("AAAA0003", "BETO", DeliveryMode::Delivery, &pierna, REDEEMED),
            ticket("AAAA0004", "CARLA", DeliveryMode::Delivery, &pierna, UNPAID),
            ticket("AAAA0005", "DANI", DeliveryMode::Pickup, &pierna, PAID),
        ];

        let report = Report::compute(vec![pierna], &tickets);

        let names: Vec<&str> = report
            .pending_deliveries
            .iter()
            .map(|t| t.customer.name.as_str())
            .collect();
        assert_eq!(names, vec!["ANA", "ZOE"]);
        assert_eq!(report.totals.paid_delivery_tickets, 3);
        assert_eq!(report.totals.redeemed_tickets, 1);
    }

    #[test]
    fn top_items_break_ties_by_name_and_keep_three() {
        let items = vec![
            item("Ala", 1000),
            item("Pecho", 1500),
            item("Pierna", 2000),
            item("Encuentro", 1800),
        ];
        let sales = vec![
            ItemSales { item: items[0].clone(), sold: 1 },
            ItemSales { item: items[1].clone(), sold: 4 },
            ItemSales { item: items[2].clone(), sold: 4 },
            ItemSales { item: items[3].clone(), sold: 0 },
        ];

        let report = Report::assemble(ReportTotals::default(), sales, vec![], vec![]);

        let top: Vec<&str> = report.top_items.iter().map(|s| s.item.name.as_str()).collect();
        assert_eq!(top, vec!["Pecho", "Pierna", "Ala"]);
        let by_name: Vec<&str> = report.sales_by_item.iter().map(|s| s.item.name.as_str()).collect();
        assert_eq!(by_name, vec!["Ala", "Encuentro", "Pecho", "Pierna"]);
    }

    proptest! {
        #[test]
        fn any_nine_digit_string_is_a_phone(digits in "[0-9]{9}") {
            prop_assert!(PhoneNumber::parse(&digits).is_ok());
        }

        #[test]
        fn wrong_length_digit_strings_are_rejected(digits in "[0-9]{1,8}|[0-9]{10,15}") {
            prop_assert!(PhoneNumber::parse(&digits).is_err());
        }

        #[test]
        fn money_display_round_trips(cents in 0u64..10_000_000) {
            let money = Money::from_cents(cents);
            prop_assert_eq!(money.to_string().parse::<Money>().ok(), Some(money));
        }
    }
}
