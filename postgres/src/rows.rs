//! Row decoding and the shared ticket `SELECT`.

use pollada_core::types::{
    Customer, CustomerId, DeliveryMode, InventoryItem, ItemId, Money, TicketCode,
    TicketCustomer, TicketItem, TicketView,
};
use pollada_core::{PolladaError, Result};
use sqlx::Row;
use sqlx::postgres::PgRow;

/// Ticket joined with its customer and item. Callers append `WHERE`/`ORDER BY`.
pub const TICKET_VIEW_SELECT: &str = r"
    SELECT
        t.code, t.paid, t.redeemed, t.issued_at,
        c.id AS customer_id, c.name AS customer_name, c.phone, c.delivery_mode,
        c.address, c.reference,
        i.id AS item_id, i.name AS item_name, i.price_cents
    FROM tickets t
    JOIN customers c ON c.id = t.customer_id
    JOIN inventory_items i ON i.id = t.item_id
";

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| PolladaError::Storage(format!("Failed to decode column {name}: {e}")))
}

fn delivery_mode(row: &PgRow) -> Result<DeliveryMode> {
    let raw: String = column(row, "delivery_mode")?;
    raw.parse()
        .map_err(|_| PolladaError::Storage(format!("Invalid delivery mode in database: {raw}")))
}

fn price(row: &PgRow) -> Result<Money> {
    let cents: i64 = column(row, "price_cents")?;
    u64::try_from(cents)
        .map(Money::from_cents)
        .map_err(|_| PolladaError::Storage(format!("Negative price in database: {cents}")))
}

pub fn customer(row: &PgRow) -> Result<Customer> {
    Ok(Customer {
        id: CustomerId::from_uuid(column(row, "id")?),
        name: column(row, "name")?,
        phone: column(row, "phone")?,
        delivery_mode: delivery_mode(row)?,
        address: column(row, "address")?,
        reference: column(row, "reference")?,
    })
}

pub fn item(row: &PgRow) -> Result<InventoryItem> {
    let remaining: i32 = column(row, "remaining")?;
    Ok(InventoryItem {
        id: ItemId::from_uuid(column(row, "id")?),
        name: column(row, "name")?,
        remaining: u32::try_from(remaining).map_err(|_| {
            PolladaError::Storage(format!("Negative stock in database: {remaining}"))
        })?,
        price: price(row)?,
    })
}

pub fn ticket_view(row: &PgRow) -> Result<TicketView> {
    let code: String = column(row, "code")?;
    Ok(TicketView {
        code: TicketCode::parse(&code),
        customer: TicketCustomer {
            id: CustomerId::from_uuid(column(row, "customer_id")?),
            name: column(row, "customer_name")?,
            phone: column(row, "phone")?,
            delivery_mode: delivery_mode(row)?,
            address: column(row, "address")?,
            reference: column(row, "reference")?,
        },
        item: TicketItem {
            id: ItemId::from_uuid(column(row, "item_id")?),
            name: column(row, "item_name")?,
            price: price(row)?,
        },
        paid: column(row, "paid")?,
        redeemed: column(row, "redeemed")?,
        issued_at: column(row, "issued_at")?,
    })
}

/// `ILIKE` pattern matching `text` anywhere, with wildcards in `text` escaped.
pub fn contains_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
