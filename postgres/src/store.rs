//! `PostgreSQL` implementation of [`TicketStore`].

use crate::rows::{self, TICKET_VIEW_SELECT};
use chrono::{DateTime, Utc};
use pollada_core::types::{
    Customer, CustomerId, CustomerRegistration, InventoryItem, IssueTicket, ItemId, ItemSales,
    Money, NewItem, Report, ReportTotals, TicketCode, TicketFilter, TicketFlags, TicketView,
};
use pollada_core::{PolladaError, Result, TicketStore};
use sqlx::postgres::{PgConnection, PgPool, PgRow};
use sqlx::Row;

/// `PostgreSQL`-backed ticket store.
///
/// Cloning is cheap and shares the connection pool.
#[derive(Clone, Debug)]
pub struct PostgresTicketStore {
    pool: PgPool,
}

impl PostgresTicketStore {
    /// Connect to `database_url` with a default pool.
    ///
    /// # Errors
    ///
    /// Returns [`PolladaError::Storage`] if the connection fails.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| PolladaError::Storage(format!("Failed to connect: {e}")))?;
        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`PolladaError::Storage`] if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| PolladaError::Storage(format!("Migration failed: {e}")))?;
        Ok(())
    }

    async fn view_in(conn: &mut PgConnection, code: &TicketCode) -> Result<TicketView> {
        let row = sqlx::query(&format!("{TICKET_VIEW_SELECT} WHERE t.code = $1"))
            .bind(code.as_str())
            .fetch_optional(conn)
            .await
            .map_err(|e| PolladaError::Storage(format!("Failed to load ticket: {e}")))?
            .ok_or_else(|| PolladaError::TicketNotFound {
                code: code.to_string(),
            })?;
        rows::ticket_view(&row)
    }

    async fn views_in(
        conn: &mut PgConnection,
        clause: &str,
        context: &str,
    ) -> Result<Vec<TicketView>> {
        sqlx::query(&format!("{TICKET_VIEW_SELECT} {clause}"))
            .fetch_all(conn)
            .await
            .map_err(|e| PolladaError::Storage(format!("Failed to {context}: {e}")))?
            .iter()
            .map(rows::ticket_view)
            .collect()
    }
}

fn stock_to_db(remaining: u32) -> Result<i32> {
    i32::try_from(remaining)
        .map_err(|_| PolladaError::validation("remaining", format!("{remaining} is too large")))
}

fn price_to_db(price: Money) -> Result<i64> {
    i64::try_from(price.cents())
        .map_err(|_| PolladaError::validation("price", format!("{price} is too large")))
}

fn count(row: &PgRow, name: &str) -> Result<u64> {
    let value: i64 = row
        .try_get(name)
        .map_err(|e| PolladaError::Storage(format!("Failed to decode {name}: {e}")))?;
    u64::try_from(value).map_err(|_| PolladaError::Storage(format!("Negative {name}: {value}")))
}

fn money(row: &PgRow, name: &str) -> Result<Money> {
    count(row, name).map(Money::from_cents)
}

impl TicketStore for PostgresTicketStore {
    async fn upsert_customer(
        &self,
        registration: &CustomerRegistration,
        now: DateTime<Utc>,
    ) -> Result<Customer> {
        let row = sqlx::query(
            r"
            INSERT INTO customers (id, name, phone, delivery_mode, address, reference, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            ON CONFLICT (phone) DO UPDATE SET
                name = EXCLUDED.name,
                delivery_mode = EXCLUDED.delivery_mode,
                address = EXCLUDED.address,
                reference = EXCLUDED.reference,
                updated_at = EXCLUDED.updated_at
            RETURNING id, name, phone, delivery_mode, address, reference
            ",
        )
        .bind(CustomerId::new().as_uuid())
        .bind(registration.name.as_str())
        .bind(registration.phone.as_str())
        .bind(registration.delivery_mode.as_str())
        .bind(registration.address.as_deref())
        .bind(registration.reference.as_deref())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PolladaError::Storage(format!("Failed to upsert customer: {e}")))?;

        rows::customer(&row)
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Customer> {
        let row = sqlx::query(
            "SELECT id, name, phone, delivery_mode, address, reference FROM customers WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PolladaError::Storage(format!("Failed to get customer: {e}")))?
        .ok_or(PolladaError::CustomerNotFound(id))?;

        rows::customer(&row)
    }

    async fn create_item(&self, item: &NewItem) -> Result<InventoryItem> {
        let row = sqlx::query(
            r"
            INSERT INTO inventory_items (id, name, remaining, price_cents)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, remaining, price_cents
            ",
        )
        .bind(ItemId::new().as_uuid())
        .bind(&item.name)
        .bind(stock_to_db(item.remaining)?)
        .bind(price_to_db(item.price)?)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PolladaError::Storage(format!("Failed to create item: {e}")))?;

        rows::item(&row)
    }

    async fn get_item(&self, id: ItemId) -> Result<InventoryItem> {
        let row = sqlx::query("SELECT id, name, remaining, price_cents FROM inventory_items WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PolladaError::Storage(format!("Failed to get item: {e}")))?
            .ok_or(PolladaError::ItemNotFound(id))?;

        rows::item(&row)
    }

    async fn list_items(&self, only_available: bool) -> Result<Vec<InventoryItem>> {
        sqlx::query(
            r"
            SELECT id, name, remaining, price_cents
            FROM inventory_items
            WHERE NOT $1 OR remaining > 0
            ORDER BY name, id
            ",
        )
        .bind(only_available)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PolladaError::Storage(format!("Failed to list items: {e}")))?
        .iter()
        .map(rows::item)
        .collect()
    }

    async fn set_item_stock(&self, id: ItemId, remaining: u32) -> Result<InventoryItem> {
        let row = sqlx::query(
            r"
            UPDATE inventory_items SET remaining = $2
            WHERE id = $1
            RETURNING id, name, remaining, price_cents
            ",
        )
        .bind(id.as_uuid())
        .bind(stock_to_db(remaining)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PolladaError::Storage(format!("Failed to set item stock: {e}")))?
        .ok_or(PolladaError::ItemNotFound(id))?;

        rows::item(&row)
    }

    async fn issue_ticket(&self, request: &IssueTicket) -> Result<TicketView> {
        // Returning before commit drops the transaction, which rolls it back.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PolladaError::Storage(format!("Failed to start transaction: {e}")))?;

        let customer_exists: Option<(uuid::Uuid,)> =
            sqlx::query_as("SELECT id FROM customers WHERE id = $1")
                .bind(request.customer_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| PolladaError::Storage(format!("Failed to check customer: {e}")))?;
        if customer_exists.is_none() {
            return Err(PolladaError::CustomerNotFound(request.customer_id));
        }

        let decremented = sqlx::query(
            r"
            UPDATE inventory_items SET remaining = remaining - 1
            WHERE id = $1 AND remaining > 0
            RETURNING id
            ",
        )
        .bind(request.item_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| PolladaError::Storage(format!("Failed to decrement stock: {e}")))?;
        if decremented.is_none() {
            let name: Option<(String,)> =
                sqlx::query_as("SELECT name FROM inventory_items WHERE id = $1")
                    .bind(request.item_id.as_uuid())
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(|e| PolladaError::Storage(format!("Failed to get item: {e}")))?;
            return Err(match name {
                Some((item,)) => PolladaError::OutOfStock { item },
                None => PolladaError::ItemNotFound(request.item_id),
            });
        }

        let inserted = sqlx::query(
            r"
            INSERT INTO tickets (code, customer_id, item_id, paid, redeemed, issued_at)
            VALUES ($1, $2, $3, FALSE, FALSE, $4)
            ON CONFLICT (code) DO NOTHING
            ",
        )
        .bind(request.code.as_str())
        .bind(request.customer_id.as_uuid())
        .bind(request.item_id.as_uuid())
        .bind(request.issued_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| PolladaError::Storage(format!("Failed to insert ticket: {e}")))?;
        if inserted.rows_affected() == 0 {
            // Rolls back the decrement above.
            return Err(PolladaError::DuplicateCode {
                code: request.code.to_string(),
            });
        }

        let view = Self::view_in(&mut *tx, &request.code).await?;

        tx.commit()
            .await
            .map_err(|e| PolladaError::Storage(format!("Failed to commit ticket: {e}")))?;

        tracing::debug!(code = %request.code, item = %view.item.name, "Ticket row inserted");
        Ok(view)
    }

    async fn find_ticket(&self, code: &TicketCode) -> Result<TicketView> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| PolladaError::Storage(format!("Failed to acquire connection: {e}")))?;
        Self::view_in(&mut *conn, code).await
    }

    async fn redeem_ticket(&self, code: &TicketCode) -> Result<TicketView> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PolladaError::Storage(format!("Failed to start transaction: {e}")))?;

        // Blocks concurrent redeemers of this code until commit or rollback.
        let flags: Option<(bool, bool)> =
            sqlx::query_as("SELECT paid, redeemed FROM tickets WHERE code = $1 FOR UPDATE")
                .bind(code.as_str())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| PolladaError::Storage(format!("Failed to lock ticket: {e}")))?;
        let (paid, redeemed) = flags.ok_or_else(|| PolladaError::TicketNotFound {
            code: code.to_string(),
        })?;

        TicketFlags { paid, redeemed }.redeem(code)?;

        sqlx::query("UPDATE tickets SET redeemed = TRUE WHERE code = $1")
            .bind(code.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| PolladaError::Storage(format!("Failed to redeem ticket: {e}")))?;

        let view = Self::view_in(&mut *tx, code).await?;

        tx.commit()
            .await
            .map_err(|e| PolladaError::Storage(format!("Failed to commit redemption: {e}")))?;

        Ok(view)
    }

    async fn mark_paid(&self, codes: &[TicketCode]) -> Result<u64> {
        let codes: Vec<&str> = codes.iter().map(TicketCode::as_str).collect();
        let result = sqlx::query("UPDATE tickets SET paid = TRUE WHERE code = ANY($1)")
            .bind(&codes)
            .execute(&self.pool)
            .await
            .map_err(|e| PolladaError::Storage(format!("Failed to mark tickets paid: {e}")))?;
        Ok(result.rows_affected())
    }

    async fn search_by_customer(&self, query: &str) -> Result<Vec<TicketView>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query(&format!(
            "{TICKET_VIEW_SELECT} WHERE c.name ILIKE $1 OR c.phone LIKE $1 \
             ORDER BY c.name, t.issued_at, t.code"
        ))
        .bind(rows::contains_pattern(query))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PolladaError::Storage(format!("Failed to search tickets: {e}")))?
        .iter()
        .map(rows::ticket_view)
        .collect()
    }

    async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<TicketView>> {
        sqlx::query(&format!(
            "{TICKET_VIEW_SELECT} \
             WHERE ($1::BOOLEAN IS NULL OR t.paid = $1) \
               AND ($2::BOOLEAN IS NULL OR t.redeemed = $2) \
               AND ($3::TEXT IS NULL OR t.code ILIKE $3 OR c.name ILIKE $3 OR c.phone LIKE $3) \
             ORDER BY t.issued_at DESC, t.code"
        ))
        .bind(filter.paid)
        .bind(filter.redeemed)
        .bind(filter.search_text().map(rows::contains_pattern))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PolladaError::Storage(format!("Failed to list tickets: {e}")))?
        .iter()
        .map(rows::ticket_view)
        .collect()
    }

    async fn report(&self) -> Result<Report> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PolladaError::Storage(format!("Failed to start transaction: {e}")))?;

        // Every query below sees the same snapshot.
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(|e| PolladaError::Storage(format!("Failed to set isolation: {e}")))?;

        let totals = sqlx::query(
            r"
            SELECT
                COALESCE(SUM(i.price_cents) FILTER (WHERE t.paid), 0)::BIGINT AS revenue,
                COALESCE(SUM(i.price_cents) FILTER (WHERE NOT t.paid), 0)::BIGINT AS pending,
                COUNT(*) FILTER (WHERE t.paid) AS paid_tickets,
                COUNT(*) FILTER (WHERE t.redeemed) AS redeemed_tickets,
                COUNT(*) FILTER (WHERE t.paid AND c.delivery_mode = 'delivery') AS paid_delivery_tickets
            FROM tickets t
            JOIN customers c ON c.id = t.customer_id
            JOIN inventory_items i ON i.id = t.item_id
            ",
        )
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| PolladaError::Storage(format!("Failed to compute totals: {e}")))?;
        let totals = ReportTotals {
            revenue: money(&totals, "revenue")?,
            pending: money(&totals, "pending")?,
            paid_tickets: count(&totals, "paid_tickets")?,
            redeemed_tickets: count(&totals, "redeemed_tickets")?,
            paid_delivery_tickets: count(&totals, "paid_delivery_tickets")?,
        };

        let sales_by_item = sqlx::query(
            r"
            SELECT i.id, i.name, i.remaining, i.price_cents, COUNT(t.code) AS sold
            FROM inventory_items i
            LEFT JOIN tickets t ON t.item_id = i.id
            GROUP BY i.id, i.name, i.remaining, i.price_cents
            ",
        )
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| PolladaError::Storage(format!("Failed to compute item sales: {e}")))?
        .iter()
        .map(|row| {
            Ok(ItemSales {
                item: rows::item(row)?,
                sold: count(row, "sold")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

        let pending_deliveries = Self::views_in(
            &mut *tx,
            "WHERE t.paid AND NOT t.redeemed AND c.delivery_mode = 'delivery' \
             ORDER BY c.name, t.issued_at, t.code",
            "list pending deliveries",
        )
        .await?;

        let unpaid_tickets = Self::views_in(
            &mut *tx,
            "WHERE NOT t.paid ORDER BY t.issued_at, t.code",
            "list unpaid tickets",
        )
        .await?;

        tx.commit()
            .await
            .map_err(|e| PolladaError::Storage(format!("Failed to close report snapshot: {e}")))?;

        Ok(Report::assemble(
            totals,
            sales_by_item,
            pending_deliveries,
            unpaid_tickets,
        ))
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| PolladaError::Storage(format!("Database unreachable: {e}")))?;
        Ok(())
    }
}
