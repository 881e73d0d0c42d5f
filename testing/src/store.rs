//! In-memory ticket store.
//!
//! Mirrors the locking discipline of the `PostgreSQL` store: table-level
//! bookkeeping sits behind one short synchronous lock that is never held
//! across an `.await`, and every ticket row carries its own async mutex.
//! Redemption holds only that row's mutex for its check-and-set, so two
//! attempts on the same code are serialized while different codes proceed
//! independently.

use chrono::{DateTime, Utc};
use pollada_core::types::{
    Customer, CustomerId, CustomerRegistration, InventoryItem, IssueTicket, ItemId, NewItem,
    Report, TicketCode, TicketCustomer, TicketFilter, TicketFlags, TicketItem, TicketView,
};
use pollada_core::{PolladaError, Result, TicketStore};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
struct TicketRecord {
    customer_id: CustomerId,
    item_id: ItemId,
    flags: TicketFlags,
    issued_at: DateTime<Utc>,
}

type TicketRow = Arc<tokio::sync::Mutex<TicketRecord>>;

#[derive(Debug, Default)]
struct Tables {
    customers: HashMap<CustomerId, Customer>,
    customers_by_phone: HashMap<String, CustomerId>,
    items: HashMap<ItemId, InventoryItem>,
    tickets: HashMap<TicketCode, TicketRow>,
}

impl Tables {
    fn view(&self, code: &TicketCode, record: &TicketRecord) -> Result<TicketView> {
        let customer = self
            .customers
            .get(&record.customer_id)
            .cloned()
            .ok_or_else(|| PolladaError::Storage(format!("ticket {code} has no customer")))?;
        let item = self
            .items
            .get(&record.item_id)
            .ok_or_else(|| PolladaError::Storage(format!("ticket {code} has no item")))?;

        Ok(TicketView {
            code: code.clone(),
            customer: TicketCustomer::from(customer),
            item: TicketItem {
                id: item.id,
                name: item.name.clone(),
                price: item.price,
            },
            paid: record.flags.paid,
            redeemed: record.flags.redeemed,
            issued_at: record.issued_at,
        })
    }
}

/// In-memory [`TicketStore`] for tests.
///
/// Cloning shares the underlying tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTicketStore {
    tables: Arc<Mutex<Tables>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryTicketStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the store going down (`true`) or coming back (`false`).
    ///
    /// While down, every operation fails with [`PolladaError::Storage`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PolladaError::Storage("store unavailable".to_string()));
        }
        self.tables
            .lock()
            .map_err(|_| PolladaError::Storage("store lock poisoned".to_string()))
    }

    fn row(&self, code: &TicketCode) -> Result<TicketRow> {
        let tables = self.lock()?;
        tables
            .tickets
            .get(code)
            .cloned()
            .ok_or_else(|| PolladaError::TicketNotFound {
                code: code.to_string(),
            })
    }

    async fn all_tickets(&self) -> Result<Vec<TicketView>> {
        let rows: Vec<(TicketCode, TicketRow)> = {
            let tables = self.lock()?;
            tables
                .tickets
                .iter()
                .map(|(code, row)| (code.clone(), Arc::clone(row)))
                .collect()
        };

        let mut records = Vec::with_capacity(rows.len());
        for (code, row) in rows {
            let record = row.lock().await.clone();
            records.push((code, record));
        }

        let tables = self.lock()?;
        records
            .iter()
            .map(|(code, record)| tables.view(code, record))
            .collect()
    }
}

impl TicketStore for InMemoryTicketStore {
    async fn upsert_customer(
        &self,
        registration: &CustomerRegistration,
        _now: DateTime<Utc>,
    ) -> Result<Customer> {
        let mut tables = self.lock()?;
        let phone = registration.phone.as_str().to_string();
        let id = tables
            .customers_by_phone
            .get(&phone)
            .copied()
            .unwrap_or_else(CustomerId::new);

        let customer = Customer {
            id,
            name: registration.name.as_str().to_string(),
            phone: phone.clone(),
            delivery_mode: registration.delivery_mode,
            address: registration.address.clone(),
            reference: registration.reference.clone(),
        };
        tables.customers_by_phone.insert(phone, id);
        tables.customers.insert(id, customer.clone());
        Ok(customer)
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Customer> {
        let tables = self.lock()?;
        tables
            .customers
            .get(&id)
            .cloned()
            .ok_or(PolladaError::CustomerNotFound(id))
    }

    async fn create_item(&self, item: &NewItem) -> Result<InventoryItem> {
        let mut tables = self.lock()?;
        let created = InventoryItem {
            id: ItemId::new(),
            name: item.name.clone(),
            remaining: item.remaining,
            price: item.price,
        };
        tables.items.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_item(&self, id: ItemId) -> Result<InventoryItem> {
        let tables = self.lock()?;
        tables
            .items
            .get(&id)
            .cloned()
            .ok_or(PolladaError::ItemNotFound(id))
    }

    async fn list_items(&self, only_available: bool) -> Result<Vec<InventoryItem>> {
        let tables = self.lock()?;
        let mut items: Vec<InventoryItem> = tables
            .items
            .values()
            .filter(|item| !only_available || item.is_available())
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn set_item_stock(&self, id: ItemId, remaining: u32) -> Result<InventoryItem> {
        let mut tables = self.lock()?;
        let item = tables
            .items
            .get_mut(&id)
            .ok_or(PolladaError::ItemNotFound(id))?;
        item.remaining = remaining;
        Ok(item.clone())
    }

    async fn issue_ticket(&self, request: &IssueTicket) -> Result<TicketView> {
        let mut tables = self.lock()?;

        if !tables.customers.contains_key(&request.customer_id) {
            return Err(PolladaError::CustomerNotFound(request.customer_id));
        }
        let item = tables
            .items
            .get(&request.item_id)
            .ok_or(PolladaError::ItemNotFound(request.item_id))?;
        if !item.is_available() {
            return Err(PolladaError::OutOfStock {
                item: item.name.clone(),
            });
        }
        if tables.tickets.contains_key(&request.code) {
            return Err(PolladaError::DuplicateCode {
                code: request.code.to_string(),
            });
        }

        if let Some(item) = tables.items.get_mut(&request.item_id) {
            item.remaining -= 1;
        }
        let record = TicketRecord {
            customer_id: request.customer_id,
            item_id: request.item_id,
            flags: TicketFlags::default(),
            issued_at: request.issued_at,
        };
        let view = tables.view(&request.code, &record)?;
        tables.tickets.insert(
            request.code.clone(),
            Arc::new(tokio::sync::Mutex::new(record)),
        );
        Ok(view)
    }

    async fn find_ticket(&self, code: &TicketCode) -> Result<TicketView> {
        let row = self.row(code)?;
        let record = row.lock().await.clone();
        let tables = self.lock()?;
        tables.view(code, &record)
    }

    async fn redeem_ticket(&self, code: &TicketCode) -> Result<TicketView> {
        let row = self.row(code)?;
        let mut record = row.lock().await;

        let redeemed = TicketRecord {
            flags: record.flags.redeem(code)?,
            ..record.clone()
        };
        let view = self.lock()?.view(code, &redeemed)?;

        // Committed only once nothing else can fail.
        *record = redeemed;
        Ok(view)
    }

    async fn mark_paid(&self, codes: &[TicketCode]) -> Result<u64> {
        let rows: Vec<TicketRow> = {
            let tables = self.lock()?;
            let unique: HashSet<&TicketCode> = codes.iter().collect();
            unique
                .into_iter()
                .filter_map(|code| tables.tickets.get(code).cloned())
                .collect()
        };

        let mut matched = 0;
        for row in rows {
            row.lock().await.flags.paid = true;
            matched += 1;
        }
        Ok(matched)
    }

    async fn search_by_customer(&self, query: &str) -> Result<Vec<TicketView>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let mut tickets: Vec<TicketView> = self
            .all_tickets()
            .await?
            .into_iter()
            .filter(|ticket| ticket.customer_matches(query))
            .collect();
        tickets.sort_by(|a, b| {
            a.customer
                .name
                .cmp(&b.customer.name)
                .then(a.issued_at.cmp(&b.issued_at))
        });
        Ok(tickets)
    }

    async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<TicketView>> {
        let mut tickets: Vec<TicketView> = self
            .all_tickets()
            .await?
            .into_iter()
            .filter(|ticket| filter.matches(ticket))
            .collect();
        tickets.sort_by(|a, b| b.issued_at.cmp(&a.issued_at).then(a.code.cmp(&b.code)));
        Ok(tickets)
    }

    async fn report(&self) -> Result<Report> {
        let tickets = self.all_tickets().await?;
        let items = self.list_items(false).await?;
        Ok(Report::compute(items, &tickets))
    }

    async fn ping(&self) -> Result<()> {
        self.lock().map(|_| ())
    }
}
