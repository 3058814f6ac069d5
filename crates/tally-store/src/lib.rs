//! Tally Storage Layer
//!
//! Implements the `RecordStore` trait using SQLite, plus flat CSV export of
//! both entity tables.
//!
//! # Deduplication
//!
//! Orders are inserted with a single conditional statement
//! (`INSERT ... ON CONFLICT(order_id) DO NOTHING`) inside an immediate
//! transaction. The primary key decides the winner, so two writers racing on
//! the same id cannot both succeed, and the loser sees
//! [`InsertOutcome::Duplicate`] rather than a constraint error.
//!
//! # Examples
//!
//! ```
//! use tally_store::SqliteStore;
//! use tally_domain::{Order, RecordStore, InsertOutcome};
//!
//! let mut store = SqliteStore::new(":memory:").unwrap();
//! assert_eq!(store.create_order(&Order::new("A1")).unwrap(), InsertOutcome::Inserted);
//! assert_eq!(store.create_order(&Order::new("A1")).unwrap(), InsertOutcome::Duplicate);
//! ```

#![warn(missing_docs)]

pub mod export;

use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::path::Path;
use std::time::Duration;
use tally_domain::{ExtractedInvoice, InsertOutcome, LineItem, Order, OrderPatch, RecordStore};
use thiserror::Error;
use tracing::debug;

pub use export::{export_tables, load_line_items, load_orders, ExportError, ExportSummary};

/// How long a writer waits on a locked database before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// SQLite-based implementation of RecordStore
///
/// # Thread Safety
///
/// SQLite connections are not shareable across threads. Wrap the store in a
/// mutex, or open one store per thread on the same database file.
pub struct SqliteStore {
    conn: Connection,
}

const ORDER_COLUMNS: &str =
    "order_id, customer_name, email, phone, total_qty, subtotal, vat, grand_total";

impl SqliteStore {
    /// Open (or create) the database at `path`
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Line items belonging to one order, in insertion order
    pub fn line_items_for(&self, order_id: &str) -> Result<Vec<LineItem>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT order_id, product_id, title, product_qty, line_total
             FROM order_line_items WHERE order_id = ?1 ORDER BY id",
        )?;
        let items = stmt
            .query_map(params![order_id], line_item_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    fn write_tx(&mut self) -> Result<Transaction<'_>, StoreError> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }
}

/// Conditionally insert an order row; returns false if the id was taken
fn insert_order_row(tx: &Transaction<'_>, order: &Order) -> Result<bool, rusqlite::Error> {
    let changed = tx.execute(
        &format!(
            "INSERT INTO orders ({})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(order_id) DO NOTHING",
            ORDER_COLUMNS
        ),
        params![
            &order.order_id,
            &order.customer_name,
            &order.email,
            &order.phone,
            order.total_qty,
            order.subtotal,
            order.vat,
            order.grand_total,
        ],
    )?;
    Ok(changed == 1)
}

fn order_from_row(row: &Row<'_>) -> Result<Order, rusqlite::Error> {
    Ok(Order {
        order_id: row.get(0)?,
        customer_name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        total_qty: row.get(4)?,
        subtotal: row.get(5)?,
        vat: row.get(6)?,
        grand_total: row.get(7)?,
    })
}

fn line_item_from_row(row: &Row<'_>) -> Result<LineItem, rusqlite::Error> {
    Ok(LineItem {
        order_id: row.get(0)?,
        product_id: row.get(1)?,
        title: row.get(2)?,
        quantity: row.get(3)?,
        line_total: row.get(4)?,
    })
}

impl RecordStore for SqliteStore {
    type Error = StoreError;

    fn insert_invoice(&mut self, invoice: &ExtractedInvoice) -> Result<InsertOutcome, Self::Error> {
        let tx = self.write_tx()?;

        if !insert_order_row(&tx, invoice.order())? {
            // Dropping the transaction rolls it back
            debug!(order_id = invoice.order_id(), "Order already present, skipping insert");
            return Ok(InsertOutcome::Duplicate);
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO order_line_items (order_id, product_id, title, product_qty, line_total)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for item in invoice.items() {
                stmt.execute(params![
                    &item.order_id,
                    &item.product_id,
                    &item.title,
                    item.quantity,
                    item.line_total,
                ])?;
            }
        }

        tx.commit()?;
        Ok(InsertOutcome::Inserted)
    }

    fn create_order(&mut self, order: &Order) -> Result<InsertOutcome, Self::Error> {
        let tx = self.write_tx()?;
        if !insert_order_row(&tx, order)? {
            return Ok(InsertOutcome::Duplicate);
        }
        tx.commit()?;
        Ok(InsertOutcome::Inserted)
    }

    fn get_order(&self, order_id: &str) -> Result<Option<Order>, Self::Error> {
        let order = self
            .conn
            .query_row(
                &format!("SELECT {} FROM orders WHERE order_id = ?1", ORDER_COLUMNS),
                params![order_id],
                order_from_row,
            )
            .optional()?;
        Ok(order)
    }

    fn list_orders(&self) -> Result<Vec<Order>, Self::Error> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM orders ORDER BY order_id", ORDER_COLUMNS))?;
        let orders = stmt
            .query_map([], order_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(orders)
    }

    fn list_line_items(&self) -> Result<Vec<LineItem>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT order_id, product_id, title, product_qty, line_total
             FROM order_line_items ORDER BY id",
        )?;
        let items = stmt
            .query_map([], line_item_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    fn update_order(&mut self, order_id: &str, patch: &OrderPatch) -> Result<bool, Self::Error> {
        let tx = self.write_tx()?;

        let existing = tx
            .query_row(
                &format!("SELECT {} FROM orders WHERE order_id = ?1", ORDER_COLUMNS),
                params![order_id],
                order_from_row,
            )
            .optional()?;
        let Some(mut order) = existing else {
            return Ok(false);
        };

        order.apply(patch);
        tx.execute(
            "UPDATE orders SET customer_name = ?2, email = ?3, phone = ?4, total_qty = ?5,
                 subtotal = ?6, vat = ?7, grand_total = ?8
             WHERE order_id = ?1",
            params![
                &order.order_id,
                &order.customer_name,
                &order.email,
                &order.phone,
                order.total_qty,
                order.subtotal,
                order.vat,
                order.grand_total,
            ],
        )?;
        tx.commit()?;
        Ok(true)
    }

    fn delete_order(&mut self, order_id: &str) -> Result<bool, Self::Error> {
        let tx = self.write_tx()?;
        let removed = tx.execute("DELETE FROM orders WHERE order_id = ?1", params![order_id])?;
        if removed == 0 {
            return Ok(false);
        }
        tx.execute(
            "DELETE FROM order_line_items WHERE order_id = ?1",
            params![order_id],
        )?;
        tx.commit()?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice(order_id: &str, quantities: &[u32]) -> ExtractedInvoice {
        let mut order = Order::new(order_id);
        order.customer_name = Some("Jane Doe".to_string());
        order.subtotal = Some(10.0);
        order.vat = Some(0.5);
        order.grand_total = Some(10.5);
        let items = quantities
            .iter()
            .enumerate()
            .map(|(i, q)| LineItem {
                order_id: order_id.to_string(),
                product_id: Some(format!("P{}", i)),
                title: Some(format!("Item {}", i)),
                quantity: *q,
                line_total: *q as f64 * 2.0,
            })
            .collect();
        ExtractedInvoice::new(order, items).unwrap()
    }

    #[test]
    fn test_insert_invoice_writes_order_and_items() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        let outcome = store.insert_invoice(&invoice("A100", &[1, 2])).unwrap();
        assert_eq!(outcome, InsertOutcome::Inserted);

        let order = store.get_order("A100").unwrap().unwrap();
        assert_eq!(order.total_qty, Some(3));
        assert_eq!(order.customer_name.as_deref(), Some("Jane Doe"));
        assert_eq!(store.line_items_for("A100").unwrap().len(), 2);
    }

    #[test]
    fn test_duplicate_invoice_leaves_store_unchanged() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        store.insert_invoice(&invoice("A100", &[1, 2])).unwrap();

        let outcome = store.insert_invoice(&invoice("A100", &[5, 5, 5])).unwrap();
        assert_eq!(outcome, InsertOutcome::Duplicate);
        assert_eq!(store.list_orders().unwrap().len(), 1);
        assert_eq!(store.list_line_items().unwrap().len(), 2);
        assert_eq!(store.get_order("A100").unwrap().unwrap().total_qty, Some(3));
    }

    #[test]
    fn test_update_missing_order() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        let patch = OrderPatch {
            vat: Some(1.0),
            ..Default::default()
        };
        assert!(!store.update_order("nope", &patch).unwrap());
    }

    #[test]
    fn test_update_applies_patch() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        store.insert_invoice(&invoice("A100", &[1])).unwrap();

        let patch = OrderPatch {
            email: Some("jane@example.com".to_string()),
            ..Default::default()
        };
        assert!(store.update_order("A100", &patch).unwrap());

        let order = store.get_order("A100").unwrap().unwrap();
        assert_eq!(order.email.as_deref(), Some("jane@example.com"));
        assert_eq!(order.customer_name.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn test_delete_removes_order_and_items() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        store.insert_invoice(&invoice("A100", &[1, 1])).unwrap();
        store.insert_invoice(&invoice("B200", &[4])).unwrap();

        assert!(store.delete_order("A100").unwrap());
        assert!(!store.delete_order("A100").unwrap());
        assert!(store.get_order("A100").unwrap().is_none());
        assert!(store.line_items_for("A100").unwrap().is_empty());
        assert_eq!(store.list_line_items().unwrap().len(), 1);
    }

    #[test]
    fn test_list_orders_sorted_by_id() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        store.create_order(&Order::new("C")).unwrap();
        store.create_order(&Order::new("A")).unwrap();
        store.create_order(&Order::new("B")).unwrap();

        let ids: Vec<_> = store
            .list_orders()
            .unwrap()
            .into_iter()
            .map(|o| o.order_id)
            .collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
    }
}
