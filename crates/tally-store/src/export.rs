//! Flat CSV export of the order and line item tables
//!
//! Both files are regenerated in full on every export. Each file is written to
//! a sibling `.tmp` path and renamed into place, so a reader never observes a
//! half-written export.

use csv::{ReaderBuilder, WriterBuilder};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tally_domain::{LineItem, Order, RecordStore};
use thiserror::Error;
use tracing::info;

/// File name of the order export
pub const ORDERS_FILE: &str = "orders.csv";

/// File name of the line item export
pub const LINE_ITEMS_FILE: &str = "order_line_items.csv";

const ORDER_HEADER: [&str; 8] = [
    "order_id",
    "customer_name",
    "email",
    "phone",
    "total_qty",
    "subtotal",
    "vat",
    "grand_total",
];

const LINE_ITEM_HEADER: [&str; 5] = ["order_id", "product_id", "title", "quantity", "line_total"];

/// Errors that can occur while exporting or reloading
#[derive(Error, Debug)]
pub enum ExportError {
    /// Reading the tables failed
    #[error("Store error: {0}")]
    Store(String),

    /// CSV encoding or decoding failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// What an export wrote
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    /// Path of the order file
    pub orders_path: PathBuf,
    /// Path of the line item file
    pub line_items_path: PathBuf,
    /// Rows written to the order file
    pub orders: usize,
    /// Rows written to the line item file
    pub line_items: usize,
}

/// Export the full contents of both tables into `dir`
///
/// The directory is created if it does not exist. Empty tables still produce a
/// file containing only the header row.
pub fn export_tables<S>(store: &S, dir: &Path) -> Result<ExportSummary, ExportError>
where
    S: RecordStore,
    S::Error: std::fmt::Display,
{
    let orders = store
        .list_orders()
        .map_err(|e| ExportError::Store(e.to_string()))?;
    let line_items = store
        .list_line_items()
        .map_err(|e| ExportError::Store(e.to_string()))?;

    fs::create_dir_all(dir)?;
    let orders_path = dir.join(ORDERS_FILE);
    let line_items_path = dir.join(LINE_ITEMS_FILE);

    write_rows(&orders_path, &ORDER_HEADER, &orders)?;
    write_rows(&line_items_path, &LINE_ITEM_HEADER, &line_items)?;

    info!(
        "Exported {} orders to {} and {} line items to {}",
        orders.len(),
        orders_path.display(),
        line_items.len(),
        line_items_path.display()
    );

    Ok(ExportSummary {
        orders_path,
        line_items_path,
        orders: orders.len(),
        line_items: line_items.len(),
    })
}

fn write_rows<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<(), ExportError> {
    let tmp_path = path.with_extension("csv.tmp");
    {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_path(&tmp_path)?;
        writer.write_record(header)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Reload an order export
pub fn load_orders(path: &Path) -> Result<Vec<Order>, ExportError> {
    load_rows(path)
}

/// Reload a line item export
pub fn load_line_items(path: &Path) -> Result<Vec<LineItem>, ExportError> {
    load_rows(path)
}

fn load_rows<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, ExportError> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let rows = reader.deserialize().collect::<Result<Vec<T>, _>>()?;
    Ok(rows)
}
