//! Deduplicated commit of extracted invoices

use crate::error::IngestError;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tally_domain::{ExtractedInvoice, InsertOutcome, RecordStore};
use tally_store::{export_tables, ExportSummary};
use tracing::{error, info, info_span};

/// What a successful ingestion wrote
#[derive(Debug, Clone, PartialEq)]
pub struct IngestSummary {
    /// The committed order
    pub order_id: String,
    /// Number of line items written with it
    pub line_items: usize,
    /// Derived total quantity
    pub total_qty: u32,
    /// The export regenerated after the commit, if one was configured and succeeded
    pub export: Option<ExportSummary>,
}

/// Owns the write path into the record store
///
/// Each call to [`ingest`](Self::ingest) is one transaction: the order and its
/// line items are written together or not at all. After a commit the CSV
/// export is regenerated on a best-effort basis.
pub struct IngestCoordinator<S: RecordStore> {
    store: S,
    export_dir: Option<PathBuf>,
}

impl<S> IngestCoordinator<S>
where
    S: RecordStore,
    S::Error: Display,
{
    /// Create a coordinator that does not export
    pub fn new(store: S) -> Self {
        Self {
            store,
            export_dir: None,
        }
    }

    /// Regenerate the CSV export in `dir` after every commit
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = Some(dir.into());
        self
    }

    /// Export directory, if configured
    pub fn export_dir(&self) -> Option<&Path> {
        self.export_dir.as_deref()
    }

    /// Shared access to the store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the coordinator, returning the store
    pub fn into_store(self) -> S {
        self.store
    }

    /// Commit an invoice unless its order id is already stored
    ///
    /// A duplicate is reported as [`IngestError::DuplicateOrder`] and leaves
    /// the store untouched. Export failures are logged and never undo the
    /// commit.
    pub fn ingest(&mut self, invoice: ExtractedInvoice) -> Result<IngestSummary, IngestError> {
        let order_id = invoice.order_id().to_string();
        let _span = info_span!("ingest", order_id = %order_id).entered();

        let outcome = self
            .store
            .insert_invoice(&invoice)
            .map_err(|e| IngestError::Store(e.to_string()))?;

        if outcome == InsertOutcome::Duplicate {
            info!("Order {} already exists, skipping", order_id);
            return Err(IngestError::DuplicateOrder(order_id));
        }

        info!(
            "Order {} committed with {} line items",
            order_id,
            invoice.items().len()
        );

        let export = self.export_dir.as_deref().and_then(|dir| {
            match export_tables(&self.store, dir) {
                Ok(summary) => {
                    info!(
                        "Exported {} orders and {} line items to {}",
                        summary.orders,
                        summary.line_items,
                        dir.display()
                    );
                    Some(summary)
                }
                Err(e) => {
                    error!("Failed to export tables to {}: {}", dir.display(), e);
                    None
                }
            }
        });

        Ok(IngestSummary {
            order_id,
            line_items: invoice.items().len(),
            total_qty: invoice.total_qty(),
            export,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_domain::{LineItem, Order};
    use tally_store::SqliteStore;
    use tempfile::TempDir;

    fn invoice(order_id: &str, quantities: &[u32]) -> ExtractedInvoice {
        let items = quantities
            .iter()
            .enumerate()
            .map(|(i, q)| LineItem {
                order_id: String::new(),
                product_id: Some(format!("P{}", i)),
                title: Some(format!("Item {}", i)),
                quantity: *q,
                line_total: *q as f64 * 2.0,
            })
            .collect();
        ExtractedInvoice::new(Order::new(order_id), items).unwrap()
    }

    fn coordinator() -> IngestCoordinator<SqliteStore> {
        IngestCoordinator::new(SqliteStore::new(":memory:").unwrap())
    }

    #[test]
    fn test_fresh_order_is_committed() {
        let mut coordinator = coordinator();
        let summary = coordinator.ingest(invoice("A100", &[1, 2])).unwrap();

        assert_eq!(summary.order_id, "A100");
        assert_eq!(summary.line_items, 2);
        assert_eq!(summary.total_qty, 3);
        assert!(summary.export.is_none());

        let stored = coordinator.store().get_order("A100").unwrap().unwrap();
        assert_eq!(stored.total_qty, Some(3));
        assert_eq!(coordinator.store().list_line_items().unwrap().len(), 2);
    }

    #[test]
    fn test_duplicate_leaves_store_unchanged() {
        let mut coordinator = coordinator();
        coordinator.ingest(invoice("A100", &[1, 2])).unwrap();

        let result = coordinator.ingest(invoice("A100", &[5]));
        assert_eq!(result, Err(IngestError::DuplicateOrder("A100".to_string())));

        let stored = coordinator.store().get_order("A100").unwrap().unwrap();
        assert_eq!(stored.total_qty, Some(3));
        assert_eq!(coordinator.store().list_line_items().unwrap().len(), 2);
    }

    #[test]
    fn test_commit_regenerates_export() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = coordinator().with_export_dir(dir.path());

        coordinator.ingest(invoice("A1", &[1])).unwrap();
        let summary = coordinator.ingest(invoice("A2", &[1, 1])).unwrap();

        let export = summary.export.unwrap();
        assert_eq!(export.orders, 2);
        assert_eq!(export.line_items, 3);
        assert!(export.orders_path.exists());
    }

    #[test]
    fn test_export_failure_does_not_undo_commit() {
        let dir = TempDir::new().unwrap();
        // A regular file where the export directory should be
        let blocked = dir.path().join("exports");
        std::fs::write(&blocked, "not a directory").unwrap();
        let mut coordinator = coordinator().with_export_dir(&blocked);

        let summary = coordinator.ingest(invoice("A100", &[1])).unwrap();
        assert!(summary.export.is_none());
        assert!(coordinator.store().get_order("A100").unwrap().is_some());
    }
}
