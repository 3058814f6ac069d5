//! Error types for ingestion

use thiserror::Error;

/// Errors that can occur while committing an invoice
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IngestError {
    /// An order with this id is already stored; nothing was written
    #[error("Duplicate invoice detected for Order ID: {0}")]
    DuplicateOrder(String),

    /// The store failed; the transaction was rolled back
    #[error("Store error: {0}")]
    Store(String),
}
