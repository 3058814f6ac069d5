//! Trait definitions for external collaborators
//!
//! These traits define the boundaries between the pipeline and the services it
//! drives. Implementations live in other crates.

use crate::{ExtractedInvoice, LineItem, Order, OrderPatch};
use std::fmt::Display;
use std::future::Future;
use std::path::Path;

/// Language model inference service
///
/// Implemented by the infrastructure layer (tally-llm). The returned text is
/// untrusted: nothing about its format is guaranteed.
pub trait CompletionProvider {
    /// Error type for completion calls
    type Error: Display;

    /// Name of the model prompts are sent to
    fn model_name(&self) -> &str;

    /// Complete a single prompt, without streaming
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String, Self::Error>> + Send;
}

/// Document-to-text service (OCR)
///
/// Implemented by tally-extractor. Extraction never fails: unreadable or empty
/// documents produce an empty string, and callers decide what that means.
pub trait TextExtractor {
    /// Extract raw text from the document at `path`
    fn extract_text(&self, path: &Path) -> impl Future<Output = String> + Send;
}

/// Result of a conditional insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The record was written
    Inserted,
    /// A record with the same order id already existed; nothing was written
    Duplicate,
}

/// Persistent storage for orders and line items
///
/// Implemented by the infrastructure layer (tally-store).
pub trait RecordStore {
    /// Error type for store operations
    type Error;

    /// Atomically insert an order and all of its line items, unless an order
    /// with the same id already exists
    fn insert_invoice(&mut self, invoice: &ExtractedInvoice) -> Result<InsertOutcome, Self::Error>;

    /// Insert a bare order, unless one with the same id already exists
    fn create_order(&mut self, order: &Order) -> Result<InsertOutcome, Self::Error>;

    /// Get an order by id
    fn get_order(&self, order_id: &str) -> Result<Option<Order>, Self::Error>;

    /// All orders, ordered by id
    fn list_orders(&self) -> Result<Vec<Order>, Self::Error>;

    /// All line items, in insertion order
    fn list_line_items(&self) -> Result<Vec<LineItem>, Self::Error>;

    /// Apply a partial update; returns false if the order does not exist
    fn update_order(&mut self, order_id: &str, patch: &OrderPatch) -> Result<bool, Self::Error>;

    /// Delete an order and its line items; returns false if the order does not exist
    fn delete_order(&mut self, order_id: &str) -> Result<bool, Self::Error>;
}
