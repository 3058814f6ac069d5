//! Tally Domain Layer
//!
//! This crate contains the entities and collaborator interfaces shared by every
//! other Tally crate. It depends only on `serde`, because orders cross both the
//! HTTP boundary (the Record API) and the CSV export boundary.
//!
//! ## Key Concepts
//!
//! - **Order**: one invoice, keyed by an externally assigned `order_id`
//! - **LineItem**: one row of an invoice, owned by exactly one order
//! - **ExtractedInvoice**: an order plus its line items, produced by the
//!   extractor and consumed by the ingestion coordinator
//! - **Collaborators**: the completion provider, the text extraction provider
//!   and the record store, all expressed as traits
//!
//! ## Architecture
//!
//! - Pure data and trait definitions only
//! - Infrastructure implementations live in other crates
//!   (`tally-llm`, `tally-extractor`, `tally-store`)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod invoice;
pub mod order;
pub mod traits;

// Re-exports for convenience
pub use invoice::ExtractedInvoice;
pub use order::{LineItem, Order, OrderPatch};
pub use traits::{CompletionProvider, InsertOutcome, RecordStore, TextExtractor};
