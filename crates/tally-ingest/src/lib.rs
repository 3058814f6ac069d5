//! Tally Ingestion
//!
//! The write path: a document is extracted into an
//! [`ExtractedInvoice`](tally_domain::ExtractedInvoice), committed to the
//! record store unless its order id is already present, and the CSV export is
//! regenerated.
//!
//! - [`IngestCoordinator`] owns the store and the dedup-then-write transaction
//! - [`Pipeline`] drives the extractor and the coordinator for one document or
//!   a sequential batch, turning every failure into a [`DocumentOutcome`]

#![warn(missing_docs)]

mod coordinator;
mod error;
mod pipeline;

pub use coordinator::{IngestCoordinator, IngestSummary};
pub use error::IngestError;
pub use pipeline::{DocumentOutcome, DocumentReport, Pipeline};
