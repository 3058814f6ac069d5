//! Document-to-record pipeline

use crate::coordinator::{IngestCoordinator, IngestSummary};
use crate::error::IngestError;
use std::fmt::{self, Display};
use std::path::{Path, PathBuf};
use tally_domain::{CompletionProvider, RecordStore, TextExtractor};
use tally_extractor::Extractor;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// What happened to one document
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome {
    /// Extracted and committed
    Ingested(IngestSummary),
    /// The order id was already stored; nothing was written
    Duplicate {
        /// The existing order id
        order_id: String,
    },
    /// Extraction or the store failed; nothing was written
    Failed {
        /// Human-readable cause
        reason: String,
    },
}

impl DocumentOutcome {
    /// One-line status message for the operator
    pub fn message(&self) -> String {
        match self {
            DocumentOutcome::Ingested(summary) => {
                format!("Order {} processed successfully.", summary.order_id)
            }
            DocumentOutcome::Duplicate { order_id } => {
                format!("Duplicate invoice detected for Order ID: {}", order_id)
            }
            DocumentOutcome::Failed { reason } => {
                format!("Failed to process invoice: {}", reason)
            }
        }
    }

    /// True only when a new order was written
    pub fn is_ingested(&self) -> bool {
        matches!(self, DocumentOutcome::Ingested(_))
    }
}

impl Display for DocumentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Outcome of one document in a batch
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentReport {
    /// The document as given
    pub path: PathBuf,
    /// What happened to it
    pub outcome: DocumentOutcome,
}

/// Extractor plus coordinator: a document goes in, a status comes out
///
/// Documents are processed one at a time, in the order given. A failure on
/// one document never stops the rest of a batch.
pub struct Pipeline<O, L, S>
where
    O: TextExtractor,
    L: CompletionProvider,
    S: RecordStore,
{
    extractor: Extractor<O, L>,
    coordinator: IngestCoordinator<S>,
}

impl<O, L, S> Pipeline<O, L, S>
where
    O: TextExtractor,
    L: CompletionProvider,
    S: RecordStore,
    S::Error: Display,
{
    /// Create a new pipeline
    pub fn new(extractor: Extractor<O, L>, coordinator: IngestCoordinator<S>) -> Self {
        Self {
            extractor,
            coordinator,
        }
    }

    /// The ingestion coordinator
    pub fn coordinator(&self) -> &IngestCoordinator<S> {
        &self.coordinator
    }

    /// Extract and commit one document
    pub async fn process_document(&mut self, path: &Path) -> DocumentOutcome {
        let run_id = Uuid::now_v7();
        let span = info_span!("document", run_id = %run_id, path = %path.display());

        async {
            info!("Processing file: {}", path.display());

            let invoice = match self.extractor.extract(path).await {
                Ok(invoice) => invoice,
                Err(e) => {
                    warn!("Extraction failed: {}", e);
                    return DocumentOutcome::Failed {
                        reason: e.to_string(),
                    };
                }
            };

            match self.coordinator.ingest(invoice) {
                Ok(summary) => DocumentOutcome::Ingested(summary),
                Err(IngestError::DuplicateOrder(order_id)) => DocumentOutcome::Duplicate { order_id },
                Err(e) => {
                    warn!("Ingestion failed: {}", e);
                    DocumentOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Process every document in order
    pub async fn ingest_batch<P: AsRef<Path>>(&mut self, paths: &[P]) -> Vec<DocumentReport> {
        let mut reports = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let outcome = self.process_document(path).await;
            info!("{}: {}", path.display(), outcome);
            reports.push(DocumentReport {
                path: path.to_path_buf(),
                outcome,
            });
        }

        let ingested = reports.iter().filter(|r| r.outcome.is_ingested()).count();
        info!("Batch complete: {} of {} documents ingested", ingested, reports.len());
        reports
    }
}
