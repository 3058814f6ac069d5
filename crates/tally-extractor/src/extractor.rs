//! Core Extractor implementation

use crate::config::ExtractorConfig;
use crate::error::ExtractionError;
use crate::parser::parse_invoice_response;
use crate::prompt::PromptBuilder;
use std::path::Path;
use tally_domain::{CompletionProvider, ExtractedInvoice, TextExtractor};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// The Extractor turns a scanned document into a validated invoice
///
/// It has no side effects beyond its two collaborator calls: nothing is
/// persisted and no network call is made other than the completion.
pub struct Extractor<O, L>
where
    O: TextExtractor,
    L: CompletionProvider,
{
    ocr: O,
    llm: L,
    config: ExtractorConfig,
}

impl<O, L> Extractor<O, L>
where
    O: TextExtractor,
    L: CompletionProvider,
{
    /// Create a new Extractor
    pub fn new(ocr: O, llm: L, config: ExtractorConfig) -> Self {
        Self { ocr, llm, config }
    }

    /// The completion provider in use
    pub fn llm(&self) -> &L {
        &self.llm
    }

    /// Active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract an invoice from the document at `path`
    pub async fn extract(&self, path: &Path) -> Result<ExtractedInvoice, ExtractionError> {
        info!("Starting extraction for {}", path.display());

        let text = timeout(self.config.ocr_timeout(), self.ocr.extract_text(path))
            .await
            .map_err(|_| ExtractionError::Timeout("OCR", self.config.ocr_timeout_secs))?;

        if text.trim().is_empty() {
            warn!("No text extracted from {}", path.display());
            return Err(ExtractionError::OcrFailure(path.display().to_string()));
        }

        debug!("OCR produced {} chars for {}", text.len(), path.display());
        self.extract_from_text(&text).await
    }

    /// Extract an invoice from text that has already been OCR'd
    pub async fn extract_from_text(&self, text: &str) -> Result<ExtractedInvoice, ExtractionError> {
        let length = text.chars().count();
        if length > self.config.max_text_length {
            return Err(ExtractionError::TextTooLong(
                length,
                self.config.max_text_length,
            ));
        }

        let prompt = PromptBuilder::new(text).build();
        debug!("Prompt length: {} chars", prompt.len());

        let response = timeout(self.config.completion_timeout(), self.llm.complete(&prompt))
            .await
            .map_err(|_| {
                ExtractionError::Timeout("Completion", self.config.completion_timeout_secs)
            })?
            .map_err(|e| ExtractionError::Completion(e.to_string()))?;

        debug!(
            "{} response length: {} chars",
            self.llm.model_name(),
            response.len()
        );

        match parse_invoice_response(&response) {
            Ok(invoice) => {
                info!(
                    "Extracted order {} with {} items (total_qty {})",
                    invoice.order_id(),
                    invoice.items().len(),
                    invoice.total_qty()
                );
                Ok(invoice)
            }
            Err(e) => {
                warn!("{}; raw output: {}", e, response);
                Err(e)
            }
        }
    }
}
