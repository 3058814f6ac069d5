//! Error types for the Extractor

use thiserror::Error;

/// Errors that can occur during extraction
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The extraction provider returned no usable text
    #[error("OCR produced no usable text for {0}")]
    OcrFailure(String),

    /// The completion could not be read as an invoice record
    ///
    /// `raw` keeps the full completion for diagnostics.
    #[error("Malformed model response: {reason}")]
    MalformedResponse {
        /// What was wrong with the response
        reason: String,
        /// The completion exactly as received
        raw: String,
    },

    /// A collaborator did not answer in time
    #[error("{0} timed out after {1}s")]
    Timeout(&'static str, u64),

    /// Completion provider error
    #[error("Completion error: {0}")]
    Completion(String),

    /// Document text exceeds the configured maximum
    #[error("Text too long: {0} chars (max: {1})")]
    TextTooLong(usize, usize),
}

impl ExtractionError {
    /// Raw completion text, for errors that carry one
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            ExtractionError::MalformedResponse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}
