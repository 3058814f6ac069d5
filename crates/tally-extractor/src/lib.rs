//! Tally Extractor
//!
//! Turns a scanned invoice into a validated [`ExtractedInvoice`].
//!
//! # Architecture
//!
//! ```text
//! Document → TextExtractor (OCR) → prompt → CompletionProvider → parser → ExtractedInvoice
//! ```
//!
//! The completion is untrusted text. It is stripped of code fences, parsed as
//! JSON and checked field by field; `total_qty` is always derived from the
//! line items. Both collaborator calls run under their own timeout.
//!
//! # Example Usage
//!
//! ```
//! use tally_extractor::{Extractor, ExtractorConfig, PlainTextExtractor};
//! use tally_llm::MockProvider;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = MockProvider::new(r#"{
//!     "order_id": "A100",
//!     "items": [{"title": "Widget", "quantity": 2, "line_total": 10.0}],
//!     "subtotal": 10.0, "vat": 0.5, "grand_total": 10.5
//! }"#);
//! let extractor = Extractor::new(PlainTextExtractor, llm, ExtractorConfig::default());
//!
//! let invoice = extractor.extract_from_text("Order A100 ...").await?;
//! assert_eq!(invoice.total_qty(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! [`ExtractedInvoice`]: tally_domain::ExtractedInvoice

#![warn(missing_docs)]

mod config;
mod error;
mod extractor;
mod ocr;
mod parser;
mod prompt;


pub use config::ExtractorConfig;
pub use error::ExtractionError;
pub use extractor::Extractor;
pub use ocr::{AutoExtractor, PlainTextExtractor, TesseractExtractor};
pub use parser::parse_invoice_response;
pub use prompt::PromptBuilder;
