//! Text extraction providers
//!
//! [`TesseractExtractor`] shells out to the poppler and tesseract command line
//! tools, [`PlainTextExtractor`] reads text files as-is, and [`AutoExtractor`]
//! picks one by file extension. None of them fail: problems are logged and
//! produce an empty string, which the [`Extractor`](crate::Extractor) reports
//! as an OCR failure.

use anyhow::{bail, Context};
use std::path::{Path, PathBuf};
use tally_domain::TextExtractor;
use tokio::process::Command;
use tracing::{debug, warn};

/// OCR through the `tesseract` binary
///
/// PDFs are first rasterized page by page with `pdftoppm`; the text of every
/// page is joined with newlines. Other files are handed to tesseract directly.
#[derive(Debug, Clone)]
pub struct TesseractExtractor {
    tesseract_bin: PathBuf,
    pdftoppm_bin: PathBuf,
    language: Option<String>,
    dpi: u32,
}

impl Default for TesseractExtractor {
    fn default() -> Self {
        Self {
            tesseract_bin: PathBuf::from("tesseract"),
            pdftoppm_bin: PathBuf::from("pdftoppm"),
            language: None,
            dpi: 300,
        }
    }
}

impl TesseractExtractor {
    /// Use binaries found on `PATH`
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tesseract binary location
    pub fn with_tesseract_bin(mut self, bin: impl Into<PathBuf>) -> Self {
        self.tesseract_bin = bin.into();
        self
    }

    /// Override the pdftoppm binary location
    pub fn with_pdftoppm_bin(mut self, bin: impl Into<PathBuf>) -> Self {
        self.pdftoppm_bin = bin.into();
        self
    }

    /// Tesseract language pack, e.g. `eng` or `eng+deu`
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Rasterization resolution for PDF pages
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    async fn try_extract(&self, path: &Path) -> anyhow::Result<String> {
        if !path.is_file() {
            bail!("{} is not a readable file", path.display());
        }

        if has_extension(path, &["pdf"]) {
            self.extract_pdf(path).await
        } else {
            self.ocr_image(path).await
        }
    }

    async fn extract_pdf(&self, path: &Path) -> anyhow::Result<String> {
        let pages_dir = tempfile::tempdir().context("creating page directory")?;
        let prefix = pages_dir.path().join("page");

        let output = Command::new(&self.pdftoppm_bin)
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-png")
            .arg(path)
            .arg(&prefix)
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("running {}", self.pdftoppm_bin.display()))?;
        if !output.status.success() {
            bail!(
                "pdftoppm exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        // pdftoppm zero-pads page numbers, so name order is page order
        let mut pages: Vec<PathBuf> = std::fs::read_dir(pages_dir.path())
            .context("listing rasterized pages")?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| has_extension(p, &["png"]))
            .collect();
        pages.sort();
        debug!("Rasterized {} into {} pages", path.display(), pages.len());

        let mut text = String::new();
        for page in &pages {
            let page_text = self.ocr_image(page).await?;
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&page_text);
        }
        Ok(text)
    }

    async fn ocr_image(&self, path: &Path) -> anyhow::Result<String> {
        let mut command = Command::new(&self.tesseract_bin);
        command.arg(path).arg("stdout");
        if let Some(language) = &self.language {
            command.arg("-l").arg(language);
        }

        let output = command
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("running {}", self.tesseract_bin.display()))?;
        if !output.status.success() {
            bail!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl TextExtractor for TesseractExtractor {
    async fn extract_text(&self, path: &Path) -> String {
        match self.try_extract(path).await {
            Ok(text) => text,
            Err(e) => {
                warn!("OCR failed for {}: {:#}", path.display(), e);
                String::new()
            }
        }
    }
}

/// Reads documents that are already text
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    async fn extract_text(&self, path: &Path) -> String {
        match tokio::fs::read(path).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).trim().to_string(),
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                String::new()
            }
        }
    }
}

/// Chooses a provider by file extension
///
/// `.txt` and `.text` files are read directly; everything else goes to OCR.
#[derive(Debug, Clone, Default)]
pub struct AutoExtractor {
    ocr: TesseractExtractor,
    plain: PlainTextExtractor,
}

impl AutoExtractor {
    /// Wrap a configured OCR provider
    pub fn new(ocr: TesseractExtractor) -> Self {
        Self {
            ocr,
            plain: PlainTextExtractor,
        }
    }
}

impl TextExtractor for AutoExtractor {
    async fn extract_text(&self, path: &Path) -> String {
        if has_extension(path, &["txt", "text"]) {
            self.plain.extract_text(path).await
        } else {
            self.ocr.extract_text(path).await
        }
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}
