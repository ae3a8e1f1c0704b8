//! Text sources for uploaded papers.

use crate::error::CliError;
use dimex_domain::traits::TextSource;
use tracing::debug;

const PDF_MAGIC: &[u8] = b"%PDF";

/// Decodes bytes as UTF-8, replacing invalid sequences.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextSource;

impl TextSource for PlainTextSource {
    type Error = CliError;

    fn extract_text(&self, bytes: &[u8]) -> Result<String, Self::Error> {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// Extracts the text layer of a PDF.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextSource;

impl TextSource for PdfTextSource {
    type Error = CliError;

    fn extract_text(&self, bytes: &[u8]) -> Result<String, Self::Error> {
        pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| CliError::TextSource(format!("PDF extraction failed: {}", e)))
    }
}

/// Picks the PDF source for bytes starting with `%PDF`, plain text otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoTextSource;

impl TextSource for AutoTextSource {
    type Error = CliError;

    fn extract_text(&self, bytes: &[u8]) -> Result<String, Self::Error> {
        if bytes.starts_with(PDF_MAGIC) {
            debug!(len = bytes.len(), "Extracting PDF text");
            PdfTextSource.extract_text(bytes)
        } else {
            PlainTextSource.extract_text(bytes)
        }
    }
}
