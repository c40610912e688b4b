use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use lopdf::Document;

use crate::error::{ExtractionError, ExtractionResultExt};

const FORMAT: &str = "PDF";

/// Text-layer extraction for PDF documents. Scanned PDFs are rejected, not OCR'd.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfProcessor;

impl PdfProcessor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, content: &[u8]) -> Result<String, ExtractionError> {
        let start = Instant::now();
        tracing::info!("Starting PDF text extraction ({} bytes)", content.len());

        let pages = match Self::pages_with_pdf_extract(content) {
            Ok(pages) => pages,
            Err(reason) => {
                tracing::warn!("pdf-extract failed: {}, falling back to lopdf", reason);
                Self::pages_with_lopdf(content)?
            }
        };

        let text = join_pages(&pages);
        if text.is_empty() {
            return Err(ExtractionError::decode(
                FORMAT,
                "No text found in PDF, it might be scanned or image-based",
            ));
        }

        tracing::info!(
            pages = pages.len(),
            characters = text.len(),
            processing_time_ms = start.elapsed().as_millis() as u64,
            "PDF text extraction completed"
        );
        Ok(text)
    }

    fn pages_with_pdf_extract(content: &[u8]) -> Result<Vec<String>, String> {
        // pdf-extract panics on some malformed font tables
        match panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(content)
        })) {
            Ok(Ok(pages)) => Ok(pages),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err("pdf-extract panicked while reading the document".to_string()),
        }
    }

    fn pages_with_lopdf(content: &[u8]) -> Result<Vec<String>, ExtractionError> {
        let doc = Document::load_mem(content).decode_err(FORMAT)?;

        let mut pages = Vec::new();
        for page_number in doc.get_pages().keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(text) => pages.push(text),
                Err(e) => {
                    tracing::debug!("Could not extract text from page {}: {}", page_number, e);
                }
            }
        }
        Ok(pages)
    }
}

/// Pages in document order, newline separated; pages without text are skipped.
fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .map(|page| page.trim())
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
