use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::error::ExtractionError;
use crate::models::{ExtractionResult, UploadedFile};
use crate::services::docx_processor::DocxProcessor;
use crate::services::file_detector::{FileDetector, DOCX_MIME, DOC_MIME};
use crate::services::image_processor::ImageProcessor;
use crate::services::model_service::ModelService;
use crate::services::ocr_service::OcrEngine;
use crate::services::pdf_processor::PdfProcessor;
use crate::services::text_processor::TextProcessor;

pub const PDF_METHOD: &str = "PDF extraction";
pub const DOCX_METHOD: &str = "DOCX extraction";
pub const TEXT_METHOD: &str = "Text file reading";

/// The closed set of extractors, keyed by MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorKind {
    Pdf,
    Docx,
    Text,
    Image,
}

impl ExtractorKind {
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        match mime_type {
            "application/pdf" => Some(ExtractorKind::Pdf),
            DOCX_MIME | DOC_MIME => Some(ExtractorKind::Docx),
            m if m.starts_with("text/") => Some(ExtractorKind::Text),
            m if m.starts_with("image/") => Some(ExtractorKind::Image),
            _ => None,
        }
    }
}

pub struct ExtractionService {
    detector: FileDetector,
    pdf: PdfProcessor,
    docx: DocxProcessor,
    text: TextProcessor,
    image: ImageProcessor,
    models: Arc<ModelService>,
}

impl ExtractionService {
    pub fn new(models: Arc<ModelService>, conventional_ocr: Arc<dyn OcrEngine>) -> Self {
        Self {
            detector: FileDetector::new(),
            pdf: PdfProcessor::new(),
            docx: DocxProcessor::new(),
            text: TextProcessor::new(),
            image: ImageProcessor::new(models.clone(), conventional_ocr),
            models,
        }
    }

    pub fn models(&self) -> &ModelService {
        &self.models
    }

    pub fn detect_mime_type(&self, file: &UploadedFile) -> String {
        self.detector.detect_mime_type(&file.content, &file.name)
    }

    /// Route bytes to the extractor for `mime_type` and build the result record.
    pub fn extract(
        &self,
        content: &[u8],
        mime_type: &str,
        filename: &str,
        force_conventional_ocr: bool,
    ) -> Result<ExtractionResult, ExtractionError> {
        let start = Instant::now();

        let outcome = match ExtractorKind::from_mime(mime_type) {
            Some(ExtractorKind::Pdf) => self.pdf.extract(content).map(|text| (text, PDF_METHOD)),
            Some(ExtractorKind::Docx) => self.docx.extract(content).map(|text| (text, DOCX_METHOD)),
            Some(ExtractorKind::Text) => self.text.extract(content).map(|text| (text, TEXT_METHOD)),
            Some(ExtractorKind::Image) => self
                .image
                .extract(content, force_conventional_ocr)
                .map(|output| (output.text, output.method)),
            None => Err(ExtractionError::UnsupportedType(mime_type.to_string())),
        };

        match outcome {
            Ok((text, method)) => {
                let result = ExtractionResult::success(filename, mime_type, method, text);
                info!(
                    filename = filename,
                    mime_type = mime_type,
                    extraction_method = method,
                    character_count = result.character_count,
                    word_count = result.word_count,
                    processing_time_ms = start.elapsed().as_millis() as u64,
                    "Extraction completed"
                );
                Ok(result)
            }
            Err(e) => {
                error!(filename = filename, mime_type = mime_type, error = %e, "Extraction failed");
                Err(e)
            }
        }
    }

    /// Detect the upload's type, then extract.
    pub fn extract_file(
        &self,
        file: &UploadedFile,
        force_conventional_ocr: bool,
    ) -> Result<ExtractionResult, ExtractionError> {
        let mime_type = self.detect_mime_type(file);
        info!(filename = %file.name, mime_type = %mime_type, "Processing file");
        self.extract(&file.content, &mime_type, &file.name, force_conventional_ocr)
    }
}
