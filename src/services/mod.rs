pub mod docx_processor;
pub mod extraction_service;
pub mod file_detector;
pub mod image_processor;
pub mod model_service;
pub mod ocr_service;
pub mod pdf_processor;
pub mod text_processor;
pub mod trocr;

pub use docx_processor::DocxProcessor;
pub use extraction_service::{ExtractionService, ExtractorKind};
pub use file_detector::FileDetector;
pub use image_processor::{ImageProcessor, OcrOutput, OcrPath};
pub use model_service::ModelService;
pub use ocr_service::{OcrEngine, TesseractEngine};
pub use pdf_processor::PdfProcessor;
pub use text_processor::{TextEncoding, TextProcessor};
pub use trocr::TrOcrModel;
