//! Textract file-to-text extraction service
//!
//! Detects the type of an uploaded document and extracts its text: PDF and
//! DOCX text layers, plain text in several encodings, and images through a
//! neural OCR model with Tesseract as the fallback engine.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult, ExtractionError};
pub use handlers::{create_router, AppState};
