use std::path::Path;
use std::process::Command;
use std::time::Instant;
use image::{ImageFormat, RgbImage};
use tempfile::Builder;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ExtractionError;

pub const TESSERACT_METHOD: &str = "Tesseract OCR";
pub const TROCR_METHOD: &str = "TrOCR";

/// Anything that can read text off a decoded image.
///
/// Implementations are shared across requests, so `recognize` takes `&self`.
pub trait OcrEngine: Send + Sync {
    /// Label recorded as the extraction method.
    fn name(&self) -> &'static str;

    fn recognize(&self, image: &RgbImage) -> Result<String, ExtractionError>;
}

/// Conventional OCR through the tesseract command-line tool.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    command: String,
    language: String,
}

impl TesseractEngine {
    pub fn new(command: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            language: language.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.tesseract_cmd.clone(), config.tesseract_lang.clone())
    }

    pub fn is_available(&self) -> bool {
        Command::new(&self.command)
            .arg("--version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn run_tesseract(&self, image_path: &Path) -> Result<String, ExtractionError> {
        let output = Command::new(&self.command)
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.language])
            .output();

        match output {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(ExtractionError::ocr(format!("tesseract failed: {}", stderr.trim())))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ExtractionError::ocr(
                format!("tesseract not found at {}", self.command),
            )),
            Err(e) => Err(ExtractionError::ocr(format!("failed to run tesseract: {}", e))),
        }
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        TESSERACT_METHOD
    }

    fn recognize(&self, image: &RgbImage) -> Result<String, ExtractionError> {
        let start = Instant::now();

        let temp_file = Builder::new()
            .suffix(".png")
            .tempfile()
            .map_err(|e| ExtractionError::ocr(format!("failed to create temporary file: {}", e)))?;
        image
            .save_with_format(temp_file.path(), ImageFormat::Png)
            .map_err(|e| ExtractionError::ocr(format!("failed to write temporary image: {}", e)))?;

        debug!(width = image.width(), height = image.height(), "Running tesseract");
        let raw = self.run_tesseract(temp_file.path())?;

        let text = join_detected_lines(&raw);
        if text.is_empty() {
            warn!("Tesseract found no text in image");
        }
        info!(
            characters = text.len(),
            processing_time_ms = start.elapsed().as_millis() as u64,
            "Tesseract OCR completed"
        );
        Ok(text)
    }
}

/// Detected lines in reading order, newline-joined, blank lines dropped.
pub fn join_detected_lines(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
