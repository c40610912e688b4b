use thiserror::Error;

/// Failures raised while turning uploaded bytes into text.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("{format} extraction failed: {reason}")]
    Decode { format: &'static str, reason: String },

    #[error("OCR failed: {0}")]
    Ocr(String),
}

impl ExtractionError {
    pub fn decode(format: &'static str, reason: impl Into<String>) -> Self {
        ExtractionError::Decode {
            format,
            reason: reason.into(),
        }
    }

    pub fn ocr(reason: impl Into<String>) -> Self {
        ExtractionError::Ocr(reason.into())
    }
}

/// Attach a format label to foreign errors raised inside an extractor.
pub trait ExtractionResultExt<T> {
    fn decode_err(self, format: &'static str) -> Result<T, ExtractionError>;
}

impl<T, E: std::fmt::Display> ExtractionResultExt<T> for Result<T, E> {
    fn decode_err(self, format: &'static str) -> Result<T, ExtractionError> {
        self.map_err(|e| ExtractionError::decode(format, e.to_string()))
    }
}

/// Reasons the neural OCR model could not be brought up. Only ever logged.
#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("Neural OCR disabled by configuration")]
    Disabled,

    #[error("Failed to download {file}: {message}")]
    Download { file: String, message: String },

    #[error("Failed to initialize ONNX session for {file}: {message}")]
    Session { file: String, message: String },

    #[error("Failed to load tokenizer: {0}")]
    Tokenizer(String),

    #[error("Model cache error: {0}")]
    Cache(#[from] std::io::Error),
}
