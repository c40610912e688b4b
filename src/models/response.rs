use serde::{Deserialize, Serialize};

/// Outcome of extracting a single file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractionResult {
    pub success: bool,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub character_count: usize,
    #[serde(default)]
    pub word_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionResult {
    pub fn success(
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        extraction_method: impl Into<String>,
        text: String,
    ) -> Self {
        Self {
            success: true,
            filename: filename.into(),
            mime_type: Some(mime_type.into()),
            extraction_method: Some(extraction_method.into()),
            character_count: text.chars().count(),
            word_count: text.split_whitespace().count(),
            text: Some(text),
            error: None,
        }
    }

    pub fn failure(filename: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            filename: filename.into(),
            mime_type: None,
            extraction_method: None,
            text: None,
            character_count: 0,
            word_count: 0,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResponse {
    pub results: Vec<ExtractionResult>,
    pub total: usize,
}

impl BatchResponse {
    pub fn new(results: Vec<ExtractionResult>) -> Self {
        let total = results.len();
        Self { results, total }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
    pub status: String,
    pub version: String,
    pub supported_formats: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub models_loaded: bool,
    pub ocr_model: String,
    pub conventional_ocr_available: bool,
    pub settings: HealthSettings,
    pub rate_limiting: RateLimitStats,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthSettings {
    pub max_file_size: usize,
    pub max_batch_size: usize,
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitStats {
    pub total_requests: u64,
    pub rejected_requests: u64,
    pub available_permits: usize,
}
