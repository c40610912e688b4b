use bytes::Bytes;
use serde::Deserialize;

/// Query parameters accepted by the extraction endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ExtractParams {
    pub use_tesseract: Option<bool>,
}

/// One uploaded file, owned by the request that carries it.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub size: usize,
    pub content: Bytes,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        let content = content.into();
        Self {
            name: name.into(),
            size: content.len(),
            content,
        }
    }
}

/// Parse a form-field boolean the way HTML forms and curl send them.
pub fn parse_form_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
