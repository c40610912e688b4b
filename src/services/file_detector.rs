use std::collections::HashMap;
use once_cell::sync::Lazy;
use tracing::{debug, info};

pub const OCTET_STREAM: &str = "application/octet-stream";
pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const DOC_MIME: &str = "application/msword";
pub const TEXT_PLAIN: &str = "text/plain";

const CONTAINER_MIMES: &[&str] = &["application/zip", "application/x-ole-storage"];

static EXTENSION_MIME_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("pdf", "application/pdf"),
        ("docx", DOCX_MIME),
        ("doc", DOC_MIME),
        ("txt", TEXT_PLAIN),
        ("png", "image/png"),
        ("jpg", "image/jpeg"),
        ("jpeg", "image/jpeg"),
        ("tiff", "image/tiff"),
        ("tif", "image/tiff"),
        ("bmp", "image/bmp"),
        ("gif", "image/gif"),
    ])
});

/// Classifies uploads by content signature, falling back to the filename.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileDetector;

impl FileDetector {
    pub fn new() -> Self {
        Self
    }

    /// Never fails. Order: content signature, extension, text sniffing, then
    /// `application/octet-stream`.
    pub fn detect_mime_type(&self, content: &[u8], filename: &str) -> String {
        match infer::get(content) {
            // Office documents are zip/CFB containers; the extension says which kind
            Some(kind) if CONTAINER_MIMES.contains(&kind.mime_type()) => {
                let by_extension = Self::detect_from_extension(filename);
                if by_extension == OCTET_STREAM {
                    kind.mime_type().to_string()
                } else {
                    by_extension
                }
            }
            Some(kind) => {
                debug!(mime_type = kind.mime_type(), "Detected MIME type from content signature");
                kind.mime_type().to_string()
            }
            None => {
                debug!(filename = filename, "No content signature matched, using extension fallback");
                let by_extension = Self::detect_from_extension(filename);
                if by_extension == OCTET_STREAM && looks_like_text(content) {
                    debug!(filename = filename, "Content looks like text");
                    TEXT_PLAIN.to_string()
                } else {
                    by_extension
                }
            }
        }
    }

    pub fn detect_from_extension(filename: &str) -> String {
        let mime_type = extension_of(filename)
            .and_then(|ext| EXTENSION_MIME_MAP.get(ext.as_str()).copied())
            .unwrap_or(OCTET_STREAM);

        info!(filename = filename, mime_type = mime_type, "Detected MIME type from extension");
        mime_type.to_string()
    }
}

fn extension_of(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    Some(ext.to_lowercase())
}

/// Non-empty and free of control bytes other than whitespace. Any byte
/// sequence passing this decodes under one of the text encodings.
pub fn looks_like_text(content: &[u8]) -> bool {
    !content.is_empty()
        && !content
            .iter()
            .any(|&b| (b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r' | 0x0c)) || b == 0x7f)
}
