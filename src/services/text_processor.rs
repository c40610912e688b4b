use encoding_rs::{UTF_8, WINDOWS_1252};

use crate::error::ExtractionError;

/// Candidate encodings, tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Latin1,
    Windows1252,
    Iso8859_1,
    Ascii,
}

impl TextEncoding {
    pub const CANDIDATES: [TextEncoding; 5] = [
        TextEncoding::Utf8,
        TextEncoding::Latin1,
        TextEncoding::Windows1252,
        TextEncoding::Iso8859_1,
        TextEncoding::Ascii,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "latin-1",
            TextEncoding::Windows1252 => "cp1252",
            TextEncoding::Iso8859_1 => "iso-8859-1",
            TextEncoding::Ascii => "ascii",
        }
    }

    /// Strict decode: `None` when the bytes are not valid in this encoding.
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8 => UTF_8
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|text| text.into_owned()),
            TextEncoding::Latin1 | TextEncoding::Iso8859_1 => {
                Some(encoding_rs::mem::decode_latin1(bytes).into_owned())
            }
            TextEncoding::Windows1252 => WINDOWS_1252
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|text| text.into_owned()),
            TextEncoding::Ascii if bytes.is_ascii() => UTF_8
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|text| text.into_owned()),
            TextEncoding::Ascii => None,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TextProcessor;

impl TextProcessor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, content: &[u8]) -> Result<String, ExtractionError> {
        let (text, encoding) = decode_first_match(content)?;
        tracing::debug!(encoding = encoding.label(), "Decoded text file");
        Ok(text.trim().to_string())
    }
}

/// First candidate encoding that accepts the bytes, with the decoded text.
pub fn decode_first_match(content: &[u8]) -> Result<(String, TextEncoding), ExtractionError> {
    TextEncoding::CANDIDATES
        .iter()
        .find_map(|encoding| encoding.decode(content).map(|text| (text, *encoding)))
        .ok_or_else(|| {
            let labels = TextEncoding::CANDIDATES
                .iter()
                .map(|e| e.label())
                .collect::<Vec<_>>()
                .join(", ");
            ExtractionError::decode(
                "Text",
                format!("Could not decode text file with any supported encoding: {}", labels),
            )
        })
}
