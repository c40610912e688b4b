#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use docx_rs::{Docx, Paragraph, Run, Table, TableCell, TableRow};
use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use serde_json::Value;
use tower::ServiceExt;

use textract::error::ExtractionError;
use textract::services::ocr_service::{TESSERACT_METHOD, TROCR_METHOD};
use textract::services::{ExtractionService, ModelService, OcrEngine};
use textract::{create_router, AppState, Config};

pub const BOUNDARY: &str = "X-TEXTRACT-BOUNDARY";

/// OCR engine that returns canned text.
pub struct StubEngine {
    name: &'static str,
    text: String,
}

impl StubEngine {
    pub fn tesseract(text: &str) -> Arc<dyn OcrEngine> {
        Arc::new(Self {
            name: TESSERACT_METHOD,
            text: text.to_string(),
        })
    }

    pub fn trocr(text: &str) -> Arc<dyn OcrEngine> {
        Arc::new(Self {
            name: TROCR_METHOD,
            text: text.to_string(),
        })
    }
}

impl OcrEngine for StubEngine {
    fn name(&self) -> &'static str {
        self.name
    }

    fn recognize(&self, _image: &RgbImage) -> Result<String, ExtractionError> {
        Ok(self.text.clone())
    }
}

pub fn unloaded_service(conventional_text: &str) -> ExtractionService {
    ExtractionService::new(
        Arc::new(ModelService::unloaded()),
        StubEngine::tesseract(conventional_text),
    )
}

pub fn loaded_service(neural_text: &str, conventional_text: &str) -> ExtractionService {
    ExtractionService::new(
        Arc::new(ModelService::with_engine(StubEngine::trocr(neural_text))),
        StubEngine::tesseract(conventional_text),
    )
}

pub fn test_config() -> Config {
    Config {
        max_file_size: 1024 * 1024,
        max_batch_size: 3,
        enable_neural_ocr: false,
        ..Config::default()
    }
}

pub fn router(config: Config, extraction: ExtractionService) -> Router {
    create_router(AppState::new(config, extraction, true))
}

/// A multipart part: (field name, optional filename, content).
pub type Part<'a> = (&'a str, Option<&'a str>, &'a [u8]);

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, content) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match filename {
            Some(filename) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
            }
        }
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn post_multipart(router: Router, uri: &str, parts: &[Part<'_>]) -> (StatusCode, Value) {
    let body = multipart_body(parts);
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .header("content-length", body.len())
        .body(Body::from(body))
        .expect("Failed to build request");

    let response = router.oneshot(request).await.expect("Request failed");
    read_json(response).await
}

pub async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request");
    let response = router.oneshot(request).await.expect("Request failed");
    read_json(response).await
}

pub async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 10_000_000)
        .await
        .expect("Failed to read body");
    let value = serde_json::from_slice(&bytes).expect("Response JSON parse failed");
    (status, value)
}

pub fn png_bytes() -> Vec<u8> {
    let image: RgbImage = ImageBuffer::from_pixel(32, 16, Rgb([255, 255, 255]));
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut cursor, ImageOutputFormat::Png)
        .expect("Failed to encode PNG");
    cursor.into_inner()
}

/// Single-page PDF; `None` gives a page with no text layer.
pub fn pdf_bytes(text: Option<&str>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let operations = match text {
        Some(text) => vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 48.into()]),
            Operation::new("Td", vec![100.into(), 600.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
        None => vec![],
    };
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().expect("Failed to encode content"),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to save PDF");
    bytes
}

pub fn docx_bytes(paragraphs: &[&str], rows: &[&[&str]]) -> Vec<u8> {
    let mut docx = Docx::new();
    for text in paragraphs {
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*text)));
    }
    if !rows.is_empty() {
        let table_rows = rows
            .iter()
            .map(|cells| {
                TableRow::new(
                    cells
                        .iter()
                        .map(|cell| {
                            TableCell::new()
                                .add_paragraph(Paragraph::new().add_run(Run::new().add_text(*cell)))
                        })
                        .collect(),
                )
            })
            .collect();
        docx = docx.add_table(Table::new(table_rows));
    }

    let mut cursor = Cursor::new(Vec::new());
    docx.build().pack(&mut cursor).expect("Failed to pack DOCX");
    cursor.into_inner()
}
