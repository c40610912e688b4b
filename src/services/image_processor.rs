use std::sync::Arc;
use image::RgbImage;

use crate::error::{ExtractionError, ExtractionResultExt};
use crate::services::model_service::ModelService;
use crate::services::ocr_service::OcrEngine;

/// Which OCR path serves an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrPath {
    Conventional,
    Neural,
}

impl OcrPath {
    /// The force flag wins over model availability.
    pub fn select(force_conventional: bool, model_loaded: bool) -> Self {
        if force_conventional || !model_loaded {
            OcrPath::Conventional
        } else {
            OcrPath::Neural
        }
    }
}

/// Text read off an image, labelled with the engine that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrOutput {
    pub text: String,
    pub method: &'static str,
}

pub struct ImageProcessor {
    models: Arc<ModelService>,
    conventional: Arc<dyn OcrEngine>,
}

impl ImageProcessor {
    pub fn new(models: Arc<ModelService>, conventional: Arc<dyn OcrEngine>) -> Self {
        Self { models, conventional }
    }

    /// An empty OCR result is a successful, empty extraction.
    pub fn extract(&self, content: &[u8], force_conventional: bool) -> Result<OcrOutput, ExtractionError> {
        let image = decode_image(content)?;

        let path = OcrPath::select(force_conventional, self.models.is_loaded());
        let engine = match (path, self.models.engine()) {
            (OcrPath::Neural, Some(neural)) => neural,
            _ => self.conventional.clone(),
        };

        tracing::info!(
            width = image.width(),
            height = image.height(),
            engine = engine.name(),
            forced = force_conventional,
            "Extracting text from image"
        );

        let text = engine.recognize(&image)?;
        Ok(OcrOutput {
            text,
            method: engine.name(),
        })
    }
}

/// Decode any supported raster format into 8-bit RGB.
pub fn decode_image(content: &[u8]) -> Result<RgbImage, ExtractionError> {
    let image = image::load_from_memory(content).decode_err("Image")?;
    Ok(image.to_rgb8())
}
