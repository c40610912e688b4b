//! TrOCR-style vision encoder/decoder running on ONNX Runtime.
//!
//! Expects the layout of an ONNX export on the model registry:
//! `onnx/encoder_model.onnx`, `onnx/decoder_model.onnx` and `tokenizer.json`,
//! with `preprocessor_config.json` and `config.json` read when present.

use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;
use image::imageops::{self, FilterType};
use image::RgbImage;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use serde_json::Value;
use tokenizers::Tokenizer;

use crate::error::{ExtractionError, ModelLoadError};
use crate::services::ocr_service::{OcrEngine, TROCR_METHOD};

pub const ENCODER_FILE: &str = "onnx/encoder_model.onnx";
pub const DECODER_FILE: &str = "onnx/decoder_model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const PREPROCESSOR_FILE: &str = "preprocessor_config.json";
pub const MODEL_CONFIG_FILE: &str = "config.json";

const MAX_DECODE_STEPS: usize = 64;

/// Image normalization read from `preprocessor_config.json`.
#[derive(Debug, Clone, PartialEq)]
pub struct Preprocessing {
    pub width: u32,
    pub height: u32,
    pub rescale_factor: f32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Default for Preprocessing {
    fn default() -> Self {
        Self {
            width: 384,
            height: 384,
            rescale_factor: 1.0 / 255.0,
            mean: [0.5; 3],
            std: [0.5; 3],
        }
    }
}

impl Preprocessing {
    pub fn from_json(value: &Value) -> Self {
        let defaults = Self::default();
        let (width, height) = match value.get("size") {
            Some(Value::Number(n)) => {
                let side = n.as_u64().map(|s| s as u32).unwrap_or(defaults.width);
                (side, side)
            }
            Some(size @ Value::Object(_)) => (
                size.get("width").and_then(Value::as_u64).map(|w| w as u32).unwrap_or(defaults.width),
                size.get("height").and_then(Value::as_u64).map(|h| h as u32).unwrap_or(defaults.height),
            ),
            _ => (defaults.width, defaults.height),
        };

        Self {
            width,
            height,
            rescale_factor: value
                .get("rescale_factor")
                .and_then(Value::as_f64)
                .map(|f| f as f32)
                .unwrap_or(defaults.rescale_factor),
            mean: triple(value.get("image_mean")).unwrap_or(defaults.mean),
            std: triple(value.get("image_std")).unwrap_or(defaults.std),
        }
    }

    /// Resize and normalize into a CHW float buffer.
    pub fn pixel_values(&self, image: &RgbImage) -> Vec<f32> {
        let resized = imageops::resize(image, self.width, self.height, FilterType::Triangle);
        let plane = (self.width * self.height) as usize;
        let mut data = vec![0f32; 3 * plane];

        for (x, y, pixel) in resized.enumerate_pixels() {
            let idx = (y * self.width + x) as usize;
            for channel in 0..3 {
                let value = pixel[channel] as f32 * self.rescale_factor;
                data[channel * plane + idx] = (value - self.mean[channel]) / self.std[channel];
            }
        }
        data
    }
}

/// Special token ids that drive greedy decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation {
    pub decoder_start_token_id: i64,
    pub eos_token_id: i64,
}

impl Default for Generation {
    fn default() -> Self {
        Self {
            decoder_start_token_id: 2,
            eos_token_id: 2,
        }
    }
}

impl Generation {
    pub fn from_json(value: &Value) -> Self {
        let defaults = Self::default();
        let lookup = |key: &str| {
            value
                .get(key)
                .or_else(|| value.get("decoder").and_then(|d| d.get(key)))
                .and_then(Value::as_i64)
        };

        Self {
            decoder_start_token_id: lookup("decoder_start_token_id")
                .unwrap_or(defaults.decoder_start_token_id),
            eos_token_id: lookup("eos_token_id").unwrap_or(defaults.eos_token_id),
        }
    }
}

pub struct TrOcrModel {
    encoder: Mutex<Session>,
    decoder: Mutex<Session>,
    tokenizer: Tokenizer,
    preprocessing: Preprocessing,
    generation: Generation,
}

impl TrOcrModel {
    /// Load a model from a directory holding the registry files.
    pub fn from_dir(dir: &Path) -> Result<Self, ModelLoadError> {
        let encoder = build_session(&dir.join(ENCODER_FILE))?;
        let decoder = build_session(&dir.join(DECODER_FILE))?;

        let tokenizer = Tokenizer::from_file(dir.join(TOKENIZER_FILE))
            .map_err(|e| ModelLoadError::Tokenizer(e.to_string()))?;

        let preprocessing = read_json(&dir.join(PREPROCESSOR_FILE))
            .map(|v| Preprocessing::from_json(&v))
            .unwrap_or_default();
        let generation = read_json(&dir.join(MODEL_CONFIG_FILE))
            .map(|v| Generation::from_json(&v))
            .unwrap_or_default();

        tracing::debug!(?preprocessing, ?generation, "TrOCR model configured");

        Ok(Self {
            encoder: Mutex::new(encoder),
            decoder: Mutex::new(decoder),
            tokenizer,
            preprocessing,
            generation,
        })
    }

    fn encode(&self, image: &RgbImage) -> Result<(Vec<usize>, Vec<f32>), ExtractionError> {
        let pixels = self.preprocessing.pixel_values(image);
        let pixel_values = Tensor::from_array((
            vec![1usize, 3, self.preprocessing.height as usize, self.preprocessing.width as usize],
            pixels.into_boxed_slice(),
        ))
        .map_err(|e| ExtractionError::ocr(format!("Pixel tensor creation failed: {}", e)))?;

        let mut encoder = self
            .encoder
            .lock()
            .map_err(|_| ExtractionError::ocr("Encoder session lock poisoned"))?;
        let outputs = encoder
            .run(vec![("pixel_values", pixel_values.into_dyn())])
            .map_err(|e| ExtractionError::ocr(format!("Encoder inference failed: {}", e)))?;

        let hidden = outputs
            .get("last_hidden_state")
            .ok_or_else(|| ExtractionError::ocr("Encoder produced no last_hidden_state"))?;
        let (shape, data) = hidden
            .try_extract_tensor::<f32>()
            .map_err(|e| ExtractionError::ocr(format!("Failed to extract encoder output: {}", e)))?;

        Ok((shape.iter().map(|&d| d as usize).collect(), data.to_vec()))
    }

    fn decode(&self, hidden_shape: &[usize], hidden: &[f32]) -> Result<Vec<u32>, ExtractionError> {
        let mut decoder = self
            .decoder
            .lock()
            .map_err(|_| ExtractionError::ocr("Decoder session lock poisoned"))?;

        let mut ids = vec![self.generation.decoder_start_token_id];
        for _ in 0..MAX_DECODE_STEPS {
            let input_ids = Tensor::from_array((vec![1usize, ids.len()], ids.clone().into_boxed_slice()))
                .map_err(|e| ExtractionError::ocr(format!("Input tensor creation failed: {}", e)))?;
            let states = Tensor::from_array((hidden_shape.to_vec(), hidden.to_vec().into_boxed_slice()))
                .map_err(|e| ExtractionError::ocr(format!("Hidden state tensor creation failed: {}", e)))?;

            let outputs = decoder
                .run(vec![
                    ("input_ids", input_ids.into_dyn()),
                    ("encoder_hidden_states", states.into_dyn()),
                ])
                .map_err(|e| ExtractionError::ocr(format!("Decoder inference failed: {}", e)))?;

            let logits = outputs
                .get("logits")
                .ok_or_else(|| ExtractionError::ocr("Decoder produced no logits"))?;
            let (shape, data) = logits
                .try_extract_tensor::<f32>()
                .map_err(|e| ExtractionError::ocr(format!("Failed to extract logits: {}", e)))?;

            let vocab = shape.last().copied().unwrap_or(0) as usize;
            let offset = (ids.len() - 1) * vocab;
            let next = data
                .get(offset..offset + vocab)
                .and_then(argmax)
                .ok_or_else(|| ExtractionError::ocr("Decoder logits have unexpected shape"))?;

            if next == self.generation.eos_token_id {
                break;
            }
            ids.push(next);
        }

        Ok(ids.into_iter().skip(1).map(|id| id as u32).collect())
    }
}

impl OcrEngine for TrOcrModel {
    fn name(&self) -> &'static str {
        TROCR_METHOD
    }

    fn recognize(&self, image: &RgbImage) -> Result<String, ExtractionError> {
        let start = Instant::now();

        let (hidden_shape, hidden) = self.encode(image)?;
        let token_ids = self.decode(&hidden_shape, &hidden)?;
        let text = self
            .tokenizer
            .decode(&token_ids, true)
            .map_err(|e| ExtractionError::ocr(format!("Token decoding failed: {}", e)))?;

        tracing::info!(
            tokens = token_ids.len(),
            processing_time_ms = start.elapsed().as_millis() as u64,
            "TrOCR inference completed"
        );
        Ok(text.trim().to_string())
    }
}

fn build_session(path: &Path) -> Result<Session, ModelLoadError> {
    let file = path.display().to_string();
    let session_error = |message: String| ModelLoadError::Session {
        file: file.clone(),
        message,
    };

    Session::builder()
        .map_err(|e| session_error(e.to_string()))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| session_error(e.to_string()))?
        .with_intra_threads(4)
        .map_err(|e| session_error(e.to_string()))?
        .commit_from_file(path)
        .map_err(|e| session_error(e.to_string()))
}

fn read_json(path: &Path) -> Option<Value> {
    let raw = std::fs::read(path).ok()?;
    serde_json::from_slice(&raw).ok()
}

fn triple(value: Option<&Value>) -> Option<[f32; 3]> {
    let values = value?.as_array()?;
    if values.len() != 3 {
        return None;
    }
    let mut out = [0f32; 3];
    for (slot, v) in out.iter_mut().zip(values) {
        *slot = v.as_f64()? as f32;
    }
    Some(out)
}

fn argmax(values: &[f32]) -> Option<i64> {
    values
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(idx, _)| idx as i64)
}
