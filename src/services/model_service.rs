use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ModelLoadError;
use crate::services::ocr_service::OcrEngine;
use crate::services::trocr::{
    TrOcrModel, DECODER_FILE, ENCODER_FILE, MODEL_CONFIG_FILE, PREPROCESSOR_FILE, TOKENIZER_FILE,
};

const REQUIRED_FILES: [&str; 3] = [ENCODER_FILE, DECODER_FILE, TOKENIZER_FILE];
const OPTIONAL_FILES: [&str; 2] = [PREPROCESSOR_FILE, MODEL_CONFIG_FILE];

/// Owns the neural OCR model for the life of the process.
///
/// Loading happens once at startup. A failed load is final: the service keeps
/// running with conventional OCR only and never retries mid-request.
pub struct ModelService {
    model_id: String,
    engine: Option<Arc<dyn OcrEngine>>,
}

impl ModelService {
    /// Fetch and initialize the configured model. Never fails; check `is_loaded`.
    pub async fn load(config: &Config) -> Self {
        let start = Instant::now();
        info!(model = %config.ocr_model, "Loading OCR model");

        match Self::try_load(config).await {
            Ok(model) => {
                info!(
                    model = %config.ocr_model,
                    load_time_ms = start.elapsed().as_millis() as u64,
                    "OCR model loaded successfully"
                );
                Self {
                    model_id: config.ocr_model.clone(),
                    engine: Some(Arc::new(model)),
                }
            }
            Err(e) => {
                warn!(model = %config.ocr_model, error = %e, "Failed to load neural OCR model");
                info!("Will use Tesseract OCR as fallback");
                Self {
                    model_id: config.ocr_model.clone(),
                    engine: None,
                }
            }
        }
    }

    /// A provider whose model never loaded.
    pub fn unloaded() -> Self {
        Self {
            model_id: String::new(),
            engine: None,
        }
    }

    /// A provider backed by an already-built engine.
    pub fn with_engine(engine: Arc<dyn OcrEngine>) -> Self {
        Self {
            model_id: engine.name().to_string(),
            engine: Some(engine),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.engine.is_some()
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn engine(&self) -> Option<Arc<dyn OcrEngine>> {
        self.engine.clone()
    }

    async fn try_load(config: &Config) -> Result<TrOcrModel, ModelLoadError> {
        if !config.enable_neural_ocr {
            return Err(ModelLoadError::Disabled);
        }

        let model_dir = model_cache_dir(&config.model_cache_dir, &config.ocr_model);
        tokio::fs::create_dir_all(&model_dir).await?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(600))
            .build()
            .map_err(|e| ModelLoadError::Download {
                file: config.ocr_model.clone(),
                message: e.to_string(),
            })?;

        for file in REQUIRED_FILES {
            fetch_file(&client, config, file, &model_dir).await?;
        }
        for file in OPTIONAL_FILES {
            if let Err(e) = fetch_file(&client, config, file, &model_dir).await {
                debug!(file = file, error = %e, "Optional model file unavailable, using defaults");
            }
        }

        tokio::task::spawn_blocking(move || TrOcrModel::from_dir(&model_dir))
            .await
            .map_err(|e| ModelLoadError::Session {
                file: config.ocr_model.clone(),
                message: e.to_string(),
            })?
    }
}

/// Per-model cache directory: `org/name` becomes `org--name`.
pub fn model_cache_dir(cache_root: &Path, model_id: &str) -> PathBuf {
    cache_root.join(model_id.replace('/', "--"))
}

pub fn registry_url(config: &Config, file: &str) -> String {
    format!("{}/{}/resolve/main/{}", config.model_registry_url, config.ocr_model, file)
}

async fn fetch_file(
    client: &Client,
    config: &Config,
    file: &str,
    model_dir: &Path,
) -> Result<(), ModelLoadError> {
    let path = model_dir.join(file);
    if tokio::fs::try_exists(&path).await.unwrap_or(false) {
        debug!(file = file, "Using cached model file");
        return Ok(());
    }

    let download_error = |message: String| ModelLoadError::Download {
        file: file.to_string(),
        message,
    };

    let url = registry_url(config, file);
    info!("Downloading model file from: {}", url);

    let mut request = client.get(&url);
    if let Some(token) = &config.hf_token {
        request = request.bearer_auth(token);
    }

    let response = request.send().await.map_err(|e| download_error(e.to_string()))?;
    match response.status() {
        status if status.is_success() => {}
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            return Err(download_error(format!(
                "HTTP {} (check HF_TOKEN for gated or private models)",
                response.status()
            )));
        }
        status => return Err(download_error(format!("HTTP {}", status))),
    }

    let bytes = response.bytes().await.map_err(|e| download_error(e.to_string()))?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    // Write beside the target first so an interrupted download never looks cached
    let partial = path.with_extension("part");
    tokio::fs::write(&partial, &bytes).await?;
    tokio::fs::rename(&partial, &path).await?;

    info!(file = file, bytes = bytes.len(), "Model file downloaded");
    Ok(())
}
