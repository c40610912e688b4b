use std::env;
use std::path::PathBuf;
use anyhow::{Result, Context};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub debug_mode: bool,
    pub hf_token: Option<String>,
    pub ocr_model: String,
    pub model_registry_url: String,
    pub model_cache_dir: PathBuf,
    pub enable_neural_ocr: bool,
    pub max_file_size: usize,
    pub max_batch_size: usize,
    pub allowed_extensions: Vec<String>,
    pub log_level: String,
    pub tesseract_cmd: String,
    pub tesseract_lang: String,
    pub max_concurrent_requests: usize,
}

pub const DEFAULT_OCR_MODEL: &str = "Xenova/trocr-base-printed";
pub const DEFAULT_ALLOWED_EXTENSIONS: &str = "pdf,docx,doc,txt,png,jpg,jpeg,tiff,bmp";

impl Config {
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");
        Self::from_source(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_source<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = Source { lookup };

        let server_port = match source.get("PORT") {
            Some(_) => source.parse("PORT", 8000u16).context("Failed to parse PORT")?,
            None => source.parse("API_PORT", 8000u16).context("Failed to parse API_PORT")?,
        };

        let config = Config {
            server_host: source.string("API_HOST", "0.0.0.0"),
            server_port,
            debug_mode: source.parse("DEBUG_MODE", true)
                .context("Failed to parse DEBUG_MODE")?,
            hf_token: source.get("HF_TOKEN")
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            ocr_model: source.string("OCR_MODEL", DEFAULT_OCR_MODEL),
            model_registry_url: source.string("MODEL_REGISTRY_URL", "https://huggingface.co")
                .trim_end_matches('/')
                .to_string(),
            model_cache_dir: PathBuf::from(source.string("MODEL_CACHE_DIR", ".cache/models")),
            enable_neural_ocr: source.parse("ENABLE_NEURAL_OCR", true)
                .context("Failed to parse ENABLE_NEURAL_OCR")?,
            max_file_size: source.parse("MAX_FILE_SIZE", 10 * 1024 * 1024)
                .context("Failed to parse MAX_FILE_SIZE")?,
            max_batch_size: source.parse("MAX_BATCH_SIZE", 10)
                .context("Failed to parse MAX_BATCH_SIZE")?,
            allowed_extensions: parse_extensions(
                &source.string("ALLOWED_EXTENSIONS", DEFAULT_ALLOWED_EXTENSIONS),
            ),
            log_level: source.string("LOG_LEVEL", "INFO"),
            tesseract_cmd: source.string("TESSERACT_CMD", "/usr/bin/tesseract"),
            tesseract_lang: source.string("TESSERACT_LANG", "eng"),
            max_concurrent_requests: source.parse("MAX_CONCURRENT_REQUESTS", 100)
                .context("Failed to parse MAX_CONCURRENT_REQUESTS")?,
        };

        config.validate()?;

        info!(
            host = %config.server_host,
            port = config.server_port,
            ocr_model = %config.ocr_model,
            max_file_size = config.max_file_size,
            max_batch_size = config.max_batch_size,
            "Configuration loaded successfully"
        );
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.server_port == 0 {
            return Err(anyhow::anyhow!("API_PORT must be greater than 0"));
        }
        if self.max_file_size == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE must be greater than 0"));
        }
        if self.max_batch_size == 0 {
            return Err(anyhow::anyhow!("MAX_BATCH_SIZE must be greater than 0"));
        }
        if self.max_concurrent_requests == 0 {
            return Err(anyhow::anyhow!("MAX_CONCURRENT_REQUESTS must be greater than 0"));
        }
        Ok(())
    }

    /// Largest request body the router accepts: a full batch plus multipart overhead.
    pub fn body_limit(&self) -> usize {
        self.max_file_size
            .saturating_mul(self.max_batch_size)
            .saturating_add(1024 * 1024)
    }

    pub fn max_file_size_mb(&self) -> f64 {
        self.max_file_size as f64 / 1024.0 / 1024.0
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_host: "0.0.0.0".to_string(),
            server_port: 8000,
            debug_mode: true,
            hf_token: None,
            ocr_model: DEFAULT_OCR_MODEL.to_string(),
            model_registry_url: "https://huggingface.co".to_string(),
            model_cache_dir: PathBuf::from(".cache/models"),
            enable_neural_ocr: true,
            max_file_size: 10 * 1024 * 1024,
            max_batch_size: 10,
            allowed_extensions: parse_extensions(DEFAULT_ALLOWED_EXTENSIONS),
            log_level: "INFO".to_string(),
            tesseract_cmd: "/usr/bin/tesseract".to_string(),
            tesseract_lang: "eng".to_string(),
            max_concurrent_requests: 100,
        }
    }
}

struct Source<F> {
    lookup: F,
}

impl<F> Source<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, var_name: &str) -> Option<String> {
        (self.lookup)(var_name)
    }

    fn string(&self, var_name: &str, default: &str) -> String {
        self.get(var_name).unwrap_or_else(|| {
            info!("{} not set, using default: {}", var_name, default);
            default.to_string()
        })
    }

    fn parse<T>(&self, var_name: &str, default: T) -> Result<T>
    where
        T: std::str::FromStr + Copy + std::fmt::Debug,
        T::Err: std::fmt::Display,
    {
        match self.get(var_name) {
            Some(val) => match val.trim().to_lowercase().parse() {
                Ok(parsed) => Ok(parsed),
                Err(e) => {
                    warn!("Failed to parse {}: {} (using default: {:?})", var_name, e, default);
                    Ok(default)
                }
            },
            None => {
                info!("{} not set, using default: {:?}", var_name, default);
                Ok(default)
            }
        }
    }
}

fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
