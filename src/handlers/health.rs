use axum::{extract::State, response::Json};
use tracing::info;

use crate::handlers::AppState;
use crate::models::{HealthResponse, HealthSettings, RootResponse};

pub const SUPPORTED_FORMATS: [&str; 4] = ["PDF", "DOCX", "TXT", "Images (PNG, JPG, TIFF, BMP)"];

/// Liveness probe with service identity
pub async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        message: "File to Text Extraction API".to_string(),
        status: "running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        supported_formats: SUPPORTED_FORMATS.iter().map(|f| f.to_string()).collect(),
    })
}

/// Detailed health check
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let models = state.extraction.models();
    let models_loaded = models.is_loaded();
    let conventional_ocr_available = state.conventional_ocr_available;

    info!(
        models_loaded = models_loaded,
        conventional_ocr_available = conventional_ocr_available,
        "Health check completed"
    );

    Json(HealthResponse {
        status: "healthy".to_string(),
        models_loaded,
        ocr_model: models.model_id().to_string(),
        conventional_ocr_available,
        settings: HealthSettings {
            max_file_size: state.config.max_file_size,
            max_batch_size: state.config.max_batch_size,
            allowed_extensions: state.config.allowed_extensions.clone(),
        },
        rate_limiting: state.limiter.stats(),
    })
}
