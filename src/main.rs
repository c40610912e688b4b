use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use textract::{
    create_router,
    services::{ExtractionService, ModelService, TesseractEngine},
    AppState, Config,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(&config);

    tracing::info!("Starting File to Text Extraction API");
    tracing::info!("Max file size: {:.1}MB", config.max_file_size_mb());
    tracing::info!("Max batch size: {}", config.max_batch_size);

    let tesseract = TesseractEngine::from_config(&config);
    let conventional_ocr_available = tesseract.is_available();
    if !conventional_ocr_available {
        tracing::warn!(
            command = %config.tesseract_cmd,
            "Tesseract is not available; image OCR will fail unless the neural model loads"
        );
    }

    let models = Arc::new(ModelService::load(&config).await);
    tracing::info!(
        model = models.model_id(),
        loaded = models.is_loaded(),
        "Neural OCR model state"
    );
    let extraction = ExtractionService::new(models, Arc::new(tesseract));

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let app = create_router(AppState::new(config, extraction, conventional_ocr_available));

    tracing::info!("API ready, listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(config: &Config) {
    let level = match config.log_level.to_lowercase().as_str() {
        "warning" => "warn".to_string(),
        "critical" | "fatal" => "error".to_string(),
        other => other.to_string(),
    };
    let default_filter = if config.debug_mode {
        format!("textract={level},tower_http=debug,axum::rejection=trace")
    } else {
        format!("textract={level},tower_http={level}")
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.debug_mode {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    }
}
