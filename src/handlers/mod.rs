pub mod extract;
pub mod health;

pub use extract::*;
pub use health::*;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::middleware::{logging_middleware, rate_limit_middleware, RequestLimiter};
use crate::services::ExtractionService;

/// Shared, read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub extraction: Arc<ExtractionService>,
    pub limiter: Arc<RequestLimiter>,
    /// Probed once at startup against the engine extraction uses.
    pub conventional_ocr_available: bool,
}

impl AppState {
    pub fn new(config: Config, extraction: ExtractionService, conventional_ocr_available: bool) -> Self {
        Self {
            limiter: Arc::new(RequestLimiter::new(config.max_concurrent_requests)),
            conventional_ocr_available,
            config: Arc::new(config),
            extraction: Arc::new(extraction),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let extraction_routes = Router::new()
        .route("/extract", post(extract_handler))
        .route("/extract-batch", post(extract_batch_handler))
        .route_layer(axum::middleware::from_fn_with_state(
            state.limiter.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .merge(extraction_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(state.config.body_limit()))
                .layer(axum::middleware::from_fn(logging_middleware)),
        )
        .with_state(state)
}
