//! PM Agent backend: service health and batch presentation analysis over HTTP.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod storage;

use axum::routing::{get, post};
use axum::Router;
use deck_pptx::PptxAnalyzer;
use std::sync::Arc;
use storage::ObjectStore;
use tower::ServiceBuilder;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ObjectStore>,
    pub analyzer: PptxAnalyzer,
}

impl AppState {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            analyzer: PptxAnalyzer::new(),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/analyze", post(handlers::analyze))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::trace_layer())
                .layer(middleware::cors_layer()),
        )
        .with_state(state)
}
