//! Sentinel Anomaly Service
//!
//! Scores container runtime behavior against a learned baseline.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SENTINEL ANOMALY                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐      ┌────────────────────────────────────┐  │
//! │  │  API      │      │  Detector                          │  │
//! │  │  (Axum)   │─────▶│  features → scaler → forest        │  │
//! │  │           │      │  explain (reasons, suggestions)    │  │
//! │  └───────────┘      └─────────────────┬──────────────────┘  │
//! │                                       ▼                     │
//! │                          ┌────────────────────────┐         │
//! │                          │ models/baseline.json   │         │
//! │                          └────────────────────────┘         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod logic;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use config::Config;
pub use error::{AppError, AppResult};
use logic::detector::Detector;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub detector: Arc<Detector>,
    pub config: Config,
}

impl AppState {
    pub fn new(detector: Detector, config: Config) -> Self {
        Self {
            detector: Arc::new(detector),
            config,
        }
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/predict", post(handlers::predict::predict))
        .route("/train", post(handlers::train::train))
        .route("/model/info", get(handlers::model_info::info))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
