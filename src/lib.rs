//! Ventilator pressure prediction
//!
//! Trains a tabular ensemble regressor on breath-cycle sensor data and serves
//! predictions over HTTP.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   VENTILATOR PRESSURE                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  CSV upload ──► dataset ──► features ──► scaler ──► ensemble │
//! │     (Axum)      (csv)      (lookback 2)   (std)    (RF / GB) │
//! │                                                 │            │
//! │                                 model.bin ◄─────┘            │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod handlers;
pub mod model;
pub mod state;
pub mod submission;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use error::{AppError, AppResult};
pub use state::AppState;

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/api/train", post(handlers::train::train))
        .route("/api/predict", post(handlers::predict::predict))
        .route("/api/predict_and_download", post(handlers::predict::predict_and_download))
        .route("/api/load_model", get(handlers::model::load_model))
        .route("/api/status", get(handlers::status::status))
        .layer(DefaultBodyLimit::max(upload_limit))
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
