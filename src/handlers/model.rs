//! Model lifecycle handlers

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::VentilatorModel;
use crate::{AppError, AppResult, AppState};

#[derive(Debug, Serialize)]
pub struct LoadModelResponse {
    pub message: &'static str,
    pub model_type: String,
    pub trained_at: DateTime<Utc>,
}

/// Load the persisted artifact and make it the active model
pub async fn load_model(State(state): State<AppState>) -> AppResult<Json<LoadModelResponse>> {
    let path = state.config.model_path.clone();
    tracing::info!("Loading saved model from {}", path.display());

    let model = tokio::task::spawn_blocking(move || VentilatorModel::load(&path))
        .await?
        .map_err(|e| AppError::NotFound(format!("No model found: {}", e)))?;

    let model = state.model.replace(model);

    Ok(Json(LoadModelResponse {
        message: "Model loaded successfully",
        model_type: model.kind().to_string(),
        trained_at: model.trained_at(),
    }))
}
