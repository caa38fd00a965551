//! Training handler

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;

use super::upload::read_file_field;
use crate::dataset::Dataset;
use crate::model::VentilatorModel;
use crate::{AppResult, AppState};

#[derive(Debug, Serialize)]
pub struct TrainResponse {
    pub message: &'static str,
    /// Validation MAE
    pub mae: f64,
    pub samples: usize,
    pub breaths: usize,
    pub model_type: String,
    pub train_mae: f64,
    pub train_rmse: f64,
    pub val_rmse: f64,
}

/// Train a new model from an uploaded CSV, persist it and make it active
pub async fn train(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<TrainResponse>> {
    let bytes = read_file_field(&mut multipart).await?;
    let config = state.config.clone();

    let (model, report) = tokio::task::spawn_blocking(move || -> AppResult<_> {
        let mut dataset = Dataset::from_bytes(&bytes)?;
        tracing::info!(
            "Training upload: {} rows, {} breaths",
            dataset.len(),
            dataset.breath_count()
        );

        let total = dataset.len();
        dataset.truncate(config.train_sample_limit);
        if dataset.len() < total {
            tracing::warn!("Using only the first {} of {} rows for training", dataset.len(), total);
        }

        let (model, report) = VentilatorModel::train(&dataset, &config.train_options())?;
        model.save(&config.model_path)?;
        Ok((model, report))
    })
    .await??;

    let model = state.model.replace(model);
    tracing::info!("Training completed, model {} is active", model.kind());

    Ok(Json(TrainResponse {
        message: "Training completed successfully",
        mae: report.val_mae,
        samples: report.samples,
        breaths: report.breaths,
        model_type: model.kind().to_string(),
        train_mae: report.train_mae,
        train_rmse: report.train_rmse,
        val_rmse: report.val_rmse,
    }))
}
