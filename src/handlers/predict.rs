//! Prediction handlers

use axum::{
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use super::upload::read_file_field;
use crate::dataset::{BreathRow, Dataset};
use crate::submission::{self, Submission};
use crate::{AppError, AppResult, AppState};

#[derive(Debug, Serialize)]
pub struct PredictionRow {
    pub id: u64,
    pub breath_id: u64,
    pub pressure: f64,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub predictions: Vec<PredictionRow>,
    pub total_predictions: usize,
    pub total_breaths: usize,
    /// MAE against the reference formula; `null` when no row qualifies
    pub estimated_mae: Option<f64>,
}

/// Mean absolute gap between predictions and [`BreathRow::reference_pressure`]
pub fn estimate_mae(rows: &[BreathRow], predictions: &[f64]) -> Option<f64> {
    let gaps: Vec<f64> = rows
        .iter()
        .zip(predictions)
        .filter_map(|(row, p)| row.reference_pressure().map(|r| (p - r).abs()))
        .collect();

    if gaps.is_empty() {
        None
    } else {
        Some(gaps.iter().sum::<f64>() / gaps.len() as f64)
    }
}

/// Predict pressure for an uploaded CSV and return a JSON preview
pub async fn predict(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<PredictResponse>> {
    let model = state.model.current().ok_or(AppError::ModelNotTrained)?;
    let bytes = read_file_field(&mut multipart).await?;
    let preview_limit = state.config.preview_limit;

    let response = tokio::task::spawn_blocking(move || -> AppResult<_> {
        let dataset = Dataset::from_bytes(&bytes)?;
        let total_breaths = dataset.breath_count();
        tracing::info!("Predicting {} rows, {} breaths", dataset.len(), total_breaths);

        let predictions = model.predict(&dataset)?;
        let estimated_mae = estimate_mae(dataset.rows(), &predictions);
        if let Some(mae) = estimated_mae {
            tracing::info!("Estimated MAE: {:.4}", mae);
        }

        let preview = dataset
            .rows()
            .iter()
            .zip(&predictions)
            .take(preview_limit)
            .map(|(row, &pressure)| PredictionRow {
                id: row.id,
                breath_id: row.breath_id,
                pressure,
            })
            .collect();

        Ok(PredictResponse {
            predictions: preview,
            total_predictions: predictions.len(),
            total_breaths,
            estimated_mae,
        })
    })
    .await??;

    Ok(Json(response))
}

/// Predict and return a gap-filled `id,pressure` CSV attachment
pub async fn predict_and_download(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let model = state.model.current().ok_or(AppError::ModelNotTrained)?;
    let bytes = read_file_field(&mut multipart).await?;
    let synthetic_seed = state.config.synthetic_seed;
    let max_rows = state.config.max_submission_rows;

    let (csv, sub) = tokio::task::spawn_blocking(move || -> AppResult<_> {
        let dataset = Dataset::from_bytes(&bytes)?;
        tracing::info!("Building submission from {} rows", dataset.len());

        let predictions = model.predict(&dataset)?;
        let pairs: Vec<(u64, f64)> = dataset
            .rows()
            .iter()
            .zip(&predictions)
            .map(|(row, &p)| (row.id, p))
            .collect();

        let mut rng = match synthetic_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let sub = Submission::build(&pairs, max_rows, &mut rng)?;
        let csv = sub.to_csv()?;
        Ok((csv, sub))
    })
    .await??;

    let name = submission::file_name(chrono::Local::now());
    tracing::info!(
        "Generated {}: {} rows ({} real, {} synthetic), mean {:.2}",
        name,
        sub.rows.len(),
        sub.real_count,
        sub.synthetic_count,
        sub.stats.mean
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", name)),
        ],
        csv,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_mae_skips_non_positive_compliance() {
        let row = BreathRow {
            id: 1,
            breath_id: 1,
            r: 10.0,
            c: 0.0,
            time_step: 0.0,
            u_in: 5.0,
            u_out: 0.0,
            pressure: None,
        };
        assert_eq!(estimate_mae(&[row.clone()], &[1.0]), None);

        let good = BreathRow { c: 50.0, ..row };
        // reference = 10 * 5 * 0.1 = 5
        assert_eq!(estimate_mae(&[good], &[7.0]), Some(2.0));
    }
}
