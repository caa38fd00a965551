//! Submission file generation
//!
//! Produces an `id,pressure` CSV covering every id between the smallest and
//! largest uploaded id. Ids that were uploaded keep their model prediction;
//! the gaps are filled with normal samples of the real predictions, clipped
//! to the observed range.

use std::collections::HashMap;

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("no predictions to build a submission from")]
    Empty,

    #[error("id range {min_id}..={max_id} exceeds the submission limit of {limit} rows")]
    TooManyRows { min_id: u64, max_id: u64, limit: usize },

    #[error("cannot allocate submission rows: {0}")]
    Allocation(#[from] std::collections::TryReserveError),

    #[error("invalid prediction statistics: {0}")]
    Distribution(#[from] rand_distr::NormalError),

    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to finish CSV: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubmissionRow {
    pub id: u64,
    pub pressure: f64,
}

/// Summary of the real predictions the fill is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionStats {
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl PredictionStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Self {
            mean,
            std: var.sqrt(),
            min,
            max,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub rows: Vec<SubmissionRow>,
    pub real_count: usize,
    pub synthetic_count: usize,
    pub stats: PredictionStats,
}

impl Submission {
    /// Build the gap-filled id range from `(id, prediction)` pairs.
    /// A repeated id keeps its last prediction. The range may span at most
    /// `max_rows` ids.
    pub fn build<R: Rng + ?Sized>(
        predictions: &[(u64, f64)],
        max_rows: usize,
        rng: &mut R,
    ) -> Result<Self, SubmissionError> {
        let values: Vec<f64> = predictions.iter().map(|&(_, p)| p).collect();
        let stats = PredictionStats::from_values(&values).ok_or(SubmissionError::Empty)?;

        let real: HashMap<u64, f64> = predictions.iter().copied().collect();
        let min_id = real.keys().copied().min().ok_or(SubmissionError::Empty)?;
        let max_id = real.keys().copied().max().ok_or(SubmissionError::Empty)?;

        let span = (max_id - min_id)
            .checked_add(1)
            .and_then(|n| usize::try_from(n).ok())
            .filter(|&n| n <= max_rows)
            .ok_or(SubmissionError::TooManyRows {
                min_id,
                max_id,
                limit: max_rows,
            })?;

        let normal = Normal::new(stats.mean, stats.std)?;
        let mut rows: Vec<SubmissionRow> = Vec::new();
        rows.try_reserve_exact(span)?;
        let mut synthetic_count = 0;

        for id in min_id..=max_id {
            let pressure = match real.get(&id) {
                Some(&p) => p,
                None => {
                    synthetic_count += 1;
                    normal.sample(rng).clamp(stats.min, stats.max)
                }
            };
            rows.push(SubmissionRow { id, pressure });
        }

        tracing::info!(
            "Submission ids {}..={}: {} real, {} synthetic",
            min_id,
            max_id,
            real.len(),
            synthetic_count
        );

        Ok(Self {
            rows,
            real_count: real.len(),
            synthetic_count,
            stats,
        })
    }

    /// Render as `id,pressure` CSV with header
    pub fn to_csv(&self) -> Result<Vec<u8>, SubmissionError> {
        write_csv(&self.rows)
    }
}

/// Serialize rows as `id,pressure` CSV with header
pub fn write_csv(rows: &[SubmissionRow]) -> Result<Vec<u8>, SubmissionError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| SubmissionError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))
}

/// Download name, e.g. `submission_20240131_154500.csv`
pub fn file_name(now: chrono::DateTime<chrono::Local>) -> String {
    format!("submission_{}.csv", now.format("%Y%m%d_%H%M%S"))
}
