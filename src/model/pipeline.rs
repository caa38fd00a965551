//! Training and prediction pipeline
//!
//! features -> scaler -> ensemble regressor, with a seeded hold-out split
//! for validation metrics.

use std::time::Instant;

use chrono::{DateTime, Utc};
use ndarray::{Array1, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::metrics::{mae, rmse};
use super::{Ensemble, ModelError, ModelKind, Regressor, StandardScaler};
use crate::dataset::Dataset;
use crate::features::{FeatureMatrix, LayoutInfo};

/// Knobs for a training run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainOptions {
    pub kind: ModelKind,
    /// Share of samples held out for validation, in (0, 1)
    pub validation_split: f64,
    pub seed: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            kind: ModelKind::Fast,
            validation_split: 0.2,
            seed: 42,
        }
    }
}

/// Outcome of a training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainReport {
    pub samples: usize,
    pub breaths: usize,
    pub features: usize,
    pub train_samples: usize,
    pub val_samples: usize,
    pub train_mae: f64,
    pub val_mae: f64,
    pub train_rmse: f64,
    pub val_rmse: f64,
    pub training_secs: f64,
}

impl TrainReport {
    /// Validation error noticeably worse than training error
    pub fn looks_overfit(&self) -> bool {
        self.val_mae > self.train_mae * 1.5
    }
}

/// Fitted regressor plus the scaler it was trained behind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VentilatorModel {
    pub(crate) kind: ModelKind,
    pub(crate) layout: LayoutInfo,
    pub(crate) scaler: StandardScaler,
    pub(crate) regressor: Ensemble,
    pub(crate) trained_at: DateTime<Utc>,
}

/// Split `n` shuffled indices into (train, validation).
/// Validation size is `ceil(n * split)`; both sides must be non-empty.
pub fn train_val_split(n: usize, split: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>), ModelError> {
    let n_val = (n as f64 * split).ceil() as usize;
    if n < 2 || n_val == 0 || n_val >= n {
        return Err(ModelError::InsufficientData(n));
    }

    let mut idx: Vec<usize> = (0..n).collect();
    idx.shuffle(&mut StdRng::seed_from_u64(seed));
    let train = idx.split_off(n_val);
    Ok((train, idx))
}

impl VentilatorModel {
    /// Fit a new model on a dataset that carries `pressure`
    pub fn train(dataset: &Dataset, opts: &TrainOptions) -> Result<(Self, TrainReport), ModelError> {
        dataset.ensure_trainable()?;

        tracing::info!("Training {} model on {} rows", opts.kind, dataset.len());

        let fm = FeatureMatrix::from_dataset(dataset);
        let targets = fm.targets.as_ref().ok_or(ModelError::NoTargets)?;

        let (train_idx, val_idx) = train_val_split(fm.len(), opts.validation_split, opts.seed)?;
        tracing::info!(
            "Split: {} training / {} validation samples, {} features",
            train_idx.len(),
            val_idx.len(),
            fm.values.ncols()
        );

        let x_train = fm.values.select(Axis(0), &train_idx);
        let x_val = fm.values.select(Axis(0), &val_idx);
        let y_train = targets.select(Axis(0), &train_idx);
        let y_val = targets.select(Axis(0), &val_idx);

        let mut scaler = StandardScaler::new();
        let x_train = scaler.fit_transform(x_train.view())?;
        let x_val = scaler.transform(x_val.view())?;

        let started = Instant::now();
        let mut regressor = Ensemble::new(opts.kind, opts.seed);
        regressor.fit(x_train.view(), y_train.view())?;
        let training_secs = started.elapsed().as_secs_f64();

        let train_pred = regressor.predict(x_train.view())?;
        let val_pred = regressor.predict(x_val.view())?;

        let report = TrainReport {
            samples: fm.len(),
            breaths: fm.breaths,
            features: fm.values.ncols(),
            train_samples: train_idx.len(),
            val_samples: val_idx.len(),
            train_mae: mae(slice(&train_pred), slice(&y_train)),
            val_mae: mae(slice(&val_pred), slice(&y_val)),
            train_rmse: rmse(slice(&train_pred), slice(&y_train)),
            val_rmse: rmse(slice(&val_pred), slice(&y_val)),
            training_secs,
        };

        tracing::info!(
            "Trained in {:.2}s: train MAE {:.4} RMSE {:.4}, validation MAE {:.4} RMSE {:.4}",
            report.training_secs,
            report.train_mae,
            report.train_rmse,
            report.val_mae,
            report.val_rmse
        );
        if report.looks_overfit() {
            tracing::warn!(
                "Possible overfitting: validation MAE is {:.2}x training MAE",
                report.val_mae / report.train_mae
            );
        }

        let model = Self {
            kind: opts.kind,
            layout: LayoutInfo::current(),
            scaler,
            regressor,
            trained_at: Utc::now(),
        };
        Ok((model, report))
    }

    /// Predict pressure for every row, returned in input row order
    pub fn predict(&self, dataset: &Dataset) -> Result<Vec<f64>, ModelError> {
        let fm = FeatureMatrix::from_dataset(dataset);
        let raw = self.predict_features(&fm)?;
        let ordered = fm.scatter_to_input_order(slice(&raw));

        if let Some((lo, hi)) = min_max(&ordered) {
            tracing::info!("{} predictions, range [{:.2}, {:.2}]", ordered.len(), lo, hi);
        }
        Ok(ordered)
    }

    /// Predict in feature-matrix order
    pub fn predict_features(&self, fm: &FeatureMatrix) -> Result<Array1<f64>, ModelError> {
        if fm.is_empty() {
            return Ok(Array1::zeros(0));
        }
        let scaled = self.scaler.transform(fm.values.view())?;
        self.regressor.predict(scaled.view())
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    pub fn layout(&self) -> &LayoutInfo {
        &self.layout
    }
}

fn slice(a: &Array1<f64>) -> &[f64] {
    a.as_slice().unwrap_or(&[])
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let lo = values.iter().copied().reduce(f64::min)?;
    let hi = values.iter().copied().reduce(f64::max)?;
    Some((lo, hi))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::dataset::BreathRow;

    /// Small synthetic training set: pressure follows the valve input
    pub(crate) fn synthetic_dataset(breaths: u64, steps: u64) -> Dataset {
        let mut rows = Vec::new();
        let mut id = 1;
        for b in 0..breaths {
            let r = [5.0, 20.0, 50.0][(b % 3) as usize];
            let c = [10.0, 20.0, 50.0][(b % 3) as usize];
            for s in 0..steps {
                let u_in = ((s * 7 + b * 3) % 25) as f64;
                let u_out = if s >= steps / 2 { 1.0 } else { 0.0 };
                rows.push(BreathRow {
                    id,
                    breath_id: b + 1,
                    r,
                    c,
                    time_step: s as f64 * 0.033,
                    u_in,
                    u_out,
                    pressure: Some(5.0 + 0.3 * u_in + 0.05 * r - 2.0 * u_out),
                });
                id += 1;
            }
        }
        Dataset::new(rows)
    }

    fn quick_options(kind: ModelKind) -> TrainOptions {
        TrainOptions {
            kind,
            ..Default::default()
        }
    }

    #[test]
    fn test_split_sizes() {
        let (train, val) = train_val_split(10, 0.2, 42).unwrap();
        assert_eq!(train.len(), 8);
        assert_eq!(val.len(), 2);

        let mut all: Vec<usize> = train.iter().chain(val.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());

        assert!(train_val_split(1, 0.2, 42).is_err());
        assert!(train_val_split(5, 0.0, 42).is_err());
    }

    #[test]
    fn test_train_forest_reports_metrics() {
        let ds = synthetic_dataset(12, 20);
        let (model, report) = VentilatorModel::train(&ds, &quick_options(ModelKind::Fast)).unwrap();

        assert_eq!(report.samples, 240);
        assert_eq!(report.breaths, 12);
        assert_eq!(report.features, 9);
        assert_eq!(report.val_samples, 48);
        assert!(report.val_mae < 2.0, "val mae {}", report.val_mae);
        assert_eq!(model.kind(), ModelKind::Fast);
        assert!(model.layout().is_current());
    }

    #[test]
    fn test_train_boosting() {
        let ds = synthetic_dataset(6, 20);
        let (model, report) = VentilatorModel::train(&ds, &quick_options(ModelKind::Accurate)).unwrap();
        assert_eq!(model.kind(), ModelKind::Accurate);
        assert!(report.train_mae.is_finite());
    }

    #[test]
    fn test_training_is_deterministic() {
        let ds = synthetic_dataset(6, 15);
        let opts = quick_options(ModelKind::Fast);
        let (a, _) = VentilatorModel::train(&ds, &opts).unwrap();
        let (b, _) = VentilatorModel::train(&ds, &opts).unwrap();

        assert_eq!(a.predict(&ds).unwrap(), b.predict(&ds).unwrap());
    }

    #[test]
    fn test_predict_returns_input_order() {
        let ds = synthetic_dataset(4, 10);
        let (model, _) = VentilatorModel::train(&ds, &quick_options(ModelKind::Fast)).unwrap();
        let in_order = model.predict(&ds).unwrap();

        let mut reversed_rows = ds.rows().to_vec();
        reversed_rows.reverse();
        let reversed = model.predict(&Dataset::new(reversed_rows)).unwrap();

        let mut expected = in_order.clone();
        expected.reverse();
        assert_eq!(reversed, expected);
    }

    #[test]
    fn test_train_requires_pressure() {
        let mut ds = synthetic_dataset(2, 5);
        let rows: Vec<BreathRow> = ds
            .rows()
            .iter()
            .cloned()
            .map(|r| BreathRow { pressure: None, ..r })
            .collect();
        ds = Dataset::new(rows);

        let err = VentilatorModel::train(&ds, &TrainOptions::default()).unwrap_err();
        assert!(matches!(err, ModelError::Dataset(_)));
    }

    #[test]
    fn test_single_row_is_insufficient() {
        let ds = synthetic_dataset(1, 1);
        let err = VentilatorModel::train(&ds, &TrainOptions::default()).unwrap_err();
        assert!(matches!(err, ModelError::InsufficientData(1)));
    }

    #[test]
    fn test_predict_empty_dataset() {
        let ds = synthetic_dataset(3, 5);
        let (model, _) = VentilatorModel::train(&ds, &TrainOptions::default()).unwrap();
        assert!(model.predict(&Dataset::default()).unwrap().is_empty());
    }
}
