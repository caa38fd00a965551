//! Standard scaler - zero mean, unit variance per feature column

use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use super::ModelError;

/// Fitted column statistics.
///
/// Fit once on training features, then reused unmodified for inference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Option<Array1<f64>>,
    scale: Option<Array1<f64>>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute per-column mean and population standard deviation.
    /// Constant columns get a scale of 1.
    pub fn fit(&mut self, x: ArrayView2<f64>) -> Result<(), ModelError> {
        let mean = x
            .mean_axis(Axis(0))
            .ok_or(ModelError::InsufficientData(x.nrows()))?;
        let scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 0.0 && s.is_finite() { s } else { 1.0 });

        self.mean = Some(mean);
        self.scale = Some(scale);
        Ok(())
    }

    pub fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, ModelError> {
        let (mean, scale) = match (&self.mean, &self.scale) {
            (Some(m), Some(s)) => (m, s),
            _ => return Err(ModelError::NotFitted),
        };

        if x.ncols() != mean.len() {
            return Err(ModelError::ShapeMismatch {
                expected: mean.len(),
                got: x.ncols(),
            });
        }

        let mut out = x.to_owned();
        out -= mean;
        out /= scale;
        Ok(out)
    }

    pub fn fit_transform(&mut self, x: ArrayView2<f64>) -> Result<Array2<f64>, ModelError> {
        self.fit(x)?;
        self.transform(x)
    }

    pub fn is_fitted(&self) -> bool {
        self.mean.is_some()
    }

    /// Width the scaler was fit on
    pub fn n_features(&self) -> Option<usize> {
        self.mean.as_ref().map(|m| m.len())
    }
}
