//! Model Module - pressure regressor, scaler and persisted artifact
//!
//! The regressor is chosen by configuration: `fast` is a random forest,
//! `accurate` is gradient boosting. Both are driven through [`Regressor`].

pub mod artifact;
pub mod boosting;
pub mod forest;
pub mod metrics;
pub mod pipeline;
pub mod scaler;
pub mod tree;

use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

pub use boosting::{GradientBoosting, GradientBoostingConfig};
pub use forest::{RandomForest, RandomForestConfig};
pub use pipeline::{TrainOptions, TrainReport, VentilatorModel};
pub use scaler::StandardScaler;

use crate::dataset::DatasetError;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model is not fitted")]
    NotFitted,

    #[error("feature width mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("not enough samples to train ({0})")]
    InsufficientData(usize),

    #[error("dataset has no target values")]
    NoTargets,

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("artifact I/O on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact encoding: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("artifact was trained with feature layout {found:08x}, current is {expected:08x}")]
    LayoutMismatch { expected: u32, found: u32 },
}

/// Supervised tabular regression
pub trait Regressor {
    fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<(), ModelError>;
    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ModelError>;
    fn is_fitted(&self) -> bool;
    fn name(&self) -> &'static str;
}

pub(crate) fn check_fit_input(x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<(), ModelError> {
    if x.nrows() == 0 {
        return Err(ModelError::InsufficientData(0));
    }
    if x.nrows() != y.len() {
        return Err(ModelError::ShapeMismatch {
            expected: x.nrows(),
            got: y.len(),
        });
    }
    Ok(())
}

/// Algorithm family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Random forest, 100 trees, depth 15
    #[default]
    Fast,
    /// Gradient boosting, 100 stages, depth 5
    Accurate,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Fast => "fast",
            ModelKind::Accurate => "accurate",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" | "random_forest" | "rf" => Ok(ModelKind::Fast),
            "accurate" | "gradient_boosting" | "gbr" => Ok(ModelKind::Accurate),
            other => Err(format!("unknown model type: {}", other)),
        }
    }
}

/// Concrete regressor held by a trained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Ensemble {
    Forest(RandomForest),
    Boosting(GradientBoosting),
}

impl Ensemble {
    pub fn new(kind: ModelKind, seed: u64) -> Self {
        match kind {
            ModelKind::Fast => Ensemble::Forest(RandomForest::new(RandomForestConfig {
                seed,
                ..Default::default()
            })),
            ModelKind::Accurate => Ensemble::Boosting(GradientBoosting::new(GradientBoostingConfig::default())),
        }
    }

    fn inner(&self) -> &dyn Regressor {
        match self {
            Ensemble::Forest(m) => m,
            Ensemble::Boosting(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Regressor {
        match self {
            Ensemble::Forest(m) => m,
            Ensemble::Boosting(m) => m,
        }
    }
}

impl Regressor for Ensemble {
    fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<(), ModelError> {
        self.inner_mut().fit(x, y)
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ModelError> {
        self.inner().predict(x)
    }

    fn is_fitted(&self) -> bool {
        self.inner().is_fitted()
    }

    fn name(&self) -> &'static str {
        self.inner().name()
    }
}
