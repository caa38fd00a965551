//! Gradient boosted trees on squared error

use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use super::tree::{RegressionTree, TreeParams};
use super::{check_fit_input, ModelError, Regressor};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingConfig {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub tree: TreeParams,
}

impl Default for GradientBoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            tree: TreeParams {
                max_depth: 5,
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoosting {
    config: GradientBoostingConfig,
    init: f64,
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl GradientBoosting {
    pub fn new(config: GradientBoostingConfig) -> Self {
        Self {
            config,
            init: 0.0,
            trees: Vec::new(),
            n_features: 0,
        }
    }

    pub fn stage_count(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for GradientBoosting {
    fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<(), ModelError> {
        check_fit_input(x, y)?;
        let n = x.nrows();
        let lr = self.config.learning_rate;

        self.init = y.sum() / n as f64;
        self.trees.clear();

        let mut current = Array1::from_elem(n, self.init);
        let all: Vec<usize> = (0..n).collect();

        for stage in 0..self.config.n_estimators {
            // Negative gradient of squared error
            let residual = &y - &current;

            let mut tree = RegressionTree::new(self.config.tree);
            tree.fit(x, residual.view(), &all);

            for (i, row) in x.rows().into_iter().enumerate() {
                current[i] += lr * tree.predict_row(row);
            }
            self.trees.push(tree);

            if (stage + 1) % 10 == 0 {
                let loss = (&y - &current).mapv(|r| r * r).sum() / n as f64;
                tracing::debug!("Stage {}/{} train loss {:.4}", stage + 1, self.config.n_estimators, loss);
            }
        }

        self.n_features = x.ncols();
        Ok(())
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(ModelError::ShapeMismatch {
                expected: self.n_features,
                got: x.ncols(),
            });
        }

        let lr = self.config.learning_rate;
        Ok(x.rows()
            .into_iter()
            .map(|row| self.init + lr * self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>())
            .collect())
    }

    fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    fn name(&self) -> &'static str {
        "gradient_boosting"
    }
}
