//! Random forest regressor - bagged regression trees

use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::tree::{RegressionTree, TreeParams};
use super::{check_fit_input, ModelError, Regressor};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RandomForestConfig {
    pub n_estimators: usize,
    pub tree: TreeParams,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for RandomForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            tree: TreeParams {
                max_depth: 15,
                ..Default::default()
            },
            bootstrap: true,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    config: RandomForestConfig,
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl RandomForest {
    pub fn new(config: RandomForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            n_features: 0,
        }
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for RandomForest {
    fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<(), ModelError> {
        check_fit_input(x, y)?;
        let n = x.nrows();
        let config = self.config;

        // One seed per tree, drawn before the parallel fit
        let mut master = StdRng::seed_from_u64(config.seed);
        let seeds: Vec<u64> = (0..config.n_estimators).map(|_| master.gen()).collect();

        self.trees = seeds
            .into_par_iter()
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let samples: Vec<usize> = if config.bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };

                let mut tree = RegressionTree::new(config.tree);
                tree.fit(x, y, &samples);
                tree
            })
            .collect();

        tracing::debug!("Built {} trees on {} samples", self.trees.len(), n);

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

        let n_trees = self.trees.len() as f64;
        Ok(x.rows()
            .into_iter()
            .map(|row| self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / n_trees)
            .collect())
    }

    fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    fn name(&self) -> &'static str {
        "random_forest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    fn linear_data(n: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| if j == 0 { i as f64 } else { (i % 3) as f64 });
        let y = Array1::from_shape_fn(n, |i| 2.0 * i as f64 + 1.0);
        (x, y)
    }

    fn small_config(seed: u64) -> RandomForestConfig {
        RandomForestConfig {
            n_estimators: 10,
            seed,
            ..Default::default()
        }
    }

    #[test]
    fn test_fits_monotone_signal() {
        let (x, y) = linear_data(200);
        let mut forest = RandomForest::new(small_config(42));
        forest.fit(x.view(), y.view()).unwrap();

        assert_eq!(forest.tree_count(), 10);
        let pred = forest.predict(x.view()).unwrap();
        let mae = (&pred - &y).mapv(f64::abs).mean().unwrap();
        assert!(mae < 5.0, "mae = {}", mae);
    }

    #[test]
    fn test_same_seed_same_predictions() {
        let (x, y) = linear_data(100);
        let mut a = RandomForest::new(small_config(7));
        let mut b = RandomForest::new(small_config(7));
        a.fit(x.view(), y.view()).unwrap();
        b.fit(x.view(), y.view()).unwrap();

        assert_eq!(a.predict(x.view()).unwrap(), b.predict(x.view()).unwrap());
    }

    #[test]
    fn test_thread_count_does_not_change_model() {
        let (x, y) = linear_data(80);
        let mut parallel = RandomForest::new(small_config(5));
        parallel.fit(x.view(), y.view()).unwrap();

        let pool = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
        let mut serial = RandomForest::new(small_config(5));
        pool.install(|| serial.fit(x.view(), y.view())).unwrap();

        assert_eq!(parallel, serial);
    }

    #[test]
    fn test_predict_before_fit() {
        let forest = RandomForest::new(small_config(1));
        let x = Array2::<f64>::zeros((1, 2));
        assert!(matches!(forest.predict(x.view()), Err(ModelError::NotFitted)));
        assert!(!forest.is_fitted());
    }

    #[test]
    fn test_width_mismatch() {
        let (x, y) = linear_data(20);
        let mut forest = RandomForest::new(small_config(1));
        forest.fit(x.view(), y.view()).unwrap();

        let wrong = Array2::<f64>::zeros((1, 3));
        assert!(matches!(
            forest.predict(wrong.view()),
            Err(ModelError::ShapeMismatch { expected: 2, got: 3 })
        ));
    }
}
