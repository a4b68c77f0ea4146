//! Random Forest implementation

use ndarray::{Array1, Array2, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use super::tree::{argmax, DecisionTree};
use crate::error::{PipelineError, Result};

/// Strategy for max features
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaxFeatures {
    /// Square root of n_features
    Sqrt,
    /// All features
    All,
}

/// Random Forest model
#[derive(Debug, Clone)]
pub struct RandomForest {
    /// Individual trees
    trees: Vec<DecisionTree>,
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth per tree
    pub max_depth: Option<usize>,
    /// Maximum features per split
    pub max_features: MaxFeatures,
    /// Bootstrap sampling
    pub bootstrap: bool,
    /// Random state
    pub random_state: Option<u64>,
    /// Is classification task
    is_classification: bool,
    /// Number of classes (classification)
    n_classes: usize,
    /// Number of features
    n_features: usize,
    /// Feature importances
    feature_importances: Option<Array1<f64>>,
}

impl RandomForest {
    /// Create a new classifier forest (targets are class indices)
    pub fn new_classifier(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            random_state: None,
            is_classification: true,
            n_classes: 0,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Create a new regressor forest
    pub fn new_regressor(n_estimators: usize) -> Self {
        Self {
            max_features: MaxFeatures::All,
            is_classification: false,
            ..Self::new_classifier(n_estimators)
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    fn compute_max_features(&self, n_features: usize) -> usize {
        match self.max_features {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::All => n_features,
        }
        .max(1)
    }

    /// Fit the forest to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(PipelineError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(PipelineError::EmptyData("no training rows".into()));
        }

        self.n_features = n_features;
        let max_features = self.compute_max_features(n_features);
        if self.is_classification {
            self.n_classes = y.iter().fold(0.0f64, |m, &v| m.max(v)) as usize + 1;
        }

        // Build trees in parallel
        let base_seed = self.random_state.unwrap_or(42);

        let trees: Vec<DecisionTree> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| -> Result<DecisionTree> {
                let seed = base_seed.wrapping_add(tree_idx as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);

                // Bootstrap sample
                let sample_indices: Vec<usize> = if self.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };

                let x_boot = x.select(Axis(0), &sample_indices);
                let y_boot: Array1<f64> = sample_indices.iter().map(|&i| y[i]).collect();

                let mut tree = if self.is_classification {
                    DecisionTree::new_classifier(self.n_classes)
                } else {
                    DecisionTree::new_regressor()
                }
                .with_max_depth(self.max_depth)
                .with_max_features(max_features)
                .with_random_state(rng.gen());

                tree.fit(&x_boot, &y_boot)?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        self.trees = trees;
        self.compute_feature_importances();

        Ok(self)
    }

    fn compute_feature_importances(&mut self) {
        if self.trees.is_empty() {
            return;
        }

        let mut total = Array1::<f64>::zeros(self.n_features);
        for imp in self.trees.iter().filter_map(|t| t.feature_importances()) {
            total += imp;
        }
        let sum = total.sum();
        if sum > 0.0 {
            total /= sum;
        }
        self.feature_importances = Some(total);
    }

    /// Make predictions: averaged class distributions (argmax) for
    /// classification, mean of tree outputs for regression.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(PipelineError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(PipelineError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        if !self.is_classification {
            let mut sum = Array1::<f64>::zeros(x.nrows());
            for tree in &self.trees {
                sum += &tree.predict(x)?;
            }
            return Ok(sum / self.trees.len() as f64);
        }

        x.rows()
            .into_iter()
            .map(|row| -> Result<f64> {
                let mut proba = vec![0.0; self.n_classes];
                for tree in &self.trees {
                    for (p, d) in proba.iter_mut().zip(tree.predict_distribution(row)?) {
                        *p += d;
                    }
                }
                Ok(argmax(&proba) as f64)
            })
            .collect()
    }

    /// Get feature importances (normalized to sum to one)
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;

    fn blobs() -> (Array2<f64>, Array1<f64>) {
        // Two well separated groups along both features.
        let n = 40;
        let x = Array::from_shape_fn((n, 2), |(i, j)| {
            let base = if i < n / 2 { 0.0 } else { 10.0 };
            base + ((i * 7 + j * 3) % 5) as f64 * 0.1
        });
        let y = Array::from_shape_fn(n, |i| if i < n / 2 { 0.0 } else { 1.0 });
        (x, y)
    }

    #[test]
    fn test_classifier_separable() {
        let (x, y) = blobs();
        let mut rf = RandomForest::new_classifier(10).with_random_state(42);
        rf.fit(&x, &y).unwrap();

        assert_eq!(rf.n_trees(), 10);
        let predictions = rf.predict(&x).unwrap();
        let correct = predictions
            .iter()
            .zip(y.iter())
            .filter(|(p, a)| (*p - *a).abs() < 0.5)
            .count();
        assert_eq!(correct, y.len());
    }

    #[test]
    fn test_regressor_linear_target() {
        let x = Array::from_shape_fn((50, 1), |(i, _)| i as f64);
        let y = Array::from_shape_fn(50, |i| 3.0 * i as f64 + 1.0);

        let mut rf = RandomForest::new_regressor(20).with_random_state(1);
        rf.fit(&x, &y).unwrap();

        let predictions = rf.predict(&x).unwrap();
        let mse: f64 = predictions
            .iter()
            .zip(y.iter())
            .map(|(p, a)| (p - a).powi(2))
            .sum::<f64>()
            / y.len() as f64;
        assert!(mse < 25.0, "MSE too high: {}", mse);
    }

    #[test]
    fn test_deterministic_with_seed() {
        let (x, y) = blobs();
        let mut a = RandomForest::new_classifier(5).with_random_state(3);
        let mut b = RandomForest::new_classifier(5).with_random_state(3);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.feature_importances(), b.feature_importances());
    }

    #[test]
    fn test_importances_sum_to_one() {
        let (x, y) = blobs();
        let mut rf = RandomForest::new_classifier(5).with_random_state(0);
        rf.fit(&x, &y).unwrap();
        let total: f64 = rf.feature_importances().unwrap().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_predict_before_fit() {
        let rf = RandomForest::new_regressor(3);
        assert_eq!(
            rf.predict(&Array2::zeros((1, 1))).unwrap_err(),
            PipelineError::ModelNotFitted
        );
    }
}
