//! CART decision tree used as the forest's base learner

use ndarray::{Array1, Array2, ArrayView1};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{PipelineError, Result};

/// Decision tree node
#[derive(Debug, Clone)]
pub enum TreeNode {
    /// Leaf node with prediction value
    Leaf {
        /// Mean target (regression) or most frequent class index (classification)
        value: f64,
        /// Class frequencies, empty for regression
        distribution: Vec<f64>,
    },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// Impurity criterion
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Criterion {
    /// Gini impurity (classification)
    Gini,
    /// Mean squared error (regression)
    MSE,
}

/// Decision tree model.
///
/// Classification targets must be class indices `0..n_classes` stored as `f64`.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features drawn at random per split (all when `None`)
    pub max_features: Option<usize>,
    pub criterion: Criterion,
    pub random_state: u64,
    n_features: usize,
    n_classes: usize,
    feature_importances: Option<Array1<f64>>,
}

/// Per-node working state for the recursive build.
struct Builder<'a> {
    x: &'a Array2<f64>,
    y: &'a Array1<f64>,
    rng: ChaCha8Rng,
    importances: Vec<f64>,
}

impl DecisionTree {
    /// Create a new classifier tree over `n_classes` class indices
    pub fn new_classifier(n_classes: usize) -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            criterion: Criterion::Gini,
            random_state: 0,
            n_features: 0,
            n_classes,
            feature_importances: None,
        }
    }

    /// Create a new regressor tree
    pub fn new_regressor() -> Self {
        Self {
            criterion: Criterion::MSE,
            ..Self::new_classifier(0)
        }
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    fn is_classification(&self) -> bool {
        self.criterion == Criterion::Gini
    }

    /// Fit the tree to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(PipelineError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(PipelineError::EmptyData("no training rows".into()));
        }
        if self.is_classification() {
            let max_class = y.iter().fold(0.0f64, |m, &v| m.max(v)) as usize;
            self.n_classes = self.n_classes.max(max_class + 1);
        }

        self.n_features = x.ncols();
        let mut builder = Builder {
            x,
            y,
            rng: ChaCha8Rng::seed_from_u64(self.random_state),
            importances: vec![0.0; self.n_features],
        };

        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build_tree(&mut builder, indices, 0));

        // Normalize feature importances
        let mut importances = builder.importances;
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(self)
    }

    fn build_tree(&self, b: &mut Builder<'_>, indices: Vec<usize>, depth: usize) -> TreeNode {
        let n_samples = indices.len();
        let stats = self.node_stats(b.y, &indices);

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.is_some_and(|d| depth >= d)
            || is_pure(b.y, &indices);

        if !should_stop {
            if let Some((feature_idx, threshold, gain)) = self.find_best_split(b, &indices, &stats) {
                b.importances[feature_idx] += n_samples as f64 * gain;

                let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| b.x[[i, feature_idx]] <= threshold);

                let left = Box::new(self.build_tree(b, left_indices, depth + 1));
                let right = Box::new(self.build_tree(b, right_indices, depth + 1));

                return TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                };
            }
        }

        stats.into_leaf()
    }

    /// Best `(feature, threshold, gain)` among a random subset of features,
    /// scanning each feature's sorted values once.
    fn find_best_split(
        &self,
        b: &mut Builder<'_>,
        indices: &[usize],
        parent: &NodeStats,
    ) -> Option<(usize, f64, f64)> {
        let n_features = self.n_features;
        let n_try = self.max_features.unwrap_or(n_features).clamp(1, n_features.max(1));
        let candidates: Vec<usize> = if n_try < n_features {
            rand::seq::index::sample(&mut b.rng, n_features, n_try).into_vec()
        } else {
            (0..n_features).collect()
        };

        let parent_impurity = parent.impurity();
        let n = indices.len() as f64;
        let mut best: Option<(usize, f64, f64)> = None;
        let mut sorted = indices.to_vec();

        for feature_idx in candidates {
            sorted.sort_by(|&a, &c| b.x[[a, feature_idx]].total_cmp(&b.x[[c, feature_idx]]));

            let mut left = self.empty_stats();
            let mut right = parent.clone();

            for pos in 0..sorted.len() - 1 {
                let yi = b.y[sorted[pos]];
                left.add(yi);
                right.remove(yi);

                let here = b.x[[sorted[pos], feature_idx]];
                let next = b.x[[sorted[pos + 1], feature_idx]];
                if here >= next {
                    continue;
                }
                if left.count < self.min_samples_leaf || right.count < self.min_samples_leaf {
                    continue;
                }

                let weighted = (left.count as f64 * left.impurity()
                    + right.count as f64 * right.impurity())
                    / n;
                let gain = parent_impurity - weighted;
                match best {
                    Some((_, _, best_gain)) if gain <= best_gain => {}
                    _ => {
                        // Adjacent floats can round the midpoint up to `next`.
                        let mid = (here + next) / 2.0;
                        let threshold = if mid < next { mid } else { here };
                        best = Some((feature_idx, threshold, gain));
                    }
                }
            }
        }

        best
    }

    fn empty_stats(&self) -> NodeStats {
        NodeStats {
            count: 0,
            sum: 0.0,
            sq_sum: 0.0,
            class_counts: if self.is_classification() {
                vec![0; self.n_classes]
            } else {
                Vec::new()
            },
        }
    }

    fn node_stats(&self, y: &Array1<f64>, indices: &[usize]) -> NodeStats {
        let mut stats = self.empty_stats();
        for &i in indices {
            stats.add(y[i]);
        }
        stats
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(PipelineError::ModelNotFitted)?;
        Ok(x.rows().into_iter().map(|row| leaf_for(root, row).0).collect())
    }

    /// Class frequencies at the leaf reached by `row` (classification only).
    pub fn predict_distribution(&self, row: ArrayView1<'_, f64>) -> Result<&[f64]> {
        let root = self.root.as_ref().ok_or(PipelineError::ModelNotFitted)?;
        Ok(leaf_for(root, row).1)
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Get tree depth
    #[cfg(test)]
    pub fn get_depth(&self) -> usize {
        fn node_depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
            }
        }
        self.root.as_ref().map_or(0, node_depth)
    }
}

fn leaf_for<'t>(mut node: &'t TreeNode, row: ArrayView1<'_, f64>) -> (f64, &'t [f64]) {
    loop {
        match node {
            TreeNode::Leaf {
                value,
                distribution,
            } => return (*value, distribution.as_slice()),
            TreeNode::Split {
                feature_idx,
                threshold,
                left,
                right,
            } => {
                node = if row[*feature_idx] <= *threshold {
                    left.as_ref()
                } else {
                    right.as_ref()
                };
            }
        }
    }
}

/// Running sums that give impurity in O(1) as samples move between sides.
#[derive(Debug, Clone)]
struct NodeStats {
    count: usize,
    sum: f64,
    sq_sum: f64,
    /// Empty for regression
    class_counts: Vec<usize>,
}

impl NodeStats {
    fn add(&mut self, y: f64) {
        self.count += 1;
        self.sum += y;
        self.sq_sum += y * y;
        if let Some(c) = self.class_counts.get_mut(y as usize) {
            *c += 1;
        }
    }

    fn remove(&mut self, y: f64) {
        self.count -= 1;
        self.sum -= y;
        self.sq_sum -= y * y;
        if let Some(c) = self.class_counts.get_mut(y as usize) {
            *c -= 1;
        }
    }

    fn impurity(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let n = self.count as f64;
        if self.class_counts.is_empty() {
            // Var = E[X²] - E[X]²
            (self.sq_sum / n - (self.sum / n).powi(2)).max(0.0)
        } else {
            1.0 - self
                .class_counts
                .iter()
                .map(|&c| (c as f64 / n).powi(2))
                .sum::<f64>()
        }
    }

    fn into_leaf(self) -> TreeNode {
        let n = self.count.max(1) as f64;
        if self.class_counts.is_empty() {
            return TreeNode::Leaf {
                value: self.sum / n,
                distribution: Vec::new(),
            };
        }
        let distribution: Vec<f64> = self.class_counts.iter().map(|&c| c as f64 / n).collect();
        TreeNode::Leaf {
            value: argmax(&distribution) as f64,
            distribution,
        }
    }
}

fn is_pure(y: &Array1<f64>, indices: &[usize]) -> bool {
    match indices.first() {
        None => true,
        Some(&first) => indices.iter().all(|&i| y[i] == y[first]),
    }
}

/// Index of the first maximum.
pub fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(bi, bv), (i, &v)| if v > bv { (i, v) } else { (bi, bv) })
        .0
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_classifier_learns_xor() {
        let x = array![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
        let y = array![0.0, 1.0, 1.0, 0.0];

        let mut tree = DecisionTree::new_classifier(2);
        tree.fit(&x, &y).unwrap();

        assert_eq!(tree.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_regressor_fits_training_data() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![1.0, 2.0, 3.0, 4.0, 5.0];

        let mut tree = DecisionTree::new_regressor();
        tree.fit(&x, &y).unwrap();

        let predictions = tree.predict(&x).unwrap();
        let mse: f64 = predictions
            .iter()
            .zip(y.iter())
            .map(|(p, a)| (p - a).powi(2))
            .sum::<f64>()
            / y.len() as f64;
        assert!(mse < 1e-12, "MSE too high: {}", mse);
    }

    #[test]
    fn test_max_depth() {
        let x = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0]];
        let y = array![0.0, 1.0, 0.0, 1.0];

        let mut tree = DecisionTree::new_classifier(2).with_max_depth(Some(2));
        tree.fit(&x, &y).unwrap();

        assert!(tree.get_depth() <= 2);
    }

    #[test]
    fn test_feature_importances() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut tree = DecisionTree::new_classifier(2);
        tree.fit(&x, &y).unwrap();

        let importances = tree.feature_importances().unwrap();
        assert_eq!(importances[0], 1.0);
        assert_eq!(importances[1], 0.0);
    }

    #[test]
    fn test_leaf_distribution() {
        let x = array![[0.0], [0.0], [0.0]];
        let y = array![0.0, 1.0, 1.0];

        let mut tree = DecisionTree::new_classifier(2);
        tree.fit(&x, &y).unwrap();

        let dist = tree.predict_distribution(x.row(0)).unwrap();
        assert_eq!(dist.len(), 2);
        assert!((dist[1] - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(tree.predict(&x).unwrap()[0], 1.0);
    }

    #[test]
    fn test_unfitted_predict() {
        let tree = DecisionTree::new_regressor();
        assert!(tree.predict(&array![[1.0]]).is_err());
    }
}
