//! Seeded train/test partitioning

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{PipelineError, Result};

/// Row indices of the two partitions.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Shuffle `0..n` with a fixed seed; the first `ceil(n * test_fraction)`
/// indices form the test set and the rest the training set.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> Result<TrainTestSplit> {
    let n_test = (n as f64 * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(PipelineError::NotEnoughRows {
            needed: 2,
            actual: n,
        });
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train_indices = indices.split_off(n_test);
    Ok(TrainTestSplit {
        train_indices,
        test_indices: indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_split_sizes_and_disjoint() {
        let split = train_test_split(10, 0.2, 42).unwrap();
        assert_eq!(split.test_indices.len(), 2);
        assert_eq!(split.train_indices.len(), 8);

        let all: HashSet<usize> = split
            .train_indices
            .iter()
            .chain(&split.test_indices)
            .copied()
            .collect();
        assert_eq!(all.len(), 10);
    }

    #[test]
    fn test_split_rounds_test_size_up() {
        let split = train_test_split(11, 0.2, 42).unwrap();
        assert_eq!(split.test_indices.len(), 3);
    }

    #[test]
    fn test_split_is_deterministic() {
        assert_eq!(
            train_test_split(50, 0.2, 7).unwrap(),
            train_test_split(50, 0.2, 7).unwrap()
        );
        assert_ne!(
            train_test_split(50, 0.2, 7).unwrap(),
            train_test_split(50, 0.2, 8).unwrap()
        );
    }

    #[test]
    fn test_split_too_small() {
        assert!(train_test_split(1, 0.2, 42).is_err());
        assert!(train_test_split(0, 0.2, 42).is_err());
    }
}
