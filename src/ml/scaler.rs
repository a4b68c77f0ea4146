//! Standardization (z-score) fitted on training data

use ndarray::{Array1, Array2, Axis};

use crate::error::{PipelineError, Result};

/// Per-feature `(x - mean) / std`, with population std and a unit scale
/// for constant features.
#[derive(Debug, Clone, Default)]
pub struct StandardScaler {
    mean: Option<Array1<f64>>,
    scale: Option<Array1<f64>>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        if x.nrows() == 0 {
            return Err(PipelineError::EmptyData("no rows to fit the scaler".into()));
        }
        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| PipelineError::EmptyData("no rows to fit the scaler".into()))?;
        let scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s == 0.0 || !s.is_finite() { 1.0 } else { s });

        self.mean = Some(mean);
        self.scale = Some(scale);
        Ok(self)
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (Some(mean), Some(scale)) = (&self.mean, &self.scale) else {
            return Err(PipelineError::ModelNotFitted);
        };
        if x.ncols() != mean.len() {
            return Err(PipelineError::ShapeError {
                expected: format!("{} features", mean.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok((x - mean) / scale)
    }

    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_train_is_standardized() {
        let x = array![[1.0, 10.0], [2.0, 10.0], [3.0, 10.0]];
        let mut scaler = StandardScaler::new();
        let z = scaler.fit_transform(&x).unwrap();

        let col = z.column(0);
        assert_abs_diff_eq!(col.mean().unwrap(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(col.std(0.0), 1.0, epsilon = 1e-12);
        // Constant feature is centred but not divided by zero.
        assert_abs_diff_eq!(z[[0, 1]], 0.0);
    }

    #[test]
    fn test_test_uses_train_statistics() {
        let train = array![[0.0], [2.0]];
        let test = array![[4.0]];
        let mut scaler = StandardScaler::new();
        scaler.fit(&train).unwrap();
        let z = scaler.transform(&test).unwrap();
        assert_abs_diff_eq!(z[[0, 0]], 3.0);
    }

    #[test]
    fn test_unfitted_and_shape_errors() {
        let scaler = StandardScaler::new();
        assert_eq!(
            scaler.transform(&array![[1.0]]).unwrap_err(),
            PipelineError::ModelNotFitted
        );

        let mut scaler = StandardScaler::new();
        scaler.fit(&array![[1.0, 2.0]]).unwrap();
        assert!(scaler.transform(&array![[1.0]]).is_err());
    }
}
