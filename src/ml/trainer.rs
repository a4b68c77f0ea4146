//! Dataset → feature matrix → fitted forest → scores

use std::collections::BTreeMap;
use std::fmt;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::forest::RandomForest;
use super::metrics::{classification_report, mean_squared_error, r2_score, ClassificationReport};
use super::scaler::StandardScaler;
use super::split::train_test_split;
use crate::config::Settings;
use crate::data::model::{CellValue, Column, Dataset};
use crate::error::{PipelineError, Result};

/// Which estimator family to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKind {
    Classification,
    Regression,
}

impl TaskKind {
    pub const ALL: [TaskKind; 2] = [TaskKind::Classification, TaskKind::Regression];
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Classification => write!(f, "Classification"),
            TaskKind::Regression => write!(f, "Regression"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scores {
    Classification(ClassificationReport),
    Regression { mse: f64, r2: f64 },
}

/// Everything the model section displays.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutcome {
    pub task: TaskKind,
    pub target: String,
    pub scores: Scores,
    /// `(actual, predicted)` per test row; class indices for classification.
    pub actual_vs_predicted: Vec<[f64; 2]>,
    /// Class labels indexed by class index (empty for regression).
    pub class_labels: Vec<String>,
    /// `(feature, importance)`, most important first.
    pub feature_importances: Vec<(String, f64)>,
    pub n_train: usize,
    pub n_test: usize,
}

/// Fit a random forest predicting `target` from every other column and
/// score it on a held-out split.
pub fn train_and_evaluate(
    dataset: &Dataset,
    target: &str,
    task: TaskKind,
    settings: &Settings,
) -> Result<ModelOutcome> {
    let target_col = dataset
        .column(target)
        .ok_or_else(|| PipelineError::UnknownColumn(target.to_string()))?;

    let features: Vec<&Column> = dataset.columns.iter().filter(|c| c.name != target).collect();
    if features.is_empty() {
        return Err(PipelineError::EmptyData("no feature columns besides the target".into()));
    }

    let x = feature_matrix(&features)?;
    let (y, class_labels) = match task {
        TaskKind::Regression => (regression_target(target_col)?, Vec::new()),
        TaskKind::Classification => classification_target(target_col)?,
    };

    let split = train_test_split(dataset.n_rows(), settings.test_fraction, settings.random_seed)?;
    let x_train = x.select(ndarray::Axis(0), &split.train_indices);
    let x_test = x.select(ndarray::Axis(0), &split.test_indices);
    let y_train: Array1<f64> = split.train_indices.iter().map(|&i| y[i]).collect();
    let y_test: Vec<f64> = split.test_indices.iter().map(|&i| y[i]).collect();

    let mut scaler = StandardScaler::new();
    let x_train = scaler.fit_transform(&x_train)?;
    let x_test = scaler.transform(&x_test)?;

    let forest = match task {
        TaskKind::Classification => RandomForest::new_classifier(settings.n_estimators),
        TaskKind::Regression => RandomForest::new_regressor(settings.n_estimators),
    };
    let mut forest = forest
        .with_max_depth(settings.max_depth)
        .with_random_state(settings.random_seed);

    log::info!(
        "Fitting {task} forest ({} trees) on {} rows x {} features, target '{target}'",
        settings.n_estimators,
        x_train.nrows(),
        x_train.ncols()
    );
    forest.fit(&x_train, &y_train)?;
    log::debug!("Fitted {} trees", forest.n_trees());
    let y_pred = forest.predict(&x_test)?.to_vec();

    let scores = match task {
        TaskKind::Classification => {
            Scores::Classification(classification_report(&y_test, &y_pred, &class_labels))
        }
        TaskKind::Regression => Scores::Regression {
            mse: mean_squared_error(&y_test, &y_pred),
            r2: r2_score(&y_test, &y_pred),
        },
    };

    let mut feature_importances: Vec<(String, f64)> = forest
        .feature_importances()
        .map(|imp| {
            features
                .iter()
                .zip(imp.iter())
                .map(|(c, &v)| (c.name.clone(), v))
                .collect()
        })
        .unwrap_or_default();
    feature_importances.sort_by(|a, b| b.1.total_cmp(&a.1));

    Ok(ModelOutcome {
        task,
        target: target.to_string(),
        scores,
        actual_vs_predicted: y_test.iter().zip(&y_pred).map(|(&a, &p)| [a, p]).collect(),
        class_labels,
        feature_importances,
        n_train: split.train_indices.len(),
        n_test: split.test_indices.len(),
    })
}

/// Row-major matrix of the feature columns; every cell must be numeric.
fn feature_matrix(features: &[&Column]) -> Result<Array2<f64>> {
    let n_rows = features.first().map_or(0, |c| c.values.len());
    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(features.len());
    for col in features {
        columns.push(numeric_column(col)?);
    }
    Ok(Array2::from_shape_fn((n_rows, features.len()), |(i, j)| {
        columns[j][i]
    }))
}

fn numeric_column(col: &Column) -> Result<Vec<f64>> {
    if !col.is_numeric() {
        return Err(PipelineError::NonNumericColumn(col.name.clone()));
    }
    let count = col.null_count();
    if count > 0 {
        return Err(PipelineError::MissingValues {
            column: col.name.clone(),
            count,
        });
    }
    Ok(col.values.iter().filter_map(CellValue::as_f64).collect())
}

fn regression_target(col: &Column) -> Result<Array1<f64>> {
    Ok(Array1::from_vec(numeric_column(col)?))
}

/// Class index per row plus the sorted class labels.
fn classification_target(col: &Column) -> Result<(Array1<f64>, Vec<String>)> {
    let count = col.null_count();
    if count > 0 {
        return Err(PipelineError::MissingValues {
            column: col.name.clone(),
            count,
        });
    }
    let continuous = col
        .values
        .iter()
        .any(|v| matches!(v, CellValue::Float(f) if f.fract() != 0.0));
    if continuous {
        return Err(PipelineError::ContinuousTarget(col.name.clone()));
    }

    let classes: Vec<CellValue> = col.unique_values().into_iter().collect();
    let index: BTreeMap<&CellValue, usize> = classes.iter().enumerate().map(|(i, v)| (v, i)).collect();
    let y = col
        .values
        .iter()
        .map(|v| index.get(v).map_or(0.0, |&i| i as f64))
        .collect();
    Ok((y, classes.iter().map(class_label).collect()))
}

/// Whole-number floats print without decimals so `1.0` reads as `1`.
fn class_label(value: &CellValue) -> String {
    match value {
        CellValue::Float(f) if f.fract() == 0.0 => format!("{f:.0}"),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            n_estimators: 15,
            ..Settings::default()
        }
    }

    fn floats(values: impl Iterator<Item = f64>) -> Vec<CellValue> {
        values.map(CellValue::Float).collect()
    }

    fn linear_dataset(n: usize) -> Dataset {
        Dataset::from_columns(vec![
            Column::new("x", floats((0..n).map(|i| i as f64))),
            Column::new("noise", floats((0..n).map(|i| ((i * 37) % 11) as f64))),
            Column::new("y", floats((0..n).map(|i| 2.0 * i as f64 + 5.0))),
        ])
        .unwrap()
    }

    #[test]
    fn test_regression_scores() {
        let outcome =
            train_and_evaluate(&linear_dataset(100), "y", TaskKind::Regression, &settings()).unwrap();

        assert_eq!(outcome.n_test, 20);
        assert_eq!(outcome.n_train, 80);
        assert_eq!(outcome.actual_vs_predicted.len(), 20);
        let Scores::Regression { r2, .. } = outcome.scores else {
            panic!("expected regression scores");
        };
        assert!(r2 > 0.9, "r2 = {r2}");
        assert_eq!(outcome.feature_importances[0].0, "x");
    }

    #[test]
    fn test_classification_with_text_labels() {
        let n = 60;
        let ds = Dataset::from_columns(vec![
            Column::new("x", floats((0..n).map(|i| i as f64))),
            Column::new(
                "size",
                (0..n)
                    .map(|i| {
                        let label = if i < n / 2 { "small" } else { "large" };
                        CellValue::String(label.to_string())
                    })
                    .collect(),
            ),
        ])
        .unwrap();

        let outcome = train_and_evaluate(&ds, "size", TaskKind::Classification, &settings()).unwrap();
        assert_eq!(outcome.class_labels, vec!["large", "small"]);
        let Scores::Classification(report) = outcome.scores else {
            panic!("expected classification report");
        };
        assert!(report.accuracy >= 0.9, "accuracy = {}", report.accuracy);
    }

    #[test]
    fn test_float_coded_classes_print_as_integers() {
        let n = 40;
        let ds = Dataset::from_columns(vec![
            Column::new("x", floats((0..n).map(|i| i as f64))),
            Column::new("y", floats((0..n).map(|i| if i < n / 2 { 0.0 } else { 1.0 }))),
        ])
        .unwrap();

        let outcome = train_and_evaluate(&ds, "y", TaskKind::Classification, &settings()).unwrap();
        assert_eq!(outcome.class_labels, vec!["0", "1"]);
        let Scores::Classification(report) = outcome.scores else {
            panic!("expected classification report");
        };
        assert!(report.classes.iter().all(|c| c.label == "0" || c.label == "1"));
    }

    #[test]
    fn test_text_feature_rejected() {
        let ds = Dataset::from_columns(vec![
            Column::new("city", vec![CellValue::String("Oslo".into()); 10]),
            Column::new("y", floats((0..10).map(|i| i as f64))),
        ])
        .unwrap();
        let err = train_and_evaluate(&ds, "y", TaskKind::Regression, &settings()).unwrap_err();
        assert_eq!(err, PipelineError::NonNumericColumn("city".into()));
    }

    #[test]
    fn test_missing_values_rejected() {
        let ds = Dataset::from_columns(vec![
            Column::new("x", vec![CellValue::Null, CellValue::Float(1.0), CellValue::Float(2.0)]),
            Column::new("y", floats((0..3).map(|i| i as f64))),
        ])
        .unwrap();
        let err = train_and_evaluate(&ds, "y", TaskKind::Regression, &settings()).unwrap_err();
        assert!(matches!(err, PipelineError::MissingValues { count: 1, .. }));
    }

    #[test]
    fn test_continuous_classification_target_rejected() {
        let mut ds = linear_dataset(10);
        ds.columns[2] = Column::new("y", floats((0..10).map(|i| i as f64 + 0.5)));
        let err = train_and_evaluate(&ds, "y", TaskKind::Classification, &settings()).unwrap_err();
        assert_eq!(err, PipelineError::ContinuousTarget("y".into()));
    }

    #[test]
    fn test_text_regression_target_rejected() {
        let ds = Dataset::from_columns(vec![
            Column::new("x", floats((0..5).map(|i| i as f64))),
            Column::new("label", vec![CellValue::String("a".into()); 5]),
        ])
        .unwrap();
        let err = train_and_evaluate(&ds, "label", TaskKind::Regression, &settings()).unwrap_err();
        assert_eq!(err, PipelineError::NonNumericColumn("label".into()));
    }
}
