//! One pass of the clean → explore → visualize → model pipeline.
//!
//! The UI re-runs [`run`] against the raw loaded table whenever a control
//! changes, so no step keeps state between passes.

use crate::analysis::charts::{build_chart, ChartData, ChartKind, ChartRequest};
use crate::analysis::stats::{correlation, describe, CorrelationMatrix, Summary};
use crate::config::Settings;
use crate::data::clean::{
    handle_missing, label_encode, remove_duplicates, LabelEncoding, MissingPolicy, MissingReport,
};
use crate::data::model::Dataset;
use crate::error::Result;
use crate::ml::trainer::{train_and_evaluate, ModelOutcome, TaskKind};

/// Every user choice that drives a pipeline pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// `None` leaves missing values untouched.
    pub missing: Option<MissingPolicy>,
    pub remove_duplicates: bool,
    pub encode_categoricals: bool,
    pub show_summary: bool,
    pub show_correlation: bool,
    pub chart: Option<ChartRequest>,
    pub task: TaskKind,
    /// `None` skips model fitting.
    pub target: Option<String>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            missing: None,
            remove_duplicates: false,
            encode_categoricals: false,
            show_summary: false,
            show_correlation: false,
            chart: None,
            task: TaskKind::Classification,
            target: None,
        }
    }
}

impl PipelineOptions {
    /// Defaults for a freshly loaded table: histogram of the first column,
    /// model targeting the first column (mirrors the first entry of each selector).
    pub fn for_dataset(dataset: &Dataset) -> Self {
        let first = dataset.columns.first().map(|c| c.name.clone());
        Self {
            chart: first.clone().map(|name| ChartRequest {
                kind: ChartKind::Histogram,
                x: name.clone(),
                y: name,
            }),
            target: first,
            ..Self::default()
        }
    }
}

/// Outputs of one pass. Each fallible step keeps its own `Result` so one
/// failure does not hide the other sections.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub cleaned: Dataset,
    pub missing: Option<MissingReport>,
    pub duplicates_removed: Option<usize>,
    pub encodings: Vec<LabelEncoding>,
    pub summary: Option<Summary>,
    pub correlation: Option<CorrelationMatrix>,
    pub chart: Option<Result<ChartData>>,
    pub model: Option<Result<ModelOutcome>>,
}

/// Run the pipeline on a copy of `raw`.
pub fn run(raw: &Dataset, options: &PipelineOptions, settings: &Settings) -> PipelineReport {
    let mut data = raw.clone();

    let missing = options.missing.map(|policy| handle_missing(&mut data, policy));
    let duplicates_removed = options
        .remove_duplicates
        .then(|| remove_duplicates(&mut data));
    let encodings = if options.encode_categoricals {
        label_encode(&mut data)
    } else {
        Vec::new()
    };

    let summary = options.show_summary.then(|| describe(&data));
    let correlation = options.show_correlation.then(|| correlation(&data));

    let chart = options
        .chart
        .as_ref()
        .map(|request| build_chart(&data, request, settings.histogram_bins));

    let model = options.target.as_deref().map(|target| {
        let outcome = train_and_evaluate(&data, target, options.task, settings);
        if let Err(e) = &outcome {
            log::error!("Model fitting failed: {e}");
        }
        outcome
    });

    PipelineReport {
        cleaned: data,
        missing,
        duplicates_removed,
        encodings,
        summary,
        correlation,
        chart,
        model,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CellValue, Column};
    use crate::error::PipelineError;

    fn raw() -> Dataset {
        let n = 40;
        let mut x: Vec<CellValue> = (0..n).map(|i| CellValue::Integer(i)).collect();
        x[3] = CellValue::Null;
        let color: Vec<CellValue> = (0..n)
            .map(|i| CellValue::String(if i % 2 == 0 { "red" } else { "blue" }.to_string()))
            .collect();
        let label: Vec<CellValue> = (0..n).map(|i| CellValue::Integer((i >= n / 2) as i64)).collect();

        let mut ds = Dataset::from_columns(vec![
            Column::new("x", x),
            Column::new("color", color),
            Column::new("label", label),
        ])
        .unwrap();
        // Append an exact duplicate of row 0.
        let dup = ds.take_rows(&[0]);
        for (col, extra) in ds.columns.iter_mut().zip(dup.columns) {
            let mut values = col.values.clone();
            values.extend(extra.values);
            col.replace_values(values);
        }
        ds
    }

    fn settings() -> Settings {
        Settings {
            n_estimators: 10,
            ..Settings::default()
        }
    }

    #[test]
    fn test_raw_table_is_not_mutated() {
        let raw = raw();
        let options = PipelineOptions {
            missing: Some(MissingPolicy::Drop),
            remove_duplicates: true,
            ..PipelineOptions::default()
        };
        let report = run(&raw, &options, &settings());

        assert_eq!(raw.n_rows(), 41);
        assert_eq!(report.missing.unwrap().rows_dropped, 1);
        assert_eq!(report.duplicates_removed, Some(1));
        assert_eq!(report.cleaned.n_rows(), 39);
    }

    #[test]
    fn test_model_needs_encoding_of_text_features() {
        let options = PipelineOptions {
            missing: Some(MissingPolicy::Mean),
            target: Some("label".into()),
            ..PipelineOptions::default()
        };
        let report = run(&raw(), &options, &settings());
        assert!(matches!(
            report.model,
            Some(Err(PipelineError::NonNumericColumn(ref c))) if c == "color"
        ));

        let options = PipelineOptions {
            encode_categoricals: true,
            ..options
        };
        let report = run(&raw(), &options, &settings());
        assert_eq!(report.encodings.len(), 1);
        let outcome = report.model.unwrap().unwrap();
        assert_eq!(outcome.class_labels, vec!["0", "1"]);
    }

    #[test]
    fn test_encoded_text_nulls_do_not_block_model() {
        let mut raw = raw();
        let mut color = raw.columns[1].values.clone();
        color[5] = CellValue::Null;
        raw.columns[1].replace_values(color);

        for missing in [
            None,
            Some(MissingPolicy::Mean),
            Some(MissingPolicy::Median),
            Some(MissingPolicy::Drop),
        ] {
            let options = PipelineOptions {
                missing,
                remove_duplicates: true,
                encode_categoricals: true,
                target: Some("label".into()),
                ..PipelineOptions::default()
            };
            let report = run(&raw, &options, &settings());

            let color = report.cleaned.column("color").unwrap();
            assert_eq!(color.null_count(), 0, "policy {missing:?}");
            // Dropping rows also removes the null text cell.
            let has_missing_class = report.encodings[0].classes.last() == Some(&CellValue::Null);
            assert_eq!(has_missing_class, missing != Some(MissingPolicy::Drop));

            if missing.is_none() {
                // `x` still holds its null, so only that column is reported.
                assert!(matches!(
                    report.model,
                    Some(Err(PipelineError::MissingValues { ref column, .. })) if column == "x"
                ));
            } else {
                assert!(report.model.unwrap().is_ok(), "policy {missing:?}");
            }
        }
    }

    #[test]
    fn test_optional_sections() {
        let raw = raw();
        let mut options = PipelineOptions::for_dataset(&raw);
        options.target = None;
        options.show_summary = true;

        let report = run(&raw, &options, &settings());
        assert!(report.summary.is_some());
        assert!(report.correlation.is_none());
        assert!(report.model.is_none());
        assert!(matches!(report.chart, Some(Ok(ChartData::Histogram { .. }))));
    }
}
