use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::stats::quantile_sorted;
use crate::data::model::{CellValue, Column, Dataset};
use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// Chart requests
// ---------------------------------------------------------------------------

/// The chart kinds offered in the visualization section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartKind {
    Histogram,
    Scatter,
    BoxPlot,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [ChartKind::Histogram, ChartKind::Scatter, ChartKind::BoxPlot];
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartKind::Histogram => write!(f, "Histogram"),
            ChartKind::Scatter => write!(f, "Scatter Plot"),
            ChartKind::BoxPlot => write!(f, "Box Plot"),
        }
    }
}

/// Which chart to draw over which columns. `y` is only used by scatter plots.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRequest {
    pub kind: ChartKind,
    pub x: String,
    pub y: String,
}

// ---------------------------------------------------------------------------
// Chart data (renderer-independent)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Tukey box statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

/// One axis of a scatter plot; text columns are plotted by category index.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub name: String,
    /// Category labels when the axis is categorical.
    pub categories: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    Histogram {
        column: String,
        bins: Vec<HistogramBin>,
    },
    /// Count per distinct value of a text column.
    CategoryCounts {
        column: String,
        counts: Vec<(String, usize)>,
    },
    Scatter {
        x: Axis,
        y: Axis,
        points: Vec<[f64; 2]>,
    },
    Box {
        column: String,
        stats: BoxStats,
    },
}

/// Prepare the data behind the requested chart.
/// `bins` overrides the automatic (Sturges) bin count for histograms.
pub fn build_chart(dataset: &Dataset, request: &ChartRequest, bins: Option<usize>) -> Result<ChartData> {
    let x = lookup(dataset, &request.x)?;

    match request.kind {
        ChartKind::Histogram if !x.is_numeric() => Ok(ChartData::CategoryCounts {
            column: x.name.clone(),
            counts: category_counts(x),
        }),
        ChartKind::Histogram => {
            let values = non_empty_numeric(x)?;
            Ok(ChartData::Histogram {
                column: x.name.clone(),
                bins: histogram(&values, bins),
            })
        }
        ChartKind::Scatter => {
            let y = lookup(dataset, &request.y)?;
            let (x_axis, x_vals) = axis_values(x);
            let (y_axis, y_vals) = axis_values(y);
            let points: Vec<[f64; 2]> = x_vals
                .iter()
                .zip(&y_vals)
                .filter_map(|(a, b)| Some([(*a)?, (*b)?]))
                .collect();
            if points.is_empty() {
                return Err(PipelineError::EmptyData(format!(
                    "no rows with both '{}' and '{}' present",
                    x.name, y.name
                )));
            }
            Ok(ChartData::Scatter {
                x: x_axis,
                y: y_axis,
                points,
            })
        }
        ChartKind::BoxPlot => {
            let values = non_empty_numeric(x)?;
            Ok(ChartData::Box {
                column: x.name.clone(),
                stats: box_stats(&values),
            })
        }
    }
}

fn lookup<'a>(dataset: &'a Dataset, name: &str) -> Result<&'a Column> {
    dataset
        .column(name)
        .ok_or_else(|| PipelineError::UnknownColumn(name.to_string()))
}

fn non_empty_numeric(column: &Column) -> Result<Vec<f64>> {
    if !column.is_numeric() {
        return Err(PipelineError::NonNumericColumn(column.name.clone()));
    }
    let values = column.numeric_values();
    if values.is_empty() {
        return Err(PipelineError::EmptyData(format!(
            "column '{}' has no values",
            column.name
        )));
    }
    Ok(values)
}

/// Equal-width histogram from min to max; the last bin is closed on the right.
pub fn histogram(values: &[f64], bins: Option<usize>) -> Vec<HistogramBin> {
    if values.is_empty() {
        return Vec::new();
    }
    let n_bins = bins
        .unwrap_or_else(|| (values.len() as f64).log2().ceil() as usize + 1)
        .max(1);

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if (max - min).abs() < f64::EPSILON {
        return vec![HistogramBin {
            start: min - 0.5,
            end: max + 0.5,
            count: values.len(),
        }];
    }

    let width = (max - min) / n_bins as f64;
    let mut counts = vec![0usize; n_bins];
    for &v in values {
        let idx = (((v - min) / width) as usize).min(n_bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: min + i as f64 * width,
            end: min + (i + 1) as f64 * width,
            count,
        })
        .collect()
}

fn category_counts(column: &Column) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&CellValue, usize> = BTreeMap::new();
    for v in column.values.iter().filter(|v| !v.is_null()) {
        *counts.entry(v).or_default() += 1;
    }
    counts.into_iter().map(|(v, c)| (v.to_string(), c)).collect()
}

fn axis_values(column: &Column) -> (Axis, Vec<Option<f64>>) {
    if column.is_numeric() {
        let values = column.values.iter().map(CellValue::as_f64).collect();
        return (
            Axis {
                name: column.name.clone(),
                categories: None,
            },
            values,
        );
    }

    let categories: Vec<CellValue> = column.unique_values().into_iter().collect();
    let index: BTreeMap<&CellValue, usize> =
        categories.iter().enumerate().map(|(i, v)| (v, i)).collect();
    let values = column
        .values
        .iter()
        .map(|v| index.get(v).map(|&i| i as f64))
        .collect();
    (
        Axis {
            name: column.name.clone(),
            categories: Some(categories.iter().map(|v| v.to_string()).collect()),
        },
        values,
    )
}

/// Tukey box: whiskers reach the furthest points within 1.5 IQR of the box.
pub fn box_stats(values: &[f64]) -> BoxStats {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let q1 = quantile_sorted(&sorted, 0.25);
    let median = quantile_sorted(&sorted, 0.5);
    let q3 = quantile_sorted(&sorted, 0.75);
    let iqr = q3 - q1;
    let lo_fence = q1 - 1.5 * iqr;
    let hi_fence = q3 + 1.5 * iqr;

    let inside = sorted.iter().copied().filter(|v| *v >= lo_fence && *v <= hi_fence);
    let lower_whisker = inside.clone().fold(f64::INFINITY, f64::min);
    let upper_whisker = inside.fold(f64::NEG_INFINITY, f64::max);
    let outliers = sorted
        .iter()
        .copied()
        .filter(|v| *v < lo_fence || *v > hi_fence)
        .collect();

    BoxStats {
        lower_whisker,
        q1,
        median,
        q3,
        upper_whisker,
        outliers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn dataset() -> Dataset {
        let ints = |v: &[i64]| v.iter().map(|&i| CellValue::Integer(i)).collect::<Vec<_>>();
        let text = |v: &[&str]| {
            v.iter()
                .map(|s| CellValue::String(s.to_string()))
                .collect::<Vec<_>>()
        };
        Dataset::from_columns(vec![
            Column::new("x", ints(&[1, 2, 3, 4, 100])),
            Column::new("y", ints(&[2, 4, 6, 8, 10])),
            Column::new("g", text(&["b", "a", "b", "b", "a"])),
        ])
        .unwrap()
    }

    fn request(kind: ChartKind, x: &str, y: &str) -> ChartRequest {
        ChartRequest {
            kind,
            x: x.to_string(),
            y: y.to_string(),
        }
    }

    #[test]
    fn test_histogram_counts_all_values() {
        let bins = histogram(&[0.0, 1.0, 2.0, 3.0, 4.0], Some(2));
        assert_eq!(bins.len(), 2);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 5);
        assert_eq!(bins[1].count, 3); // max lands in the last bin
        assert_abs_diff_eq!(bins[0].end, 2.0);
    }

    #[test]
    fn test_histogram_constant_column() {
        let bins = histogram(&[7.0, 7.0, 7.0], None);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 3);
    }

    #[test]
    fn test_histogram_of_text_column_counts_categories() {
        let chart = build_chart(&dataset(), &request(ChartKind::Histogram, "g", ""), None).unwrap();
        assert_eq!(
            chart,
            ChartData::CategoryCounts {
                column: "g".into(),
                counts: vec![("a".into(), 2), ("b".into(), 3)],
            }
        );
    }

    #[test]
    fn test_box_stats_flags_outlier() {
        let stats = box_stats(&[1.0, 2.0, 3.0, 4.0, 100.0]);
        assert_abs_diff_eq!(stats.median, 3.0);
        assert_abs_diff_eq!(stats.q1, 2.0);
        assert_abs_diff_eq!(stats.q3, 4.0);
        assert_eq!(stats.outliers, vec![100.0]);
        assert_abs_diff_eq!(stats.upper_whisker, 4.0);
        assert_abs_diff_eq!(stats.lower_whisker, 1.0);
    }

    #[test]
    fn test_scatter_with_categorical_axis() {
        let chart = build_chart(&dataset(), &request(ChartKind::Scatter, "g", "y"), None).unwrap();
        let ChartData::Scatter { x, points, .. } = chart else {
            panic!("expected scatter");
        };
        assert_eq!(x.categories, Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(points[0], [1.0, 2.0]);
        assert_eq!(points.len(), 5);
    }

    #[test]
    fn test_scatter_without_complete_pairs() {
        let ds = Dataset::from_columns(vec![
            Column::new("a", vec![CellValue::Integer(1), CellValue::Null]),
            Column::new("b", vec![CellValue::Null, CellValue::Float(2.5)]),
        ])
        .unwrap();
        let err = build_chart(&ds, &request(ChartKind::Scatter, "a", "b"), None);
        assert!(matches!(err, Err(PipelineError::EmptyData(_))));
    }

    #[test]
    fn test_unknown_column() {
        let err = build_chart(&dataset(), &request(ChartKind::BoxPlot, "nope", ""), None);
        assert!(matches!(err, Err(PipelineError::UnknownColumn(_))));
    }

    #[test]
    fn test_box_plot_rejects_text() {
        let err = build_chart(&dataset(), &request(ChartKind::BoxPlot, "g", ""), None);
        assert!(matches!(err, Err(PipelineError::NonNumericColumn(_))));
    }
}
