use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::model::{CellValue, ColumnKind, Dataset};
use crate::analysis::stats::{mean, median};

// ---------------------------------------------------------------------------
// Missing values
// ---------------------------------------------------------------------------

/// How missing values in numeric columns are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissingPolicy {
    /// Replace with the column mean
    Mean,
    /// Replace with the column median
    Median,
    /// Drop every row holding a missing value
    Drop,
}

impl MissingPolicy {
    pub const ALL: [MissingPolicy; 3] = [MissingPolicy::Mean, MissingPolicy::Median, MissingPolicy::Drop];
}

impl fmt::Display for MissingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingPolicy::Mean => write!(f, "Mean"),
            MissingPolicy::Median => write!(f, "Median"),
            MissingPolicy::Drop => write!(f, "Drop"),
        }
    }
}

/// What a missing-value pass changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MissingReport {
    /// column → number of cells filled
    pub filled: BTreeMap<String, usize>,
    pub rows_dropped: usize,
}

/// Handle missing values in numeric columns.
///
/// `Mean` / `Median` fill each numeric column's nulls with the statistic of
/// its own non-null values; text columns are left alone. `Drop` removes every
/// row with a null in any column, but only when some numeric column has nulls.
pub fn handle_missing(dataset: &mut Dataset, policy: MissingPolicy) -> MissingReport {
    let mut report = MissingReport::default();

    let numeric_with_nulls: Vec<usize> = dataset
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.kind() == ColumnKind::Numeric && c.null_count() > 0)
        .map(|(i, _)| i)
        .collect();

    if numeric_with_nulls.is_empty() {
        return report;
    }

    match policy {
        MissingPolicy::Drop => {
            let n = dataset.n_rows();
            let keep: Vec<bool> = (0..n)
                .map(|i| dataset.columns.iter().all(|c| !c.values[i].is_null()))
                .collect();
            report.rows_dropped = keep.iter().filter(|k| !**k).count();
            dataset.retain_rows(&keep);
            log::debug!("dropped {} rows with missing values", report.rows_dropped);
        }
        MissingPolicy::Mean | MissingPolicy::Median => {
            for idx in numeric_with_nulls {
                let column = &mut dataset.columns[idx];
                let present = column.numeric_values();
                let fill = match policy {
                    MissingPolicy::Mean => mean(&present),
                    _ => median(&present),
                };
                // An all-null column has nothing to impute from.
                let Some(fill) = fill else {
                    continue;
                };

                let mut filled = 0;
                let values = column
                    .values
                    .iter()
                    .map(|v| match v {
                        CellValue::Null => {
                            filled += 1;
                            CellValue::Float(fill)
                        }
                        CellValue::Integer(i) => CellValue::Float(*i as f64),
                        other => other.clone(),
                    })
                    .collect();
                column.replace_values(values);
                log::debug!("filled {filled} nulls in '{}' with {fill}", column.name);
                report.filled.insert(column.name.clone(), filled);
            }
        }
    }

    report
}

// ---------------------------------------------------------------------------
// Duplicates
// ---------------------------------------------------------------------------

/// Remove exact duplicate rows, keeping the first occurrence.
/// Returns the number of rows removed.
pub fn remove_duplicates(dataset: &mut Dataset) -> usize {
    let mut seen: HashSet<Vec<CellValue>> = HashSet::new();
    let keep: Vec<bool> = (0..dataset.n_rows())
        .map(|i| seen.insert(dataset.row(i)))
        .collect();
    let removed = keep.iter().filter(|k| !**k).count();
    if removed > 0 {
        dataset.retain_rows(&keep);
    }
    log::debug!("removed {removed} duplicate rows");
    removed
}

// ---------------------------------------------------------------------------
// Label encoding
// ---------------------------------------------------------------------------

/// Mapping applied to one column: code `i` stands for `classes[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelEncoding {
    pub column: String,
    pub classes: Vec<CellValue>,
}

/// Replace every text column with integer codes of its sorted distinct values.
/// Missing cells get their own code after the last value.
pub fn label_encode(dataset: &mut Dataset) -> Vec<LabelEncoding> {
    let mut encodings = Vec::new();

    for column in dataset.columns.iter_mut() {
        if column.kind() != ColumnKind::Text {
            continue;
        }
        let mut classes: Vec<CellValue> = column.unique_values().into_iter().collect();
        if column.null_count() > 0 {
            classes.push(CellValue::Null);
        }
        let codes: BTreeMap<&CellValue, i64> = classes
            .iter()
            .enumerate()
            .map(|(i, v)| (v, i as i64))
            .collect();

        let values = column
            .values
            .iter()
            .map(|v| CellValue::Integer(codes.get(v).copied().unwrap_or_default()))
            .collect();
        column.replace_values(values);

        log::debug!("encoded '{}' into {} codes", column.name, classes.len());
        encodings.push(LabelEncoding {
            column: column.name.clone(),
            classes,
        });
    }

    encodings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;

    fn int(v: i64) -> CellValue {
        CellValue::Integer(v)
    }

    fn text(s: &str) -> CellValue {
        CellValue::String(s.to_string())
    }

    fn sample() -> Dataset {
        Dataset::from_columns(vec![
            Column::new("a", vec![int(1), CellValue::Null, int(3), int(10)]),
            Column::new("city", vec![text("Rome"), text("Oslo"), CellValue::Null, text("Oslo")]),
        ])
        .unwrap()
    }

    #[test]
    fn test_fill_mean() {
        let mut ds = sample();
        let report = handle_missing(&mut ds, MissingPolicy::Mean);

        let a = ds.column("a").unwrap();
        assert_eq!(a.values[1], CellValue::Float(14.0 / 3.0));
        assert_eq!(a.null_count(), 0);
        assert_eq!(report.filled.get("a"), Some(&1));
        // Text columns are never imputed.
        assert_eq!(ds.column("city").unwrap().null_count(), 1);
    }

    #[test]
    fn test_fill_median() {
        let mut ds = sample();
        handle_missing(&mut ds, MissingPolicy::Median);
        assert_eq!(ds.column("a").unwrap().values[1], CellValue::Float(3.0));
    }

    #[test]
    fn test_drop_removes_rows_with_any_null() {
        let mut ds = sample();
        let report = handle_missing(&mut ds, MissingPolicy::Drop);
        assert_eq!(report.rows_dropped, 2);
        assert_eq!(ds.n_rows(), 2);
        assert_eq!(ds.column("a").unwrap().values, vec![int(1), int(10)]);
    }

    #[test]
    fn test_drop_is_noop_without_numeric_nulls() {
        let mut ds = Dataset::from_columns(vec![
            Column::new("a", vec![int(1), int(2)]),
            Column::new("b", vec![text("x"), CellValue::Null]),
        ])
        .unwrap();
        let report = handle_missing(&mut ds, MissingPolicy::Drop);
        assert_eq!(report.rows_dropped, 0);
        assert_eq!(ds.n_rows(), 2);
    }

    #[test]
    fn test_remove_duplicates_keeps_first() {
        let mut ds = Dataset::from_columns(vec![
            Column::new("a", vec![int(1), int(2), int(1), CellValue::Null, CellValue::Null]),
            Column::new("b", vec![text("x"), text("y"), text("x"), text("z"), text("z")]),
        ])
        .unwrap();
        assert_eq!(remove_duplicates(&mut ds), 2);
        assert_eq!(ds.column("a").unwrap().values, vec![int(1), int(2), CellValue::Null]);
    }

    #[test]
    fn test_label_encode_sorted_codes() {
        let mut ds = sample();
        let encodings = label_encode(&mut ds);

        assert_eq!(encodings.len(), 1);
        assert_eq!(
            encodings[0].classes,
            vec![text("Oslo"), text("Rome"), CellValue::Null]
        );

        let city = ds.column("city").unwrap();
        assert_eq!(city.kind(), ColumnKind::Numeric);
        assert_eq!(city.null_count(), 0);
        assert_eq!(city.values, vec![int(1), int(0), int(2), int(0)]);
    }

    #[test]
    fn test_label_encode_without_nulls_has_no_missing_class() {
        let mut ds = Dataset::from_columns(vec![Column::new(
            "size",
            vec![text("small"), text("large"), text("small")],
        )])
        .unwrap();
        let encodings = label_encode(&mut ds);
        assert_eq!(encodings[0].classes, vec![text("large"), text("small")]);
        assert_eq!(ds.column("size").unwrap().values, vec![int(1), int(0), int(1)]);
    }
}
