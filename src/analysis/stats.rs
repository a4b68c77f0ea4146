use std::collections::BTreeMap;

use crate::data::model::{CellValue, Dataset};

// ---------------------------------------------------------------------------
// Scalar helpers
// ---------------------------------------------------------------------------

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Sample standard deviation (n - 1 denominator); `None` below two values.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Quantile with linear interpolation between closest ranks.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(quantile_sorted(&sorted, q))
}

/// Same as [`quantile`] for already-sorted, non-empty input.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

// ---------------------------------------------------------------------------
// Summary statistics
// ---------------------------------------------------------------------------

/// `describe()` row for a numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// `describe()` row for a text column.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalSummary {
    pub column: String,
    pub count: usize,
    pub unique: usize,
    pub top: Option<CellValue>,
    pub freq: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Summary {
    Numeric(Vec<NumericSummary>),
    Categorical(Vec<CategoricalSummary>),
}

/// Descriptive statistics. Numeric columns are described when there are any;
/// otherwise the text columns get count / unique / top / freq.
pub fn describe(dataset: &Dataset) -> Summary {
    let numeric = dataset.numeric_columns();
    if !numeric.is_empty() {
        let rows = numeric
            .into_iter()
            .map(|col| {
                let mut values = col.numeric_values();
                values.sort_by(f64::total_cmp);
                let count = values.len();
                let nan = f64::NAN;
                NumericSummary {
                    column: col.name.clone(),
                    count,
                    mean: mean(&values).unwrap_or(nan),
                    std: std_dev(&values).unwrap_or(nan),
                    min: values.first().copied().unwrap_or(nan),
                    q25: if count > 0 { quantile_sorted(&values, 0.25) } else { nan },
                    median: if count > 0 { quantile_sorted(&values, 0.5) } else { nan },
                    q75: if count > 0 { quantile_sorted(&values, 0.75) } else { nan },
                    max: values.last().copied().unwrap_or(nan),
                }
            })
            .collect();
        return Summary::Numeric(rows);
    }

    let rows = dataset
        .columns
        .iter()
        .map(|col| {
            let mut counts: BTreeMap<&CellValue, usize> = BTreeMap::new();
            for v in col.values.iter().filter(|v| !v.is_null()) {
                *counts.entry(v).or_default() += 1;
            }
            // Ties resolve to the smallest value.
            let top = counts
                .iter()
                .fold(None::<(&CellValue, usize)>, |best, (v, &c)| match best {
                    Some((_, bc)) if bc >= c => best,
                    _ => Some((*v, c)),
                });
            CategoricalSummary {
                column: col.name.clone(),
                count: counts.values().sum(),
                unique: counts.len(),
                top: top.map(|(v, _)| v.clone()),
                freq: top.map_or(0, |(_, c)| c),
            }
        })
        .collect();
    Summary::Categorical(rows)
}

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

/// Square Pearson correlation matrix over the numeric columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major `columns.len() x columns.len()`.
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i][j]
    }
}

/// Pearson correlation using pairwise-complete observations. A pair with
/// fewer than two shared observations or zero variance yields NaN.
pub fn correlation(dataset: &Dataset) -> CorrelationMatrix {
    let numeric = dataset.numeric_columns();
    let series: Vec<Vec<Option<f64>>> = numeric
        .iter()
        .map(|c| c.values.iter().map(CellValue::as_f64).collect())
        .collect();

    let k = series.len();
    let mut values = vec![vec![f64::NAN; k]; k];
    for i in 0..k {
        for j in i..k {
            let r = pearson(&series[i], &series[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        columns: numeric.iter().map(|c| c.name.clone()).collect(),
        values,
    }
}

fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}
