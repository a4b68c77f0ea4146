use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common dataframe dtypes.
/// Used in `BTreeSet` / `HashSet` downstream so `CellValue` must be `Ord` and `Hash`.
#[derive(Debug, Clone)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v:.4}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Try to interpret the value as an `f64`. Booleans count as 0/1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

/// Inferred dtype of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Every non-null cell is an integer or a float.
    Numeric,
    /// Every non-null cell is a bool.
    Boolean,
    /// Strings or a mix of types.
    Text,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Boolean => write!(f, "bool"),
            ColumnKind::Text => write!(f, "text"),
        }
    }
}

/// One named column of the table.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
    kind: ColumnKind,
}

impl Column {
    /// Build a column and infer its kind. A numeric column holding any float
    /// has its integers promoted, so one column never mixes the two.
    pub fn new(name: impl Into<String>, mut values: Vec<CellValue>) -> Self {
        let kind = infer_kind(&values);
        if kind == ColumnKind::Numeric
            && values.iter().any(|v| matches!(v, CellValue::Float(_)))
        {
            promote_integers(&mut values);
        }
        Column {
            name: name.into(),
            values,
            kind,
        }
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    /// Numeric and boolean columns can feed statistics and models.
    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, ColumnKind::Numeric | ColumnKind::Boolean)
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    /// Non-null values as `f64` (empty for text columns).
    pub fn numeric_values(&self) -> Vec<f64> {
        if !self.is_numeric() {
            return Vec::new();
        }
        self.values.iter().filter_map(CellValue::as_f64).collect()
    }

    /// Replace the cells and re-infer the kind.
    pub fn replace_values(&mut self, values: Vec<CellValue>) {
        *self = Column::new(std::mem::take(&mut self.name), values);
    }

    /// Sorted set of distinct non-null values.
    pub fn unique_values(&self) -> BTreeSet<CellValue> {
        self.values
            .iter()
            .filter(|v| !v.is_null())
            .cloned()
            .collect()
    }
}

fn infer_kind(values: &[CellValue]) -> ColumnKind {
    let mut saw_number = false;
    let mut saw_bool = false;
    for v in values {
        match v {
            CellValue::Null => {}
            CellValue::Integer(_) | CellValue::Float(_) => saw_number = true,
            CellValue::Bool(_) => saw_bool = true,
            CellValue::String(_) => return ColumnKind::Text,
        }
    }
    match (saw_number, saw_bool) {
        (true, true) => ColumnKind::Text,
        (false, true) => ColumnKind::Boolean,
        // All-null columns are treated as numeric, like a float column of NaN.
        _ => ColumnKind::Numeric,
    }
}

fn promote_integers(values: &mut [CellValue]) {
    for v in values.iter_mut() {
        if let CellValue::Integer(i) = v {
            *v = CellValue::Float(*i as f64);
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// An in-memory table: ordered columns of equal length.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub columns: Vec<Column>,
}

impl Dataset {
    /// Build a dataset from columns, rejecting ragged input.
    pub fn from_columns(columns: Vec<Column>) -> anyhow::Result<Self> {
        if let Some(first) = columns.first() {
            let n = first.values.len();
            if let Some(bad) = columns.iter().find(|c| c.values.len() != n) {
                anyhow::bail!(
                    "column '{}' has {} rows, expected {n}",
                    bad.name,
                    bad.values.len()
                );
            }
        }
        Ok(Dataset { columns })
    }

    /// Build a dataset from a header and row-major cells.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> anyhow::Result<Self> {
        let mut per_column: Vec<Vec<CellValue>> =
            headers.iter().map(|_| Vec::with_capacity(rows.len())).collect();
        for (row_no, row) in rows.into_iter().enumerate() {
            if row.len() != headers.len() {
                anyhow::bail!(
                    "row {row_no} has {} fields, expected {}",
                    row.len(),
                    headers.len()
                );
            }
            for (col, cell) in per_column.iter_mut().zip(row) {
                col.push(cell);
            }
        }
        let columns = headers
            .into_iter()
            .zip(per_column)
            .map(|(name, values)| Column::new(name, values))
            .collect();
        Self::from_columns(columns)
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Columns usable for statistics (numeric + boolean).
    pub fn numeric_columns(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.is_numeric()).collect()
    }

    /// Clone of row `i` across all columns.
    pub fn row(&self, i: usize) -> Vec<CellValue> {
        self.columns.iter().map(|c| c.values[i].clone()).collect()
    }

    /// First `n` rows as a new dataset.
    pub fn head(&self, n: usize) -> Dataset {
        let keep: Vec<usize> = (0..self.n_rows().min(n)).collect();
        self.take_rows(&keep)
    }

    /// New dataset holding the given rows, in order.
    pub fn take_rows(&self, indices: &[usize]) -> Dataset {
        let columns = self
            .columns
            .iter()
            .map(|c| {
                let values = indices.iter().map(|&i| c.values[i].clone()).collect();
                Column::new(c.name.clone(), values)
            })
            .collect();
        Dataset { columns }
    }

    /// Keep only rows whose flag is `true`.
    pub fn retain_rows(&mut self, keep: &[bool]) {
        for col in &mut self.columns {
            let values = col
                .values
                .drain(..)
                .zip(keep)
                .filter_map(|(v, &k)| k.then_some(v))
                .collect();
            col.replace_values(values);
        }
    }
}
