use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int16Array, Int32Array, Int64Array,
    Int8Array, StringArray, UInt16Array, UInt32Array, UInt64Array, UInt8Array,
};
use arrow::datatypes::DataType;
use calamine::{Data, Range, Reader, open_workbook_auto};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Dataset};

/// Tokens read as missing values, matching the usual dataframe defaults.
const NA_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "#N/A",
    "<NA>", "#NA",
];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a tabular dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`                           – header row followed by records
/// * `.xlsx` / `.xlsm` / `.xls` / `.ods` – first worksheet, first row is the header
/// * `.parquet`                       – flat columns of scalars
/// * `.json`                          – `[{ "col": value, ... }, ...]`
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "xlsx" | "xlsm" | "xls" | "ods" => load_spreadsheet(path),
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.is_empty() {
        bail!("CSV file has no header row");
    }

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        // Line 1 is the header.
        let record = result.with_context(|| format!("CSV line {}", row_no + 2))?;
        rows.push(record.iter().map(guess_cell_type).collect());
    }

    Dataset::from_rows(unique_headers(headers), rows).context("assembling CSV table")
}

/// Infer the type of a raw text cell.
pub fn guess_cell_type(raw: &str) -> CellValue {
    let s = raw.trim();
    if NA_TOKENS.contains(&s) {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        if f.is_finite() {
            return CellValue::Float(f);
        }
    }
    match s {
        "true" | "True" | "TRUE" => CellValue::Bool(true),
        "false" | "False" | "FALSE" => CellValue::Bool(false),
        _ => CellValue::String(raw.to_string()),
    }
}

/// Make header names unique and non-empty (`Unnamed: i`, `name.1`, ...).
fn unique_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    headers
        .into_iter()
        .enumerate()
        .map(|(i, h)| {
            let base = if h.trim().is_empty() {
                format!("Unnamed: {i}")
            } else {
                h
            };
            let mut name = base.clone();
            let mut suffix = 1;
            while !seen.insert(name.clone()) {
                name = format!("{base}.{suffix}");
                suffix += 1;
            }
            name
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

fn load_spreadsheet(path: &Path) -> Result<Dataset> {
    let mut workbook = open_workbook_auto(path).context("opening spreadsheet")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("spreadsheet has no worksheets")?
        .context("reading first worksheet")?;
    range_to_dataset(&range)
}

/// First row is the header; empty header cells become `Unnamed: i`.
fn range_to_dataset(range: &Range<Data>) -> Result<Dataset> {
    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(|c| c.to_string()).collect(),
        None => bail!("spreadsheet is empty"),
    };

    let body: Vec<Vec<CellValue>> = rows
        .map(|row| row.iter().map(spreadsheet_cell).collect())
        .collect();

    Dataset::from_rows(unique_headers(headers), body).context("assembling spreadsheet table")
}

fn spreadsheet_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) => guess_cell_type(s),
        Data::Error(_) => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "age": 31, "city": "Oslo", "income": 5200.5 },
///   ...
/// ]
/// ```
///
/// Column order follows first appearance; a key missing from a record is null.
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map_or(CellValue::Null, json_to_cell))
                .collect()
        })
        .collect();

    Dataset::from_rows(headers, rows)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of flat scalar columns (strings, ints, floats, bools).
/// Nested or temporal columns are rejected.
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .map(|col| extract_cell(col, row))
                .collect::<Result<Vec<_>>>()?;
            rows.push(cells);
        }
    }

    Dataset::from_rows(headers, rows)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> Result<CellValue> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => {
            let arr = downcast::<StringArray>(col)?;
            CellValue::String(arr.value(row).to_string())
        }
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Utf8View => CellValue::String(col.as_string_view().value(row).to_string()),
        DataType::Int8 => CellValue::Integer(downcast::<Int8Array>(col)?.value(row) as i64),
        DataType::Int16 => CellValue::Integer(downcast::<Int16Array>(col)?.value(row) as i64),
        DataType::Int32 => CellValue::Integer(downcast::<Int32Array>(col)?.value(row) as i64),
        DataType::Int64 => CellValue::Integer(downcast::<Int64Array>(col)?.value(row)),
        DataType::UInt8 => CellValue::Integer(downcast::<UInt8Array>(col)?.value(row) as i64),
        DataType::UInt16 => CellValue::Integer(downcast::<UInt16Array>(col)?.value(row) as i64),
        DataType::UInt32 => CellValue::Integer(downcast::<UInt32Array>(col)?.value(row) as i64),
        DataType::UInt64 => {
            let v = downcast::<UInt64Array>(col)?.value(row);
            i64::try_from(v).map_or(CellValue::Float(v as f64), CellValue::Integer)
        }
        DataType::Float32 => float_cell(downcast::<Float32Array>(col)?.value(row) as f64),
        DataType::Float64 => float_cell(downcast::<Float64Array>(col)?.value(row)),
        DataType::Boolean => CellValue::Bool(downcast::<BooleanArray>(col)?.value(row)),
        other => bail!("unsupported parquet column type {other:?}"),
    };
    Ok(value)
}

/// NaN is how pandas writes a missing float.
fn float_cell(v: f64) -> CellValue {
    if v.is_nan() {
        CellValue::Null
    } else {
        CellValue::Float(v)
    }
}

fn downcast<T: 'static>(col: &Arc<dyn Array>) -> Result<&T> {
    col.as_any()
        .downcast_ref::<T>()
        .with_context(|| format!("unexpected array layout for {:?}", col.data_type()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::ColumnKind;
    use std::io::Write;

    fn write_temp(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_guess_cell_type() {
        assert_eq!(guess_cell_type("42"), CellValue::Integer(42));
        assert_eq!(guess_cell_type("4.5"), CellValue::Float(4.5));
        assert_eq!(guess_cell_type("True"), CellValue::Bool(true));
        assert_eq!(guess_cell_type(""), CellValue::Null);
        assert_eq!(guess_cell_type("NaN"), CellValue::Null);
        assert_eq!(guess_cell_type("Oslo"), CellValue::String("Oslo".into()));
    }

    #[test]
    fn test_load_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "data.csv", "age,city,score\n31,Oslo,1.5\n,Rome,2\n");

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.n_rows(), 2);
        assert_eq!(ds.column_names(), vec!["age", "city", "score"]);
        assert_eq!(ds.column("age").unwrap().null_count(), 1);
        assert_eq!(ds.column("city").unwrap().kind(), ColumnKind::Text);
        assert_eq!(ds.column("score").unwrap().values[1], CellValue::Float(2.0));
    }

    #[test]
    fn test_load_csv_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "empty.csv", "a,b\n");
        let ds = load_file(&path).unwrap();
        assert_eq!(ds.n_cols(), 2);
        assert!(ds.is_empty());
    }

    #[test]
    fn test_duplicate_headers_made_unique() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "dup.csv", "a,a,\n1,2,3\n");
        let ds = load_file(&path).unwrap();
        assert_eq!(ds.column_names(), vec!["a", "a.1", "Unnamed: 2"]);
    }

    #[test]
    fn test_load_json_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(
            &dir,
            "data.json",
            r#"[{"x": 1, "label": "a"}, {"x": 2.5}]"#,
        );
        let ds = load_file(&path).unwrap();
        assert_eq!(ds.n_rows(), 2);
        assert_eq!(ds.column("label").unwrap().values[1], CellValue::Null);
    }

    #[test]
    fn test_load_csv_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "blank.csv", "");
        let err = load_file(&path).unwrap_err();
        assert!(err.to_string().contains("no header row"));
    }

    #[test]
    fn test_load_csv_ragged_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "ragged.csv", "a,b,c\n1,2,3\n4,5\n");
        let err = load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("CSV line 3"), "{err:#}");
    }

    #[test]
    fn test_spreadsheet_range() {
        let mut range: Range<Data> = Range::new((0, 0), (2, 3));
        range.set_value((0, 0), Data::String("id".into()));
        range.set_value((0, 1), Data::String("price".into()));
        range.set_value((0, 2), Data::String("city".into()));
        // (0, 3) stays empty
        range.set_value((1, 0), Data::Int(1));
        range.set_value((1, 1), Data::Float(9.5));
        range.set_value((1, 2), Data::String("Oslo".into()));
        range.set_value((1, 3), Data::String("12".into()));
        range.set_value((2, 0), Data::Int(2));
        range.set_value((2, 2), Data::String("NA".into()));
        range.set_value((2, 3), Data::Bool(true));

        let ds = range_to_dataset(&range).unwrap();
        assert_eq!(ds.column_names(), vec!["id", "price", "city", "Unnamed: 3"]);
        assert_eq!(ds.n_rows(), 2);
        assert_eq!(ds.column("id").unwrap().values, vec![CellValue::Integer(1), CellValue::Integer(2)]);
        assert_eq!(ds.column("price").unwrap().values, vec![CellValue::Float(9.5), CellValue::Null]);
        assert_eq!(
            ds.column("city").unwrap().values,
            vec![CellValue::String("Oslo".into()), CellValue::Null]
        );
        assert_eq!(
            ds.column("Unnamed: 3").unwrap().values,
            vec![CellValue::Integer(12), CellValue::Bool(true)]
        );
    }

    #[test]
    fn test_load_spreadsheet_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "broken.xlsx", "not a workbook");
        assert!(load_file(&path).is_err());
    }

    #[test]
    fn test_load_parquet() {
        use arrow::array::ArrayRef;
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            Field::new("age", DataType::Int64, true),
            Field::new("rank", DataType::Int16, false),
            Field::new("score", DataType::Float32, false),
            Field::new("income", DataType::Float64, false),
            Field::new("city", DataType::Utf8, false),
            Field::new("member", DataType::Boolean, false),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(Int64Array::from(vec![Some(31), None])),
            Arc::new(Int16Array::from(vec![1i16, 2])),
            Arc::new(Float32Array::from(vec![0.5f32, f32::NAN])),
            Arc::new(Float64Array::from(vec![f64::NAN, 4200.0])),
            Arc::new(StringArray::from(vec!["Oslo", "Rome"])),
            Arc::new(BooleanArray::from(vec![true, false])),
        ];
        let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.column_names(), vec!["age", "rank", "score", "income", "city", "member"]);
        assert_eq!(ds.column("age").unwrap().values, vec![CellValue::Integer(31), CellValue::Null]);
        assert_eq!(ds.column("rank").unwrap().values[1], CellValue::Integer(2));
        assert_eq!(ds.column("score").unwrap().values, vec![CellValue::Float(0.5), CellValue::Null]);
        assert_eq!(ds.column("income").unwrap().values, vec![CellValue::Null, CellValue::Float(4200.0)]);
        assert_eq!(ds.column("city").unwrap().kind(), ColumnKind::Text);
        assert_eq!(ds.column("member").unwrap().kind(), ColumnKind::Boolean);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_file(Path::new("data.txt")).unwrap_err();
        assert!(err.to_string().contains("Unsupported"));
    }
}
