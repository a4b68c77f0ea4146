/// Data layer: core types, loading, and cleaning.
///
/// Architecture:
/// ```text
///  .csv / .xlsx / .xls / .ods / .parquet / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  named columns of CellValue, inferred kinds
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  clean    │  impute / drop nulls, dedupe rows, label-encode text
///   └──────────┘
/// ```

pub mod clean;
pub mod loader;
pub mod model;
