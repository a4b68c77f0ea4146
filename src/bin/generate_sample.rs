use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const N_ROWS: usize = 200;
const N_DUPLICATES: usize = 6;
const CITIES: [&str; 4] = ["Berlin", "Lisbon", "Oslo", "Rome"];

/// One synthetic customer record.
#[derive(Clone)]
struct Row {
    age: Option<i64>,
    income: Option<f64>,
    city: String,
    member: bool,
    visits: i64,
    spend: f64,
    purchased: i64,
}

fn generate_rows(rng: &mut ChaCha8Rng) -> Vec<Row> {
    let mut rows: Vec<Row> = (0..N_ROWS)
        .map(|_| {
            let age = rng.gen_range(18..70);
            let income = 20_000.0 + age as f64 * 900.0 + rng.gen_range(-8_000.0..8_000.0);
            let city = CITIES[rng.gen_range(0..CITIES.len())].to_string();
            let member = rng.gen_bool(0.35);
            let visits = rng.gen_range(0..30);
            let spend = 0.004 * income
                + 12.0 * visits as f64
                + if member { 80.0 } else { 0.0 }
                + rng.gen_range(-40.0..40.0);
            let purchased = (spend > 420.0) as i64;

            // Roughly 5% missing per numeric input.
            Row {
                age: (!rng.gen_bool(0.05)).then_some(age),
                income: (!rng.gen_bool(0.05)).then_some((income * 100.0).round() / 100.0),
                city,
                member,
                visits,
                spend: (spend * 100.0).round() / 100.0,
                purchased,
            }
        })
        .collect();

    for _ in 0..N_DUPLICATES {
        let idx = rng.gen_range(0..rows.len());
        rows.push(rows[idx].clone());
    }
    rows
}

fn write_csv(path: &str, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record([
        "age", "income", "city", "member", "visits", "spend", "purchased",
    ])?;
    for row in rows {
        writer.write_record([
            row.age.map(|v| v.to_string()).unwrap_or_default(),
            row.income.map(|v| v.to_string()).unwrap_or_default(),
            row.city.clone(),
            row.member.to_string(),
            row.visits.to_string(),
            row.spend.to_string(),
            row.purchased.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &str, rows: &[Row]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("age", DataType::Int64, true),
        Field::new("income", DataType::Float64, true),
        Field::new("city", DataType::Utf8, false),
        Field::new("member", DataType::Boolean, false),
        Field::new("visits", DataType::Int64, false),
        Field::new("spend", DataType::Float64, false),
        Field::new("purchased", DataType::Int64, false),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(rows.iter().map(|r| r.age).collect::<Vec<_>>())),
        Arc::new(Float64Array::from(rows.iter().map(|r| r.income).collect::<Vec<_>>())),
        Arc::new(StringArray::from(
            rows.iter().map(|r| r.city.as_str()).collect::<Vec<_>>(),
        )),
        Arc::new(BooleanArray::from(rows.iter().map(|r| r.member).collect::<Vec<_>>())),
        Arc::new(Int64Array::from(rows.iter().map(|r| r.visits).collect::<Vec<_>>())),
        Arc::new(Float64Array::from(rows.iter().map(|r| r.spend).collect::<Vec<_>>())),
        Arc::new(Int64Array::from(rows.iter().map(|r| r.purchased).collect::<Vec<_>>())),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let rows = generate_rows(&mut rng);

    write_csv("sample_data.csv", &rows)?;
    write_parquet("sample_data.parquet", &rows)?;

    println!(
        "Wrote {} rows ({N_DUPLICATES} duplicated) to sample_data.csv and sample_data.parquet",
        rows.len()
    );
    Ok(())
}
