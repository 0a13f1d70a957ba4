//! Shared Parquet fixtures for integration tests

#![allow(dead_code)]

use arrow::array::{Int32Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use campaign_dashboard::config::{DashboardConfig, CAMPAIGN_FILE, CUSTOMER_FILE};
use parquet::arrow::ArrowWriter;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub const JOBS: [&str; 3] = ["admin.", "technician", "services"];

/// Customer ids 1..=12
pub const CUSTOMER_IDS: std::ops::RangeInclusive<i64> = 1..=12;
pub const AGES: [i32; 12] = [22, 25, 30, 35, 40, 45, 50, 55, 60, 61, 70, 28];

/// Campaign rows; 20 and 30 have no customer, most customers have no call
pub const CAMPAIGN_IDS: [i64; 8] = [2, 3, 5, 7, 11, 12, 20, 30];
pub const DEPOSITS: [Option<&str>; 8] = [
    Some("yes"),
    Some("no"),
    Some("yes"),
    Some("maybe"),
    None,
    Some("yes"),
    Some("no"),
    Some("yes"),
];

pub fn job_of(id: i64) -> &'static str {
    JOBS[((id - 1) % 3) as usize]
}

pub fn age_of(id: i64) -> i64 {
    AGES[(id - 1) as usize] as i64
}

/// Expected binary outcome for a joined customer id
pub fn expected_outcome(id: i64) -> Option<i64> {
    let pos = CAMPAIGN_IDS.iter().position(|c| *c == id)?;
    match DEPOSITS[pos] {
        Some("yes") => Some(1),
        Some("no") => Some(0),
        _ => None,
    }
}

pub fn customer_batch() -> RecordBatch {
    // Age is Int32 like a pandas export with downcast integers
    let schema = Arc::new(Schema::new(vec![
        Field::new("customer_id", DataType::Int64, false),
        Field::new("age", DataType::Int32, false),
        Field::new("job", DataType::Utf8, false),
        Field::new("has_loan_or_housing", DataType::Int64, false),
    ]));
    let ids: Vec<i64> = CUSTOMER_IDS.collect();
    let jobs: Vec<&str> = ids.iter().map(|id| job_of(*id)).collect();
    let flags: Vec<i64> = ids.iter().map(|id| id % 2).collect();

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(ids)),
            Arc::new(Int32Array::from(AGES.to_vec())),
            Arc::new(StringArray::from(jobs)),
            Arc::new(Int64Array::from(flags)),
        ],
    )
    .unwrap()
}

pub fn campaign_batch() -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("customer_id", DataType::Int64, false),
        Field::new("duration", DataType::Int64, false),
        Field::new("deposit", DataType::Utf8, true),
    ]));
    let durations: Vec<i64> = (1..=CAMPAIGN_IDS.len() as i64).map(|i| i * 100).collect();

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(CAMPAIGN_IDS.to_vec())),
            Arc::new(Int64Array::from(durations)),
            Arc::new(StringArray::from(DEPOSITS.to_vec())),
        ],
    )
    .unwrap()
}

pub fn write_parquet(path: &Path, batch: &RecordBatch) {
    let file = File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
    writer.write(batch).unwrap();
    writer.close().unwrap();
}

/// Temp directory with both fixture files and a config pointing at it
pub fn fixture_dir() -> (TempDir, DashboardConfig) {
    let dir = TempDir::new().unwrap();
    write_parquet(&dir.path().join(CUSTOMER_FILE), &customer_batch());
    write_parquet(&dir.path().join(CAMPAIGN_FILE), &campaign_batch());
    let config = DashboardConfig::from_data_dir(dir.path());
    (dir, config)
}

/// Flatten one Int64-castable column across batches
pub fn int_column(batches: &[RecordBatch], name: &str) -> Vec<Option<i64>> {
    batches
        .iter()
        .flat_map(|b| {
            let col = b.column_by_name(name).unwrap();
            let col = arrow::compute::cast(col, &DataType::Int64).unwrap();
            let col = col.as_any().downcast_ref::<Int64Array>().unwrap().clone();
            col.iter().collect::<Vec<_>>()
        })
        .collect()
}

/// Flatten one Utf8 column across batches
pub fn str_column(batches: &[RecordBatch], name: &str) -> Vec<Option<String>> {
    batches
        .iter()
        .flat_map(|b| {
            let col = b.column_by_name(name).unwrap();
            let col = arrow::compute::cast(col, &DataType::Utf8).unwrap();
            let col = col.as_any().downcast_ref::<StringArray>().unwrap().clone();
            col.iter().map(|v| v.map(str::to_string)).collect::<Vec<_>>()
        })
        .collect()
}
