//! Parquet table loading
//!
//! Each input file is read completely into memory once at session start.
//! Tables are immutable afterwards; derived views are new batch vectors.

use crate::error::{DashboardError, Result};
use arrow::array::{new_empty_array, Array, ArrayRef};
use arrow::compute::concat;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::fmt;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// An in-memory table read from one input file
#[derive(Clone)]
pub struct Table {
    name: String,
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("columns", &self.column_names())
            .field("rows", &self.num_rows())
            .finish()
    }
}

impl Table {
    pub fn new(name: impl Into<String>, schema: SchemaRef, batches: Vec<RecordBatch>) -> Self {
        Self {
            name: name.into(),
            schema,
            batches,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Total row count across all batches
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(|b| b.num_rows()).sum()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.schema.index_of(name).is_ok()
    }

    /// Fail with a descriptive error if `name` is not a column of this table
    pub fn require_column(&self, name: &str) -> Result<()> {
        if self.has_column(name) {
            Ok(())
        } else {
            Err(DashboardError::ColumnNotFound {
                table: self.name.clone(),
                column: name.to_string(),
            })
        }
    }

    /// One column concatenated across all batches
    pub fn column(&self, name: &str) -> Result<ArrayRef> {
        self.require_column(name)?;
        let field = self.schema.field_with_name(name)?;

        let arrays: Vec<&dyn Array> = self
            .batches
            .iter()
            .filter_map(|b| b.column_by_name(name))
            .map(|c| c.as_ref())
            .collect();

        if arrays.is_empty() {
            return Ok(new_empty_array(field.data_type()));
        }
        Ok(concat(&arrays)?)
    }
}

/// Read a Parquet file into a named table
///
/// Errors carry the offending path so a startup failure tells the operator
/// which input is missing or malformed.
pub fn load_table(name: &str, path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let (schema, batches) = read_parquet(path).map_err(|e| DashboardError::load(path, e))?;

    let table = Table::new(name, schema, batches);
    info!(
        table = name,
        path = %path.display(),
        rows = table.num_rows(),
        columns = table.schema.fields().len(),
        "Loaded table"
    );
    Ok(table)
}

fn read_parquet(path: &Path) -> Result<(SchemaRef, Vec<RecordBatch>)> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    debug!(
        path = %path.display(),
        row_groups = builder.metadata().num_row_groups(),
        "Reading Parquet file"
    );

    let reader = builder.build()?;
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((schema, batches))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use parquet::arrow::ArrowWriter;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn sample_batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("customer_id", DataType::Int64, false),
            Field::new("job", DataType::Utf8, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![1, 2, 3])),
                Arc::new(StringArray::from(vec![Some("admin."), None, Some("retired")])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("customer.parquet");
        let batch = sample_batch();

        let file = File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_table("customer", &path).unwrap();
        assert_eq!(table.name(), "customer");
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.column_names(), vec!["customer_id", "job"]);

        let ids = table.column("customer_id").unwrap();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_missing_file_names_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.parquet");

        let err = load_table("customer", &path).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("nope.parquet"), "unexpected message: {msg}");
        assert!(matches!(err, DashboardError::Load { .. }));
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("campaign.parquet");
        std::fs::write(&path, b"definitely not parquet").unwrap();

        let err = load_table("campaign", &path).unwrap_err();
        assert!(err.to_string().contains("campaign.parquet"));
    }

    #[test]
    fn test_column_on_empty_table() {
        let batch = sample_batch();
        let table = Table::new("customer", batch.schema(), vec![]);
        let ids = table.column("customer_id").unwrap();
        assert_eq!(ids.len(), 0);
        assert!(table.column("age").is_err());
    }
}
