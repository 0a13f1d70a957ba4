//! Typed column access over loosely typed Parquet data
//!
//! Input files come from pandas, so integer columns may be Int32 or Int64
//! and text columns may be Utf8, LargeUtf8 or dictionary encoded. These
//! helpers cast to one canonical type before a kernel touches the data.

use crate::error::{DashboardError, Result};
use arrow::array::{Array, ArrayRef, AsArray, Int64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Int64Type};
use arrow::record_batch::RecordBatch;

/// Look up a column by name, naming the table in the error
pub fn column<'a>(batch: &'a RecordBatch, table: &str, name: &str) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| DashboardError::ColumnNotFound {
            table: table.to_string(),
            column: name.to_string(),
        })
}

/// Cast any integer or float array to Int64
pub fn as_int64(array: &dyn Array) -> Result<Int64Array> {
    let casted = cast(array, &DataType::Int64)?;
    Ok(casted.as_primitive::<Int64Type>().clone())
}

/// Cast any string-like array to Utf8
pub fn as_utf8(array: &dyn Array) -> Result<StringArray> {
    let casted = cast(array, &DataType::Utf8)?;
    Ok(casted.as_string::<i32>().clone())
}
