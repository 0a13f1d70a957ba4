//! Output formatting for query results
//!
//! Supports multiple output formats:
//! - Table: Pretty-printed ASCII table (default)
//! - CSV: Comma-separated values with a header row
//! - JSON: JSON array of objects
//! - Vertical: One column per line (useful for wide results)
//!
//! A row cap only shortens what is displayed; the result itself is always
//! complete.

use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use std::io::{self, Write};

/// Output format for query results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Pretty-printed ASCII table
    #[default]
    Table,
    /// Comma-separated values
    Csv,
    /// JSON array of objects
    Json,
    /// Vertical format (one column per line)
    Vertical,
}

impl OutputFormat {
    /// Parse format from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" | "t" => Some(Self::Table),
            "csv" | "c" => Some(Self::Csv),
            "json" | "j" => Some(Self::Json),
            "vertical" | "v" => Some(Self::Vertical),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Vertical => "vertical",
        }
    }

    pub fn all_names() -> &'static [&'static str] {
        &["table", "csv", "json", "vertical"]
    }
}

fn to_io(e: ArrowError) -> io::Error {
    io::Error::other(e)
}

/// Formatter for query results
#[derive(Debug, Clone)]
pub struct OutputFormatter {
    format: OutputFormat,
    max_rows: Option<usize>,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            max_rows: None,
        }
    }

    /// Set maximum rows to display
    pub fn with_max_rows(mut self, max: usize) -> Self {
        self.max_rows = Some(max);
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn set_format(&mut self, format: OutputFormat) {
        self.format = format;
    }

    /// Format record batches and write to stdout
    pub fn print(&self, batches: &[RecordBatch]) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        self.write(&mut stdout, batches)
    }

    /// Format record batches and write to the given writer
    pub fn write<W: Write>(&self, writer: &mut W, batches: &[RecordBatch]) -> io::Result<()> {
        let (shown, hidden) = self.limit(batches);
        match self.format {
            OutputFormat::Table => self.write_table(writer, &shown)?,
            OutputFormat::Csv => self.write_csv(writer, &shown)?,
            OutputFormat::Json => self.write_json(writer, &shown)?,
            OutputFormat::Vertical => self.write_vertical(writer, &shown)?,
        }
        // Trailer would corrupt machine-readable output
        if hidden > 0 && matches!(self.format, OutputFormat::Table | OutputFormat::Vertical) {
            writeln!(writer, "... ({hidden} more rows)")?;
        }
        Ok(())
    }

    pub fn format_to_string(&self, batches: &[RecordBatch]) -> String {
        let mut buffer = Vec::new();
        let _ = self.write(&mut buffer, batches);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Slice the batches down to the row cap; returns the kept batches and
    /// the number of rows left out
    fn limit(&self, batches: &[RecordBatch]) -> (Vec<RecordBatch>, usize) {
        let total: usize = batches.iter().map(|b| b.num_rows()).sum();
        let Some(max) = self.max_rows else {
            return (batches.to_vec(), 0);
        };

        let mut remaining = max;
        let mut shown = Vec::new();
        for batch in batches {
            if remaining == 0 {
                break;
            }
            let take = batch.num_rows().min(remaining);
            shown.push(batch.slice(0, take));
            remaining -= take;
        }
        (shown, total.saturating_sub(max))
    }

    fn write_table<W: Write>(&self, writer: &mut W, batches: &[RecordBatch]) -> io::Result<()> {
        if batches.is_empty() {
            return Ok(());
        }
        let display = arrow::util::pretty::pretty_format_batches(batches).map_err(to_io)?;
        writeln!(writer, "{display}")
    }

    fn write_csv<W: Write>(&self, writer: &mut W, batches: &[RecordBatch]) -> io::Result<()> {
        if batches.is_empty() {
            return Ok(());
        }
        let mut csv = arrow::csv::WriterBuilder::new()
            .with_header(true)
            .build(writer);
        for batch in batches {
            csv.write(batch).map_err(to_io)?;
        }
        Ok(())
    }

    fn write_json<W: Write>(&self, writer: &mut W, batches: &[RecordBatch]) -> io::Result<()> {
        let mut json = arrow::json::WriterBuilder::new()
            .with_explicit_nulls(true)
            .build::<_, arrow::json::writer::JsonArray>(&mut *writer);
        let refs: Vec<&RecordBatch> = batches.iter().collect();
        json.write_batches(&refs).map_err(to_io)?;
        json.finish().map_err(to_io)?;
        drop(json);
        writeln!(writer)
    }

    fn write_vertical<W: Write>(&self, writer: &mut W, batches: &[RecordBatch]) -> io::Result<()> {
        let options = FormatOptions::default().with_null("NULL");
        let mut row_number = 0;

        for batch in batches {
            let schema = batch.schema();
            let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
            let width = names.iter().map(|n| n.len()).max().unwrap_or(0);
            let formatters = batch
                .columns()
                .iter()
                .map(|c| ArrayFormatter::try_new(c.as_ref(), &options))
                .collect::<Result<Vec<_>, _>>()
                .map_err(to_io)?;

            for row in 0..batch.num_rows() {
                row_number += 1;
                writeln!(
                    writer,
                    "*************************** {row_number} ***************************"
                )?;
                for (name, formatter) in names.iter().zip(&formatters) {
                    writeln!(writer, "{name:>width$}: {}", formatter.value(row))?;
                }
            }
        }
        Ok(())
    }
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    fn create_test_batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("customer_id", DataType::Int64, false),
            Field::new("job", DataType::Utf8, true),
            Field::new("balance", DataType::Float64, true),
        ]));

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![1, 2, 3])),
                Arc::new(StringArray::from(vec![Some("admin."), Some("services"), None])),
                Arc::new(Float64Array::from(vec![Some(95.5), Some(87.25), Some(92.5)])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from_str("table"), Some(OutputFormat::Table));
        assert_eq!(OutputFormat::from_str("TABLE"), Some(OutputFormat::Table));
        assert_eq!(OutputFormat::from_str("c"), Some(OutputFormat::Csv));
        assert_eq!(OutputFormat::from_str("j"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("vertical"), Some(OutputFormat::Vertical));
        assert_eq!(OutputFormat::from_str("invalid"), None);
    }

    #[test]
    fn test_csv_output() {
        let formatter = OutputFormatter::new(OutputFormat::Csv);
        let output = formatter.format_to_string(&[create_test_batch()]);

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "customer_id,job,balance");
        assert_eq!(lines[1], "1,admin.,95.5");
        assert_eq!(lines[2], "2,services,87.25");
        assert_eq!(lines[3], "3,,92.5");
    }

    #[test]
    fn test_json_output() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let output = formatter.format_to_string(&[create_test_batch()]);

        assert!(output.starts_with('['));
        assert!(output.contains("\"customer_id\":1"));
        assert!(output.contains("\"job\":\"admin.\""));
        assert!(output.contains("\"job\":null"));
    }

    #[test]
    fn test_vertical_output() {
        let formatter = OutputFormatter::new(OutputFormat::Vertical);
        let output = formatter.format_to_string(&[create_test_batch()]);

        assert!(output.contains("*** 1 ***"));
        assert!(output.contains("*** 3 ***"));
        assert!(output.contains("job: admin."));
        assert!(output.contains("job: NULL"));
    }

    #[test]
    fn test_table_output() {
        let formatter = OutputFormatter::new(OutputFormat::Table);
        let output = formatter.format_to_string(&[create_test_batch()]);

        assert!(output.contains("+"));
        assert!(output.contains("customer_id"));
        assert!(output.contains("services"));
    }

    #[test]
    fn test_max_rows_table_trailer() {
        let formatter = OutputFormatter::new(OutputFormat::Table).with_max_rows(2);
        let output = formatter.format_to_string(&[create_test_batch()]);

        assert!(output.contains("services"));
        assert!(!output.contains("92.5"));
        assert!(output.contains("... (1 more rows)"));
    }

    #[test]
    fn test_max_rows_csv_has_no_trailer() {
        let formatter = OutputFormatter::new(OutputFormat::Csv).with_max_rows(2);
        let output = formatter.format_to_string(&[create_test_batch()]);
        assert_eq!(output.lines().count(), 3);
    }

    #[test]
    fn test_empty_batches() {
        let output = OutputFormatter::new(OutputFormat::Csv).format_to_string(&[]);
        assert!(output.is_empty());

        let output = OutputFormatter::new(OutputFormat::Json).format_to_string(&[]);
        assert_eq!(output.trim(), "[]");
    }

    #[test]
    fn test_set_format() {
        let mut formatter = OutputFormatter::default();
        assert_eq!(formatter.format(), OutputFormat::Table);
        formatter.set_format(OutputFormat::Csv);
        assert_eq!(formatter.format().name(), "csv");
    }
}
