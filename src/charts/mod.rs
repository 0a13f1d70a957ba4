//! Exploratory charts
//!
//! Four fixed charts:
//! 1. Customers with a loan or housing flag (unfiltered customer table)
//! 2. Age distribution stacked by deposit outcome
//! 3. Call duration distribution stacked by deposit outcome
//! 4. Job counts split by deposit outcome
//!
//! Charts 2-4 read the filtered view of the joined table. Each chart is
//! computed into plain data first so it can be tested without rendering.

mod histogram;
mod render;

pub use histogram::StackedHistogram;
pub use render::{render_bars, render_grouped, render_histogram, BAR_WIDTH};

use crate::data::{as_int64, as_utf8, column, Dataset, Filters, Table, AGE_COLUMN, JOB_COLUMN};
use crate::error::Result;
use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use arrow::record_batch::RecordBatch;
use std::collections::BTreeMap;

pub const LOAN_OR_HOUSING_COLUMN: &str = "has_loan_or_housing";
pub const DURATION_COLUMN: &str = "duration";
pub const AGE_BINS: usize = 20;
pub const DURATION_BINS: usize = 30;

/// `(value, count)` pairs, most frequent first
pub fn value_counts(table: &Table, name: &str) -> Result<Vec<(i64, usize)>> {
    let values = as_int64(table.column(name)?.as_ref())?;
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for value in values.iter().flatten() {
        *counts.entry(value).or_default() += 1;
    }

    let mut out: Vec<(i64, usize)> = counts.into_iter().collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    Ok(out)
}

/// `(value, outcome)` pairs from filtered batches, skipping rows with a null in either
pub fn outcome_pairs(
    batches: &[RecordBatch],
    value_column: &str,
    outcome_column: &str,
) -> Result<Vec<(f64, i64)>> {
    let mut pairs = Vec::new();
    for batch in batches {
        let values = cast(column(batch, "joined", value_column)?, &DataType::Float64)?;
        let values = values.as_primitive::<Float64Type>();
        let outcomes = as_int64(column(batch, "joined", outcome_column)?.as_ref())?;

        for (value, outcome) in values.iter().zip(outcomes.iter()) {
            if let (Some(v), Some(o)) = (value, outcome) {
                pairs.push((v, o));
            }
        }
    }
    Ok(pairs)
}

/// Row counts per job, split by outcome, sorted by job then outcome
pub fn job_outcome_counts(
    batches: &[RecordBatch],
    outcome_column: &str,
) -> Result<Vec<(String, Vec<(i64, usize)>)>> {
    let mut counts: BTreeMap<String, BTreeMap<i64, usize>> = BTreeMap::new();
    for batch in batches {
        let jobs = as_utf8(column(batch, "joined", JOB_COLUMN)?.as_ref())?;
        let outcomes = as_int64(column(batch, "joined", outcome_column)?.as_ref())?;

        for row in 0..batch.num_rows() {
            if jobs.is_null(row) || outcomes.is_null(row) {
                continue;
            }
            *counts
                .entry(jobs.value(row).to_string())
                .or_default()
                .entry(outcomes.value(row))
                .or_default() += 1;
        }
    }

    Ok(counts
        .into_iter()
        .map(|(job, by_outcome)| (job, by_outcome.into_iter().collect()))
        .collect())
}

/// All four charts for one filter state
#[derive(Debug, Clone)]
pub struct Charts {
    pub loan_or_housing: Vec<(i64, usize)>,
    pub age: StackedHistogram,
    pub duration: StackedHistogram,
    pub jobs: Vec<(String, Vec<(i64, usize)>)>,
    /// Rows in the filtered view
    pub filtered_rows: usize,
}

impl Charts {
    pub fn compute(dataset: &Dataset, filters: &Filters) -> Result<Self> {
        let outcome = dataset.outcome_column();
        let filtered = filters.apply(dataset.joined())?;

        Ok(Self {
            loan_or_housing: value_counts(dataset.customer(), LOAN_OR_HOUSING_COLUMN)?,
            age: StackedHistogram::build(&outcome_pairs(&filtered, AGE_COLUMN, outcome)?, AGE_BINS),
            duration: StackedHistogram::build(
                &outcome_pairs(&filtered, DURATION_COLUMN, outcome)?,
                DURATION_BINS,
            ),
            jobs: job_outcome_counts(&filtered, outcome)?,
            filtered_rows: filtered.iter().map(|b| b.num_rows()).sum(),
        })
    }

    pub fn render(&self) -> String {
        let loan_rows: Vec<(String, usize)> = self
            .loan_or_housing
            .iter()
            .map(|(value, count)| (flag_label(*value), *count))
            .collect();

        [
            render_bars("1. Customers with Loan or Housing", &loan_rows),
            render_histogram("2. Age Distribution vs Deposit Outcome", "deposit", &self.age),
            render_histogram(
                "3. Call Duration Distribution by Deposit Outcome",
                "deposit",
                &self.duration,
            ),
            render_grouped("4. Job Distribution and Deposit Outcome", "deposit", &self.jobs),
        ]
        .join("\n")
    }
}

fn flag_label(value: i64) -> String {
    match value {
        0 => "No".to_string(),
        1 => "Yes".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use std::sync::Arc;

    fn joined_batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("age", DataType::Int64, true),
            Field::new("job", DataType::Utf8, true),
            Field::new("duration", DataType::Int64, true),
            Field::new("deposit", DataType::Int64, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![30, 40, 50, 35])),
                Arc::new(StringArray::from(vec![
                    Some("admin."),
                    Some("admin."),
                    Some("retired"),
                    None,
                ])),
                Arc::new(Int64Array::from(vec![Some(100), Some(200), None, Some(50)])),
                Arc::new(Int64Array::from(vec![Some(1), Some(0), Some(1), None])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_value_counts_orders_by_frequency() {
        let schema = Arc::new(Schema::new(vec![Field::new(
            "has_loan_or_housing",
            DataType::Int64,
            true,
        )]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(Int64Array::from(vec![Some(0), Some(1), Some(1), None]))],
        )
        .unwrap();
        let table = Table::new("customer", schema, vec![batch]);

        assert_eq!(
            value_counts(&table, "has_loan_or_housing").unwrap(),
            vec![(1, 2), (0, 1)]
        );
    }

    #[test]
    fn test_outcome_pairs_skip_nulls() {
        let pairs = outcome_pairs(&[joined_batch()], "duration", "deposit").unwrap();
        assert_eq!(pairs, vec![(100.0, 1), (200.0, 0)]);
    }

    #[test]
    fn test_job_outcome_counts() {
        let counts = job_outcome_counts(&[joined_batch()], "deposit").unwrap();
        assert_eq!(
            counts,
            vec![
                ("admin.".to_string(), vec![(0, 1), (1, 1)]),
                ("retired".to_string(), vec![(1, 1)]),
            ]
        );
    }

    #[test]
    fn test_flag_labels() {
        assert_eq!(flag_label(0), "No");
        assert_eq!(flag_label(1), "Yes");
        assert_eq!(flag_label(7), "7");
    }
}
