//! Sidebar filters over the joined table
//!
//! A filter never mutates the dataset. `Filters::apply` returns fresh
//! batches holding only the rows that satisfy every predicate.

use crate::data::columns::{as_int64, as_utf8, column};
use crate::data::loader::Table;
use crate::error::{DashboardError, Result};
use arrow::array::{Array, BooleanArray, Int64Array};
use arrow::compute::kernels::boolean::and;
use arrow::compute::kernels::cmp::{gt_eq, lt_eq};
use arrow::compute::{filter_record_batch, max, min};
use arrow::record_batch::RecordBatch;
use std::collections::BTreeSet;
use tracing::debug;

pub const AGE_COLUMN: &str = "age";
pub const JOB_COLUMN: &str = "job";

/// Slider bounds: the observed age span of the customer table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeBounds {
    pub min: i64,
    pub max: i64,
}

impl AgeBounds {
    /// Compute the bounds from a table's age column; `None` when it has no ages
    pub fn from_table(table: &Table) -> Result<Option<Self>> {
        let ages = as_int64(table.column(AGE_COLUMN)?.as_ref())?;
        Ok(match (min(&ages), max(&ages)) {
            (Some(min), Some(max)) => Some(Self { min, max }),
            _ => None,
        })
    }

    /// Clamp a requested range into the bounds
    ///
    /// A range lying entirely outside the bounds falls back to the full span.
    pub fn clamp(&self, (lo, hi): (i64, i64)) -> (i64, i64) {
        let lo = lo.max(self.min);
        let hi = hi.min(self.max);
        if lo > hi {
            (self.min, self.max)
        } else {
            (lo, hi)
        }
    }
}

/// Job subset plus inclusive age range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filters {
    jobs: BTreeSet<String>,
    age_range: (i64, i64),
}

impl Filters {
    pub fn new(jobs: BTreeSet<String>, lo: i64, hi: i64) -> Result<Self> {
        check_range(lo, hi)?;
        Ok(Self {
            jobs,
            age_range: (lo, hi),
        })
    }

    /// Every job of the customer table and the default range clamped to its ages
    pub fn defaults(customer: &Table, default_range: (i64, i64)) -> Result<Self> {
        let jobs = distinct_jobs(customer)?;
        let age_range = match AgeBounds::from_table(customer)? {
            Some(bounds) => bounds.clamp(default_range),
            None => default_range,
        };
        check_range(age_range.0, age_range.1)?;
        Ok(Self { jobs, age_range })
    }

    pub fn jobs(&self) -> &BTreeSet<String> {
        &self.jobs
    }

    pub fn age_range(&self) -> (i64, i64) {
        self.age_range
    }

    pub fn set_jobs(&mut self, jobs: BTreeSet<String>) {
        self.jobs = jobs;
    }

    pub fn set_age_range(&mut self, lo: i64, hi: i64) -> Result<()> {
        check_range(lo, hi)?;
        self.age_range = (lo, hi);
        Ok(())
    }

    /// Rows of `table` matching both the job subset and the age range
    pub fn apply(&self, table: &Table) -> Result<Vec<RecordBatch>> {
        let mut out = Vec::with_capacity(table.batches().len());
        for batch in table.batches() {
            let mask = self.mask(batch, table.name())?;
            let filtered = filter_record_batch(batch, &mask)?;
            if filtered.num_rows() > 0 {
                out.push(filtered);
            }
        }

        debug!(
            input_rows = table.num_rows(),
            output_rows = out.iter().map(|b| b.num_rows()).sum::<usize>(),
            jobs = self.jobs.len(),
            age_range = ?self.age_range,
            "Applied filters"
        );
        Ok(out)
    }

    fn mask(&self, batch: &RecordBatch, table: &str) -> Result<BooleanArray> {
        let ages = as_int64(column(batch, table, AGE_COLUMN)?.as_ref())?;
        let (lo, hi) = self.age_range;
        let above = gt_eq(&ages, &Int64Array::new_scalar(lo))?;
        let below = lt_eq(&ages, &Int64Array::new_scalar(hi))?;
        let in_range = and(&above, &below)?;

        let jobs = as_utf8(column(batch, table, JOB_COLUMN)?.as_ref())?;
        let in_jobs: BooleanArray = jobs
            .iter()
            .map(|job| job.map(|j| self.jobs.contains(j)))
            .collect();

        Ok(and(&in_range, &in_jobs)?)
    }
}

fn check_range(lo: i64, hi: i64) -> Result<()> {
    if lo > hi {
        return Err(DashboardError::InvalidArgument(format!(
            "age range {lo}..{hi} is empty (lower bound exceeds upper bound)"
        )));
    }
    Ok(())
}

/// Distinct non-null job categories of a table, sorted
pub fn distinct_jobs(table: &Table) -> Result<BTreeSet<String>> {
    let jobs = as_utf8(table.column(JOB_COLUMN)?.as_ref())?;
    Ok(jobs.iter().flatten().map(str::to_string).collect())
}
