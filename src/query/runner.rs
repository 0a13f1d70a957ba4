//! Query runner - the ad-hoc SQL box of the dashboard
//!
//! One engine context per session. The two input files are registered as
//! views that the engine resolves against the files at execution time. Any
//! query text is accepted and run as-is; failures come back as an
//! [`QueryOutcome::Error`] carrying the engine's message.

use crate::error::{DashboardError, Result};
use arrow::datatypes::{Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use datafusion::datasource::TableProvider;
use datafusion::prelude::{ParquetReadOptions, SessionContext};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub const CUSTOMER_VIEW: &str = "customer";
pub const CAMPAIGN_VIEW: &str = "campaign";

/// Query execution result
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// Output schema
    pub schema: SchemaRef,
    /// Result batches
    pub batches: Vec<RecordBatch>,
    /// Total row count
    pub row_count: usize,
    /// Execution metrics
    pub metrics: QueryMetrics,
}

/// Query execution metrics
#[derive(Debug, Clone, Default)]
pub struct QueryMetrics {
    /// Time spent parsing and planning
    pub plan_time: Duration,
    /// Time spent executing and collecting
    pub execute_time: Duration,
    /// Total time
    pub total_time: Duration,
}

/// What a query submission produced: a full table or an error message
#[derive(Debug)]
pub enum QueryOutcome {
    Success(QueryResult),
    Error(String),
}

impl QueryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, QueryOutcome::Success(_))
    }

    pub fn result(&self) -> Option<&QueryResult> {
        match self {
            QueryOutcome::Success(result) => Some(result),
            QueryOutcome::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            QueryOutcome::Success(_) => None,
            QueryOutcome::Error(msg) => Some(msg),
        }
    }
}

/// Session-scoped engine connection with the input files as views
pub struct QueryRunner {
    ctx: SessionContext,
    views: Vec<(String, PathBuf)>,
}

impl QueryRunner {
    /// Open a context and register `customer` and `campaign`
    pub async fn open(customer: impl AsRef<Path>, campaign: impl AsRef<Path>) -> Result<Self> {
        let mut runner = Self {
            ctx: SessionContext::new(),
            views: Vec::new(),
        };
        runner.register_view(CUSTOMER_VIEW, customer).await?;
        runner.register_view(CAMPAIGN_VIEW, campaign).await?;
        Ok(runner)
    }

    /// Register a Parquet file under `name`
    pub async fn register_view(&mut self, name: &str, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(DashboardError::load(
                path,
                DashboardError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "file does not exist",
                )),
            ));
        }
        let location = path.to_str().ok_or_else(|| {
            DashboardError::InvalidArgument(format!("path is not valid UTF-8: {}", path.display()))
        })?;

        // The listing only picks up files with the configured extension
        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let options = ParquetReadOptions {
            file_extension: &extension,
            ..Default::default()
        };

        self.ctx
            .register_parquet(name, location, options)
            .await
            .map_err(|e| DashboardError::load(path, e.into()))?;

        info!(view = name, path = %path.display(), "Registered view");
        self.views.push((name.to_string(), path.to_path_buf()));
        Ok(())
    }

    /// Run `sql` as-is; never fails and never panics through
    pub async fn execute(&self, sql: &str) -> QueryOutcome {
        let run = AssertUnwindSafe(self.try_execute(sql)).catch_unwind().await;
        match run {
            Ok(Ok(result)) => {
                info!(
                    rows = result.row_count,
                    elapsed = ?result.metrics.total_time,
                    "Query ran successfully"
                );
                QueryOutcome::Success(result)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Query failed");
                QueryOutcome::Error(e.to_string())
            }
            Err(panic) => {
                let msg = panic_message(panic.as_ref());
                warn!(error = %msg, "Query panicked");
                QueryOutcome::Error(format!("Query engine panicked: {msg}"))
            }
        }
    }

    async fn try_execute(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();
        let mut metrics = QueryMetrics::default();

        let df = self.ctx.sql(sql).await?;
        metrics.plan_time = start.elapsed();

        let execute_start = Instant::now();
        let schema: SchemaRef = Arc::new(Schema::from(df.schema()));
        let mut batches = df.collect().await?;
        metrics.execute_time = execute_start.elapsed();

        // Zero-row results keep one empty batch so writers still emit the header
        if batches.is_empty() {
            batches.push(RecordBatch::new_empty(schema.clone()));
        }
        metrics.total_time = start.elapsed();

        let row_count = batches.iter().map(|b| b.num_rows()).sum();
        Ok(QueryResult {
            schema,
            batches,
            row_count,
            metrics,
        })
    }

    /// Registered views in registration order
    pub fn view_names(&self) -> Vec<String> {
        self.views.iter().map(|(name, _)| name.clone()).collect()
    }

    /// File backing a view
    pub fn view_path(&self, name: &str) -> Option<&Path> {
        self.views
            .iter()
            .find(|(view, _)| view == name)
            .map(|(_, path)| path.as_path())
    }

    /// Schema of any table known to the context
    pub async fn table_schema(&self, name: &str) -> Result<SchemaRef> {
        let provider = self.ctx.table_provider(name).await?;
        Ok(provider.schema())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_accessors() {
        let err = QueryOutcome::Error("boom".to_string());
        assert!(!err.is_success());
        assert!(err.result().is_none());
        assert_eq!(err.error(), Some("boom"));
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(payload.as_ref()), "static message");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(payload.as_ref()), "owned message");

        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }

    #[tokio::test]
    async fn test_missing_file_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("customer.parquet");
        let err = QueryRunner::open(&missing, &missing).await.err().unwrap();
        assert!(err.to_string().contains("customer.parquet"));
    }
}
