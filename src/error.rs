//! Error types for the dashboard

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for dashboard operations
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Main error type for the dashboard
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Failed to load {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: Box<DashboardError>,
    },

    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Nothing to export: run a query first")]
    NothingToExport,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Query engine error: {0}")]
    Engine(#[from] datafusion::error::DataFusionError),
}

impl DashboardError {
    /// Wrap an error with the path of the input file that caused it
    pub fn load(path: impl Into<PathBuf>, source: DashboardError) -> Self {
        DashboardError::Load {
            path: path.into(),
            source: Box::new(source),
        }
    }
}
