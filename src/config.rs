//! Dashboard configuration

use crate::cli::OutputFormat;
use std::path::{Path, PathBuf};

/// Default file name of the customer table
pub const CUSTOMER_FILE: &str = "customer.parquet";
/// Default file name of the campaign table
pub const CAMPAIGN_FILE: &str = "campaign.parquet";
/// Initial age filter before it is clamped to the data
pub const DEFAULT_AGE_RANGE: (i64, i64) = (25, 60);

/// Settings for one dashboard session
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Path to the customer table
    pub customer_path: PathBuf,
    /// Path to the campaign table
    pub campaign_path: PathBuf,
    /// Initial age filter (inclusive)
    pub default_age_range: (i64, i64),
    /// Rows shown by the REPL table formatter. Execution is never capped.
    pub max_display_rows: Option<usize>,
    /// Output format for query results
    pub output_format: OutputFormat,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self::from_data_dir(".")
    }
}

impl DashboardConfig {
    /// Use the default file names inside `dir`
    pub fn from_data_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            customer_path: dir.join(CUSTOMER_FILE),
            campaign_path: dir.join(CAMPAIGN_FILE),
            default_age_range: DEFAULT_AGE_RANGE,
            max_display_rows: None,
            output_format: OutputFormat::Table,
        }
    }

    pub fn with_customer_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.customer_path = path.into();
        self
    }

    pub fn with_campaign_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.campaign_path = path.into();
        self
    }

    pub fn with_default_age_range(mut self, lo: i64, hi: i64) -> Self {
        self.default_age_range = (lo, hi);
        self
    }

    pub fn with_max_display_rows(mut self, max: usize) -> Self {
        self.max_display_rows = Some(max);
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }
}
