//! Bank-marketing analytics dashboard
//!
//! Loads a customer table and a campaign-call table from Parquet, joins them
//! on `customer_id` and serves two pages: charts over a filtered view of the
//! joined data, and an ad-hoc SQL console over the raw files.

pub mod charts;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod query;
pub mod sample;
pub mod session;

// Re-export main types
pub use charts::Charts;
pub use config::DashboardConfig;
pub use data::{Dataset, Filters, Table};
pub use error::{DashboardError, Result};
pub use query::{QueryOutcome, QueryResult, QueryRunner};
pub use sample::SampleGenerator;
pub use session::{Action, Page, Response, Session};
