//! Dashboard session
//!
//! The session owns everything built at startup (dataset, engine context)
//! plus the interactive state (page, filters, last result). Each user
//! action is one call to [`Session::handle`], which returns what to show.
//! Nothing is rebuilt between actions.

use crate::charts::Charts;
use crate::cli::{OutputFormat, OutputFormatter};
use crate::config::DashboardConfig;
use crate::data::{distinct_jobs, AgeBounds, Dataset, Filters};
use crate::error::{DashboardError, Result};
use crate::query::{QueryOutcome, QueryResult, QueryRunner};
use arrow::datatypes::SchemaRef;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Which half of the dashboard is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Eda,
    Sql,
}

impl Page {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "eda" | "charts" => Some(Self::Eda),
            "sql" | "query" => Some(Self::Sql),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Eda => "Exploratory Data Analysis",
            Self::Sql => "SQL Query Interface",
        }
    }
}

/// One user interaction
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SwitchPage(Page),
    /// Restrict charts to these jobs
    SetJobs(BTreeSet<String>),
    /// Select every job again
    SelectAllJobs,
    SetAgeRange(i64, i64),
    ResetFilters,
    ShowFilters,
    ShowCharts,
    RunQuery(String),
    Export(PathBuf),
    ListTables,
    DescribeTable(String),
}

/// What the front end should display after an action
#[derive(Debug)]
pub enum Response {
    Page(Page),
    Charts(String),
    Filters(String),
    /// Success banner plus the result table
    QueryResult(QueryResult),
    /// Error banner with the engine's message
    QueryError(String),
    Exported { path: PathBuf, rows: usize },
    /// View names with their backing files
    Tables(Vec<(String, PathBuf)>),
    Schema { table: String, schema: SchemaRef },
    Error(String),
}

pub struct Session {
    dataset: Dataset,
    runner: QueryRunner,
    page: Page,
    filters: Filters,
    default_filters: Filters,
    age_bounds: Option<AgeBounds>,
    last_result: Option<QueryResult>,
}

impl Session {
    /// Load data and open the engine; any failure here is fatal
    pub async fn start(config: &DashboardConfig) -> Result<Self> {
        let dataset = Dataset::load(config).await?;
        let runner = QueryRunner::open(&config.customer_path, &config.campaign_path).await?;
        Self::from_parts(dataset, runner, config.default_age_range)
    }

    pub fn from_parts(
        dataset: Dataset,
        runner: QueryRunner,
        default_age_range: (i64, i64),
    ) -> Result<Self> {
        let filters = Filters::defaults(dataset.customer(), default_age_range)?;
        let age_bounds = AgeBounds::from_table(dataset.customer())?;
        info!(
            jobs = filters.jobs().len(),
            age_range = ?filters.age_range(),
            "Session started"
        );

        Ok(Self {
            dataset,
            runner,
            page: Page::default(),
            default_filters: filters.clone(),
            filters,
            age_bounds,
            last_result: None,
        })
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn runner(&self) -> &QueryRunner {
        &self.runner
    }

    pub fn age_bounds(&self) -> Option<AgeBounds> {
        self.age_bounds
    }

    pub fn last_result(&self) -> Option<&QueryResult> {
        self.last_result.as_ref()
    }

    /// Process one action. Recoverable problems become `Response::Error`
    /// or `Response::QueryError`; nothing here ends the session.
    pub async fn handle(&mut self, action: Action) -> Response {
        match action {
            Action::SwitchPage(page) => {
                self.page = page;
                Response::Page(page)
            }
            Action::SetJobs(jobs) => {
                self.filters.set_jobs(jobs);
                self.describe_filters()
            }
            Action::SelectAllJobs => {
                match distinct_jobs(self.dataset.customer()) {
                    Ok(jobs) => self.filters.set_jobs(jobs),
                    Err(e) => return Response::Error(e.to_string()),
                }
                self.describe_filters()
            }
            Action::SetAgeRange(lo, hi) => match self.filters.set_age_range(lo, hi) {
                Ok(()) => self.describe_filters(),
                Err(e) => Response::Error(e.to_string()),
            },
            Action::ResetFilters => {
                self.filters = self.default_filters.clone();
                self.describe_filters()
            }
            Action::ShowFilters => self.describe_filters(),
            Action::ShowCharts => match Charts::compute(&self.dataset, &self.filters) {
                Ok(charts) => Response::Charts(charts.render()),
                Err(e) => Response::Error(e.to_string()),
            },
            Action::RunQuery(sql) => match self.runner.execute(&sql).await {
                QueryOutcome::Success(result) => {
                    self.last_result = Some(result.clone());
                    Response::QueryResult(result)
                }
                QueryOutcome::Error(msg) => Response::QueryError(msg),
            },
            Action::Export(path) => match self.export(&path) {
                Ok(rows) => Response::Exported { path, rows },
                Err(e) => Response::Error(e.to_string()),
            },
            Action::ListTables => {
                let views = self
                    .runner
                    .view_names()
                    .into_iter()
                    .filter_map(|name| {
                        let path = self.runner.view_path(&name)?.to_path_buf();
                        Some((name, path))
                    })
                    .collect();
                Response::Tables(views)
            }
            Action::DescribeTable(table) => match self.runner.table_schema(&table).await {
                Ok(schema) => Response::Schema { table, schema },
                Err(e) => Response::Error(e.to_string()),
            },
        }
    }

    fn describe_filters(&self) -> Response {
        let (lo, hi) = self.filters.age_range();
        let jobs: Vec<&str> = self.filters.jobs().iter().map(String::as_str).collect();
        let mut text = format!("Age range: {lo}-{hi}");
        if let Some(bounds) = self.age_bounds {
            text.push_str(&format!(" (data: {}-{})", bounds.min, bounds.max));
        }
        text.push_str(&format!("\nJobs ({}): {}", jobs.len(), jobs.join(", ")));
        Response::Filters(text)
    }

    /// Write the last successful result as CSV
    fn export(&self, path: &Path) -> Result<usize> {
        let result = self
            .last_result
            .as_ref()
            .ok_or(DashboardError::NothingToExport)?;

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        OutputFormatter::new(OutputFormat::Csv).write(&mut writer, &result.batches)?;
        writer.flush()?;

        info!(path = %path.display(), rows = result.row_count, "Exported query result");
        Ok(result.row_count)
    }
}
