//! Bank-marketing dashboard CLI

use campaign_dashboard::cli::{render_response, run_repl, OutputFormat, OutputFormatter};
use campaign_dashboard::config::{DashboardConfig, CAMPAIGN_FILE, CUSTOMER_FILE};
use campaign_dashboard::{Action, Response, SampleGenerator, Session};
use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "campaign-dashboard")]
#[command(about = "Bank marketing campaign dashboard and SQL console")]
struct Cli {
    /// Directory holding customer.parquet and campaign.parquet
    #[arg(long, global = true, default_value = ".")]
    data_dir: PathBuf,

    /// Customer table (overrides --data-dir)
    #[arg(long, global = true)]
    customer: Option<PathBuf>,

    /// Campaign table (overrides --data-dir)
    #[arg(long, global = true)]
    campaign: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive dashboard (default)
    Repl {
        /// Maximum rows to display per result
        #[arg(long)]
        max_rows: Option<usize>,

        /// Output format: table, csv, json, vertical
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Print the exploratory charts
    Eda {
        /// Job to include (repeatable; default all jobs)
        #[arg(short, long = "job")]
        jobs: Vec<String>,

        /// Lower age bound (inclusive)
        #[arg(long)]
        age_min: Option<i64>,

        /// Upper age bound (inclusive)
        #[arg(long)]
        age_max: Option<i64>,
    },

    /// Run one SQL query against the customer and campaign views
    Sql {
        /// SQL query string
        query: String,

        /// Output format: table, csv, json, vertical
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Write synthetic sample data as Parquet
    Generate {
        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Number of customers
        #[arg(short, long, default_value = "5000")]
        rows: usize,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },
}

fn parse_format(name: &str) -> OutputFormat {
    OutputFormat::from_str(name).unwrap_or_else(|| {
        eprintln!(
            "Unknown format '{}'. Valid formats: {}",
            name,
            OutputFormat::all_names().join(", ")
        );
        std::process::exit(2);
    })
}

/// `RUST_LOG` directives on top of a WARN default
fn log_filter(directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(directives)
}

async fn start_session(config: &DashboardConfig) -> Session {
    match Session::start(config).await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // stdout carries results only
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(
            &std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default(),
        ))
        .init();

    let cli = Cli::parse();

    let mut config = DashboardConfig::from_data_dir(&cli.data_dir);
    if let Some(path) = cli.customer {
        config = config.with_customer_path(path);
    }
    if let Some(path) = cli.campaign {
        config = config.with_campaign_path(path);
    }

    let command = cli.command.unwrap_or(Commands::Repl {
        max_rows: None,
        format: "table".to_string(),
    });

    match command {
        Commands::Repl { max_rows, format } => {
            config = config.with_output_format(parse_format(&format));
            if let Some(max) = max_rows {
                config = config.with_max_display_rows(max);
            }

            let mut session = start_session(&config).await;
            let mut formatter = OutputFormatter::new(config.output_format);
            if let Some(max) = config.max_display_rows {
                formatter = formatter.with_max_rows(max);
            }

            if let Err(e) = run_repl(&mut session, formatter).await {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }

        Commands::Eda {
            jobs,
            age_min,
            age_max,
        } => {
            let mut session = start_session(&config).await;
            let formatter = OutputFormatter::default();

            if !jobs.is_empty() {
                let jobs: BTreeSet<String> = jobs.into_iter().collect();
                session.handle(Action::SetJobs(jobs)).await;
            }
            if age_min.is_some() || age_max.is_some() {
                let (lo, hi) = session.filters().age_range();
                let range = (age_min.unwrap_or(lo), age_max.unwrap_or(hi));
                if let Response::Error(msg) =
                    session.handle(Action::SetAgeRange(range.0, range.1)).await
                {
                    eprintln!("Error: {}", msg);
                    std::process::exit(2);
                }
            }

            let filters = session.handle(Action::ShowFilters).await;
            println!("{}\n", render_response(&filters, &formatter));
            let charts = session.handle(Action::ShowCharts).await;
            println!("{}", render_response(&charts, &formatter));
            if matches!(charts, Response::Error(_)) {
                std::process::exit(1);
            }
        }

        Commands::Sql { query, format } => {
            let formatter = OutputFormatter::new(parse_format(&format));
            let mut session = start_session(&config).await;

            let response = session.handle(Action::RunQuery(query)).await;
            match response {
                Response::QueryResult(result) => {
                    eprintln!(
                        "Query ran successfully! ({} rows in {:.3}ms)",
                        result.row_count,
                        result.metrics.total_time.as_secs_f64() * 1000.0
                    );
                    if let Err(e) = formatter.print(&result.batches) {
                        eprintln!("Error: {}", e);
                        std::process::exit(1);
                    }
                }
                other => {
                    eprintln!("{}", render_response(&other, &formatter));
                    std::process::exit(1);
                }
            }
        }

        Commands::Generate { output, rows, seed } => {
            let start = Instant::now();
            let mut gen = SampleGenerator::new(rows).with_seed(seed);

            match gen.write_to(&output) {
                Ok(()) => {
                    println!(
                        "Generated sample data for {} customers in {:?}",
                        rows,
                        start.elapsed()
                    );
                    println!(
                        "Files: {}, {}",
                        output.join(CUSTOMER_FILE).display(),
                        output.join(CAMPAIGN_FILE).display()
                    );
                }
                Err(e) => {
                    eprintln!("Error generating data: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
