//! Interactive dashboard loop
//!
//! Each input line becomes one [`Command`]. Session actions are handed to
//! [`Session::handle`]; help, quit and output format are handled here.

use super::{OutputFormat, OutputFormatter, ReplHelper};
use crate::data::distinct_jobs;
use crate::session::{Action, Page, Response, Session};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use std::collections::BTreeSet;
use std::fmt::Write;
use std::path::PathBuf;
use tracing::{debug, warn};

pub const HELP_TEXT: &str = "\
Pages:
  .page eda|sql        Switch page (.eda and .sql are shortcuts)

Exploratory Data Analysis:
  .charts              Show the four charts for the current filters
  .jobs a,b,...|all    Restrict charts to these jobs
  .age LO HI           Inclusive age range
  .filters             Show current filters
  .reset               Restore default filters

SQL Query Interface:
  <sql>                Run a query (views: customer, campaign)
  .tables              List views
  .schema NAME         Show the columns of a view
  .format FMT          table, csv, json or vertical
  .export PATH         Write the last result as CSV

  .help                This text
  .quit / .exit        Leave";

/// One parsed input line
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Session(Action),
    SetFormat(OutputFormat),
    Help,
    Quit,
    Empty,
}

/// Parse a REPL line in the context of the active page
pub fn parse_command(line: &str, page: Page) -> Result<Command, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Empty);
    }

    if !line.starts_with('.') {
        return match page {
            Page::Sql => Ok(Command::Session(Action::RunQuery(line.to_string()))),
            Page::Eda => Err("SQL runs on the SQL page; switch with .sql".to_string()),
        };
    }

    let (cmd, rest) = match line.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (line, ""),
    };

    let command = match cmd.to_lowercase().as_str() {
        ".help" | ".h" => Command::Help,
        ".quit" | ".exit" | ".q" => Command::Quit,
        ".eda" => Command::Session(Action::SwitchPage(Page::Eda)),
        ".sql" => Command::Session(Action::SwitchPage(Page::Sql)),
        ".page" => {
            let page = Page::from_str(rest)
                .ok_or_else(|| format!("Unknown page '{rest}'. Use eda or sql"))?;
            Command::Session(Action::SwitchPage(page))
        }
        ".charts" => Command::Session(Action::ShowCharts),
        ".filters" => Command::Session(Action::ShowFilters),
        ".reset" => Command::Session(Action::ResetFilters),
        ".jobs" => {
            if rest.eq_ignore_ascii_case("all") {
                Command::Session(Action::SelectAllJobs)
            } else {
                let jobs: BTreeSet<String> = rest
                    .split(',')
                    .map(str::trim)
                    .filter(|j| !j.is_empty())
                    .map(str::to_string)
                    .collect();
                Command::Session(Action::SetJobs(jobs))
            }
        }
        ".age" => {
            let bounds: Vec<&str> = rest
                .split(|c: char| c.is_whitespace() || c == '-')
                .filter(|s| !s.is_empty())
                .collect();
            let [lo, hi] = bounds.as_slice() else {
                return Err("Usage: .age LO HI".to_string());
            };
            let lo = lo.parse::<i64>().map_err(|_| format!("Invalid age '{lo}'"))?;
            let hi = hi.parse::<i64>().map_err(|_| format!("Invalid age '{hi}'"))?;
            Command::Session(Action::SetAgeRange(lo, hi))
        }
        ".tables" => Command::Session(Action::ListTables),
        ".schema" => {
            if rest.is_empty() {
                return Err("Usage: .schema NAME".to_string());
            }
            Command::Session(Action::DescribeTable(rest.to_string()))
        }
        ".format" | ".mode" => {
            let format = OutputFormat::from_str(rest).ok_or_else(|| {
                format!(
                    "Unknown format '{rest}'. Valid formats: {}",
                    OutputFormat::all_names().join(", ")
                )
            })?;
            Command::SetFormat(format)
        }
        ".export" => {
            if rest.is_empty() {
                return Err("Usage: .export PATH".to_string());
            }
            Command::Session(Action::Export(PathBuf::from(rest)))
        }
        other => return Err(format!("Unknown command '{other}'. Type .help for help")),
    };
    Ok(command)
}

/// Text shown for a session response
pub fn render_response(response: &Response, formatter: &OutputFormatter) -> String {
    match response {
        Response::Page(page) => format!("== {} ==", page.title()),
        Response::Charts(text) | Response::Filters(text) => text.clone(),
        Response::QueryResult(result) => {
            let mut out = format!(
                "Query ran successfully! ({} rows in {:.3}ms)\n",
                result.row_count,
                result.metrics.total_time.as_secs_f64() * 1000.0
            );
            out.push_str(&formatter.format_to_string(&result.batches));
            out
        }
        Response::QueryError(msg) => format!("An error occurred: {msg}"),
        Response::Exported { path, rows } => {
            format!("Exported {rows} rows to {}", path.display())
        }
        Response::Tables(views) => views
            .iter()
            .map(|(name, path)| format!("{name}  ({})", path.display()))
            .collect::<Vec<_>>()
            .join("\n"),
        Response::Schema { table, schema } => {
            let mut out = format!("{table}: {} columns\n", schema.fields().len());
            for field in schema.fields() {
                let _ = writeln!(out, "  - {}: {}", field.name(), field.data_type());
            }
            out
        }
        Response::Error(msg) => format!("Error: {msg}"),
    }
}

fn prompt(page: Page) -> &'static str {
    match page {
        Page::Eda => "eda> ",
        Page::Sql => "sql> ",
    }
}

/// Run the interactive loop until `.quit` or end of input
pub async fn run_repl(
    session: &mut Session,
    mut formatter: OutputFormatter,
) -> rustyline::Result<()> {
    let helper = ReplHelper::new();
    for name in session.runner().view_names() {
        if let Ok(schema) = session.runner().table_schema(&name).await {
            let columns = schema.fields().iter().map(|f| f.name().clone()).collect();
            helper.register_table(&name, columns);
        }
    }
    match distinct_jobs(session.dataset().customer()) {
        Ok(jobs) => helper.set_jobs(jobs),
        Err(e) => warn!(error = %e, "No job completions"),
    }

    let mut rl: Editor<ReplHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(helper));

    println!("Bank marketing dashboard. Type .help for commands.");
    println!("{}", render_response(&Response::Page(session.page()), &formatter));

    loop {
        match rl.readline(prompt(session.page())) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.as_str());
                }

                match parse_command(&line, session.page()) {
                    Ok(Command::Empty) => {}
                    Ok(Command::Quit) => break,
                    Ok(Command::Help) => println!("{HELP_TEXT}"),
                    Ok(Command::SetFormat(format)) => {
                        formatter.set_format(format);
                        println!("Output format: {}", format.name());
                    }
                    Ok(Command::Session(action)) => {
                        debug!(?action, "Handling action");
                        let response = session.handle(action).await;
                        println!("{}", render_response(&response, &formatter));
                    }
                    Err(msg) => eprintln!("{msg}"),
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
