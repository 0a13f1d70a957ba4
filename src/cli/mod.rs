//! Terminal front end
//!
//! Provides:
//! - Tab completion for SQL keywords, views, columns, dot commands and jobs
//! - Syntax highlighting for SQL
//! - Output format options (table, CSV, JSON, vertical)
//! - The interactive dashboard loop

mod helper;
mod output;
mod repl;

pub use helper::ReplHelper;
pub use output::{OutputFormat, OutputFormatter};
pub use repl::{parse_command, render_response, run_repl, Command, HELP_TEXT};
