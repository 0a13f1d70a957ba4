//! REPL helper providing completion and highlighting

use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

/// SQL keywords for completion and highlighting
pub const SQL_KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "GROUP", "BY", "HAVING", "ORDER", "ASC", "DESC", "LIMIT",
    "OFFSET", "DISTINCT", "AS", "CASE", "WHEN", "THEN", "ELSE", "END", "JOIN", "INNER", "LEFT",
    "RIGHT", "FULL", "OUTER", "CROSS", "ON", "USING", "UNION", "INTERSECT", "EXCEPT", "AND",
    "OR", "NOT", "IN", "EXISTS", "BETWEEN", "LIKE", "ILIKE", "IS", "NULL", "TRUE", "FALSE",
    "WITH", "OVER", "PARTITION", "CAST", "CREATE", "VIEW", "TABLE", "DESCRIBE", "SHOW",
    "TABLES", "EXPLAIN",
];

/// Functions highlighted differently from keywords
const SQL_FUNCTIONS: &[&str] = &[
    "COUNT", "SUM", "AVG", "MIN", "MAX", "MEDIAN", "STDDEV", "COALESCE", "NULLIF", "ROUND",
    "FLOOR", "CEIL", "ABS", "LOWER", "UPPER", "LENGTH", "CONCAT", "SUBSTR", "APPROX_PERCENTILE_CONT",
];

/// Dot commands for the REPL
pub const DOT_COMMANDS: &[&str] = &[
    ".help", ".quit", ".exit", ".page", ".eda", ".sql", ".jobs", ".age", ".filters", ".reset",
    ".charts", ".tables", ".schema", ".format", ".export",
];

const PAGE_NAMES: &[&str] = &["eda", "sql"];

/// REPL helper that completes SQL, dot commands, views, columns and jobs
#[derive(Clone)]
pub struct ReplHelper {
    /// View name -> column names
    tables: Arc<RwLock<HashMap<String, Vec<String>>>>,
    /// Job categories offered after `.jobs`
    jobs: Arc<RwLock<BTreeSet<String>>>,
    highlighting_enabled: bool,
}

impl ReplHelper {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(HashMap::new())),
            jobs: Arc::new(RwLock::new(BTreeSet::new())),
            highlighting_enabled: true,
        }
    }

    pub fn without_highlighting(mut self) -> Self {
        self.highlighting_enabled = false;
        self
    }

    /// Register a view for completion
    pub fn register_table(&self, name: &str, columns: Vec<String>) {
        if let Ok(mut tables) = self.tables.write() {
            tables.insert(name.to_lowercase(), columns);
        }
    }

    pub fn set_jobs(&self, jobs: impl IntoIterator<Item = String>) {
        if let Ok(mut known) = self.jobs.write() {
            *known = jobs.into_iter().collect();
        }
    }

    fn get_completions(&self, word: &str, line: &str) -> Vec<Pair> {
        let word_lower = word.to_lowercase();
        let trimmed = line.trim_start();

        if trimmed.starts_with('.') {
            return self.dot_completions(word, &word_lower, trimmed);
        }

        let mut completions = Vec::new();

        // keep the case the user started typing in
        let use_uppercase = word
            .chars()
            .next()
            .map(|c| c.is_uppercase())
            .unwrap_or(true);
        for &kw in SQL_KEYWORDS.iter().chain(SQL_FUNCTIONS) {
            if kw.to_lowercase().starts_with(&word_lower) {
                let replacement = if use_uppercase {
                    kw.to_string()
                } else {
                    kw.to_lowercase()
                };
                completions.push(Pair {
                    display: kw.to_string(),
                    replacement,
                });
            }
        }

        let line_lower = line.to_lowercase();
        let Ok(tables) = self.tables.read() else {
            return completions;
        };

        if after_table_keyword(&line_lower) {
            for table in tables.keys() {
                if table.starts_with(&word_lower) {
                    completions.push(Pair {
                        display: table.clone(),
                        replacement: table.clone(),
                    });
                }
            }
        }

        // columns of any view already mentioned in the statement
        for (table, columns) in tables.iter() {
            if !mentions_table(&line_lower, table) {
                continue;
            }
            for col in columns {
                let col_lower = col.to_lowercase();
                if col_lower.starts_with(&word_lower)
                    && !completions
                        .iter()
                        .any(|p| p.replacement.to_lowercase() == col_lower)
                {
                    completions.push(Pair {
                        display: col.clone(),
                        replacement: col.clone(),
                    });
                }
            }
        }

        completions
    }

    fn dot_completions(&self, word: &str, word_lower: &str, line: &str) -> Vec<Pair> {
        let mut parts = line.splitn(2, char::is_whitespace);
        let command = parts.next().unwrap_or_default();
        let has_argument = parts.next().is_some();

        let pairs = |candidates: Vec<String>| -> Vec<Pair> {
            candidates
                .into_iter()
                .filter(|c| c.to_lowercase().starts_with(word_lower))
                .map(|c| Pair {
                    display: c.clone(),
                    replacement: c,
                })
                .collect()
        };

        if !has_argument {
            return pairs(DOT_COMMANDS.iter().map(|c| c.to_string()).collect());
        }

        match command {
            ".page" => pairs(PAGE_NAMES.iter().map(|p| p.to_string()).collect()),
            ".format" => pairs(
                super::OutputFormat::all_names()
                    .iter()
                    .map(|f| f.to_string())
                    .collect(),
            ),
            ".schema" => match self.tables.read() {
                Ok(tables) => pairs(tables.keys().cloned().collect()),
                Err(_) => Vec::new(),
            },
            ".jobs" => {
                // jobs are comma separated; complete the last entry only
                let last = word.rsplit(',').next().unwrap_or_default();
                let prefix = &word[..word.len() - last.len()];
                let last = last.to_lowercase();
                let known: Vec<String> = match self.jobs.read() {
                    Ok(jobs) => jobs.iter().cloned().collect(),
                    Err(_) => Vec::new(),
                };
                known
                    .into_iter()
                    .chain(std::iter::once("all".to_string()))
                    .filter(|j| j.to_lowercase().starts_with(&last))
                    .map(|j| Pair {
                        display: j.clone(),
                        replacement: format!("{prefix}{j}"),
                    })
                    .collect()
            }
            _ => Vec::new(),
        }
    }

    fn is_keyword(word: &str) -> bool {
        SQL_KEYWORDS.iter().any(|kw| kw.eq_ignore_ascii_case(word))
    }

    fn is_function(word: &str) -> bool {
        SQL_FUNCTIONS.iter().any(|f| f.eq_ignore_ascii_case(word))
    }
}

fn after_table_keyword(line_lower: &str) -> bool {
    ["from", "join"].iter().any(|kw| {
        line_lower
            .rfind(kw)
            .map(|pos| line_lower[pos + kw.len()..].split_whitespace().count() <= 1)
            .unwrap_or(false)
    })
}

fn mentions_table(line_lower: &str, table: &str) -> bool {
    let words: Vec<&str> = line_lower.split_whitespace().collect();
    words.windows(2).any(|w| {
        (w[0] == "from" || w[0] == "join") && w[1].trim_end_matches(',') == table
    })
}

impl Default for ReplHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line_to_cursor = &line[..pos];
        let word_start = line_to_cursor
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace() || *c == '(' || *c == ')')
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);

        let word = &line[word_start..pos];
        Ok((word_start, self.get_completions(word, line_to_cursor)))
    }
}

impl Highlighter for ReplHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if !self.highlighting_enabled || line.trim().is_empty() {
            return Cow::Borrowed(line);
        }

        if line.trim_start().starts_with('.') {
            return Cow::Owned(format!("\x1b[36m{}\x1b[0m", line));
        }

        let mut result = String::with_capacity(line.len() * 2);
        let mut chars = line.chars().peekable();
        let mut quote: Option<char> = None;

        while let Some(c) = chars.next() {
            if let Some(q) = quote {
                result.push(c);
                if c == q {
                    result.push_str("\x1b[0m");
                    quote = None;
                }
            } else if c == '\'' || c == '"' {
                quote = Some(c);
                result.push_str("\x1b[32m");
                result.push(c);
            } else if c.is_ascii_digit() {
                result.push_str("\x1b[35m");
                result.push(c);
                while let Some(&nc) = chars.peek() {
                    if nc.is_ascii_digit() || nc == '.' {
                        result.push(nc);
                        chars.next();
                    } else {
                        break;
                    }
                }
                result.push_str("\x1b[0m");
            } else if c.is_alphabetic() || c == '_' {
                let mut word = String::from(c);
                while let Some(&nc) = chars.peek() {
                    if nc.is_alphanumeric() || nc == '_' {
                        word.push(nc);
                        chars.next();
                    } else {
                        break;
                    }
                }

                if Self::is_keyword(&word) {
                    result.push_str("\x1b[1;34m");
                    result.push_str(&word);
                    result.push_str("\x1b[0m");
                } else if Self::is_function(&word) {
                    result.push_str("\x1b[33m");
                    result.push_str(&word);
                    result.push_str("\x1b[0m");
                } else {
                    result.push_str(&word);
                }
            } else {
                result.push(c);
            }
        }

        if quote.is_some() {
            result.push_str("\x1b[0m");
        }

        Cow::Owned(result)
    }

    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        _default: bool,
    ) -> Cow<'b, str> {
        if !self.highlighting_enabled {
            return Cow::Borrowed(prompt);
        }
        Cow::Owned(format!("\x1b[1;36m{}\x1b[0m", prompt))
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        self.highlighting_enabled
    }
}

impl Hinter for ReplHelper {
    type Hint = String;
}

impl Validator for ReplHelper {}

impl Helper for ReplHelper {}
