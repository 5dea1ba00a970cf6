//! Output formatting

use miette::{GraphicalReportHandler, GraphicalTheme};
use sqlsplit_core::{Error, SingleStatement, SourcePosition};

use crate::args::OutputFormat;

/// Output formatter for statements and errors
pub struct OutputFormatter {
    format: OutputFormat,
    file_name: String,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, file_name: String) -> Self {
        Self { format, file_name }
    }

    /// Print split statements in the configured format
    pub fn print_statements(&self, statements: &[SingleStatement], include_empty: bool) {
        let statements: Vec<&SingleStatement> = statements
            .iter()
            .filter(|s| include_empty || !s.empty)
            .collect();

        match self.format {
            OutputFormat::Human => {
                for (i, stmt) in statements.iter().enumerate() {
                    let marker = if stmt.empty { " (empty)" } else { "" };
                    println!(
                        "\x1b[1m{}:{}-{}\x1b[0m statement {}{}",
                        self.file_name,
                        stmt.start,
                        stmt.end,
                        i + 1,
                        marker
                    );
                    println!("{}", stmt.text.trim());
                    println!();
                }
            }
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "file": self.file_name,
                    "statements": statements,
                });
                print_json(&output);
            }
        }
    }

    /// Print the parse summary for a file without errors
    pub fn print_parsed(&self, count: usize) {
        match self.format {
            OutputFormat::Human => {
                eprintln!("{}: {} statement(s) parsed", self.file_name, count);
            }
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "file": self.file_name,
                    "statements": count,
                    "error": null,
                });
                print_json(&output);
            }
        }
    }

    /// Print a splitting or parsing error
    pub fn print_error(&self, error: &Error, source: &str) {
        match self.format {
            OutputFormat::Human => self.print_error_human(error, source),
            OutputFormat::Json => {
                let kind = match error {
                    Error::DelimiterExtraction { .. } => "delimiter",
                    Error::UnbalancedNesting { .. } => "nesting",
                    Error::Syntax(_) => "syntax",
                };
                let output = serde_json::json!({
                    "file": self.file_name,
                    "error": {
                        "kind": kind,
                        "message": error.to_string(),
                        "position": error_position(error),
                    },
                });
                print_json(&output);
            }
        }
    }

    fn print_error_human(&self, error: &Error, source: &str) {
        let position = error_position(error);
        eprint!("{}", render_diagnostic(error));
        eprintln!(
            "  --> {}:{}:{}",
            self.file_name,
            position.line + 1,
            position.column + 1
        );

        // Print source line with annotation
        if let Some(source_line) = source.lines().nth(position.line) {
            eprintln!("   |");
            eprintln!("{:>3} | {}", position.line + 1, source_line);
            let padding = " ".repeat(position.column);
            eprintln!("   | {}^", padding);
        }

        eprintln!();
    }
}

/// Render an error with miette, including its diagnostic code and help
fn render_diagnostic(error: &Error) -> String {
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor());
    let mut rendered = String::new();
    if handler.render_report(&mut rendered, error).is_err() {
        rendered = format!("error: {}\n", error);
    }
    rendered
}

fn error_position(error: &Error) -> SourcePosition {
    match error {
        Error::DelimiterExtraction { line, .. } => SourcePosition::new(*line, 0),
        Error::UnbalancedNesting { position, .. } => *position,
        Error::Syntax(err) => err.position,
    }
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => tracing::error!("failed to serialize output: {}", e),
    }
}
