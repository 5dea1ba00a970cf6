//! sqlsplit CLI - SQL script splitter and syntax checker

mod args;
mod config;
mod output;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use sqlsplit_core::{preprocess_delimiters, split_sql, ScriptParser, SqlDialect};

use crate::args::{Args, Command, CommonArgs, OutputFormat};
use crate::config::Config;
use crate::output::OutputFormatter;

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.quiet {
        tracing::Level::ERROR
    } else {
        match args.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(args) {
        Ok(has_errors) => {
            if has_errors {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::from(2)
        }
    }
}

fn run(args: Args) -> Result<bool> {
    let quiet = args.quiet;

    match args.command {
        Command::Split {
            files,
            include_empty,
            common,
        } => {
            let (config, dialect, query_files) = resolve(&files, &common)?;
            let output_format = config.output_format();

            let mut has_errors = false;
            let mut total_statements = 0;
            for query_file in &query_files {
                let content = fs::read_to_string(query_file).into_diagnostic()?;
                let formatter =
                    OutputFormatter::new(output_format, query_file.display().to_string());

                match split_sql(&content, dialect) {
                    Ok(statements) => {
                        tracing::debug!(
                            file = %query_file.display(),
                            count = statements.len(),
                            "split file"
                        );
                        total_statements += statements.iter().filter(|s| !s.empty).count();
                        formatter.print_statements(&statements, include_empty);
                    }
                    Err(e) => {
                        formatter.print_error(&e, &content);
                        has_errors = true;
                    }
                }
            }

            if !quiet {
                eprintln!(
                    "Split {} statement(s) from {} file(s)",
                    total_statements,
                    query_files.len()
                );
            }

            Ok(has_errors)
        }

        Command::Check { files, common } => {
            let (config, dialect, query_files) = resolve(&files, &common)?;
            let output_format = config.output_format();
            let parser = ScriptParser::with_dialect(dialect);

            let mut failed_files = 0;
            for query_file in &query_files {
                let content = fs::read_to_string(query_file).into_diagnostic()?;
                let formatter =
                    OutputFormatter::new(output_format, query_file.display().to_string());

                match parser.parse(&content) {
                    Ok(parsed) => {
                        if !quiet {
                            formatter.print_parsed(parsed.len());
                        }
                    }
                    Err(e) => {
                        formatter.print_error(&e, &content);
                        failed_files += 1;
                    }
                }
            }

            // Print summary
            if !quiet {
                if failed_files > 0 {
                    eprintln!();
                    eprintln!(
                        "Found errors in {} of {} file(s)",
                        failed_files,
                        query_files.len()
                    );
                } else {
                    eprintln!("All {} file(s) passed validation", query_files.len());
                }
            }

            Ok(failed_files > 0)
        }

        Command::Normalize { file } => {
            let content = fs::read_to_string(&file).into_diagnostic()?;
            match preprocess_delimiters(&content) {
                Ok(normalized) => {
                    print!("{}", normalized);
                    Ok(false)
                }
                Err(e) => {
                    let formatter =
                        OutputFormatter::new(OutputFormat::Human, file.display().to_string());
                    formatter.print_error(&e, &content);
                    Ok(true)
                }
            }
        }
    }
}

/// Load configuration, merge CLI arguments and expand the file list
fn resolve(files: &[PathBuf], common: &CommonArgs) -> Result<(Config, SqlDialect, Vec<PathBuf>)> {
    let config = Config::load(common)?.merge_with_args(files, common);

    let dialect: SqlDialect = match &config.dialect {
        Some(name) => name.parse().map_err(|e: String| miette::miette!(e))?,
        None => SqlDialect::default(),
    };

    let query_files = config.query_files()?;
    if query_files.is_empty() {
        miette::bail!("No SQL files specified. Use positional arguments or configure in sqlsplit.toml");
    }

    Ok((config, dialect, query_files))
}
