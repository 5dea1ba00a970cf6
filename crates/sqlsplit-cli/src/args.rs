//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "sqlsplit")]
#[command(author, version, about = "Split SQL scripts into statements and check their syntax")]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Split SQL files into statements and print them with their positions
    Split {
        /// SQL files to split (supports glob patterns)
        files: Vec<PathBuf>,

        /// Also print statements holding only comments or terminators
        #[arg(long)]
        include_empty: bool,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Parse every statement and report the first syntax error per file
    Check {
        /// SQL files to check (supports glob patterns)
        files: Vec<PathBuf>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Rewrite DELIMITER directives so the script only uses `;`
    Normalize {
        /// SQL file to normalize
        file: PathBuf,
    },
}

#[derive(clap::Args)]
pub struct CommonArgs {
    /// Configuration file (defaults to sqlsplit.toml in this or a parent directory)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// SQL dialect used to parse statements
    #[arg(short, long)]
    pub dialect: Option<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output
    Json,
}
