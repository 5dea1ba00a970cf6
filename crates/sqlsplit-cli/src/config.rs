//! Configuration file handling

use miette::{IntoDiagnostic, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::args::{CommonArgs, OutputFormat};

const CONFIG_FILE: &str = "sqlsplit.toml";

/// Configuration for sqlsplit
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// SQL file patterns to process when none are given on the command line
    #[serde(default)]
    pub files: Vec<String>,

    /// SQL dialect (mysql or generic)
    #[serde(default)]
    pub dialect: Option<String>,

    /// Output format (human or json)
    #[serde(default)]
    pub format: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).into_diagnostic()?;
        let config: Config = toml::from_str(&contents).into_diagnostic()?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Try to find and load sqlsplit.toml in current directory or parent directories
    pub fn find_and_load() -> Result<Option<Self>> {
        let mut current_dir = std::env::current_dir().into_diagnostic()?;

        loop {
            let config_path = current_dir.join(CONFIG_FILE);
            if config_path.exists() {
                return Ok(Some(Self::from_file(&config_path)?));
            }

            // Try parent directory
            if !current_dir.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// Load the configuration named by `--config`, or discover one
    pub fn load(common: &CommonArgs) -> Result<Self> {
        match &common.config {
            Some(path) => Self::from_file(path),
            None => Ok(Self::find_and_load()?.unwrap_or_default()),
        }
    }

    /// Merge CLI arguments into configuration
    /// CLI arguments take precedence over config file values
    pub fn merge_with_args(mut self, files: &[PathBuf], common: &CommonArgs) -> Self {
        if !files.is_empty() {
            self.files = files.iter().map(|p| p.display().to_string()).collect();
        }

        if let Some(dialect) = &common.dialect {
            self.dialect = Some(dialect.clone());
        }

        if let Some(fmt) = common.format {
            self.format = Some(format!("{:?}", fmt).to_lowercase());
        }

        self
    }

    pub fn output_format(&self) -> OutputFormat {
        match self.format.as_deref() {
            Some("json") => OutputFormat::Json,
            _ => OutputFormat::Human,
        }
    }

    /// Expand file patterns into paths
    pub fn query_files(&self) -> Result<Vec<PathBuf>> {
        let mut query_files = Vec::new();
        for pattern in &self.files {
            if pattern.contains('*') {
                for path in glob::glob(pattern).into_diagnostic()?.flatten() {
                    query_files.push(path);
                }
            } else {
                query_files.push(PathBuf::from(pattern));
            }
        }
        Ok(query_files)
    }
}
