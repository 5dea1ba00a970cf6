//! SQL dialect support

use sqlparser::dialect::{Dialect, GenericDialect, MySqlDialect};
use std::str::FromStr;

/// Grammar used to parse split statements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqlDialect {
    #[default]
    MySQL,
    Generic,
}

impl SqlDialect {
    /// Get the sqlparser dialect for parsing
    pub fn parser_dialect(&self) -> Box<dyn Dialect> {
        match self {
            SqlDialect::MySQL => Box::new(MySqlDialect {}),
            SqlDialect::Generic => Box::new(GenericDialect {}),
        }
    }
}

impl FromStr for SqlDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" | "mysql8" | "mariadb" => Ok(SqlDialect::MySQL),
            "generic" | "ansi" => Ok(SqlDialect::Generic),
            _ => Err(format!(
                "Unknown dialect: '{}'. Supported dialects: mysql, generic.",
                s
            )),
        }
    }
}

impl std::fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlDialect::MySQL => write!(f, "mysql"),
            SqlDialect::Generic => write!(f, "generic"),
        }
    }
}
