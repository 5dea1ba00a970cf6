//! Error types

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::position::SourcePosition;

/// First syntax error reported while lexing or parsing one statement
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic, Serialize)]
#[error("{message}")]
#[diagnostic(code(sqlsplit::syntax))]
pub struct SyntaxError {
    /// Absolute position within the script (0-indexed line)
    pub position: SourcePosition,
    /// Human readable message including a snippet of the offending text
    pub message: String,
    /// Message as reported by the lexer or parser
    pub raw_message: String,
}

/// Errors produced while splitting or parsing a script
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    /// A `DELIMITER` directive without a delimiter after it
    #[error("cannot extract a delimiter from `{directive}` at line {}", .line + 1)]
    #[diagnostic(
        code(sqlsplit::delimiter),
        help("a directive looks like `DELIMITER $$`")
    )]
    DelimiterExtraction { line: usize, directive: String },

    /// An `END` with no matching open compound statement
    #[error("unbalanced compound statement: `{closer}` at {position} has no matching opener")]
    #[diagnostic(code(sqlsplit::nesting))]
    UnbalancedNesting {
        closer: String,
        position: SourcePosition,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] SyntaxError),
}

impl Error {
    /// Whether the script could not be segmented at all
    pub fn is_segmentation(&self) -> bool {
        matches!(
            self,
            Error::DelimiterExtraction { .. } | Error::UnbalancedNesting { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delimiter_error_reports_one_indexed_line() {
        let err = Error::DelimiterExtraction {
            line: 2,
            directive: "DELIMITER".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cannot extract a delimiter from `DELIMITER` at line 3"
        );
        assert!(err.is_segmentation());
    }

    #[test]
    fn test_syntax_error_is_not_segmentation() {
        let err = Error::from(SyntaxError {
            position: SourcePosition::new(0, 7),
            message: "Syntax error at line 1:7\nrelated text: SELECT FROM".to_string(),
            raw_message: "boom".to_string(),
        });
        assert!(!err.is_segmentation());
        assert!(err.to_string().starts_with("Syntax error at line 1:7"));
    }
}
