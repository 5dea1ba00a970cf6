//! Source positions
//!
//! Tokens carry 1-indexed lines and 0-indexed character columns. Everything
//! exposed to callers uses 0-indexed lines and columns.

use serde::Serialize;

use crate::lexer::Token;

/// Position within the original script
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct SourcePosition {
    /// Line number (0-indexed)
    pub line: usize,
    /// Column in characters (0-indexed)
    pub column: usize,
}

impl SourcePosition {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Position of the first character of a token
    pub fn of_token(token: &Token) -> Self {
        Self {
            line: token.line.saturating_sub(1),
            column: token.column,
        }
    }
}

impl std::fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column)
    }
}

/// Take up to `chars` characters of leading context before `start`, ending at
/// `stop`. Both bounds are clamped to the source.
pub(crate) fn context_slice(source: &str, start: usize, stop: usize, chars: usize) -> &str {
    let stop = stop.min(source.len());
    let start = start.min(stop);
    let from = source[..start]
        .char_indices()
        .rev()
        .take(chars)
        .last()
        .map_or(start, |(i, _)| i);
    &source[from..stop]
}
