//! Syntax error listener

use sqlparser::parser::ParserError;

use crate::error::SyntaxError;
use crate::lexer::{LexError, Token};
use crate::position::{context_slice, SourcePosition};

/// Characters of leading context included in an error snippet
const SNIPPET_CONTEXT: usize = 40;

/// Receives syntax errors from the lexer and parser
pub trait SyntaxErrorListener {
    /// `line` is 1-indexed and relative to the text being parsed; `column`
    /// is 0-indexed.
    fn on_syntax_error(
        &mut self,
        offending: Option<&Token>,
        line: usize,
        column: usize,
        raw_message: &str,
    );
}

/// Keeps the first reported error and ignores the rest
pub struct FirstErrorListener<'a> {
    source: &'a str,
    base_line: usize,
    error: Option<SyntaxError>,
}

impl<'a> FirstErrorListener<'a> {
    /// `source` is the text being parsed; `base_line` is the 0-indexed line
    /// of the script on which that text begins.
    pub fn new(source: &'a str, base_line: usize) -> Self {
        Self {
            source,
            base_line,
            error: None,
        }
    }

    pub fn error(&self) -> Option<&SyntaxError> {
        self.error.as_ref()
    }

    pub fn into_error(self) -> Option<SyntaxError> {
        self.error
    }

    pub(crate) fn report_lex_error(&mut self, err: &LexError) {
        self.on_syntax_error(Some(&err.token), err.token.line, err.token.column, &err.message);
    }

    /// Report a sqlparser error, locating the offending token in `tokens`
    pub(crate) fn report_parser_error(&mut self, tokens: &[Token], err: &ParserError) {
        let raw_message = err.to_string();
        match parser_error_location(&raw_message) {
            Some((line, column)) => {
                // sqlparser columns are 1-indexed
                let column = column.saturating_sub(1);
                let offending = token_at(tokens, line, column);
                self.on_syntax_error(offending, line, column, &raw_message);
            }
            None => {
                let offending = last_significant(tokens);
                let (line, column) = offending.map_or((1, 0), |t| (t.line, t.column));
                self.on_syntax_error(offending, line, column, &raw_message);
            }
        }
    }

    /// Error to return when nothing was reported through the listener
    pub(crate) fn finish(self, raw_message: &str) -> SyntaxError {
        let base_line = self.base_line;
        self.into_error().unwrap_or_else(|| SyntaxError {
            position: SourcePosition::new(base_line, 0),
            message: format!("Syntax error at line {}:0", base_line + 1),
            raw_message: raw_message.to_string(),
        })
    }
}

impl SyntaxErrorListener for FirstErrorListener<'_> {
    fn on_syntax_error(
        &mut self,
        offending: Option<&Token>,
        line: usize,
        column: usize,
        raw_message: &str,
    ) {
        if self.error.is_some() {
            return;
        }

        let related = match offending {
            Some(token) => context_slice(self.source, token.start, token.stop, SNIPPET_CONTEXT),
            None => context_slice(
                self.source,
                self.source.len(),
                self.source.len(),
                SNIPPET_CONTEXT,
            ),
        };
        let absolute_line = line + self.base_line;

        self.error = Some(SyntaxError {
            position: SourcePosition::new(absolute_line.saturating_sub(1), column),
            message: format!(
                "Syntax error at line {}:{}\nrelated text: {}",
                absolute_line, column, related
            ),
            raw_message: raw_message.to_string(),
        });
    }
}

/// Extract the trailing `at Line: L, Column: C` location from a sqlparser
/// error message. Both values are 1-indexed.
fn parser_error_location(message: &str) -> Option<(usize, usize)> {
    let (_, location) = message.rsplit_once(" at Line: ")?;
    let (line, column) = location.split_once(", Column: ")?;
    let column: String = column.chars().take_while(char::is_ascii_digit).collect();
    Some((line.trim().parse().ok()?, column.parse().ok()?))
}

/// Token starting at the given location, or the last significant token
/// starting before it
fn token_at(tokens: &[Token], line: usize, column: usize) -> Option<&Token> {
    tokens
        .iter()
        .find(|t| t.line == line && t.column == column)
        .or_else(|| {
            tokens
                .iter()
                .filter(|t| t.is_default() && !t.is_eof())
                .take_while(|t| (t.line, t.column) <= (line, column))
                .last()
        })
        .or_else(|| last_significant(tokens))
}

fn last_significant(tokens: &[Token]) -> Option<&Token> {
    tokens
        .iter()
        .rev()
        .find(|t| t.is_default() && !t.is_eof())
        .or_else(|| tokens.last())
}
