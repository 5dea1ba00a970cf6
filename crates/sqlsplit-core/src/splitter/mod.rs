//! Statement splitting
//!
//! A script is cut into [`SingleStatement`]s in one of three ways:
//!
//! - scripts containing a `DELIMITER` directive are split in delimiter mode,
//!   matching the active delimiter textually;
//! - everything else goes through the boundary splitter, which skips
//!   terminators nested inside compound statements;
//! - when the boundary splitter cannot balance the compound statements, the
//!   whole script is parsed and split where the grammar found terminators.
//!
//! Outside delimiter mode the statement texts concatenate back to the input.

mod boundary;
mod delimiter;
mod fallback;

use std::borrow::Cow;

use serde::Serialize;
use tracing::{debug, warn};

use crate::dialect::SqlDialect;
use crate::error::Error;
use crate::lexer::{tokenize, Token, TokenKind};
use crate::parser::FirstErrorListener;
use crate::position::SourcePosition;

pub use boundary::split_boundaries;
pub use delimiter::{extract_delimiter, has_delimiter_directive, preprocess_delimiters};

/// One statement cut out of a script
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SingleStatement {
    pub text: String,
    /// Line (0-indexed) of the script on which `text` begins
    pub base_line: usize,
    /// First significant token
    pub start: SourcePosition,
    /// Last significant token, normally the terminator
    pub end: SourcePosition,
    /// Only whitespace, comments and terminators
    pub empty: bool,
}

impl SingleStatement {
    /// Build a statement covering `tokens[first..=last]`.
    ///
    /// Tokens starting at or after `content_end` do not count as content.
    /// The end position is searched backwards without stopping at `first`,
    /// so a statement with no significant tokens of its own ends at the
    /// previous statement's terminator.
    pub(crate) fn from_tokens(
        text: String,
        tokens: &[Token],
        first: usize,
        last: usize,
        content_end: usize,
    ) -> Self {
        let significant = |t: &&Token| t.is_default() && !t.is_eof();
        let span = &tokens[first..=last];

        let start = span.iter().find(significant).unwrap_or(&tokens[first]);
        let end = tokens[..=last]
            .iter()
            .rev()
            .find(significant)
            .unwrap_or(&tokens[first]);
        let empty = !span
            .iter()
            .filter(significant)
            .any(|t| !t.is_terminator() && t.start < content_end);

        Self {
            text,
            base_line: tokens[first].line.saturating_sub(1),
            start: SourcePosition::of_token(start),
            end: SourcePosition::of_token(end),
            empty,
        }
    }
}

/// Split a script into statements, empty ones included
pub fn split_sql(script: &str, dialect: SqlDialect) -> Result<Vec<SingleStatement>, Error> {
    let tokens = match tokenize(script) {
        Ok(tokens) => tokens,
        Err(err) => {
            let mut listener = FirstErrorListener::new(script, 0);
            listener.report_lex_error(&err);
            return Err(listener.finish(&err.message).into());
        }
    };

    if tokens.iter().any(|t| t.kind == TokenKind::Delimiter) {
        debug!("script redefines its delimiter, splitting in delimiter mode");
        return delimiter::split_delimiter_mode(script, &tokens);
    }

    match split_boundaries(script, &tokens) {
        Err(err @ Error::UnbalancedNesting { .. }) => {
            warn!("{}; falling back to grammar-based splitting", err);
            fallback::split_with_grammar(script, &tokens, dialect)
        }
        result => result,
    }
}

/// Cut `tokens` at the given terminator indexes. Content after the last
/// boundary becomes one trailing statement.
pub(crate) fn statements_from_boundaries(
    source: &str,
    tokens: &[Token],
    boundaries: &[usize],
) -> Vec<SingleStatement> {
    let mut statements = Vec::with_capacity(boundaries.len() + 1);
    let mut first = 0;

    for &boundary in boundaries {
        let text = source[tokens[first].start..tokens[boundary].stop].to_string();
        let stop = tokens[boundary].stop;
        statements.push(SingleStatement::from_tokens(
            text, tokens, first, boundary, stop,
        ));
        first = boundary + 1;
    }

    let last = tokens.len() - 1;
    if first <= last && tokens[first].start < source.len() {
        let text = source[tokens[first].start..].to_string();
        statements.push(SingleStatement::from_tokens(
            text,
            tokens,
            first,
            last,
            source.len(),
        ));
    }

    debug!(count = statements.len(), "split script into statements");
    statements
}

/// Append a `;` after the last significant token of `text` unless it
/// already ends with one. Text that fails to lex is returned unchanged.
pub fn normalize_trailing_terminator(text: &str) -> Cow<'_, str> {
    let Ok(tokens) = tokenize(text) else {
        return Cow::Borrowed(text);
    };

    match tokens.iter().rev().find(|t| t.is_default() && !t.is_eof()) {
        Some(last) if !last.is_terminator() => {
            let mut normalized = String::with_capacity(text.len() + 1);
            normalized.push_str(&text[..last.stop]);
            normalized.push(';');
            normalized.push_str(&text[last.stop..]);
            Cow::Owned(normalized)
        }
        _ => Cow::Borrowed(text),
    }
}
