//! Grammar-based splitting
//!
//! Used when the boundary splitter cannot balance compound statements. The
//! whole script is parsed and split at the terminators the parser consumed
//! between statements.

use sqlparser::parser::{Parser, ParserError};
use sqlparser::tokenizer::Token as SqlToken;
use tracing::{debug, warn};

use crate::dialect::SqlDialect;
use crate::error::Error;
use crate::lexer::Token;
use crate::parser::FirstErrorListener;
use crate::splitter::{statements_from_boundaries, SingleStatement};

pub(crate) fn split_with_grammar(
    source: &str,
    tokens: &[Token],
    dialect: SqlDialect,
) -> Result<Vec<SingleStatement>, Error> {
    let locations = match terminator_locations(source, dialect) {
        Ok(locations) => locations,
        Err(err) => {
            let mut listener = FirstErrorListener::new(source, 0);
            listener.report_parser_error(tokens, &err);
            return Err(listener.finish(&err.to_string()).into());
        }
    };

    let boundaries = terminator_indexes(tokens, &locations);
    debug!(count = boundaries.len(), "grammar found statement terminators");
    if boundaries.len() != locations.len() {
        warn!(
            found = locations.len(),
            matched = boundaries.len(),
            "some grammar terminators have no matching token; their statements are merged"
        );
    }

    Ok(statements_from_boundaries(source, tokens, &boundaries))
}

/// Indexes of the terminator tokens at the given 1-indexed parser
/// locations. Both sequences are in source order, so one forward pass
/// suffices. Locations without a terminator token are skipped.
fn terminator_indexes(tokens: &[Token], locations: &[(usize, usize)]) -> Vec<usize> {
    let mut indexes = Vec::with_capacity(locations.len());
    let mut cursor = 0;

    for &(line, column) in locations {
        // sqlparser columns are 1-indexed
        let target = (line, column.saturating_sub(1));
        let offset = tokens[cursor..].partition_point(|t| (t.line, t.column) < target);
        match tokens.get(cursor + offset) {
            Some(token) if token.is_terminator() && (token.line, token.column) == target => {
                indexes.push(cursor + offset);
                cursor += offset + 1;
            }
            _ => warn!(line, column, "no terminator token at grammar location"),
        }
    }

    indexes
}

/// 1-indexed line and column of every statement terminator the parser
/// consumed at the top level
fn terminator_locations(
    source: &str,
    dialect: SqlDialect,
) -> Result<Vec<(usize, usize)>, ParserError> {
    let dialect = dialect.parser_dialect();
    let mut parser = Parser::new(dialect.as_ref()).try_with_sql(source)?;
    let mut locations = Vec::new();
    let mut expecting_terminator = false;

    loop {
        loop {
            let next = parser.peek_token();
            if next.token != SqlToken::SemiColon {
                break;
            }
            locations.push((
                next.span.start.line as usize,
                next.span.start.column as usize,
            ));
            parser.next_token();
            expecting_terminator = false;
        }

        let next = parser.peek_token();
        if next.token == SqlToken::EOF {
            return Ok(locations);
        }
        if expecting_terminator {
            return Err(ParserError::ParserError(format!(
                "Expected: end of statement, found: {}{}",
                next.token, next.span.start
            )));
        }

        parser.parse_statement()?;
        expecting_terminator = true;
    }
}
