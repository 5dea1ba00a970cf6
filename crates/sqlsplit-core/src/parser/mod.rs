//! Per-statement parsing
//!
//! [`ScriptParser`] splits a script and parses every non-empty statement on
//! its own, reporting syntax errors at their absolute position in the script.

mod listener;

use sqlparser::ast::Statement;
use sqlparser::parser::Parser;
use tracing::{debug, trace};

use crate::dialect::SqlDialect;
use crate::error::{Error, SyntaxError};
use crate::lexer::{tokenize, Token};
use crate::splitter::{
    normalize_trailing_terminator, preprocess_delimiters, split_sql, SingleStatement,
};

pub use listener::{FirstErrorListener, SyntaxErrorListener};

/// A statement that parsed successfully
#[derive(Debug, Clone)]
pub struct ParsedStatement {
    /// Syntax trees produced by the grammar, normally exactly one
    pub ast: Vec<Statement>,
    /// Token stream of the statement text
    pub tokens: Vec<Token>,
    /// Line (0-indexed) of the script on which the statement text begins
    pub base_line: usize,
}

/// Splits scripts and parses their statements with a given dialect
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptParser {
    dialect: SqlDialect,
}

impl ScriptParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dialect(dialect: SqlDialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    /// Split a script the way [`parse`](Self::parse) does.
    ///
    /// `DELIMITER` directives are rewritten first, turning directive lines
    /// into comments, so the result keeps the script's line numbers and
    /// compound statement bodies are never cut at their inner `;`.
    pub fn split(&self, script: &str) -> Result<Vec<SingleStatement>, Error> {
        let preprocessed = preprocess_delimiters(script)?;
        split_sql(&preprocessed, self.dialect)
    }

    /// Split and parse a whole script.
    ///
    /// Stops at the first statement that fails to parse and returns its
    /// error; statements after it are not examined.
    pub fn parse(&self, script: &str) -> Result<Vec<ParsedStatement>, Error> {
        let statements = self.split(script)?;
        debug!(count = statements.len(), dialect = %self.dialect, "parsing split statements");

        let mut parsed = Vec::new();
        let mut base_line = 0;
        let last = statements.len().saturating_sub(1);

        for (index, statement) in statements.iter().enumerate() {
            // A statement may start further down than where the previous
            // one ended.
            base_line = base_line.max(statement.base_line);

            if !statement.empty {
                let text = if index == last {
                    normalize_trailing_terminator(&statement.text)
                } else {
                    statement.text.as_str().into()
                };
                trace!(index, base_line, "parsing statement");
                parsed.push(self.parse_statement(&text, base_line)?);
            }

            base_line = statement.end.line;
        }

        Ok(parsed)
    }

    /// Parse one statement. `base_line` is the 0-indexed script line on which
    /// `text` begins and offsets reported error positions.
    pub fn parse_statement(
        &self,
        text: &str,
        base_line: usize,
    ) -> Result<ParsedStatement, SyntaxError> {
        let mut listener = FirstErrorListener::new(text, base_line);

        let tokens = match tokenize(text) {
            Ok(tokens) => tokens,
            Err(err) => {
                listener.report_lex_error(&err);
                return Err(listener.finish(&err.message));
            }
        };

        let dialect = self.dialect.parser_dialect();
        match Parser::parse_sql(dialect.as_ref(), text) {
            Ok(ast) => Ok(ParsedStatement {
                ast,
                tokens,
                base_line,
            }),
            Err(err) => {
                listener.report_parser_error(&tokens, &err);
                Err(listener.finish(&err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::SourcePosition;

    #[test]
    fn test_parse_each_statement() {
        let parser = ScriptParser::new();
        let parsed = parser.parse("SELECT 1;\nSELECT a FROM t;").unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].ast.len(), 1);
        assert_eq!(parsed[1].base_line, 0);
    }

    #[test]
    fn test_last_statement_gets_terminator() {
        let parser = ScriptParser::new();
        let parsed = parser.parse("SELECT 1;\nSELECT 2 -- no terminator").unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(parsed[1].tokens.iter().any(|t| t.is_terminator()));
    }

    #[test]
    fn test_empty_statements_are_skipped() {
        let parser = ScriptParser::new();
        let parsed = parser.parse("-- header\n;\nSELECT 1;\n/* trailer */").unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_split_rewrites_directives_before_splitting() {
        let parser = ScriptParser::new();
        let statements = parser
            .split("DELIMITER ;\nCREATE PROCEDURE p() BEGIN SELECT 1; END;\nSELECT 2;")
            .unwrap();
        let texts: Vec<_> = statements.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "-- DELIMITER ;\nCREATE PROCEDURE p() BEGIN SELECT 1; END;",
                "\nSELECT 2;",
            ]
        );
        assert_eq!(statements[1].base_line, 1);
    }

    #[test]
    fn test_syntax_error_has_absolute_line() {
        let parser = ScriptParser::new();
        let err = parser
            .parse("SELECT 1;\nSELECT 2;\nSELECT * FROM t WHERE;\nSELECT 4;")
            .unwrap_err();
        match err {
            Error::Syntax(syntax) => {
                assert_eq!(syntax.position.line, 2);
                assert!(syntax.message.starts_with("Syntax error at line 3:21\n"));
                assert!(syntax.message.contains("related text: \nSELECT * FROM t WHERE;"));
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_statement_reports_relative_position() {
        let parser = ScriptParser::new();
        let err = parser.parse_statement("SELECT * FROM t WHERE;", 10).unwrap_err();
        assert_eq!(err.position, SourcePosition::new(10, 21));
    }

    #[test]
    fn test_lex_error_in_statement() {
        let parser = ScriptParser::new();
        let err = parser.parse_statement("SELECT `unterminated", 0).unwrap_err();
        assert_eq!(err.position, SourcePosition::new(0, 7));
        assert_eq!(err.raw_message, "unterminated quoted identifier");
    }
}
