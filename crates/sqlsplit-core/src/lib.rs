//! sqlsplit-core: statement splitting for SQL scripts
//!
//! This library cuts multi-statement SQL scripts into individually parseable
//! statements with exact source positions, handling `DELIMITER` directives
//! and terminators nested inside compound statements, and reports the first
//! syntax error of each statement against the original script.

pub mod dialect;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod position;
pub mod splitter;

pub use dialect::SqlDialect;
pub use error::{Error, SyntaxError};
pub use lexer::{tokenize, Channel, Token, TokenKind};
pub use parser::{FirstErrorListener, ParsedStatement, ScriptParser, SyntaxErrorListener};
pub use position::SourcePosition;
pub use splitter::{
    has_delimiter_directive, normalize_trailing_terminator, preprocess_delimiters, split_sql,
    SingleStatement,
};
