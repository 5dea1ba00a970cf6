//! `DELIMITER` directive handling
//!
//! Client scripts may switch the statement terminator, typically to define
//! routines whose bodies contain `;`:
//!
//! ```text
//! DELIMITER $$
//! CREATE PROCEDURE p() BEGIN SELECT 1; END$$
//! DELIMITER ;
//! ```
//!
//! Both the preprocessor and the delimiter-mode splitter rewrite the custom
//! terminator to `;`, so later stages never see anything else.

use tracing::debug;

use crate::error::Error;
use crate::lexer::{Token, TokenKind};
use crate::splitter::SingleStatement;

const DIRECTIVE: &str = "DELIMITER";
const STANDARD_DELIMITER: &str = ";";

/// Whether `line` is a `DELIMITER` directive
fn is_directive_line(line: &str) -> bool {
    let line = line.trim_start();
    line.get(..DIRECTIVE.len())
        .is_some_and(|word| word.eq_ignore_ascii_case(DIRECTIVE))
        && line[DIRECTIVE.len()..]
            .chars()
            .next()
            .map_or(true, char::is_whitespace)
}

/// Whether any line of the script is a `DELIMITER` directive
pub fn has_delimiter_directive(script: &str) -> bool {
    script.lines().any(is_directive_line)
}

/// Extract the delimiter named by a directive line. `line` is the 0-indexed
/// line of the directive, used for error reporting.
pub fn extract_delimiter(directive: &str, line: usize) -> Result<String, Error> {
    let trimmed = directive.trim();
    trimmed
        .get(DIRECTIVE.len()..)
        .filter(|_| is_directive_line(trimmed))
        .and_then(|rest| rest.split_whitespace().next())
        .map(str::to_string)
        .ok_or_else(|| Error::DelimiterExtraction {
            line,
            directive: trimmed.to_string(),
        })
}

/// Rewrite a script that redefines its delimiter into one using only `;`.
///
/// Directive lines become `-- DELIMITER …` comments so line numbers are
/// unchanged. While a custom delimiter is active, a line ending with it has
/// the delimiter replaced by `;`. Scripts without directives are returned
/// unchanged.
pub fn preprocess_delimiters(script: &str) -> Result<String, Error> {
    if !has_delimiter_directive(script) {
        return Ok(script.to_string());
    }

    let mut output = String::with_capacity(script.len() + 16);
    let mut delimiter = STANDARD_DELIMITER.to_string();

    for (index, line) in script.split_inclusive('\n').enumerate() {
        let content = line.trim_end_matches(['\r', '\n']);
        let line_ending = &line[content.len()..];

        if is_directive_line(content) {
            delimiter = extract_delimiter(content, index)?;
            debug!(line = index, %delimiter, "delimiter redefined");
            output.push_str("-- ");
            output.push_str(content.trim_start());
            output.push_str(line_ending);
            continue;
        }

        let body = line.trim_end();
        match body.strip_suffix(delimiter.as_str()) {
            Some(statement) if delimiter != STANDARD_DELIMITER => {
                output.push_str(statement);
                output.push(';');
                output.push_str(&line[body.len()..]);
            }
            _ => output.push_str(line),
        }
    }

    Ok(output)
}

/// Split a script containing `DELIMITER` directives.
///
/// Directive tokens are excluded from every statement. While the delimiter
/// is `;` each terminator token closes a statement without regard to
/// compound statement nesting; otherwise the delimiter is matched textually
/// and replaced by `;` in the emitted text.
pub(crate) fn split_delimiter_mode(
    source: &str,
    tokens: &[Token],
) -> Result<Vec<SingleStatement>, Error> {
    let mut statements = Vec::new();
    let mut delimiter = STANDARD_DELIMITER.to_string();
    // Token index and byte offset where the active statement starts; the
    // offset can fall inside the token when a delimiter ended mid-token.
    let mut first = 0;
    let mut start = 0;
    let mut index = 0;

    while index < tokens.len() {
        let token = &tokens[index];

        match token.kind {
            TokenKind::Eof => break,
            TokenKind::Delimiter => {
                if start < token.start && index > first {
                    let text = source[start..token.start].to_string();
                    statements.push(SingleStatement::from_tokens(
                        text,
                        tokens,
                        first,
                        index - 1,
                        token.start,
                    ));
                }
                delimiter = extract_delimiter(&token.text, token.line.saturating_sub(1))?;
                debug!(line = token.line, %delimiter, "delimiter redefined");
                first = index + 1;
                start = token.stop;
                index += 1;
            }
            TokenKind::Semicolon if delimiter == STANDARD_DELIMITER => {
                let text = source[start..token.stop].to_string();
                statements.push(SingleStatement::from_tokens(
                    text, tokens, first, index, token.stop,
                ));
                first = index + 1;
                start = token.stop;
                index += 1;
            }
            _ if delimiter == STANDARD_DELIMITER
                || !token.is_default()
                || matches!(token.kind, TokenKind::String | TokenKind::QuotedIdentifier) =>
            {
                index += 1;
            }
            _ => {
                let Some(at) = find_delimiter(source, token, start, &delimiter) else {
                    index += 1;
                    continue;
                };
                let end = at + delimiter.len();
                // Last token touched by the delimiter; `tokens[index]` always is
                let last = index + tokens[index..].partition_point(|t| t.start < end) - 1;

                let mut text = String::with_capacity(at - start + 1);
                text.push_str(&source[start..at]);
                text.push(';');
                statements.push(SingleStatement::from_tokens(text, tokens, first, last, at));

                start = end;
                first = if tokens[last].stop > end { last } else { last + 1 };
                index = first;
            }
        }
    }

    if start < source.len() {
        let last = tokens.len() - 1;
        let text = source[start..].to_string();
        statements.push(SingleStatement::from_tokens(
            text,
            tokens,
            first.min(last),
            last,
            source.len(),
        ));
    }

    debug!(count = statements.len(), "split script in delimiter mode");
    Ok(statements)
}

/// Byte offset of the first occurrence of `delimiter` starting inside
/// `token`, at or after `from`
fn find_delimiter(source: &str, token: &Token, from: usize, delimiter: &str) -> Option<usize> {
    let lo = token.start.max(from);
    if lo >= token.stop {
        return None;
    }
    source[lo..token.stop]
        .char_indices()
        .map(|(offset, _)| lo + offset)
        .find(|&at| source[at..].starts_with(delimiter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::position::SourcePosition;

    fn split(sql: &str) -> Vec<SingleStatement> {
        let tokens = tokenize(sql).unwrap();
        split_delimiter_mode(sql, &tokens).unwrap()
    }

    fn non_empty(statements: &[SingleStatement]) -> Vec<&str> {
        statements
            .iter()
            .filter(|s| !s.empty)
            .map(|s| s.text.as_str())
            .collect()
    }

    #[test]
    fn test_has_delimiter_directive() {
        assert!(has_delimiter_directive("  delimiter $$\nSELECT 1$$"));
        assert!(has_delimiter_directive("SELECT 1;\nDELIMITER"));
        assert!(!has_delimiter_directive("SELECT delimiter FROM t;"));
        assert!(!has_delimiter_directive("DELIMITERS are fun"));
    }

    #[test]
    fn test_extract_delimiter() {
        assert_eq!(extract_delimiter("DELIMITER $$", 0).unwrap(), "$$");
        assert_eq!(extract_delimiter("  delimiter //  \r", 0).unwrap(), "//");
        assert_eq!(extract_delimiter("DELIMITER ;; trailing", 0).unwrap(), ";;");
    }

    #[test]
    fn test_extract_delimiter_without_value() {
        let err = extract_delimiter("DELIMITER   ", 4).unwrap_err();
        assert!(matches!(err, Error::DelimiterExtraction { line: 4, .. }));
    }

    #[test]
    fn test_preprocess_without_directive_is_identity() {
        let sql = "SELECT 1;\nSELECT 2;";
        assert_eq!(preprocess_delimiters(sql).unwrap(), sql);
    }

    #[test]
    fn test_preprocess_rewrites_custom_delimiter() {
        let sql = "DELIMITER $$\n\
                   CREATE PROCEDURE p()\n\
                   BEGIN\n  SELECT 1;\nEND$$\n\
                   DELIMITER ;\n\
                   CALL p();\n";
        let expected = "-- DELIMITER $$\n\
                        CREATE PROCEDURE p()\n\
                        BEGIN\n  SELECT 1;\nEND;\n\
                        -- DELIMITER ;\n\
                        CALL p();\n";
        let output = preprocess_delimiters(sql).unwrap();
        assert_eq!(output, expected);
        assert_eq!(output.lines().count(), sql.lines().count());
    }

    #[test]
    fn test_preprocess_keeps_crlf_line_endings() {
        let sql = "DELIMITER //\r\nSELECT 1//\r\nDELIMITER ;\r\n";
        assert_eq!(
            preprocess_delimiters(sql).unwrap(),
            "-- DELIMITER //\r\nSELECT 1;\r\n-- DELIMITER ;\r\n"
        );
    }

    #[test]
    fn test_preprocess_fails_on_bare_directive() {
        let err = preprocess_delimiters("SELECT 1;\nDELIMITER\nSELECT 2;").unwrap_err();
        assert!(matches!(err, Error::DelimiterExtraction { line: 1, .. }));
    }

    #[test]
    fn test_split_double_semicolon_delimiter() {
        let sql = "DELIMITER ;;\n\
                   CREATE PROCEDURE p(IN n INT)\nBEGIN\n  SET @x = n;\nEND;;\n\
                   DELIMITER ;\n\
                   CALL p(1000);\n\
                   SELECT @x;";
        let statements = split(sql);
        assert_eq!(
            non_empty(&statements),
            vec![
                "\nCREATE PROCEDURE p(IN n INT)\nBEGIN\n  SET @x = n;\nEND;",
                "\nCALL p(1000);",
                "\nSELECT @x;",
            ]
        );
        assert!(statements.iter().all(|s| !s.text.contains("DELIMITER")));
    }

    #[test]
    fn test_split_dollar_delimiter_inside_word() {
        let sql = "DELIMITER $$\nCREATE FUNCTION f() RETURNS INT BEGIN RETURN 1; END$$\nDELIMITER ;";
        let statements = split(sql);
        assert_eq!(
            non_empty(&statements),
            vec!["\nCREATE FUNCTION f() RETURNS INT BEGIN RETURN 1; END;"]
        );
    }

    #[test]
    fn test_multiple_routines_under_one_delimiter() {
        let sql = "DELIMITER //\nCREATE PROCEDURE a() SELECT 1//\nCREATE PROCEDURE b() SELECT 2//\n";
        let statements = split(sql);
        assert_eq!(
            non_empty(&statements),
            vec!["\nCREATE PROCEDURE a() SELECT 1;", "\nCREATE PROCEDURE b() SELECT 2;"]
        );
        assert!(statements.last().unwrap().empty);
    }

    #[test]
    fn test_delimiter_inside_string_is_ignored() {
        let sql = "DELIMITER $$\nSELECT 'a$$b'$$\n";
        let statements = split(sql);
        assert_eq!(non_empty(&statements), vec!["\nSELECT 'a$$b';"]);
    }

    #[test]
    fn test_many_statements_under_custom_delimiter() {
        let mut sql = String::from("DELIMITER $$\n");
        for i in 0..20_000 {
            sql.push_str(&format!("SELECT {i}, a, b, c FROM t$$\n"));
        }
        let statements = split(&sql);

        let texts = non_empty(&statements);
        assert_eq!(texts.len(), 20_000);
        assert_eq!(texts[0], "\nSELECT 0, a, b, c FROM t;");
        assert_eq!(texts[19_999], "\nSELECT 19999, a, b, c FROM t;");
        assert_eq!(statements[19_999].start, SourcePosition::new(20_000, 0));
    }

    #[test]
    fn test_delimiter_ending_inside_token() {
        let sql = "DELIMITER $$\nSELECT 1$$SELECT 2$$";
        let statements = split(sql);
        assert_eq!(non_empty(&statements), vec!["\nSELECT 1;", "SELECT 2;"]);
    }

    #[test]
    fn test_positions_skip_leading_whitespace() {
        let sql = "DELIMITER $$\n  SELECT 1$$";
        let statements = split(sql);
        assert_eq!(statements[0].start, SourcePosition::new(1, 2));
        assert_eq!(statements[0].base_line, 0);
    }

    #[test]
    fn test_content_before_directive_is_kept() {
        let sql = "SELECT 1\nDELIMITER $$\nSELECT 2$$";
        let statements = split(sql);
        assert_eq!(non_empty(&statements), vec!["SELECT 1\n", "\nSELECT 2;"]);
    }

    #[test]
    fn test_bare_directive_token_fails() {
        let tokens = tokenize("DELIMITER\nSELECT 1;").unwrap();
        let err = split_delimiter_mode("DELIMITER\nSELECT 1;", &tokens).unwrap_err();
        assert!(matches!(err, Error::DelimiterExtraction { line: 0, .. }));
    }
}
