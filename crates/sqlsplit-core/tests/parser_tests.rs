// Integration tests for per-statement parsing
use pretty_assertions::assert_eq;
use sqlsplit_core::error::Error;
use sqlsplit_core::parser::ScriptParser;
use sqlsplit_core::position::SourcePosition;
use sqlsplit_core::SqlDialect;

fn syntax_error(script: &str) -> sqlsplit_core::SyntaxError {
    match ScriptParser::new().parse(script) {
        Err(Error::Syntax(err)) => err,
        other => panic!("expected syntax error, got {other:?}"),
    }
}

#[test]
fn test_parse_multi_statement_script() {
    let parser = ScriptParser::with_dialect(SqlDialect::MySQL);
    let parsed = parser
        .parse(
            r#"
            CREATE TABLE users (id INT PRIMARY KEY, name VARCHAR(100));
            INSERT INTO users VALUES (1, 'a;b');
            -- comment only
            ;
            SELECT name FROM users WHERE id = 1
        "#,
        )
        .unwrap();

    assert_eq!(parsed.len(), 3);
    assert!(parsed.iter().all(|p| p.ast.len() == 1));
}

#[test]
fn test_base_lines_follow_previous_statement_end() {
    let parsed = ScriptParser::new()
        .parse("SELECT 1;\n\nSELECT 2;\nSELECT\n3;\nSELECT 4;")
        .unwrap();

    let base_lines: Vec<_> = parsed.iter().map(|p| p.base_line).collect();
    assert_eq!(base_lines, vec![0, 0, 2, 4]);
}

#[test]
fn test_stops_at_first_syntax_error() {
    let err = syntax_error("SELECT 1;\nSELECT * FROM t WHERE;\nSELEC 3;");

    assert_eq!(err.position, SourcePosition::new(1, 21));
    assert!(err.message.starts_with("Syntax error at line 2:21\n"));
}

#[test]
fn test_error_line_after_multi_line_statement() {
    let err = syntax_error("SELECT\n  a,\n  b\nFROM t;\nSELECT * FROM t WHERE;");

    assert_eq!(err.position.line, 4);
    assert!(err.message.starts_with("Syntax error at line 5:"));
}

#[test]
fn test_error_line_after_delimiter_directive() {
    let err = syntax_error("DELIMITER $$\nSELECT 1$$\nDELIMITER ;\nSELECT * FROM t WHERE;");

    assert_eq!(err.position, SourcePosition::new(3, 21));
}

#[test]
fn test_compound_bodies_survive_delimiter_regions() {
    let script = "DELIMITER ;\n\
                  CREATE PROCEDURE p() BEGIN SELECT 1; END;\n\
                  DELIMITER $$\n\
                  CREATE PROCEDURE q() BEGIN SELECT 2; END$$\n\
                  DELIMITER ;\n\
                  SELECT 3;";
    let statements = ScriptParser::new().split(script).unwrap();

    let non_empty: Vec<_> = statements.iter().filter(|s| !s.empty).collect();
    assert_eq!(non_empty.len(), 3);
    assert!(non_empty[0].text.ends_with("CREATE PROCEDURE p() BEGIN SELECT 1; END;"));
    assert!(non_empty[1].text.ends_with("CREATE PROCEDURE q() BEGIN SELECT 2; END;"));
    assert_eq!(non_empty[2].base_line, 3);
    assert_eq!(non_empty[2].start, SourcePosition::new(5, 0));
}

#[test]
fn test_error_snippet_is_bounded_to_statement() {
    let long_select = format!("SELECT {} FROM t WHERE;", "column_name, ".repeat(10) + "x");
    let script = format!("SELECT 1;\n{long_select}");
    let err = syntax_error(&script);

    let related = err.message.split("related text: ").nth(1).unwrap();
    assert!(related.ends_with("WHERE;"));
    assert!(related.chars().count() <= 41);
    assert!(!related.contains("SELECT 1"));
}

#[test]
fn test_lex_error_is_reported_as_syntax_error() {
    let err = syntax_error("SELECT 1;\nSELECT \"open");

    assert_eq!(err.position, SourcePosition::new(1, 7));
    assert!(err.raw_message.contains("unterminated string literal"));
}

#[test]
fn test_segmentation_error_is_not_a_syntax_error() {
    let err = ScriptParser::new()
        .parse("DELIMITER\nSELECT 1;")
        .unwrap_err();

    assert!(err.is_segmentation());
}

#[test]
fn test_empty_script_parses_to_nothing() {
    assert!(ScriptParser::new().parse("").unwrap().is_empty());
    assert!(ScriptParser::new()
        .parse("  -- nothing\n/* here */\n")
        .unwrap()
        .is_empty());
}
