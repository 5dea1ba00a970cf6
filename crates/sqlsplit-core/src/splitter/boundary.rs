//! Boundary splitter for scripts without delimiter redefinition
//!
//! Terminators are collected as candidate boundaries while scanning. Each
//! compound statement opener is pushed onto a stack; when its `END` is seen
//! the entry is removed and every candidate recorded after the opener is
//! dropped, since those terminators were inside the block.

use crate::error::Error;
use crate::lexer::{Keyword, Token, TokenKind};
use crate::position::SourcePosition;
use crate::splitter::{statements_from_boundaries, SingleStatement};

/// Compound statement opener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Construct {
    Begin,
    Case,
    If,
    Loop,
    While,
    Repeat,
}

impl Construct {
    /// `BEGIN` and `CASE` are both closed by a bare `END`
    fn closed_by(self, closer: Construct) -> bool {
        match (self, closer) {
            (Construct::Begin | Construct::Case, Construct::Begin | Construct::Case) => true,
            (open, closer) => open == closer,
        }
    }

    fn closer_text(self) -> &'static str {
        match self {
            Construct::Begin => "END",
            Construct::Case => "END CASE",
            Construct::If => "END IF",
            Construct::Loop => "END LOOP",
            Construct::While => "END WHILE",
            Construct::Repeat => "END REPEAT",
        }
    }
}

#[derive(Debug)]
struct OpenConstruct {
    construct: Construct,
    /// Index of the opening keyword in the token stream
    token: usize,
}

/// Split a script with no `DELIMITER` directive.
///
/// Fails with [`Error::UnbalancedNesting`] when an `END` has nothing to close.
pub fn split_boundaries(source: &str, tokens: &[Token]) -> Result<Vec<SingleStatement>, Error> {
    let boundaries = find_boundaries(tokens)?;
    Ok(statements_from_boundaries(source, tokens, &boundaries))
}

/// Indexes of top-level terminator tokens
fn find_boundaries(tokens: &[Token]) -> Result<Vec<usize>, Error> {
    let significant: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_default())
        .map(|(i, _)| i)
        .collect();

    let mut stack: Vec<OpenConstruct> = Vec::new();
    let mut pending: Vec<usize> = Vec::new();

    for (k, &index) in significant.iter().enumerate() {
        let token = &tokens[index];
        let prev = k.checked_sub(1).map(|p| &tokens[significant[p]]);
        let next = significant.get(k + 1).map(|&n| &tokens[n]);
        let prev_is = |keyword| prev.is_some_and(|t| t.is_keyword(keyword));
        let next_is = |keyword| next.is_some_and(|t| t.is_keyword(keyword));

        let opened = match token.kind {
            TokenKind::Semicolon => {
                pending.push(index);
                None
            }
            TokenKind::Keyword(Keyword::Begin) => {
                // BEGIN; / BEGIN WORK / XA BEGIN start transactions
                let transaction = next.map_or(true, |t| t.is_terminator() || t.is_eof())
                    || next_is(Keyword::Work)
                    || prev_is(Keyword::Xa);
                (!transaction).then_some(Construct::Begin)
            }
            TokenKind::Keyword(Keyword::Case) => {
                (!prev_is(Keyword::End)).then_some(Construct::Case)
            }
            TokenKind::Keyword(Keyword::If) => {
                (!prev_is(Keyword::End) && !next_is(Keyword::Exists)).then_some(Construct::If)
            }
            TokenKind::Keyword(Keyword::Loop) => {
                (!prev_is(Keyword::End)).then_some(Construct::Loop)
            }
            TokenKind::Keyword(Keyword::While) => {
                (!prev_is(Keyword::End)).then_some(Construct::While)
            }
            TokenKind::Keyword(Keyword::Repeat) => {
                (!prev_is(Keyword::End) && !prev_is(Keyword::Until)).then_some(Construct::Repeat)
            }
            TokenKind::Keyword(Keyword::End) if !prev_is(Keyword::Xa) => {
                let closer = match next.map(|t| t.kind) {
                    Some(TokenKind::Keyword(Keyword::If)) => Construct::If,
                    Some(TokenKind::Keyword(Keyword::Loop)) => Construct::Loop,
                    Some(TokenKind::Keyword(Keyword::While)) => Construct::While,
                    Some(TokenKind::Keyword(Keyword::Repeat)) => Construct::Repeat,
                    Some(TokenKind::Keyword(Keyword::Case)) => Construct::Case,
                    _ => Construct::Begin,
                };
                close(&mut stack, &mut pending, closer, token)?;
                None
            }
            _ => None,
        };

        if let Some(construct) = opened {
            stack.push(OpenConstruct {
                construct,
                token: index,
            });
        }
    }

    Ok(pending)
}

/// Remove the innermost construct `closer` can close and drop the terminators
/// recorded inside it.
///
/// Openers that never get closed, such as the `IF(cond, a, b)` function,
/// stay on the stack without affecting later matches.
fn close(
    stack: &mut Vec<OpenConstruct>,
    pending: &mut Vec<usize>,
    closer: Construct,
    end: &Token,
) -> Result<(), Error> {
    let Some(position) = stack
        .iter()
        .rposition(|open| open.construct.closed_by(closer))
    else {
        return Err(Error::UnbalancedNesting {
            closer: closer.closer_text().to_string(),
            position: SourcePosition::of_token(end),
        });
    };

    let open = stack.remove(position);
    let keep = pending.partition_point(|&boundary| boundary < open.token);
    pending.truncate(keep);
    Ok(())
}
