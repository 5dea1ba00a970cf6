//! MySQL-family lexer
//!
//! Produces the positioned token stream the splitters work on. Every byte of
//! the input belongs to exactly one token, so slicing the source by token
//! offsets reproduces it verbatim. Whitespace and comments are kept on the
//! hidden channel instead of being dropped.

use serde::Serialize;
use thiserror::Error;

/// Token channel: significant tokens vs. whitespace and comments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Default,
    Hidden,
}

/// Keywords that matter for statement boundary detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Keyword {
    Begin,
    End,
    Case,
    If,
    Loop,
    While,
    Repeat,
    Until,
    Work,
    Xa,
    Exists,
}

impl Keyword {
    fn lookup(word: &str) -> Option<Self> {
        const KEYWORDS: [(&str, Keyword); 11] = [
            ("BEGIN", Keyword::Begin),
            ("END", Keyword::End),
            ("CASE", Keyword::Case),
            ("IF", Keyword::If),
            ("LOOP", Keyword::Loop),
            ("WHILE", Keyword::While),
            ("REPEAT", Keyword::Repeat),
            ("UNTIL", Keyword::Until),
            ("WORK", Keyword::Work),
            ("XA", Keyword::Xa),
            ("EXISTS", Keyword::Exists),
        ];

        KEYWORDS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(word))
            .map(|(_, keyword)| *keyword)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Begin => "BEGIN",
            Keyword::End => "END",
            Keyword::Case => "CASE",
            Keyword::If => "IF",
            Keyword::Loop => "LOOP",
            Keyword::While => "WHILE",
            Keyword::Repeat => "REPEAT",
            Keyword::Until => "UNTIL",
            Keyword::Work => "WORK",
            Keyword::Xa => "XA",
            Keyword::Exists => "EXISTS",
        }
    }
}

/// Token category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Keyword(Keyword),
    /// Identifier or any keyword not listed in [`Keyword`]
    Word,
    /// Backtick-quoted identifier
    QuotedIdentifier,
    /// Single- or double-quoted string literal
    String,
    Number,
    Semicolon,
    /// Any other operator or punctuation character
    Punct,
    Whitespace,
    LineComment,
    BlockComment,
    /// A client-side `DELIMITER xxx` directive, covering the rest of its line
    Delimiter,
    /// Malformed input (only produced inside a [`LexError`])
    Invalid,
    Eof,
}

impl TokenKind {
    pub fn channel(&self) -> Channel {
        match self {
            TokenKind::Whitespace | TokenKind::LineComment | TokenKind::BlockComment => {
                Channel::Hidden
            }
            _ => Channel::Default,
        }
    }
}

/// A lexed token with its source coordinates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub channel: Channel,
    pub text: String,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column in characters (0-indexed)
    pub column: usize,
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset one past the last character
    pub stop: usize,
}

impl Token {
    pub fn is_default(&self) -> bool {
        self.channel == Channel::Default
    }

    pub fn is_terminator(&self) -> bool {
        self.kind == TokenKind::Semicolon
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }
}

/// Lexing failure, carrying the malformed token
#[derive(Debug, Clone, Error)]
#[error("{message} at line {}, column {}", token.line, token.column)]
pub struct LexError {
    pub token: Token,
    pub message: String,
}

/// Lex the whole input. The returned stream always ends with an `Eof` token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).tokenize()
}

pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    /// Only whitespace seen so far on the current line
    line_blank: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            column: 0,
            line_blank: true,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.is_eof();
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        let (start, line, column) = (self.pos, self.line, self.column);
        let Some(ch) = self.peek() else {
            return Ok(self.token(TokenKind::Eof, start, line, column));
        };

        let kind = match ch {
            c if c.is_whitespace() => {
                self.eat_while(char::is_whitespace);
                TokenKind::Whitespace
            }
            '#' => {
                self.eat_line();
                TokenKind::LineComment
            }
            // MySQL requires whitespace (or end of line) after `--`
            '-' if self.peek_nth(1) == Some('-')
                && self.peek_nth(2).map_or(true, char::is_whitespace) =>
            {
                self.eat_line();
                TokenKind::LineComment
            }
            '/' if self.peek_nth(1) == Some('*') => {
                self.block_comment(start, line, column)?;
                TokenKind::BlockComment
            }
            '\'' | '"' => {
                self.quoted(ch, true, start, line, column)?;
                TokenKind::String
            }
            '`' => {
                self.quoted(ch, false, start, line, column)?;
                TokenKind::QuotedIdentifier
            }
            ';' => {
                self.bump();
                TokenKind::Semicolon
            }
            c if c.is_ascii_digit() => {
                self.eat_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
                TokenKind::Number
            }
            c if is_word_start(c) => self.word(),
            _ => {
                self.bump();
                TokenKind::Punct
            }
        };

        if kind.channel() == Channel::Default {
            self.line_blank = false;
        }
        Ok(self.token(kind, start, line, column))
    }

    fn word(&mut self) -> TokenKind {
        let at_line_start = self.line_blank;
        let start = self.pos;
        self.eat_while(is_word_continue);
        let word = &self.source[start..self.pos];

        if at_line_start
            && word.eq_ignore_ascii_case("DELIMITER")
            && self.peek().map_or(true, char::is_whitespace)
        {
            self.eat_line();
            return TokenKind::Delimiter;
        }

        Keyword::lookup(word).map_or(TokenKind::Word, TokenKind::Keyword)
    }

    fn block_comment(&mut self, start: usize, line: usize, column: usize) -> Result<(), LexError> {
        self.bump();
        self.bump();
        while let Some(c) = self.bump() {
            if c == '*' && self.peek() == Some('/') {
                self.bump();
                return Ok(());
            }
        }
        Err(self.error("unterminated block comment", start, line, column))
    }

    /// Consume a quoted literal. A doubled quote character is an escaped
    /// quote; backslash escapes apply only to string literals.
    fn quoted(
        &mut self,
        quote: char,
        backslash_escapes: bool,
        start: usize,
        line: usize,
        column: usize,
    ) -> Result<(), LexError> {
        self.bump();
        while let Some(c) = self.bump() {
            if c == '\\' && backslash_escapes {
                self.bump();
            } else if c == quote {
                if self.peek() == Some(quote) {
                    self.bump();
                } else {
                    return Ok(());
                }
            }
        }
        let what = if backslash_escapes {
            "unterminated string literal"
        } else {
            "unterminated quoted identifier"
        };
        Err(self.error(what, start, line, column))
    }

    /// Consume up to, but not including, the next newline
    fn eat_line(&mut self) {
        self.eat_while(|c| c != '\n');
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 0;
            self.line_blank = true;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn token(&self, kind: TokenKind, start: usize, line: usize, column: usize) -> Token {
        Token {
            kind,
            channel: kind.channel(),
            text: self.source[start..self.pos].to_string(),
            line,
            column,
            start,
            stop: self.pos,
        }
    }

    fn error(&self, message: &str, start: usize, line: usize, column: usize) -> LexError {
        LexError {
            token: self.token(TokenKind::Invalid, start, line, column),
            message: message.to_string(),
        }
    }
}

fn is_word_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_word_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || !c.is_ascii()
}
