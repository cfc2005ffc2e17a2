//! Module `scanner` implements a one‑pass, streaming UTF‑8 lexer for MathScript.
//!
//! It transforms a `&str` into a sequence of `Token<'a>`s, skipping whitespace
//! and comments, and emitting exactly one `EndOfInput` token at the end. Designed
//! as a `FusedIterator`, it can be chained safely with other iterator adapters.
//!
//! # Public API
//!
//! - `Scanner::new(src: &'a str) -> Scanner<'a>`
//!   Create a new lexer over the input text.
//!
//! - `impl Iterator for Scanner<'a>`
//!   Yields `Result<Token<'a>>` on each `.next()`. Newline tokens are yielded
//!   too, so callers that care about line structure can see them.
//!
//! - `tokenize(src) -> Result<Vec<Token>>`
//!   The all‑or‑nothing entry point used by the pipeline: newlines are dropped
//!   and the first lexical error aborts the whole scan.
//!
//! # Token Recognition (`scan_token`)
//!
//! - Punctuation: `(`, `)`, `{`, `}`, `,`, `:`, `;`.
//! - Operators: `+ - * / ^ %`, `=`, `==`, `!=`, `<`, `<=`, `>`, `>=`, the
//!   Unicode forms `≤ ≥ ≠` and the aggregate symbols `∑ ∏ ∫`.
//! - String literals: `"` … `"` with backslash escapes, may span lines.
//! - Numeric literals: `12`, `12.`, `12.5`, `.5`.
//! - Identifiers/keywords: `[A-Za-z_][A-Za-z0-9_]*`, resolved via a
//!   perfect‑hash `KEYWORDS` map. `π` scans as a one‑character identifier.
//! - Comments: `#` to end of line, skipped with `memchr`.
//! - Errors: any other character yields `MathScriptError::UnexpectedChar`.

use crate::error::{MathScriptError, Result};
use crate::token::{Keyword, Operator, Position, Token, TokenKind};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;
use std::iter::FusedIterator;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static str, Keyword> = phf_map! {
    "function" => Keyword::Function,
    "if"       => Keyword::If,
    "else"     => Keyword::Else,
    "for"      => Keyword::For,
    "while"    => Keyword::While,
    "return"   => Keyword::Return,
    "and"      => Keyword::And,
    "or"       => Keyword::Or,
    "not"      => Keyword::Not,
    "in"       => Keyword::In,
    "true"     => Keyword::True,
    "false"    => Keyword::False,
    "to"       => Keyword::To,
};

/// Scan `src` into the token sequence consumed by the parser.
///
/// Newline tokens are dropped. The result always ends with exactly one
/// `EndOfInput` token; any lexical error fails the whole call.
pub fn tokenize(src: &str) -> Result<Vec<Token<'_>>> {
    info!("Tokenizing {} bytes", src.len());

    let tokens: Vec<Token<'_>> = Scanner::new(src)
        .filter(|res| !matches!(res, Ok(token) if token.kind == TokenKind::Newline))
        .collect::<Result<_>>()?;

    info!("Tokenized into {} tokens", tokens.len());

    Ok(tokens)
}

/// A single pass **scanner / lexer** that converts source text into a
/// sequence of [`Token`]s. The lifetime `'a` ties every emitted token's
/// `lexeme` slice back to the source text.
pub struct Scanner<'a> {
    src: &'a str,               // entire source text
    start: usize,               // byte index of the first char of the current lexeme
    curr: usize,                // byte index one past the last char examined
    line: usize,                // 1‑based line of `curr`
    column: usize,              // 1‑based column (in chars) of `curr`
    start_pos: Position,        // position of `start`
    pending: Option<TokenKind>, // recognised token kind waiting to be emitted
    finished: bool,             // EndOfInput already yielded
}

impl<'a> Scanner<'a> {
    #[inline]
    pub fn new(src: &'a str) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            start: 0,
            curr: 0,
            line: 1,
            column: 1,
            start_pos: Position::new(1, 1),
            pending: None,
            finished: false,
        }
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.src.len()
    }

    #[inline(always)]
    fn here(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// Consume one char and return it, keeping line/column in step.
    /// Callers guard with [`is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> char {
        let c = self.peek();
        self.curr += c.len_utf8();

        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        c
    }

    /// Peek at the current char without consuming it. `'\0'` past the end.
    #[inline(always)]
    fn peek(&self) -> char {
        self.src[self.curr..].chars().next().unwrap_or('\0')
    }

    /// Consume the current char **iff** it matches `expected`.
    #[inline(always)]
    fn match_char(&mut self, expected: char) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Scan a *single* token starting at `self.curr`. A recognised token kind
    /// is stored in `self.pending`; whitespace and comments leave it `None`.
    fn scan_token(&mut self) -> Result<()> {
        let c = self.advance();

        let kind = match c {
            // ── punctuation ──────────────────────────────────────────────
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,

            // ── single‑character operators ───────────────────────────────
            '+' => TokenKind::Operator(Operator::Plus),
            '-' => TokenKind::Operator(Operator::Minus),
            '*' => TokenKind::Operator(Operator::Star),
            '/' => TokenKind::Operator(Operator::Slash),
            '^' => TokenKind::Operator(Operator::Caret),
            '%' => TokenKind::Operator(Operator::Percent),
            '≤' => TokenKind::Operator(Operator::LessEqual),
            '≥' => TokenKind::Operator(Operator::GreaterEqual),
            '≠' => TokenKind::Operator(Operator::BangEqual),
            '∑' => TokenKind::Operator(Operator::Sum),
            '∏' => TokenKind::Operator(Operator::Product),
            '∫' => TokenKind::Operator(Operator::Integral),

            // ── one‑or‑two‑character operators ───────────────────────────
            '=' => {
                if self.match_char('=') {
                    TokenKind::Operator(Operator::EqualEqual)
                } else {
                    TokenKind::Operator(Operator::Assign)
                }
            }

            '<' => {
                if self.match_char('=') {
                    TokenKind::Operator(Operator::LessEqual)
                } else {
                    TokenKind::Operator(Operator::Less)
                }
            }

            '>' => {
                if self.match_char('=') {
                    TokenKind::Operator(Operator::GreaterEqual)
                } else {
                    TokenKind::Operator(Operator::Greater)
                }
            }

            '!' if self.match_char('=') => TokenKind::Operator(Operator::BangEqual),

            // ── whitespace / newline ─────────────────────────────────────
            ' ' | '\r' | '\t' => return Ok(()),

            '\n' => TokenKind::Newline,

            // ── comments (# … until newline) ─────────────────────────────
            '#' => {
                let rest: &str = &self.src[self.curr..];
                let skip: usize = memchr(b'\n', rest.as_bytes()).unwrap_or(rest.len());

                self.column += rest[..skip].chars().count();
                self.curr += skip;

                return Ok(());
            }

            '"' => self.parse_string()?,

            '0'..='9' => self.parse_number(false),

            '.' if self.peek().is_ascii_digit() => self.parse_number(true),

            'a'..='z' | 'A'..='Z' | '_' => self.parse_identifier(),

            'π' => TokenKind::Identifier,

            // ── unexpected character ─────────────────────────────────────
            _ => {
                debug!("Unexpected character {:?} at {}", c, self.start_pos);

                return Err(MathScriptError::UnexpectedChar {
                    ch: c,
                    pos: self.start_pos,
                });
            }
        };

        self.pending = Some(kind);

        Ok(())
    }

    /// Parse a double‑quoted string literal, resolving escapes.
    ///
    /// * `self.start` still points to the opening `"`.
    /// * On return `self.curr` points **past** the closing `"`.
    fn parse_string(&mut self) -> Result<TokenKind> {
        let mut value = String::new();

        loop {
            if self.is_at_end() {
                return Err(MathScriptError::UnterminatedString {
                    pos: self.start_pos,
                });
            }

            let escape_pos: Position = self.here();

            match self.advance() {
                '"' => break,
                '\\' => {
                    if self.is_at_end() {
                        return Err(MathScriptError::UnterminatedString {
                            pos: self.start_pos,
                        });
                    }

                    let escaped = match self.advance() {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '0' => '\0',
                        '"' => '"',
                        '\\' => '\\',
                        other => {
                            return Err(MathScriptError::UnknownEscape {
                                ch: other,
                                pos: escape_pos,
                            })
                        }
                    };

                    value.push(escaped);
                }
                c => value.push(c),
            }
        }

        Ok(TokenKind::String(value))
    }

    /// Parse a numeric literal. The lexeme is kept as text; the parser does
    /// the `f64` conversion.
    fn parse_number(&mut self, leading_dot: bool) -> TokenKind {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if !leading_dot && self.peek() == '.' {
            self.advance(); // consume "."

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        TokenKind::Number
    }

    /// Parse an identifier and decide if it is a **keyword** or a generic
    /// `Identifier` token.
    fn parse_identifier(&mut self) -> TokenKind {
        while {
            let c: char = self.peek();
            c.is_ascii_alphanumeric() || c == '_'
        } {
            self.advance();
        }

        let word: &str = &self.src[self.start..self.curr];

        KEYWORDS
            .get(word)
            .map(|kw| TokenKind::Keyword(*kw))
            .unwrap_or(TokenKind::Identifier)
    }
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        // Loop until we either emit a token, hit the end, or see an error.
        loop {
            if self.is_at_end() {
                self.finished = true;
                return Some(Ok(Token::new(TokenKind::EndOfInput, "", self.here())));
            }

            self.start = self.curr;
            self.start_pos = self.here();
            self.pending = None;

            if let Err(e) = self.scan_token() {
                return Some(Err(e));
            }

            if let Some(kind) = self.pending.take() {
                let lexeme: &'a str = &self.src[self.start..self.curr];
                return Some(Ok(Token::new(kind, lexeme, self.start_pos)));
            }
            // Otherwise it was whitespace / comment → continue loop.
        }
    }
}

impl<'a> FusedIterator for Scanner<'a> {}
