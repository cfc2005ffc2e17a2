use log::debug;
use serde::Serialize;
use std::fmt;

/// 1‑based line / column of a token's first character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Reserved words. The scanner re-tags any identifier spelled like one of
/// these as a [`TokenKind::Keyword`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Keyword {
    Function,
    If,
    Else,
    For,
    While,
    Return,
    And,
    Or,
    Not,
    In,
    True,
    False,
    /// Separates the bounds of an aggregate: `∑(i = 1 to n)`.
    To,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Function => "function",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::For => "for",
            Keyword::While => "while",
            Keyword::Return => "return",
            Keyword::And => "and",
            Keyword::Or => "or",
            Keyword::Not => "not",
            Keyword::In => "in",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::To => "to",
        }
    }
}

/// Operator symbols. `≤ ≥ ≠` are scanned into the same variants as their
/// ASCII spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operator {
    /// '+'
    Plus,

    /// '-'
    Minus,

    /// '*'
    Star,

    /// '/'
    Slash,

    /// '^'
    Caret,

    /// '%'
    Percent,

    /// '='
    Assign,

    /// '=='
    EqualEqual,

    /// '!=' or '≠'
    BangEqual,

    /// '<'
    Less,

    /// '<=' or '≤'
    LessEqual,

    /// '>'
    Greater,

    /// '>=' or '≥'
    GreaterEqual,

    /// '∑'
    Sum,

    /// '∏'
    Product,

    /// '∫'
    Integral,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
            Operator::Caret => "^",
            Operator::Percent => "%",
            Operator::Assign => "=",
            Operator::EqualEqual => "==",
            Operator::BangEqual => "!=",
            Operator::Less => "<",
            Operator::LessEqual => "<=",
            Operator::Greater => ">",
            Operator::GreaterEqual => ">=",
            Operator::Sum => "∑",
            Operator::Product => "∏",
            Operator::Integral => "∫",
        }
    }
}

/// The different kinds of tokens recognized by the scanner.
///
/// `Number` keeps only its lexeme; the parser converts it to `f64`.
/// `String` carries the literal contents with escapes already resolved.
/// `EndOfInput` terminates every token sequence exactly once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TokenKind {
    Number,
    String(String),
    Identifier,
    Keyword(Keyword),
    Operator(Operator),

    /// ','
    Comma,

    /// ':'
    Colon,

    /// ';'
    Semicolon,

    /// '('
    LParen,

    /// ')'
    RParen,

    /// '{'
    LBrace,

    /// '}'
    RBrace,

    /// Line break. Yielded by the scanner, dropped before parsing.
    Newline,

    EndOfInput,
}

impl TokenKind {
    /// Upper-case tag used by the `tokenize` output and by parse errors.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Number => "NUMBER",
            TokenKind::String(_) => "STRING",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::Keyword(_) => "KEYWORD",
            TokenKind::Operator(_) => "OPERATOR",
            TokenKind::Comma => "COMMA",
            TokenKind::Colon => "COLON",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::LParen => "LEFT_PAREN",
            TokenKind::RParen => "RIGHT_PAREN",
            TokenKind::LBrace => "LEFT_BRACE",
            TokenKind::RBrace => "RIGHT_BRACE",
            TokenKind::Newline => "NEWLINE",
            TokenKind::EndOfInput => "EOF",
        }
    }
}

/// A scanned token, including its kind, the source lexeme,
/// and the position where it starts.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Token<'a> {
    /// The category of this token.
    pub kind: TokenKind,

    /// The exact substring from the source that produced this token.
    pub lexeme: &'a str,

    pub pos: Position,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, lexeme: &'a str, pos: Position) -> Self {
        debug!("Creating new token: kind={:?}, lexeme={:?}, {}", kind, lexeme, pos);

        Self { kind, lexeme, pos }
    }

    /// Human-readable description for "found ..." in parse errors.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::EndOfInput => "end of input".to_string(),
            TokenKind::String(_) => format!("string {}", self.lexeme),
            _ => format!("'{}'", self.lexeme),
        }
    }
}

impl<'a> fmt::Display for Token<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 3 → "3.0", 3.14 → "3.14", mirroring how literals are reported.
        let literal: String = match &self.kind {
            TokenKind::String(s) => s.clone(),
            TokenKind::Number => match self.lexeme.parse::<f64>() {
                Ok(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                    let mut buf = itoa::Buffer::new();
                    format!("{}.0", buf.format(n as i64))
                }
                Ok(n) => n.to_string(),
                Err(_) => "null".to_string(),
            },
            _ => "null".to_string(),
        };

        write!(f, "{} {} {}", self.kind.name(), self.lexeme, literal)
    }
}
