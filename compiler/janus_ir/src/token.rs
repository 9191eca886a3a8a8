//! Tokens stored in a snapshot.

use std::fmt;

use crate::{Name, TokenSpan};

/// Index of a token within its snapshot.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct TokenId(u32);

impl TokenId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenId({})", self.0)
    }
}

/// Lexical category of a token.
///
/// Operator kinds double as the operator tag of `Operator` nodes, so the
/// lowering engine never re-reads operator text.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum TokenKind {
    // Literals and names
    Identifier,
    IntLiteral,
    FloatLiteral,
    StringLiteral,
    True,
    False,

    // Keywords
    Func,
    Async,
    Let,
    Var,
    Struct,
    Error,
    Trait,
    Impl,
    For,
    Import,
    Use,
    Zig,
    Dyn,
    If,
    Else,
    While,
    In,
    Match,
    When,
    Unless,
    Return,
    Break,
    Continue,
    Fail,
    Catch,
    Await,
    Nursery,
    Spawn,
    And,
    Or,
    Not,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Shl,
    Shr,
    Tilde,
    Bang,
    EqEq,
    BangEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    Question,

    // Punctuation
    Dot,
    DotDot,
    DotDotLt,
    Arrow,
    FatArrow,
    Comma,
    Colon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Underscore,
    Eof,
}

impl TokenKind {
    /// Canonical source spelling, or `None` for text-bearing kinds whose
    /// spelling lives in the token's interned text.
    pub const fn fixed_text(self) -> Option<&'static str> {
        Some(match self {
            TokenKind::Identifier
            | TokenKind::IntLiteral
            | TokenKind::FloatLiteral
            | TokenKind::StringLiteral => return None,
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Func => "func",
            TokenKind::Async => "async",
            TokenKind::Let => "let",
            TokenKind::Var => "var",
            TokenKind::Struct => "struct",
            TokenKind::Error => "error",
            TokenKind::Trait => "trait",
            TokenKind::Impl => "impl",
            TokenKind::For => "for",
            TokenKind::Import => "import",
            TokenKind::Use => "use",
            TokenKind::Zig => "zig",
            TokenKind::Dyn => "dyn",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::While => "while",
            TokenKind::In => "in",
            TokenKind::Match => "match",
            TokenKind::When => "when",
            TokenKind::Unless => "unless",
            TokenKind::Return => "return",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Fail => "fail",
            TokenKind::Catch => "catch",
            TokenKind::Await => "await",
            TokenKind::Nursery => "nursery",
            TokenKind::Spawn => "spawn",
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::Not => "not",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Amp => "&",
            TokenKind::Pipe => "|",
            TokenKind::Caret => "^",
            TokenKind::Shl => "<<",
            TokenKind::Shr => ">>",
            TokenKind::Tilde => "~",
            TokenKind::Bang => "!",
            TokenKind::EqEq => "==",
            TokenKind::BangEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::LtEq => "<=",
            TokenKind::Gt => ">",
            TokenKind::GtEq => ">=",
            TokenKind::Eq => "=",
            TokenKind::PlusEq => "+=",
            TokenKind::MinusEq => "-=",
            TokenKind::StarEq => "*=",
            TokenKind::SlashEq => "/=",
            TokenKind::PercentEq => "%=",
            TokenKind::Question => "?",
            TokenKind::Dot => ".",
            TokenKind::DotDot => "..",
            TokenKind::DotDotLt => "..<",
            TokenKind::Arrow => "->",
            TokenKind::FatArrow => "=>",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Underscore => "_",
            TokenKind::Eof => "",
        })
    }
}

/// A single token. Immutable once added to a snapshot.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    pub kind: TokenKind,
    pub text: Option<Name>,
    pub span: TokenSpan,
}

impl Token {
    pub const fn new(kind: TokenKind, text: Option<Name>, span: TokenSpan) -> Self {
        Token { kind, text, span }
    }
}
