//! Source location spans for tokens.

use std::fmt;

/// Source location of a token: byte range plus 1-based line/column bounds.
///
/// Content IDs ignore spans unless explicitly asked for them, so two
/// subtrees that only differ in position hash identically.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct TokenSpan {
    pub start_byte: u32,
    pub end_byte: u32,
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl TokenSpan {
    /// Span for synthesized tokens with no source position.
    pub const DUMMY: TokenSpan = TokenSpan {
        start_byte: 0,
        end_byte: 0,
        start_line: 0,
        start_col: 0,
        end_line: 0,
        end_col: 0,
    };

    /// Span of a token that sits on a single line.
    pub const fn single_line(start_byte: u32, end_byte: u32, line: u32, start_col: u32) -> Self {
        TokenSpan {
            start_byte,
            end_byte,
            start_line: line,
            start_col,
            end_line: line,
            end_col: start_col + (end_byte - start_byte),
        }
    }

    /// Length in bytes.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end_byte - self.start_byte
    }

    /// Check if the span covers no bytes.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start_byte == self.end_byte
    }

    /// Smallest span covering both `self` and `other`.
    #[must_use]
    pub fn merge(self, other: TokenSpan) -> TokenSpan {
        let (first, last) = if (self.start_line, self.start_col) <= (other.start_line, other.start_col)
        {
            (self, other)
        } else {
            (other, self)
        };
        let end = if (last.end_line, last.end_col) >= (first.end_line, first.end_col) {
            last
        } else {
            first
        };
        TokenSpan {
            start_byte: self.start_byte.min(other.start_byte),
            end_byte: self.end_byte.max(other.end_byte),
            start_line: first.start_line,
            start_col: first.start_col,
            end_line: end.end_line,
            end_col: end.end_col,
        }
    }
}

impl fmt::Display for TokenSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}
