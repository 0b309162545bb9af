//! Source location tracking for error messages and node positions.

use serde::Serialize;
use std::fmt;

/// A span represents a range of bytes in the source code, along with the
/// 1-based line and column where it starts.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    /// The starting byte offset (inclusive).
    pub start: u32,
    /// The ending byte offset (exclusive).
    pub end: u32,
    /// Line of `start`, counting from 1.
    pub line: u32,
    /// Column of `start` in characters, counting from 1.
    pub column: u32,
}

impl Span {
    /// Creates a new span from start to end.
    pub fn new(start: u32, end: u32, line: u32, column: u32) -> Self {
        debug_assert!(start <= end, "Span start must be <= end");
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Returns the length of the span in bytes.
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Returns true if the span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Creates a new span that covers both this span and another.
    ///
    /// The line and column are taken from whichever span starts first.
    pub fn merge(&self, other: Span) -> Span {
        let (line, column) = if other.start < self.start {
            (other.line, other.column)
        } else {
            (self.line, self.column)
        };
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            line,
            column,
        }
    }

    /// Returns a span that starts here and ends where `other` ends.
    pub fn to(&self, other: Span) -> Span {
        Span {
            start: self.start,
            end: other.end.max(self.start),
            line: self.line,
            column: self.column,
        }
    }

    /// Returns the dummy span used for synthetic nodes.
    pub fn dummy() -> Self {
        Self {
            start: 0,
            end: 0,
            line: 0,
            column: 0,
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}@{}:{}", self.start, self.end, self.line, self.column)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_earliest_position() {
        let a = Span::new(10, 14, 2, 3);
        let b = Span::new(2, 6, 1, 3);
        let merged = a.merge(b);
        assert_eq!(merged.start, 2);
        assert_eq!(merged.end, 14);
        assert_eq!(merged.line, 1);
        assert_eq!(merged.column, 3);
    }

    #[test]
    fn test_display_is_line_column() {
        assert_eq!(Span::new(0, 1, 4, 7).to_string(), "4:7");
    }
}
