//! Source locations.
//!
//! The external parser stamps every node with a `TextSpan`; the binder copies
//! it onto bound nodes and diagnostics, and the CLI hands it to miette.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Byte offset into a source file.
pub type TextPos = u32;

/// A half-open byte range `[start, start + length)`.
///
/// Serialized as `{ "start": .., "length": .. }`, the shape the parser emits.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TextSpan {
    pub start: TextPos,
    pub length: TextPos,
}

impl TextSpan {
    #[inline]
    pub fn new(start: TextPos, length: TextPos) -> Self {
        Self { start, length }
    }

    /// The span from `start` up to, not including, `end`.
    #[inline]
    pub fn from_bounds(start: TextPos, end: TextPos) -> Self {
        debug_assert!(start <= end, "span bounds out of order");
        Self::new(start, end - start)
    }

    /// A zero-length span, used for nodes the parser synthesized.
    #[inline]
    pub fn empty(at: TextPos) -> Self {
        Self::new(at, 0)
    }

    #[inline]
    pub fn end(&self) -> TextPos {
        self.start + self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    #[inline]
    pub fn contains(&self, pos: TextPos) -> bool {
        (self.start..self.end()).contains(&pos)
    }

    /// The smallest span covering `self` and `other`.
    pub fn union(&self, other: &TextSpan) -> TextSpan {
        TextSpan::from_bounds(self.start.min(other.start), self.end().max(other.end()))
    }

    /// The last byte of the span, e.g. the closing brace of a block. An empty
    /// span is returned as is.
    pub fn last_char(&self) -> TextSpan {
        match self.length {
            0 => *self,
            _ => TextSpan::new(self.end() - 1, 1),
        }
    }
}

impl fmt::Debug for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end())
    }
}

impl fmt::Display for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_half_open() {
        let span = TextSpan::new(5, 10);
        assert_eq!(span.end(), 15);
        assert!(span.contains(5));
        assert!(span.contains(14));
        assert!(!span.contains(15));
        assert!(!TextSpan::empty(5).contains(5));
    }

    #[test]
    fn test_union_covers_both() {
        let a = TextSpan::new(10, 2);
        let b = TextSpan::new(3, 4);
        assert_eq!(a.union(&b), TextSpan::from_bounds(3, 12));
        assert_eq!(b.union(&a), a.union(&b));
    }

    #[test]
    fn test_last_char() {
        assert_eq!(TextSpan::new(4, 6).last_char(), TextSpan::new(9, 1));
        assert_eq!(TextSpan::empty(7).last_char(), TextSpan::empty(7));
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_string(&TextSpan::new(2, 3)).unwrap();
        assert_eq!(json, r#"{"start":2,"length":3}"#);
        assert_eq!(format!("{:?} {}", TextSpan::new(2, 3), TextSpan::new(2, 3)), "2..5 [2, 5)");
    }
}
