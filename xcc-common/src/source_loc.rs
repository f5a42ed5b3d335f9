//! Source location tracking for diagnostics
//!
//! Every token, AST node and IR node can carry a span back into the
//! source file so failures late in the pipeline still point at user code.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in a source file (line and column are 1-based)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub filename: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(filename: &str, line: u32, column: u32) -> Self {
        Self {
            filename: filename.to_string(),
            line,
            column,
        }
    }

    /// Location used by synthesized nodes that have no source text
    pub fn dummy() -> Self {
        Self::new("<generated>", 0, 0)
    }

    fn position(&self) -> (u32, u32) {
        (self.line, self.column)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
}

/// A half-open region of a source file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceSpan {
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        Self { start, end }
    }

    pub fn from_location(location: SourceLocation) -> Self {
        Self {
            end: location.clone(),
            start: location,
        }
    }

    pub fn dummy() -> Self {
        Self::from_location(SourceLocation::dummy())
    }

    /// Smallest span covering both `self` and `other`.
    ///
    /// Spans from different files cannot be merged; `self` is returned as is.
    pub fn to(&self, other: &SourceSpan) -> SourceSpan {
        if self.start.filename != other.start.filename {
            return self.clone();
        }
        let start = if self.start.position() <= other.start.position() {
            &self.start
        } else {
            &other.start
        };
        let end = if self.end.position() >= other.end.position() {
            &self.end
        } else {
            &other.end
        };
        SourceSpan::new(start.clone(), end.clone())
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start.line == self.end.line {
            if self.start.column == self.end.column {
                write!(f, "{}", self.start)
            } else {
                write!(f, "{}-{}", self.start, self.end.column)
            }
        } else {
            write!(f, "{}-{}:{}", self.start, self.end.line, self.end.column)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_location_display() {
        let loc = SourceLocation::new("sum.l2", 3, 14);
        assert_eq!(loc.to_string(), "sum.l2:3:14");
    }

    #[test]
    fn test_span_display_forms() {
        let point = SourceSpan::from_location(SourceLocation::new("a.l2", 1, 5));
        assert_eq!(point.to_string(), "a.l2:1:5");

        let line = SourceSpan::new(
            SourceLocation::new("a.l2", 1, 5),
            SourceLocation::new("a.l2", 1, 9),
        );
        assert_eq!(line.to_string(), "a.l2:1:5-9");

        let multi = SourceSpan::new(
            SourceLocation::new("a.l2", 1, 5),
            SourceLocation::new("a.l2", 4, 2),
        );
        assert_eq!(multi.to_string(), "a.l2:1:5-4:2");
    }

    #[test]
    fn test_span_to_covers_both() {
        let left = SourceSpan::new(
            SourceLocation::new("a.l2", 2, 3),
            SourceLocation::new("a.l2", 2, 4),
        );
        let right = SourceSpan::new(
            SourceLocation::new("a.l2", 2, 8),
            SourceLocation::new("a.l2", 3, 1),
        );
        let merged = left.to(&right);
        assert_eq!(merged.start, left.start);
        assert_eq!(merged.end, right.end);
        assert_eq!(right.to(&left), merged);
    }

    #[test]
    fn test_span_to_other_file_keeps_self() {
        let a = SourceSpan::from_location(SourceLocation::new("a.l2", 1, 1));
        let b = SourceSpan::from_location(SourceLocation::new("b.l2", 9, 9));
        assert_eq!(a.to(&b), a);
    }
}
