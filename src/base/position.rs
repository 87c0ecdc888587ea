//! Position tracking for the query API.
//!
//! The public query surface (hover, goto-definition, completion) and the
//! diagnostic shape both use 1-based line/column coordinates, matching the
//! editor marker contract. Byte offsets (`TextSize`/`TextRange`) are used
//! internally; conversion happens at the session boundary via
//! [`LineIndex`](super::LineIndex).

/// A position in source code (1-based line and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A span representing a range in source code (1-based, end-inclusive on
/// the last column the way editor markers expect).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Create a span from line/column coordinates.
    pub fn from_coords(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start: Position::new(start_line, start_col),
            end: Position::new(end_line, end_col),
        }
    }

    /// Check if a position falls within this span.
    pub fn contains(&self, position: Position) -> bool {
        if position.line < self.start.line || position.line > self.end.line {
            return false;
        }
        if position.line == self.start.line && position.column < self.start.column {
            return false;
        }
        if position.line == self.end.line && position.column > self.end.column {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_contains() {
        let span = Span::from_coords(2, 5, 4, 3);
        assert!(span.contains(Position::new(2, 5)));
        assert!(span.contains(Position::new(3, 1)));
        assert!(span.contains(Position::new(4, 3)));
        assert!(!span.contains(Position::new(2, 4)));
        assert!(!span.contains(Position::new(4, 4)));
        assert!(!span.contains(Position::new(1, 9)));
    }

    #[test]
    fn test_position_ordering() {
        assert!(Position::new(1, 9) < Position::new(2, 1));
        assert!(Position::new(2, 1) < Position::new(2, 2));
    }
}
