//! Byte offset ↔ line/column conversion.

use text_size::{TextRange, TextSize};

use super::position::{Position, Span};

/// A 0-based line/column pair (columns are byte columns within the line).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

/// Maps byte offsets to line/column pairs and back.
///
/// Built once per buffer version and stored in the analysis snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// Byte offset of the start of each line. Always non-empty; the first
    /// entry is 0.
    line_starts: Vec<TextSize>,
    len: TextSize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::new(0)];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(TextSize::new(i as u32 + 1));
            }
        }
        Self {
            line_starts,
            len: TextSize::of(text),
        }
    }

    /// Number of lines (a trailing newline counts as starting a new line).
    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    /// Total length of the indexed text.
    pub fn len(&self) -> TextSize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == TextSize::new(0)
    }

    /// Convert a byte offset to a 0-based line/column pair.
    ///
    /// Offsets past the end of the text clamp to the last position.
    pub fn line_col(&self, offset: TextSize) -> LineCol {
        let offset = offset.min(self.len);
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let col = u32::from(offset) - u32::from(self.line_starts[line]);
        LineCol {
            line: line as u32,
            col,
        }
    }

    /// Convert a 0-based line/column pair to a byte offset.
    ///
    /// Returns None for lines past the end of the text; columns clamp to
    /// the line length.
    pub fn offset(&self, line_col: LineCol) -> Option<TextSize> {
        let start = *self.line_starts.get(line_col.line as usize)?;
        let line_end = self
            .line_starts
            .get(line_col.line as usize + 1)
            .copied()
            .unwrap_or(self.len);
        let offset = start + TextSize::new(line_col.col);
        Some(offset.min(line_end))
    }

    /// Convert a byte offset to a 1-based [`Position`].
    pub fn position(&self, offset: TextSize) -> Position {
        let lc = self.line_col(offset);
        Position::new(lc.line + 1, lc.col + 1)
    }

    /// Convert a byte range to a 1-based [`Span`].
    pub fn span(&self, range: TextRange) -> Span {
        Span::new(self.position(range.start()), self.position(range.end()))
    }

    /// Convert a 1-based [`Position`] to a byte offset.
    ///
    /// Returns None when the line is out of range or either coordinate
    /// is 0 (positions are 1-based).
    pub fn offset_of_position(&self, position: Position) -> Option<TextSize> {
        if position.line == 0 || position.column == 0 {
            return None;
        }
        self.offset(LineCol {
            line: position.line - 1,
            col: position.column - 1,
        })
    }
}
