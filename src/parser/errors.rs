//! Syntax error types.
//!
//! Parse errors are recoverable: the parser always produces a best-effort
//! partial module, and every error here is folded into the diagnostic
//! sequence by the collector.

use text_size::{TextRange, TextSize};

/// Categorized parse error codes.
///
/// All syntax errors share the `E00xx` range; semantic codes live in
/// [`crate::hir::diagnostics::codes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorCode {
    UnexpectedToken,
    ExpectedExpression,
    ExpectedIdentifier,
    ExpectedIndentedBlock,
    InvalidAssignmentTarget,
    UnterminatedLiteral,
}

impl ParseErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ParseErrorCode::UnexpectedToken => "E0001",
            ParseErrorCode::ExpectedExpression => "E0002",
            ParseErrorCode::ExpectedIdentifier => "E0003",
            ParseErrorCode::ExpectedIndentedBlock => "E0004",
            ParseErrorCode::InvalidAssignmentTarget => "E0005",
            ParseErrorCode::UnterminatedLiteral => "E0006",
        }
    }
}

/// A syntax error with its source range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub range: TextRange,
    pub code: ParseErrorCode,
    /// Optional suggestion for fixing the error.
    pub hint: Option<String>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, range: TextRange, code: ParseErrorCode) -> Self {
        Self {
            message: message.into(),
            range,
            code,
            hint: None,
        }
    }

    /// Create an error at a specific offset with a zero-width range.
    pub fn at_offset(message: impl Into<String>, offset: TextSize, code: ParseErrorCode) -> Self {
        Self::new(message, TextRange::empty(offset), code)
    }

    /// Add a hint to this error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}
