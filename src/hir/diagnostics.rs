//! Diagnostic model and the per-buffer collector.
//!
//! Internal passes report [`RawDiagnostic`]s with byte ranges; the
//! collector converts them to user-facing [`Diagnostic`]s with 1-based
//! line/column positions and sorts them by source position. Each analysis
//! run replaces the previous diagnostic set wholesale.

use std::fmt;
use std::sync::Arc;

use text_size::TextRange;

use crate::base::LineIndex;
use crate::parser::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl Severity {
    /// LSP `DiagnosticSeverity` value.
    pub fn to_lsp(self) -> u8 {
        match self {
            Severity::Error => 1,
            Severity::Warning => 2,
            Severity::Info => 3,
            Severity::Hint => 4,
        }
    }

    pub fn display(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Hint => "hint",
        }
    }
}

/// Stable diagnostic codes. `E00xx` are syntax errors, `E1xxx` name
/// resolution, `E2xxx` type checks.
pub mod codes {
    pub const UNDEFINED_NAME: &str = "E1001";
    pub const NOT_CALLABLE: &str = "E2001";
    pub const TOO_MANY_ARGS: &str = "E2002";
    pub const MISSING_ARG: &str = "E2003";
    pub const UNEXPECTED_KEYWORD: &str = "E2004";
    pub const BAD_ARGUMENT: &str = "E2005";
    pub const BAD_ASSIGNMENT: &str = "E2006";
    pub const BAD_RETURN: &str = "E2007";
    pub const RETURN_OUTSIDE_FUNCTION: &str = "E2008";
    pub const BAD_OPERAND: &str = "E2009";
}

/// A diagnostic reported with byte offsets, before position mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDiagnostic {
    pub range: TextRange,
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    pub detail: Option<String>,
}

impl RawDiagnostic {
    pub fn error(range: TextRange, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            range,
            severity: Severity::Error,
            code,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// A user-facing diagnostic with 1-based positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
    pub code: Arc<str>,
    pub message: Arc<str>,
    pub detail: Option<Arc<str>>,
}

impl Diagnostic {
    /// Header message plus detail lines, newline-joined.
    pub fn render_message(&self) -> String {
        match &self.detail {
            Some(detail) => format!("{}\n{}", self.message, detail),
            None => self.message.to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} {} [{}] {}",
            self.start_line,
            self.start_col,
            self.severity.display(),
            self.code,
            self.message
        )
    }
}

/// Merge parse errors and semantic diagnostics into the final per-buffer
/// set, ordered by (start line, start column). The sort is stable, so
/// diagnostics at the same position keep reporting order.
pub fn collect_diagnostics(
    parse_errors: &[ParseError],
    raw: Vec<RawDiagnostic>,
    line_index: &LineIndex,
) -> Vec<Diagnostic> {
    let mut out: Vec<Diagnostic> = Vec::with_capacity(parse_errors.len() + raw.len());
    for err in parse_errors {
        let span = line_index.span(err.range);
        out.push(Diagnostic {
            severity: Severity::Error,
            start_line: span.start.line,
            start_col: span.start.column,
            end_line: span.end.line,
            end_col: span.end.column,
            code: Arc::from(err.code.as_str()),
            message: Arc::from(err.message.as_str()),
            detail: err.hint.as_deref().map(Arc::from),
        });
    }
    for d in raw {
        let span = line_index.span(d.range);
        out.push(Diagnostic {
            severity: d.severity,
            start_line: span.start.line,
            start_col: span.start.column,
            end_line: span.end.line,
            end_col: span.end.column,
            code: Arc::from(d.code),
            message: Arc::from(d.message.as_str()),
            detail: d.detail.as_deref().map(Arc::from),
        });
    }
    out.sort_by_key(|d| (d.start_line, d.start_col));
    out
}
