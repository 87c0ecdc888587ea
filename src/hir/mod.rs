//! Semantic analysis: name resolution, type inference, diagnostics.
//!
//! [`analyze`] runs the full pipeline on one buffer's text and returns an
//! immutable [`Analysis`]. Analyses are pure values: two runs over the
//! same text produce equal results, and a committed analysis is never
//! mutated afterwards. The session layer keeps one per buffer and swaps
//! whole values on version changes.

pub mod diagnostics;
pub mod infer;
pub mod resolve;
pub mod symbols;
pub mod types;

use std::sync::Arc;

use crate::base::LineIndex;
use crate::parser::ast::{ExprId, Module};
use crate::parser::{ParseError, parse};

pub use diagnostics::{Diagnostic, RawDiagnostic, Severity, codes};
pub use infer::{InferenceResult, infer_module};
pub use resolve::resolve;
pub use symbols::{
    MODULE_SCOPE, Scope, ScopeId, ScopeKind, Symbol, SymbolId, SymbolKind, SymbolTable,
};
pub use types::{OverloadSet, ParamType, Signature, Type};

/// The complete analysis of one buffer version.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub text: Arc<str>,
    pub line_index: LineIndex,
    pub module: Module,
    pub parse_errors: Vec<ParseError>,
    pub table: SymbolTable,
    pub types: InferenceResult,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse, resolve, infer, and collect diagnostics for `text`.
pub fn analyze(text: &str) -> Analysis {
    let line_index = LineIndex::new(text);
    let parsed = parse(text);
    let table = resolve(&parsed.module);
    let types = infer_module(&parsed.module, &table);
    let diagnostics = diagnostics::collect_diagnostics(
        &parsed.errors,
        types.diagnostics.clone(),
        &line_index,
    );
    tracing::debug!(
        bytes = text.len(),
        diagnostics = diagnostics.len(),
        "analyzed buffer"
    );
    Analysis {
        text: Arc::from(text),
        line_index,
        module: parsed.module,
        parse_errors: parsed.errors,
        table,
        types,
        diagnostics,
    }
}

impl Analysis {
    pub fn type_of_expr(&self, id: ExprId) -> Option<Arc<Type>> {
        self.types.expr_types.get(&id).cloned()
    }

    pub fn type_of_symbol(&self, id: SymbolId) -> Option<Arc<Type>> {
        self.types.symbol_types.get(&id).cloned()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}
