//! Overload candidates at a call site.

use std::sync::Arc;

use text_size::TextSize;

use crate::hir::{Analysis, Signature, Type};
use crate::parser::ast::{ExprKind, find_call_at};

/// Candidate signatures for the innermost call containing `offset`.
///
/// Per-argument filtering is not performed: for an overloaded callee the
/// full declared set comes back in declaration order, for a plain callable
/// a single signature, and for anything else an empty list.
pub fn matching_overloads(analysis: &Analysis, offset: TextSize) -> Vec<Arc<Signature>> {
    let Some(call) = find_call_at(&analysis.module, offset) else {
        return Vec::new();
    };
    let ExprKind::Call { callee, .. } = &call.kind else {
        return Vec::new();
    };
    let Some(ty) = analysis.type_of_expr(callee.id) else {
        return Vec::new();
    };
    ty.callable_signatures()
}
