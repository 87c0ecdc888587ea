//! Go-to-definition.
//!
//! Definition lookups return None in two documented cases besides plain
//! misses: keyword-argument names at call sites (never linked to the
//! parameter they name) and import-bound symbols (no cross-module
//! targets).

use text_size::TextSize;

use crate::base::{Name, Span};
use crate::hir::{Analysis, SymbolId, SymbolKind, Type};
use crate::parser::ast::{ExprKind, find_expr_at, find_keyword_arg_at};

/// A resolved definition site within the queried buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct GotoTarget {
    pub name: Name,
    pub kind: SymbolKind,
    /// 1-based span of the defining name token.
    pub span: Span,
    /// 1-based span of the whole defining construct.
    pub full_span: Span,
}

/// Find the definition of the name under the cursor.
pub fn goto_definition(analysis: &Analysis, offset: TextSize) -> Option<GotoTarget> {
    // Keyword-argument names shadow any expression at the same offset and
    // have no definition target.
    if find_keyword_arg_at(&analysis.module, offset).is_some() {
        return None;
    }
    // On a definition name, the definition is itself.
    if let Some(sym) = analysis.table.symbol_at_def(offset) {
        return target_for(analysis, sym);
    }
    let expr = find_expr_at(&analysis.module, offset)?;
    match &expr.kind {
        ExprKind::Name(_) => {
            let sym = analysis.table.resolve_use(expr.id)?;
            target_for(analysis, sym)
        }
        ExprKind::Attribute {
            value,
            attr,
            attr_range,
        } if attr_range.contains_inclusive(offset) => {
            let vty = analysis.type_of_expr(value.id)?;
            let class = match &*vty {
                Type::Instance { class, .. } => class.clone(),
                Type::Class(name) => name.clone(),
                _ => return None,
            };
            let scope = analysis.table.scope_at(offset);
            let class_sym = analysis.table.lookup(scope, &class)?;
            let body = analysis.table.symbol(class_sym).body_scope?;
            let member = analysis.table.scope(body).get(attr)?;
            target_for(analysis, member)
        }
        _ => None,
    }
}

fn target_for(analysis: &Analysis, sym: SymbolId) -> Option<GotoTarget> {
    let symbol = analysis.table.symbol(sym);
    // Imports bind a local name, but the definition lives in another
    // module the analyzer cannot see.
    if symbol.kind == SymbolKind::Import {
        return None;
    }
    Some(GotoTarget {
        name: symbol.name.clone(),
        kind: symbol.kind,
        span: analysis.line_index.span(symbol.def_range),
        full_span: analysis.line_index.span(symbol.full_range),
    })
}
