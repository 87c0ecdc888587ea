//! Hover: type information at a cursor position.

use std::fmt::Write as _;

use text_size::{TextRange, TextSize};

use crate::base::Span;
use crate::hir::{Analysis, Symbol, SymbolId, SymbolKind, Type};
use crate::parser::ast::{ExprKind, find_expr_at};

/// Markdown hover contents plus the 1-based span of the hovered token.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverResult {
    pub markdown: String,
    pub span: Span,
}

/// Hover information at `offset`, or None when nothing there has a type.
pub fn hover(analysis: &Analysis, offset: TextSize) -> Option<HoverResult> {
    // A definition name first: hovering `f` in `def f(...)` shows the
    // declared signature even though the name is not an expression.
    if let Some(sym) = analysis.table.symbol_at_def(offset) {
        let symbol = analysis.table.symbol(sym);
        return Some(HoverResult {
            markdown: symbol_markdown(analysis, sym, symbol),
            span: analysis.line_index.span(symbol.def_range),
        });
    }

    let expr = find_expr_at(&analysis.module, offset)?;
    if let ExprKind::Name(_) = &expr.kind {
        if let Some(sym) = analysis.table.resolve_use(expr.id) {
            let symbol = analysis.table.symbol(sym);
            return Some(HoverResult {
                markdown: symbol_markdown(analysis, sym, symbol),
                span: analysis.line_index.span(expr.range),
            });
        }
    }
    let ty = analysis.type_of_expr(expr.id)?;
    Some(HoverResult {
        markdown: code_block(&ty.to_string()),
        span: analysis.line_index.span(narrow_range(analysis, expr.range, offset)),
    })
}

/// For attribute expressions, highlight just the member name under the
/// cursor rather than the whole chain.
fn narrow_range(analysis: &Analysis, expr_range: TextRange, offset: TextSize) -> TextRange {
    match super::text_utils::word_at(&analysis.text, offset) {
        Some((_, range)) if expr_range.contains_range(range) => range,
        _ => expr_range,
    }
}

fn symbol_markdown(analysis: &Analysis, sym: SymbolId, symbol: &Symbol) -> String {
    let ty = analysis.type_of_symbol(sym);
    let header = match (symbol.kind, ty.as_deref()) {
        (SymbolKind::Function, Some(Type::Callable(sig))) => sig.display_def(),
        (SymbolKind::Function, Some(Type::Overload(set))) => {
            let mut out = String::new();
            for (i, sig) in set.signatures.iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                let _ = write!(out, "@overload\n{}", sig.display_def());
            }
            out
        }
        (SymbolKind::Class, _) => format!("class {}", symbol.name),
        (SymbolKind::Parameter, ty) => {
            format!("(parameter) {}: {}", symbol.name, display_or_unknown(ty))
        }
        (SymbolKind::Import, Some(Type::Module(name))) => format!("(module) {name}"),
        (SymbolKind::Import, ty) => {
            format!("(import) {}: {}", symbol.name, display_or_unknown(ty))
        }
        (_, ty) => format!("(variable) {}: {}", symbol.name, display_or_unknown(ty)),
    };
    let mut markdown = code_block(&header);
    if let Some(doc) = &symbol.docstring {
        let _ = write!(markdown, "\n---\n{doc}");
    }
    markdown
}

fn display_or_unknown(ty: Option<&Type>) -> String {
    ty.map_or_else(|| "Unknown".to_string(), |t| t.to_string())
}

fn code_block(contents: &str) -> String {
    format!("```python\n{contents}\n```")
}
