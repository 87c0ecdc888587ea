//! Inlay hints: inferred variable types and return types.
//!
//! Hints appear only where the source has no annotation and inference
//! produced something better than `Unknown`.

use text_size::TextSize;

use crate::base::Position;
use crate::hir::{Analysis, Type};
use crate::parser::ast::{ExprKind, StmtKind, walk_stmts};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlayHintKind {
    /// `: T` after an assignment target.
    Type,
    /// ` -> T` after a parameter list.
    ReturnType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InlayHint {
    /// 1-based position the hint is rendered at.
    pub position: Position,
    pub label: String,
    pub kind: InlayHintKind,
}

/// All inlay hints for the buffer, sorted by position.
pub fn inlay_hints(analysis: &Analysis) -> Vec<InlayHint> {
    let mut raw: Vec<(TextSize, String, InlayHintKind)> = Vec::new();
    walk_stmts(&analysis.module.body, &mut |stmt| match &stmt.kind {
        StmtKind::Assign {
            target,
            annotation: None,
            value: Some(_),
        } => {
            if let ExprKind::Name(_) = &target.kind {
                if let Some(ty) = analysis.type_of_expr(target.id) {
                    if !matches!(&*ty, Type::Unknown) {
                        raw.push((target.range.end(), format!(": {ty}"), InlayHintKind::Type));
                    }
                }
            }
        }
        StmtKind::FunctionDef(def) if def.returns.is_none() => {
            if let Some(ret) = inferred_return(analysis, def) {
                raw.push((
                    def.params_range.end(),
                    format!(" -> {ret}"),
                    InlayHintKind::ReturnType,
                ));
            }
        }
        _ => {}
    });
    raw.sort_by_key(|(offset, _, _)| *offset);
    raw.into_iter()
        .map(|(offset, label, kind)| InlayHint {
            position: analysis.line_index.position(offset),
            label,
            kind,
        })
        .collect()
}

/// The inferred return type of an unannotated def, read back off the
/// function symbol's finalized signature.
fn inferred_return(
    analysis: &Analysis,
    def: &crate::parser::ast::FunctionDef,
) -> Option<std::sync::Arc<Type>> {
    let body_scope = analysis.table.def_scope(def.name_range.start())?;
    let parent = analysis.table.scope(body_scope).parent?;
    let sym = analysis.table.scope(parent).get(def.name.as_ref())?;
    let ty = analysis.type_of_symbol(sym)?;
    let ret = match &*ty {
        Type::Callable(sig) => sig.ret.clone(),
        _ => return None,
    };
    if matches!(&*ret, Type::Unknown) {
        return None;
    }
    Some(ret)
}
