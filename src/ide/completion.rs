//! Completion: names visible at the cursor, nearest scope first.

use std::sync::Arc;

use text_size::TextSize;

use crate::base::Name;
use crate::hir::{Analysis, SymbolKind, Type};

use super::text_utils::{attribute_dot_before, prefix_at};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    Function,
    Class,
    Variable,
    Parameter,
    Module,
    Keyword,
}

impl CompletionKind {
    /// LSP `CompletionItemKind` value.
    pub fn to_lsp(self) -> u8 {
        match self {
            CompletionKind::Function => 3,
            CompletionKind::Class => 7,
            CompletionKind::Variable => 6,
            CompletionKind::Parameter => 6,
            CompletionKind::Module => 9,
            CompletionKind::Keyword => 14,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionItem {
    pub label: Name,
    pub kind: CompletionKind,
    /// Type rendered for the detail field, when known.
    pub detail: Option<String>,
    /// Docstring of the completed symbol, when it has one.
    pub documentation: Option<Name>,
    /// Lower sorts first: 0 for the innermost scope, increasing outward,
    /// with builtins and keywords after all user symbols.
    pub priority: u8,
}

const KEYWORDS: &[&str] = &[
    "and", "class", "def", "elif", "else", "for", "from", "if", "import", "in", "not", "or",
    "pass", "return", "while",
];

const BUILTIN_NAMES: &[&str] = &[
    "bool", "dict", "float", "int", "isinstance", "len", "list", "object", "print", "range",
    "set", "str", "tuple",
];

/// Completions at `offset`, sorted by (priority, label) and deduplicated
/// by label with the nearest binding winning.
pub fn completions(analysis: &Analysis, offset: TextSize) -> Vec<CompletionItem> {
    let (prefix, prefix_range) = prefix_at(&analysis.text, offset);
    let mut items: Vec<CompletionItem> = Vec::new();

    if let Some(dot) = attribute_dot_before(&analysis.text, prefix_range.start()) {
        member_completions(analysis, dot, prefix, &mut items);
    } else {
        scope_completions(analysis, offset, prefix, &mut items);
    }

    items.sort_by(|a, b| (a.priority, &a.label).cmp(&(b.priority, &b.label)));
    let mut seen = rustc_hash::FxHashSet::default();
    items.retain(|item| seen.insert(item.label.clone()));
    items
}

fn scope_completions(
    analysis: &Analysis,
    offset: TextSize,
    prefix: &str,
    items: &mut Vec<CompletionItem>,
) {
    let scope = analysis.table.scope_at(offset);
    let chain = analysis.table.scope_chain(scope);
    let user_depth = chain.len() as u8;
    for (depth, scope_id) in chain.into_iter().enumerate() {
        for (name, sym) in analysis.table.scope(scope_id).bindings() {
            if !name.starts_with(prefix) {
                continue;
            }
            let symbol = analysis.table.symbol(sym);
            items.push(CompletionItem {
                label: name.clone(),
                kind: kind_of(symbol.kind),
                detail: analysis.type_of_symbol(sym).map(|t| t.to_string()),
                documentation: symbol.docstring.clone(),
                priority: depth as u8,
            });
        }
    }
    for name in BUILTIN_NAMES {
        if name.starts_with(prefix) {
            items.push(CompletionItem {
                label: Arc::from(*name),
                kind: CompletionKind::Function,
                detail: None,
                documentation: None,
                priority: user_depth,
            });
        }
    }
    for kw in KEYWORDS {
        if kw.starts_with(prefix) {
            items.push(CompletionItem {
                label: Arc::from(*kw),
                kind: CompletionKind::Keyword,
                detail: None,
                documentation: None,
                priority: user_depth + 1,
            });
        }
    }
}

/// Completions after `value.`: members of the receiver's class body.
fn member_completions(
    analysis: &Analysis,
    dot: TextSize,
    prefix: &str,
    items: &mut Vec<CompletionItem>,
) {
    // The receiver is the typed expression ending exactly at the dot;
    // prefer the widest one so chains complete on their full value.
    let mut receiver: Option<Arc<Type>> = None;
    let mut best_len = TextSize::new(0);
    crate::parser::ast::walk_stmts(&analysis.module.body, &mut |stmt| {
        crate::parser::ast::stmt_exprs(stmt, &mut |root| {
            crate::parser::ast::walk_expr(root, &mut |expr| {
                if expr.range.end() == dot && expr.range.len() >= best_len {
                    if let Some(ty) = analysis.type_of_expr(expr.id) {
                        best_len = expr.range.len();
                        receiver = Some(ty);
                    }
                }
            });
        });
    });
    let Some(receiver) = receiver else {
        return;
    };
    let class = match &*receiver {
        Type::Instance { class, .. } => class.clone(),
        Type::Class(name) => name.clone(),
        _ => return,
    };
    let scope = analysis.table.scope_at(dot);
    let Some(class_sym) = analysis.table.lookup(scope, &class) else {
        return;
    };
    let Some(body) = analysis.table.symbol(class_sym).body_scope else {
        return;
    };
    for (name, sym) in analysis.table.scope(body).bindings() {
        if !name.starts_with(prefix) {
            continue;
        }
        let symbol = analysis.table.symbol(sym);
        items.push(CompletionItem {
            label: name.clone(),
            kind: kind_of(symbol.kind),
            detail: analysis.type_of_symbol(sym).map(|t| t.to_string()),
            documentation: symbol.docstring.clone(),
            priority: 0,
        });
    }
}

fn kind_of(kind: SymbolKind) -> CompletionKind {
    match kind {
        SymbolKind::Function => CompletionKind::Function,
        SymbolKind::Class => CompletionKind::Class,
        SymbolKind::Variable => CompletionKind::Variable,
        SymbolKind::Parameter => CompletionKind::Parameter,
        SymbolKind::Import => CompletionKind::Module,
    }
}
