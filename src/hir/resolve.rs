//! Name resolution — builds the symbol table for one buffer.
//!
//! Two passes over the AST:
//! 1. Declare: walk every statement, allocating scopes and binding
//!    functions, classes, parameters, assignment targets, and imports.
//! 2. Resolve: walk every value expression, linking `Name` uses to their
//!    symbols in the use map.
//!
//! Deliberate gaps, surfaced as null results by the query layer rather
//! than resolved here: keyword-argument names at call sites are never
//! linked to the parameter they name, and import-bound symbols have no
//! external definition target.

use text_size::TextSize;

use crate::parser::ast::{
    ClassDef, Expr, ExprKind, FunctionDef, Module, Stmt, StmtKind, walk_expr,
};

use super::symbols::{MODULE_SCOPE, ScopeId, ScopeKind, Symbol, SymbolKind, SymbolTable};

/// Build the symbol table for a parsed module.
pub fn resolve(module: &Module) -> SymbolTable {
    let mut resolver = Resolver {
        table: SymbolTable::new(module.range),
    };
    resolver.declare_body(&module.body, MODULE_SCOPE);
    resolver.resolve_body(&module.body, MODULE_SCOPE);
    let table = resolver.table;
    tracing::debug!(
        symbols = table.symbol_count(),
        "resolved module symbol table"
    );
    table
}

struct Resolver {
    table: SymbolTable,
}

impl Resolver {
    // ==================== pass 1: declarations ====================

    fn declare_body(&mut self, body: &[Stmt], scope: ScopeId) {
        for stmt in body {
            match &stmt.kind {
                StmtKind::FunctionDef(def) => self.declare_function(stmt, def, scope),
                StmtKind::ClassDef(def) => self.declare_class(stmt, def, scope),
                StmtKind::Assign { target, .. } => self.declare_target(target, scope),
                StmtKind::For { target, body, .. } => {
                    self.declare_target(target, scope);
                    self.declare_body(body, scope);
                }
                StmtKind::If { body, orelse, .. } => {
                    self.declare_body(body, scope);
                    self.declare_body(orelse, scope);
                }
                StmtKind::While { body, .. } => self.declare_body(body, scope),
                StmtKind::Import(import) => {
                    let (name, def_range) = match &import.alias {
                        Some((alias, range)) => (alias.clone(), *range),
                        // `import os.path` binds the first segment.
                        None => match import.module.parts.first() {
                            Some(first) => (first.clone(), import.module.range),
                            None => continue,
                        },
                    };
                    self.table.declare(
                        scope,
                        Symbol {
                            name,
                            kind: SymbolKind::Import,
                            def_range,
                            full_range: stmt.range,
                            scope,
                            body_scope: None,
                            docstring: None,
                        },
                    );
                }
                StmtKind::ImportFrom(from) => {
                    for item in &from.names {
                        if item.name.as_ref() == "*" {
                            continue;
                        }
                        let (name, def_range) = match &item.alias {
                            Some((alias, range)) => (alias.clone(), *range),
                            None => (item.name.clone(), item.name_range),
                        };
                        self.table.declare(
                            scope,
                            Symbol {
                                name,
                                kind: SymbolKind::Import,
                                def_range,
                                full_range: stmt.range,
                                scope,
                                body_scope: None,
                                docstring: None,
                            },
                        );
                    }
                }
                StmtKind::Return { .. } | StmtKind::Expr { .. } | StmtKind::Pass => {}
            }
        }
    }

    fn declare_function(&mut self, stmt: &Stmt, def: &FunctionDef, scope: ScopeId) {
        let symbol = self.table.declare(
            scope,
            Symbol {
                name: def.name.clone(),
                kind: SymbolKind::Function,
                def_range: def.name_range,
                full_range: stmt.range,
                scope,
                body_scope: None,
                docstring: None,
            },
        );
        let body_scope = self
            .table
            .alloc_scope(ScopeKind::Function, scope, stmt.range);
        self.table
            .set_def_scope(def.name_range.start(), body_scope);
        // Overload groups share one symbol; the implementation (last def)
        // wins the body scope and docstring.
        self.table.symbol_mut(symbol).body_scope = Some(body_scope);
        if let Some(doc) = docstring_of(&def.body) {
            self.table.symbol_mut(symbol).docstring = Some(doc);
        }

        for param in &def.params {
            self.table.declare(
                body_scope,
                Symbol {
                    name: param.name.clone(),
                    kind: SymbolKind::Parameter,
                    def_range: param.name_range,
                    full_range: param.name_range,
                    scope: body_scope,
                    body_scope: None,
                    docstring: None,
                },
            );
        }
        self.declare_body(&def.body, body_scope);
    }

    fn declare_class(&mut self, stmt: &Stmt, def: &ClassDef, scope: ScopeId) {
        let symbol = self.table.declare(
            scope,
            Symbol {
                name: def.name.clone(),
                kind: SymbolKind::Class,
                def_range: def.name_range,
                full_range: stmt.range,
                scope,
                body_scope: None,
                docstring: docstring_of(&def.body),
            },
        );
        let body_scope = self.table.alloc_scope(ScopeKind::Class, scope, stmt.range);
        self.table.set_def_scope(def.name_range.start(), body_scope);
        self.table.symbol_mut(symbol).body_scope = Some(body_scope);
        self.declare_body(&def.body, body_scope);
    }

    fn declare_target(&mut self, target: &Expr, scope: ScopeId) {
        match &target.kind {
            ExprKind::Name(name) => {
                self.table.declare(
                    scope,
                    Symbol {
                        name: name.clone(),
                        kind: SymbolKind::Variable,
                        def_range: target.range,
                        full_range: target.range,
                        scope,
                        body_scope: None,
                        docstring: None,
                    },
                );
            }
            ExprKind::Tuple(items) => {
                for item in items {
                    self.declare_target(item, scope);
                }
            }
            // Attribute/subscript targets assign through an object; they
            // declare nothing.
            _ => {}
        }
    }

    // ==================== pass 2: name uses ====================

    fn resolve_body(&mut self, body: &[Stmt], scope: ScopeId) {
        for stmt in body {
            match &stmt.kind {
                StmtKind::FunctionDef(def) => {
                    // Decorators, annotations, and defaults evaluate in the
                    // enclosing scope; only the body sees parameters.
                    for dec in &def.decorators {
                        self.resolve_expr(dec, scope);
                    }
                    for param in &def.params {
                        if let Some(ann) = &param.annotation {
                            self.resolve_expr(ann, scope);
                        }
                        if let Some(default) = &param.default {
                            self.resolve_expr(default, scope);
                        }
                    }
                    if let Some(ret) = &def.returns {
                        self.resolve_expr(ret, scope);
                    }
                    let body_scope = self.body_scope_of(def.name_range.start(), scope);
                    self.resolve_body(&def.body, body_scope);
                }
                StmtKind::ClassDef(def) => {
                    for dec in &def.decorators {
                        self.resolve_expr(dec, scope);
                    }
                    for base in &def.bases {
                        self.resolve_expr(base, scope);
                    }
                    let body_scope = self.body_scope_of(def.name_range.start(), scope);
                    self.resolve_body(&def.body, body_scope);
                }
                StmtKind::Assign {
                    target,
                    annotation,
                    value,
                } => {
                    self.resolve_expr(target, scope);
                    if let Some(ann) = annotation {
                        self.resolve_expr(ann, scope);
                    }
                    if let Some(value) = value {
                        self.resolve_expr(value, scope);
                    }
                }
                StmtKind::Return { value } => {
                    if let Some(value) = value {
                        self.resolve_expr(value, scope);
                    }
                }
                StmtKind::If { test, body, orelse } => {
                    self.resolve_expr(test, scope);
                    self.resolve_body(body, scope);
                    self.resolve_body(orelse, scope);
                }
                StmtKind::While { test, body } => {
                    self.resolve_expr(test, scope);
                    self.resolve_body(body, scope);
                }
                StmtKind::For { target, iter, body } => {
                    self.resolve_expr(target, scope);
                    self.resolve_expr(iter, scope);
                    self.resolve_body(body, scope);
                }
                StmtKind::Expr { value } => self.resolve_expr(value, scope),
                StmtKind::Import(_) | StmtKind::ImportFrom(_) | StmtKind::Pass => {}
            }
        }
    }

    fn resolve_expr(&mut self, expr: &Expr, scope: ScopeId) {
        let mut uses = Vec::new();
        walk_expr(expr, &mut |e| {
            if let ExprKind::Name(name) = &e.kind {
                uses.push((e.id, name.clone()));
            }
        });
        for (id, name) in uses {
            if let Some(symbol) = self.table.lookup(scope, &name) {
                self.table.record_use(id, symbol);
            } else {
                tracing::trace!(name = name.as_ref(), "unresolved name use");
            }
        }
    }

    fn body_scope_of(&self, key: TextSize, fallback: ScopeId) -> ScopeId {
        self.table.def_scope(key).unwrap_or(fallback)
    }
}

fn docstring_of(body: &[Stmt]) -> Option<crate::base::Name> {
    match body.first()?.kind {
        StmtKind::Expr { ref value } => match &value.kind {
            ExprKind::StrLit(text) => Some(text.clone()),
            _ => None,
        },
        _ => None,
    }
}
