//! AST for the Python-like source language.
//!
//! Every expression carries a stable [`ExprId`] (assigned in parse order)
//! and a byte range. The inference engine keys its type map by `ExprId`;
//! IDE queries locate nodes by range.

use text_size::{TextRange, TextSize};

use crate::base::Name;

/// Identifier for an expression node, unique within one parsed module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub u32);

/// A parsed module: the top-level statement list.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub body: Vec<Stmt>,
    pub range: TextRange,
    /// Total number of expression ids allocated while parsing.
    pub expr_count: u32,
}

// ============================================================================
// STATEMENTS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    FunctionDef(FunctionDef),
    ClassDef(ClassDef),
    /// `import a.b as c`
    Import(Import),
    /// `from a.b import x as y, z`
    ImportFrom(ImportFrom),
    /// `target = value`, `target: ann = value`, or a bare `target: ann`
    Assign {
        target: Expr,
        annotation: Option<Expr>,
        value: Option<Expr>,
    },
    Return {
        value: Option<Expr>,
    },
    If {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
    },
    For {
        target: Expr,
        iter: Expr,
        body: Vec<Stmt>,
    },
    Expr {
        value: Expr,
    },
    Pass,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: Name,
    pub name_range: TextRange,
    pub decorators: Vec<Expr>,
    pub params: Vec<Param>,
    /// Range of the parameter list including parentheses; inlay return
    /// hints anchor to its end.
    pub params_range: TextRange,
    pub returns: Option<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Name,
    pub name_range: TextRange,
    pub annotation: Option<Expr>,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: Name,
    pub name_range: TextRange,
    pub decorators: Vec<Expr>,
    pub bases: Vec<Expr>,
    pub body: Vec<Stmt>,
}

/// A dotted module path, e.g. `os.path`.
#[derive(Debug, Clone, PartialEq)]
pub struct DottedName {
    pub parts: Vec<Name>,
    pub range: TextRange,
}

impl DottedName {
    pub fn joined(&self) -> String {
        self.parts
            .iter()
            .map(|p| p.as_ref())
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub module: DottedName,
    pub alias: Option<(Name, TextRange)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportFrom {
    pub module: DottedName,
    pub names: Vec<ImportAlias>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportAlias {
    pub name: Name,
    pub name_range: TextRange,
    pub alias: Option<(Name, TextRange)>,
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: ExprId,
    pub kind: ExprKind,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Name(Name),
    IntLit(i64),
    FloatLit(f64),
    StrLit(Name),
    BoolLit(bool),
    NoneLit,
    Tuple(Vec<Expr>),
    List(Vec<Expr>),
    Attribute {
        value: Box<Expr>,
        attr: Name,
        attr_range: TextRange,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Arg>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Compare {
        op: CmpOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    BoolOp {
        op: BoolOpKind,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Placeholder produced by error recovery.
    Error,
}

/// A call argument, positional or keyword.
///
/// Keyword names are plain `(Name, TextRange)` pairs, not `Name`
/// expressions: they are never resolved against the symbol table, so
/// definition lookups on them fail with a null result.
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub name: Option<(Name, TextRange)>,
    pub value: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    /// `|` — also the PEP 604 union operator in annotations.
    BitOr,
}

impl BinOp {
    pub fn display(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
            BinOp::BitOr => "|",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    In,
    NotIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOpKind {
    And,
    Or,
}

// ============================================================================
// TRAVERSAL
// ============================================================================

/// Visit every statement in the module, outer before inner.
pub fn walk_stmts<'a>(body: &'a [Stmt], f: &mut impl FnMut(&'a Stmt)) {
    for stmt in body {
        f(stmt);
        match &stmt.kind {
            StmtKind::FunctionDef(def) => walk_stmts(&def.body, f),
            StmtKind::ClassDef(def) => walk_stmts(&def.body, f),
            StmtKind::If { body, orelse, .. } => {
                walk_stmts(body, f);
                walk_stmts(orelse, f);
            }
            StmtKind::While { body, .. } | StmtKind::For { body, .. } => walk_stmts(body, f),
            _ => {}
        }
    }
}

/// Visit every expression reachable from `expr`, outer before inner.
pub fn walk_expr<'a>(expr: &'a Expr, f: &mut impl FnMut(&'a Expr)) {
    f(expr);
    match &expr.kind {
        ExprKind::Tuple(items) | ExprKind::List(items) => {
            for item in items {
                walk_expr(item, f);
            }
        }
        ExprKind::Attribute { value, .. } => walk_expr(value, f),
        ExprKind::Subscript { value, index } => {
            walk_expr(value, f);
            walk_expr(index, f);
        }
        ExprKind::Call { callee, args } => {
            walk_expr(callee, f);
            for arg in args {
                walk_expr(&arg.value, f);
            }
        }
        ExprKind::Unary { operand, .. } => walk_expr(operand, f),
        ExprKind::Binary { left, right, .. }
        | ExprKind::Compare { left, right, .. }
        | ExprKind::BoolOp { left, right, .. } => {
            walk_expr(left, f);
            walk_expr(right, f);
        }
        _ => {}
    }
}

/// Expressions owned directly by a statement (annotations included).
pub fn stmt_exprs<'a>(stmt: &'a Stmt, f: &mut impl FnMut(&'a Expr)) {
    match &stmt.kind {
        StmtKind::FunctionDef(def) => {
            for dec in &def.decorators {
                f(dec);
            }
            for param in &def.params {
                if let Some(ann) = &param.annotation {
                    f(ann);
                }
                if let Some(default) = &param.default {
                    f(default);
                }
            }
            if let Some(ret) = &def.returns {
                f(ret);
            }
        }
        StmtKind::ClassDef(def) => {
            for dec in &def.decorators {
                f(dec);
            }
            for base in &def.bases {
                f(base);
            }
        }
        StmtKind::Assign {
            target,
            annotation,
            value,
        } => {
            f(target);
            if let Some(ann) = annotation {
                f(ann);
            }
            if let Some(value) = value {
                f(value);
            }
        }
        StmtKind::Return { value } => {
            if let Some(value) = value {
                f(value);
            }
        }
        StmtKind::If { test, .. } | StmtKind::While { test, .. } => f(test),
        StmtKind::For { target, iter, .. } => {
            f(target);
            f(iter);
        }
        StmtKind::Expr { value } => f(value),
        StmtKind::Import(_) | StmtKind::ImportFrom(_) | StmtKind::Pass => {}
    }
}

/// Find the smallest expression whose range contains `offset`.
pub fn find_expr_at(module: &Module, offset: TextSize) -> Option<&Expr> {
    let mut best: Option<&Expr> = None;
    walk_stmts(&module.body, &mut |stmt| {
        stmt_exprs(stmt, &mut |root| {
            walk_expr(root, &mut |expr| {
                if expr.range.contains_inclusive(offset) {
                    match best {
                        Some(current) if current.range.len() <= expr.range.len() => {}
                        _ => best = Some(expr),
                    }
                }
            });
        });
    });
    best
}

/// Find the innermost call expression whose range contains `offset`.
pub fn find_call_at(module: &Module, offset: TextSize) -> Option<&Expr> {
    let mut best: Option<&Expr> = None;
    walk_stmts(&module.body, &mut |stmt| {
        stmt_exprs(stmt, &mut |root| {
            walk_expr(root, &mut |expr| {
                if matches!(expr.kind, ExprKind::Call { .. })
                    && expr.range.contains_inclusive(offset)
                {
                    match best {
                        Some(current) if current.range.len() <= expr.range.len() => {}
                        _ => best = Some(expr),
                    }
                }
            });
        });
    });
    best
}

/// Find a keyword-argument name whose range contains `offset`.
pub fn find_keyword_arg_at(module: &Module, offset: TextSize) -> Option<(&Name, TextRange)> {
    let mut found: Option<(&Name, TextRange)> = None;
    walk_stmts(&module.body, &mut |stmt| {
        stmt_exprs(stmt, &mut |root| {
            walk_expr(root, &mut |expr| {
                if let ExprKind::Call { args, .. } = &expr.kind {
                    for arg in args {
                        if let Some((name, range)) = &arg.name {
                            if range.contains_inclusive(offset) {
                                found = Some((name, *range));
                            }
                        }
                    }
                }
            });
        });
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_find_expr_at_picks_smallest() {
        let result = parse("x = 1 + 2\n");
        // Offset 4 is the `1` literal.
        let expr = find_expr_at(&result.module, TextSize::new(4)).unwrap();
        assert!(matches!(expr.kind, ExprKind::IntLit(1)));
    }

    #[test]
    fn test_find_keyword_arg() {
        let result = parse("f(x=1)\n");
        let (name, _) = find_keyword_arg_at(&result.module, TextSize::new(2)).unwrap();
        assert_eq!(name.as_ref(), "x");
        assert!(find_keyword_arg_at(&result.module, TextSize::new(4)).is_none());
    }
}
