//! Type inference and checking.
//!
//! Two phases over the resolved module:
//! 1. Signature collection: function signatures, class objects, and import
//!    bindings get types from their declarations alone, so forward
//!    references between definitions work.
//! 2. Body checking: statements are checked in document order, expression
//!    types are recorded per [`ExprId`], and unannotated return types are
//!    inferred from the union of `return` statements.
//!
//! Declared annotations always win over inferred value types.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use text_size::TextRange;

use crate::parser::ast::{
    Arg, BinOp, Expr, ExprId, ExprKind, FunctionDef, Module, Stmt, StmtKind, UnaryOp,
};

use super::diagnostics::{RawDiagnostic, codes};
use super::symbols::{ScopeId, ScopeKind, SymbolId, SymbolKind, SymbolTable, MODULE_SCOPE};
use super::types::{
    OverloadSet, ParamType, Signature, Type, builtin_annotation, builtin_value, instance_of,
};

/// Everything inference produces for one buffer version.
#[derive(Debug, Clone, Default)]
pub struct InferenceResult {
    pub expr_types: FxHashMap<ExprId, Arc<Type>>,
    pub symbol_types: FxHashMap<SymbolId, Arc<Type>>,
    pub diagnostics: Vec<RawDiagnostic>,
}

/// Infer types for a resolved module.
pub fn infer_module(module: &Module, table: &SymbolTable) -> InferenceResult {
    let mut ctx = InferCtx {
        table,
        expr_types: FxHashMap::default(),
        symbol_types: FxHashMap::default(),
        diagnostics: Vec::new(),
        sigs: FxHashMap::default(),
        visit_counts: FxHashMap::default(),
        annotated: FxHashSet::default(),
    };
    ctx.collect_signatures(&module.body, MODULE_SCOPE, None);
    let function_syms: Vec<SymbolId> = ctx.sigs.keys().copied().collect();
    for sym in function_syms {
        ctx.finalize_function(sym);
    }
    ctx.check_body(&module.body, MODULE_SCOPE, None);
    tracing::debug!(
        exprs = ctx.expr_types.len(),
        diagnostics = ctx.diagnostics.len(),
        "inference complete"
    );
    InferenceResult {
        expr_types: ctx.expr_types,
        symbol_types: ctx.symbol_types,
        diagnostics: ctx.diagnostics,
    }
}

/// One `def` in a (possibly overloaded) function group.
#[derive(Debug, Clone)]
struct SigEntry {
    sig: Arc<Signature>,
    is_overload: bool,
    has_ret_ann: bool,
}

/// Return-statement context of the function body being checked.
struct FuncCtx {
    declared: Option<Arc<Type>>,
    returns: Vec<Arc<Type>>,
}

struct InferCtx<'a> {
    table: &'a SymbolTable,
    expr_types: FxHashMap<ExprId, Arc<Type>>,
    symbol_types: FxHashMap<SymbolId, Arc<Type>>,
    diagnostics: Vec<RawDiagnostic>,
    /// Signatures per function symbol, in declaration order.
    sigs: FxHashMap<SymbolId, Vec<SigEntry>>,
    /// How many defs of each function group phase 2 has visited.
    visit_counts: FxHashMap<SymbolId, usize>,
    /// Symbols whose type came from an explicit annotation; inferred
    /// assignment types never overwrite these.
    annotated: FxHashSet<SymbolId>,
}

impl<'a> InferCtx<'a> {
    // ==================== phase 1: signatures ====================

    fn collect_signatures(
        &mut self,
        body: &'a [Stmt],
        scope: ScopeId,
        enclosing_class: Option<&'a str>,
    ) {
        for stmt in body {
            match &stmt.kind {
                StmtKind::FunctionDef(def) => {
                    self.collect_function(def, scope, enclosing_class);
                }
                StmtKind::ClassDef(def) => {
                    if let Some(sym) = self.table.scope(scope).get(def.name.as_ref()) {
                        self.symbol_types
                            .insert(sym, Arc::new(Type::Class(def.name.clone())));
                        self.annotated.insert(sym);
                    }
                    if let Some(body_scope) = self.table.def_scope(def.name_range.start()) {
                        self.collect_signatures(&def.body, body_scope, Some(def.name.as_ref()));
                    }
                }
                StmtKind::Import(import) => {
                    let bound = match &import.alias {
                        Some((alias, _)) => Some(alias.as_ref()),
                        None => import.module.parts.first().map(|p| p.as_ref()),
                    };
                    if let Some(name) = bound {
                        if let Some(sym) = self.table.scope(scope).get(name) {
                            let module_name = match &import.alias {
                                Some(_) => Arc::from(import.module.joined().as_str()),
                                None => import.module.parts[0].clone(),
                            };
                            self.symbol_types
                                .insert(sym, Arc::new(Type::Module(module_name)));
                            self.annotated.insert(sym);
                        }
                    }
                }
                StmtKind::ImportFrom(from) => {
                    // Cross-module resolution is out of reach; imported
                    // names are dynamically typed.
                    for item in &from.names {
                        let bound = match &item.alias {
                            Some((alias, _)) => alias.as_ref(),
                            None => item.name.as_ref(),
                        };
                        if let Some(sym) = self.table.scope(scope).get(bound) {
                            self.symbol_types.insert(sym, Type::unknown());
                        }
                    }
                }
                StmtKind::If { body, orelse, .. } => {
                    self.collect_signatures(body, scope, enclosing_class);
                    self.collect_signatures(orelse, scope, enclosing_class);
                }
                StmtKind::While { body, .. } | StmtKind::For { body, .. } => {
                    self.collect_signatures(body, scope, enclosing_class);
                }
                _ => {}
            }
        }
    }

    fn collect_function(
        &mut self,
        def: &'a FunctionDef,
        scope: ScopeId,
        enclosing_class: Option<&'a str>,
    ) {
        let Some(sym) = self.table.scope(scope).get(def.name.as_ref()) else {
            return;
        };
        let Some(body_scope) = self.table.def_scope(def.name_range.start()) else {
            return;
        };
        let in_class_body =
            enclosing_class.is_some() && self.table.scope(scope).kind == ScopeKind::Class;

        let mut params = Vec::with_capacity(def.params.len());
        for (i, param) in def.params.iter().enumerate() {
            let ty = match &param.annotation {
                Some(ann) => self.eval_annotation(ann, scope),
                // An unannotated first parameter of a method is the
                // receiver.
                None if i == 0 && in_class_body => {
                    instance_of(&Arc::from(enclosing_class.unwrap_or_default()), Vec::new())
                }
                None => Type::unknown(),
            };
            if let Some(default) = &param.default {
                self.infer_expr(default, scope);
            }
            if let Some(param_sym) = self.table.scope(body_scope).get(param.name.as_ref()) {
                self.symbol_types.insert(param_sym, ty.clone());
                self.annotated.insert(param_sym);
            }
            params.push(ParamType {
                name: param.name.clone(),
                ty,
                has_default: param.default.is_some(),
            });
        }

        let has_ret_ann = def.returns.is_some();
        let ret = match &def.returns {
            Some(ann) => self.eval_annotation(ann, scope),
            None => Type::unknown(),
        };
        let sig = Arc::new(Signature {
            name: def.name.clone(),
            params,
            ret,
            is_variadic: false,
        });
        self.sigs.entry(sym).or_default().push(SigEntry {
            sig,
            is_overload: is_overload_def(def),
            has_ret_ann,
        });

        self.collect_signatures(&def.body, body_scope, None);
    }

    /// Recompute a function symbol's type from its signature group.
    fn finalize_function(&mut self, sym: SymbolId) {
        let Some(entries) = self.sigs.get(&sym) else {
            return;
        };
        let decorated: Vec<Arc<Signature>> = entries
            .iter()
            .filter(|e| e.is_overload)
            .map(|e| e.sig.clone())
            .collect();
        let ty = if decorated.len() > 1 {
            Arc::new(Type::Overload(Arc::new(OverloadSet {
                signatures: decorated,
            })))
        } else {
            // Plain redefinition: the last def wins.
            match entries.last() {
                Some(entry) => Arc::new(Type::Callable(entry.sig.clone())),
                None => Type::unknown(),
            }
        };
        self.symbol_types.insert(sym, ty);
        self.annotated.insert(sym);
    }

    // ==================== phase 2: bodies ====================

    fn check_body(&mut self, body: &'a [Stmt], scope: ScopeId, mut func: Option<&mut FuncCtx>) {
        for stmt in body {
            match &stmt.kind {
                StmtKind::FunctionDef(def) => self.check_function(def, scope),
                StmtKind::ClassDef(def) => {
                    for dec in &def.decorators {
                        self.infer_expr(dec, scope);
                    }
                    for base in &def.bases {
                        self.infer_expr(base, scope);
                    }
                    if let Some(body_scope) = self.table.def_scope(def.name_range.start()) {
                        self.check_body(&def.body, body_scope, None);
                    }
                }
                StmtKind::Assign {
                    target,
                    annotation,
                    value,
                } => {
                    if let Some(ann) = annotation {
                        let ann_ty = self.eval_annotation(ann, scope);
                        if let Some(value) = value {
                            let vty = self.infer_expr(value, scope);
                            if !vty.is_assignable_to(&ann_ty) {
                                self.diagnostics.push(RawDiagnostic::error(
                                    value.range,
                                    codes::BAD_ASSIGNMENT,
                                    format!(
                                        "Type `{vty}` is not assignable to declared type `{ann_ty}`"
                                    ),
                                ));
                            }
                        }
                        self.bind_target(target, ann_ty, scope, true);
                    } else {
                        let vty = match value {
                            Some(value) => self.infer_expr(value, scope),
                            None => Type::unknown(),
                        };
                        self.bind_target(target, vty, scope, false);
                    }
                }
                StmtKind::Return { value } => {
                    let ty = match value {
                        Some(value) => self.infer_expr(value, scope),
                        None => Type::none(),
                    };
                    match func.as_deref_mut() {
                        Some(f) => {
                            if let Some(declared) = &f.declared {
                                if !ty.is_assignable_to(declared) {
                                    let at = value.as_ref().map_or(stmt.range, |v| v.range);
                                    self.diagnostics.push(RawDiagnostic::error(
                                        at,
                                        codes::BAD_RETURN,
                                        format!(
                                            "Returned type `{ty}` is not assignable to declared return type `{declared}`"
                                        ),
                                    ));
                                }
                            }
                            f.returns.push(ty);
                        }
                        None => {
                            self.diagnostics.push(RawDiagnostic::error(
                                stmt.range,
                                codes::RETURN_OUTSIDE_FUNCTION,
                                "Return statement outside of a function",
                            ));
                        }
                    }
                }
                StmtKind::If { test, body, orelse } => {
                    self.infer_expr(test, scope);
                    self.check_body(body, scope, func.as_deref_mut());
                    self.check_body(orelse, scope, func.as_deref_mut());
                }
                StmtKind::While { test, body } => {
                    self.infer_expr(test, scope);
                    self.check_body(body, scope, func.as_deref_mut());
                }
                StmtKind::For { target, iter, body } => {
                    let ity = self.infer_expr(iter, scope);
                    let elem = element_type(&ity);
                    self.bind_target(target, elem, scope, false);
                    self.check_body(body, scope, func.as_deref_mut());
                }
                StmtKind::Expr { value } => {
                    self.infer_expr(value, scope);
                }
                StmtKind::Import(_) | StmtKind::ImportFrom(_) | StmtKind::Pass => {}
            }
        }
    }

    fn check_function(&mut self, def: &'a FunctionDef, scope: ScopeId) {
        for dec in &def.decorators {
            self.infer_expr(dec, scope);
        }
        let Some(sym) = self.table.scope(scope).get(def.name.as_ref()) else {
            return;
        };
        let Some(body_scope) = self.table.def_scope(def.name_range.start()) else {
            return;
        };
        let idx = {
            let count = self.visit_counts.entry(sym).or_insert(0);
            let idx = *count;
            *count += 1;
            idx
        };
        let entry = match self.sigs.get(&sym).and_then(|entries| entries.get(idx)) {
            Some(entry) => entry.clone(),
            None => return,
        };
        let declared = entry.has_ret_ann.then(|| entry.sig.ret.clone());
        let mut fctx = FuncCtx {
            declared,
            returns: Vec::new(),
        };
        self.check_body(&def.body, body_scope, Some(&mut fctx));

        if !entry.has_ret_ann {
            let inferred = if fctx.returns.is_empty() {
                Type::none()
            } else {
                Type::union(fctx.returns)
            };
            let updated = Arc::new(Signature {
                name: entry.sig.name.clone(),
                params: entry.sig.params.clone(),
                ret: inferred,
                is_variadic: entry.sig.is_variadic,
            });
            if let Some(entries) = self.sigs.get_mut(&sym) {
                if let Some(slot) = entries.get_mut(idx) {
                    slot.sig = updated;
                }
            }
            self.finalize_function(sym);
        }
    }

    /// Bind an assignment or loop target to a type.
    fn bind_target(&mut self, target: &'a Expr, ty: Arc<Type>, scope: ScopeId, annotated: bool) {
        match &target.kind {
            ExprKind::Name(_) => {
                self.expr_types.insert(target.id, ty.clone());
                if let Some(sym) = self.table.resolve_use(target.id) {
                    if annotated {
                        self.symbol_types.insert(sym, ty);
                        self.annotated.insert(sym);
                    } else if !self.annotated.contains(&sym) {
                        self.symbol_types.insert(sym, ty);
                    }
                }
            }
            ExprKind::Tuple(items) => {
                self.expr_types.insert(target.id, ty.clone());
                let parts: Vec<Arc<Type>> = match &*ty {
                    Type::Tuple(parts) if parts.len() == items.len() => parts.clone(),
                    _ => vec![Type::unknown(); items.len()],
                };
                for (item, part) in items.iter().zip(parts) {
                    self.bind_target(item, part, scope, false);
                }
            }
            // Attribute/subscript targets: type the object expression for
            // hover, no binding to check against.
            _ => {
                self.infer_expr(target, scope);
            }
        }
    }

    // ==================== expressions ====================

    fn infer_expr(&mut self, expr: &'a Expr, scope: ScopeId) -> Arc<Type> {
        let ty = match &expr.kind {
            ExprKind::Name(name) => self.infer_name(expr, name, scope),
            ExprKind::IntLit(_) => Type::int(),
            ExprKind::FloatLit(_) => Type::float(),
            ExprKind::StrLit(_) => Type::str_(),
            ExprKind::BoolLit(_) => Type::bool_(),
            ExprKind::NoneLit => Type::none(),
            ExprKind::Tuple(items) => {
                let tys = items.iter().map(|e| self.infer_expr(e, scope)).collect();
                Arc::new(Type::Tuple(tys))
            }
            ExprKind::List(items) => {
                let tys: Vec<Arc<Type>> =
                    items.iter().map(|e| self.infer_expr(e, scope)).collect();
                let args = if tys.is_empty() {
                    Vec::new()
                } else {
                    vec![Type::union(tys)]
                };
                Arc::new(Type::Instance {
                    class: Arc::from("list"),
                    args,
                })
            }
            ExprKind::Attribute { value, attr, .. } => {
                let vty = self.infer_expr(value, scope);
                self.attribute_type(&vty, attr, scope)
                    .unwrap_or_else(Type::unknown)
            }
            ExprKind::Subscript { value, index } => {
                let vty = self.infer_expr(value, scope);
                let ity = self.infer_expr(index, scope);
                subscript_type(&vty, index, &ity)
            }
            ExprKind::Call { callee, args } => self.infer_call(callee, args, expr.range, scope),
            ExprKind::Unary { op, operand } => {
                let oty = self.infer_expr(operand, scope);
                match op {
                    UnaryOp::Not => Type::bool_(),
                    UnaryOp::Neg | UnaryOp::Pos => match &*oty {
                        Type::Int | Type::Bool => Type::int(),
                        Type::Float => Type::float(),
                        _ => Type::unknown(),
                    },
                }
            }
            ExprKind::Binary { op, left, right } => {
                let lt = self.infer_expr(left, scope);
                let rt = self.infer_expr(right, scope);
                self.binary_type(*op, &lt, &rt, expr.range)
            }
            ExprKind::Compare { left, right, .. } => {
                self.infer_expr(left, scope);
                self.infer_expr(right, scope);
                Type::bool_()
            }
            ExprKind::BoolOp { left, right, .. } => {
                let lt = self.infer_expr(left, scope);
                let rt = self.infer_expr(right, scope);
                Type::union([lt, rt])
            }
            ExprKind::Error => Type::unknown(),
        };
        self.expr_types.insert(expr.id, ty.clone());
        ty
    }

    fn infer_name(&mut self, expr: &Expr, name: &str, _scope: ScopeId) -> Arc<Type> {
        if let Some(sym) = self.table.resolve_use(expr.id) {
            return self
                .symbol_types
                .get(&sym)
                .cloned()
                .unwrap_or_else(Type::unknown);
        }
        if let Some(ty) = builtin_value(name) {
            return ty;
        }
        self.diagnostics.push(RawDiagnostic::error(
            expr.range,
            codes::UNDEFINED_NAME,
            format!("`{name}` is not defined"),
        ));
        Type::unknown()
    }

    fn infer_call(
        &mut self,
        callee: &'a Expr,
        args: &'a [Arg],
        call_range: TextRange,
        scope: ScopeId,
    ) -> Arc<Type> {
        let callee_ty = self.infer_expr(callee, scope);
        let arg_tys: Vec<Arc<Type>> = args
            .iter()
            .map(|arg| self.infer_expr(&arg.value, scope))
            .collect();
        match &*callee_ty {
            Type::Callable(sig) => {
                let sig = sig.clone();
                self.check_call(&sig, args, &arg_tys, call_range);
                sig.ret.clone()
            }
            Type::Overload(set) => {
                // No per-argument filtering for overloads: pick the first
                // candidate whose arity fits, falling back to the first
                // declared signature.
                let n = args.len();
                let pick = set
                    .signatures
                    .iter()
                    .find(|sig| arity_fits(sig, n))
                    .or_else(|| set.signatures.first());
                pick.map_or_else(Type::unknown, |sig| sig.ret.clone())
            }
            Type::Class(name) => instance_of(name, Vec::new()),
            Type::Any | Type::Unknown => Type::unknown(),
            other => {
                self.diagnostics.push(RawDiagnostic::error(
                    callee.range,
                    codes::NOT_CALLABLE,
                    format!("`{other}` is not callable"),
                ));
                Type::unknown()
            }
        }
    }

    fn check_call(
        &mut self,
        sig: &Signature,
        args: &'a [Arg],
        arg_tys: &[Arc<Type>],
        call_range: TextRange,
    ) {
        if sig.is_variadic {
            return;
        }
        let mut filled = vec![false; sig.params.len()];
        let mut positional = 0usize;
        for (arg, aty) in args.iter().zip(arg_tys) {
            match &arg.name {
                None => {
                    if positional >= sig.params.len() {
                        self.diagnostics.push(RawDiagnostic::error(
                            arg.value.range,
                            codes::TOO_MANY_ARGS,
                            format!(
                                "Expected {} positional argument{}, got {}",
                                sig.params.len(),
                                if sig.params.len() == 1 { "" } else { "s" },
                                args.iter().filter(|a| a.name.is_none()).count()
                            ),
                        ));
                        positional += 1;
                        continue;
                    }
                    let param = &sig.params[positional];
                    if !aty.is_assignable_to(&param.ty) {
                        self.diagnostics.push(RawDiagnostic::error(
                            arg.value.range,
                            codes::BAD_ARGUMENT,
                            format!(
                                "Argument of type `{aty}` is not assignable to parameter `{}` of type `{}`",
                                param.name, param.ty
                            ),
                        ));
                    }
                    filled[positional] = true;
                    positional += 1;
                }
                Some((name, name_range)) => {
                    match sig.params.iter().position(|p| p.name.as_ref() == name.as_ref()) {
                        Some(i) => {
                            if !aty.is_assignable_to(&sig.params[i].ty) {
                                self.diagnostics.push(RawDiagnostic::error(
                                    arg.value.range,
                                    codes::BAD_ARGUMENT,
                                    format!(
                                        "Argument of type `{aty}` is not assignable to parameter `{}` of type `{}`",
                                        sig.params[i].name, sig.params[i].ty
                                    ),
                                ));
                            }
                            filled[i] = true;
                        }
                        None => {
                            self.diagnostics.push(RawDiagnostic::error(
                                *name_range,
                                codes::UNEXPECTED_KEYWORD,
                                format!("Unexpected keyword argument `{name}`"),
                            ));
                        }
                    }
                }
            }
        }
        for (param, filled) in sig.params.iter().zip(&filled) {
            if !filled && !param.has_default {
                self.diagnostics.push(RawDiagnostic::error(
                    call_range,
                    codes::MISSING_ARG,
                    format!("Missing argument `{}`", param.name),
                ));
            }
        }
    }

    /// Type of `value.attr` for a receiver of type `vty`. Module members
    /// and unmodelled receivers yield no result; the caller degrades to
    /// `Unknown` without a diagnostic.
    fn attribute_type(&self, vty: &Type, attr: &str, scope: ScopeId) -> Option<Arc<Type>> {
        match vty {
            Type::Instance { class, .. } => {
                self.class_member(class, attr, scope).map(bind_receiver)
            }
            Type::Class(name) => self.class_member(name, attr, scope),
            Type::Union(members) => {
                let tys: Vec<Arc<Type>> = members
                    .iter()
                    .map(|m| {
                        self.attribute_type(m, attr, scope)
                            .unwrap_or_else(Type::unknown)
                    })
                    .collect();
                Some(Type::union(tys))
            }
            _ => None,
        }
    }

    fn class_member(&self, class: &str, attr: &str, scope: ScopeId) -> Option<Arc<Type>> {
        let class_sym = self.table.lookup(scope, class)?;
        let symbol = self.table.symbol(class_sym);
        if symbol.kind != SymbolKind::Class {
            return None;
        }
        let body = symbol.body_scope?;
        let member = self.table.scope(body).get(attr)?;
        self.symbol_types.get(&member).cloned()
    }

    fn binary_type(
        &mut self,
        op: BinOp,
        lt: &Arc<Type>,
        rt: &Arc<Type>,
        range: TextRange,
    ) -> Arc<Type> {
        if matches!(&**lt, Type::Any | Type::Unknown) || matches!(&**rt, Type::Any | Type::Unknown)
        {
            return Type::unknown();
        }
        let numeric = |ty: &Type| match ty {
            Type::Int | Type::Bool => Some(false),
            Type::Float => Some(true),
            _ => None,
        };
        match op {
            BinOp::Add => match (&**lt, &**rt) {
                (Type::Str, Type::Str) => return Type::str_(),
                (Type::Instance { class: a, .. }, Type::Instance { class: b, .. })
                    if a.as_ref() == "list" && b.as_ref() == "list" =>
                {
                    return if lt == rt { lt.clone() } else { Type::union([lt.clone(), rt.clone()]) };
                }
                _ => {}
            },
            BinOp::Mul => match (&**lt, &**rt) {
                (Type::Str, Type::Int) | (Type::Int, Type::Str) => return Type::str_(),
                (Type::Instance { class, .. }, Type::Int) if class.as_ref() == "list" => {
                    return lt.clone();
                }
                _ => {}
            },
            BinOp::BitOr => {
                // In value position `|` only applies to ints; annotation
                // unions go through annotation evaluation instead, and
                // runtime type aliases are left untyped rather than
                // flagged.
                return match (numeric(lt), numeric(rt)) {
                    (Some(false), Some(false)) => Type::int(),
                    _ => Type::unknown(),
                };
            }
            _ => {}
        }
        match (numeric(lt), numeric(rt)) {
            (Some(lf), Some(rf)) => {
                if op == BinOp::Div || lf || rf {
                    Type::float()
                } else {
                    Type::int()
                }
            }
            _ => {
                self.diagnostics.push(RawDiagnostic::error(
                    range,
                    codes::BAD_OPERAND,
                    format!(
                        "Operator `{}` is not supported for `{lt}` and `{rt}`",
                        op.display()
                    ),
                ));
                Type::unknown()
            }
        }
    }

    // ==================== annotations ====================

    /// Evaluate an expression in annotation position to a type.
    fn eval_annotation(&mut self, expr: &'a Expr, scope: ScopeId) -> Arc<Type> {
        let ty = match &expr.kind {
            ExprKind::Name(name) => self.annotation_name(expr, name, scope),
            ExprKind::NoneLit => Type::none(),
            // String forward references are unsupported.
            ExprKind::StrLit(_) => Type::unknown(),
            ExprKind::Subscript { value, index } => {
                let args: Vec<Arc<Type>> = match &index.kind {
                    ExprKind::Tuple(items) => items
                        .iter()
                        .map(|item| self.eval_annotation(item, scope))
                        .collect(),
                    _ => vec![self.eval_annotation(index, scope)],
                };
                match annotation_base_name(value) {
                    Some("list" | "List") => generic("list", args),
                    Some("set" | "Set") => generic("set", args),
                    Some("dict" | "Dict") => generic("dict", args),
                    Some("frozenset") => generic("frozenset", args),
                    Some("tuple" | "Tuple") => Arc::new(Type::Tuple(args)),
                    Some("Optional") => {
                        let inner = args.into_iter().next().unwrap_or_else(Type::unknown);
                        Type::union([inner, Type::none()])
                    }
                    Some("Union") => Type::union(args),
                    Some("type" | "Type") => match args.first().map(|t| &**t) {
                        Some(Type::Instance { class, .. }) => {
                            Arc::new(Type::Class(class.clone()))
                        }
                        _ => Type::any(),
                    },
                    _ => {
                        let base = self.eval_annotation(value, scope);
                        match &*base {
                            Type::Instance { class, .. } => Arc::new(Type::Instance {
                                class: class.clone(),
                                args,
                            }),
                            _ => Type::unknown(),
                        }
                    }
                }
            }
            ExprKind::Binary {
                op: BinOp::BitOr,
                left,
                right,
            } => {
                let lt = self.eval_annotation(left, scope);
                let rt = self.eval_annotation(right, scope);
                Type::union([lt, rt])
            }
            ExprKind::Attribute { attr, .. } => {
                special_annotation(attr).unwrap_or_else(Type::unknown)
            }
            ExprKind::Tuple(items) => {
                let tys = items
                    .iter()
                    .map(|item| self.eval_annotation(item, scope))
                    .collect();
                Arc::new(Type::Tuple(tys))
            }
            _ => Type::unknown(),
        };
        self.expr_types.insert(expr.id, ty.clone());
        ty
    }

    fn annotation_name(&mut self, expr: &Expr, name: &str, _scope: ScopeId) -> Arc<Type> {
        if let Some(sym) = self.table.resolve_use(expr.id) {
            let symbol = self.table.symbol(sym);
            return match symbol.kind {
                SymbolKind::Class => instance_of(&symbol.name, Vec::new()),
                // Imported names could be classes; without cross-module
                // info the annotation stays dynamic.
                _ => Type::unknown(),
            };
        }
        if let Some(ty) = special_annotation(name) {
            return ty;
        }
        self.diagnostics.push(RawDiagnostic::error(
            expr.range,
            codes::UNDEFINED_NAME,
            format!("`{name}` is not defined"),
        ));
        Type::unknown()
    }
}

// ==================== free helpers ====================

fn is_overload_def(def: &FunctionDef) -> bool {
    def.decorators.iter().any(|dec| match &dec.kind {
        ExprKind::Name(name) => name.as_ref() == "overload",
        ExprKind::Attribute { attr, .. } => attr.as_ref() == "overload",
        _ => false,
    })
}

fn arity_fits(sig: &Signature, n: usize) -> bool {
    let required = sig.params.iter().filter(|p| !p.has_default).count();
    sig.is_variadic || (n >= required && n <= sig.params.len())
}

/// Strip the receiver parameter when a callable is accessed through an
/// instance.
fn bind_receiver(ty: Arc<Type>) -> Arc<Type> {
    fn strip(sig: &Signature) -> Arc<Signature> {
        Arc::new(Signature {
            name: sig.name.clone(),
            params: sig.params.iter().skip(1).cloned().collect(),
            ret: sig.ret.clone(),
            is_variadic: sig.is_variadic,
        })
    }
    match &*ty {
        Type::Callable(sig) => Arc::new(Type::Callable(strip(sig))),
        Type::Overload(set) => Arc::new(Type::Overload(Arc::new(OverloadSet {
            signatures: set.signatures.iter().map(|s| strip(s)).collect(),
        }))),
        _ => ty,
    }
}

fn element_type(ty: &Type) -> Arc<Type> {
    match ty {
        Type::Instance { class, args } => match (class.as_ref(), args.first()) {
            ("list" | "set" | "frozenset", Some(t)) => t.clone(),
            ("dict", Some(k)) => k.clone(),
            ("range", _) => Type::int(),
            _ => Type::unknown(),
        },
        Type::Str => Type::str_(),
        Type::Tuple(items) => Type::union(items.iter().cloned()),
        _ => Type::unknown(),
    }
}

fn subscript_type(vty: &Type, index: &Expr, _ity: &Type) -> Arc<Type> {
    match vty {
        Type::Instance { class, args } => match (class.as_ref(), args.len()) {
            ("list" | "set", 1) => args[0].clone(),
            ("dict", 2) => args[1].clone(),
            _ => Type::unknown(),
        },
        Type::Str => Type::str_(),
        Type::Tuple(items) => match index.kind {
            ExprKind::IntLit(i) if i >= 0 && (i as usize) < items.len() => {
                items[i as usize].clone()
            }
            _ => Type::union(items.iter().cloned()),
        },
        _ => Type::unknown(),
    }
}

fn generic(class: &str, args: Vec<Arc<Type>>) -> Arc<Type> {
    Arc::new(Type::Instance {
        class: Arc::from(class),
        args,
    })
}

/// Builtin and `typing` names usable in annotation position without a
/// local binding.
fn special_annotation(name: &str) -> Option<Arc<Type>> {
    if let Some(ty) = builtin_annotation(name) {
        return Some(ty);
    }
    match name {
        "List" => Some(generic("list", Vec::new())),
        "Dict" => Some(generic("dict", Vec::new())),
        "Set" => Some(generic("set", Vec::new())),
        "Tuple" => Some(Arc::new(Type::Tuple(Vec::new()))),
        "Optional" | "Union" | "Callable" => Some(Type::any()),
        _ => None,
    }
}

fn annotation_base_name(expr: &Expr) -> Option<&str> {
    match &expr.kind {
        ExprKind::Name(name) => Some(name.as_ref()),
        ExprKind::Attribute { attr, .. } => Some(attr.as_ref()),
        _ => None,
    }
}
