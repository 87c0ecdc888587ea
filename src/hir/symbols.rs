//! Symbol tables and scopes.
//!
//! One [`SymbolTable`] per analyzed buffer, rebuilt from scratch on every
//! version change. Bindings keep declaration order (`IndexMap`): overload
//! grouping and diagnostic tie-breaks depend on it.

use indexmap::IndexMap;
use text_size::{TextRange, TextSize};

use crate::base::Name;
use crate::parser::ast::ExprId;

/// Identifier for a symbol within its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

/// Identifier for a scope within its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

/// The module-level scope, always present at index 0.
pub const MODULE_SCOPE: ScopeId = ScopeId(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Function,
    Class,
    Variable,
    Parameter,
    Import,
}

impl SymbolKind {
    pub fn display(self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Class => "class",
            SymbolKind::Variable => "variable",
            SymbolKind::Parameter => "parameter",
            SymbolKind::Import => "import",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Module,
    Class,
    Function,
}

/// A declared symbol.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: Name,
    pub kind: SymbolKind,
    /// Range of the declaring name token (go-to-definition target).
    pub def_range: TextRange,
    /// Range of the whole declaring construct.
    pub full_range: TextRange,
    /// The scope this symbol is bound in.
    pub scope: ScopeId,
    /// Body scope for functions and classes.
    pub body_scope: Option<ScopeId>,
    /// First string expression of the body, for functions and classes.
    pub docstring: Option<Name>,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    /// Source range covered by the scope (the whole `def`/`class`
    /// construct, so parameters fall inside their function's scope).
    pub range: TextRange,
    bindings: IndexMap<Name, SymbolId>,
}

impl Scope {
    /// Bindings in declaration order.
    pub fn bindings(&self) -> impl Iterator<Item = (&Name, SymbolId)> {
        self.bindings.iter().map(|(name, &id)| (name, id))
    }

    pub fn get(&self, name: &str) -> Option<SymbolId> {
        self.bindings.get(name).copied()
    }
}

/// All symbols and scopes of one buffer, plus the name-use map linking
/// resolved `Name` expressions to their symbols.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    scopes: Vec<Scope>,
    /// Resolved name uses: `Name` expression -> symbol. Keyword-argument
    /// names and attribute names are never entered here.
    use_map: rustc_hash::FxHashMap<ExprId, SymbolId>,
    /// Body scope of each `def`/`class`, keyed by the start offset of the
    /// declaring name token.
    def_scopes: rustc_hash::FxHashMap<u32, ScopeId>,
}

impl SymbolTable {
    pub fn new(module_range: TextRange) -> Self {
        Self {
            symbols: Vec::new(),
            scopes: vec![Scope {
                kind: ScopeKind::Module,
                parent: None,
                range: module_range,
                bindings: IndexMap::new(),
            }],
            use_map: rustc_hash::FxHashMap::default(),
            def_scopes: rustc_hash::FxHashMap::default(),
        }
    }

    // ==================== construction ====================

    pub fn alloc_scope(&mut self, kind: ScopeKind, parent: ScopeId, range: TextRange) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            kind,
            parent: Some(parent),
            range,
            bindings: IndexMap::new(),
        });
        id
    }

    /// Declare a symbol in `scope`. If the name is already bound in that
    /// scope, the existing symbol is returned (re-assignment and overload
    /// grouping both land here).
    pub fn declare(&mut self, scope: ScopeId, symbol: Symbol) -> SymbolId {
        if let Some(existing) = self.scopes[scope.0 as usize].bindings.get(&symbol.name) {
            return *existing;
        }
        let id = SymbolId(self.symbols.len() as u32);
        let name = symbol.name.clone();
        self.symbols.push(symbol);
        self.scopes[scope.0 as usize].bindings.insert(name, id);
        id
    }

    pub fn record_use(&mut self, expr: ExprId, symbol: SymbolId) {
        self.use_map.insert(expr, symbol);
    }

    pub fn set_def_scope(&mut self, name_start: TextSize, scope: ScopeId) {
        self.def_scopes.insert(name_start.into(), scope);
    }

    pub fn def_scope(&self, name_start: TextSize) -> Option<ScopeId> {
        self.def_scopes.get(&u32::from(name_start)).copied()
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
    }

    // ==================== queries ====================

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    pub fn resolve_use(&self, expr: ExprId) -> Option<SymbolId> {
        self.use_map.get(&expr).copied()
    }

    /// All symbols in declaration order.
    pub fn all_symbols(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (SymbolId(i as u32), s))
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    /// Look up `name` starting from `scope`, walking outward.
    ///
    /// Python scoping rule: class scopes are invisible to code nested in
    /// functions below them, so the walk skips `Class` scopes except when
    /// the lookup starts directly in one.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let mut current = Some(scope);
        let mut first = true;
        while let Some(id) = current {
            let s = self.scope(id);
            if first || s.kind != ScopeKind::Class {
                if let Some(found) = s.get(name) {
                    return Some(found);
                }
            }
            first = false;
            current = s.parent;
        }
        None
    }

    /// Innermost scope whose range contains `offset`.
    pub fn scope_at(&self, offset: TextSize) -> ScopeId {
        let mut best = MODULE_SCOPE;
        let mut best_len = self.scopes[0].range.len();
        for (i, scope) in self.scopes.iter().enumerate().skip(1) {
            if scope.range.contains_inclusive(offset) && scope.range.len() <= best_len {
                best = ScopeId(i as u32);
                best_len = scope.range.len();
            }
        }
        best
    }

    /// Chain of scopes from `scope` to the module scope, innermost first.
    pub fn scope_chain(&self, scope: ScopeId) -> Vec<ScopeId> {
        let mut chain = vec![scope];
        let mut current = self.scope(scope).parent;
        while let Some(id) = current {
            chain.push(id);
            current = self.scope(id).parent;
        }
        chain
    }

    /// Symbol whose name token contains `offset`, if any.
    pub fn symbol_at_def(&self, offset: TextSize) -> Option<SymbolId> {
        self.all_symbols()
            .find(|(_, s)| s.def_range.contains_inclusive(offset))
            .map(|(id, _)| id)
    }
}
