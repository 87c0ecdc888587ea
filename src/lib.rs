//! # pyrite-core
//!
//! Core library for incremental static analysis of a Python-like language:
//! parsing, name resolution, type inference, and IDE/protocol queries.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! tsp       → TSP protocol layer (request/response over Session)
//!   ↓
//! session   → Session façade (update/query API, snapshots, cancellation)
//!   ↓
//! ide       → IDE queries (hover, goto-def, completion, inlay hints)
//!   ↓
//! hir       → Semantic model (symbols, types, inference, diagnostics)
//!   ↓
//! parser    → Logos lexer with indentation synthesis, recursive-descent parser
//!   ↓
//! buffer    → Versioned source buffer store
//!   ↓
//! base      → Primitives (BufferId, Name interning, LineIndex, Position)
//! ```
//!
//! ## Usage
//!
//! ```
//! use pyrite::Session;
//!
//! let session = Session::new();
//! session.update_source("main.py", "def f(x: int) -> int:\n    return x\n").unwrap();
//!
//! let errors = session.get_errors("main.py").unwrap();
//! assert!(errors.is_empty());
//!
//! let hover = session.query_type("main.py", 2, 12).unwrap();
//! assert!(hover.is_some());
//! ```

/// Foundation types: BufferId, Name interning, LineIndex, Position/Span
pub mod base;

/// Versioned source buffer store
pub mod buffer;

/// Parser: logos lexer, INDENT/DEDENT synthesis, recursive-descent parser
pub mod parser;

/// Semantic model: symbol tables, types, inference, diagnostics
pub mod hir;

/// IDE features: hover, goto-definition, completion, inlay hints, overloads
pub mod ide;

/// Session façade: the single entry point composing parse/infer/check/query
pub mod session;

/// TSP protocol layer: typed request/response surface over a Session
pub mod tsp;

// Re-export foundation types
pub use base::{BufferId, Interner, LineCol, LineIndex, Name, Position, Span};

// Re-export the public analysis surface
pub use hir::{Analysis, Diagnostic, Severity, analyze};
pub use ide::{CompletionItem, GotoTarget, HoverResult, InlayHint};
pub use session::{QueryFault, Session, SessionError, SessionState, UpdateOutcome};
