//! Foundation types for the pyrite toolchain.
//!
//! This module provides fundamental types used throughout the analyzer:
//! - [`BufferId`] - Interned buffer identifiers
//! - [`TextRange`], [`TextSize`] - Source positions (byte offsets)
//! - [`LineCol`], [`LineIndex`] - Line/column conversion
//! - [`Position`], [`Span`] - 1-based line/column positions for the query API
//! - [`Name`], [`Interner`] - String interning
//!
//! This module has NO dependencies on other pyrite modules.

mod buffer_id;
mod intern;
mod line_index;
mod position;

pub use buffer_id::BufferId;
pub use intern::{Interner, Name};
pub use line_index::{LineCol, LineIndex};
pub use position::{Position, Span};

// Re-export text-size types for convenience
pub use text_size::{TextRange, TextSize};
