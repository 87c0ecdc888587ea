//! IDE queries over a completed [`Analysis`](crate::hir::Analysis).
//!
//! Every query here is a pure read: it takes the analysis snapshot plus a
//! byte offset and never touches buffer state. The session layer owns
//! position validation and maps 1-based coordinates to offsets before
//! calling in.

mod completion;
mod goto;
mod hover;
mod inlay_hints;
mod overloads;
pub mod text_utils;

pub use completion::{CompletionItem, CompletionKind, completions};
pub use goto::{GotoTarget, goto_definition};
pub use hover::{HoverResult, hover};
pub use inlay_hints::{InlayHint, InlayHintKind, inlay_hints};
pub use overloads::matching_overloads;
