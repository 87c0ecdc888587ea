//! Type-server protocol layer.
//!
//! A thin, serde-typed request/response surface over [`Session`]
//! (`crate::session::Session`): clients send snapshot-stamped requests and
//! the server answers from the matching committed state or rejects the
//! request as outdated.

mod protocol;
mod server;

pub use protocol::{
    CompletionData, DeclarationCategory, DeclarationData, DiagnosticData, HoverData,
    InlayHintData, PROTOCOL_VERSION, Position, Range, SymbolData, TspError, TspRequest,
    TspResponse,
};
pub use server::TspServer;
