//! Wire types for the type-server protocol.
//!
//! Positions on the wire are 0-based (LSP convention); the server
//! converts to and from the 1-based coordinates the session speaks.
//! Requests that read analysis state carry the snapshot counter they were
//! issued against; the server rejects stale ones instead of answering
//! from mismatched state.

use serde::{Deserialize, Serialize};

/// Protocol revision spoken by this server.
pub const PROTOCOL_VERSION: &str = "0.1";

/// 0-based line/character position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum TspRequest {
    #[serde(rename = "typeServer/getSupportedProtocolVersion")]
    GetSupportedProtocolVersion,
    #[serde(rename = "typeServer/getSnapshot")]
    GetSnapshot,
    #[serde(rename = "typeServer/updateSource")]
    UpdateSource { uri: String, text: String },
    #[serde(rename = "typeServer/getDiagnostics")]
    GetDiagnostics { uri: String, snapshot: u64 },
    #[serde(rename = "typeServer/getType")]
    GetType {
        uri: String,
        position: Position,
        snapshot: u64,
    },
    #[serde(rename = "typeServer/getDefinition")]
    GetDefinition {
        uri: String,
        position: Position,
        snapshot: u64,
    },
    #[serde(rename = "typeServer/getCompletions")]
    GetCompletions {
        uri: String,
        position: Position,
        snapshot: u64,
    },
    #[serde(rename = "typeServer/getInlayHints")]
    GetInlayHints { uri: String, snapshot: u64 },
    #[serde(rename = "typeServer/getMatchingOverloads")]
    GetMatchingOverloads {
        uri: String,
        position: Position,
        snapshot: u64,
    },
    #[serde(rename = "typeServer/resolveImportDeclaration")]
    ResolveImportDeclaration {
        uri: String,
        position: Position,
        snapshot: u64,
    },
    #[serde(rename = "typeServer/getSymbol")]
    GetSymbol {
        uri: String,
        position: Position,
        snapshot: u64,
    },
    #[serde(rename = "typeServer/getOverloads")]
    GetOverloads {
        uri: String,
        position: Position,
        snapshot: u64,
    },
    #[serde(rename = "typeServer/getSymbolsForFile")]
    GetSymbolsForFile { uri: String, snapshot: u64 },
    #[serde(rename = "typeServer/getTypeAttributes")]
    GetTypeAttributes {
        uri: String,
        position: Position,
        snapshot: u64,
    },
    #[serde(rename = "typeServer/shutdown")]
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TspResponse {
    ProtocolVersion {
        version: String,
    },
    Snapshot {
        snapshot: u64,
    },
    Update {
        snapshot: u64,
        version: u64,
        committed: bool,
    },
    Diagnostics {
        items: Vec<DiagnosticData>,
    },
    Type {
        hover: Option<HoverData>,
    },
    Declaration {
        declaration: Option<DeclarationData>,
    },
    Completions {
        items: Vec<CompletionData>,
    },
    InlayHints {
        items: Vec<InlayHintData>,
    },
    Overloads {
        signatures: Vec<String>,
    },
    Symbol {
        symbol: Option<SymbolData>,
    },
    Symbols {
        symbols: Vec<SymbolData>,
    },
    Attributes {
        attributes: Vec<SymbolData>,
    },
    Null,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TspError {
    #[error("snapshot {requested} is outdated (current is {current})")]
    SnapshotOutdated { requested: u64, current: u64 },
    #[error("session has been disposed")]
    SessionClosed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticData {
    pub range: Range,
    /// LSP severity: 1 error, 2 warning, 3 info, 4 hint.
    pub severity: u8,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoverData {
    pub contents: String,
    pub range: Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeclarationCategory {
    Function,
    Class,
    Variable,
    Parameter,
    Import,
}

/// A declaration site. `unresolved` marks declarations whose real target
/// lives outside the analyzed buffer (imports): the range points at the
/// local binding and clients must not navigate through it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclarationData {
    pub uri: String,
    pub name: String,
    pub category: DeclarationCategory,
    pub range: Range,
    pub unresolved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionData {
    pub label: String,
    /// LSP completion item kind.
    pub kind: u8,
    pub detail: Option<String>,
    pub documentation: Option<String>,
    /// Clients sort lexicographically by this; it encodes scope proximity
    /// ahead of the label.
    pub sort_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlayHintData {
    pub position: Position,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolData {
    pub name: String,
    pub category: DeclarationCategory,
    pub range: Range,
    #[serde(rename = "type")]
    pub type_repr: Option<String>,
}
