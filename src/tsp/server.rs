//! Protocol request dispatch over a [`Session`].

use text_size::TextSize;

use crate::base::Span;
use crate::hir::{Analysis, SymbolId, SymbolKind, Type};
use crate::session::{Session, SessionError};

use super::protocol::{
    CompletionData, DeclarationCategory, DeclarationData, DiagnosticData, HoverData,
    InlayHintData, PROTOCOL_VERSION, Position, Range, SymbolData, TspError, TspRequest,
    TspResponse,
};

/// Serves protocol requests against one session.
pub struct TspServer {
    session: Session,
}

impl Default for TspServer {
    fn default() -> Self {
        Self::new()
    }
}

impl TspServer {
    pub fn new() -> Self {
        Self {
            session: Session::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Dispatch one request.
    ///
    /// Requests that carry a snapshot counter are answered only when it
    /// matches the current one; anything else gets
    /// [`TspError::SnapshotOutdated`] and the client is expected to
    /// re-query.
    pub fn handle(&self, request: TspRequest) -> Result<TspResponse, TspError> {
        tracing::debug!(?request, "tsp request");
        match request {
            TspRequest::GetSupportedProtocolVersion => Ok(TspResponse::ProtocolVersion {
                version: PROTOCOL_VERSION.to_string(),
            }),
            TspRequest::GetSnapshot => Ok(TspResponse::Snapshot {
                snapshot: self.session.snapshot_id().map_err(closed)?,
            }),
            TspRequest::UpdateSource { uri, text } => {
                let outcome = self.session.update_source(&uri, &text).map_err(closed)?;
                Ok(TspResponse::Update {
                    snapshot: self.session.snapshot_id().map_err(closed)?,
                    version: outcome.version,
                    committed: outcome.committed,
                })
            }
            TspRequest::GetDiagnostics { uri, snapshot } => {
                self.check_snapshot(snapshot)?;
                let items = self
                    .session
                    .get_errors(&uri)
                    .map_err(closed)?
                    .into_iter()
                    .map(|d| DiagnosticData {
                        range: Range {
                            start: to_wire(d.start_line, d.start_col),
                            end: to_wire(d.end_line, d.end_col),
                        },
                        severity: d.severity.to_lsp(),
                        code: d.code.to_string(),
                        message: d.render_message(),
                    })
                    .collect();
                Ok(TspResponse::Diagnostics { items })
            }
            TspRequest::GetType {
                uri,
                position,
                snapshot,
            } => {
                self.check_snapshot(snapshot)?;
                let hover = self
                    .session
                    .query_type(&uri, position.line + 1, position.character + 1)
                    .map_err(closed)?;
                Ok(TspResponse::Type {
                    hover: hover.map(|h| HoverData {
                        contents: h.markdown,
                        range: span_to_range(h.span),
                    }),
                })
            }
            TspRequest::GetDefinition {
                uri,
                position,
                snapshot,
            } => {
                self.check_snapshot(snapshot)?;
                let target = self
                    .session
                    .goto_definition(&uri, position.line + 1, position.character + 1)
                    .map_err(closed)?;
                Ok(TspResponse::Declaration {
                    declaration: target.map(|t| DeclarationData {
                        uri: uri.clone(),
                        name: t.name.to_string(),
                        category: category_of(t.kind),
                        range: span_to_range(t.span),
                        unresolved: false,
                    }),
                })
            }
            TspRequest::GetCompletions {
                uri,
                position,
                snapshot,
            } => {
                self.check_snapshot(snapshot)?;
                let items = self
                    .session
                    .auto_complete(&uri, position.line + 1, position.character + 1)
                    .map_err(closed)?
                    .into_iter()
                    .map(|item| CompletionData {
                        sort_text: format!("{}_{}", item.priority, item.label),
                        label: item.label.to_string(),
                        kind: item.kind.to_lsp(),
                        detail: item.detail,
                        documentation: item.documentation.map(|d| d.to_string()),
                    })
                    .collect();
                Ok(TspResponse::Completions { items })
            }
            TspRequest::GetInlayHints { uri, snapshot } => {
                self.check_snapshot(snapshot)?;
                let items = self
                    .session
                    .inlay_hint(&uri)
                    .map_err(closed)?
                    .into_iter()
                    .map(|hint| InlayHintData {
                        position: to_wire(hint.position.line, hint.position.column),
                        label: hint.label,
                    })
                    .collect();
                Ok(TspResponse::InlayHints { items })
            }
            TspRequest::GetMatchingOverloads {
                uri,
                position,
                snapshot,
            } => {
                self.check_snapshot(snapshot)?;
                let signatures = self
                    .session
                    .matching_overloads(&uri, position.line + 1, position.character + 1)
                    .map_err(closed)?
                    .iter()
                    .map(|sig| sig.display_def())
                    .collect();
                Ok(TspResponse::Overloads { signatures })
            }
            TspRequest::ResolveImportDeclaration {
                uri,
                position,
                snapshot,
            } => {
                self.check_snapshot(snapshot)?;
                Ok(TspResponse::Declaration {
                    declaration: self.resolve_import(&uri, position)?,
                })
            }
            TspRequest::GetSymbol {
                uri,
                position,
                snapshot,
            } => {
                self.check_snapshot(snapshot)?;
                Ok(TspResponse::Symbol {
                    symbol: self.symbol_info(&uri, position)?,
                })
            }
            TspRequest::GetOverloads {
                uri,
                position,
                snapshot,
            } => {
                self.check_snapshot(snapshot)?;
                Ok(TspResponse::Overloads {
                    signatures: self.declared_overloads(&uri, position)?,
                })
            }
            TspRequest::GetSymbolsForFile { uri, snapshot } => {
                self.check_snapshot(snapshot)?;
                Ok(TspResponse::Symbols {
                    symbols: self.file_symbols(&uri)?,
                })
            }
            TspRequest::GetTypeAttributes {
                uri,
                position,
                snapshot,
            } => {
                self.check_snapshot(snapshot)?;
                Ok(TspResponse::Attributes {
                    attributes: self.type_attributes(&uri, position)?,
                })
            }
            TspRequest::Shutdown => {
                self.session.dispose();
                Ok(TspResponse::Null)
            }
        }
    }

    fn check_snapshot(&self, requested: u64) -> Result<(), TspError> {
        let current = self.session.snapshot_id().map_err(closed)?;
        if requested != current {
            return Err(TspError::SnapshotOutdated { requested, current });
        }
        Ok(())
    }

    /// The declaration an import binding points at. Cross-module targets
    /// are out of reach, so the result carries the local binding flagged
    /// `unresolved: true`; non-import symbols yield None here.
    fn resolve_import(
        &self,
        uri: &str,
        position: Position,
    ) -> Result<Option<DeclarationData>, TspError> {
        let Some(analysis) = self.session.analysis(uri).map_err(closed)? else {
            return Ok(None);
        };
        let Some(offset) = offset_of(&analysis, position) else {
            return Ok(None);
        };
        let Some(sym) = symbol_at(&analysis, offset) else {
            return Ok(None);
        };
        let symbol = analysis.table.symbol(sym);
        if symbol.kind != SymbolKind::Import {
            return Ok(None);
        }
        Ok(Some(DeclarationData {
            uri: uri.to_string(),
            name: symbol.name.to_string(),
            category: DeclarationCategory::Import,
            range: span_to_range(analysis.line_index.span(symbol.def_range)),
            unresolved: true,
        }))
    }

    /// The symbol declared or referenced at `position`.
    fn symbol_info(
        &self,
        uri: &str,
        position: Position,
    ) -> Result<Option<SymbolData>, TspError> {
        let Some(analysis) = self.session.analysis(uri).map_err(closed)? else {
            return Ok(None);
        };
        let Some(offset) = offset_of(&analysis, position) else {
            return Ok(None);
        };
        let Some(id) = symbol_at(&analysis, offset) else {
            return Ok(None);
        };
        let symbol = analysis.table.symbol(id);
        Ok(Some(SymbolData {
            name: symbol.name.to_string(),
            category: category_of(symbol.kind),
            range: span_to_range(analysis.line_index.span(symbol.def_range)),
            type_repr: analysis.type_of_symbol(id).map(|t| t.to_string()),
        }))
    }

    /// The declared overload set of the symbol at `position`, in
    /// declaration order. A plain callable yields one signature; anything
    /// uncallable yields none.
    fn declared_overloads(
        &self,
        uri: &str,
        position: Position,
    ) -> Result<Vec<String>, TspError> {
        let Some(analysis) = self.session.analysis(uri).map_err(closed)? else {
            return Ok(Vec::new());
        };
        let Some(offset) = offset_of(&analysis, position) else {
            return Ok(Vec::new());
        };
        let Some(id) = symbol_at(&analysis, offset) else {
            return Ok(Vec::new());
        };
        let Some(ty) = analysis.type_of_symbol(id) else {
            return Ok(Vec::new());
        };
        Ok(ty
            .callable_signatures()
            .iter()
            .map(|sig| sig.display_def())
            .collect())
    }

    /// Every symbol declared in the buffer, in declaration order.
    fn file_symbols(&self, uri: &str) -> Result<Vec<SymbolData>, TspError> {
        let Some(analysis) = self.session.analysis(uri).map_err(closed)? else {
            return Ok(Vec::new());
        };
        Ok(analysis
            .table
            .all_symbols()
            .map(|(id, symbol)| SymbolData {
                name: symbol.name.to_string(),
                category: category_of(symbol.kind),
                range: span_to_range(analysis.line_index.span(symbol.def_range)),
                type_repr: analysis.type_of_symbol(id).map(|t| t.to_string()),
            })
            .collect())
    }

    /// Members of the type of the expression at `position`. Only locally
    /// declared classes have enumerable members; modules and synthesized
    /// types come back empty.
    fn type_attributes(
        &self,
        uri: &str,
        position: Position,
    ) -> Result<Vec<SymbolData>, TspError> {
        let Some(analysis) = self.session.analysis(uri).map_err(closed)? else {
            return Ok(Vec::new());
        };
        let Some(offset) = offset_of(&analysis, position) else {
            return Ok(Vec::new());
        };
        let Some(expr) = crate::parser::ast::find_expr_at(&analysis.module, offset) else {
            return Ok(Vec::new());
        };
        let Some(ty) = analysis.type_of_expr(expr.id) else {
            return Ok(Vec::new());
        };
        let class = match &*ty {
            Type::Instance { class, .. } => class.clone(),
            Type::Class(name) => name.clone(),
            _ => return Ok(Vec::new()),
        };
        let scope = analysis.table.scope_at(offset);
        let Some(class_sym) = analysis.table.lookup(scope, &class) else {
            return Ok(Vec::new());
        };
        let Some(body) = analysis.table.symbol(class_sym).body_scope else {
            return Ok(Vec::new());
        };
        Ok(analysis
            .table
            .scope(body)
            .bindings()
            .map(|(_, id)| {
                let symbol = analysis.table.symbol(id);
                SymbolData {
                    name: symbol.name.to_string(),
                    category: category_of(symbol.kind),
                    range: span_to_range(analysis.line_index.span(symbol.def_range)),
                    type_repr: analysis.type_of_symbol(id).map(|t| t.to_string()),
                }
            })
            .collect())
    }
}

/// Symbol declared at the offset, or the resolved target of the name
/// expression there.
fn symbol_at(analysis: &Analysis, offset: TextSize) -> Option<SymbolId> {
    analysis.table.symbol_at_def(offset).or_else(|| {
        crate::parser::ast::find_expr_at(&analysis.module, offset)
            .and_then(|expr| analysis.table.resolve_use(expr.id))
    })
}

fn offset_of(analysis: &Analysis, position: Position) -> Option<TextSize> {
    analysis
        .line_index
        .offset_of_position(crate::base::Position::new(
            position.line + 1,
            position.character + 1,
        ))
}

fn closed(_: SessionError) -> TspError {
    TspError::SessionClosed
}

fn to_wire(line: u32, column: u32) -> Position {
    Position {
        line: line.saturating_sub(1),
        character: column.saturating_sub(1),
    }
}

fn span_to_range(span: Span) -> Range {
    Range {
        start: to_wire(span.start.line, span.start.column),
        end: to_wire(span.end.line, span.end.column),
    }
}

fn category_of(kind: SymbolKind) -> DeclarationCategory {
    match kind {
        SymbolKind::Function => DeclarationCategory::Function,
        SymbolKind::Class => DeclarationCategory::Class,
        SymbolKind::Variable => DeclarationCategory::Variable,
        SymbolKind::Parameter => DeclarationCategory::Parameter,
        SymbolKind::Import => DeclarationCategory::Import,
    }
}
