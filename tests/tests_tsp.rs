//! Protocol-level behavior: wire formats, snapshot staleness, and the
//! documented degraded results (unresolved imports, empty attribute sets).

use pyrite::tsp::{
    DeclarationCategory, PROTOCOL_VERSION, Position, TspError, TspRequest, TspResponse,
    TspServer,
};

fn server_with(text: &str) -> (TspServer, u64) {
    let server = TspServer::new();
    let response = server
        .handle(TspRequest::UpdateSource {
            uri: "main.py".to_string(),
            text: text.to_string(),
        })
        .unwrap();
    match response {
        TspResponse::Update {
            snapshot,
            committed,
            ..
        } => {
            assert!(committed);
            (server, snapshot)
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

#[test]
fn test_snapshot_counter_starts_at_zero_and_bumps() {
    let server = TspServer::new();
    assert_eq!(
        server.handle(TspRequest::GetSnapshot),
        Ok(TspResponse::Snapshot { snapshot: 0 })
    );
    let (_, snapshot) = server_with_existing(server, "x = 1\n");
    assert_eq!(snapshot, 1);
}

fn server_with_existing(server: TspServer, text: &str) -> (TspServer, u64) {
    let response = server
        .handle(TspRequest::UpdateSource {
            uri: "main.py".to_string(),
            text: text.to_string(),
        })
        .unwrap();
    match response {
        TspResponse::Update { snapshot, .. } => (server, snapshot),
        other => panic!("unexpected response: {other:?}"),
    }
}

#[test]
fn test_requests_against_stale_snapshot_fail() {
    let (server, old) = server_with("x = 1\n");
    let (server, new) = server_with_existing(server, "x = 2\n");
    assert_ne!(old, new);

    let err = server
        .handle(TspRequest::GetType {
            uri: "main.py".to_string(),
            position: Position { line: 0, character: 0 },
            snapshot: old,
        })
        .unwrap_err();
    assert_eq!(
        err,
        TspError::SnapshotOutdated {
            requested: old,
            current: new
        }
    );

    // The same request against the current snapshot succeeds.
    assert!(server
        .handle(TspRequest::GetType {
            uri: "main.py".to_string(),
            position: Position { line: 0, character: 0 },
            snapshot: new,
        })
        .is_ok());
}

#[test]
fn test_request_deserialization_from_json() {
    let json = r#"{
        "method": "typeServer/getDefinition",
        "params": {
            "uri": "main.py",
            "position": { "line": 2, "character": 0 },
            "snapshot": 1
        }
    }"#;
    let request: TspRequest = serde_json::from_str(json).unwrap();
    let (server, _) = server_with("def f(x: int) -> int:\n    return x\nf(1)\n");
    let response = server.handle(request).unwrap();
    let TspResponse::Declaration {
        declaration: Some(decl),
    } = response
    else {
        panic!("expected a declaration");
    };
    assert_eq!(decl.name, "f");
    assert_eq!(decl.category, DeclarationCategory::Function);
    assert_eq!(decl.range.start.line, 0);
}

#[test]
fn test_diagnostics_response_serializes() {
    let (server, snapshot) = server_with("y = missing\n");
    let response = server
        .handle(TspRequest::GetDiagnostics {
            uri: "main.py".to_string(),
            snapshot,
        })
        .unwrap();
    let json = serde_json::to_value(&response).unwrap();
    let items = json["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["severity"], 1);
    assert_eq!(items[0]["range"]["start"]["line"], 0);
    assert_eq!(items[0]["range"]["start"]["character"], 4);
}

#[test]
fn test_import_declarations_come_back_unresolved() {
    let (server, snapshot) = server_with("from typing import overload\nov = overload\n");
    let response = server
        .handle(TspRequest::ResolveImportDeclaration {
            uri: "main.py".to_string(),
            position: Position { line: 1, character: 5 },
            snapshot,
        })
        .unwrap();
    let TspResponse::Declaration {
        declaration: Some(decl),
    } = response
    else {
        panic!("expected declaration");
    };
    assert!(decl.unresolved, "import targets must be flagged unresolved");
    assert_eq!(decl.category, DeclarationCategory::Import);
    // The range points at the local binding on line 0.
    assert_eq!(decl.range.start.line, 0);
}

#[test]
fn test_resolve_import_on_non_import_is_none() {
    let (server, snapshot) = server_with("x = 1\ny = x\n");
    let response = server
        .handle(TspRequest::ResolveImportDeclaration {
            uri: "main.py".to_string(),
            position: Position { line: 1, character: 4 },
            snapshot,
        })
        .unwrap();
    assert_eq!(response, TspResponse::Declaration { declaration: None });
}

#[test]
fn test_symbols_for_file_in_declaration_order() {
    let text = "def f():\n    pass\nclass C:\n    pass\nx = 1\n";
    let (server, snapshot) = server_with(text);
    let response = server
        .handle(TspRequest::GetSymbolsForFile {
            uri: "main.py".to_string(),
            snapshot,
        })
        .unwrap();
    let TspResponse::Symbols { symbols } = response else {
        panic!("expected symbols");
    };
    let names: Vec<&str> = symbols.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["f", "C", "x"]);
    assert_eq!(symbols[0].category, DeclarationCategory::Function);
    assert_eq!(symbols[1].category, DeclarationCategory::Class);
    assert_eq!(symbols[2].category, DeclarationCategory::Variable);
}

#[test]
fn test_type_attributes_of_instance() {
    let text = "class Dog:\n    sound: str = 'woof'\n    def bark(self) -> str:\n        return self.sound\nd = Dog()\n";
    let (server, snapshot) = server_with(text);
    let response = server
        .handle(TspRequest::GetTypeAttributes {
            uri: "main.py".to_string(),
            position: Position { line: 4, character: 0 },
            snapshot,
        })
        .unwrap();
    let TspResponse::Attributes { attributes } = response else {
        panic!("expected attributes");
    };
    let names: Vec<&str> = attributes.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["sound", "bark"]);
}

#[test]
fn test_type_attributes_of_module_are_empty() {
    let (server, snapshot) = server_with("import os\nm = os\n");
    let response = server
        .handle(TspRequest::GetTypeAttributes {
            uri: "main.py".to_string(),
            position: Position { line: 1, character: 0 },
            snapshot,
        })
        .unwrap();
    assert_eq!(
        response,
        TspResponse::Attributes {
            attributes: Vec::new()
        }
    );
}

#[test]
fn test_overloads_over_the_wire() {
    let text = "@overload\ndef h(x: int) -> int:\n    pass\n@overload\ndef h(x: str) -> str:\n    pass\ndef h(x):\n    return x\nh(1)\n";
    let (server, snapshot) = server_with(text);
    let response = server
        .handle(TspRequest::GetMatchingOverloads {
            uri: "main.py".to_string(),
            position: Position { line: 8, character: 2 },
            snapshot,
        })
        .unwrap();
    assert_eq!(
        response,
        TspResponse::Overloads {
            signatures: vec![
                "def h(x: int) -> int".to_string(),
                "def h(x: str) -> str".to_string(),
            ]
        }
    );
}

#[test]
fn test_supported_protocol_version() {
    let server = TspServer::new();
    assert_eq!(
        server.handle(TspRequest::GetSupportedProtocolVersion),
        Ok(TspResponse::ProtocolVersion {
            version: PROTOCOL_VERSION.to_string()
        })
    );
}

#[test]
fn test_get_symbol_at_use_site() {
    let (server, snapshot) = server_with("def f(x: int) -> int:\n    return x\nf(1)\n");
    let response = server
        .handle(TspRequest::GetSymbol {
            uri: "main.py".to_string(),
            position: Position { line: 2, character: 0 },
            snapshot,
        })
        .unwrap();
    let TspResponse::Symbol { symbol: Some(sym) } = response else {
        panic!("expected a symbol");
    };
    assert_eq!(sym.name, "f");
    assert_eq!(sym.category, DeclarationCategory::Function);
    assert_eq!(sym.type_repr.as_deref(), Some("(x: int) -> int"));
}

#[test]
fn test_get_symbol_outside_any_name_is_none() {
    let (server, snapshot) = server_with("x = 1\n\n");
    let response = server
        .handle(TspRequest::GetSymbol {
            uri: "main.py".to_string(),
            position: Position { line: 1, character: 0 },
            snapshot,
        })
        .unwrap();
    assert_eq!(response, TspResponse::Symbol { symbol: None });
}

#[test]
fn test_declared_overloads_at_definition() {
    let text = "@overload\ndef h(x: int) -> int:\n    pass\n@overload\ndef h(x: str) -> str:\n    pass\ndef h(x):\n    return x\n";
    let (server, snapshot) = server_with(text);
    // On the `h` of the first def, not at a call site.
    let response = server
        .handle(TspRequest::GetOverloads {
            uri: "main.py".to_string(),
            position: Position { line: 1, character: 4 },
            snapshot,
        })
        .unwrap();
    assert_eq!(
        response,
        TspResponse::Overloads {
            signatures: vec![
                "def h(x: int) -> int".to_string(),
                "def h(x: str) -> str".to_string(),
            ]
        }
    );
}

#[test]
fn test_declared_overloads_of_uncallable_are_empty() {
    let (server, snapshot) = server_with("x = 1\n");
    let response = server
        .handle(TspRequest::GetOverloads {
            uri: "main.py".to_string(),
            position: Position { line: 0, character: 0 },
            snapshot,
        })
        .unwrap();
    assert_eq!(
        response,
        TspResponse::Overloads {
            signatures: Vec::new()
        }
    );
}

#[test]
fn test_shutdown_then_everything_fails() {
    let (server, _) = server_with("x = 1\n");
    assert_eq!(server.handle(TspRequest::Shutdown), Ok(TspResponse::Null));
    assert_eq!(
        server.handle(TspRequest::GetSnapshot),
        Err(TspError::SessionClosed)
    );
    assert_eq!(
        server.handle(TspRequest::UpdateSource {
            uri: "main.py".to_string(),
            text: String::new(),
        }),
        Err(TspError::SessionClosed)
    );
}
