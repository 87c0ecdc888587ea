//! IDE query behavior through the session façade: hover, go-to-definition,
//! completion, and inlay hints.

use pyrite::{Session, ide::CompletionKind};
use rstest::rstest;

fn session_with(text: &str) -> Session {
    let session = Session::new();
    session.update_source("main.py", text).unwrap();
    session
}

// ==================== hover ====================

#[rstest]
#[case("x = 1\n", 1, 5, "int")]
#[case("x = 1.5\n", 1, 5, "float")]
#[case("x = 'hi'\n", 1, 6, "str")]
#[case("x = True\n", 1, 6, "bool")]
#[case("x = None\n", 1, 6, "None")]
#[case("x = [1, 2]\n", 1, 5, "list[int]")]
fn test_hover_literals(
    #[case] text: &str,
    #[case] line: u32,
    #[case] column: u32,
    #[case] expected: &str,
) {
    let session = session_with(text);
    let hover = session.query_type("main.py", line, column).unwrap().unwrap();
    assert!(
        hover.markdown.contains(expected),
        "expected {expected} in {}",
        hover.markdown
    );
}

#[test]
fn test_hover_function_signature() {
    let session = session_with("def add(a: int, b: int) -> int:\n    return a + b\n");
    let hover = session.query_type("main.py", 1, 5).unwrap().unwrap();
    assert!(hover.markdown.contains("def add(a: int, b: int) -> int"));
}

#[test]
fn test_hover_reports_span_of_token() {
    let session = session_with("def f(x: int) -> int:\n    return x\n");
    let hover = session.query_type("main.py", 2, 12).unwrap().unwrap();
    assert_eq!(hover.span.start.line, 2);
    assert_eq!(hover.span.start.column, 12);
    assert_eq!(hover.span.end.column, 13);
}

#[test]
fn test_hover_docstring() {
    let text = "class Dog:\n    'A very good dog.'\n    pass\nd = Dog\n";
    let session = session_with(text);
    let hover = session.query_type("main.py", 4, 5).unwrap().unwrap();
    assert!(hover.markdown.contains("class Dog"));
    assert!(hover.markdown.contains("A very good dog."));
}

#[test]
fn test_hover_empty_space_is_none() {
    let session = session_with("x = 1\n\n\ny = 2\n");
    assert!(session.query_type("main.py", 2, 1).unwrap().is_none());
}

// ==================== go-to-definition ====================

#[test]
fn test_goto_definition_of_variable() {
    let session = session_with("value = 1\nresult = value + 1\n");
    let target = session.goto_definition("main.py", 2, 10).unwrap().unwrap();
    assert_eq!(target.span.start.line, 1);
    assert_eq!(target.span.start.column, 1);
}

#[test]
fn test_goto_definition_of_function_and_class() {
    let text = "class Dog:\n    pass\ndef feed(d: Dog) -> Dog:\n    return d\nfeed(Dog())\n";
    let session = session_with(text);
    let feed = session.goto_definition("main.py", 5, 1).unwrap().unwrap();
    assert_eq!(feed.span.start.line, 3);
    let dog = session.goto_definition("main.py", 5, 6).unwrap().unwrap();
    assert_eq!(dog.span.start.line, 1);
    assert_eq!(dog.span.start.column, 7);
}

#[test]
fn test_goto_definition_annotation_reference() {
    let text = "class Dog:\n    pass\ndef feed(d: Dog) -> Dog:\n    return d\n";
    let session = session_with(text);
    let target = session.goto_definition("main.py", 3, 13).unwrap().unwrap();
    assert_eq!(target.span.start.line, 1);
}

#[test]
fn test_goto_keyword_argument_name_is_none() {
    let text = "def f(x: int) -> int:\n    return x\nf(x=1)\n";
    let session = session_with(text);
    // Column 3 on line 3 is the keyword name `x`.
    assert!(session.goto_definition("main.py", 3, 3).unwrap().is_none());
    // The argument value still resolves normally elsewhere.
    let target = session.goto_definition("main.py", 3, 1).unwrap().unwrap();
    assert_eq!(target.span.start.line, 1);
}

#[test]
fn test_goto_import_binding_is_none() {
    let session = session_with("import os\npath = os\n");
    assert!(session.goto_definition("main.py", 2, 8).unwrap().is_none());
}

// ==================== completion ====================

#[test]
fn test_completion_nearest_scope_first() {
    let text = "zebra = 1\ndef f(apple: int) -> int:\n    a\n";
    let session = session_with(text);
    let items = session.auto_complete("main.py", 3, 6).unwrap();
    let labels: Vec<&str> = items.iter().map(|i| i.label.as_ref()).collect();
    assert!(labels.contains(&"apple"), "{labels:?}");
    // `a` filters out zebra entirely.
    assert!(!labels.contains(&"zebra"));
    assert_eq!(items[0].label.as_ref(), "apple");
    assert_eq!(items[0].kind, CompletionKind::Parameter);
}

#[test]
fn test_completion_includes_keywords_and_builtins_last() {
    let session = session_with("printer = 1\npr\n");
    let items = session.auto_complete("main.py", 2, 3).unwrap();
    let labels: Vec<&str> = items.iter().map(|i| i.label.as_ref()).collect();
    let printer = labels.iter().position(|l| *l == "printer").unwrap();
    let print = labels.iter().position(|l| *l == "print").unwrap();
    assert!(printer < print, "{labels:?}");
}

#[test]
fn test_completion_dedups_shadowed_names() {
    let text = "x: int = 1\ndef f(x: str) -> str:\n    return x\n";
    let session = session_with(text);
    let items = session.auto_complete("main.py", 3, 13).unwrap();
    let xs: Vec<_> = items.iter().filter(|i| i.label.as_ref() == "x").collect();
    assert_eq!(xs.len(), 1);
    assert_eq!(xs[0].detail.as_deref(), Some("str"));
}

#[test]
fn test_completion_members_after_dot() {
    let text = "class Dog:\n    sound: str = 'woof'\n    def bark(self) -> str:\n        return self.sound\nd = Dog()\nd.\n";
    let session = session_with(text);
    let items = session.auto_complete("main.py", 6, 3).unwrap();
    let labels: Vec<&str> = items.iter().map(|i| i.label.as_ref()).collect();
    assert!(labels.contains(&"sound"), "{labels:?}");
    assert!(labels.contains(&"bark"), "{labels:?}");
    assert!(!labels.contains(&"d"));
}

// ==================== inlay hints ====================

#[test]
fn test_inlay_hints_for_inferred_types() {
    let text = "a = 1\nb: int = 2\nc = 'three'\n";
    let session = session_with(text);
    let hints = session.inlay_hint("main.py").unwrap();
    let labels: Vec<&str> = hints.iter().map(|h| h.label.as_str()).collect();
    assert_eq!(labels, vec![": int", ": str"]);
    assert_eq!(hints[0].position.line, 1);
    assert_eq!(hints[1].position.line, 3);
}

#[test]
fn test_inlay_hint_for_inferred_return() {
    let text = "def double(x: int):\n    return x * 2\n";
    let session = session_with(text);
    let hints = session.inlay_hint("main.py").unwrap();
    assert_eq!(hints.len(), 1);
    assert_eq!(hints[0].label, " -> int");
    // Rendered after the `)` on line 1.
    assert_eq!(hints[0].position.line, 1);
    assert_eq!(hints[0].position.column, 19);
}

#[test]
fn test_inlay_hints_sorted() {
    let text = "def g():\n    return 1.5\nz = g()\n";
    let session = session_with(text);
    let hints = session.inlay_hint("main.py").unwrap();
    let labels: Vec<&str> = hints.iter().map(|h| h.label.as_str()).collect();
    assert_eq!(labels, vec![" -> float", ": float"]);
}
