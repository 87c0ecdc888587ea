//! Parser behavior: indentation handling, expression precedence, error
//! recovery, and the statement forms of the supported subset.

use pyrite::parser::ast::{BinOp, ExprKind, StmtKind};
use pyrite::parser::{ParseResult, parse};
use rstest::rstest;

fn parse_ok(text: &str) -> ParseResult {
    let result = parse(text);
    assert!(result.errors.is_empty(), "unexpected errors: {:?}", result.errors);
    result
}

// ==================== statements ====================

#[test]
fn test_statement_forms() {
    let result = parse_ok(
        "import os.path as p\nfrom typing import overload, Optional as Opt\nx: int = 1\ny = 2\n\
         def f(a, b: int = 2) -> int:\n    return a\nclass C(object):\n    pass\n\
         if x:\n    pass\nelif y:\n    pass\nelse:\n    pass\n\
         while x:\n    pass\nfor i in [1, 2]:\n    pass\n",
    );
    let kinds: Vec<&str> = result
        .module
        .body
        .iter()
        .map(|s| match &s.kind {
            StmtKind::Import(_) => "import",
            StmtKind::ImportFrom(_) => "from",
            StmtKind::Assign { .. } => "assign",
            StmtKind::FunctionDef(_) => "def",
            StmtKind::ClassDef(_) => "class",
            StmtKind::If { .. } => "if",
            StmtKind::While { .. } => "while",
            StmtKind::For { .. } => "for",
            other => panic!("unexpected statement {other:?}"),
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["import", "from", "assign", "assign", "def", "class", "if", "while", "for"]
    );
}

#[test]
fn test_nested_indentation() {
    let result = parse_ok(
        "def outer():\n    def inner():\n        return 1\n    return inner\n",
    );
    let StmtKind::FunctionDef(outer) = &result.module.body[0].kind else {
        panic!("expected def");
    };
    assert_eq!(outer.body.len(), 2);
    assert!(matches!(outer.body[0].kind, StmtKind::FunctionDef(_)));
}

#[test]
fn test_blank_lines_and_comments_do_not_dedent() {
    let result = parse_ok("def f():\n    x = 1\n\n    # comment\n    return x\n");
    let StmtKind::FunctionDef(def) = &result.module.body[0].kind else {
        panic!("expected def");
    };
    assert_eq!(def.body.len(), 2);
}

#[test]
fn test_newlines_inside_brackets_are_ignored() {
    let result = parse_ok("x = [\n    1,\n    2,\n]\n");
    let StmtKind::Assign { value: Some(value), .. } = &result.module.body[0].kind else {
        panic!("expected assignment");
    };
    let ExprKind::List(items) = &value.kind else {
        panic!("expected list, got {:?}", value.kind);
    };
    assert_eq!(items.len(), 2);
}

#[test]
fn test_decorators_attach_to_def() {
    let result = parse_ok("@overload\n@deco.nested\ndef f():\n    pass\n");
    let StmtKind::FunctionDef(def) = &result.module.body[0].kind else {
        panic!("expected def");
    };
    assert_eq!(def.decorators.len(), 2);
}

// ==================== expressions ====================

#[rstest]
#[case("x = 1 + 2 * 3\n", BinOp::Add)]
#[case("x = 1 * 2 + 3\n", BinOp::Add)]
#[case("x = a | b\n", BinOp::BitOr)]
fn test_top_operator(#[case] text: &str, #[case] expected: BinOp) {
    let result = parse(text);
    let StmtKind::Assign { value: Some(value), .. } = &result.module.body[0].kind else {
        panic!("expected assignment");
    };
    let ExprKind::Binary { op, .. } = &value.kind else {
        panic!("expected binary expression, got {:?}", value.kind);
    };
    assert_eq!(*op, expected);
}

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    let result = parse_ok("x = 1 + 2 * 3\n");
    let StmtKind::Assign { value: Some(value), .. } = &result.module.body[0].kind else {
        panic!("expected assignment");
    };
    let ExprKind::Binary { op: BinOp::Add, right, .. } = &value.kind else {
        panic!("expected addition at the top");
    };
    assert!(matches!(
        right.kind,
        ExprKind::Binary { op: BinOp::Mul, .. }
    ));
}

#[test]
fn test_call_attribute_subscript_chain() {
    let result = parse_ok("x = obj.method(1)[0]\n");
    let StmtKind::Assign { value: Some(value), .. } = &result.module.body[0].kind else {
        panic!("expected assignment");
    };
    let ExprKind::Subscript { value: call, .. } = &value.kind else {
        panic!("expected subscript at the top, got {:?}", value.kind);
    };
    let ExprKind::Call { callee, .. } = &call.kind else {
        panic!("expected call under subscript");
    };
    assert!(matches!(callee.kind, ExprKind::Attribute { .. }));
}

#[test]
fn test_keyword_arguments_parse_as_named() {
    let result = parse_ok("f(1, key=2)\n");
    let StmtKind::Expr { value } = &result.module.body[0].kind else {
        panic!("expected expression statement");
    };
    let ExprKind::Call { args, .. } = &value.kind else {
        panic!("expected call");
    };
    assert_eq!(args.len(), 2);
    assert!(args[0].name.is_none());
    assert_eq!(args[1].name.as_ref().unwrap().0.as_ref(), "key");
}

#[test]
fn test_string_literals_strip_quotes() {
    for text in ["x = 'abc'\n", "x = \"abc\"\n", "x = '''abc'''\n"] {
        let result = parse_ok(text);
        let StmtKind::Assign { value: Some(value), .. } = &result.module.body[0].kind else {
            panic!("expected assignment");
        };
        let ExprKind::StrLit(s) = &value.kind else {
            panic!("expected string literal in {text:?}");
        };
        assert_eq!(s.as_ref(), "abc");
    }
}

// ==================== error recovery ====================

#[test]
fn test_broken_def_keeps_following_statements() {
    let result = parse("def broken(:\nx = 1\n");
    assert!(!result.errors.is_empty());
    assert!(
        result
            .module
            .body
            .iter()
            .any(|s| matches!(&s.kind, StmtKind::Assign { .. })),
        "the assignment after the broken line must survive"
    );
}

#[test]
fn test_missing_block_reports_and_continues() {
    let result = parse("if x:\ny = 1\n");
    assert!(!result.errors.is_empty());
    assert!(result.errors.iter().any(|e| e.code.as_str() == "E0004"));
    assert!(
        result
            .module
            .body
            .iter()
            .any(|s| matches!(&s.kind, StmtKind::Assign { .. }))
    );
}

#[test]
fn test_every_error_has_code_and_range() {
    let result = parse("def (:\n    ]\nreturn =\n");
    assert!(!result.errors.is_empty());
    for err in &result.errors {
        assert!(err.code.as_str().starts_with("E00"));
        assert!(!err.message.is_empty());
    }
}

#[test]
fn test_expr_ids_are_unique() {
    let result = parse_ok("x = 1 + 2\ny = [x, x]\nz = x.f(a=1)[0]\n");
    let mut seen = std::collections::HashSet::new();
    pyrite::parser::ast::walk_stmts(&result.module.body, &mut |stmt| {
        pyrite::parser::ast::stmt_exprs(stmt, &mut |root| {
            pyrite::parser::ast::walk_expr(root, &mut |expr| {
                assert!(seen.insert(expr.id), "duplicate id {:?}", expr.id);
            });
        });
    });
    assert!(seen.len() as u32 <= result.module.expr_count);
}
