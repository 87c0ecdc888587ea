//! Recursive-descent parser with error recovery.
//!
//! The parser never fails the whole call: syntactically invalid input
//! produces a best-effort partial module plus `ParseError`s. Recovery is
//! statement-granular: on an unexpected token the parser records an error
//! and skips to the next logical line.

use text_size::{TextRange, TextSize};

use crate::base::{Interner, Name};

use super::ast::{
    Arg, BinOp, BoolOpKind, ClassDef, CmpOp, DottedName, Expr, ExprId, ExprKind, FunctionDef,
    Import, ImportAlias, ImportFrom, Module, Param, Stmt, StmtKind, UnaryOp,
};
use super::errors::{ParseError, ParseErrorCode};
use super::lexer::{Token, TokenKind, tokenize};

/// Result of parsing one buffer: a (possibly partial) module plus errors.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    pub module: Module,
    pub errors: Vec<ParseError>,
}

/// Parse source text into a module.
pub fn parse(text: &str) -> ParseResult {
    Parser::new(text).parse_module()
}

struct Parser<'a> {
    text: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    prev_end: TextSize,
    errors: Vec<ParseError>,
    next_expr: u32,
    interner: Interner,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            tokens: tokenize(text),
            pos: 0,
            prev_end: TextSize::new(0),
            errors: Vec::new(),
            next_expr: 0,
            interner: Interner::new(),
        }
    }

    // ==================== token access ====================

    fn current(&self) -> Token {
        self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> TokenKind {
        self.current().kind
    }

    fn nth_kind(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    fn bump(&mut self) -> Token {
        let token = self.current();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        self.prev_end = token.range.end();
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> bool {
        if self.eat(kind) {
            true
        } else {
            self.error_here(
                format!("expected {}, found {}", kind.describe(), self.kind().describe()),
                ParseErrorCode::UnexpectedToken,
            );
            false
        }
    }

    fn token_text(&self, token: Token) -> &'a str {
        &self.text[token.range]
    }

    fn intern_token(&mut self, token: Token) -> Name {
        let text = &self.text[token.range];
        self.interner.intern(text)
    }

    fn error_here(&mut self, message: String, code: ParseErrorCode) {
        let range = self.current().range;
        self.errors.push(ParseError::new(message, range, code));
    }

    /// Skip tokens until the next logical line boundary, consuming the
    /// newline itself.
    fn recover_to_line_end(&mut self) {
        loop {
            match self.kind() {
                TokenKind::Newline => {
                    self.bump();
                    return;
                }
                TokenKind::Eof | TokenKind::Dedent => return,
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn finish_range(&self, start: TextSize) -> TextRange {
        TextRange::new(start, self.prev_end.max(start))
    }

    fn mk_expr(&mut self, kind: ExprKind, range: TextRange) -> Expr {
        let id = ExprId(self.next_expr);
        self.next_expr += 1;
        Expr { id, kind, range }
    }

    fn error_expr(&mut self) -> Expr {
        let token = self.current();
        self.error_here(
            format!("expected expression, found {}", token.kind.describe()),
            ParseErrorCode::ExpectedExpression,
        );
        // Consume one token so enclosing loops make progress, unless it is
        // a delimiter the caller needs to see.
        if !matches!(
            token.kind,
            TokenKind::Newline
                | TokenKind::Eof
                | TokenKind::Dedent
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::Comma
                | TokenKind::Colon
        ) {
            self.bump();
        }
        self.mk_expr(ExprKind::Error, token.range)
    }

    // ==================== module / statements ====================

    fn parse_module(mut self) -> ParseResult {
        let mut body = Vec::new();
        loop {
            match self.kind() {
                TokenKind::Eof => break,
                TokenKind::Newline | TokenKind::Dedent => {
                    self.bump();
                }
                TokenKind::Indent => {
                    self.error_here("unexpected indent".to_string(), ParseErrorCode::UnexpectedToken);
                    self.bump();
                }
                TokenKind::Error => {
                    self.error_here(
                        "unterminated or invalid token".to_string(),
                        ParseErrorCode::UnterminatedLiteral,
                    );
                    self.bump();
                }
                _ => {
                    let before = self.pos;
                    let stmt = self.parse_stmt();
                    body.push(stmt);
                    if self.pos == before {
                        // Defensive progress guarantee for malformed input.
                        self.bump();
                    }
                }
            }
        }
        let range = TextRange::new(TextSize::new(0), TextSize::of(self.text));
        ParseResult {
            module: Module {
                body,
                range,
                expr_count: self.next_expr,
            },
            errors: self.errors,
        }
    }

    fn parse_stmt(&mut self) -> Stmt {
        let start = self.current().range.start();
        match self.kind() {
            TokenKind::At | TokenKind::DefKw | TokenKind::ClassKw => self.parse_decorated(start),
            TokenKind::ReturnKw => self.parse_return(start),
            TokenKind::ImportKw => self.parse_import(start),
            TokenKind::FromKw => self.parse_import_from(start),
            TokenKind::IfKw => self.parse_if(start),
            TokenKind::WhileKw => self.parse_while(start),
            TokenKind::ForKw => self.parse_for(start),
            TokenKind::PassKw => {
                self.bump();
                self.expect_line_end();
                Stmt {
                    kind: StmtKind::Pass,
                    range: self.finish_range(start),
                }
            }
            _ => self.parse_expr_stmt(start),
        }
    }

    fn parse_decorated(&mut self, start: TextSize) -> Stmt {
        let mut decorators = Vec::new();
        while self.at(TokenKind::At) {
            self.bump();
            let dec = self.parse_postfix_expr();
            decorators.push(dec);
            self.eat(TokenKind::Newline);
        }
        match self.kind() {
            TokenKind::DefKw => self.parse_function(start, decorators),
            TokenKind::ClassKw => self.parse_class(start, decorators),
            _ => {
                self.error_here(
                    "expected 'def' or 'class' after decorators".to_string(),
                    ParseErrorCode::UnexpectedToken,
                );
                self.recover_to_line_end();
                Stmt {
                    kind: StmtKind::Pass,
                    range: self.finish_range(start),
                }
            }
        }
    }

    fn parse_function(&mut self, start: TextSize, decorators: Vec<Expr>) -> Stmt {
        self.bump(); // def
        let (name, name_range) = self.expect_name();
        let params_start = self.current().range.start();
        let mut params = Vec::new();
        if self.expect(TokenKind::LParen) {
            while !self.at(TokenKind::RParen)
                && !self.at(TokenKind::Newline)
                && !self.at(TokenKind::Eof)
            {
                // `*args` / `**kwargs` markers are accepted but carry no
                // extra semantics in this subset.
                while self.at(TokenKind::Star) || self.at(TokenKind::StarStar) {
                    self.bump();
                }
                if !self.at(TokenKind::Ident) {
                    self.error_here(
                        format!("expected parameter name, found {}", self.kind().describe()),
                        ParseErrorCode::ExpectedIdentifier,
                    );
                    break;
                }
                let token = self.bump();
                let pname = self.intern_token(token);
                let annotation = if self.eat(TokenKind::Colon) {
                    Some(self.parse_expr())
                } else {
                    None
                };
                let default = if self.eat(TokenKind::Eq) {
                    Some(self.parse_expr())
                } else {
                    None
                };
                params.push(Param {
                    name: pname,
                    name_range: token.range,
                    annotation,
                    default,
                });
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen);
        }
        let params_range = TextRange::new(params_start, self.prev_end.max(params_start));
        let returns = if self.eat(TokenKind::Arrow) {
            Some(self.parse_expr())
        } else {
            None
        };
        let body = self.parse_block();
        Stmt {
            kind: StmtKind::FunctionDef(FunctionDef {
                name,
                name_range,
                decorators,
                params,
                params_range,
                returns,
                body,
            }),
            range: self.finish_range(start),
        }
    }

    fn parse_class(&mut self, start: TextSize, decorators: Vec<Expr>) -> Stmt {
        self.bump(); // class
        let (name, name_range) = self.expect_name();
        let mut bases = Vec::new();
        if self.eat(TokenKind::LParen) {
            while !self.at(TokenKind::RParen)
                && !self.at(TokenKind::Newline)
                && !self.at(TokenKind::Eof)
            {
                bases.push(self.parse_expr());
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen);
        }
        let body = self.parse_block();
        Stmt {
            kind: StmtKind::ClassDef(ClassDef {
                name,
                name_range,
                decorators,
                bases,
                body,
            }),
            range: self.finish_range(start),
        }
    }

    fn parse_return(&mut self, start: TextSize) -> Stmt {
        self.bump(); // return
        let value = if matches!(
            self.kind(),
            TokenKind::Newline | TokenKind::Eof | TokenKind::Dedent
        ) {
            None
        } else {
            Some(self.parse_expr_or_tuple())
        };
        self.expect_line_end();
        Stmt {
            kind: StmtKind::Return { value },
            range: self.finish_range(start),
        }
    }

    fn parse_dotted_name(&mut self) -> DottedName {
        let start = self.current().range.start();
        let mut parts = Vec::new();
        loop {
            if self.at(TokenKind::Ident) {
                let token = self.bump();
                parts.push(self.intern_token(token));
            } else {
                self.error_here(
                    format!("expected module name, found {}", self.kind().describe()),
                    ParseErrorCode::ExpectedIdentifier,
                );
                break;
            }
            if !self.eat(TokenKind::Dot) {
                break;
            }
        }
        DottedName {
            parts,
            range: self.finish_range(start),
        }
    }

    fn parse_import(&mut self, start: TextSize) -> Stmt {
        self.bump(); // import
        let module = self.parse_dotted_name();
        let alias = if self.eat(TokenKind::AsKw) {
            if self.at(TokenKind::Ident) {
                let token = self.bump();
                Some((self.intern_token(token), token.range))
            } else {
                self.error_here(
                    "expected alias name after 'as'".to_string(),
                    ParseErrorCode::ExpectedIdentifier,
                );
                None
            }
        } else {
            None
        };
        self.expect_line_end();
        Stmt {
            kind: StmtKind::Import(Import { module, alias }),
            range: self.finish_range(start),
        }
    }

    fn parse_import_from(&mut self, start: TextSize) -> Stmt {
        self.bump(); // from
        let module = self.parse_dotted_name();
        self.expect(TokenKind::ImportKw);
        let mut names = Vec::new();
        let parenthesized = self.eat(TokenKind::LParen);
        loop {
            match self.kind() {
                TokenKind::Ident => {
                    let token = self.bump();
                    let name = self.intern_token(token);
                    let alias = if self.eat(TokenKind::AsKw) {
                        if self.at(TokenKind::Ident) {
                            let atok = self.bump();
                            Some((self.intern_token(atok), atok.range))
                        } else {
                            self.error_here(
                                "expected alias name after 'as'".to_string(),
                                ParseErrorCode::ExpectedIdentifier,
                            );
                            None
                        }
                    } else {
                        None
                    };
                    names.push(ImportAlias {
                        name,
                        name_range: token.range,
                        alias,
                    });
                }
                TokenKind::Star => {
                    let token = self.bump();
                    names.push(ImportAlias {
                        name: self.interner.intern("*"),
                        name_range: token.range,
                        alias: None,
                    });
                }
                _ => {
                    self.error_here(
                        format!("expected import name, found {}", self.kind().describe()),
                        ParseErrorCode::ExpectedIdentifier,
                    );
                    break;
                }
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        if parenthesized {
            self.expect(TokenKind::RParen);
        }
        self.expect_line_end();
        Stmt {
            kind: StmtKind::ImportFrom(ImportFrom { module, names }),
            range: self.finish_range(start),
        }
    }

    fn parse_if(&mut self, start: TextSize) -> Stmt {
        self.bump(); // if / elif
        let test = self.parse_expr();
        let body = self.parse_block();
        let orelse = match self.kind() {
            TokenKind::ElifKw => {
                let elif_start = self.current().range.start();
                vec![self.parse_if(elif_start)]
            }
            TokenKind::ElseKw => {
                self.bump();
                self.parse_block()
            }
            _ => Vec::new(),
        };
        Stmt {
            kind: StmtKind::If { test, body, orelse },
            range: self.finish_range(start),
        }
    }

    fn parse_while(&mut self, start: TextSize) -> Stmt {
        self.bump();
        let test = self.parse_expr();
        let body = self.parse_block();
        Stmt {
            kind: StmtKind::While { test, body },
            range: self.finish_range(start),
        }
    }

    fn parse_for(&mut self, start: TextSize) -> Stmt {
        self.bump();
        let target = self.parse_expr_or_tuple();
        self.expect(TokenKind::InKw);
        let iter = self.parse_expr_or_tuple();
        let body = self.parse_block();
        Stmt {
            kind: StmtKind::For { target, iter, body },
            range: self.finish_range(start),
        }
    }

    fn parse_expr_stmt(&mut self, start: TextSize) -> Stmt {
        let target = self.parse_expr_or_tuple();
        let kind = if self.eat(TokenKind::Colon) {
            let annotation = self.parse_expr();
            let value = if self.eat(TokenKind::Eq) {
                Some(self.parse_expr_or_tuple())
            } else {
                None
            };
            self.check_assign_target(&target);
            StmtKind::Assign {
                target,
                annotation: Some(annotation),
                value,
            }
        } else if self.eat(TokenKind::Eq) {
            let value = self.parse_expr_or_tuple();
            self.check_assign_target(&target);
            StmtKind::Assign {
                target,
                annotation: None,
                value: Some(value),
            }
        } else {
            StmtKind::Expr { value: target }
        };
        self.expect_line_end();
        Stmt {
            kind,
            range: self.finish_range(start),
        }
    }

    fn check_assign_target(&mut self, target: &Expr) {
        let valid = match &target.kind {
            ExprKind::Name(_) | ExprKind::Attribute { .. } | ExprKind::Subscript { .. } => true,
            ExprKind::Tuple(items) => items
                .iter()
                .all(|item| matches!(item.kind, ExprKind::Name(_))),
            ExprKind::Error => true, // already reported
            _ => false,
        };
        if !valid {
            self.errors.push(ParseError::new(
                "invalid assignment target".to_string(),
                target.range,
                ParseErrorCode::InvalidAssignmentTarget,
            ));
        }
    }

    fn expect_name(&mut self) -> (Name, TextRange) {
        if self.at(TokenKind::Ident) {
            let token = self.bump();
            (self.intern_token(token), token.range)
        } else {
            self.error_here(
                format!("expected name, found {}", self.kind().describe()),
                ParseErrorCode::ExpectedIdentifier,
            );
            (self.interner.intern(""), self.current().range)
        }
    }

    fn expect_line_end(&mut self) {
        match self.kind() {
            TokenKind::Newline => {
                self.bump();
            }
            TokenKind::Eof | TokenKind::Dedent => {}
            TokenKind::Semicolon => {
                // Tolerated separator; the rest of the line parses as
                // further statements only in CPython, here we just skip.
                self.recover_to_line_end();
            }
            _ => {
                self.error_here(
                    format!("expected end of line, found {}", self.kind().describe()),
                    ParseErrorCode::UnexpectedToken,
                );
                self.recover_to_line_end();
            }
        }
    }

    /// Parse `: NEWLINE INDENT stmts DEDENT`, or an inline suite after the
    /// colon. Missing structure degrades to an empty body.
    fn parse_block(&mut self) -> Vec<Stmt> {
        if !self.expect(TokenKind::Colon) {
            self.recover_to_line_end();
            return Vec::new();
        }
        if !self.eat(TokenKind::Newline) {
            // Inline suite: `if x: pass`
            return vec![self.parse_stmt()];
        }
        if !self.eat(TokenKind::Indent) {
            self.error_here(
                "expected an indented block".to_string(),
                ParseErrorCode::ExpectedIndentedBlock,
            );
            return Vec::new();
        }
        let mut body = Vec::new();
        loop {
            match self.kind() {
                TokenKind::Dedent => {
                    self.bump();
                    break;
                }
                TokenKind::Eof => break,
                TokenKind::Newline => {
                    self.bump();
                }
                TokenKind::Error => {
                    self.error_here(
                        "unterminated or invalid token".to_string(),
                        ParseErrorCode::UnterminatedLiteral,
                    );
                    self.bump();
                }
                _ => {
                    let before = self.pos;
                    body.push(self.parse_stmt());
                    if self.pos == before {
                        self.bump();
                    }
                }
            }
        }
        body
    }

    // ==================== expressions ====================

    fn parse_expr_or_tuple(&mut self) -> Expr {
        let start = self.current().range.start();
        let first = self.parse_expr();
        if !self.at(TokenKind::Comma) {
            return first;
        }
        let mut items = vec![first];
        while self.eat(TokenKind::Comma) {
            if matches!(
                self.kind(),
                TokenKind::Newline
                    | TokenKind::Eof
                    | TokenKind::Dedent
                    | TokenKind::Eq
                    | TokenKind::Colon
                    | TokenKind::RParen
                    | TokenKind::RBracket
            ) {
                break; // trailing comma
            }
            items.push(self.parse_expr());
        }
        let range = self.finish_range(start);
        self.mk_expr(ExprKind::Tuple(items), range)
    }

    fn parse_expr(&mut self) -> Expr {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Expr {
        let start = self.current().range.start();
        let mut left = self.parse_and();
        while self.eat(TokenKind::OrKw) {
            let right = self.parse_and();
            let range = self.finish_range(start);
            left = self.mk_expr(
                ExprKind::BoolOp {
                    op: BoolOpKind::Or,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                range,
            );
        }
        left
    }

    fn parse_and(&mut self) -> Expr {
        let start = self.current().range.start();
        let mut left = self.parse_not();
        while self.eat(TokenKind::AndKw) {
            let right = self.parse_not();
            let range = self.finish_range(start);
            left = self.mk_expr(
                ExprKind::BoolOp {
                    op: BoolOpKind::And,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                range,
            );
        }
        left
    }

    fn parse_not(&mut self) -> Expr {
        let start = self.current().range.start();
        if self.eat(TokenKind::NotKw) {
            let operand = self.parse_not();
            let range = self.finish_range(start);
            self.mk_expr(
                ExprKind::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                range,
            )
        } else {
            self.parse_comparison()
        }
    }

    fn parse_comparison(&mut self) -> Expr {
        let start = self.current().range.start();
        let mut left = self.parse_bitor();
        loop {
            let op = match self.kind() {
                TokenKind::EqEq => CmpOp::Eq,
                TokenKind::BangEq => CmpOp::NotEq,
                TokenKind::Lt => CmpOp::Lt,
                TokenKind::LtEq => CmpOp::LtEq,
                TokenKind::Gt => CmpOp::Gt,
                TokenKind::GtEq => CmpOp::GtEq,
                TokenKind::InKw => CmpOp::In,
                TokenKind::NotKw if self.nth_kind(1) == TokenKind::InKw => CmpOp::NotIn,
                _ => break,
            };
            self.bump();
            if op == CmpOp::NotIn {
                self.bump(); // in
            }
            let right = self.parse_bitor();
            let range = self.finish_range(start);
            left = self.mk_expr(
                ExprKind::Compare {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                range,
            );
        }
        left
    }

    fn parse_bitor(&mut self) -> Expr {
        let start = self.current().range.start();
        let mut left = self.parse_arith();
        while self.eat(TokenKind::Pipe) {
            let right = self.parse_arith();
            let range = self.finish_range(start);
            left = self.mk_expr(
                ExprKind::Binary {
                    op: BinOp::BitOr,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                range,
            );
        }
        left
    }

    fn parse_arith(&mut self) -> Expr {
        let start = self.current().range.start();
        let mut left = self.parse_term();
        loop {
            let op = match self.kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.bump();
            let right = self.parse_term();
            let range = self.finish_range(start);
            left = self.mk_expr(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                range,
            );
        }
        left
    }

    fn parse_term(&mut self) -> Expr {
        let start = self.current().range.start();
        let mut left = self.parse_factor();
        loop {
            let op = match self.kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.bump();
            let right = self.parse_factor();
            let range = self.finish_range(start);
            left = self.mk_expr(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                range,
            );
        }
        left
    }

    fn parse_factor(&mut self) -> Expr {
        let start = self.current().range.start();
        let op = match self.kind() {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Plus => Some(UnaryOp::Pos),
            _ => None,
        };
        if let Some(op) = op {
            self.bump();
            let operand = self.parse_factor();
            let range = self.finish_range(start);
            self.mk_expr(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                range,
            )
        } else {
            self.parse_power()
        }
    }

    fn parse_power(&mut self) -> Expr {
        let start = self.current().range.start();
        let base = self.parse_postfix_expr();
        if self.eat(TokenKind::StarStar) {
            let exp = self.parse_factor();
            let range = self.finish_range(start);
            self.mk_expr(
                ExprKind::Binary {
                    op: BinOp::Pow,
                    left: Box::new(base),
                    right: Box::new(exp),
                },
                range,
            )
        } else {
            base
        }
    }

    fn parse_postfix_expr(&mut self) -> Expr {
        let start = self.current().range.start();
        let mut expr = self.parse_atom();
        loop {
            match self.kind() {
                TokenKind::LParen => {
                    self.bump();
                    let args = self.parse_args();
                    self.expect(TokenKind::RParen);
                    let range = self.finish_range(start);
                    expr = self.mk_expr(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        range,
                    );
                }
                TokenKind::Dot => {
                    self.bump();
                    let (attr, attr_range) = self.expect_name();
                    let range = self.finish_range(start);
                    expr = self.mk_expr(
                        ExprKind::Attribute {
                            value: Box::new(expr),
                            attr,
                            attr_range,
                        },
                        range,
                    );
                }
                TokenKind::LBracket => {
                    self.bump();
                    let index = self.parse_subscript_index();
                    self.expect(TokenKind::RBracket);
                    let range = self.finish_range(start);
                    expr = self.mk_expr(
                        ExprKind::Subscript {
                            value: Box::new(expr),
                            index: Box::new(index),
                        },
                        range,
                    );
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_subscript_index(&mut self) -> Expr {
        let start = self.current().range.start();
        let first = self.parse_expr();
        if !self.at(TokenKind::Comma) {
            return first;
        }
        let mut items = vec![first];
        while self.eat(TokenKind::Comma) {
            if self.at(TokenKind::RBracket) {
                break;
            }
            items.push(self.parse_expr());
        }
        let range = self.finish_range(start);
        self.mk_expr(ExprKind::Tuple(items), range)
    }

    fn parse_args(&mut self) -> Vec<Arg> {
        let mut args = Vec::new();
        while !matches!(
            self.kind(),
            TokenKind::RParen | TokenKind::Newline | TokenKind::Eof
        ) {
            let name = if self.at(TokenKind::Ident) && self.nth_kind(1) == TokenKind::Eq {
                let token = self.bump();
                self.bump(); // =
                Some((self.intern_token(token), token.range))
            } else {
                None
            };
            // `*expr` / `**expr` spreads are accepted but the star carries
            // no extra semantics in this subset.
            while self.at(TokenKind::Star) || self.at(TokenKind::StarStar) {
                self.bump();
            }
            let value = self.parse_expr();
            args.push(Arg { name, value });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        args
    }

    fn parse_atom(&mut self) -> Expr {
        let token = self.current();
        match token.kind {
            TokenKind::Ident => {
                self.bump();
                let name = self.intern_token(token);
                self.mk_expr(ExprKind::Name(name), token.range)
            }
            TokenKind::Int => {
                self.bump();
                let text = self.token_text(token).replace('_', "");
                let value = text.parse::<i64>().unwrap_or_else(|_| {
                    self.errors.push(ParseError::new(
                        "integer literal out of range".to_string(),
                        token.range,
                        ParseErrorCode::UnterminatedLiteral,
                    ));
                    0
                });
                self.mk_expr(ExprKind::IntLit(value), token.range)
            }
            TokenKind::Float => {
                self.bump();
                let text = self.token_text(token).replace('_', "");
                let value = text.parse::<f64>().unwrap_or(0.0);
                self.mk_expr(ExprKind::FloatLit(value), token.range)
            }
            TokenKind::Str => {
                self.bump();
                let content = strip_quotes(self.token_text(token));
                let name = self.interner.intern(content);
                self.mk_expr(ExprKind::StrLit(name), token.range)
            }
            TokenKind::TrueKw => {
                self.bump();
                self.mk_expr(ExprKind::BoolLit(true), token.range)
            }
            TokenKind::FalseKw => {
                self.bump();
                self.mk_expr(ExprKind::BoolLit(false), token.range)
            }
            TokenKind::NoneKw => {
                self.bump();
                self.mk_expr(ExprKind::NoneLit, token.range)
            }
            TokenKind::LParen => {
                let start = token.range.start();
                self.bump();
                if self.eat(TokenKind::RParen) {
                    let range = self.finish_range(start);
                    return self.mk_expr(ExprKind::Tuple(Vec::new()), range);
                }
                let mut inner = self.parse_expr_or_tuple();
                self.expect(TokenKind::RParen);
                inner.range = self.finish_range(start);
                inner
            }
            TokenKind::LBracket => {
                let start = token.range.start();
                self.bump();
                let mut items = Vec::new();
                while !matches!(
                    self.kind(),
                    TokenKind::RBracket | TokenKind::Newline | TokenKind::Eof
                ) {
                    items.push(self.parse_expr());
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RBracket);
                let range = self.finish_range(start);
                self.mk_expr(ExprKind::List(items), range)
            }
            _ => self.error_expr(),
        }
    }
}

/// Strip matching quotes from a string literal, triple quotes included.
/// Escape sequences are kept raw; the analyzer only needs the text for
/// docstrings and display.
fn strip_quotes(text: &str) -> &str {
    for quotes in ["\"\"\"", "'''"] {
        if text.len() >= 6 && text.starts_with(quotes) && text.ends_with(quotes) {
            return &text[3..text.len() - 3];
        }
    }
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(text: &str) -> Module {
        let result = parse(text);
        assert!(result.errors.is_empty(), "unexpected errors: {:?}", result.errors);
        result.module
    }

    #[test]
    fn test_function_def() {
        let module = parse_ok("def f(x: int) -> int:\n    return x\n");
        assert_eq!(module.body.len(), 1);
        let StmtKind::FunctionDef(def) = &module.body[0].kind else {
            panic!("expected function def");
        };
        assert_eq!(def.name.as_ref(), "f");
        assert_eq!(def.params.len(), 1);
        assert_eq!(def.params[0].name.as_ref(), "x");
        assert!(def.params[0].annotation.is_some());
        assert!(def.returns.is_some());
        assert_eq!(def.body.len(), 1);
    }

    #[test]
    fn test_decorated_function() {
        let module = parse_ok("@overload\ndef f(x: int) -> int:\n    pass\n");
        let StmtKind::FunctionDef(def) = &module.body[0].kind else {
            panic!("expected function def");
        };
        assert_eq!(def.decorators.len(), 1);
        assert!(matches!(
            &def.decorators[0].kind,
            ExprKind::Name(n) if n.as_ref() == "overload"
        ));
    }

    #[test]
    fn test_class_with_base() {
        let module = parse_ok("class Dog(Animal):\n    sound: str = 'woof'\n");
        let StmtKind::ClassDef(def) = &module.body[0].kind else {
            panic!("expected class def");
        };
        assert_eq!(def.name.as_ref(), "Dog");
        assert_eq!(def.bases.len(), 1);
        assert_eq!(def.body.len(), 1);
    }

    #[test]
    fn test_imports() {
        let module = parse_ok("import os.path as p\nfrom typing import overload, Optional\n");
        assert_eq!(module.body.len(), 2);
        let StmtKind::Import(import) = &module.body[0].kind else {
            panic!("expected import");
        };
        assert_eq!(import.module.joined(), "os.path");
        assert_eq!(import.alias.as_ref().unwrap().0.as_ref(), "p");
        let StmtKind::ImportFrom(from) = &module.body[1].kind else {
            panic!("expected from-import");
        };
        assert_eq!(from.names.len(), 2);
    }

    #[test]
    fn test_annotated_assignment() {
        let module = parse_ok("x: list[int] = [1, 2]\n");
        let StmtKind::Assign {
            annotation, value, ..
        } = &module.body[0].kind
        else {
            panic!("expected assignment");
        };
        assert!(annotation.is_some());
        assert!(value.is_some());
    }

    #[test]
    fn test_keyword_call_args() {
        let module = parse_ok("f(1, y=2)\n");
        let StmtKind::Expr { value } = &module.body[0].kind else {
            panic!("expected expression statement");
        };
        let ExprKind::Call { args, .. } = &value.kind else {
            panic!("expected call");
        };
        assert_eq!(args.len(), 2);
        assert!(args[0].name.is_none());
        assert_eq!(args[1].name.as_ref().unwrap().0.as_ref(), "y");
    }

    #[test]
    fn test_precedence() {
        let module = parse_ok("x = 1 + 2 * 3\n");
        let StmtKind::Assign { value, .. } = &module.body[0].kind else {
            panic!("expected assignment");
        };
        let ExprKind::Binary { op, right, .. } = &value.as_ref().unwrap().kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinOp::Add);
        assert!(matches!(right.kind, ExprKind::Binary { op: BinOp::Mul, .. }));
    }

    #[test]
    fn test_union_annotation() {
        let module = parse_ok("def f(x: int | None) -> int:\n    return 0\n");
        let StmtKind::FunctionDef(def) = &module.body[0].kind else {
            panic!("expected function def");
        };
        let ann = def.params[0].annotation.as_ref().unwrap();
        assert!(matches!(
            ann.kind,
            ExprKind::Binary { op: BinOp::BitOr, .. }
        ));
    }

    #[test]
    fn test_recovery_keeps_later_statements() {
        let result = parse("def broken(:\nx = 1\n");
        assert!(!result.errors.is_empty());
        let has_assign = result
            .module
            .body
            .iter()
            .any(|s| matches!(s.kind, StmtKind::Assign { .. }));
        assert!(has_assign, "statement after the error should survive");
    }

    #[test]
    fn test_if_elif_else() {
        let module = parse_ok("if a:\n    pass\nelif b:\n    pass\nelse:\n    pass\n");
        let StmtKind::If { orelse, .. } = &module.body[0].kind else {
            panic!("expected if");
        };
        assert_eq!(orelse.len(), 1);
        assert!(matches!(orelse[0].kind, StmtKind::If { .. }));
    }

    #[test]
    fn test_empty_input() {
        let module = parse_ok("");
        assert!(module.body.is_empty());
    }
}
