//! Logos-based lexer for the Python-like source language.
//!
//! Fast tokenization using the logos crate, followed by a logical pass
//! that synthesizes INDENT/DEDENT/NEWLINE tokens the way the Python
//! grammar expects: newlines inside brackets are implicit continuations,
//! blank and comment-only lines produce no logical tokens, and dedents
//! unwind the indentation stack.

use logos::Logos;
use text_size::{TextRange, TextSize};

/// A token with its kind and byte range. Text is sliced from the source
/// on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: TextRange,
}

impl Token {
    pub fn new(kind: TokenKind, range: TextRange) -> Self {
        Self { kind, range }
    }

    fn zero_width(kind: TokenKind, offset: TextSize) -> Self {
        Self::new(kind, TextRange::empty(offset))
    }
}

/// Token kinds. Variants without a logos pattern (INDENT, DEDENT, EOF,
/// ERROR) are synthesized by [`tokenize`].
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // =========================================================================
    // TRIVIA (stripped by the logical pass)
    // =========================================================================
    #[regex(r"[ \t]+")]
    Whitespace,

    #[regex(r"#[^\n]*")]
    Comment,

    #[regex(r"\\\r?\n")]
    LineJoin,

    #[regex(r"\r?\n")]
    Newline,

    // =========================================================================
    // LITERALS
    // =========================================================================
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    #[regex(r"[0-9][0-9_]*")]
    Int,

    #[regex(r"[0-9][0-9_]*\.[0-9_]*([eE][+-]?[0-9]+)?")]
    Float,

    #[regex(r#""""([^"]|"[^"]|""[^"])*""""#)]
    #[regex(r"'''([^']|'[^']|''[^'])*'''")]
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    #[regex(r"'([^'\\\n]|\\.)*'")]
    Str,

    // =========================================================================
    // KEYWORDS
    // =========================================================================
    #[token("def")]
    DefKw,
    #[token("class")]
    ClassKw,
    #[token("return")]
    ReturnKw,
    #[token("import")]
    ImportKw,
    #[token("from")]
    FromKw,
    #[token("as")]
    AsKw,
    #[token("if")]
    IfKw,
    #[token("elif")]
    ElifKw,
    #[token("else")]
    ElseKw,
    #[token("while")]
    WhileKw,
    #[token("for")]
    ForKw,
    #[token("in")]
    InKw,
    #[token("not")]
    NotKw,
    #[token("and")]
    AndKw,
    #[token("or")]
    OrKw,
    #[token("pass")]
    PassKw,
    #[token("None")]
    NoneKw,
    #[token("True")]
    TrueKw,
    #[token("False")]
    FalseKw,

    // =========================================================================
    // MULTI-CHARACTER PUNCTUATION (must come before single-char)
    // =========================================================================
    #[token("->")]
    Arrow,
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("**")]
    StarStar,

    // =========================================================================
    // SINGLE-CHARACTER PUNCTUATION
    // =========================================================================
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token(";")]
    Semicolon,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("@")]
    At,
    #[token("|")]
    Pipe,

    // =========================================================================
    // SYNTHESIZED
    // =========================================================================
    Indent,
    Dedent,
    Eof,
    Error,
}

impl TokenKind {
    /// Human-readable description for error messages.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Ident => "identifier",
            TokenKind::Int | TokenKind::Float => "number",
            TokenKind::Str => "string",
            TokenKind::Newline => "end of line",
            TokenKind::Indent => "indented block",
            TokenKind::Dedent => "end of block",
            TokenKind::Eof => "end of file",
            TokenKind::Colon => "':'",
            TokenKind::Comma => "','",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Eq => "'='",
            TokenKind::Arrow => "'->'",
            _ => "token",
        }
    }
}

/// Tokenize source text into logical tokens.
///
/// Trivia (whitespace, comments, line joins) is stripped. Newlines inside
/// brackets are suppressed. INDENT/DEDENT pairs are synthesized from
/// leading whitespace with tabs advancing to the next 8-column stop.
/// Unbalanced dedents are tolerated (best-effort recovery); the final
/// token is always `Eof`.
pub fn tokenize(text: &str) -> Vec<Token> {
    let raw = raw_tokens(text);
    let mut out: Vec<Token> = Vec::with_capacity(raw.len() + 8);
    let mut indents: Vec<u32> = vec![0];
    let mut bracket_depth: usize = 0;
    let mut line_has_content = false;
    let mut pending_indent: u32 = 0;

    for token in raw {
        match token.kind {
            TokenKind::Whitespace => {
                if !line_has_content {
                    pending_indent += indent_width(&text[token.range], pending_indent);
                }
            }
            TokenKind::Comment | TokenKind::LineJoin => {}
            TokenKind::Newline => {
                if bracket_depth > 0 {
                    continue;
                }
                if line_has_content {
                    out.push(token);
                    line_has_content = false;
                }
                pending_indent = 0;
            }
            _ => {
                if !line_has_content && bracket_depth == 0 {
                    balance_indent(&mut out, &mut indents, pending_indent, token.range.start());
                }
                line_has_content = true;
                match token.kind {
                    TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => {
                        bracket_depth += 1;
                    }
                    TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                        bracket_depth = bracket_depth.saturating_sub(1);
                    }
                    _ => {}
                }
                out.push(token);
            }
        }
    }

    let end = TextSize::of(text);
    if line_has_content {
        out.push(Token::zero_width(TokenKind::Newline, end));
    }
    while indents.len() > 1 {
        indents.pop();
        out.push(Token::zero_width(TokenKind::Dedent, end));
    }
    out.push(Token::zero_width(TokenKind::Eof, end));
    out
}

/// Raw logos pass: every token, trivia included. Lex failures (e.g.
/// unterminated strings, stray bytes) become `Error` tokens.
fn raw_tokens(text: &str) -> Vec<Token> {
    let mut lexer = TokenKind::lexer(text);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let range = TextRange::new(TextSize::new(span.start as u32), TextSize::new(span.end as u32));
        let kind = result.unwrap_or(TokenKind::Error);
        tokens.push(Token::new(kind, range));
    }
    tokens
}

/// Width of a run of leading whitespace, starting from `current` columns.
fn indent_width(ws: &str, current: u32) -> u32 {
    let mut col = current;
    for ch in ws.chars() {
        match ch {
            '\t' => col = (col / 8 + 1) * 8,
            _ => col += 1,
        }
    }
    col - current
}

fn balance_indent(out: &mut Vec<Token>, indents: &mut Vec<u32>, width: u32, offset: TextSize) {
    let current = *indents.last().unwrap_or(&0);
    if width > current {
        indents.push(width);
        out.push(Token::zero_width(TokenKind::Indent, offset));
    } else if width < current {
        while indents.len() > 1 && *indents.last().unwrap() > width {
            indents.pop();
            out.push(Token::zero_width(TokenKind::Dedent, offset));
        }
        // Inconsistent partial dedents realign to the surviving level.
    }
}
