//! Parser: logos lexer, INDENT/DEDENT synthesis, recursive-descent parser.
//!
//! The entry point is [`parse`], which never fails: invalid input yields a
//! partial [`ast::Module`] plus [`ParseError`]s.

pub mod ast;
mod errors;
mod lexer;
#[allow(clippy::module_inception)]
mod parser;

pub use errors::{ParseError, ParseErrorCode};
pub use lexer::{Token, TokenKind, tokenize};
pub use parser::{ParseResult, parse};
