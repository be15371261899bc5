//! Syntax layer for treeql.
//!
//! This crate provides:
//! - `token`: Token kinds and token structures
//! - `lexer`: Tokenization and string literal decoding
//! - `ast`: Persistent, `Arc`-shared syntax tree
//! - `parser`: Recursive descent parser
//! - `formatter`: Canonical printing and human formatting
//! - `error`: Syntax errors

pub mod ast;
pub mod error;
pub mod formatter;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::*;
pub use error::SyntaxError;
pub use formatter::{format, format_document, print, FormatOptions, Formatter};
pub use lexer::Lexer;
pub use parser::{parse, parse_document, ParseResult};
pub use token::{Token, TokenKind};
