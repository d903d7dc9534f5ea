//! Parser module for Corefiles
//!
//! This module provides the lexer, tree model, and parser.

pub mod ast;
pub mod lexer;
#[allow(clippy::module_inception)]
pub mod parser;

pub use ast::*;
pub use lexer::{tokenize, LexError, Location, Spanned, Token, TokenCursor};
pub use parser::{parse, ParseError, Parser};
