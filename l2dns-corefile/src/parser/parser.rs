//! Corefile parser
//!
//! Depth-tracking parser that converts tokens into the three-level tree.
//! Each statement is a token plus the remaining arguments on its line; the
//! number of currently open braces decides whether it becomes a server, a
//! plugin or a plugin option.

use crate::parser::ast::*;
use crate::parser::lexer::{tokenize, LexError, Location, Spanned, Token, TokenCursor};
use std::ops::Range;
use thiserror::Error;

/// Parser error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Lexer error: {0}")]
    Lex(#[from] LexError),

    #[error("Unbalanced '}}' at position {position}")]
    UnbalancedClose { position: usize },

    #[error("Unexpected end of input, {depth} block(s) still open (last opened at position {position})")]
    UnclosedBlock { depth: usize, position: usize },

    #[error("Statement at position {position} has no enclosing {expected}")]
    Orphan {
        position: usize,
        expected: &'static str,
    },
}

impl ParseError {
    /// Byte range of the source the error points at
    pub fn span(&self) -> Range<usize> {
        match self {
            ParseError::Lex(e) => e.position()..e.position() + 1,
            ParseError::UnbalancedClose { position }
            | ParseError::UnclosedBlock { position, .. }
            | ParseError::Orphan { position, .. } => *position..*position + 1,
        }
    }
}

type ParseResult<T> = Result<T, ParseError>;

/// Deepest level that is represented in the tree (server = 0, plugin = 1,
/// option = 2).
const MAX_DEPTH: usize = 2;

/// Parser state
pub struct Parser {
    tokens: Vec<Spanned<Token>>,
}

impl Parser {
    /// Create a new parser from source code
    pub fn new(source: &str) -> ParseResult<Self> {
        let tokens = tokenize(source)?;
        Ok(Self { tokens })
    }

    /// Parse the entire Corefile
    pub fn parse(&self) -> ParseResult<Corefile> {
        let mut corefile = Corefile::new();
        let mut cursor = TokenCursor::new(&self.tokens);
        // Positions of the currently open braces; its length is the depth.
        let mut open: Vec<Location> = Vec::new();

        while cursor.advance() {
            let span = cursor.current_span();
            let name = match cursor.current_token() {
                Some(Token::BlockOpen) => {
                    open.push(span);
                    continue;
                }
                Some(Token::BlockClose) => {
                    if open.pop().is_none() {
                        return Err(ParseError::UnbalancedClose {
                            position: span.start,
                        });
                    }
                    continue;
                }
                Some(tok) => match tok.as_value() {
                    Some(v) => v.to_string(),
                    None => continue,
                },
                None => break,
            };
            let args = cursor.remaining_args_on_line();
            place(&mut corefile, open.len(), name, args, span)?;
        }

        if let Some(last) = open.last() {
            return Err(ParseError::UnclosedBlock {
                depth: open.len(),
                position: last.start,
            });
        }

        Ok(corefile)
    }
}

fn place(
    corefile: &mut Corefile,
    depth: usize,
    name: String,
    args: Vec<String>,
    span: Location,
) -> ParseResult<()> {
    match depth {
        0 => {
            let mut dom_ports = Vec::with_capacity(args.len() + 1);
            dom_ports.push(name);
            dom_ports.extend(args);
            corefile.servers.push(Server {
                dom_ports,
                plugins: Vec::new(),
            });
        }
        1 => {
            let server = corefile.servers.last_mut().ok_or(ParseError::Orphan {
                position: span.start,
                expected: "server block",
            })?;
            server.plugins.push(Plugin {
                name,
                args,
                options: Vec::new(),
            });
        }
        2 => {
            let plugin = corefile
                .servers
                .last_mut()
                .and_then(|s| s.plugins.last_mut())
                .ok_or(ParseError::Orphan {
                    position: span.start,
                    expected: "plugin",
                })?;
            plugin.options.push(PluginOption { name, args });
        }
        _ => {
            tracing::warn!(
                position = span.start,
                depth,
                max_depth = MAX_DEPTH,
                "Dropping '{}': nesting deeper than plugin options is not represented",
                name
            );
        }
    }
    Ok(())
}

/// Parse a Corefile source string into its tree
pub fn parse(source: &str) -> ParseResult<Corefile> {
    let parser = Parser::new(source)?;
    parser.parse()
}
