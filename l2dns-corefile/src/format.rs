//! Corefile serializer
//!
//! Renders the tree back to text through `Display`. Servers are joined by a
//! blank line, nested blocks are indented by four spaces per level, and
//! arguments are quoted whenever writing them bare would not lex back to the
//! same token.

use crate::parser::ast::{Corefile, Plugin, PluginOption, Server};
use std::borrow::Cow;
use std::fmt;

const INDENT: &str = "    ";

/// Quote `token` if it would not survive a round trip unquoted.
///
/// Tokens with whitespace, double quotes, a leading `#`, lone braces and the
/// empty token are wrapped in double quotes. Inside the quotes, backslashes
/// and double quotes are escaped with a backslash. Bare tokens are written
/// as is, backslashes included.
pub fn escape_arg(token: &str) -> Cow<'_, str> {
    let needs_quotes = token.is_empty()
        || token.chars().any(|c| c.is_whitespace() || c == '"')
        || token.starts_with('#')
        || token == "{"
        || token == "}";

    if needs_quotes {
        let escaped = token.replace('\\', "\\\\").replace('"', "\\\"");
        Cow::Owned(format!("\"{}\"", escaped))
    } else {
        Cow::Borrowed(token)
    }
}

fn write_line<S: AsRef<str>>(f: &mut fmt::Formatter<'_>, name: &str, args: &[S]) -> fmt::Result {
    f.write_str(&escape_arg(name))?;
    for arg in args {
        write!(f, " {}", escape_arg(arg.as_ref()))?;
    }
    Ok(())
}

impl fmt::Display for PluginOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_line(f, &self.name, &self.args)
    }
}

impl fmt::Display for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_line(f, &self.name, &self.args)?;
        if self.options.is_empty() {
            return Ok(());
        }
        f.write_str(" {\n")?;
        for option in &self.options {
            writeln!(f, "{INDENT}{INDENT}{option}")?;
        }
        write!(f, "{INDENT}}}")
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut labels = self.dom_ports.iter();
        if let Some(first) = labels.next() {
            f.write_str(&escape_arg(first))?;
        }
        for label in labels {
            write!(f, " {}", escape_arg(label))?;
        }
        if self.plugins.is_empty() {
            return Ok(());
        }
        f.write_str(" {\n")?;
        for plugin in &self.plugins {
            writeln!(f, "{INDENT}{plugin}")?;
        }
        f.write_str("}\n")
    }
}

impl fmt::Display for Corefile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, server) in self.servers.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{server}")?;
        }
        Ok(())
    }
}
