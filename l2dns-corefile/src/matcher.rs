//! Wildcard matching of concrete tree nodes against pattern definitions
//!
//! Pattern elements:
//! - `*` matches any single element at its position
//! - `***` matches whatever remains, including nothing
//!
//! Any other element must be equal, and without `***` the lengths must agree.

use crate::parser::ast::{Plugin, PluginOption, Server};

/// Matches exactly one element
pub const WILDCARD_ONE: &str = "*";

/// Matches the remainder of the sequence
pub const WILDCARD_REST: &str = "***";

/// Compare a concrete element list against a pattern.
pub fn match_elements<P: AsRef<str>, C: AsRef<str>>(pattern: &[P], concrete: &[C]) -> bool {
    for (i, elem) in pattern.iter().map(AsRef::as_ref).enumerate() {
        match elem {
            WILDCARD_REST => return true,
            WILDCARD_ONE => continue,
            _ => {
                if concrete.get(i).map(AsRef::as_ref) != Some(elem) {
                    return false;
                }
            }
        }
    }
    pattern.len() == concrete.len()
}

/// Nodes that can be looked up in a list of pattern definitions.
pub trait PatternMatch {
    /// Whether `self` is matched by the pattern node `pattern`.
    fn matches(&self, pattern: &Self) -> bool;

    /// First definition in `defs` that matches `self`.
    fn find_match<'a>(&self, defs: &'a [Self]) -> Option<&'a Self>
    where
        Self: Sized,
    {
        defs.iter().find(|def| self.matches(def))
    }
}

impl PatternMatch for Server {
    fn matches(&self, pattern: &Self) -> bool {
        match_elements(pattern.dom_ports.as_slice(), self.dom_ports.as_slice())
    }
}

impl PatternMatch for Plugin {
    fn matches(&self, pattern: &Self) -> bool {
        pattern.name == self.name && match_elements(pattern.args.as_slice(), self.args.as_slice())
    }
}

impl PatternMatch for PluginOption {
    fn matches(&self, pattern: &Self) -> bool {
        pattern.name == self.name && match_elements(pattern.args.as_slice(), self.args.as_slice())
    }
}
