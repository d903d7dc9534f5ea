//! Corefile parser and editor
//!
//! This crate reads CoreDNS Corefiles into a mutable tree, looks nodes up
//! exactly or by wildcard pattern, merges new server blocks into existing
//! ones, edits the entries of the `hosts` plugin, and writes the tree back
//! out as text.
//!
//! # Example
//!
//! ```rust,ignore
//! use l2dns_corefile::{parse, HostEntries, HOSTS_PLUGIN};
//!
//! let mut corefile = parse(".:53 {\n    hosts {\n    }\n}\n")?;
//! let hosts = corefile
//!     .get_server_mut(&[".:53"])
//!     .and_then(|s| s.get_plugin_mut(HOSTS_PLUGIN))
//!     .unwrap();
//!
//! let entries: HostEntries = [("1.2.3.4", ["foo.com"])].into_iter().collect();
//! hosts.add_host_entries(&entries)?;
//!
//! println!("{}", corefile);
//! ```

pub mod diagnostic;
pub mod format;
pub mod hosts;
pub mod matcher;
pub mod parser;

pub use format::escape_arg;
pub use hosts::{is_valid_domain, HostEntries, HostsError, HOSTS_PLUGIN};
pub use matcher::{match_elements, PatternMatch};
pub use parser::{
    parse, tokenize, Corefile, LexError, ParseError, Plugin, PluginOption, Server, Token,
};
