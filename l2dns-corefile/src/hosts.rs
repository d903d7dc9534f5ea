//! Editing of `hosts` plugin entries
//!
//! Inside a `hosts` block every option whose name is an IP address maps that
//! address to the domains in its arguments:
//!
//! ```text
//! hosts {
//!     10.0.0.1 pod-a.net.scope.l2sm
//!     10.0.0.2 pod-b.net.scope.l2sm other.l2sm
//!     fallthrough
//! }
//! ```
//!
//! Options that are not entries (`fallthrough`, `ttl 60`, `reload 1m`, ...)
//! are kept as they are and written after the entries.

use crate::parser::ast::{Plugin, PluginOption};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::net::IpAddr;
use thiserror::Error;

/// Name of the plugin holding host entries
pub const HOSTS_PLUGIN: &str = "hosts";

/// Host editing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostsError {
    #[error("plugin '{name}' is not 'hosts'")]
    NotHostsPlugin { name: String },

    #[error("invalid IP address: {ip:?}")]
    InvalidIp { ip: String },

    #[error("invalid domain name: {domain:?}")]
    InvalidDomain { domain: String },
}

type HostsResult<T> = Result<T, HostsError>;

/// Ordered association of IP address -> domains.
///
/// Iteration, serialization and the option order written back into the
/// Corefile all follow insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostEntries {
    entries: Vec<(String, Vec<String>)>,
}

impl HostEntries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, ip: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k == ip)
            .map(|(_, v)| v.as_slice())
    }

    pub fn contains(&self, ip: &str) -> bool {
        self.get(ip).is_some()
    }

    /// Domains of `ip`, inserting an empty list at the end if absent.
    pub fn entry(&mut self, ip: &str) -> &mut Vec<String> {
        let idx = match self.entries.iter().position(|(k, _)| k == ip) {
            Some(idx) => idx,
            None => {
                self.entries.push((ip.to_string(), Vec::new()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].1
    }

    /// Append domains to `ip`'s list.
    pub fn insert<I, S>(&mut self, ip: &str, domains: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entry(ip).extend(domains.into_iter().map(Into::into));
    }

    pub fn remove(&mut self, ip: &str) -> Option<Vec<String>> {
        let idx = self.entries.iter().position(|(k, _)| k == ip)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn ips(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Reject the first key that is not an IPv4/IPv6 address, then the
    /// first domain that cannot be written as a bare Corefile word.
    pub fn validate(&self) -> HostsResult<()> {
        if let Some(ip) = self.ips().find(|ip| ip.parse::<IpAddr>().is_err()) {
            return Err(HostsError::InvalidIp { ip: ip.to_string() });
        }
        let mut domains = self.entries.iter().flat_map(|(_, d)| d);
        match domains.find(|d| !is_valid_domain(d)) {
            Some(domain) => Err(HostsError::InvalidDomain {
                domain: domain.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for HostEntries
where
    K: AsRef<str>,
    V: IntoIterator<Item = S>,
    S: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut entries = HostEntries::new();
        for (ip, domains) in iter {
            entries.insert(ip.as_ref(), domains);
        }
        entries
    }
}

impl IntoIterator for HostEntries {
    type Item = (String, Vec<String>);
    type IntoIter = std::vec::IntoIter<(String, Vec<String>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for HostEntries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (ip, domains) in &self.entries {
            map.serialize_entry(ip, domains)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for HostEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = HostEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of IP address to a list of domains")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = HostEntries::new();
                while let Some((ip, domains)) = access.next_entry::<String, Vec<String>>()? {
                    entries.insert(&ip, domains);
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Keep the first occurrence of every domain.
fn dedup_in_order(domains: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::with_capacity(domains.len());
    domains.retain(|d| seen.insert(d.clone()));
}

/// A domain is a non-empty word with no whitespace, quotes, backslashes or
/// braces that does not open a comment.
pub fn is_valid_domain(domain: &str) -> bool {
    !domain.is_empty()
        && !domain.starts_with('#')
        && !domain
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\\' | '{' | '}'))
}

fn is_entry(option: &PluginOption) -> bool {
    option.name.parse::<IpAddr>().is_ok()
}

impl Plugin {
    fn ensure_hosts(&self) -> HostsResult<()> {
        if self.name == HOSTS_PLUGIN {
            Ok(())
        } else {
            Err(HostsError::NotHostsPlugin {
                name: self.name.clone(),
            })
        }
    }

    /// Host entries in option order. Repeated IPs are concatenated.
    ///
    /// Only options named by an IP address are entries. `fallthrough`, `ttl`
    /// and other settings are not listed.
    pub fn list_host_entries(&self) -> HostsResult<HostEntries> {
        self.ensure_hosts()?;
        let mut entries = HostEntries::new();
        for option in self.options.iter().filter(|o| is_entry(o)) {
            entries.insert(&option.name, option.args.iter().cloned());
        }
        Ok(entries)
    }

    /// Replace all host entries.
    ///
    /// This is not a full replace of the block: options whose name is not an
    /// IP address (`fallthrough`, `ttl 60`, ...) are not entries, so they are
    /// kept and written after the new entries.
    pub fn replace_host_entries(&mut self, entries: &HostEntries) -> HostsResult<()> {
        self.ensure_hosts()?;
        entries.validate()?;
        self.write_host_entries(entries);
        Ok(())
    }

    fn write_host_entries(&mut self, entries: &HostEntries) {
        let settings = self.options.drain(..).filter(|o| !is_entry(o));
        let mut options: Vec<PluginOption> = entries
            .iter()
            .map(|(ip, domains)| PluginOption::new(ip, domains.iter().cloned()))
            .collect();
        options.extend(settings);
        self.options = options;
    }

    /// Merge `updates` into the existing entries. Domains are appended to
    /// their IP and de-duplicated; IPs not present yet are added at the end.
    pub fn add_host_entries(&mut self, updates: &HostEntries) -> HostsResult<()> {
        let mut entries = self.list_host_entries()?;
        updates.validate()?;

        for (ip, domains) in updates.iter() {
            let current = entries.entry(ip);
            current.extend(domains.iter().cloned());
            dedup_in_order(current);
        }

        tracing::debug!(added = updates.len(), total = entries.len(), "Adding host entries");
        self.write_host_entries(&entries);
        Ok(())
    }

    /// Remove domains from their IPs. An IP left without domains is dropped;
    /// IPs that have no entry are ignored.
    pub fn remove_host_entries(&mut self, removals: &HostEntries) -> HostsResult<()> {
        let mut entries = self.list_host_entries()?;
        removals.validate()?;

        for (ip, domains) in removals.iter() {
            if !entries.contains(ip) {
                continue;
            }
            let current = entries.entry(ip);
            current.retain(|d| !domains.contains(d));
            if current.is_empty() {
                entries.remove(ip);
            }
        }

        tracing::debug!(removed = removals.len(), total = entries.len(), "Removing host entries");
        self.write_host_entries(&entries);
        Ok(())
    }
}
