//! Entry keys for pods attached to a network

use crate::error::{Error, Result};
use l2dns_corefile::is_valid_domain;
use serde::{Deserialize, Serialize};

/// Suffix appended to every generated entry key
pub const KEY_SUFFIX: &str = "l2sm";

/// A pod's attachment to a network within a scope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsEntry {
    pub pod_name: String,
    pub network: String,
    pub scope: String,
}

impl DnsEntry {
    pub fn new(
        pod_name: impl Into<String>,
        network: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            pod_name: pod_name.into(),
            network: network.into(),
            scope: scope.into(),
        }
    }

    /// Domain name for this entry: `<pod>.<network>.<scope>.l2sm`
    pub fn generate_key(&self) -> Result<String> {
        if self.pod_name.is_empty() || self.network.is_empty() || self.scope.is_empty() {
            return Err(Error::Validation(format!(
                "input entry has fields missing, all fields must be filled, received: {:?}",
                self
            )));
        }
        let key = format!(
            "{}.{}.{}.{}",
            self.pod_name, self.network, self.scope, KEY_SUFFIX
        );
        if !is_valid_domain(&key) {
            return Err(Error::Validation(format!("invalid domain name: {:?}", key)));
        }
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_key() {
        let entry = DnsEntry::new("ping", "blue", "inter");
        assert_eq!(entry.generate_key().unwrap(), "ping.blue.inter.l2sm");
    }

    #[test]
    fn test_generate_key_missing_field() {
        for entry in [
            DnsEntry::new("", "blue", "inter"),
            DnsEntry::new("ping", "", "inter"),
            DnsEntry::new("ping", "blue", ""),
        ] {
            let err = entry.generate_key().unwrap_err();
            assert!(err.is_validation());
            assert!(err.to_string().contains("fields missing"));
        }
    }

    #[test]
    fn test_generate_key_rejects_unwritable_names() {
        for entry in [
            DnsEntry::new("a.b\"c d", "blue", "inter"),
            DnsEntry::new("ping", "bl ue", "inter"),
            DnsEntry::new("ping", "blue", "in\\ter"),
            DnsEntry::new("#ping", "blue", "inter"),
            DnsEntry::new("ping", "{blue}", "inter"),
        ] {
            let err = entry.generate_key().unwrap_err();
            assert!(err.is_validation());
            assert!(err.to_string().contains("invalid domain name"), "{}", err);
        }
    }
}
