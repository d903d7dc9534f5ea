//! Configuration type definitions
//!
//! These types describe where the Corefile lives and which part of it the
//! service edits.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the l2dns service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Namespace of the document holding the Corefile
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Name of the document holding the Corefile
    #[serde(default = "default_config_map")]
    pub config_map: String,

    /// Address the API listens on
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Label of the server block whose `hosts` plugin is edited
    #[serde(default = "default_inter_domain_dom_port")]
    pub inter_domain_dom_port: String,

    /// Directory of the on-disk document store
    #[serde(default)]
    pub store_dir: Option<PathBuf>,
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_config_map() -> String {
    "l2sm-coredns-config".to_string()
}

fn default_listen() -> String {
    "0.0.0.0:8081".to_string()
}

fn default_inter_domain_dom_port() -> String {
    ".:53".to_string()
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            config_map: default_config_map(),
            listen: default_listen(),
            inter_domain_dom_port: default_inter_domain_dom_port(),
            store_dir: None,
        }
    }
}

impl ManagerConfig {
    /// Store directory, falling back to the platform data directory
    pub fn store_dir(&self) -> PathBuf {
        self.store_dir
            .clone()
            .unwrap_or_else(crate::store::FileStore::default_path)
    }

    /// Server block whose `hosts` plugin is edited
    pub fn hosts_target(&self) -> HostsTarget {
        HostsTarget::new([self.inter_domain_dom_port.clone()])
    }
}

/// Server block holding the `hosts` plugin that is edited
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostsTarget {
    pub dom_ports: Vec<String>,
}

impl HostsTarget {
    pub fn new<I, S>(dom_ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dom_ports: dom_ports.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for HostsTarget {
    fn default() -> Self {
        ManagerConfig::default().hosts_target()
    }
}

/// Normalize a listen address: `:8081` and `8081` become `0.0.0.0:8081`.
pub fn normalize_listen(listen: &str) -> String {
    if listen.starts_with(':') {
        format!("0.0.0.0{}", listen)
    } else if !listen.is_empty() && listen.chars().all(|c| c.is_ascii_digit()) {
        format!("0.0.0.0:{}", listen)
    } else {
        listen.to_string()
    }
}
