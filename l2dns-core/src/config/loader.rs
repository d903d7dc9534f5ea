//! Configuration loader

use crate::config::types::normalize_listen;
use crate::config::ManagerConfig;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Environment variables read by [`ConfigLoader::apply_env`]
pub const ENV_NAMESPACE: &str = "CONFIGMAP_NS";
pub const ENV_CONFIG_MAP: &str = "CONFIGMAP_NAME";
pub const ENV_SERVER_PORT: &str = "SERVER_PORT";
pub const ENV_INTER_DOMAIN_DOM_PORT: &str = "INTER_DOMAIN_DOM_PORT";
pub const ENV_STORE_DIR: &str = "L2DNS_STORE_DIR";

/// Configuration loader for various formats
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<ManagerConfig> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match ext {
            "json" => Self::from_json(&content),
            "toml" => Self::from_toml(&content),
            _ => Err(Error::Config(format!("Unknown config format: {}", ext))),
        }
    }

    /// Parse JSON configuration
    pub fn from_json(content: &str) -> Result<ManagerConfig> {
        serde_json::from_str(content).map_err(|e| Error::Config(format!("Invalid JSON: {}", e)))
    }

    /// Parse TOML configuration
    pub fn from_toml(content: &str) -> Result<ManagerConfig> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }

    /// Defaults overridden by the process environment
    pub fn from_env() -> ManagerConfig {
        let mut config = ManagerConfig::default();
        Self::apply_env(&mut config, |key| std::env::var(key).ok());
        config
    }

    /// Override `config` with whatever `lookup` finds for the known
    /// environment variables.
    pub fn apply_env<F>(config: &mut ManagerConfig, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ns) = lookup(ENV_NAMESPACE) {
            config.namespace = ns;
        }
        if let Some(name) = lookup(ENV_CONFIG_MAP) {
            config.config_map = name;
        }
        if let Some(port) = lookup(ENV_SERVER_PORT) {
            config.listen = port;
        }
        if let Some(label) = lookup(ENV_INTER_DOMAIN_DOM_PORT) {
            config.inter_domain_dom_port = label;
        }
        if let Some(dir) = lookup(ENV_STORE_DIR) {
            config.store_dir = Some(PathBuf::from(dir));
        }
        config.listen = normalize_listen(&config.listen);
    }
}
