//! DNS manager
//!
//! Every operation is one read-modify-write cycle over a stored document:
//! fetch it, parse the Corefile, locate the inter-domain server block and its
//! `hosts` plugin, edit, serialize and write the document back. A failure at
//! any step returns before anything is written, and text that does not parse
//! back to the edited tree is never stored.

use crate::config::{HostsTarget, ManagerConfig};
use crate::error::{Error, Result};
use crate::store::{ConfigDocument, DocumentStore};
use l2dns_corefile::{parse, Corefile, HostEntries, Plugin, Server, HOSTS_PLUGIN};
use std::sync::Arc;

/// Plugin used by [`DnsManager::add_server`]
const FORWARD_PLUGIN: &str = "forward";

/// Edits the Corefile held in one stored document
#[derive(Clone)]
pub struct DnsManager {
    store: Arc<dyn DocumentStore>,
    namespace: String,
    name: String,
    target: HostsTarget,
}

impl DnsManager {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        namespace: impl Into<String>,
        name: impl Into<String>,
        target: HostsTarget,
    ) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            name: name.into(),
            target,
        }
    }

    pub fn from_config(store: Arc<dyn DocumentStore>, config: &ManagerConfig) -> Self {
        Self::new(
            store,
            config.namespace.clone(),
            config.config_map.clone(),
            config.hosts_target(),
        )
    }

    pub fn target(&self) -> &HostsTarget {
        &self.target
    }

    /// Fetch the raw document
    pub async fn document(&self) -> Result<ConfigDocument> {
        self.store.get(&self.name, &self.namespace).await
    }

    /// Merge `entries` into the hosts plugin
    pub async fn add_entries(&self, entries: &HostEntries) -> Result<()> {
        self.edit_hosts(|hosts| Ok(hosts.add_host_entries(entries)?))
            .await?;
        tracing::info!("➕ Added {} host entr(ies) to {}/{}", entries.len(), self.namespace, self.name);
        Ok(())
    }

    /// Map `domain` to `ip`
    pub async fn add_dns_entry(&self, domain: &str, ip: &str) -> Result<()> {
        if domain.is_empty() {
            return Err(Error::Validation("domain name must not be empty".to_string()));
        }
        let entries: HostEntries = [(ip, [domain])].into_iter().collect();
        self.add_entries(&entries).await
    }

    /// Remove the listed domains from their IPs
    pub async fn remove_records(&self, removals: &HostEntries) -> Result<()> {
        self.edit_hosts(|hosts| Ok(hosts.remove_host_entries(removals)?))
            .await?;
        tracing::info!("➖ Removed {} host entr(ies) from {}/{}", removals.len(), self.namespace, self.name);
        Ok(())
    }

    /// Unmap `domain` from `ip`
    pub async fn remove_dns_entry(&self, domain: &str, ip: &str) -> Result<()> {
        let removals: HostEntries = [(ip, [domain])].into_iter().collect();
        self.remove_records(&removals).await
    }

    /// Current host entries of the hosts plugin
    pub async fn list_records(&self) -> Result<HostEntries> {
        let (_, mut corefile) = self.load().await?;
        let hosts = self.hosts_plugin(&mut corefile)?;
        Ok(hosts.list_host_entries()?)
    }

    /// Merge `<domain> { forward . <server_domain>:<server_port> }` into the
    /// Corefile.
    pub async fn add_server(&self, domain: &str, server_domain: &str, server_port: &str) -> Result<()> {
        for (field, value) in [
            ("domain name", domain),
            ("server domain", server_domain),
            ("server port", server_port),
        ] {
            if value.is_empty() {
                return Err(Error::Validation(format!("{} must not be empty", field)));
            }
        }

        let (document, mut corefile) = self.load().await?;
        let forward = Plugin::new(FORWARD_PLUGIN)
            .with_args([".".to_string(), format!("{}:{}", server_domain, server_port)]);
        corefile.add_server(Server::new([domain]).with_plugin(forward));
        self.save(document, &corefile).await?;

        tracing::info!("🔀 Added server {} forwarding to {}:{}", domain, server_domain, server_port);
        Ok(())
    }

    async fn load(&self) -> Result<(ConfigDocument, Corefile)> {
        let document = self.document().await?;
        let source = document.corefile().ok_or_else(|| {
            Error::NotFound(format!(
                "Corefile not found in document {}/{}",
                self.namespace, self.name
            ))
        })?;
        let corefile = parse(source)?;
        tracing::debug!("Parsed Corefile with {} server block(s)", corefile.servers.len());
        Ok((document, corefile))
    }

    async fn save(&self, mut document: ConfigDocument, corefile: &Corefile) -> Result<()> {
        document.set_corefile(render(corefile)?);
        self.store.update(document).await
    }

    fn hosts_plugin<'a>(&self, corefile: &'a mut Corefile) -> Result<&'a mut Plugin> {
        let server = corefile
            .get_server_mut(self.target.dom_ports.as_slice())
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "could not find inter-domain server '{}' in Corefile",
                    self.target.dom_ports.join(" ")
                ))
            })?;
        server.get_plugin_mut(HOSTS_PLUGIN).ok_or_else(|| {
            Error::NotFound(format!(
                "could not find '{}' plugin in the inter-domain server block",
                HOSTS_PLUGIN
            ))
        })
    }

    async fn edit_hosts<F>(&self, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Plugin) -> Result<()>,
    {
        let (document, mut corefile) = self.load().await?;
        edit(self.hosts_plugin(&mut corefile)?)?;
        self.save(document, &corefile).await
    }
}

/// Serialize `corefile`, refusing text that does not parse back to it.
fn render(corefile: &Corefile) -> Result<String> {
    let text = corefile.to_string();
    match parse(&text) {
        Ok(reparsed) if reparsed == *corefile => Ok(text),
        Ok(_) => Err(Error::Internal(
            "serialized Corefile does not parse back to the edited tree".to_string(),
        )),
        Err(e) => Err(Error::Internal(format!(
            "serialized Corefile does not parse back: {}",
            e
        ))),
    }
}
