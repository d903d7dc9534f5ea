//! Tree model for Corefiles
//!
//! A Corefile has exactly three nesting levels:
//! - Servers (identified by their `dom_ports` labels, e.g. `.:53`)
//! - Plugins inside a server (name + args)
//! - Options inside a plugin (name + args)
//!
//! Every node exclusively owns its children. Lookups hand out references into
//! the tree so edits happen in place.

use serde::Serialize;

/// Root node - an ordered list of server blocks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Corefile {
    pub servers: Vec<Server>,
}

/// Server block, e.g. `example.org:53 { ... }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Server {
    /// Zone/port labels preceding the block
    pub dom_ports: Vec<String>,

    /// Plugins in declaration order
    pub plugins: Vec<Plugin>,
}

/// Plugin directive inside a server block, e.g. `forward . 8.8.8.8`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Plugin {
    pub name: String,
    pub args: Vec<String>,
    pub options: Vec<PluginOption>,
}

/// Option line inside a plugin block, e.g. `10.0.0.1 db.example.org`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PluginOption {
    pub name: String,
    pub args: Vec<String>,
}

/// Positional, exact-length comparison of two label lists.
pub(crate) fn labels_eq<A: AsRef<str>, B: AsRef<str>>(left: &[A], right: &[B]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .all(|(l, r)| l.as_ref() == r.as_ref())
}

impl Corefile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_server(mut self, server: Server) -> Self {
        self.servers.push(server);
        self
    }

    /// First server whose labels equal `dom_ports` exactly.
    pub fn get_server<S: AsRef<str>>(&self, dom_ports: &[S]) -> Option<&Server> {
        self.servers
            .iter()
            .find(|s| labels_eq(s.dom_ports.as_slice(), dom_ports))
    }

    pub fn get_server_mut<S: AsRef<str>>(&mut self, dom_ports: &[S]) -> Option<&mut Server> {
        self.servers
            .iter_mut()
            .find(|s| labels_eq(s.dom_ports.as_slice(), dom_ports))
    }

    /// Add a server block, merging it into an existing block with the same
    /// labels.
    ///
    /// When merging, each incoming plugin replaces the args and options of the
    /// first existing plugin with the same name, or is appended if there is
    /// none. Plugins not mentioned by `server` are left alone.
    pub fn add_server(&mut self, server: Server) {
        let Some(existing) = self.get_server_mut(server.dom_ports.as_slice()) else {
            tracing::debug!(labels = ?server.dom_ports, "Appending new server block");
            self.servers.push(server);
            return;
        };

        tracing::debug!(labels = ?server.dom_ports, "Merging into existing server block");
        for plugin in server.plugins {
            match existing.get_plugin_mut(&plugin.name) {
                Some(current) => {
                    current.args = plugin.args;
                    current.options = plugin.options;
                }
                None => existing.plugins.push(plugin),
            }
        }
    }
}

impl Server {
    pub fn new<I, S>(dom_ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dom_ports: dom_ports.into_iter().map(Into::into).collect(),
            plugins: Vec::new(),
        }
    }

    pub fn with_plugin(mut self, plugin: Plugin) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// First plugin named `name`.
    pub fn get_plugin(&self, name: &str) -> Option<&Plugin> {
        self.plugins.iter().find(|p| p.name == name)
    }

    pub fn get_plugin_mut(&mut self, name: &str) -> Option<&mut Plugin> {
        self.plugins.iter_mut().find(|p| p.name == name)
    }
}

impl Plugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            options: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_option(mut self, option: PluginOption) -> Self {
        self.options.push(option);
        self
    }

    /// First option named `name`.
    pub fn get_option(&self, name: &str) -> Option<&PluginOption> {
        self.options.iter().find(|o| o.name == name)
    }
}

impl PluginOption {
    pub fn new<I, S>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Corefile {
        Corefile::new()
            .with_server(
                Server::new([".:53"])
                    .with_plugin(Plugin::new("errors"))
                    .with_plugin(
                        Plugin::new("hosts")
                            .with_option(PluginOption::new("10.0.0.1", ["a.l2sm"]))
                            .with_option(PluginOption::new("fallthrough", Vec::<String>::new())),
                    ),
            )
            .with_server(Server::new(["example.org:53", "example.net:53"]))
    }

    #[test]
    fn test_get_server_exact() {
        let cf = sample();
        assert!(cf.get_server(&[".:53"]).is_some());
        assert!(cf.get_server(&["example.org:53", "example.net:53"]).is_some());
        assert!(cf.get_server(&["example.org:53"]).is_none());
        assert!(cf.get_server(&["*"]).is_none());
        assert!(cf.get_server::<&str>(&[]).is_none());
    }

    #[test]
    fn test_get_plugin_and_option() {
        let cf = sample();
        let server = cf.get_server(&[".:53"]).unwrap();
        let hosts = server.get_plugin("hosts").unwrap();
        assert_eq!(hosts.get_option("10.0.0.1").unwrap().args, vec!["a.l2sm"]);
        assert!(hosts.get_option("10.0.0.2").is_none());
        assert!(server.get_plugin("forward").is_none());
    }

    #[test]
    fn test_get_plugin_first_match_wins() {
        let server = Server::new([".:53"])
            .with_plugin(Plugin::new("log").with_args(["first"]))
            .with_plugin(Plugin::new("log").with_args(["second"]));
        assert_eq!(server.get_plugin("log").unwrap().args, vec!["first"]);
    }

    #[test]
    fn test_mutation_through_lookup() {
        let mut cf = sample();
        cf.get_server_mut(&[".:53"])
            .and_then(|s| s.get_plugin_mut("errors"))
            .unwrap()
            .args
            .push("stdout".to_string());
        assert_eq!(
            cf.get_server(&[".:53"]).unwrap().get_plugin("errors").unwrap().args,
            vec!["stdout"]
        );
    }

    #[test]
    fn test_add_server_appends_new() {
        let mut cf = sample();
        cf.add_server(Server::new(["inter.l2sm:53"]).with_plugin(
            Plugin::new("forward").with_args([".", "10.1.0.1:53"]),
        ));
        assert_eq!(cf.servers.len(), 3);
        assert_eq!(cf.servers[2].dom_ports, vec!["inter.l2sm:53"]);
    }

    #[test]
    fn test_add_server_merges_and_preserves_untouched() {
        let mut cf = sample();
        let before_hosts = cf.servers[0].get_plugin("hosts").cloned();

        cf.add_server(
            Server::new([".:53"])
                .with_plugin(Plugin::new("forward").with_args([".", "8.8.8.8"]))
                .with_plugin(Plugin::new("errors").with_args(["stdout"])),
        );

        let server = cf.get_server(&[".:53"]).unwrap();
        assert_eq!(cf.servers.len(), 2);
        assert_eq!(server.plugins.len(), 3);
        assert_eq!(server.get_plugin("errors").unwrap().args, vec!["stdout"]);
        assert_eq!(server.get_plugin("hosts").cloned(), before_hosts);
        assert_eq!(server.plugins[2].name, "forward");
    }

    #[test]
    fn test_add_server_replaces_options_wholesale() {
        let mut cf = sample();
        cf.add_server(Server::new([".:53"]).with_plugin(Plugin::new("hosts")));
        let hosts = cf.servers[0].get_plugin("hosts").unwrap();
        assert!(hosts.options.is_empty());
    }

    #[test]
    fn test_add_server_idempotent() {
        let block = Server::new([".:53"])
            .with_plugin(Plugin::new("forward").with_args([".", "8.8.8.8"]));

        let mut once = sample();
        once.add_server(block.clone());
        let mut twice = sample();
        twice.add_server(block.clone());
        twice.add_server(block);

        assert_eq!(once, twice);
    }
}
