//! l2dns - Corefile host entry manager
//!
//! This is the main entry point for the l2dns CLI.

use anyhow::Context;
use clap::{Parser, Subcommand};
use l2dns_core::config::{normalize_listen, ConfigLoader, ManagerConfig};
use l2dns_core::store::{ConfigDocument, DocumentStore, FileStore, MemoryStore};
use l2dns_core::DnsManager;
use l2dns_corefile::{diagnostic, parse, Corefile, HostEntries, Plugin, HOSTS_PLUGIN};
use std::io::IsTerminal;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// l2dns - edit CoreDNS Corefiles and serve a host entry API
#[derive(Parser)]
#[command(name = "l2dns")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Path to a TOML or JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Address to listen on
        #[arg(long)]
        listen: Option<String>,

        /// Keep documents in memory instead of on disk
        #[arg(long)]
        memory: bool,

        /// Corefile to store when the document does not exist yet
        #[arg(long)]
        corefile: Option<PathBuf>,
    },

    /// Edit the hosts entries of a Corefile on disk
    Hosts {
        /// Path to the Corefile
        #[arg(short, long)]
        file: PathBuf,

        /// Labels of the server block holding the hosts plugin
        #[arg(short, long, default_value = ".:53")]
        server: String,

        #[command(subcommand)]
        action: HostsAction,
    },

    /// Rewrite a Corefile in canonical layout
    Fmt {
        /// Path to the Corefile
        path: PathBuf,

        /// Only report whether the file would change
        #[arg(long)]
        check: bool,
    },

    /// Validate a Corefile
    Validate {
        /// Path to the Corefile
        #[arg(default_value = "Corefile")]
        path: PathBuf,

        /// Print the parsed tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum HostsAction {
    /// Print entries as JSON
    List,
    /// Map domains to an IP address
    Add {
        ip: String,
        #[arg(required = true)]
        domains: Vec<String>,
    },
    /// Unmap domains from an IP address
    Remove {
        ip: String,
        #[arg(required = true)]
        domains: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Serve {
            config,
            listen,
            memory,
            corefile,
        } => {
            let mut config = match config {
                Some(path) => ConfigLoader::load(&path)
                    .with_context(|| format!("failed to load {}", path.display()))?,
                None => ManagerConfig::default(),
            };
            ConfigLoader::apply_env(&mut config, |key| std::env::var(key).ok());
            if let Some(listen) = listen {
                config.listen = normalize_listen(&listen);
            }

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(serve(config, memory, corefile))?;
        }

        Commands::Hosts {
            file,
            server,
            action,
        } => {
            let source = read_source(&file)?;
            let mut corefile = parse_or_exit(&file, &source);
            let labels: Vec<&str> = server.split_whitespace().collect();
            let hosts = hosts_plugin(&mut corefile, &labels)?;

            match action {
                HostsAction::List => {
                    let entries = hosts.list_host_entries()?;
                    println!("{}", serde_json::to_string_pretty(&entries)?);
                }
                HostsAction::Add { ip, domains } => {
                    let entries: HostEntries = [(ip, domains)].into_iter().collect();
                    hosts.add_host_entries(&entries)?;
                    write_corefile(&file, &corefile)?;
                    tracing::info!("✅ Updated {}", file.display());
                }
                HostsAction::Remove { ip, domains } => {
                    let entries: HostEntries = [(ip, domains)].into_iter().collect();
                    hosts.remove_host_entries(&entries)?;
                    write_corefile(&file, &corefile)?;
                    tracing::info!("✅ Updated {}", file.display());
                }
            }
        }

        Commands::Fmt { path, check } => {
            let source = read_source(&path)?;
            let corefile = parse_or_exit(&path, &source);
            let formatted = corefile.to_string();

            if formatted == source {
                tracing::debug!("{} is already formatted", path.display());
            } else if check {
                eprintln!("❌ {} is not formatted", path.display());
                std::process::exit(1);
            } else {
                write_corefile(&path, &corefile)?;
                println!("✨ Formatted {}", path.display());
            }
        }

        Commands::Validate { path, json } => {
            tracing::info!("Validating Corefile: {}", path.display());
            let source = read_source(&path)?;
            let corefile = parse_or_exit(&path, &source);
            if json {
                println!("{}", serde_json::to_string_pretty(&corefile)?);
                return Ok(());
            }
            println!(
                "✅ Corefile '{}' is valid! ({} server block(s))",
                path.display(),
                corefile.servers.len()
            );
        }

        Commands::Version => {
            println!("l2dns v{}", l2dns_core::VERSION);
        }
    }

    Ok(())
}

async fn serve(config: ManagerConfig, memory: bool, seed: Option<PathBuf>) -> anyhow::Result<()> {
    let addr: SocketAddr = config
        .listen
        .parse()
        .with_context(|| format!("invalid listen address: {}", config.listen))?;

    let store: Arc<dyn DocumentStore> = if memory {
        tracing::info!("🧠 Using in-memory document store");
        Arc::new(MemoryStore::new())
    } else {
        let dir = config.store_dir();
        tracing::info!("📁 Using document store at {}", dir.display());
        Arc::new(FileStore::new(dir))
    };

    if let Some(path) = seed {
        seed_document(store.as_ref(), &config, &path).await?;
    }

    tracing::info!(
        "🚀 Managing {}/{} (server block '{}')",
        config.namespace,
        config.config_map,
        config.inter_domain_dom_port
    );
    let manager = DnsManager::from_config(store, &config);
    l2dns_api::run_api_server(addr, manager).await?;
    Ok(())
}

async fn seed_document(store: &dyn DocumentStore, config: &ManagerConfig, path: &Path) -> anyhow::Result<()> {
    match store.get(&config.config_map, &config.namespace).await {
        Ok(_) => {
            tracing::info!("Document {}/{} already exists, not seeding", config.namespace, config.config_map);
            return Ok(());
        }
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e.into()),
    }

    let source = read_source(path)?;
    parse_or_exit(path, &source);
    let document = ConfigDocument::new(config.config_map.clone(), config.namespace.clone()).with_corefile(source);
    store.update(document).await?;
    tracing::info!("🌱 Seeded {}/{} from {}", config.namespace, config.config_map, path.display());
    Ok(())
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn write_corefile(path: &Path, corefile: &Corefile) -> anyhow::Result<()> {
    std::fs::write(path, corefile.to_string()).with_context(|| format!("failed to write {}", path.display()))
}

/// Parse `source`, printing a report and exiting on error.
fn parse_or_exit(path: &Path, source: &str) -> Corefile {
    match parse(source) {
        Ok(corefile) => corefile,
        Err(e) => {
            let name = path.display().to_string();
            let color = std::io::stderr().is_terminal();
            eprint!("{}", diagnostic::render(&e, &name, source, color));
            std::process::exit(1);
        }
    }
}

fn hosts_plugin<'a>(corefile: &'a mut Corefile, labels: &[&str]) -> anyhow::Result<&'a mut Plugin> {
    corefile
        .get_server_mut(labels)
        .with_context(|| format!("could not find server block '{}'", labels.join(" ")))?
        .get_plugin_mut(HOSTS_PLUGIN)
        .with_context(|| format!("could not find '{}' plugin in server block '{}'", HOSTS_PLUGIN, labels.join(" ")))
}
