//! gwnetctl - gateway network configuration inspector
//!
//! Reads NetworkManager, ModemManager and WireGuard state the way the
//! gateway backend sees it and prints it as JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use libgwnetctl::network::{CellularManager, ConnectionManager, ConnectionType, InterfaceManager, InterfaceType};
use libgwnetctl::wireguard::{WireguardManager, WireguardStore};
use libgwnetctl::{CommandRunner, GatewayConfig, ShellCommandRunner};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

const DEFAULT_CONFIG: &str = "/etc/iqrf-gateway-webapp/gwnetctl.toml";

#[derive(Parser)]
#[command(name = "gwnetctl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect IQRF gateway network configuration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List NetworkManager connection profiles
    Connections {
        /// Only profiles of this type (e.g. 802-3-ethernet)
        #[arg(short = 't', long = "type")]
        connection_type: Option<String>,
    },
    /// Show one connection profile
    Connection {
        uuid: Uuid,
    },
    /// List network devices
    Interfaces {
        /// Only devices of this type (e.g. wifi)
        #[arg(short = 't', long = "type")]
        interface_type: Option<String>,
    },
    /// List cellular modems
    Modems,
    /// Generate a WireGuard key pair
    WireguardKeys,
    /// List stored WireGuard tunnels
    Wireguard {
        /// Store file, overriding the configured one
        #[arg(short, long)]
        store: Option<PathBuf>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = GatewayConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    debug!("Using configuration {:?}", config);
    let runner: Arc<dyn CommandRunner> = Arc::new(ShellCommandRunner::new(config.commands.clone()));

    match cli.command {
        Commands::Connections { connection_type } => {
            let connection_type = connection_type
                .map(|t| t.parse::<ConnectionType>())
                .transpose()
                .context("Unknown connection type")?;
            let connections = ConnectionManager::new(runner).list(connection_type).await?;
            print_json(&connections)?;
        }
        Commands::Connection { uuid } => {
            let connection = ConnectionManager::new(runner).get(uuid).await?;
            print_json(&connection)?;
        }
        Commands::Interfaces { interface_type } => {
            let interface_type = interface_type.as_deref().map(InterfaceType::from_nmcli);
            let interfaces = InterfaceManager::new(runner).list(interface_type).await?;
            print_json(&interfaces)?;
        }
        Commands::Modems => {
            let modems = CellularManager::new(runner).list_modems().await?;
            print_json(&modems)?;
        }
        Commands::WireguardKeys => {
            let manager = WireguardManager::with_store(runner, config.paths.clone(), WireguardStore::new());
            print_json(&manager.generate_keys().await?)?;
        }
        Commands::Wireguard { store } => {
            let mut paths = config.paths.clone();
            if let Some(store) = store {
                paths.wireguard_store = store;
            }
            let manager = WireguardManager::new(runner, paths)?;
            print_json(&manager.list_interfaces())?;
        }
    }

    Ok(())
}
