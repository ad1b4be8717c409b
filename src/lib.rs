//! gwnetctl - IQRF gateway network configuration core
//!
//! Async library translating between the JSON documents of the gateway
//! REST API, the text protocols of system tools and typed entities:
//! - NetworkManager connections and devices (`nmcli`)
//! - Cellular modems (`mmcli`)
//! - WireGuard tunnels (`wg`, `ip`)
//! - API keys

pub mod error;
pub mod config;
pub mod command;
pub mod validation;
pub mod network;
pub mod wireguard;
pub mod api_key;

// Re-export commonly used types
pub use error::{ErrorKind, GatewayError, GatewayResult};
pub use config::{CommandSettings, ConfigPaths, GatewayConfig};
pub use command::{escape_shell_arg, CommandOutput, CommandRunner, ShellCommandRunner};
pub use network::{
    CellularManager, Connection, ConnectionDetail, ConnectionManager, ConnectionType, InterfaceManager,
    InterfaceStatus, InterfaceType, Modem, MultiAddress, NmCliEntity,
};
pub use wireguard::{WireguardManager, WireguardStore};
pub use api_key::ApiKey;
