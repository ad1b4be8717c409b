//! NetworkManager and ModemManager backed network configuration
//!
//! Every connection setting exists in three shapes: the JSON document the
//! REST layer exchanges, the terse `key:value` text printed by `nmcli -t`, and
//! the typed entities in this module. Entities decode themselves from
//! [`nmcli::NmCliOutput`] and encode back into `prefix.key "value" `
//! fragments through [`NmCliEntity`]; JSON goes through serde.
//!
//! ```text
//!   JSON ──serde──▶ ConnectionDetail ──nmcli_serialize──▶ nmcli connection modify
//!   JSON ◀──serde── ConnectionDetail ◀─nmcli_deserialize─ nmcli -t connection show
//! ```
//!
//! The managers ([`ConnectionManager`], [`InterfaceManager`],
//! [`CellularManager`]) shape the commands and run them through a
//! [`crate::command::CommandRunner`].

pub mod address;
pub mod autoconnect;
pub mod cellular_manager;
pub mod connection;
pub mod connection_manager;
pub mod gsm;
pub mod interface;
pub mod interface_manager;
pub mod ipv4;
pub mod ipv6;
pub mod modem;
pub mod nmcli;
pub mod vlan;
pub mod wifi;

use crate::error::GatewayResult;
use nmcli::NmCliOutput;

pub use address::{Ipv4Address, Ipv6Address, MultiAddress};
pub use autoconnect::AutoConnect;
pub use cellular_manager::CellularManager;
pub use connection::{Connection, ConnectionDetail, ConnectionType};
pub use connection_manager::ConnectionManager;
pub use gsm::GsmConnection;
pub use interface::{AvailableConnection, InterfaceState, InterfaceStatus, InterfaceType};
pub use interface_manager::InterfaceManager;
pub use ipv4::{Ipv4Connection, Ipv4Method};
pub use ipv6::{Ipv6Connection, Ipv6Method};
pub use modem::{Modem, ModemState};
pub use vlan::{VlanConfiguration, VlanFlags};
pub use wifi::{WifiConnection, WifiMode, WifiSecurity, WifiSecurityType};

/// Entity that can be read from `nmcli -t` output and written as
/// `nmcli connection add/modify` arguments
///
/// The two directions are not textual inverses: decoding consumes
/// `key:value` lines, encoding produces quoted command line fragments.
pub trait NmCliEntity: Sized {
    fn nmcli_deserialize(output: &NmCliOutput) -> GatewayResult<Self>;

    fn nmcli_serialize(&self) -> String;

    /// Decode straight from raw `nmcli -t` text
    fn from_nmcli_text(text: &str) -> GatewayResult<Self> {
        Self::nmcli_deserialize(&NmCliOutput::parse(text))
    }
}
