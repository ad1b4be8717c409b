//! Network devices as reported by `nmcli device`

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::nmcli;
use crate::error::{GatewayError, GatewayResult};

/// Device type column of `nmcli device status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterfaceType {
    Bond,
    Bridge,
    Dummy,
    Ethernet,
    Gsm,
    Loopback,
    Tun,
    Vlan,
    Wifi,
    WifiP2p,
    Wireguard,
    Unknown,
}

impl InterfaceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterfaceType::Bond => "bond",
            InterfaceType::Bridge => "bridge",
            InterfaceType::Dummy => "dummy",
            InterfaceType::Ethernet => "ethernet",
            InterfaceType::Gsm => "gsm",
            InterfaceType::Loopback => "loopback",
            InterfaceType::Tun => "tun",
            InterfaceType::Vlan => "vlan",
            InterfaceType::Wifi => "wifi",
            InterfaceType::WifiP2p => "wifi-p2p",
            InterfaceType::Wireguard => "wireguard",
            InterfaceType::Unknown => "unknown",
        }
    }

    /// Devices types NetworkManager reports that are not modelled map to `Unknown`
    pub fn from_nmcli(value: &str) -> Self {
        match value.trim() {
            "bond" => InterfaceType::Bond,
            "bridge" => InterfaceType::Bridge,
            "dummy" => InterfaceType::Dummy,
            "ethernet" => InterfaceType::Ethernet,
            "gsm" => InterfaceType::Gsm,
            "loopback" => InterfaceType::Loopback,
            "tun" => InterfaceType::Tun,
            "vlan" => InterfaceType::Vlan,
            "wifi" => InterfaceType::Wifi,
            "wifi-p2p" => InterfaceType::WifiP2p,
            "wireguard" => InterfaceType::Wireguard,
            _ => InterfaceType::Unknown,
        }
    }
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceState {
    Connected,
    Connecting,
    Disconnected,
    Deactivating,
    Unavailable,
    Unmanaged,
    Failed,
    Unknown,
}

impl InterfaceState {
    /// Parse the state column; qualifiers such as `connected (externally)` or
    /// `connecting (getting IP configuration)` are dropped
    pub fn from_nmcli(value: &str) -> Self {
        let state = value.split_whitespace().next().unwrap_or_default();
        match state {
            "connected" => InterfaceState::Connected,
            "connecting" => InterfaceState::Connecting,
            "disconnected" => InterfaceState::Disconnected,
            "deactivating" => InterfaceState::Deactivating,
            "unavailable" => InterfaceState::Unavailable,
            "unmanaged" => InterfaceState::Unmanaged,
            "failed" => InterfaceState::Failed,
            _ => InterfaceState::Unknown,
        }
    }
}

/// Row of `nmcli -t device status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceStatus {
    pub name: String,
    #[serde(rename = "type")]
    pub interface_type: InterfaceType,
    pub state: InterfaceState,
    /// Name of the active connection, if any
    pub connection: Option<String>,
}

impl InterfaceStatus {
    pub fn from_terse_row(row: &str) -> GatewayResult<Self> {
        let fields = nmcli::split_terse_row(row);
        if fields.len() != 4 || fields[0].is_empty() {
            return Err(GatewayError::ParseError(format!("Malformed device row: {}", row)));
        }
        let connection = match fields[3].trim() {
            "" | "--" => None,
            name => Some(name.to_string()),
        };
        Ok(Self {
            name: fields[0].clone(),
            interface_type: InterfaceType::from_nmcli(&fields[1]),
            state: InterfaceState::from_nmcli(&fields[2]),
            connection,
        })
    }
}

/// Connection profile that can be activated on a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableConnection {
    pub uuid: Uuid,
    pub name: String,
}

impl AvailableConnection {
    /// Parse the `uuid | name` value of `CONNECTIONS.AVAILABLE-CONNECTIONS[n]`
    pub fn parse(value: &str) -> GatewayResult<Self> {
        let (uuid, name) = value
            .split_once('|')
            .ok_or_else(|| GatewayError::ParseError(format!("Malformed available connection: {}", value)))?;
        let uuid = Uuid::parse_str(uuid.trim())
            .map_err(|_| GatewayError::ParseError(format!("Invalid connection UUID: {}", uuid.trim())))?;
        Ok(Self {
            uuid,
            name: name.trim().to_string(),
        })
    }
}
