//! WiFi (802-11-wireless) connection settings

pub mod eap;
pub mod security;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::nmcli::{self, NmCliOutput};
use super::NmCliEntity;
use crate::error::{GatewayError, GatewayResult};

pub use eap::{Eap, EapPhaseOneMethod, EapPhaseTwoMethod};
pub use security::{Leap, Wep, WepKeyType, WifiSecurity, WifiSecurityType};

const NMCLI_PREFIX: &str = "802-11-wireless";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WifiMode {
    #[default]
    Infrastructure,
    Ap,
    Adhoc,
    Mesh,
}

impl WifiMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WifiMode::Infrastructure => "infrastructure",
            WifiMode::Ap => "ap",
            WifiMode::Adhoc => "adhoc",
            WifiMode::Mesh => "mesh",
        }
    }
}

impl FromStr for WifiMode {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "infrastructure" => Ok(WifiMode::Infrastructure),
            "ap" => Ok(WifiMode::Ap),
            "adhoc" => Ok(WifiMode::Adhoc),
            "mesh" => Ok(WifiMode::Mesh),
            other => Err(GatewayError::ParseError(format!("Unknown WiFi mode: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiConnection {
    pub ssid: String,
    #[serde(default)]
    pub mode: WifiMode,
    /// Access points seen for this network, reported by NetworkManager only
    #[serde(default, skip_deserializing)]
    pub bssids: Vec<String>,
    #[serde(default)]
    pub security: WifiSecurity,
}

impl WifiConnection {
    pub fn new(ssid: impl Into<String>, mode: WifiMode, security: WifiSecurity) -> Self {
        Self {
            ssid: ssid.into(),
            mode,
            bssids: Vec::new(),
            security,
        }
    }
}

impl NmCliEntity for WifiConnection {
    fn nmcli_deserialize(output: &NmCliOutput) -> GatewayResult<Self> {
        let section = output.section(NMCLI_PREFIX);
        let ssid = section
            .value("ssid")
            .ok_or_else(|| GatewayError::ParseError("Missing 802-11-wireless.ssid".to_string()))?;
        let mode = match section.value("mode") {
            Some(mode) => mode.parse()?,
            None => WifiMode::default(),
        };
        Ok(Self {
            ssid: ssid.to_string(),
            mode,
            bssids: section.list("seen-bssids").into_iter().map(str::to_string).collect(),
            security: WifiSecurity::nmcli_deserialize(output)?,
        })
    }

    fn nmcli_serialize(&self) -> String {
        let mut fragment = nmcli::encode(NMCLI_PREFIX, [("ssid", self.ssid.as_str()), ("mode", self.mode.as_str())]);
        fragment.push_str(&self.security.nmcli_serialize());
        fragment
    }
}
