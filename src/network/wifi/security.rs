//! WiFi security settings
//!
//! On the nmcli side only the keys of the active security type are written.
//! The JSON form is dense: every sub-object is emitted, with empty defaults
//! for the inactive ones, while input only requires the active part.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::eap::Eap;
use crate::error::{GatewayError, GatewayResult};
use crate::network::nmcli::{self, NmCliOutput};

const NMCLI_PREFIX: &str = "802-11-wireless-security";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WifiSecurityType {
    Open,
    Leap,
    Wep,
    WpaEap,
    WpaPsk,
}

impl WifiSecurityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WifiSecurityType::Open => "open",
            WifiSecurityType::Leap => "leap",
            WifiSecurityType::Wep => "wep",
            WifiSecurityType::WpaEap => "wpa-eap",
            WifiSecurityType::WpaPsk => "wpa-psk",
        }
    }

    /// Classify from `key-mgmt` and `auth-alg`
    pub fn from_nmcli(key_mgmt: &str, auth_alg: &str) -> GatewayResult<Self> {
        match (key_mgmt.trim(), auth_alg.trim()) {
            ("", _) => Ok(WifiSecurityType::Open),
            ("ieee8021x", "leap") => Ok(WifiSecurityType::Leap),
            ("none", _) => Ok(WifiSecurityType::Wep),
            ("wpa-eap", _) => Ok(WifiSecurityType::WpaEap),
            ("wpa-psk", _) => Ok(WifiSecurityType::WpaPsk),
            (key_mgmt, auth_alg) => Err(GatewayError::ParseError(format!(
                "Unsupported WiFi security: key-mgmt {}, auth-alg {}",
                key_mgmt, auth_alg
            ))),
        }
    }

    /// `key-mgmt`/`auth-alg` fragment selecting this type
    pub fn nmcli_serialize(&self) -> String {
        match self {
            WifiSecurityType::Open => String::new(),
            WifiSecurityType::Leap => nmcli::encode(NMCLI_PREFIX, [("key-mgmt", "ieee8021x"), ("auth-alg", "leap")]),
            WifiSecurityType::Wep => nmcli::encode(NMCLI_PREFIX, [("key-mgmt", "none"), ("auth-alg", "open")]),
            WifiSecurityType::WpaEap => nmcli::encode(NMCLI_PREFIX, [("key-mgmt", "wpa-eap")]),
            WifiSecurityType::WpaPsk => nmcli::encode(NMCLI_PREFIX, [("key-mgmt", "wpa-psk")]),
        }
    }
}

impl fmt::Display for WifiSecurityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WifiSecurityType {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "open" => Ok(WifiSecurityType::Open),
            "leap" => Ok(WifiSecurityType::Leap),
            "wep" => Ok(WifiSecurityType::Wep),
            "wpa-eap" => Ok(WifiSecurityType::WpaEap),
            "wpa-psk" => Ok(WifiSecurityType::WpaPsk),
            other => Err(GatewayError::ParseError(format!("Unknown WiFi security type: {}", other))),
        }
    }
}

/// Cisco LEAP credentials
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leap {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WepKeyType {
    #[default]
    Unknown,
    Key,
    Passphrase,
}

impl WepKeyType {
    pub fn as_nmcli(&self) -> u8 {
        match self {
            WepKeyType::Unknown => 0,
            WepKeyType::Key => 1,
            WepKeyType::Passphrase => 2,
        }
    }

    /// Accepts `1`, `1 (key)` or `key`
    pub fn from_nmcli(value: &str) -> GatewayResult<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(WepKeyType::Unknown);
        }
        match nmcli::leading_integer(value) {
            Some(0) => Ok(WepKeyType::Unknown),
            Some(1) => Ok(WepKeyType::Key),
            Some(2) => Ok(WepKeyType::Passphrase),
            Some(other) => Err(GatewayError::ParseError(format!("Unknown WEP key type: {}", other))),
            None => match value {
                "unknown" => Ok(WepKeyType::Unknown),
                "key" => Ok(WepKeyType::Key),
                "passphrase" => Ok(WepKeyType::Passphrase),
                other => Err(GatewayError::ParseError(format!("Unknown WEP key type: {}", other))),
            },
        }
    }
}

/// WEP keys and the index of the one used for transmission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wep {
    #[serde(rename = "type", default)]
    pub key_type: WepKeyType,
    #[serde(default)]
    pub index: u8,
    #[serde(default)]
    pub keys: [String; 4],
}

/// Security of a WiFi connection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WifiSecurityJsonIn", into = "WifiSecurityJsonOut")]
pub enum WifiSecurity {
    #[default]
    Open,
    Leap(Leap),
    Wep(Wep),
    WpaPsk { psk: String },
    WpaEap(Eap),
}

impl WifiSecurity {
    pub fn security_type(&self) -> WifiSecurityType {
        match self {
            WifiSecurity::Open => WifiSecurityType::Open,
            WifiSecurity::Leap(_) => WifiSecurityType::Leap,
            WifiSecurity::Wep(_) => WifiSecurityType::Wep,
            WifiSecurity::WpaPsk { .. } => WifiSecurityType::WpaPsk,
            WifiSecurity::WpaEap(_) => WifiSecurityType::WpaEap,
        }
    }

    pub(crate) fn nmcli_deserialize(output: &NmCliOutput) -> GatewayResult<Self> {
        let section = output.section(NMCLI_PREFIX);
        let security_type = WifiSecurityType::from_nmcli(section.get("key-mgmt"), section.get("auth-alg"))?;
        let text = |key: &str| section.value(key).unwrap_or_default().to_string();
        Ok(match security_type {
            WifiSecurityType::Open => WifiSecurity::Open,
            WifiSecurityType::Leap => WifiSecurity::Leap(Leap {
                username: text("leap-username"),
                password: text("leap-password"),
            }),
            WifiSecurityType::Wep => {
                let index = match section.value("wep-tx-keyidx") {
                    Some(value) => nmcli::leading_integer(value)
                        .and_then(|i| u8::try_from(i).ok())
                        .filter(|i| *i < 4)
                        .ok_or_else(|| GatewayError::ParseError(format!("Invalid WEP key index: {}", value)))?,
                    None => 0,
                };
                WifiSecurity::Wep(Wep {
                    key_type: WepKeyType::from_nmcli(section.get("wep-key-type"))?,
                    index,
                    keys: [text("wep-key0"), text("wep-key1"), text("wep-key2"), text("wep-key3")],
                })
            }
            WifiSecurityType::WpaPsk => WifiSecurity::WpaPsk { psk: text("psk") },
            WifiSecurityType::WpaEap => WifiSecurity::WpaEap(Eap::nmcli_deserialize(output)?),
        })
    }

    pub(crate) fn nmcli_serialize(&self) -> String {
        let mut fragment = self.security_type().nmcli_serialize();
        match self {
            WifiSecurity::Open => {}
            WifiSecurity::Leap(leap) => fragment.push_str(&nmcli::encode(
                NMCLI_PREFIX,
                [("leap-username", leap.username.as_str()), ("leap-password", leap.password.as_str())],
            )),
            WifiSecurity::Wep(wep) => {
                let key_type = wep.key_type.as_nmcli().to_string();
                let index = wep.index.to_string();
                fragment.push_str(&nmcli::encode(
                    NMCLI_PREFIX,
                    [
                        ("wep-key-type", key_type.as_str()),
                        ("wep-tx-keyidx", index.as_str()),
                        ("wep-key0", wep.keys[0].as_str()),
                        ("wep-key1", wep.keys[1].as_str()),
                        ("wep-key2", wep.keys[2].as_str()),
                        ("wep-key3", wep.keys[3].as_str()),
                    ],
                ));
            }
            WifiSecurity::WpaPsk { psk } => fragment.push_str(&nmcli::encode(NMCLI_PREFIX, [("psk", psk.as_str())])),
            WifiSecurity::WpaEap(eap) => fragment.push_str(&eap.nmcli_serialize()),
        }
        fragment
    }
}

#[derive(Deserialize)]
struct WifiSecurityJsonIn {
    #[serde(rename = "type")]
    security_type: WifiSecurityType,
    #[serde(default)]
    psk: Option<String>,
    #[serde(default)]
    leap: Option<Leap>,
    #[serde(default)]
    wep: Option<Wep>,
    #[serde(default)]
    eap: Option<Eap>,
}

impl TryFrom<WifiSecurityJsonIn> for WifiSecurity {
    type Error = GatewayError;

    fn try_from(json: WifiSecurityJsonIn) -> Result<Self, Self::Error> {
        let missing = |part: &str| {
            GatewayError::InvalidParameter(format!("WiFi security {} requires {}", json.security_type, part))
        };
        Ok(match json.security_type {
            WifiSecurityType::Open => WifiSecurity::Open,
            WifiSecurityType::Leap => WifiSecurity::Leap(json.leap.ok_or_else(|| missing("leap"))?),
            WifiSecurityType::Wep => {
                let wep = json.wep.ok_or_else(|| missing("wep"))?;
                if wep.index > 3 {
                    return Err(GatewayError::InvalidParameter(format!("Invalid WEP key index: {}", wep.index)));
                }
                WifiSecurity::Wep(wep)
            }
            WifiSecurityType::WpaPsk => WifiSecurity::WpaPsk {
                psk: json.psk.ok_or_else(|| missing("psk"))?,
            },
            WifiSecurityType::WpaEap => WifiSecurity::WpaEap(json.eap.ok_or_else(|| missing("eap"))?),
        })
    }
}

#[derive(Serialize)]
struct WifiSecurityJsonOut {
    #[serde(rename = "type")]
    security_type: WifiSecurityType,
    psk: String,
    leap: Leap,
    wep: Wep,
    eap: Eap,
}

impl From<WifiSecurity> for WifiSecurityJsonOut {
    fn from(security: WifiSecurity) -> Self {
        let mut out = WifiSecurityJsonOut {
            security_type: security.security_type(),
            psk: String::new(),
            leap: Leap::default(),
            wep: Wep::default(),
            eap: Eap::default(),
        };
        match security {
            WifiSecurity::Open => {}
            WifiSecurity::Leap(leap) => out.leap = leap,
            WifiSecurity::Wep(wep) => out.wep = wep,
            WifiSecurity::WpaPsk { psk } => out.psk = psk,
            WifiSecurity::WpaEap(eap) => out.eap = eap,
        }
        out
    }
}
