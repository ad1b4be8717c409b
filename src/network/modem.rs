//! Cellular modems as reported by ModemManager (`mmcli --output-json`)

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

use crate::error::{GatewayError, GatewayResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModemState {
    Failed,
    Unknown,
    Initializing,
    Locked,
    Disabled,
    Disabling,
    Enabling,
    Enabled,
    Searching,
    Registered,
    Disconnecting,
    Connecting,
    Connected,
}

impl ModemState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModemState::Failed => "failed",
            ModemState::Unknown => "unknown",
            ModemState::Initializing => "initializing",
            ModemState::Locked => "locked",
            ModemState::Disabled => "disabled",
            ModemState::Disabling => "disabling",
            ModemState::Enabling => "enabling",
            ModemState::Enabled => "enabled",
            ModemState::Searching => "searching",
            ModemState::Registered => "registered",
            ModemState::Disconnecting => "disconnecting",
            ModemState::Connecting => "connecting",
            ModemState::Connected => "connected",
        }
    }

    pub fn from_mmcli(value: &str) -> Self {
        match value.trim() {
            "failed" => ModemState::Failed,
            "initializing" => ModemState::Initializing,
            "locked" => ModemState::Locked,
            "disabled" => ModemState::Disabled,
            "disabling" => ModemState::Disabling,
            "enabling" => ModemState::Enabling,
            "enabled" => ModemState::Enabled,
            "searching" => ModemState::Searching,
            "registered" => ModemState::Registered,
            "disconnecting" => ModemState::Disconnecting,
            "connecting" => ModemState::Connecting,
            "connected" => ModemState::Connected,
            _ => ModemState::Unknown,
        }
    }
}

impl fmt::Display for ModemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Radio details, only known for modems that did not fail
#[derive(Debug, Clone, PartialEq)]
pub struct ModemSignal {
    pub operator: Option<String>,
    /// Signal quality in percent
    pub signal: Option<u8>,
    pub technology: Option<String>,
    /// GSM RSSI in dBm
    pub rssi: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Modem {
    pub manufacturer: String,
    pub model: String,
    pub imei: String,
    /// Primary port, e.g. `ttyUSB2`
    pub interface: String,
    pub state: ModemState,
    /// Failure reason when `state` is `failed`
    pub error: Option<String>,
    pub radio: Option<ModemSignal>,
}

impl Modem {
    /// Build a modem from `mmcli -m <path> --output-json` and
    /// `mmcli -m <path> --signal-get --output-json`
    pub fn from_mmcli_json(modem: &Value, signal: &Value) -> GatewayResult<Self> {
        let generic = &modem["modem"]["generic"];
        if !generic.is_object() {
            return Err(GatewayError::ModemManager("Missing modem.generic in mmcli output".to_string()));
        }
        let state = ModemState::from_mmcli(&text(&generic["state"]).unwrap_or_default());

        let (error, radio) = if state == ModemState::Failed {
            (text(&generic["state-failed-reason"]), None)
        } else {
            let radio = ModemSignal {
                operator: text(&modem["modem"]["3gpp"]["operator-name"]),
                signal: number(&generic["signal-quality"]["value"])
                    .and_then(|value| u8::try_from(value as i64).ok()),
                technology: generic["access-technologies"].get(0).and_then(text),
                rssi: gsm_rssi(signal),
            };
            (None, Some(radio))
        };

        Ok(Self {
            manufacturer: text(&generic["manufacturer"]).unwrap_or_default(),
            model: text(&generic["model"]).unwrap_or_default(),
            imei: text(&generic["equipment-identifier"]).unwrap_or_default(),
            interface: text(&generic["primary-port"]).unwrap_or_default(),
            state,
            error,
            radio,
        })
    }
}

/// GSM RSSI from `--signal-get` output, `None` while polling is not set up
pub fn gsm_rssi(signal: &Value) -> Option<f64> {
    number(&signal["modem"]["signal"]["gsm"]["rssi"])
}

/// mmcli prints most values as strings and `--` for unknown ones
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.is_empty() || s == "--" => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Number that may be printed with a decimal comma (`-67,00`)
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(_) => text(value)?.replace(',', ".").parse().ok(),
        _ => None,
    }
}

impl Serialize for Modem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("manufacturer", &self.manufacturer)?;
        map.serialize_entry("model", &self.model)?;
        map.serialize_entry("imei", &self.imei)?;
        map.serialize_entry("interface", &self.interface)?;
        map.serialize_entry("state", &self.state)?;
        if self.state == ModemState::Failed {
            map.serialize_entry("error", &self.error)?;
        } else {
            let radio = self.radio.as_ref();
            map.serialize_entry("operator", &radio.and_then(|r| r.operator.as_ref()))?;
            map.serialize_entry("signal", &radio.and_then(|r| r.signal))?;
            map.serialize_entry("technology", &radio.and_then(|r| r.technology.as_ref()))?;
            map.serialize_entry("rssi", &radio.and_then(|r| r.rssi))?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn connected() -> Value {
        json!({"modem": {
            "3gpp": {"operator-name": "operator"},
            "generic": {
                "manufacturer": "manufacturer",
                "model": "model",
                "equipment-identifier": "862570024875048",
                "primary-port": "ttyUSB0",
                "state": "connected",
                "state-failed-reason": "--",
                "signal-quality": {"recent": "yes", "value": "75"},
                "access-technologies": ["edge"],
            },
        }})
    }

    #[test]
    fn test_connected_modem() {
        let signal = json!({"modem": {"signal": {"gsm": {"error-rate": "--", "rssi": "-55,00"}}}});
        let modem = Modem::from_mmcli_json(&connected(), &signal).unwrap();
        assert_eq!(modem.state, ModemState::Connected);
        assert_eq!(modem.imei, "862570024875048");
        let radio = modem.radio.as_ref().unwrap();
        assert_eq!(radio.signal, Some(75));
        assert_eq!(radio.rssi, Some(-55.0));

        assert_eq!(
            serde_json::to_value(&modem).unwrap(),
            json!({
                "manufacturer": "manufacturer",
                "model": "model",
                "imei": "862570024875048",
                "interface": "ttyUSB0",
                "state": "connected",
                "operator": "operator",
                "signal": 75,
                "technology": "edge",
                "rssi": -55.0,
            })
        );
    }

    #[test]
    fn test_failed_modem() {
        let mut json = connected();
        json["modem"]["generic"]["state"] = json!("failed");
        json["modem"]["generic"]["state-failed-reason"] = json!("sim-missing");
        let modem = Modem::from_mmcli_json(&json, &json!({})).unwrap();
        assert_eq!(modem.error.as_deref(), Some("sim-missing"));
        assert!(modem.radio.is_none());

        let value = serde_json::to_value(&modem).unwrap();
        assert_eq!(value["error"], "sim-missing");
        assert!(value.get("rssi").is_none());
        assert!(value.get("operator").is_none());
    }

    #[test]
    fn test_missing_signal() {
        let signal = json!({"modem": {"signal": {"gsm": {"rssi": "--"}}}});
        assert_eq!(gsm_rssi(&signal), None);
        let modem = Modem::from_mmcli_json(&connected(), &signal).unwrap();
        assert_eq!(serde_json::to_value(&modem).unwrap()["rssi"], Value::Null);
    }

    #[test]
    fn test_invalid_output() {
        assert!(Modem::from_mmcli_json(&json!({"modem": {}}), &json!({})).is_err());
        assert_eq!(ModemState::from_mmcli("bogus"), ModemState::Unknown);
    }
}
