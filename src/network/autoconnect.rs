//! Connection autoactivation policy

use serde::{Deserialize, Serialize};

use super::nmcli::{self, NmCliOutput};
use super::NmCliEntity;
use crate::error::{GatewayError, GatewayResult};

const NMCLI_PREFIX: &str = "connection";

/// Retry count NetworkManager interprets as "retry forever"
pub const INFINITE_RETRIES: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoConnect {
    pub enabled: bool,
    pub priority: i32,
    /// -1 means infinite
    pub retries: i32,
}

impl Default for AutoConnect {
    fn default() -> Self {
        Self {
            enabled: true,
            priority: 0,
            retries: INFINITE_RETRIES,
        }
    }
}

impl NmCliEntity for AutoConnect {
    fn nmcli_deserialize(output: &NmCliOutput) -> GatewayResult<Self> {
        let section = output.section(NMCLI_PREFIX);
        let number = |key: &str, default: i32| -> GatewayResult<i32> {
            match section.value(key) {
                Some(value) => nmcli::leading_integer(value)
                    .and_then(|n| i32::try_from(n).ok())
                    .ok_or_else(|| GatewayError::ParseError(format!("Invalid connection.{}: {}", key, value))),
                None => Ok(default),
            }
        };
        Ok(Self {
            enabled: section.value("autoconnect").map(nmcli::parse_yes_no).unwrap_or(true),
            priority: number("autoconnect-priority", 0)?,
            retries: number("autoconnect-retries", INFINITE_RETRIES)?,
        })
    }

    fn nmcli_serialize(&self) -> String {
        nmcli::encode(
            NMCLI_PREFIX,
            [
                ("autoconnect", nmcli::yes_no(self.enabled).to_string()),
                ("autoconnect-priority", self.priority.to_string()),
                ("autoconnect-retries", self.retries.to_string()),
            ],
        )
    }
}
