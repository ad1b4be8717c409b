//! GSM (cellular) connection settings

use serde::{Deserialize, Serialize};

use super::nmcli::{self, NmCliOutput};
use super::NmCliEntity;
use crate::error::GatewayResult;

const NMCLI_PREFIX: &str = "gsm";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GsmConnection {
    /// Access point name
    pub apn: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// SIM PIN
    #[serde(default)]
    pub pin: Option<String>,
}

impl NmCliEntity for GsmConnection {
    fn nmcli_deserialize(output: &NmCliOutput) -> GatewayResult<Self> {
        let section = output.section(NMCLI_PREFIX);
        let optional = |key: &str| section.value(key).map(str::to_string);
        Ok(Self {
            apn: section.value("apn").unwrap_or_default().to_string(),
            username: optional("username"),
            password: optional("password"),
            pin: optional("pin"),
        })
    }

    fn nmcli_serialize(&self) -> String {
        nmcli::encode(
            NMCLI_PREFIX,
            [
                ("apn", self.apn.as_str()),
                ("username", self.username.as_deref().unwrap_or_default()),
                ("password", self.password.as_deref().unwrap_or_default()),
                ("pin", self.pin.as_deref().unwrap_or_default()),
            ],
        )
    }
}
