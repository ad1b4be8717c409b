//! 802.1X (EAP) settings for WPA-Enterprise networks

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{GatewayError, GatewayResult};
use crate::network::nmcli::{self, NmCliOutput};

const NMCLI_PREFIX: &str = "802-1x";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EapPhaseOneMethod {
    Fast,
    Leap,
    Md5,
    Peap,
    Pwd,
    Tls,
    Ttls,
}

impl EapPhaseOneMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            EapPhaseOneMethod::Fast => "fast",
            EapPhaseOneMethod::Leap => "leap",
            EapPhaseOneMethod::Md5 => "md5",
            EapPhaseOneMethod::Peap => "peap",
            EapPhaseOneMethod::Pwd => "pwd",
            EapPhaseOneMethod::Tls => "tls",
            EapPhaseOneMethod::Ttls => "ttls",
        }
    }
}

impl FromStr for EapPhaseOneMethod {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "fast" => Ok(EapPhaseOneMethod::Fast),
            "leap" => Ok(EapPhaseOneMethod::Leap),
            "md5" => Ok(EapPhaseOneMethod::Md5),
            "peap" => Ok(EapPhaseOneMethod::Peap),
            "pwd" => Ok(EapPhaseOneMethod::Pwd),
            "tls" => Ok(EapPhaseOneMethod::Tls),
            "ttls" => Ok(EapPhaseOneMethod::Ttls),
            other => Err(GatewayError::ParseError(format!("Unknown EAP method: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EapPhaseTwoMethod {
    Gtc,
    Md5,
    Mschapv2,
}

impl EapPhaseTwoMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            EapPhaseTwoMethod::Gtc => "gtc",
            EapPhaseTwoMethod::Md5 => "md5",
            EapPhaseTwoMethod::Mschapv2 => "mschapv2",
        }
    }
}

impl FromStr for EapPhaseTwoMethod {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "gtc" => Ok(EapPhaseTwoMethod::Gtc),
            "md5" => Ok(EapPhaseTwoMethod::Md5),
            "mschapv2" => Ok(EapPhaseTwoMethod::Mschapv2),
            other => Err(GatewayError::ParseError(format!("Unknown EAP phase 2 method: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eap {
    #[serde(default)]
    pub phase_one_method: Option<EapPhaseOneMethod>,
    #[serde(default)]
    pub phase_two_method: Option<EapPhaseTwoMethod>,
    #[serde(default)]
    pub anonymous_identity: String,
    /// CA certificate path
    #[serde(default)]
    pub cert: String,
    #[serde(default)]
    pub identity: String,
    #[serde(default)]
    pub password: String,
}

impl Eap {
    pub(crate) fn nmcli_deserialize(output: &NmCliOutput) -> GatewayResult<Self> {
        let section = output.section(NMCLI_PREFIX);
        Ok(Self {
            phase_one_method: section.list("eap").first().map(|m| m.parse()).transpose()?,
            phase_two_method: section.value("phase2-auth").map(str::parse).transpose()?,
            anonymous_identity: section.value("anonymous-identity").unwrap_or_default().to_string(),
            cert: section.value("ca-cert").unwrap_or_default().to_string(),
            identity: section.value("identity").unwrap_or_default().to_string(),
            password: section.value("password").unwrap_or_default().to_string(),
        })
    }

    pub(crate) fn nmcli_serialize(&self) -> String {
        nmcli::encode(
            NMCLI_PREFIX,
            [
                ("eap", self.phase_one_method.map(|m| m.as_str()).unwrap_or_default()),
                ("phase2-auth", self.phase_two_method.map(|m| m.as_str()).unwrap_or_default()),
                ("anonymous-identity", self.anonymous_identity.as_str()),
                ("ca-cert", self.cert.as_str()),
                ("identity", self.identity.as_str()),
                ("password", self.password.as_str()),
            ],
        )
    }
}
