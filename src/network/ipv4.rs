//! IPv4 configuration of a connection

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use super::address::{self, DnsServerJson, Ipv4Address, Ipv4AddressJson};
use super::nmcli::{self, NmCliOutput};
use super::NmCliEntity;
use crate::error::{GatewayError, GatewayResult};

const NMCLI_PREFIX: &str = "ipv4";
const NMCLI_LIVE_PREFIX: &str = "IP4";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ipv4Method {
    Auto,
    Disabled,
    LinkLocal,
    Manual,
    Shared,
}

impl Ipv4Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ipv4Method::Auto => "auto",
            Ipv4Method::Disabled => "disabled",
            Ipv4Method::LinkLocal => "link-local",
            Ipv4Method::Manual => "manual",
            Ipv4Method::Shared => "shared",
        }
    }
}

impl fmt::Display for Ipv4Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ipv4Method {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "auto" => Ok(Ipv4Method::Auto),
            "disabled" => Ok(Ipv4Method::Disabled),
            "link-local" => Ok(Ipv4Method::LinkLocal),
            "manual" => Ok(Ipv4Method::Manual),
            "shared" => Ok(Ipv4Method::Shared),
            other => Err(GatewayError::ParseError(format!("Unknown IPv4 method: {}", other))),
        }
    }
}

/// IPv4 settings; `current` holds the live state and is only filled on read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Ipv4ConnectionJson")]
pub struct Ipv4Connection {
    pub method: Ipv4Method,
    pub addresses: Vec<Ipv4Address>,
    pub gateway: Option<Ipv4Addr>,
    #[serde(serialize_with = "address::serialize_dns")]
    pub dns: Vec<Ipv4Addr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<Box<Ipv4Connection>>,
}

#[derive(Deserialize)]
struct Ipv4ConnectionJson {
    method: Ipv4Method,
    #[serde(default)]
    addresses: Vec<Ipv4AddressJson>,
    #[serde(default)]
    gateway: Option<String>,
    #[serde(default)]
    dns: Vec<DnsServerJson>,
}

impl TryFrom<Ipv4ConnectionJson> for Ipv4Connection {
    type Error = GatewayError;

    fn try_from(json: Ipv4ConnectionJson) -> Result<Self, Self::Error> {
        let mut addresses = Vec::with_capacity(json.addresses.len());
        for entry in json.addresses {
            if let Some(address) = entry.into_address()? {
                addresses.push(address);
            }
        }
        Ok(Self {
            method: json.method,
            addresses,
            gateway: address::parse_optional(json.gateway.as_deref(), "IPv4 gateway")?,
            dns: address::parse_dns(json.dns)?,
            current: None,
        })
    }
}

impl Ipv4Connection {
    pub fn new(method: Ipv4Method, addresses: Vec<Ipv4Address>, gateway: Option<Ipv4Addr>, dns: Vec<Ipv4Addr>) -> Self {
        Self {
            method,
            addresses,
            gateway,
            dns,
            current: None,
        }
    }

    /// Live configuration reported in the `IP4.*` keys, if the connection is active
    fn live_state(output: &NmCliOutput, method: Ipv4Method) -> GatewayResult<Option<Box<Self>>> {
        let live = output.section(NMCLI_LIVE_PREFIX);
        if !live.is_present() {
            return Ok(None);
        }
        let addresses = live
            .indexed("ADDRESS")
            .into_iter()
            .map(Ipv4Address::from_prefix)
            .collect::<GatewayResult<Vec<_>>>()?;
        let dns = live
            .indexed("DNS")
            .into_iter()
            .map(|server| parse_ipv4(server, "IPv4 DNS server"))
            .collect::<GatewayResult<Vec<_>>>()?;
        let gateway = address::parse_optional(live.value("GATEWAY"), "IPv4 gateway")?;
        Ok(Some(Box::new(Self::new(method, addresses, gateway, dns))))
    }
}

impl NmCliEntity for Ipv4Connection {
    fn nmcli_deserialize(output: &NmCliOutput) -> GatewayResult<Self> {
        let section = output.section(NMCLI_PREFIX);
        let method: Ipv4Method = section
            .value("method")
            .ok_or_else(|| GatewayError::ParseError("Missing ipv4.method".to_string()))?
            .parse()?;
        let addresses = section
            .list("addresses")
            .into_iter()
            .map(Ipv4Address::from_prefix)
            .collect::<GatewayResult<Vec<_>>>()?;
        let gateway = address::parse_optional(section.value("gateway"), "IPv4 gateway")?;
        let dns = section
            .list("dns")
            .into_iter()
            .map(|server| parse_ipv4(server, "IPv4 DNS server"))
            .collect::<GatewayResult<Vec<_>>>()?;
        Ok(Self {
            method,
            addresses,
            gateway,
            dns,
            current: Self::live_state(output, method)?,
        })
    }

    fn nmcli_serialize(&self) -> String {
        nmcli::encode(
            NMCLI_PREFIX,
            [
                ("method", self.method.as_str().to_string()),
                ("addresses", join(&self.addresses)),
                ("gateway", self.gateway.map(|g| g.to_string()).unwrap_or_default()),
                ("dns", join(&self.dns)),
            ],
        )
    }
}

fn parse_ipv4(value: &str, what: &str) -> GatewayResult<Ipv4Addr> {
    Ipv4Addr::from_str(value.trim()).map_err(|_| GatewayError::ParseError(format!("Invalid {}: {}", what, value)))
}

pub(crate) fn join<T: fmt::Display>(items: &[T]) -> String {
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ")
}
