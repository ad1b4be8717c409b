//! IPv6 configuration of a connection

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv6Addr;
use std::str::FromStr;

use super::address::{self, DnsServerJson, Ipv6Address, Ipv6AddressJson};
use super::ipv4::join;
use super::nmcli::{self, NmCliOutput};
use super::NmCliEntity;
use crate::error::{GatewayError, GatewayResult};

const NMCLI_PREFIX: &str = "ipv6";
const NMCLI_LIVE_PREFIX: &str = "IP6";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ipv6Method {
    Auto,
    Dhcp,
    Disabled,
    Ignore,
    LinkLocal,
    Manual,
    Shared,
}

impl Ipv6Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ipv6Method::Auto => "auto",
            Ipv6Method::Dhcp => "dhcp",
            Ipv6Method::Disabled => "disabled",
            Ipv6Method::Ignore => "ignore",
            Ipv6Method::LinkLocal => "link-local",
            Ipv6Method::Manual => "manual",
            Ipv6Method::Shared => "shared",
        }
    }
}

impl fmt::Display for Ipv6Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ipv6Method {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "auto" => Ok(Ipv6Method::Auto),
            "dhcp" => Ok(Ipv6Method::Dhcp),
            "disabled" => Ok(Ipv6Method::Disabled),
            "ignore" => Ok(Ipv6Method::Ignore),
            "link-local" => Ok(Ipv6Method::LinkLocal),
            "manual" => Ok(Ipv6Method::Manual),
            "shared" => Ok(Ipv6Method::Shared),
            other => Err(GatewayError::ParseError(format!("Unknown IPv6 method: {}", other))),
        }
    }
}

/// IPv6 settings; `current` holds the live state and is only filled on read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Ipv6ConnectionJson")]
pub struct Ipv6Connection {
    pub method: Ipv6Method,
    pub addresses: Vec<Ipv6Address>,
    pub gateway: Option<Ipv6Addr>,
    #[serde(serialize_with = "address::serialize_dns")]
    pub dns: Vec<Ipv6Addr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<Box<Ipv6Connection>>,
}

#[derive(Deserialize)]
struct Ipv6ConnectionJson {
    method: Ipv6Method,
    #[serde(default)]
    addresses: Vec<Ipv6AddressJson>,
    #[serde(default)]
    gateway: Option<String>,
    #[serde(default)]
    dns: Vec<DnsServerJson>,
}

impl TryFrom<Ipv6ConnectionJson> for Ipv6Connection {
    type Error = GatewayError;

    fn try_from(json: Ipv6ConnectionJson) -> Result<Self, Self::Error> {
        let mut addresses = Vec::with_capacity(json.addresses.len());
        for entry in json.addresses {
            if let Some(address) = entry.into_address()? {
                addresses.push(address);
            }
        }
        Ok(Self {
            method: json.method,
            addresses,
            gateway: address::parse_optional(json.gateway.as_deref(), "IPv6 gateway")?,
            dns: address::parse_dns(json.dns)?,
            current: None,
        })
    }
}

impl Ipv6Connection {
    pub fn new(method: Ipv6Method, addresses: Vec<Ipv6Address>, gateway: Option<Ipv6Addr>, dns: Vec<Ipv6Addr>) -> Self {
        Self {
            method,
            addresses,
            gateway,
            dns,
            current: None,
        }
    }

    fn live_state(output: &NmCliOutput, method: Ipv6Method) -> GatewayResult<Option<Box<Self>>> {
        let live = output.section(NMCLI_LIVE_PREFIX);
        if !live.is_present() {
            return Ok(None);
        }
        let addresses = live
            .indexed("ADDRESS")
            .into_iter()
            .map(Ipv6Address::from_prefix)
            .collect::<GatewayResult<Vec<_>>>()?;
        let dns = live
            .indexed("DNS")
            .into_iter()
            .map(|server| parse_ipv6(server, "IPv6 DNS server"))
            .collect::<GatewayResult<Vec<_>>>()?;
        let gateway = address::parse_optional(live.value("GATEWAY"), "IPv6 gateway")?;
        Ok(Some(Box::new(Self::new(method, addresses, gateway, dns))))
    }
}

impl NmCliEntity for Ipv6Connection {
    fn nmcli_deserialize(output: &NmCliOutput) -> GatewayResult<Self> {
        let section = output.section(NMCLI_PREFIX);
        let method: Ipv6Method = section
            .value("method")
            .ok_or_else(|| GatewayError::ParseError("Missing ipv6.method".to_string()))?
            .parse()?;
        let addresses = section
            .list("addresses")
            .into_iter()
            .map(Ipv6Address::from_prefix)
            .collect::<GatewayResult<Vec<_>>>()?;
        let gateway = address::parse_optional(section.value("gateway"), "IPv6 gateway")?;
        let dns = section
            .list("dns")
            .into_iter()
            .map(|server| parse_ipv6(server, "IPv6 DNS server"))
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

fn parse_ipv6(value: &str, what: &str) -> GatewayResult<Ipv6Addr> {
    Ipv6Addr::from_str(value.trim()).map_err(|_| GatewayError::ParseError(format!("Invalid {}: {}", what, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manual() -> Ipv6Connection {
        Ipv6Connection::new(
            Ipv6Method::Manual,
            vec![Ipv6Address::from_prefix("2001:470:5bb2::2/64").unwrap()],
            Some("fe80::1".parse().unwrap()),
            vec!["2001:470:5bb2::1".parse().unwrap()],
        )
    }

    #[test]
    fn test_nmcli_round_trip_through_fixture() {
        let text = "ipv6.method:manual\n\
                    ipv6.addresses:2001:470:5bb2::2/64\n\
                    ipv6.gateway:fe80::1\n\
                    ipv6.dns:2001:470:5bb2::1\n";
        assert_eq!(Ipv6Connection::nmcli_deserialize(&NmCliOutput::parse(text)).unwrap(), manual());
        assert_eq!(
            manual().nmcli_serialize(),
            "ipv6.method \"manual\" ipv6.addresses \"2001:470:5bb2::2/64\" ipv6.gateway \"fe80::1\" ipv6.dns \"2001:470:5bb2::1\" "
        );
    }

    #[test]
    fn test_nmcli_escaped_colons() {
        let text = "ipv6.method:manual\n\
                    ipv6.addresses:fd00\\:\\:2/64\n\
                    ipv6.gateway:\n";
        let connection = Ipv6Connection::nmcli_deserialize(&NmCliOutput::parse(text)).unwrap();
        assert_eq!(connection.addresses, vec![Ipv6Address::from_prefix("fd00::2/64").unwrap()]);
        assert_eq!(connection.gateway, None);
        assert!(connection.dns.is_empty());
    }

    #[test]
    fn test_nmcli_live_state() {
        let text = "ipv6.method:auto\n\
                    IP6.ADDRESS[1]:fd00::15/64\n\
                    IP6.ADDRESS[2]:fe80::ba27:ebff:fe00:1/64\n\
                    IP6.GATEWAY:fe80::1\n";
        let connection = Ipv6Connection::nmcli_deserialize(&NmCliOutput::parse(text)).unwrap();
        let current = connection.current.unwrap();
        assert_eq!(current.addresses.len(), 2);
        assert_eq!(current.gateway, Some("fe80::1".parse().unwrap()));
        assert!(current.dns.is_empty());
    }

    #[test]
    fn test_json() {
        let value = serde_json::to_value(manual()).unwrap();
        assert_eq!(
            value,
            json!({
                "method": "manual",
                "addresses": [{"address": "2001:470:5bb2::2", "prefix": 64}],
                "gateway": "fe80::1",
                "dns": [{"address": "2001:470:5bb2::1"}],
            })
        );
        assert_eq!(serde_json::from_value::<Ipv6Connection>(value).unwrap(), manual());
    }

    #[test]
    fn test_json_methods() {
        for method in ["auto", "dhcp", "disabled", "ignore", "link-local", "manual", "shared"] {
            let json = json!({"method": method, "addresses": [], "gateway": null, "dns": []});
            let connection: Ipv6Connection = serde_json::from_value(json).unwrap();
            assert_eq!(connection.method.as_str(), method);
        }
    }
}
