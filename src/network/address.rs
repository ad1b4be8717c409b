//! IP address value types with CIDR prefixes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use crate::error::{GatewayError, GatewayResult};

/// IPv4 address with prefix length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Address {
    address: Ipv4Addr,
    prefix: u8,
}

impl Ipv4Address {
    pub fn new(address: Ipv4Addr, prefix: u8) -> GatewayResult<Self> {
        if prefix > 32 {
            return Err(GatewayError::ParseError(format!("Invalid IPv4 prefix length: {}", prefix)));
        }
        Ok(Self { address, prefix })
    }

    /// Parse `address/prefix`
    pub fn from_prefix(value: &str) -> GatewayResult<Self> {
        let (address, prefix) = split_cidr(value)?;
        let address = Ipv4Addr::from_str(address)
            .map_err(|_| GatewayError::ParseError(format!("Invalid IPv4 address: {}", value)))?;
        Self::new(address, parse_prefix(prefix, value)?)
    }

    /// Build from an address and a dotted subnet mask; the mask must be contiguous
    pub fn from_mask(address: &str, mask: &str) -> GatewayResult<Self> {
        let address = Ipv4Addr::from_str(address.trim())
            .map_err(|_| GatewayError::ParseError(format!("Invalid IPv4 address: {}", address)))?;
        let bits = u32::from(
            Ipv4Addr::from_str(mask.trim())
                .map_err(|_| GatewayError::ParseError(format!("Invalid IPv4 subnet mask: {}", mask)))?,
        );
        let prefix = bits.leading_ones();
        if bits.checked_shl(prefix).unwrap_or(0) != 0 {
            return Err(GatewayError::ParseError(format!("Non-contiguous IPv4 subnet mask: {}", mask)));
        }
        Self::new(address, prefix as u8)
    }

    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Subnet mask derived from the prefix
    pub fn mask(&self) -> Ipv4Addr {
        let bits = u32::MAX.checked_shl(32 - u32::from(self.prefix)).unwrap_or(0);
        Ipv4Addr::from(bits)
    }
}

impl fmt::Display for Ipv4Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix)
    }
}

impl FromStr for Ipv4Address {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_prefix(s)
    }
}

/// JSON form of an IPv4 address entry; clients send either `prefix` or `mask`
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Ipv4AddressJson {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub prefix: Option<u8>,
    #[serde(default)]
    pub mask: Option<String>,
}

impl Ipv4AddressJson {
    /// `None` for entries left blank by the client
    pub fn into_address(self) -> GatewayResult<Option<Ipv4Address>> {
        let address = match self.address.as_deref().map(str::trim) {
            None | Some("") => return Ok(None),
            Some(address) => address,
        };
        match (self.prefix, self.mask.as_deref().filter(|m| !m.trim().is_empty())) {
            (Some(prefix), _) => {
                let parsed = Ipv4Addr::from_str(address)
                    .map_err(|_| GatewayError::ParseError(format!("Invalid IPv4 address: {}", address)))?;
                Ipv4Address::new(parsed, prefix).map(Some)
            }
            (None, Some(mask)) => Ipv4Address::from_mask(address, mask).map(Some),
            (None, None) => Err(GatewayError::InvalidParameter(format!(
                "IPv4 address {} has neither prefix nor mask",
                address
            ))),
        }
    }
}

impl Serialize for Ipv4Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Ipv4AddressJson {
            address: Some(self.address.to_string()),
            prefix: Some(self.prefix),
            mask: Some(self.mask().to_string()),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Ipv4Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ipv4AddressJson::deserialize(deserializer)?
            .into_address()
            .and_then(|address| address.ok_or_else(|| GatewayError::InvalidParameter("Empty IPv4 address".to_string())))
            .map_err(serde::de::Error::custom)
    }
}

/// IPv6 address with prefix length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv6Address {
    address: Ipv6Addr,
    prefix: u8,
}

/// JSON form of an IPv6 address entry
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Ipv6AddressJson {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub prefix: Option<u8>,
}

impl Ipv6AddressJson {
    /// `None` for entries left blank by the client
    pub fn into_address(self) -> GatewayResult<Option<Ipv6Address>> {
        let address = match self.address.as_deref().map(str::trim) {
            None | Some("") => return Ok(None),
            Some(address) => address,
        };
        let prefix = self
            .prefix
            .ok_or_else(|| GatewayError::InvalidParameter(format!("IPv6 address {} has no prefix", address)))?;
        let parsed = Ipv6Addr::from_str(address)
            .map_err(|_| GatewayError::ParseError(format!("Invalid IPv6 address: {}", address)))?;
        Ipv6Address::new(parsed, prefix).map(Some)
    }
}

impl Serialize for Ipv6Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Ipv6AddressJson {
            address: Some(self.address.to_string()),
            prefix: Some(self.prefix),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Ipv6Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ipv6AddressJson::deserialize(deserializer)?
            .into_address()
            .and_then(|address| address.ok_or_else(|| GatewayError::InvalidParameter("Empty IPv6 address".to_string())))
            .map_err(serde::de::Error::custom)
    }
}

impl Ipv6Address {
    pub fn new(address: Ipv6Addr, prefix: u8) -> GatewayResult<Self> {
        if prefix > 128 {
            return Err(GatewayError::ParseError(format!("Invalid IPv6 prefix length: {}", prefix)));
        }
        Ok(Self { address, prefix })
    }

    /// Parse `address/prefix`
    pub fn from_prefix(value: &str) -> GatewayResult<Self> {
        let (address, prefix) = split_cidr(value)?;
        let address = Ipv6Addr::from_str(address)
            .map_err(|_| GatewayError::ParseError(format!("Invalid IPv6 address: {}", value)))?;
        Self::new(address, parse_prefix(prefix, value)?)
    }

    pub fn address(&self) -> Ipv6Addr {
        self.address
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }
}

impl fmt::Display for Ipv6Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix)
    }
}

impl FromStr for Ipv6Address {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_prefix(s)
    }
}

/// Address of either family, as used by WireGuard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MultiAddress {
    V4(Ipv4Address),
    V6(Ipv6Address),
}

impl MultiAddress {
    pub fn new(address: IpAddr, prefix: u8) -> GatewayResult<Self> {
        match address {
            IpAddr::V4(address) => Ipv4Address::new(address, prefix).map(MultiAddress::V4),
            IpAddr::V6(address) => Ipv6Address::new(address, prefix).map(MultiAddress::V6),
        }
    }

    pub fn from_prefix(value: &str) -> GatewayResult<Self> {
        let (address, prefix) = split_cidr(value)?;
        let address = IpAddr::from_str(address)
            .map_err(|_| GatewayError::ParseError(format!("Invalid IP address: {}", value)))?;
        Self::new(address, parse_prefix(prefix, value)?)
    }

    /// Address family, 4 or 6
    pub fn version(&self) -> u8 {
        match self {
            MultiAddress::V4(_) => 4,
            MultiAddress::V6(_) => 6,
        }
    }

    pub fn address(&self) -> IpAddr {
        match self {
            MultiAddress::V4(a) => IpAddr::V4(a.address()),
            MultiAddress::V6(a) => IpAddr::V6(a.address()),
        }
    }

    pub fn prefix(&self) -> u8 {
        match self {
            MultiAddress::V4(a) => a.prefix(),
            MultiAddress::V6(a) => a.prefix(),
        }
    }
}

impl fmt::Display for MultiAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MultiAddress::V4(a) => write!(f, "{}", a),
            MultiAddress::V6(a) => write!(f, "{}", a),
        }
    }
}

impl From<Ipv4Address> for MultiAddress {
    fn from(value: Ipv4Address) -> Self {
        MultiAddress::V4(value)
    }
}

impl From<Ipv6Address> for MultiAddress {
    fn from(value: Ipv6Address) -> Self {
        MultiAddress::V6(value)
    }
}

/// DNS server entry as it appears in JSON: `{"address": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct DnsServerJson {
    #[serde(default)]
    pub address: Option<String>,
}

/// Serialize a DNS server list as `[{"address": ...}]`
pub(crate) fn serialize_dns<S, A>(servers: &[A], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
    A: fmt::Display,
{
    use serde::ser::SerializeSeq;

    let mut seq = serializer.serialize_seq(Some(servers.len()))?;
    for server in servers {
        seq.serialize_element(&DnsServerJson {
            address: Some(server.to_string()),
        })?;
    }
    seq.end()
}

/// Parse DNS entries, skipping blank ones
pub(crate) fn parse_dns<T: FromStr>(servers: Vec<DnsServerJson>) -> GatewayResult<Vec<T>> {
    servers
        .into_iter()
        .filter_map(|server| server.address.filter(|a| !a.trim().is_empty()))
        .map(|address| {
            T::from_str(address.trim())
                .map_err(|_| GatewayError::ParseError(format!("Invalid DNS server address: {}", address)))
        })
        .collect()
}

/// Parse an optional address where an empty string means "not set"
pub(crate) fn parse_optional<T: FromStr>(value: Option<&str>, what: &str) -> GatewayResult<Option<T>> {
    match value.map(str::trim) {
        None | Some("") | Some("--") => Ok(None),
        Some(value) => T::from_str(value)
            .map(Some)
            .map_err(|_| GatewayError::ParseError(format!("Invalid {}: {}", what, value))),
    }
}

fn split_cidr(value: &str) -> GatewayResult<(&str, &str)> {
    value
        .trim()
        .split_once('/')
        .ok_or_else(|| GatewayError::ParseError(format!("Missing prefix length in {}", value)))
}

fn parse_prefix(prefix: &str, value: &str) -> GatewayResult<u8> {
    prefix
        .trim()
        .parse::<u8>()
        .map_err(|_| GatewayError::ParseError(format!("Invalid prefix length in {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ipv4_from_prefix() {
        let address = Ipv4Address::from_prefix("192.168.1.2/24").unwrap();
        assert_eq!(address.address(), Ipv4Addr::new(192, 168, 1, 2));
        assert_eq!(address.prefix(), 24);
        assert_eq!(address.mask(), Ipv4Addr::new(255, 255, 255, 0));
        assert_eq!(address.to_string(), "192.168.1.2/24");
    }

    #[test]
    fn test_ipv4_prefix_bounds() {
        assert!(Ipv4Address::from_prefix("10.0.0.1/0").is_ok());
        assert!(Ipv4Address::from_prefix("10.0.0.1/32").is_ok());
        assert!(Ipv4Address::from_prefix("10.0.0.1/33").is_err());
        assert!(Ipv4Address::from_prefix("10.0.0.1/-1").is_err());
        assert!(Ipv4Address::from_prefix("10.0.0.1").is_err());
        assert!(Ipv4Address::from_prefix("10.0.0/24").is_err());
    }

    #[test]
    fn test_ipv4_from_mask() {
        let expected = Ipv4Address::new(Ipv4Addr::new(192, 168, 1, 2), 24).unwrap();
        assert_eq!(Ipv4Address::from_mask("192.168.1.2", "255.255.255.0").unwrap(), expected);
        assert_eq!(Ipv4Address::from_mask("10.0.0.1", "0.0.0.0").unwrap().prefix(), 0);
        assert_eq!(Ipv4Address::from_mask("10.0.0.1", "255.255.255.255").unwrap().prefix(), 32);
    }

    #[test]
    fn test_ipv4_from_mask_rejects_holes() {
        assert!(matches!(
            Ipv4Address::from_mask("10.0.0.1", "255.0.255.0"),
            Err(GatewayError::ParseError(_))
        ));
        assert!(Ipv4Address::from_mask("10.0.0.1", "not-a-mask").is_err());
    }

    #[test]
    fn test_ipv4_mask_edges() {
        assert_eq!(Ipv4Address::from_prefix("0.0.0.0/0").unwrap().mask(), Ipv4Addr::new(0, 0, 0, 0));
        assert_eq!(Ipv4Address::from_prefix("10.0.0.0/16").unwrap().mask(), Ipv4Addr::new(255, 255, 0, 0));
        assert_eq!(Ipv4Address::from_prefix("10.0.0.1/32").unwrap().mask(), Ipv4Addr::new(255, 255, 255, 255));
    }

    #[test]
    fn test_ipv4_json() {
        let address = Ipv4Address::from_prefix("10.0.0.2/16").unwrap();
        assert_eq!(
            serde_json::to_value(address).unwrap(),
            json!({"address": "10.0.0.2", "prefix": 16, "mask": "255.255.0.0"})
        );

        let from_mask: Ipv4Address =
            serde_json::from_value(json!({"address": "10.0.0.2", "mask": "255.255.0.0"})).unwrap();
        assert_eq!(from_mask, address);

        let from_prefix: Ipv4Address = serde_json::from_value(json!({"address": "10.0.0.2", "prefix": 16})).unwrap();
        assert_eq!(from_prefix, address);

        assert!(serde_json::from_value::<Ipv4Address>(json!({"address": "10.0.0.2"})).is_err());
    }

    #[test]
    fn test_ipv6_from_prefix() {
        let address = Ipv6Address::from_prefix("2001:470:5bb2::2/64").unwrap();
        assert_eq!(address.prefix(), 64);
        assert_eq!(address.to_string(), "2001:470:5bb2::2/64");
        assert!(Ipv6Address::from_prefix("::1/128").is_ok());
        assert!(Ipv6Address::from_prefix("::1/129").is_err());
        assert!(Ipv6Address::from_prefix("192.168.1.1/24").is_err());
    }

    #[test]
    fn test_ipv6_json() {
        let address = Ipv6Address::from_prefix("2001:470:5bb2:2::2/64").unwrap();
        let value = serde_json::to_value(address).unwrap();
        assert_eq!(value, json!({"address": "2001:470:5bb2:2::2", "prefix": 64}));
        assert_eq!(serde_json::from_value::<Ipv6Address>(value).unwrap(), address);
        assert!(serde_json::from_value::<Ipv6Address>(json!({"address": "::1", "prefix": 200})).is_err());
    }

    #[test]
    fn test_multi_address_version() {
        let v4 = MultiAddress::from_prefix("10.0.0.0/24").unwrap();
        let v6 = MultiAddress::from_prefix("fd00::/48").unwrap();
        assert_eq!(v4.version(), 4);
        assert_eq!(v6.version(), 6);
        assert_eq!(v4.to_string(), "10.0.0.0/24");
        assert_eq!(v6.to_string(), "fd00::/48");
        assert!(MultiAddress::from_prefix("10.0.0.0/40").is_err());
    }
}
