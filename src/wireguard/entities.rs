//! WireGuard tunnels and peers
//!
//! Interfaces and peers live side by side in [`super::WireguardStore`] and
//! refer to each other by ID. [`WireguardTunnel`] is the resolved view of one
//! interface with its peers; it renders the `wg set` command line, the
//! wg-quick configuration and the REST document.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt::Write as _;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::{Path, PathBuf};

use crate::command::escape_shell_arg;
use crate::error::{GatewayError, GatewayResult};
use crate::network::address::{Ipv4Address, Ipv6Address, MultiAddress};
use crate::validation::{validate_ip_address, validate_prefix_length};

pub type InterfaceId = u64;
pub type PeerId = u64;
pub type AddressId = u64;

/// Allowed IP range of a peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireguardPeerAddress {
    pub id: Option<AddressId>,
    pub address: MultiAddress,
}

impl WireguardPeerAddress {
    pub fn new(address: MultiAddress) -> Self {
        Self { id: None, address }
    }
}

impl Serialize for WireguardPeerAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("address", &self.address.address().to_string())?;
        map.serialize_entry("prefix", &self.address.prefix())?;
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireguardPeer {
    pub id: Option<PeerId>,
    /// Owning interface, set once the peer is stored
    pub interface_id: Option<InterfaceId>,
    pub public_key: String,
    pub psk: Option<String>,
    /// Persistent keepalive interval in seconds
    pub keepalive: u32,
    pub endpoint: String,
    pub port: u16,
    pub addresses: Vec<WireguardPeerAddress>,
}

impl WireguardPeer {
    pub fn new(public_key: impl Into<String>, psk: Option<String>, keepalive: u32, endpoint: impl Into<String>, port: u16) -> Self {
        Self {
            id: None,
            interface_id: None,
            public_key: public_key.into(),
            psk: psk.filter(|psk| !psk.is_empty()),
            keepalive,
            endpoint: endpoint.into(),
            port,
            addresses: Vec::new(),
        }
    }

    pub fn add_address(&mut self, address: MultiAddress) {
        self.addresses.push(WireguardPeerAddress::new(address));
    }

    /// Allowed IPs, IPv4 ranges first
    pub fn allowed_ips(&self) -> Vec<MultiAddress> {
        let (mut v4, v6): (Vec<_>, Vec<_>) = self
            .addresses
            .iter()
            .map(|a| a.address)
            .partition(|a| a.version() == 4);
        v4.extend(v6);
        v4
    }

    fn allowed_ips_joined(&self) -> String {
        self.allowed_ips().iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
    }

    /// `peer` clause of a `wg set` command
    ///
    /// `wg` reads the PSK from a file; the clause is left out when the peer
    /// has no PSK or no file was written for it.
    pub fn wg_serialize(&self, psk_file: Option<&Path>) -> String {
        let mut command = format!("peer {}", escape_shell_arg(&self.public_key));
        if let Some(file) = psk_file.filter(|_| self.psk.is_some()) {
            let _ = write!(command, " preshared-key {}", escape_shell_arg(&file.to_string_lossy()));
        }
        let _ = write!(
            command,
            " endpoint {} persistent-keepalive {} allowed-ips {}",
            escape_shell_arg(&format!("{}:{}", self.endpoint, self.port)),
            escape_shell_arg(&self.keepalive.to_string()),
            escape_shell_arg(&self.allowed_ips_joined()),
        );
        command
    }

    /// `[Peer]` section of a wg-quick configuration
    pub fn to_conf(&self) -> String {
        let mut conf = String::from("[Peer]\n");
        let _ = writeln!(conf, "PublicKey = {}", self.public_key);
        if let Some(psk) = &self.psk {
            let _ = writeln!(conf, "PresharedKey = {}", psk);
        }
        let _ = writeln!(conf, "Endpoint = {}:{}", self.endpoint, self.port);
        let _ = writeln!(conf, "PersistentKeepalive = {}", self.keepalive);
        if !self.addresses.is_empty() {
            let _ = writeln!(conf, "AllowedIPs = {}", self.allowed_ips_joined());
        }
        conf
    }
}

impl Serialize for WireguardPeer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (ipv4, ipv6): (Vec<_>, Vec<_>) = self.addresses.iter().partition(|a| a.address.version() == 4);
        let allowed_ips = AllowedIpsOut { ipv4, ipv6 };

        let mut map = serializer.serialize_map(Some(7))?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("publicKey", &self.public_key)?;
        map.serialize_entry("psk", &self.psk)?;
        map.serialize_entry("keepalive", &self.keepalive)?;
        map.serialize_entry("endpoint", &self.endpoint)?;
        map.serialize_entry("port", &self.port)?;
        map.serialize_entry("allowedIPs", &allowed_ips)?;
        map.end()
    }
}

#[derive(Serialize)]
struct AllowedIpsOut<'a> {
    ipv4: Vec<&'a WireguardPeerAddress>,
    ipv6: Vec<&'a WireguardPeerAddress>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireguardInterface {
    pub id: Option<InterfaceId>,
    pub name: String,
    pub private_key: String,
    pub port: Option<u16>,
    pub ipv4: Option<Ipv4Address>,
    pub ipv6: Option<Ipv6Address>,
    pub peers: Vec<PeerId>,
}

impl WireguardInterface {
    pub fn new(name: impl Into<String>, private_key: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            id: None,
            name: name.into(),
            private_key: private_key.into(),
            port,
            ipv4: None,
            ipv6: None,
            peers: Vec::new(),
        }
    }

    pub fn ip_delete(&self) -> String {
        format!("ip link delete dev {}", self.name)
    }

    pub fn wg_status(&self) -> String {
        format!("wg show {}", self.name)
    }
}

/// Interface resolved together with its peers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireguardTunnel<'a> {
    pub interface: &'a WireguardInterface,
    pub peers: Vec<&'a WireguardPeer>,
}

impl<'a> WireguardTunnel<'a> {
    /// PSK files of the peers that have a PSK, as laid out under `dir`
    pub fn psk_files(&self, dir: &Path) -> Vec<(&'a WireguardPeer, PathBuf)> {
        self.peers
            .iter()
            .enumerate()
            .filter(|(_, peer)| peer.psk.is_some())
            .map(|(index, peer)| (*peer, dir.join(format!("{}.peer{}.psk", self.interface.name, index))))
            .collect()
    }

    /// `wg set` command configuring the interface and all its peers
    ///
    /// `wg` reads keys from files, so the private key is only passed when the
    /// caller has written one, and PSKs only when `psk_dir` holds the files
    /// named by [`Self::psk_files`].
    pub fn wg_serialize(&self, private_key_file: Option<&Path>, psk_dir: Option<&Path>) -> String {
        let mut command = format!("wg set {}", escape_shell_arg(&self.interface.name));
        if let Some(file) = private_key_file {
            let _ = write!(command, " private-key {}", escape_shell_arg(&file.to_string_lossy()));
        }
        if let Some(port) = self.interface.port {
            let _ = write!(command, " listen-port {}", escape_shell_arg(&port.to_string()));
        }
        let psk_files = psk_dir.map(|dir| self.psk_files(dir)).unwrap_or_default();
        for peer in &self.peers {
            let psk_file = psk_files
                .iter()
                .find(|(p, _)| std::ptr::eq(*p, *peer))
                .map(|(_, path)| path.as_path());
            command.push(' ');
            command.push_str(&peer.wg_serialize(psk_file));
        }
        command
    }

    /// Routes sending the peers' allowed IPs through the tunnel
    ///
    /// Ranges inside the tunnel's own subnets already have a kernel route and
    /// default routes are left to the uplink.
    pub fn routes(&self) -> GatewayResult<Vec<MultiAddress>> {
        let own: Vec<MultiAddress> = self
            .interface
            .ipv4
            .map(MultiAddress::from)
            .into_iter()
            .chain(self.interface.ipv6.map(MultiAddress::from))
            .collect();
        let mut routes: Vec<MultiAddress> = Vec::new();
        for peer in &self.peers {
            for range in peer.allowed_ips() {
                if range.prefix() == 0 || own.iter().any(|subnet| contains(subnet, &range)) {
                    continue;
                }
                let route = MultiAddress::new(network(range.address(), range.prefix()), range.prefix())?;
                if !routes.contains(&route) {
                    routes.push(route);
                }
            }
        }
        Ok(routes)
    }

    /// `ip` commands assigning the tunnel addresses, bringing the link up and
    /// routing the peers' allowed IPs
    pub fn ip_serialize(&self) -> GatewayResult<Vec<String>> {
        let name = escape_shell_arg(&self.interface.name);
        let mut commands = Vec::new();
        if let Some(ipv4) = &self.interface.ipv4 {
            commands.push(format!("ip -4 address add {} dev {}", escape_shell_arg(&ipv4.to_string()), name));
        }
        if let Some(ipv6) = &self.interface.ipv6 {
            commands.push(format!("ip -6 address add {} dev {}", escape_shell_arg(&ipv6.to_string()), name));
        }
        commands.push(format!("ip link set up dev {}", name));
        for route in self.routes()? {
            commands.push(format!(
                "ip -{} route add {} dev {}",
                route.version(),
                escape_shell_arg(&route.to_string()),
                name
            ));
        }
        Ok(commands)
    }

    /// wg-quick style configuration
    pub fn to_conf(&self) -> String {
        let interface = self.interface;
        let mut conf = String::from("[Interface]\n");
        let addresses: Vec<String> = interface
            .ipv4
            .iter()
            .map(ToString::to_string)
            .chain(interface.ipv6.iter().map(ToString::to_string))
            .collect();
        if !addresses.is_empty() {
            let _ = writeln!(conf, "Address = {}", addresses.join(", "));
        }
        if let Some(port) = interface.port {
            let _ = writeln!(conf, "ListenPort = {}", port);
        }
        let _ = writeln!(conf, "PrivateKey = {}", interface.private_key);
        for peer in &self.peers {
            conf.push('\n');
            conf.push_str(&peer.to_conf());
        }
        conf
    }
}

impl Serialize for WireguardTunnel<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let interface = self.interface;
        let mut map = serializer.serialize_map(Some(9))?;
        map.serialize_entry("id", &interface.id)?;
        map.serialize_entry("name", &interface.name)?;
        map.serialize_entry("privateKey", &interface.private_key)?;
        map.serialize_entry("port", &interface.port)?;
        map.serialize_entry("ipv4", &interface.ipv4.map(|a| a.address().to_string()))?;
        map.serialize_entry("ipv4Prefix", &interface.ipv4.map(|a| a.prefix()))?;
        map.serialize_entry("ipv6", &interface.ipv6.map(|a| a.address().to_string()))?;
        map.serialize_entry("ipv6Prefix", &interface.ipv6.map(|a| a.prefix()))?;
        map.serialize_entry("peers", &self.peers)?;
        map.end()
    }
}

/// First address of the `prefix` long range `address` lies in
fn network(address: IpAddr, prefix: u8) -> IpAddr {
    match address {
        IpAddr::V4(ip) => {
            let mask = u32::MAX.checked_shl(32 - u32::from(prefix.min(32))).unwrap_or(0);
            IpAddr::V4(Ipv4Addr::from(u32::from(ip) & mask))
        }
        IpAddr::V6(ip) => {
            let mask = u128::MAX.checked_shl(128 - u32::from(prefix.min(128))).unwrap_or(0);
            IpAddr::V6(Ipv6Addr::from(u128::from(ip) & mask))
        }
    }
}

fn contains(subnet: &MultiAddress, range: &MultiAddress) -> bool {
    subnet.version() == range.version()
        && subnet.prefix() <= range.prefix()
        && network(range.address(), subnet.prefix()) == network(subnet.address(), subnet.prefix())
}

/// `{address, prefix}` entry of a peer's allowed IPs
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PeerAddressRequest {
    #[serde(default)]
    pub id: Option<AddressId>,
    pub address: String,
    pub prefix: u8,
}

impl PeerAddressRequest {
    pub fn to_address(&self) -> GatewayResult<MultiAddress> {
        let address = validate_ip_address(self.address.trim())?;
        validate_prefix_length(self.prefix, address.is_ipv6())?;
        MultiAddress::new(address, self.prefix)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AllowedIpsRequest {
    #[serde(default)]
    pub ipv4: Vec<PeerAddressRequest>,
    #[serde(default)]
    pub ipv6: Vec<PeerAddressRequest>,
}

impl AllowedIpsRequest {
    pub fn iter(&self) -> impl Iterator<Item = &PeerAddressRequest> {
        self.ipv4.iter().chain(self.ipv6.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireguardPeerRequest {
    #[serde(default)]
    pub id: Option<PeerId>,
    pub public_key: String,
    #[serde(default)]
    pub psk: Option<String>,
    pub keepalive: u32,
    pub endpoint: String,
    pub port: u16,
    #[serde(rename = "allowedIPs", default)]
    pub allowed_ips: AllowedIpsRequest,
}

/// Interface document as sent by the REST client, or as read back from the store file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireguardInterfaceRequest {
    #[serde(default)]
    pub id: Option<InterfaceId>,
    pub name: String,
    pub private_key: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub ipv4: Option<String>,
    #[serde(default)]
    pub ipv4_prefix: Option<u8>,
    #[serde(default)]
    pub ipv6: Option<String>,
    #[serde(default)]
    pub ipv6_prefix: Option<u8>,
    #[serde(default)]
    pub peers: Vec<WireguardPeerRequest>,
}

impl WireguardInterfaceRequest {
    /// Build the interface without peers
    pub fn to_interface(&self) -> GatewayResult<WireguardInterface> {
        let mut interface = WireguardInterface::new(self.name.trim(), self.private_key.trim(), self.port);
        interface.id = self.id;
        interface.ipv4 = tunnel_address(self.ipv4.as_deref(), self.ipv4_prefix, "IPv4")?
            .map(|(address, prefix)| Ipv4Address::from_prefix(&format!("{}/{}", address, prefix)))
            .transpose()?;
        interface.ipv6 = tunnel_address(self.ipv6.as_deref(), self.ipv6_prefix, "IPv6")?
            .map(|(address, prefix)| Ipv6Address::from_prefix(&format!("{}/{}", address, prefix)))
            .transpose()?;
        Ok(interface)
    }
}

fn tunnel_address<'a>(address: Option<&'a str>, prefix: Option<u8>, family: &str) -> GatewayResult<Option<(&'a str, u8)>> {
    match (address.map(str::trim).filter(|a| !a.is_empty()), prefix) {
        (None, _) => Ok(None),
        (Some(address), Some(prefix)) => Ok(Some((address, prefix))),
        (Some(_), None) => Err(GatewayError::InvalidParameter(format!("Missing {} prefix", family))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PRIVATE_KEY: &str = "CHmgTLdcdr33Nr/GblDjKufGqWWxmnGv7a50hN6hZ0c=";
    const PUBLIC_KEY: &str = "Z4Csw6v+89bcamtek9elXmuIEA+6PeB6CLnjNh4dJzI=";
    const PSK: &str = "oC9WMZJs56UDp7NU2j8KfBn01zDLPRW2hGxivWC7Rhg=";

    fn peer() -> WireguardPeer {
        let mut peer = WireguardPeer::new(PUBLIC_KEY, Some(PSK.to_string()), 25, "vpn.example.org", 51280);
        peer.add_address(MultiAddress::from_prefix("::/48").unwrap());
        peer.add_address(MultiAddress::from_prefix("10.0.0.0/32").unwrap());
        peer
    }

    #[test]
    fn test_peer_wg_serialize() {
        let mut peer = WireguardPeer::new("PUBKEY", None, 25, "example.com", 51820);
        peer.add_address(MultiAddress::from_prefix("10.0.0.0/24").unwrap());
        assert_eq!(
            peer.wg_serialize(Some(Path::new("/etc/wireguard/unused.psk"))),
            "peer 'PUBKEY' endpoint 'example.com:51820' persistent-keepalive '25' allowed-ips '10.0.0.0/24'"
        );
    }

    #[test]
    fn test_peer_wg_serialize_with_psk() {
        let command = peer().wg_serialize(Some(Path::new("/etc/wireguard/wg0.peer0.psk")));
        assert_eq!(
            command,
            format!(
                "peer '{}' preshared-key '/etc/wireguard/wg0.peer0.psk' endpoint 'vpn.example.org:51280' \
                 persistent-keepalive '25' allowed-ips '10.0.0.0/32,::/48'",
                PUBLIC_KEY
            )
        );
        assert!(!command.contains(PSK));
        assert!(!peer().wg_serialize(None).contains("preshared-key"));
    }

    #[test]
    fn test_empty_psk_is_dropped() {
        let peer = WireguardPeer::new(PUBLIC_KEY, Some(String::new()), 25, "example.org", 51280);
        assert_eq!(peer.psk, None);
        assert!(!peer.wg_serialize(Some(Path::new("/tmp/wg0.peer0.psk"))).contains("preshared-key"));
    }

    #[test]
    fn test_peer_json() {
        let value = serde_json::to_value(peer()).unwrap();
        assert_eq!(
            value,
            json!({
                "id": null,
                "publicKey": PUBLIC_KEY,
                "psk": PSK,
                "keepalive": 25,
                "endpoint": "vpn.example.org",
                "port": 51280,
                "allowedIPs": {
                    "ipv4": [{"id": null, "address": "10.0.0.0", "prefix": 32}],
                    "ipv6": [{"id": null, "address": "::", "prefix": 48}],
                },
            })
        );
    }

    #[test]
    fn test_tunnel_wg_serialize() {
        let interface = WireguardInterface::new("wg0", PRIVATE_KEY, Some(51775));
        let tunnel = WireguardTunnel { interface: &interface, peers: vec![] };
        assert_eq!(tunnel.wg_serialize(None, None), "wg set 'wg0' listen-port '51775'");
        assert_eq!(
            tunnel.wg_serialize(Some(Path::new("/etc/wireguard/wg0.privatekey")), None),
            "wg set 'wg0' private-key '/etc/wireguard/wg0.privatekey' listen-port '51775'"
        );

        let peer = peer();
        let plain = WireguardPeer::new("PUBKEY", None, 0, "example.com", 51820);
        let tunnel = WireguardTunnel { interface: &interface, peers: vec![&plain, &peer] };
        let dir = Path::new("/etc/wireguard");
        assert_eq!(tunnel.psk_files(dir), vec![(&peer, dir.join("wg0.peer1.psk"))]);
        assert_eq!(
            tunnel.wg_serialize(None, Some(dir)),
            format!(
                "wg set 'wg0' listen-port '51775' {} {}",
                plain.wg_serialize(None),
                peer.wg_serialize(Some(&dir.join("wg0.peer1.psk")))
            )
        );
        assert!(!tunnel.wg_serialize(None, Some(dir)).contains(PSK));
        assert_eq!(interface.ip_delete(), "ip link delete dev wg0");
        assert_eq!(interface.wg_status(), "wg show wg0");
    }

    #[test]
    fn test_tunnel_json() {
        let mut interface = WireguardInterface::new("wg0", PRIVATE_KEY, None);
        let tunnel = WireguardTunnel { interface: &interface, peers: vec![] };
        assert_eq!(
            serde_json::to_value(&tunnel).unwrap(),
            json!({
                "id": null,
                "name": "wg0",
                "privateKey": PRIVATE_KEY,
                "port": null,
                "ipv4": null,
                "ipv4Prefix": null,
                "ipv6": null,
                "ipv6Prefix": null,
                "peers": [],
            })
        );

        interface.id = Some(1);
        interface.port = Some(51775);
        interface.ipv4 = Some(Ipv4Address::from_prefix("10.0.0.1/24").unwrap());
        interface.ipv6 = Some(Ipv6Address::from_prefix("fd00::1/64").unwrap());
        let tunnel = WireguardTunnel { interface: &interface, peers: vec![] };
        let value = serde_json::to_value(&tunnel).unwrap();
        assert_eq!(value["ipv4"], "10.0.0.1");
        assert_eq!(value["ipv4Prefix"], 24);
        assert_eq!(value["ipv6"], "fd00::1");
        assert_eq!(value["ipv6Prefix"], 64);
    }

    #[test]
    fn test_to_conf() {
        let mut interface = WireguardInterface::new("wg0", PRIVATE_KEY, Some(51775));
        interface.ipv4 = Some(Ipv4Address::from_prefix("10.0.0.1/24").unwrap());
        let peer = peer();
        let tunnel = WireguardTunnel { interface: &interface, peers: vec![&peer] };
        let expected = format!(
            "[Interface]\nAddress = 10.0.0.1/24\nListenPort = 51775\nPrivateKey = {}\n\n\
             [Peer]\nPublicKey = {}\nPresharedKey = {}\nEndpoint = vpn.example.org:51280\n\
             PersistentKeepalive = 25\nAllowedIPs = 10.0.0.0/32,::/48\n",
            PRIVATE_KEY, PUBLIC_KEY, PSK
        );
        assert_eq!(tunnel.to_conf(), expected);
    }

    #[test]
    fn test_ip_serialize() {
        let mut interface = WireguardInterface::new("wg0", PRIVATE_KEY, None);
        interface.ipv4 = Some(Ipv4Address::from_prefix("10.0.0.1/24").unwrap());
        let tunnel = WireguardTunnel { interface: &interface, peers: vec![] };
        assert_eq!(
            tunnel.ip_serialize().unwrap(),
            vec!["ip -4 address add '10.0.0.1/24' dev 'wg0'", "ip link set up dev 'wg0'"]
        );
    }

    #[test]
    fn test_ip_serialize_routes() {
        let mut interface = WireguardInterface::new("wg0", PRIVATE_KEY, None);
        interface.ipv4 = Some(Ipv4Address::from_prefix("10.0.0.1/24").unwrap());
        interface.ipv6 = Some(Ipv6Address::from_prefix("fd00::1/64").unwrap());
        let mut first = WireguardPeer::new(PUBLIC_KEY, None, 25, "vpn.example.org", 51280);
        for range in ["10.0.0.0/24", "192.168.5.7/24", "2001:db8::/32", "0.0.0.0/0", "fd00::5/128"] {
            first.add_address(MultiAddress::from_prefix(range).unwrap());
        }
        let mut second = WireguardPeer::new("PUBKEY", None, 25, "vpn.example.com", 51280);
        second.add_address(MultiAddress::from_prefix("192.168.5.0/24").unwrap());
        second.add_address(MultiAddress::from_prefix("172.16.0.0/12").unwrap());
        let tunnel = WireguardTunnel { interface: &interface, peers: vec![&first, &second] };

        assert_eq!(
            tunnel.ip_serialize().unwrap(),
            vec![
                "ip -4 address add '10.0.0.1/24' dev 'wg0'",
                "ip -6 address add 'fd00::1/64' dev 'wg0'",
                "ip link set up dev 'wg0'",
                "ip -4 route add '192.168.5.0/24' dev 'wg0'",
                "ip -6 route add '2001:db8::/32' dev 'wg0'",
                "ip -4 route add '172.16.0.0/12' dev 'wg0'",
            ]
        );
    }

    #[test]
    fn test_peer_address_request() {
        let address = PeerAddressRequest { id: None, address: " 10.1.0.0 ".to_string(), prefix: 16 };
        assert_eq!(address.to_address().unwrap(), MultiAddress::from_prefix("10.1.0.0/16").unwrap());

        let too_long = PeerAddressRequest { id: None, address: "10.1.0.0".to_string(), prefix: 33 };
        assert!(matches!(too_long.to_address(), Err(GatewayError::InvalidParameter(_))));
        let invalid = PeerAddressRequest { id: None, address: "10.1.0".to_string(), prefix: 16 };
        assert!(matches!(invalid.to_address(), Err(GatewayError::InvalidParameter(_))));
        let ipv6 = PeerAddressRequest { id: None, address: "fd00::".to_string(), prefix: 64 };
        assert_eq!(ipv6.to_address().unwrap().version(), 6);
    }

    #[test]
    fn test_interface_request() {
        let request: WireguardInterfaceRequest = serde_json::from_value(json!({
            "name": "wg0",
            "privateKey": PRIVATE_KEY,
            "port": 51775,
            "ipv4": "10.0.0.1",
            "ipv4Prefix": 24,
            "ipv6": "",
            "peers": [{
                "publicKey": PUBLIC_KEY,
                "psk": null,
                "keepalive": 25,
                "endpoint": "example.org",
                "port": 51280,
                "allowedIPs": {"ipv4": [{"address": "192.168.1.2", "prefix": 24}], "ipv6": []},
            }],
        }))
        .unwrap();
        let interface = request.to_interface().unwrap();
        assert_eq!(interface.ipv4.unwrap().to_string(), "10.0.0.1/24");
        assert_eq!(interface.ipv6, None);
        assert_eq!(request.peers[0].allowed_ips.iter().count(), 1);
        assert_eq!(
            request.peers[0].allowed_ips.ipv4[0].to_address().unwrap(),
            MultiAddress::from_prefix("192.168.1.2/24").unwrap()
        );

        let mut missing_prefix = request.clone();
        missing_prefix.ipv4_prefix = None;
        assert!(missing_prefix.to_interface().is_err());
    }
}
