//! Network connection profiles

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::autoconnect::AutoConnect;
use super::gsm::GsmConnection;
use super::ipv4::Ipv4Connection;
use super::ipv6::Ipv6Connection;
use super::nmcli::{self, NmCliOutput};
use super::vlan::VlanConfiguration;
use super::wifi::WifiConnection;
use super::NmCliEntity;
use crate::error::{GatewayError, GatewayResult};

const NMCLI_PREFIX: &str = "connection";

/// NetworkManager connection types, named as `connection.type` spells them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionType {
    #[serde(rename = "802-3-ethernet")]
    Ethernet,
    #[serde(rename = "802-11-wireless")]
    Wifi,
    #[serde(rename = "gsm")]
    Gsm,
    #[serde(rename = "vlan")]
    Vlan,
    #[serde(rename = "wireguard")]
    Wireguard,
    #[serde(rename = "bluetooth")]
    Bluetooth,
    #[serde(rename = "bridge")]
    Bridge,
    #[serde(rename = "bond")]
    Bond,
    #[serde(rename = "dummy")]
    Dummy,
    #[serde(rename = "infiniband")]
    Infiniband,
    #[serde(rename = "ip-tunnel")]
    IpTunnel,
    #[serde(rename = "loopback")]
    Loopback,
    #[serde(rename = "tun")]
    Tun,
    #[serde(rename = "vpn")]
    Vpn,
    #[serde(rename = "wimax")]
    Wimax,
    #[serde(rename = "wpan")]
    Wpan,
}

impl ConnectionType {
    pub const ALL: [ConnectionType; 16] = [
        ConnectionType::Ethernet,
        ConnectionType::Wifi,
        ConnectionType::Gsm,
        ConnectionType::Vlan,
        ConnectionType::Wireguard,
        ConnectionType::Bluetooth,
        ConnectionType::Bridge,
        ConnectionType::Bond,
        ConnectionType::Dummy,
        ConnectionType::Infiniband,
        ConnectionType::IpTunnel,
        ConnectionType::Loopback,
        ConnectionType::Tun,
        ConnectionType::Vpn,
        ConnectionType::Wimax,
        ConnectionType::Wpan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionType::Ethernet => "802-3-ethernet",
            ConnectionType::Wifi => "802-11-wireless",
            ConnectionType::Gsm => "gsm",
            ConnectionType::Vlan => "vlan",
            ConnectionType::Wireguard => "wireguard",
            ConnectionType::Bluetooth => "bluetooth",
            ConnectionType::Bridge => "bridge",
            ConnectionType::Bond => "bond",
            ConnectionType::Dummy => "dummy",
            ConnectionType::Infiniband => "infiniband",
            ConnectionType::IpTunnel => "ip-tunnel",
            ConnectionType::Loopback => "loopback",
            ConnectionType::Tun => "tun",
            ConnectionType::Vpn => "vpn",
            ConnectionType::Wimax => "wimax",
            ConnectionType::Wpan => "wpan",
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionType {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| GatewayError::ParseError(format!("Unknown connection type: {}", s)))
    }
}

/// Row of `nmcli -t -f NAME,UUID,TYPE,DEVICE connection show`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub name: String,
    pub uuid: Uuid,
    #[serde(rename = "type")]
    pub connection_type: ConnectionType,
    /// `None` when the connection is not bound to a device
    pub interface_name: Option<String>,
}

impl Connection {
    pub fn from_terse_row(row: &str) -> GatewayResult<Self> {
        let fields = nmcli::split_terse_row(row);
        if fields.len() != 4 {
            return Err(GatewayError::ParseError(format!("Malformed connection row: {}", row)));
        }
        let uuid = Uuid::parse_str(&fields[1])
            .map_err(|_| GatewayError::ParseError(format!("Invalid connection UUID: {}", fields[1])))?;
        let interface_name = match fields[3].trim() {
            "" | "--" => None,
            device => Some(device.to_string()),
        };
        Ok(Self {
            name: fields[0].clone(),
            uuid,
            connection_type: fields[2].parse()?,
            interface_name,
        })
    }
}

/// Complete connection profile as exchanged with the REST layer
///
/// `uuid` is absent only for profiles that were not created yet. Exactly one
/// medium block (`wifi`, `gsm`, `vlan`) is present, matching `connection_type`,
/// or none for media without extra settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ConnectionDetailJson")]
pub struct ConnectionDetail {
    pub name: String,
    pub uuid: Option<Uuid>,
    #[serde(rename = "type")]
    pub connection_type: ConnectionType,
    pub interface: String,
    pub auto_connect: AutoConnect,
    pub ipv4: Ipv4Connection,
    pub ipv6: Ipv6Connection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wifi: Option<WifiConnection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gsm: Option<GsmConnection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan: Option<VlanConfiguration>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionDetailJson {
    name: String,
    #[serde(default)]
    uuid: Option<String>,
    #[serde(rename = "type")]
    connection_type: ConnectionType,
    #[serde(default)]
    interface: Option<String>,
    #[serde(default)]
    auto_connect: AutoConnect,
    ipv4: Ipv4Connection,
    ipv6: Ipv6Connection,
    #[serde(default)]
    wifi: Option<WifiConnection>,
    #[serde(default)]
    gsm: Option<GsmConnection>,
    #[serde(default)]
    vlan: Option<VlanConfiguration>,
}

impl TryFrom<ConnectionDetailJson> for ConnectionDetail {
    type Error = GatewayError;

    fn try_from(json: ConnectionDetailJson) -> Result<Self, Self::Error> {
        let uuid = match json.uuid.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(uuid) => Some(
                Uuid::parse_str(uuid)
                    .map_err(|_| GatewayError::InvalidParameter(format!("Invalid connection UUID: {}", uuid)))?,
            ),
        };
        let detail = Self {
            name: json.name,
            uuid,
            connection_type: json.connection_type,
            interface: json.interface.unwrap_or_default(),
            auto_connect: json.auto_connect,
            ipv4: json.ipv4,
            ipv6: json.ipv6,
            wifi: json.wifi.filter(|_| json.connection_type == ConnectionType::Wifi),
            gsm: json.gsm.filter(|_| json.connection_type == ConnectionType::Gsm),
            vlan: json.vlan.filter(|_| json.connection_type == ConnectionType::Vlan),
        };
        detail.check_medium()?;
        Ok(detail)
    }
}

impl ConnectionDetail {
    /// Ensure the settings block required by the connection type is present
    pub fn check_medium(&self) -> GatewayResult<()> {
        let missing = match self.connection_type {
            ConnectionType::Wifi if self.wifi.is_none() => Some("wifi"),
            ConnectionType::Gsm if self.gsm.is_none() => Some("gsm"),
            ConnectionType::Vlan if self.vlan.is_none() => Some("vlan"),
            _ => None,
        };
        match missing {
            Some(block) => Err(GatewayError::InvalidParameter(format!(
                "Connection of type {} requires {} settings",
                self.connection_type, block
            ))),
            None => Ok(()),
        }
    }

    /// Validate values that end up on the nmcli command line
    pub fn validate(&self) -> GatewayResult<()> {
        if self.name.trim().is_empty() {
            return Err(GatewayError::InvalidParameter("Connection name cannot be empty".to_string()));
        }
        if !self.interface.is_empty() {
            crate::validation::validate_interface_name(&self.interface)?;
        }
        self.check_medium()?;
        if let Some(wifi) = &self.wifi {
            crate::validation::validate_ssid(&wifi.ssid)?;
        }
        if let Some(vlan) = &self.vlan {
            vlan.validate()?;
        }
        Ok(())
    }
}

impl NmCliEntity for ConnectionDetail {
    fn nmcli_deserialize(output: &NmCliOutput) -> GatewayResult<Self> {
        let section = output.section(NMCLI_PREFIX);
        let uuid = Uuid::parse_str(section.get("uuid").trim())
            .map_err(|_| GatewayError::ParseError(format!("Invalid connection.uuid: {}", section.get("uuid"))))?;
        let connection_type: ConnectionType = section
            .value("type")
            .ok_or_else(|| GatewayError::ParseError("Missing connection.type".to_string()))?
            .parse()?;
        let interface = section
            .value("interface-name")
            .or_else(|| output.section("GENERAL").value("DEVICES"))
            .unwrap_or_default()
            .to_string();

        let wifi = match connection_type {
            ConnectionType::Wifi => Some(WifiConnection::nmcli_deserialize(output)?),
            _ => None,
        };
        let gsm = match connection_type {
            ConnectionType::Gsm => Some(GsmConnection::nmcli_deserialize(output)?),
            _ => None,
        };
        let vlan = match connection_type {
            ConnectionType::Vlan => Some(VlanConfiguration::nmcli_deserialize(output)?),
            _ => None,
        };

        Ok(Self {
            name: section.get("id").to_string(),
            uuid: Some(uuid),
            connection_type,
            interface,
            auto_connect: AutoConnect::nmcli_deserialize(output)?,
            ipv4: Ipv4Connection::nmcli_deserialize(output)?,
            ipv6: Ipv6Connection::nmcli_deserialize(output)?,
            wifi,
            gsm,
            vlan,
        })
    }

    fn nmcli_serialize(&self) -> String {
        let mut fragment = nmcli::encode(
            NMCLI_PREFIX,
            [("id", self.name.as_str()), ("interface-name", self.interface.as_str())],
        );
        fragment.push_str(&self.auto_connect.nmcli_serialize());
        fragment.push_str(&self.ipv4.nmcli_serialize());
        fragment.push_str(&self.ipv6.nmcli_serialize());
        if let Some(wifi) = &self.wifi {
            fragment.push_str(&wifi.nmcli_serialize());
        }
        if let Some(gsm) = &self.gsm {
            fragment.push_str(&gsm.nmcli_serialize());
        }
        if let Some(vlan) = &self.vlan {
            fragment.push_str(&vlan.nmcli_serialize());
        }
        fragment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::ipv4::Ipv4Method;
    use crate::network::ipv6::Ipv6Method;
    use serde_json::json;

    const ETHERNET: &str = "connection.id:eth0\n\
                            connection.uuid:25ab1b06-2a86-40a9-950f-1c576ddcd35a\n\
                            connection.type:802-3-ethernet\n\
                            connection.interface-name:\n\
                            connection.autoconnect:yes\n\
                            connection.autoconnect-priority:0\n\
                            connection.autoconnect-retries:-1 (default)\n\
                            ipv4.method:auto\n\
                            ipv4.addresses:\n\
                            ipv4.gateway:--\n\
                            ipv4.dns:\n\
                            ipv6.method:auto\n\
                            ipv6.addresses:\n\
                            ipv6.gateway:--\n\
                            ipv6.dns:\n\
                            GENERAL.DEVICES:eth0\n";

    #[test]
    fn test_connection_type_strings() {
        for connection_type in ConnectionType::ALL {
            assert_eq!(connection_type.as_str().parse::<ConnectionType>().unwrap(), connection_type);
            assert_eq!(
                serde_json::to_value(connection_type).unwrap(),
                json!(connection_type.as_str())
            );
        }
        assert!("ethernet".parse::<ConnectionType>().is_err());
    }

    #[test]
    fn test_connection_row() {
        let row = "eth0:25ab1b06-2a86-40a9-950f-1c576ddcd35a:802-3-ethernet:eth0";
        let connection = Connection::from_terse_row(row).unwrap();
        assert_eq!(connection.name, "eth0");
        assert_eq!(connection.connection_type, ConnectionType::Ethernet);
        assert_eq!(connection.interface_name.as_deref(), Some("eth0"));

        let row = "wlan0:dd1c59ea-6f5d-471c-8fe7-e066761b9764:802-11-wireless:";
        let connection = Connection::from_terse_row(row).unwrap();
        assert_eq!(connection.interface_name, None);
        assert_eq!(
            serde_json::to_value(&connection).unwrap(),
            json!({
                "name": "wlan0",
                "uuid": "dd1c59ea-6f5d-471c-8fe7-e066761b9764",
                "type": "802-11-wireless",
                "interfaceName": null,
            })
        );

        assert!(Connection::from_terse_row("eth0:not-a-uuid:802-3-ethernet:eth0").is_err());
        assert!(Connection::from_terse_row("eth0").is_err());
    }

    #[test]
    fn test_nmcli_deserialize_uses_general_devices() {
        let detail = ConnectionDetail::from_nmcli_text(ETHERNET).unwrap();
        assert_eq!(detail.name, "eth0");
        assert_eq!(detail.uuid, Some(Uuid::parse_str("25ab1b06-2a86-40a9-950f-1c576ddcd35a").unwrap()));
        assert_eq!(detail.connection_type, ConnectionType::Ethernet);
        assert_eq!(detail.interface, "eth0");
        assert_eq!(detail.auto_connect, AutoConnect::default());
        assert_eq!(detail.ipv4.method, Ipv4Method::Auto);
        assert_eq!(detail.ipv6.method, Ipv6Method::Auto);
        assert!(detail.wifi.is_none());
    }

    #[test]
    fn test_nmcli_serialize() {
        let detail = ConnectionDetail::from_nmcli_text(ETHERNET).unwrap();
        assert_eq!(
            detail.nmcli_serialize(),
            "connection.id \"eth0\" connection.interface-name \"eth0\" \
             connection.autoconnect \"yes\" connection.autoconnect-priority \"0\" connection.autoconnect-retries \"-1\" \
             ipv4.method \"auto\" ipv4.addresses \"\" ipv4.gateway \"\" ipv4.dns \"\" \
             ipv6.method \"auto\" ipv6.addresses \"\" ipv6.gateway \"\" ipv6.dns \"\" "
        );
    }

    #[test]
    fn test_nmcli_deserialize_rejects_bad_uuid() {
        let text = ETHERNET.replace("25ab1b06-2a86-40a9-950f-1c576ddcd35a", "nope");
        assert!(ConnectionDetail::from_nmcli_text(&text).is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let detail = ConnectionDetail::from_nmcli_text(ETHERNET).unwrap();
        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["type"], "802-3-ethernet");
        assert_eq!(value["interface"], "eth0");
        assert_eq!(value["autoConnect"], json!({"enabled": true, "priority": 0, "retries": -1}));
        assert!(value.get("wifi").is_none());
        assert_eq!(serde_json::from_value::<ConnectionDetail>(value).unwrap(), detail);
    }

    #[test]
    fn test_json_new_connection_without_uuid() {
        let value = json!({
            "name": "office",
            "type": "802-3-ethernet",
            "interface": "eth1",
            "autoConnect": {"enabled": false, "priority": 5, "retries": 3},
            "ipv4": {"method": "auto", "addresses": [], "gateway": null, "dns": []},
            "ipv6": {"method": "ignore", "addresses": [], "gateway": null, "dns": []},
        });
        let detail: ConnectionDetail = serde_json::from_value(value).unwrap();
        assert_eq!(detail.uuid, None);
        assert!(!detail.auto_connect.enabled);
        assert!(detail.validate().is_ok());
    }

    #[test]
    fn test_json_invalid_uuid_and_missing_medium() {
        let mut value = json!({
            "name": "office",
            "uuid": "xyz",
            "type": "802-3-ethernet",
            "interface": "eth1",
            "ipv4": {"method": "auto"},
            "ipv6": {"method": "auto"},
        });
        assert!(serde_json::from_value::<ConnectionDetail>(value.clone()).is_err());

        value["uuid"] = json!(null);
        value["type"] = json!("802-11-wireless");
        assert!(serde_json::from_value::<ConnectionDetail>(value).is_err());
    }
}
