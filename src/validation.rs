//! Input validation
//!
//! Values that end up on a shell command line are checked here before any
//! command is built.

use crate::error::{GatewayError, GatewayResult};
use std::net::IpAddr;

/// Maximum length for interface names (Linux kernel limit is 15)
const MAX_INTERFACE_NAME_LEN: usize = 15;

/// Highest usable 802.1Q VLAN ID
const MAX_VLAN_ID: u16 = 4094;

/// Length of a base64 encoded 32-byte WireGuard key
const WIREGUARD_KEY_LEN: usize = 44;

/// Validate interface name to prevent command injection
///
/// Interface names must be alphanumeric with optional dashes, underscores and
/// dots (VLAN sub-interfaces), and no longer than 15 characters
pub fn validate_interface_name(name: &str) -> GatewayResult<()> {
    if name.is_empty() {
        return Err(GatewayError::InvalidParameter(
            "Interface name cannot be empty".to_string()
        ));
    }

    if name.len() > MAX_INTERFACE_NAME_LEN {
        return Err(GatewayError::InvalidParameter(
            format!("Interface name too long (max {} characters)", MAX_INTERFACE_NAME_LEN)
        ));
    }

    for c in name.chars() {
        if !c.is_ascii_alphanumeric() && c != '-' && c != '_' && c != '.' {
            return Err(GatewayError::InvalidParameter(
                format!("Invalid interface name '{}': contains invalid character '{}'", name, c)
            ));
        }
    }

    // Would be taken for an option
    if name.starts_with('-') {
        return Err(GatewayError::InvalidParameter(
            "Interface name cannot start with dash".to_string()
        ));
    }

    Ok(())
}

/// Validate IP address
pub fn validate_ip_address(addr: &str) -> GatewayResult<IpAddr> {
    addr.parse::<IpAddr>()
        .map_err(|_| GatewayError::InvalidParameter(
            format!("Invalid IP address: {}", addr)
        ))
}

/// Validate prefix length for IPv4 or IPv6
pub fn validate_prefix_length(prefix: u8, is_ipv6: bool) -> GatewayResult<()> {
    let max = if is_ipv6 { 128 } else { 32 };
    if prefix > max {
        return Err(GatewayError::InvalidParameter(
            format!("Invalid prefix length {} (max {})", prefix, max)
        ));
    }
    Ok(())
}

/// Validate WiFi SSID (1-32 bytes, no control characters)
pub fn validate_ssid(ssid: &str) -> GatewayResult<()> {
    if ssid.is_empty() {
        return Err(GatewayError::InvalidParameter(
            "SSID cannot be empty".to_string()
        ));
    }

    if ssid.len() > 32 {
        return Err(GatewayError::InvalidParameter(
            "SSID cannot exceed 32 bytes".to_string()
        ));
    }

    if ssid.chars().any(|c| c.is_control()) {
        return Err(GatewayError::InvalidParameter(
            "SSID contains invalid control characters".to_string()
        ));
    }

    Ok(())
}

/// Validate 802.1Q VLAN ID
pub fn validate_vlan_id(id: u16) -> GatewayResult<()> {
    if id > MAX_VLAN_ID {
        return Err(GatewayError::InvalidParameter(
            format!("VLAN ID {} out of range (0-{})", id, MAX_VLAN_ID)
        ));
    }
    Ok(())
}

/// Validate a UDP port; port 0 is rejected
pub fn validate_port(port: u32) -> GatewayResult<u16> {
    match u16::try_from(port) {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(GatewayError::InvalidParameter(
            format!("Invalid port: {}", port)
        )),
    }
}

/// Validate a WireGuard key: base64 text of exactly 32 bytes
pub fn validate_wireguard_key(key: &str) -> GatewayResult<()> {
    let invalid = || GatewayError::InvalidParameter("Invalid WireGuard key".to_string());

    if key.len() != WIREGUARD_KEY_LEN || !key.ends_with('=') {
        return Err(invalid());
    }

    let body = &key[..WIREGUARD_KEY_LEN - 1];
    if !body.chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/') {
        return Err(invalid());
    }

    // 32 bytes leave the two lowest bits of the last symbol unused
    let last = body.chars().last().ok_or_else(invalid)?;
    if !"AEIMQUYcgkosw048".contains(last) {
        return Err(invalid());
    }

    Ok(())
}

/// Validate hostname or IP address of a remote endpoint
pub fn validate_hostname(host: &str) -> GatewayResult<()> {
    if host.is_empty() {
        return Err(GatewayError::InvalidParameter(
            "Hostname cannot be empty".to_string()
        ));
    }

    if host.len() > 253 {
        return Err(GatewayError::InvalidParameter(
            "Hostname too long".to_string()
        ));
    }

    if host.parse::<IpAddr>().is_ok() {
        return Ok(());
    }

    for c in host.chars() {
        if !c.is_ascii_alphanumeric() && c != '-' && c != '.' {
            return Err(GatewayError::InvalidParameter(
                format!("Invalid hostname character: {}", c)
            ));
        }
    }

    if host.starts_with('-') || host.starts_with('.') ||
       host.ends_with('-') || host.ends_with('.') {
        return Err(GatewayError::InvalidParameter(
            "Invalid hostname format".to_string()
        ));
    }

    Ok(())
}
