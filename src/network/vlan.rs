//! 802.1Q VLAN connection settings

use serde::{Deserialize, Serialize};

use super::nmcli::{self, NmCliOutput};
use super::NmCliEntity;
use crate::error::{GatewayError, GatewayResult};
use crate::validation::validate_vlan_id;

const NMCLI_PREFIX: &str = "vlan";

const REORDER_HEADERS: u32 = 0x1;
const GVRP: u32 = 0x2;
const LOOSE_BINDING: u32 = 0x4;
const MVRP: u32 = 0x8;

/// VLAN behaviour flags, packed into a bitmask for nmcli
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VlanFlags {
    pub reorder_headers: bool,
    pub gvrp: bool,
    pub loose_binding: bool,
    pub mvrp: bool,
}

impl VlanFlags {
    pub fn new(reorder_headers: bool, gvrp: bool, loose_binding: bool, mvrp: bool) -> Self {
        Self {
            reorder_headers,
            gvrp,
            loose_binding,
            mvrp,
        }
    }

    pub fn from_bits(bits: u32) -> Self {
        Self {
            reorder_headers: bits & REORDER_HEADERS != 0,
            gvrp: bits & GVRP != 0,
            loose_binding: bits & LOOSE_BINDING != 0,
            mvrp: bits & MVRP != 0,
        }
    }

    pub fn bits(&self) -> u32 {
        let mut bits = 0;
        if self.reorder_headers {
            bits |= REORDER_HEADERS;
        }
        if self.gvrp {
            bits |= GVRP;
        }
        if self.loose_binding {
            bits |= LOOSE_BINDING;
        }
        if self.mvrp {
            bits |= MVRP;
        }
        bits
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VlanConfiguration {
    pub parent_interface: String,
    pub id: u16,
    #[serde(default)]
    pub flags: VlanFlags,
}

impl VlanConfiguration {
    pub fn validate(&self) -> GatewayResult<()> {
        if self.parent_interface.trim().is_empty() {
            return Err(GatewayError::InvalidParameter("VLAN parent interface is required".to_string()));
        }
        validate_vlan_id(self.id)
    }
}

impl NmCliEntity for VlanConfiguration {
    fn nmcli_deserialize(output: &NmCliOutput) -> GatewayResult<Self> {
        let section = output.section(NMCLI_PREFIX);
        let id = section
            .value("id")
            .and_then(|id| id.parse::<u16>().ok())
            .ok_or_else(|| GatewayError::ParseError(format!("Invalid vlan.id: {}", section.get("id"))))?;
        let flags = match section.value("flags") {
            Some(value) => nmcli::leading_integer(value)
                .and_then(|bits| u32::try_from(bits).ok())
                .map(VlanFlags::from_bits)
                .ok_or_else(|| GatewayError::ParseError(format!("Invalid vlan.flags: {}", value)))?,
            None => VlanFlags::default(),
        };
        Ok(Self {
            parent_interface: section.value("parent").unwrap_or_default().to_string(),
            id,
            flags,
        })
    }

    fn nmcli_serialize(&self) -> String {
        nmcli::encode(
            NMCLI_PREFIX,
            [
                ("parent", self.parent_interface.clone()),
                ("id", self.id.to_string()),
                ("flags", self.flags.bits().to_string()),
            ],
        )
    }
}
