//! Network devices through `nmcli device`

use std::sync::Arc;
use tracing::{info, warn};

use super::connection_manager::NMCLI_NOT_FOUND;
use super::interface::{AvailableConnection, InterfaceStatus, InterfaceType};
use super::nmcli::NmCliOutput;
use crate::command::{CommandOutput, CommandRunner};
use crate::error::{GatewayError, GatewayResult};
use crate::validation::validate_interface_name;

pub struct InterfaceManager {
    runner: Arc<dyn CommandRunner>,
}

impl InterfaceManager {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    async fn nmcli(&self, command: &str) -> GatewayResult<CommandOutput> {
        let output = self.runner.run(command, true, None).await?;
        match output.exit_code {
            0 => Ok(output),
            NMCLI_NOT_FOUND => Err(GatewayError::NonexistentDevice(output.stderr)),
            _ => Err(GatewayError::NetworkManager(output.stderr)),
        }
    }

    /// List devices, optionally of one type only
    pub async fn list(&self, interface_type: Option<InterfaceType>) -> GatewayResult<Vec<InterfaceStatus>> {
        let output = self.nmcli("nmcli -t device status").await?;
        let mut interfaces = Vec::new();
        for row in output.stdout.lines().filter(|row| !row.trim().is_empty()) {
            match InterfaceStatus::from_terse_row(row) {
                Ok(status) => interfaces.push(status),
                Err(e) => warn!("Skipping device row '{}': {}", row, e),
            }
        }
        if let Some(interface_type) = interface_type {
            interfaces.retain(|i| i.interface_type == interface_type);
        }
        Ok(interfaces)
    }

    /// Connection profiles that can be activated on a device
    pub async fn available_connections(&self, name: &str) -> GatewayResult<Vec<AvailableConnection>> {
        validate_interface_name(name)?;
        let output = self.nmcli(&format!("nmcli -t -f CONNECTIONS device show {}", name)).await?;
        NmCliOutput::parse(&output.stdout)
            .section("CONNECTIONS")
            .indexed("AVAILABLE-CONNECTIONS")
            .into_iter()
            .map(AvailableConnection::parse)
            .collect()
    }

    pub async fn connect(&self, name: &str) -> GatewayResult<()> {
        validate_interface_name(name)?;
        self.nmcli(&format!("nmcli -t device connect {}", name)).await?;
        info!("Connected device {}", name);
        Ok(())
    }

    pub async fn disconnect(&self, name: &str) -> GatewayResult<()> {
        validate_interface_name(name)?;
        self.nmcli(&format!("nmcli -t device disconnect {}", name)).await?;
        info!("Disconnected device {}", name);
        Ok(())
    }
}
