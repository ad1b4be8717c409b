//! NetworkManager connection profiles through `nmcli connection`

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::connection::{Connection, ConnectionDetail, ConnectionType};
use super::NmCliEntity;
use crate::command::{CommandOutput, CommandRunner};
use crate::error::{GatewayError, GatewayResult};

/// nmcli exit code for an unknown connection or device
pub(crate) const NMCLI_NOT_FOUND: i32 = 10;

pub struct ConnectionManager {
    runner: Arc<dyn CommandRunner>,
}

impl ConnectionManager {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    async fn nmcli(&self, command: &str) -> GatewayResult<CommandOutput> {
        let output = self.runner.run(command, true, None).await?;
        match output.exit_code {
            0 => Ok(output),
            NMCLI_NOT_FOUND => Err(GatewayError::NonexistentConnection(output.stderr)),
            _ => Err(GatewayError::NetworkManager(output.stderr)),
        }
    }

    /// List connection profiles, optionally of one type only
    pub async fn list(&self, connection_type: Option<ConnectionType>) -> GatewayResult<Vec<Connection>> {
        let output = self.nmcli("nmcli -t -f NAME,UUID,TYPE,DEVICE connection show").await?;
        let mut connections = Vec::new();
        for row in output.stdout.lines().filter(|row| !row.trim().is_empty()) {
            match Connection::from_terse_row(row) {
                Ok(connection) => connections.push(connection),
                Err(e) => warn!("Skipping connection row '{}': {}", row, e),
            }
        }
        if let Some(connection_type) = connection_type {
            connections.retain(|c| c.connection_type == connection_type);
        }
        Ok(connections)
    }

    pub async fn get(&self, uuid: Uuid) -> GatewayResult<ConnectionDetail> {
        let output = self.nmcli(&format!("nmcli -t -s connection show {}", uuid)).await?;
        ConnectionDetail::from_nmcli_text(&output.stdout)
    }

    /// Create a connection profile and return the UUID NetworkManager assigned
    pub async fn add(&self, connection: &ConnectionDetail) -> GatewayResult<Uuid> {
        connection.validate()?;
        let command = format!(
            "nmcli -t connection add type \"{}\" {}",
            connection.connection_type,
            connection.nmcli_serialize()
        );
        let output = self.nmcli(&command).await?;
        let uuid = scan_uuid(&output.stdout).ok_or_else(|| {
            GatewayError::NetworkManager(format!("No connection UUID in nmcli output: {}", output.stdout))
        })?;
        info!("Created connection '{}' ({})", connection.name, uuid);
        Ok(uuid)
    }

    /// Update a connection from a REST document
    ///
    /// UUID and type always come from the stored profile, name and interface
    /// only when the document leaves them out.
    pub async fn edit(&self, uuid: Uuid, json: Value) -> GatewayResult<()> {
        let current = self.get(uuid).await?;
        let mut json = json;
        let object = json
            .as_object_mut()
            .ok_or_else(|| GatewayError::InvalidParameter("Connection must be a JSON object".to_string()))?;
        object.insert("uuid".to_string(), Value::String(uuid.to_string()));
        object.insert("type".to_string(), Value::String(current.connection_type.to_string()));
        object.entry("name").or_insert_with(|| Value::String(current.name.clone()));
        object.entry("interface").or_insert_with(|| Value::String(current.interface.clone()));

        let connection: ConnectionDetail =
            serde_json::from_value(json).map_err(|e| GatewayError::InvalidParameter(e.to_string()))?;
        connection.validate()?;
        self.modify(uuid, &connection).await
    }

    async fn modify(&self, uuid: Uuid, connection: &ConnectionDetail) -> GatewayResult<()> {
        let command = format!("nmcli -t connection modify {} {}", uuid, connection.nmcli_serialize());
        self.nmcli(&command).await?;
        info!("Updated connection {}", uuid);
        Ok(())
    }

    pub async fn delete(&self, uuid: Uuid) -> GatewayResult<()> {
        self.nmcli(&format!("nmcli -t connection delete {}", uuid)).await?;
        info!("Deleted connection {}", uuid);
        Ok(())
    }

    /// Activate a connection, optionally on a specific interface
    pub async fn up(&self, uuid: Uuid, interface: Option<&str>) -> GatewayResult<()> {
        let mut command = format!("nmcli -t connection up {}", uuid);
        if let Some(interface) = interface {
            crate::validation::validate_interface_name(interface)?;
            command.push_str(" ifname ");
            command.push_str(interface);
        }
        self.nmcli(&command).await?;
        info!("Activated connection {}", uuid);
        Ok(())
    }

    pub async fn down(&self, uuid: Uuid) -> GatewayResult<()> {
        self.nmcli(&format!("nmcli -t connection down {}", uuid)).await?;
        info!("Deactivated connection {}", uuid);
        Ok(())
    }
}

/// Find the first UUID in `Connection 'x' (uuid) successfully added.`
fn scan_uuid(text: &str) -> Option<Uuid> {
    let uuid = text
        .split(|c: char| !(c.is_ascii_hexdigit() || c == '-'))
        .filter(|token| token.len() == 36)
        .find_map(|token| Uuid::parse_str(token).ok());
    if uuid.is_none() {
        debug!("No UUID found in '{}'", text);
    }
    uuid
}
