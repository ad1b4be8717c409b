//! WireGuard tunnel management through `wg` and `ip`

use serde::Serialize;
use std::fmt;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::entities::{
    InterfaceId, PeerAddressRequest, PeerId, WireguardInterfaceRequest, WireguardPeer, WireguardPeerRequest,
    WireguardTunnel,
};
use super::files::{delete_file, ensure_directory_exists, write_secure_file, SECRET_FILE_MODE};
use super::store::WireguardStore;
use crate::command::{CommandOutput, CommandRunner};
use crate::config::ConfigPaths;
use crate::error::{GatewayError, GatewayResult};
use crate::network::{InterfaceManager, InterfaceType};
use crate::validation::{validate_hostname, validate_interface_name, validate_port, validate_wireguard_key};

/// Exit code of `ip` for a malformed command line
const IP_SYNTAX_ERROR: i32 = 1;

/// Whether a tunnel link is up in the kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TunnelState {
    Active,
    Inactive,
}

impl TunnelState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TunnelState::Active => "active",
            TunnelState::Inactive => "inactive",
        }
    }
}

impl fmt::Display for TunnelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireguardKeyPair {
    pub private_key: String,
    pub public_key: String,
}

/// WireGuard manager
///
/// Owns the tunnel store; every mutation is written back to
/// `paths.wireguard_store` before the call returns.
pub struct WireguardManager {
    runner: Arc<dyn CommandRunner>,
    paths: ConfigPaths,
    store: WireguardStore,
}

impl WireguardManager {
    /// Create a manager backed by the store file in `paths`
    pub fn new(runner: Arc<dyn CommandRunner>, paths: ConfigPaths) -> GatewayResult<Self> {
        let store = WireguardStore::load_or_default(&paths.wireguard_store)?;
        Ok(Self::with_store(runner, paths, store))
    }

    pub fn with_store(runner: Arc<dyn CommandRunner>, paths: ConfigPaths, store: WireguardStore) -> Self {
        Self { runner, paths, store }
    }

    pub fn store(&self) -> &WireguardStore {
        &self.store
    }

    fn persist(&self) -> GatewayResult<()> {
        self.store.save(&self.paths.wireguard_store)
    }

    async fn run(&self, command: &str) -> GatewayResult<CommandOutput> {
        let output = self.runner.run(command, true, None).await?;
        if !output.is_success() {
            return Err(GatewayError::CommandFailed {
                cmd: command.to_string(),
                code: Some(output.exit_code),
                stderr: output.stderr,
            });
        }
        Ok(output)
    }

    pub fn list_interfaces(&self) -> Vec<WireguardTunnel<'_>> {
        self.store.tunnels()
    }

    pub fn get_interface(&self, id: InterfaceId) -> GatewayResult<WireguardTunnel<'_>> {
        self.store.tunnel(id)
    }

    pub async fn create_interface(&mut self, request: &WireguardInterfaceRequest) -> GatewayResult<InterfaceId> {
        self.validate_interface(request).await?;
        let id = self.store.create(request)?;
        self.persist()?;
        Ok(id)
    }

    pub async fn edit_interface(&mut self, id: InterfaceId, request: &WireguardInterfaceRequest) -> GatewayResult<()> {
        self.validate_interface(request).await?;
        self.store.update(id, request)?;
        self.persist()
    }

    /// Forget an interface, tear its link down if it is up and delete its
    /// key and configuration files
    pub async fn remove_interface(&mut self, id: InterfaceId) -> GatewayResult<()> {
        let interface = self.store.remove(id)?;
        self.persist()?;

        match self.is_tunnel_active(&interface.name).await {
            Ok(true) => {
                if !self.delete_tunnel(&interface.name).await.unwrap_or(false) {
                    warn!("Failed to delete WireGuard link {}", interface.name);
                }
            }
            Ok(false) => {}
            Err(e) => warn!("Failed to query WireGuard link {}: {}", interface.name, e),
        }
        for path in [self.private_key_path(&interface.name), self.config_path(&interface.name)] {
            if let Err(e) = delete_file(&path).await {
                warn!("Failed to delete {:?} of {}: {}", path, interface.name, e);
            }
        }
        Ok(())
    }

    async fn validate_interface(&self, request: &WireguardInterfaceRequest) -> GatewayResult<()> {
        validate_interface_name(request.name.trim())?;
        validate_wireguard_key(request.private_key.trim())?;
        if let Some(port) = request.port {
            validate_port(port.into())?;
        }
        request.to_interface()?;
        for peer in &request.peers {
            self.create_peer(peer, None).await?;
        }
        Ok(())
    }

    /// Build a validated peer from its REST document
    pub async fn create_peer(
        &self,
        request: &WireguardPeerRequest,
        interface_id: Option<InterfaceId>,
    ) -> GatewayResult<WireguardPeer> {
        let public_key = request.public_key.trim();
        validate_wireguard_key(public_key)?;
        if let Some(psk) = request.psk.as_deref().map(str::trim).filter(|psk| !psk.is_empty()) {
            validate_wireguard_key(psk)?;
        }
        let endpoint = request.endpoint.trim();
        self.validate_endpoint(endpoint).await?;
        let port = validate_port(request.port.into())?;

        let mut peer = WireguardPeer::new(
            public_key,
            request.psk.as_deref().map(|psk| psk.trim().to_string()),
            request.keepalive,
            endpoint,
            port,
        );
        peer.interface_id = interface_id;
        self.create_peer_addresses(request.allowed_ips.iter(), &mut peer)?;
        Ok(peer)
    }

    pub fn create_peer_addresses<'r>(
        &self,
        addresses: impl IntoIterator<Item = &'r PeerAddressRequest>,
        peer: &mut WireguardPeer,
    ) -> GatewayResult<()> {
        for address in addresses {
            peer.add_address(address.to_address()?);
        }
        Ok(())
    }

    pub async fn add_peer(&mut self, interface_id: InterfaceId, request: &WireguardPeerRequest) -> GatewayResult<PeerId> {
        self.store.interface(interface_id)?;
        let peer = self.create_peer(request, Some(interface_id)).await?;
        let id = self.store.add_peer(interface_id, peer)?;
        self.persist()?;
        info!("Added WireGuard peer {} to interface {}", id, interface_id);
        Ok(id)
    }

    pub fn remove_peer(&mut self, id: PeerId) -> GatewayResult<WireguardPeer> {
        let peer = self.store.remove_peer(id)?;
        self.persist()?;
        info!("Removed WireGuard peer {}", id);
        Ok(peer)
    }

    pub async fn generate_keys(&self) -> GatewayResult<WireguardKeyPair> {
        let private_key = self.generate_private_key().await?;
        let public_key = self.generate_public_key(&private_key).await?;
        Ok(WireguardKeyPair { private_key, public_key })
    }

    pub async fn generate_private_key(&self) -> GatewayResult<String> {
        let output = self.runner.run("umask 077 && wg genkey", false, None).await?;
        if !output.is_success() {
            return Err(GatewayError::WireguardKey(output.stderr));
        }
        Ok(output.stdout.trim().to_string())
    }

    /// Derive the public key of a private key
    pub async fn generate_public_key(&self, private_key: &str) -> GatewayResult<String> {
        let output = self
            .runner
            .run("wg pubkey", false, Some(private_key.trim().to_string()))
            .await?;
        if !output.is_success() {
            return Err(GatewayError::WireguardKey(output.stderr));
        }
        Ok(output.stdout.trim().to_string())
    }

    /// Check that `public_key` belongs to `private_key`
    pub async fn validate_public_key(&self, private_key: &str, public_key: &str) -> GatewayResult<()> {
        match self.generate_public_key(private_key).await {
            Ok(derived) if derived == public_key.trim() => Ok(()),
            Ok(_) | Err(GatewayError::WireguardKey(_)) => Err(GatewayError::WireguardKeyMismatch(
                "Public key does not match the private key".to_string(),
            )),
            Err(e) => Err(e),
        }
    }

    /// Check that an endpoint is an IP address or a resolvable host name
    pub async fn validate_endpoint(&self, endpoint: &str) -> GatewayResult<()> {
        if endpoint.parse::<IpAddr>().is_ok() {
            return Ok(());
        }
        validate_hostname(endpoint).map_err(|e| GatewayError::WireguardInvalidEndpoint(e.to_string()))?;
        let mut addresses = tokio::net::lookup_host((endpoint, 0))
            .await
            .map_err(|e| GatewayError::WireguardInvalidEndpoint(format!("{}: {}", endpoint, e)))?;
        if addresses.next().is_none() {
            return Err(GatewayError::WireguardInvalidEndpoint(format!("{} has no address", endpoint)));
        }
        Ok(())
    }

    pub async fn tunnel_state(&self, name: &str) -> GatewayResult<TunnelState> {
        validate_interface_name(name)?;
        let output = self.runner.run(&format!("wg show {}", name), true, None).await?;
        Ok(if output.is_success() { TunnelState::Active } else { TunnelState::Inactive })
    }

    pub async fn is_tunnel_active(&self, name: &str) -> GatewayResult<bool> {
        Ok(self.tunnel_state(name).await? == TunnelState::Active)
    }

    /// Delete a tunnel link; returns whether `ip` succeeded
    pub async fn delete_tunnel(&self, name: &str) -> GatewayResult<bool> {
        validate_interface_name(name)?;
        let output = self.runner.run(&format!("ip link delete dev {}", name), true, None).await?;
        if output.is_success() {
            info!("Deleted WireGuard link {}", name);
        } else {
            debug!("Deleting WireGuard link {} failed: {}", name, output.stderr);
        }
        Ok(output.is_success())
    }

    /// Create the kernel link of a tunnel
    pub async fn create_link(&self, name: &str) -> GatewayResult<()> {
        validate_interface_name(name)?;
        let existing = InterfaceManager::new(self.runner.clone())
            .list(Some(InterfaceType::Wireguard))
            .await?;
        if existing.iter().any(|interface| interface.name == name) {
            return Err(GatewayError::AlreadyExists(format!("Interface {} already exists", name)));
        }

        let output = self
            .runner
            .run(&format!("ip link add dev {} type wireguard", name), true, None)
            .await?;
        match output.exit_code {
            0 => {
                info!("Created WireGuard link {}", name);
                Ok(())
            }
            IP_SYNTAX_ERROR => Err(GatewayError::IpSyntax(output.stderr)),
            _ => Err(GatewayError::IpKernel(output.stderr)),
        }
    }

    fn private_key_path(&self, name: &str) -> PathBuf {
        self.paths.wireguard_dir.join(format!("{}.privatekey", name))
    }

    fn config_path(&self, name: &str) -> PathBuf {
        self.paths.wireguard_dir.join(format!("{}.conf", name))
    }

    /// Run `wg set` for a tunnel
    ///
    /// PSK files only exist while `wg` reads them.
    async fn set_tunnel(&self, tunnel: &WireguardTunnel<'_>, key_file: &Path) -> GatewayResult<()> {
        let psk_dir = self.paths.wireguard_dir.as_path();
        let mut written = Vec::new();
        let mut result = Ok(());
        for (peer, path) in tunnel.psk_files(psk_dir) {
            let psk = peer.psk.as_deref().unwrap_or_default();
            result = write_secure_file(&path, &format!("{}\n", psk), SECRET_FILE_MODE).await;
            if result.is_err() {
                break;
            }
            written.push(path);
        }
        if result.is_ok() {
            result = self.run(&tunnel.wg_serialize(Some(key_file), Some(psk_dir))).await.map(|_| ());
        }
        for path in &written {
            if let Err(e) = delete_file(path).await {
                warn!("Failed to delete PSK file {:?}: {}", path, e);
            }
        }
        result
    }

    /// Push a stored tunnel to the kernel
    ///
    /// A tunnel that is already up only gets its keys and peers refreshed.
    /// A freshly created link is deleted again when configuring it fails.
    pub async fn apply(&self, id: InterfaceId) -> GatewayResult<()> {
        let tunnel = self.store.tunnel(id)?;
        let name = tunnel.interface.name.as_str();

        ensure_directory_exists(&self.paths.wireguard_dir).await?;
        let key_file = self.private_key_path(name);
        write_secure_file(&key_file, &format!("{}\n", tunnel.interface.private_key), SECRET_FILE_MODE).await?;

        if self.is_tunnel_active(name).await? {
            self.set_tunnel(&tunnel, &key_file).await?;
            info!("Reconfigured WireGuard tunnel {}", name);
            return Ok(());
        }

        self.create_link(name).await?;
        if let Err(e) = self.configure(&tunnel, &key_file).await {
            warn!("Failed to configure WireGuard tunnel {}: {}", name, e);
            if !self.delete_tunnel(name).await.unwrap_or(false) {
                warn!("Failed to clean up WireGuard link {}", name);
            }
            return Err(e);
        }
        info!("Activated WireGuard tunnel {}", name);
        Ok(())
    }

    async fn configure(&self, tunnel: &WireguardTunnel<'_>, key_file: &Path) -> GatewayResult<()> {
        self.set_tunnel(tunnel, key_file).await?;
        for command in tunnel.ip_serialize()? {
            self.run(&command).await?;
        }
        Ok(())
    }

    /// Write a wg-quick configuration of a stored tunnel
    pub async fn export_config(&self, id: InterfaceId) -> GatewayResult<PathBuf> {
        let tunnel = self.store.tunnel(id)?;
        ensure_directory_exists(&self.paths.wireguard_dir).await?;
        let path = self.config_path(&tunnel.interface.name);
        write_secure_file(&path, &tunnel.to_conf(), SECRET_FILE_MODE).await?;
        info!("Exported WireGuard tunnel {} to {:?}", tunnel.interface.name, path);
        Ok(path)
    }
}
