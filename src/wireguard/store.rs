//! Persistent arena of WireGuard interfaces and peers

use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use super::entities::{
    AddressId, InterfaceId, PeerId, WireguardInterface, WireguardInterfaceRequest, WireguardPeer,
    WireguardPeerAddress, WireguardPeerRequest, WireguardTunnel,
};
use super::files::{write_secure_file_sync, SECRET_FILE_MODE};
use crate::error::{GatewayError, GatewayResult};

/// Interfaces and peers keyed by ID
///
/// Interfaces list the IDs of their peers and every peer points back to its
/// interface. Removing an interface removes its peers.
#[derive(Debug, Clone)]
pub struct WireguardStore {
    interfaces: BTreeMap<InterfaceId, WireguardInterface>,
    peers: BTreeMap<PeerId, WireguardPeer>,
    next_interface_id: InterfaceId,
    next_peer_id: PeerId,
    next_address_id: AddressId,
}

impl WireguardStore {
    pub fn new() -> Self {
        Self {
            interfaces: BTreeMap::new(),
            peers: BTreeMap::new(),
            next_interface_id: 1,
            next_peer_id: 1,
            next_address_id: 1,
        }
    }

    /// Load the store file; the file holds the same documents the REST layer returns
    pub fn load<P: AsRef<Path>>(path: P) -> GatewayResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let documents: Vec<WireguardInterfaceRequest> = serde_json::from_str(&content)
            .map_err(|e| GatewayError::ConfigError(format!("Failed to parse {:?}: {}", path, e)))?;

        let mut store = Self::new();
        for document in documents {
            store.insert(&document, true)?;
        }
        debug!("Loaded {} WireGuard interfaces from {:?}", store.interfaces.len(), path);
        Ok(store)
    }

    pub fn load_or_default<P: AsRef<Path>>(path: P) -> GatewayResult<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::new())
        }
    }

    /// Write the store file; it holds private keys and PSKs, so only the owner may read it
    pub fn save<P: AsRef<Path>>(&self, path: P) -> GatewayResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.tunnels())
            .map_err(|e| GatewayError::ConfigError(format!("Failed to serialize WireGuard store: {}", e)))?;
        write_secure_file_sync(path, &content, SECRET_FILE_MODE)?;
        debug!("Saved WireGuard store to {:?}", path);
        Ok(())
    }

    pub fn tunnels(&self) -> Vec<WireguardTunnel<'_>> {
        self.interfaces.values().map(|interface| self.resolve(interface)).collect()
    }

    pub fn tunnel(&self, id: InterfaceId) -> GatewayResult<WireguardTunnel<'_>> {
        self.interface(id).map(|interface| self.resolve(interface))
    }

    fn resolve<'a>(&'a self, interface: &'a WireguardInterface) -> WireguardTunnel<'a> {
        WireguardTunnel {
            interface,
            peers: interface.peers.iter().filter_map(|id| self.peers.get(id)).collect(),
        }
    }

    pub fn interface(&self, id: InterfaceId) -> GatewayResult<&WireguardInterface> {
        self.interfaces
            .get(&id)
            .ok_or_else(|| GatewayError::NotFound(format!("WireGuard interface {} not found", id)))
    }

    pub fn interface_by_name(&self, name: &str) -> Option<&WireguardInterface> {
        self.interfaces.values().find(|interface| interface.name == name)
    }

    pub fn peer(&self, id: PeerId) -> GatewayResult<&WireguardPeer> {
        self.peers
            .get(&id)
            .ok_or_else(|| GatewayError::NotFound(format!("WireGuard peer {} not found", id)))
    }

    /// Store a new interface with its peers
    pub fn create(&mut self, request: &WireguardInterfaceRequest) -> GatewayResult<InterfaceId> {
        let id = self.insert(request, false)?;
        info!("Created WireGuard interface {} ({})", request.name, id);
        Ok(id)
    }

    /// Replace an interface and its peers, keeping the interface ID
    pub fn update(&mut self, id: InterfaceId, request: &WireguardInterfaceRequest) -> GatewayResult<()> {
        let current = self.interface(id)?;
        if let Some(other) = self.interface_by_name(request.name.trim()) {
            if other.id != current.id {
                return Err(GatewayError::AlreadyExists(format!(
                    "WireGuard interface {} already exists",
                    request.name
                )));
            }
        }

        let mut interface = request.to_interface()?;
        interface.id = Some(id);
        for peer in &request.peers {
            peer_from_request(peer)?;
        }

        let old_peers = self
            .interfaces
            .get_mut(&id)
            .map(|i| std::mem::take(&mut i.peers))
            .unwrap_or_default();
        for peer_id in old_peers {
            self.peers.remove(&peer_id);
        }
        for peer in &request.peers {
            let peer_id = self.insert_peer(id, peer, false)?;
            interface.peers.push(peer_id);
        }
        self.interfaces.insert(id, interface);
        info!("Updated WireGuard interface {} ({})", request.name, id);
        Ok(())
    }

    /// Remove an interface together with its peers
    pub fn remove(&mut self, id: InterfaceId) -> GatewayResult<WireguardInterface> {
        let interface = self
            .interfaces
            .remove(&id)
            .ok_or_else(|| GatewayError::NotFound(format!("WireGuard interface {} not found", id)))?;
        for peer_id in &interface.peers {
            self.peers.remove(peer_id);
        }
        info!("Removed WireGuard interface {} ({})", interface.name, id);
        Ok(interface)
    }

    /// Attach a peer to an existing interface
    pub fn add_peer(&mut self, interface_id: InterfaceId, mut peer: WireguardPeer) -> GatewayResult<PeerId> {
        self.interface(interface_id)?;
        let peer_id = self.next_peer_id;
        self.next_peer_id = following_id(peer_id, "peer")?;
        peer.id = Some(peer_id);
        peer.interface_id = Some(interface_id);
        for address in &mut peer.addresses {
            address.id = Some(self.next_address_id);
            self.next_address_id = following_id(self.next_address_id, "address")?;
        }
        self.peers.insert(peer_id, peer);
        if let Some(interface) = self.interfaces.get_mut(&interface_id) {
            interface.peers.push(peer_id);
        }
        Ok(peer_id)
    }

    pub fn remove_peer(&mut self, id: PeerId) -> GatewayResult<WireguardPeer> {
        let peer = self
            .peers
            .remove(&id)
            .ok_or_else(|| GatewayError::NotFound(format!("WireGuard peer {} not found", id)))?;
        if let Some(interface) = peer.interface_id.and_then(|i| self.interfaces.get_mut(&i)) {
            interface.peers.retain(|p| *p != id);
        }
        Ok(peer)
    }

    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }

    fn insert(&mut self, request: &WireguardInterfaceRequest, keep_ids: bool) -> GatewayResult<InterfaceId> {
        if self.interface_by_name(request.name.trim()).is_some() {
            return Err(GatewayError::AlreadyExists(format!(
                "WireGuard interface {} already exists",
                request.name
            )));
        }
        let mut interface = request.to_interface()?;
        let id = match interface.id.filter(|_| keep_ids) {
            Some(id) if self.interfaces.contains_key(&id) => {
                return Err(GatewayError::ConfigError(format!("Duplicate WireGuard interface ID {}", id)));
            }
            Some(id) => id,
            None => self.next_interface_id,
        };
        self.next_interface_id = self.next_interface_id.max(following_id(id, "interface")?);
        interface.id = Some(id);
        self.interfaces.insert(id, interface);

        for peer in &request.peers {
            match self.insert_peer(id, peer, keep_ids) {
                Ok(peer_id) => {
                    if let Some(interface) = self.interfaces.get_mut(&id) {
                        interface.peers.push(peer_id);
                    }
                }
                Err(e) => {
                    self.remove(id)?;
                    return Err(e);
                }
            }
        }
        Ok(id)
    }

    fn insert_peer(&mut self, interface_id: InterfaceId, request: &WireguardPeerRequest, keep_ids: bool) -> GatewayResult<PeerId> {
        let mut peer = peer_from_request(request)?;
        let id = match request.id.filter(|_| keep_ids) {
            Some(id) if self.peers.contains_key(&id) => {
                return Err(GatewayError::ConfigError(format!("Duplicate WireGuard peer ID {}", id)));
            }
            Some(id) => id,
            None => self.next_peer_id,
        };
        self.next_peer_id = self.next_peer_id.max(following_id(id, "peer")?);
        peer.id = Some(id);
        peer.interface_id = Some(interface_id);

        for (address, source) in peer.addresses.iter_mut().zip(request.allowed_ips.iter()) {
            let address_id = source.id.filter(|_| keep_ids).unwrap_or(self.next_address_id);
            self.next_address_id = self.next_address_id.max(following_id(address_id, "address")?);
            address.id = Some(address_id);
        }
        self.peers.insert(id, peer);
        Ok(id)
    }
}

impl Default for WireguardStore {
    fn default() -> Self {
        Self::new()
    }
}

fn following_id(id: u64, kind: &str) -> GatewayResult<u64> {
    id.checked_add(1)
        .ok_or_else(|| GatewayError::ParseError(format!("WireGuard {} ID {} is out of range", kind, id)))
}

/// Build a detached peer from its REST document
pub fn peer_from_request(request: &WireguardPeerRequest) -> GatewayResult<WireguardPeer> {
    let mut peer = WireguardPeer::new(
        request.public_key.trim(),
        request.psk.as_deref().map(|psk| psk.trim().to_string()),
        request.keepalive,
        request.endpoint.trim(),
        request.port,
    );
    for address in request.allowed_ips.iter() {
        peer.addresses.push(WireguardPeerAddress::new(address.to_address()?));
    }
    Ok(peer)
}
