//! WireGuard tunnels
//!
//! Interfaces and peers live in a [`WireguardStore`] arena and are pushed to
//! the kernel with `wg` and `ip` by the [`WireguardManager`].

pub mod entities;
pub mod files;
pub mod manager;
pub mod store;

pub use entities::{
    AddressId, AllowedIpsRequest, InterfaceId, PeerAddressRequest, PeerId, WireguardInterface,
    WireguardInterfaceRequest, WireguardPeer, WireguardPeerAddress, WireguardPeerRequest, WireguardTunnel,
};
pub use manager::{TunnelState, WireguardKeyPair, WireguardManager};
pub use store::WireguardStore;
