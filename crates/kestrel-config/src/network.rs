use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::defaults::{
    DEFAULT_BOOTSTRAP, DEFAULT_DATAGRAM_BIND, DEFAULT_MULTICAST_BIND, DEFAULT_SHORT_RANGE_BIND,
    DEFAULT_STREAM_BIND,
};

/// Transport families the network stack binds.
#[derive(
    Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Transport {
    /// Reliable stream transport (TCP).
    Stream,
    /// Datagram transport (QUIC over UDP).
    Datagram,
    /// Short-range wireless transport.
    ShortRange,
    /// Multicast peer discovery transport.
    MulticastDiscovery,
}

/// Local bind address for one transport.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TransportBind {
    /// Transport family.
    pub transport: Transport,
    /// Multiaddr-style bind address.
    pub address: String,
}

impl TransportBind {
    /// Builds a transport bind.
    #[must_use]
    pub fn new(transport: Transport, address: impl Into<String>) -> Self {
        Self {
            transport,
            address: address.into(),
        }
    }
}

/// Peer-to-peer network settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Persist known peers between runs.
    pub peer_cache: bool,
    /// Reference to the identity key material; generated when absent.
    pub identity: Option<String>,
    /// Bootstrap peer addresses.
    pub bootstrap: Vec<String>,
    /// Local bind addresses per transport.
    pub bind: Vec<TransportBind>,
    /// Local multicast DNS discovery.
    pub mdns: bool,
    /// Restrict connections to the private network.
    pub private_network: bool,
    /// Battery and bandwidth constrained profile.
    pub mobile: bool,
    /// Distributed storage integration.
    pub distributed_storage: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            peer_cache: true,
            identity: None,
            bootstrap: DEFAULT_BOOTSTRAP.iter().map(|addr| (*addr).to_owned()).collect(),
            bind: vec![
                TransportBind::new(Transport::Datagram, DEFAULT_DATAGRAM_BIND),
                TransportBind::new(Transport::Stream, DEFAULT_STREAM_BIND),
                TransportBind::new(Transport::ShortRange, DEFAULT_SHORT_RANGE_BIND),
                TransportBind::new(Transport::MulticastDiscovery, DEFAULT_MULTICAST_BIND),
            ],
            mdns: true,
            private_network: true,
            mobile: true,
            distributed_storage: false,
        }
    }
}

impl NetworkConfig {
    /// Returns the bind addresses configured for a transport.
    pub fn binds_for(&self, transport: Transport) -> impl Iterator<Item = &str> {
        self.bind
            .iter()
            .filter(move |bind| bind.transport == transport)
            .map(|bind| bind.address.as_str())
    }
}
