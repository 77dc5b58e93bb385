//! Baseline values used when no override applies.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Organisation name keying the storage root.
pub const DEFAULT_VENDOR: &str = "Kestrel Labs";

/// Application name keying the storage root.
pub const DEFAULT_APP: &str = "Kestrel";

/// Resource loaded by the shell window when no override is supplied.
pub const DEFAULT_HOMEPAGE: &str = "index.html";

/// Database file created under the storage root.
pub const DEFAULT_DATABASE_NAME: &str = "kestrel.state.db";

/// Secret store service holding the database key.
pub const DEFAULT_KEY_SERVICE: &str = "kestrel";

/// Secret store account holding the database key.
pub const DEFAULT_KEY_ACCOUNT: &str = "database-key";

/// Port of the control-plane RPC endpoint.
pub const DEFAULT_CONTROL_RPC_PORT: u16 = 1337;

/// Port of the web-compatible RPC endpoint.
pub const DEFAULT_WEB_RPC_PORT: u16 = 1339;

/// Ring buffer capacity of the diagnostic log, in bytes.
pub const DEFAULT_RING_CAPACITY: usize = 10 * 1024 * 1024;

/// Namespaces retained by the diagnostic log.
pub const DEFAULT_LOG_NAMESPACES: &str = "kestreld.*,kestrel_shell.*,kestrel_config.*";

/// File written inside the log directory.
pub const LOG_FILE_NAME: &str = "kestrel.log";

/// Bootstrap peers used to join the network with no prior peers known.
pub const DEFAULT_BOOTSTRAP: &[&str] = &[
    "/dnsaddr/bootstrap.kestrel.chat/tcp/4004",
    "/dnsaddr/bootstrap.kestrel.chat/udp/4004/quic",
];

/// Datagram transport bind.
pub const DEFAULT_DATAGRAM_BIND: &str = "/ip4/0.0.0.0/udp/0/quic";

/// Stream transport bind.
pub const DEFAULT_STREAM_BIND: &str = "/ip4/0.0.0.0/tcp/0";

/// Short-range wireless transport bind.
pub const DEFAULT_SHORT_RANGE_BIND: &str = "/ble/kestrel";

/// Multicast discovery transport bind.
pub const DEFAULT_MULTICAST_BIND: &str = "/mc/kestrel";

/// Window width in logical pixels.
pub const DEFAULT_WINDOW_WIDTH: u32 = 1060;

/// Window height in logical pixels.
pub const DEFAULT_WINDOW_HEIGHT: u32 = 640;

/// Window background colour.
pub const DEFAULT_BACKGROUND: &str = "#333";

/// Control-plane RPC endpoint.
#[must_use]
pub const fn control_rpc_endpoint() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_CONTROL_RPC_PORT)
}

/// Web-compatible RPC endpoint.
#[must_use]
pub const fn web_rpc_endpoint() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_WEB_RPC_PORT)
}
