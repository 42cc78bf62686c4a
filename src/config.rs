//! Configuration consumed by the announcement engine
//!
//! This is the read-only boundary to the host's configuration: which TCP
//! services are listening, on which ports, and an optional operator-supplied
//! display name. A port of zero means the corresponding service is disabled.

use serde::{Deserialize, Serialize};

/// Maximum number of framed-data (KISS TCP) ports the host can configure.
pub const MAX_FRAMED_PORTS: usize = 8;

/// One framed-data port slot. A zero port marks the slot unused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramedPortSlot {
    /// TCP port the framed-data service listens on (0 = unused)
    #[serde(default)]
    pub port: u16,

    /// Radio channel the port is bound to
    #[serde(default)]
    pub channel: i32,
}

/// Service announcement configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnounceConfig {
    /// TCP port of the AGWPE protocol gateway (0 = disabled)
    #[serde(default)]
    pub gateway_port: u16,

    /// Framed-data (KISS TCP) port slots, one per configured listener
    #[serde(default)]
    pub framed: [FramedPortSlot; MAX_FRAMED_PORTS],

    /// Base display name for announced services (empty = product default)
    #[serde(default)]
    pub base_name: String,
}

impl AnnounceConfig {
    /// Returns whether the gateway service is configured
    pub fn gateway_enabled(&self) -> bool {
        self.gateway_port != 0
    }

    /// Iterates over the framed-data slots that are actually configured
    pub fn framed_ports(&self) -> impl Iterator<Item = &FramedPortSlot> {
        self.framed.iter().filter(|slot| slot.port != 0)
    }
}
