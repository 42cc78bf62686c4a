//! DNS-SD announcement of locally-offered TNC TCP services
//!
//! Most people have typed in enough IP addresses and ports by now, and would
//! rather just select an available TNC that is automatically discovered on
//! the local network. This crate announces a packet-radio protocol gateway
//! (AGWPE) and any number of framed-data (KISS over TCP) endpoints via
//! multicast DNS service discovery, so client applications can find them
//! without operator-entered addresses.
//!
//! # Architecture
//!
//! - [`descriptor`] turns the port/channel configuration into named service
//!   descriptors ("Dire Wolf channel 2 on myhost").
//! - [`provider`] defines the black-box contract to the discovery machinery
//!   in two flavors: a daemon-socket model (one asynchronous registration
//!   per service) and a managed-client model (all services published
//!   atomically as one entry group). A built-in provider over the `mdns-sd`
//!   crate is included.
//! - [`backend`] implements one announcement engine per provider model;
//!   each runs a single worker thread that owns all announcement state and
//!   processes provider events until terminated.
//! - [`engine::Announcer`] is the lifecycle facade: `announce`, then
//!   `terminate`. Fire-and-forget: failures are logged, never returned.
//!
//! # Example
//!
//! ```no_run
//! use dnssd_announce::{AnnounceConfig, Announcer};
//!
//! let config = AnnounceConfig {
//!     gateway_port: 8000,
//!     ..Default::default()
//! };
//!
//! let mut announcer = Announcer::announce(&config);
//! // ... serve until shutdown ...
//! announcer.terminate();
//! ```

pub mod backend;
pub mod config;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod provider;

pub use config::{AnnounceConfig, FramedPortSlot, MAX_FRAMED_PORTS};
pub use descriptor::{
    build_descriptors, service_count, ServiceDescriptor, ServiceKind, DEFAULT_BASE_NAME,
    MAX_NAME_LEN, MAX_SERVICES,
};
pub use engine::Announcer;
pub use error::{AnnounceError, Result};
