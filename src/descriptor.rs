//! Service descriptors and display-name synthesis
//!
//! Turns the raw port/channel configuration into an ordered collection of
//! named service descriptors, one per announceable TCP endpoint. The gateway
//! descriptor, if configured, always comes first.

use crate::config::{AnnounceConfig, MAX_FRAMED_PORTS};

/// Maximum number of services that can be announced at once.
/// One gateway plus one per framed-data port.
pub const MAX_SERVICES: usize = 1 + MAX_FRAMED_PORTS;

/// Default base name used when the operator has not configured one
pub const DEFAULT_BASE_NAME: &str = "Dire Wolf";

/// Upper bound on a synthesized display name, in characters
pub const MAX_NAME_LEN: usize = 128;

/// Channel sentinel for services that are not channel-scoped
pub const CHANNEL_NONE: i32 = -1;

/// The kind of service being announced, fixing its DNS-SD service type
/// and display label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    /// AGWPE protocol gateway
    Gateway,

    /// Framed-data (KISS over TCP) endpoint
    FramedData,
}

impl ServiceKind {
    /// Returns the DNS-SD service type string
    pub fn service_type(&self) -> &'static str {
        match self {
            ServiceKind::Gateway => "_agwpe._tcp",
            ServiceKind::FramedData => "_kiss-tnc._tcp",
        }
    }

    /// Returns a human-readable label for log output
    pub fn label(&self) -> &'static str {
        match self {
            ServiceKind::Gateway => "AGWPE",
            ServiceKind::FramedData => "KISS TCP",
        }
    }
}

/// One announceable service: its port, radio channel (if any), mutable
/// display name, and kind.
///
/// Names are rewritten in place during collision recovery. The whole
/// collection is owned by the worker thread once an announcement is live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// TCP port the service listens on, never zero in a built collection
    pub port: u16,

    /// Radio channel index, or [`CHANNEL_NONE`] for the gateway
    pub channel: i32,

    /// Human-readable display name, unique among announced services
    pub name: String,

    /// Service kind
    pub kind: ServiceKind,
}

/// Counts the services that are configured and will thus be announced.
///
/// Useful for determining whether there is anything to do at all before
/// allocating any engine resources.
pub fn service_count(config: &AnnounceConfig) -> usize {
    usize::from(config.gateway_enabled()) + config.framed_ports().count()
}

/// Builds the descriptor collection for every configured service.
///
/// Resolves the local short hostname once; resolution failure is non-fatal
/// and simply drops the hostname component from the names.
pub fn build_descriptors(config: &AnnounceConfig) -> Vec<ServiceDescriptor> {
    build_with_hostname(config, short_hostname().as_deref())
}

/// Builds descriptors with an explicit hostname component.
///
/// Split out from [`build_descriptors`] so that name synthesis stays a pure
/// function of its inputs.
pub(crate) fn build_with_hostname(
    config: &AnnounceConfig,
    hostname: Option<&str>,
) -> Vec<ServiceDescriptor> {
    let mut descriptors = Vec::with_capacity(service_count(config));

    if config.gateway_enabled() {
        descriptors.push(ServiceDescriptor {
            port: config.gateway_port,
            channel: CHANNEL_NONE,
            name: make_service_name(&config.base_name, hostname, CHANNEL_NONE),
            kind: ServiceKind::Gateway,
        });
    }

    for slot in config.framed_ports() {
        descriptors.push(ServiceDescriptor {
            port: slot.port,
            channel: slot.channel,
            name: make_service_name(&config.base_name, hostname, slot.channel),
            kind: ServiceKind::FramedData,
        });
    }

    descriptors
}

/// Synthesizes a full display name from its components.
///
/// A typical name including all components looks like
/// "Dire Wolf channel 2 on myhost". The channel component is only present
/// for channel-scoped services, the hostname component only when resolution
/// succeeded. Overlong names are truncated, which is not an error.
fn make_service_name(base: &str, hostname: Option<&str>, channel: i32) -> String {
    let mut name = String::new();
    name.push_str(if base.is_empty() { DEFAULT_BASE_NAME } else { base });

    if channel != CHANNEL_NONE {
        name.push_str(&format!(" channel {channel}"));
    }

    if let Some(host) = hostname {
        if !host.is_empty() {
            name.push_str(&format!(" on {host}"));
        }
    }

    truncate_name(name)
}

/// Generates an alternative name for a service whose current name collided.
///
/// Follows the Avahi convention: "Foo" becomes "Foo #2", "Foo #2" becomes
/// "Foo #3". The result always differs from the input, even when the input
/// is already at the length bound.
pub fn alternative_name(name: &str) -> String {
    let (stem, next) = match name.rfind(" #") {
        Some(idx) => match name[idx + 2..].parse::<u64>() {
            // A saturated counter cannot be bumped; start a fresh one so
            // the result still differs from the input.
            Ok(n) => match n.checked_add(1) {
                Some(next) => (&name[..idx], next),
                None => (name, 2),
            },
            Err(_) => (name, 2),
        },
        None => (name, 2),
    };

    let suffix = format!(" #{next}");
    let room = MAX_NAME_LEN.saturating_sub(suffix.chars().count());
    let stem: String = stem.chars().take(room).collect();
    format!("{stem}{suffix}")
}

/// Truncates a name to [`MAX_NAME_LEN`] characters on a char boundary
fn truncate_name(name: String) -> String {
    if name.chars().count() <= MAX_NAME_LEN {
        name
    } else {
        name.chars().take(MAX_NAME_LEN).collect()
    }
}

/// Resolves the local short hostname, stripping any domain suffix.
/// Returns `None` when resolution fails or yields an empty name.
fn short_hostname() -> Option<String> {
    let host = hostname::get().ok()?;
    let host = host.to_string_lossy();
    let short = host.split('.').next().unwrap_or("");
    if short.is_empty() {
        None
    } else {
        Some(short.to_string())
    }
}
