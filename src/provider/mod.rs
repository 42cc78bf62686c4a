//! Discovery provider contracts
//!
//! The engine treats the multicast-DNS machinery as a black box reached
//! through one of two trait families:
//!
//! - [`socket::SocketProvider`] is the daemon-socket model: one asynchronous
//!   registration per service, each with its own readiness channel, name
//!   conflicts resolved inside the daemon.
//! - [`client::ClientProvider`] is the managed-client model: all services
//!   published atomically as one entry group through a stateful client,
//!   name conflicts reported back for the engine to resolve.
//!
//! [`mdns::MdnsProvider`] is the crate's built-in daemon-socket provider,
//! backed by the `mdns-sd` crate. The managed-client traits are the
//! integration seam for platform libraries such as Avahi.

pub mod client;
pub mod mdns;
pub mod socket;

#[cfg(test)]
pub(crate) mod fake;

/// A request to register one service with the discovery provider.
///
/// Registration always applies to all network interfaces and the default
/// domain; announcements are IPv4-only.
#[derive(Debug, Clone, Copy)]
pub struct RegistrationRequest<'a> {
    /// Requested display name
    pub name: &'a str,

    /// DNS-SD service type string, e.g. `_kiss-tnc._tcp`
    pub service_type: &'static str,

    /// TCP port, host byte order; the provider owns wire encoding
    pub port: u16,
}

/// The outcome of one registration, delivered asynchronously on the worker
/// thread via the completion callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// The service is registered. `name` is the name actually announced,
    /// which may differ from the requested one if the daemon resolved a
    /// conflict on our behalf.
    Registered { name: String },

    /// Registration failed; the service is simply not announced.
    Failed { name: String, reason: String },
}

/// Completion callback invoked per registration outcome, on the worker thread
pub type CompletionFn = Box<dyn FnMut(RegistrationOutcome) + Send + 'static>;
