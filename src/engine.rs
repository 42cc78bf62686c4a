//! Lifecycle facade for the announcement engine
//!
//! The only cross-module contract a host needs: announce the configured
//! services, and later terminate the announcement. All failures are logged,
//! never returned; the host keeps running whether or not any announcement
//! succeeded.

use tracing::error;

use crate::backend::{ClientBackend, EngineBackend, SocketBackend};
use crate::config::AnnounceConfig;
use crate::descriptor::service_count;
use crate::provider::client::ClientProvider;
use crate::provider::mdns::MdnsProvider;
use crate::provider::socket::SocketProvider;

/// Handle to one active announcement engine.
///
/// At most one engine runs per handle; dropping the handle terminates it.
pub struct Announcer {
    backend: Option<Box<dyn EngineBackend>>,
}

impl Announcer {
    /// Announces every configured service through the built-in `mdns-sd`
    /// provider.
    ///
    /// With nothing configured this allocates nothing and starts no thread.
    /// A provider that cannot be created is logged and yields an idle
    /// handle; announcement is a convenience, never a correctness
    /// dependency of the services it advertises.
    pub fn announce(config: &AnnounceConfig) -> Self {
        if service_count(config) == 0 {
            return Self { backend: None };
        }

        match MdnsProvider::new() {
            Ok(provider) => Self::via_socket_provider(&provider, config),
            Err(e) => {
                error!(error = %e, "failed to create mdns provider");
                Self { backend: None }
            }
        }
    }

    /// Announces through a custom daemon-socket provider
    pub fn via_socket_provider<P: SocketProvider>(provider: &P, config: &AnnounceConfig) -> Self {
        Self::wrap(SocketBackend::announce(provider, config))
    }

    /// Announces through a custom managed-client provider, e.g. a platform
    /// mDNS library binding
    pub fn via_client_provider<P>(provider: P, config: &AnnounceConfig) -> Self
    where
        P: ClientProvider + Send + 'static,
    {
        Self::wrap(ClientBackend::announce(provider, config))
    }

    fn wrap<B: EngineBackend + 'static>(backend: B) -> Self {
        Self {
            backend: if backend.is_active() {
                Some(Box::new(backend))
            } else {
                None
            },
        }
    }

    /// Signals the worker thread to stop and withdraw every announcement.
    ///
    /// Safe to call repeatedly and safe when nothing was announced. Does
    /// not wait for the worker: shutdown is signal-and-detach, with all
    /// cleanup running on the worker thread.
    pub fn terminate(&mut self) {
        if let Some(mut backend) = self.backend.take() {
            backend.terminate();
        }
    }

    /// Returns whether an announcement worker may still be running
    pub fn is_active(&self) -> bool {
        self.backend.as_ref().is_some_and(|b| b.is_active())
    }
}

impl Drop for Announcer {
    fn drop(&mut self) {
        self.terminate();
    }
}
