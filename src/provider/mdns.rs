//! Built-in daemon-socket provider backed by the `mdns-sd` crate
//!
//! `mdns-sd` runs its own daemon thread and exposes a cloneable handle, so
//! this adapter maps one engine registration to one `register` call and
//! reports completion through the per-registration readiness channel. The
//! daemon announces the name as submitted; it does not rename on conflict,
//! so the completion outcome always carries the requested name.

use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;

use mdns_sd::{ServiceDaemon, ServiceInfo};
use tracing::debug;

use crate::error::{AnnounceError, Result};
use crate::provider::socket::{ServiceRegistration, SocketProvider};
use crate::provider::{CompletionFn, RegistrationOutcome, RegistrationRequest};

/// Shuts the daemon down once the last registration holding it is dropped
struct DaemonGuard {
    daemon: ServiceDaemon,
}

impl Deref for DaemonGuard {
    type Target = ServiceDaemon;

    fn deref(&self) -> &ServiceDaemon {
        &self.daemon
    }
}

impl Drop for DaemonGuard {
    fn drop(&mut self) {
        debug!("shutting down mdns daemon");
        let _ = self.daemon.shutdown();
    }
}

/// Daemon-socket provider over the `mdns-sd` service daemon
pub struct MdnsProvider {
    daemon: Arc<DaemonGuard>,
    host_name: String,
}

impl MdnsProvider {
    /// Creates the provider, starting the mDNS daemon
    pub fn new() -> Result<Self> {
        let daemon = ServiceDaemon::new().map_err(|e| AnnounceError::Resource(e.to_string()))?;

        let host = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "localhost".to_string());
        let short = host.split('.').next().unwrap_or("localhost");

        Ok(Self {
            daemon: Arc::new(DaemonGuard { daemon }),
            host_name: format!("{short}.local."),
        })
    }
}

impl SocketProvider for MdnsProvider {
    type Registration = MdnsRegistration;

    fn register(
        &self,
        request: RegistrationRequest<'_>,
        on_complete: CompletionFn,
    ) -> Result<MdnsRegistration> {
        let ty_domain = format!("{}.local.", request.service_type);

        let info = ServiceInfo::new(
            &ty_domain,
            request.name,
            &self.host_name,
            "",
            request.port,
            HashMap::<String, String>::new(),
        )
        .map_err(|e| AnnounceError::Register {
            name: request.name.to_string(),
            reason: e.to_string(),
        })?
        .enable_addr_auto();

        let fullname = info.get_fullname().to_string();

        self.daemon
            .register(info)
            .map_err(|e| AnnounceError::Register {
                name: request.name.to_string(),
                reason: e.to_string(),
            })?;

        // The daemon has accepted the registration; queue one completion
        // event so the worker's first dispatch reports it.
        let (readiness_tx, readiness) = flume::bounded(1);
        let _ = readiness_tx.send(());

        Ok(MdnsRegistration {
            daemon: Arc::clone(&self.daemon),
            fullname,
            readiness,
            _readiness_tx: readiness_tx,
            pending: Some(RegistrationOutcome::Registered {
                name: request.name.to_string(),
            }),
            on_complete,
        })
    }
}

/// One live `mdns-sd` registration; unregisters on drop
pub struct MdnsRegistration {
    daemon: Arc<DaemonGuard>,
    fullname: String,
    readiness: flume::Receiver<()>,
    // Keeps the readiness channel connected for the lifetime of the
    // registration; a disconnected channel reads as a daemon fault.
    _readiness_tx: flume::Sender<()>,
    pending: Option<RegistrationOutcome>,
    on_complete: CompletionFn,
}

impl ServiceRegistration for MdnsRegistration {
    fn readiness(&self) -> &flume::Receiver<()> {
        &self.readiness
    }

    fn dispatch(&mut self) -> Result<()> {
        while let Some(outcome) = self.pending.take() {
            (self.on_complete)(outcome);
        }
        Ok(())
    }
}

impl Drop for MdnsRegistration {
    fn drop(&mut self) {
        debug!(service = %self.fullname, "unregistering service");
        let _ = self.daemon.unregister(&self.fullname);
    }
}
