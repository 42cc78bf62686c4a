//! Daemon-socket provider model
//!
//! Mirrors APIs where each registration is an independent asynchronous
//! request against a discovery daemon, with a per-registration readiness
//! socket that signals when completion events are pending.

use crate::error::Result;
use crate::provider::{CompletionFn, RegistrationRequest};

/// A discovery provider in the daemon-socket model
pub trait SocketProvider {
    type Registration: ServiceRegistration;

    /// Submits one asynchronous registration request. The completion
    /// callback fires later, on the engine's worker thread, via
    /// [`ServiceRegistration::dispatch`]. It may fire more than once if the
    /// daemon renames the service on a conflict.
    fn register(
        &self,
        request: RegistrationRequest<'_>,
        on_complete: CompletionFn,
    ) -> Result<Self::Registration>;
}

/// A live registration with the daemon.
///
/// The registration is released (deregistering the service) on drop; the
/// worker only drops it after the event loop has stopped polling it.
pub trait ServiceRegistration: Send + 'static {
    /// The readiness channel for this registration. A message indicates
    /// that the daemon has events pending for this service.
    fn readiness(&self) -> &flume::Receiver<()>;

    /// Dispatches all pending daemon events for this service, driving the
    /// completion callback. An error here is fatal to the event loop.
    fn dispatch(&mut self) -> Result<()>;
}
