//! Backend A: per-service registrations against a daemon-socket provider
//!
//! Each configured service is submitted as its own asynchronous registration.
//! One worker thread multiplexes every registration's readiness channel plus
//! the stop channel, dispatching pending daemon events as they arrive. Name
//! conflicts are resolved inside the daemon; the completion callback simply
//! reports the name that was actually registered.

use std::thread;
use std::time::Duration;

use tracing::{error, info};

use crate::backend::EngineBackend;
use crate::config::AnnounceConfig;
use crate::descriptor::{build_descriptors, ServiceDescriptor};
use crate::provider::socket::{ServiceRegistration, SocketProvider};
use crate::provider::{CompletionFn, RegistrationOutcome, RegistrationRequest};

/// The readiness wait is effectively indefinite, but bounded so the wait
/// primitive never blocks uninterruptibly.
const POLL_TIMEOUT: Duration = Duration::from_secs(100_000_000);

/// Daemon-socket announcement engine
pub struct SocketBackend {
    stop: Option<flume::Sender<()>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl SocketBackend {
    fn inert() -> Self {
        Self { stop: None, worker: None }
    }

    /// Announces every configured service through `provider`.
    ///
    /// A submission failure is logged and leaves that service out of the
    /// poll set; the worker thread is started once all submissions have
    /// been issued, regardless of individual outcomes. With nothing
    /// configured this is a complete no-op.
    pub fn announce<P: SocketProvider>(provider: &P, config: &AnnounceConfig) -> Self {
        let descriptors = build_descriptors(config);
        if descriptors.is_empty() {
            return Self::inert();
        }

        let mut registrations = Vec::with_capacity(descriptors.len());
        for descriptor in &descriptors {
            info!(
                service = descriptor.kind.label(),
                port = descriptor.port,
                name = %descriptor.name,
                "announcing service"
            );

            let request = RegistrationRequest {
                name: &descriptor.name,
                service_type: descriptor.kind.service_type(),
                port: descriptor.port,
            };
            match provider.register(request, completion_logger(descriptor)) {
                Ok(registration) => registrations.push(registration),
                Err(e) => error!(
                    service = descriptor.kind.label(),
                    name = %descriptor.name,
                    error = %e,
                    "failed to announce service"
                ),
            }
        }

        let (stop_tx, stop_rx) = flume::bounded(1);
        let spawned = thread::Builder::new()
            .name("dnssd-announce".to_string())
            .spawn(move || run_event_loop(stop_rx, registrations, descriptors));

        match spawned {
            Ok(handle) => Self {
                stop: Some(stop_tx),
                worker: Some(handle),
            },
            Err(e) => {
                // Registrations are released right here, on the caller's
                // thread, since no worker will ever own them.
                error!(error = %e, "failed to spawn announcement worker");
                Self::inert()
            }
        }
    }
}

impl EngineBackend for SocketBackend {
    fn terminate(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }

    fn is_active(&self) -> bool {
        self.stop.is_some()
    }
}

/// Builds the completion callback for one service. Runs on the worker
/// thread, once per outcome; the registered name may differ from the
/// requested one if the daemon resolved a conflict.
fn completion_logger(descriptor: &ServiceDescriptor) -> CompletionFn {
    let label = descriptor.kind.label();
    Box::new(move |outcome| match outcome {
        RegistrationOutcome::Registered { name } => {
            info!(service = label, name = %name, "successfully registered service");
        }
        RegistrationOutcome::Failed { name, reason } => {
            error!(service = label, name = %name, reason = %reason, "failed to register service");
        }
    })
}

enum Wake {
    Stop,
    Service { index: usize, alive: bool },
}

/// Worker loop: waits on every registration's readiness channel plus the
/// stop channel, and dispatches pending daemon events.
///
/// The stop signal is checked before any service dispatch within an
/// iteration, so a pending stop is never starved by service events. A
/// dispatch error stops the loop but does not cut the current pass short.
fn run_event_loop<R: ServiceRegistration>(
    stop_rx: flume::Receiver<()>,
    mut registrations: Vec<R>,
    descriptors: Vec<ServiceDescriptor>,
) {
    let mut stop_now = false;

    while !stop_now {
        let wake = {
            // A closed stop channel means the facade is gone; treat it the
            // same as an explicit stop.
            let mut selector = flume::Selector::new().recv(&stop_rx, |_| Wake::Stop);
            for (index, registration) in registrations.iter().enumerate() {
                selector = selector.recv(registration.readiness(), move |result| Wake::Service {
                    index,
                    alive: result.is_ok(),
                });
            }
            selector.wait_timeout(POLL_TIMEOUT)
        };

        match wake {
            // Timeout: nothing happened, go around again.
            Err(_) => continue,
            Ok(Wake::Stop) => break,
            Ok(Wake::Service { index, alive }) => {
                if stop_rx.try_recv().is_ok() {
                    break;
                }
                stop_now |= !dispatch(&mut registrations[index], alive);
                // Handle every other ready registration in the same pass,
                // even if one of them already failed.
                for (i, registration) in registrations.iter_mut().enumerate() {
                    if i == index {
                        continue;
                    }
                    let ready = registration.readiness().try_recv().is_ok();
                    if ready {
                        stop_now |= !dispatch(registration, true);
                    }
                }
            }
        }
    }

    // Loop exit, normal or not: release every live registration, then the
    // descriptor collection and its names.
    drop(registrations);
    drop(descriptors);
}

/// Dispatches one registration's pending events; returns false when the
/// event loop should stop.
fn dispatch<R: ServiceRegistration>(registration: &mut R, alive: bool) -> bool {
    if !alive {
        error!("discovery daemon closed a registration channel");
        return false;
    }
    match registration.dispatch() {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, "event dispatch failed");
            false
        }
    }
}
