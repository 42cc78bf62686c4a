//! Backend B: atomic group registration through a managed-client provider
//!
//! All configured services are published as one entry group, committed
//! atomically. The worker thread runs the provider's poll loop and drives
//! two nested state machines: the client's (connecting, running, collision,
//! failure) and the group's (uncommitted, registering, established,
//! collision, failure). A group-level name collision renames every service,
//! because the provider cannot say which name collided.

use std::thread;

use tracing::{error, info};

use crate::backend::EngineBackend;
use crate::config::AnnounceConfig;
use crate::descriptor::{build_descriptors, ServiceDescriptor};
use crate::provider::client::{
    ClientProvider, ClientState, EntryGroup, GroupState, ManagedClient, PollStop, ProviderEvent,
};

/// Managed-client announcement engine
pub struct ClientBackend<P: ClientProvider> {
    stop: Option<<P::Client as ManagedClient>::Stop>,
    worker: Option<thread::JoinHandle<()>>,
}

impl<P> ClientBackend<P>
where
    P: ClientProvider + Send + 'static,
{
    fn inert() -> Self {
        Self { stop: None, worker: None }
    }

    /// Announces every configured service as one atomic group.
    ///
    /// Connecting the client triggers the first state-machine event; the
    /// worker thread then runs the provider's poll loop until told to stop.
    /// If the client cannot be created, whatever was built so far is
    /// released and no thread is started.
    pub fn announce(mut provider: P, config: &AnnounceConfig) -> Self {
        let descriptors = build_descriptors(config);
        if descriptors.is_empty() {
            return Self::inert();
        }

        let client = match provider.connect() {
            Ok(client) => client,
            Err(e) => {
                error!(error = %e, "failed to create discovery client");
                return Self::inert();
            }
        };
        let stop = client.stop_handle();

        let spawned = thread::Builder::new()
            .name("dnssd-announce".to_string())
            .spawn(move || run_poll_loop(provider, client, descriptors));

        match spawned {
            Ok(handle) => Self {
                stop: Some(stop),
                worker: Some(handle),
            },
            Err(e) => {
                // The closure, and with it the client and descriptors, is
                // dropped right here on the caller's thread.
                error!(error = %e, "failed to spawn announcement worker");
                Self::inert()
            }
        }
    }
}

impl<P> EngineBackend for ClientBackend<P>
where
    P: ClientProvider + 'static,
{
    fn terminate(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop.stop();
        }
    }

    fn is_active(&self) -> bool {
        self.stop.is_some()
    }
}

/// Whether the session keeps processing events or shuts the worker down
enum Flow {
    Continue,
    Shutdown,
}

/// The per-announcement state machine driven by provider events.
///
/// Owns the entry group, the descriptor collection, and the provider for
/// alternative-name generation; everything lives on the worker thread.
struct Session<P: ClientProvider> {
    provider: P,
    group: Option<<P::Client as ManagedClient>::Group>,
    descriptors: Vec<ServiceDescriptor>,
}

impl<P: ClientProvider> Session<P> {
    fn handle(&mut self, client: &mut P::Client, event: ProviderEvent) -> Flow {
        match event {
            ProviderEvent::Client(state) => self.on_client_state(client, state),
            ProviderEvent::Group(state) => self.on_group_state(client, state),
        }
    }

    fn on_client_state(&mut self, client: &mut P::Client, state: ClientState) -> Flow {
        match state {
            // The daemon is up and has registered its host name; time to
            // publish our services.
            ClientState::Running => self.create_services(client),

            // Drop registered services; they are re-added when the daemon
            // reaches Running again with its new host name.
            ClientState::Collision | ClientState::Registering => {
                if let Some(group) = self.group.as_mut() {
                    group.reset();
                }
                Flow::Continue
            }

            ClientState::Failure(reason) => {
                error!(reason = %reason, "discovery client failure");
                Flow::Shutdown
            }

            ClientState::Connecting => Flow::Continue,
        }
    }

    fn on_group_state(&mut self, client: &mut P::Client, state: GroupState) -> Flow {
        match state {
            // Success or failure applies to the group as a whole, so only
            // collective success is reported.
            GroupState::Established => {
                info!("successfully registered all services");
                Flow::Continue
            }

            // A name collided with a remote service, but the provider does
            // not say which one. Rename them all to be sure the offending
            // name is covered, and recreate the group.
            GroupState::Collision => {
                info!("service name collision, renaming all services");
                self.rename_all();
                self.create_services(client)
            }

            GroupState::Failure(reason) => {
                error!(reason = %reason, "entry group failure");
                Flow::Shutdown
            }

            GroupState::Uncommitted | GroupState::Registering => Flow::Continue,
        }
    }

    /// Creates (or resets) the entry group and, if it is empty, adds every
    /// descriptor and commits, publishing all services as one unit.
    fn create_services(&mut self, client: &mut P::Client) -> Flow {
        if self.group.is_none() {
            match client.new_group() {
                Ok(group) => self.group = Some(group),
                Err(e) => {
                    error!(error = %e, "failed to create entry group");
                    return Flow::Shutdown;
                }
            }
        } else if let Some(group) = self.group.as_mut() {
            group.reset();
        }

        let Some(group) = self.group.as_mut() else {
            return Flow::Shutdown;
        };
        if !group.is_empty() {
            return Flow::Continue;
        }

        for descriptor in self.descriptors.iter_mut() {
            info!(
                service = descriptor.kind.label(),
                port = descriptor.port,
                name = %descriptor.name,
                "announcing service"
            );

            // A synchronous collision renames just this service and
            // retries; any other error is fatal to the whole commit
            // attempt.
            loop {
                match group.add_service(
                    &descriptor.name,
                    descriptor.kind.service_type(),
                    descriptor.port,
                ) {
                    Ok(()) => break,
                    Err(e) if e.is_collision() => {
                        let renamed = self.provider.alternative_name(&descriptor.name);
                        info!(
                            from = %descriptor.name,
                            to = %renamed,
                            "service name collision, renaming"
                        );
                        descriptor.name = renamed;
                    }
                    Err(e) => {
                        error!(
                            service = descriptor.kind.label(),
                            error = %e,
                            "failed to add service to entry group"
                        );
                        return Flow::Shutdown;
                    }
                }
            }
        }

        if let Err(e) = group.commit() {
            error!(error = %e, "failed to commit entry group");
            return Flow::Shutdown;
        }
        Flow::Continue
    }

    /// Replaces every descriptor's name with a fresh alternative. Used when
    /// the colliding service cannot be identified.
    fn rename_all(&mut self) {
        for descriptor in self.descriptors.iter_mut() {
            descriptor.name = self.provider.alternative_name(&descriptor.name);
        }
    }
}

/// Worker loop: pulls state-change events from the provider's blocking poll
/// until it is told to quit or a fatal state arrives, then cleans up.
fn run_poll_loop<P: ClientProvider>(
    provider: P,
    mut client: P::Client,
    descriptors: Vec<ServiceDescriptor>,
) {
    let mut session = Session {
        provider,
        group: None,
        descriptors,
    };

    loop {
        let Some(event) = client.next_event() else {
            break;
        };
        if matches!(session.handle(&mut client, event), Flow::Shutdown) {
            break;
        }
    }

    // Provider objects hold references into each other; release strictly in
    // group, client, descriptor order.
    let Session {
        provider,
        group,
        descriptors,
    } = session;
    drop(group);
    drop(client);
    drop(provider);
    drop(descriptors);
}
