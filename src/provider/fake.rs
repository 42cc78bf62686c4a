//! Instrumented fake providers for tests
//!
//! Both fakes keep atomic resource accounting so tests can verify that every
//! registration handle and every provider object is released exactly once,
//! and that no dispatch happens after shutdown.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{AnnounceError, Result};
use crate::provider::client::{
    ClientProvider, EntryGroup, GroupState, ManagedClient, PollStop, ProviderEvent,
};
use crate::provider::socket::{ServiceRegistration, SocketProvider};
use crate::provider::{CompletionFn, RegistrationOutcome, RegistrationRequest};

// ---------------------------------------------------------------------------
// Daemon-socket fake
// ---------------------------------------------------------------------------

/// Resource accounting shared between a fake socket provider and its tests
#[derive(Default)]
pub(crate) struct SocketStats {
    pub registered: AtomicUsize,
    pub deallocated: AtomicUsize,
    pub dispatched: AtomicUsize,
}

/// Scriptable fake for the daemon-socket model
pub(crate) struct FakeSocketProvider {
    pub stats: Arc<SocketStats>,
    /// Outcomes delivered to completion callbacks, in dispatch order
    pub completions: Arc<Mutex<Vec<RegistrationOutcome>>>,
    /// Names whose registration submission fails synchronously
    pub fail_register: HashSet<String>,
    /// Names the daemon silently renames while resolving a conflict
    pub rename_on_register: HashMap<String, String>,
    /// Names whose event dispatch reports a daemon error
    pub fail_dispatch: HashSet<String>,
}

impl FakeSocketProvider {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(SocketStats::default()),
            completions: Arc::new(Mutex::new(Vec::new())),
            fail_register: HashSet::new(),
            rename_on_register: HashMap::new(),
            fail_dispatch: HashSet::new(),
        }
    }
}

impl SocketProvider for FakeSocketProvider {
    type Registration = FakeRegistration;

    fn register(
        &self,
        request: RegistrationRequest<'_>,
        on_complete: CompletionFn,
    ) -> Result<FakeRegistration> {
        if self.fail_register.contains(request.name) {
            return Err(AnnounceError::Register {
                name: request.name.to_string(),
                reason: "simulated submission failure".to_string(),
            });
        }

        let actual = self
            .rename_on_register
            .get(request.name)
            .cloned()
            .unwrap_or_else(|| request.name.to_string());

        let (readiness_tx, readiness) = flume::unbounded();
        let _ = readiness_tx.send(());

        self.stats.registered.fetch_add(1, Ordering::SeqCst);

        Ok(FakeRegistration {
            stats: Arc::clone(&self.stats),
            completions: Arc::clone(&self.completions),
            readiness,
            _readiness_tx: readiness_tx,
            pending: Some(RegistrationOutcome::Registered { name: actual }),
            fail_dispatch: self.fail_dispatch.contains(request.name),
            on_complete,
        })
    }
}

pub(crate) struct FakeRegistration {
    stats: Arc<SocketStats>,
    completions: Arc<Mutex<Vec<RegistrationOutcome>>>,
    readiness: flume::Receiver<()>,
    _readiness_tx: flume::Sender<()>,
    pending: Option<RegistrationOutcome>,
    fail_dispatch: bool,
    on_complete: CompletionFn,
}

impl ServiceRegistration for FakeRegistration {
    fn readiness(&self) -> &flume::Receiver<()> {
        &self.readiness
    }

    fn dispatch(&mut self) -> Result<()> {
        if self.fail_dispatch {
            return Err(AnnounceError::Dispatch("simulated daemon error".to_string()));
        }
        while let Some(outcome) = self.pending.take() {
            self.completions.lock().unwrap().push(outcome.clone());
            self.stats.dispatched.fetch_add(1, Ordering::SeqCst);
            (self.on_complete)(outcome);
        }
        Ok(())
    }
}

impl Drop for FakeRegistration {
    fn drop(&mut self) {
        self.stats.deallocated.fetch_add(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Managed-client fake
// ---------------------------------------------------------------------------

/// Resource accounting shared between a fake client provider and its tests
#[derive(Default)]
pub(crate) struct ClientStats {
    pub groups_created: AtomicUsize,
    pub groups_dropped: AtomicUsize,
    pub clients_dropped: AtomicUsize,
    pub commits: AtomicUsize,
    pub resets: AtomicUsize,
}

/// Behavior knobs shared between the fake's group objects and the tests
#[derive(Default)]
pub(crate) struct ClientScript {
    /// Every successful add, in order: (name, service type, port)
    pub added: Mutex<Vec<(String, &'static str, u16)>>,
    /// Number of upcoming add calls that report a synchronous collision
    pub collide_adds: AtomicUsize,
    /// When set, add calls fail with a non-collision error
    pub fail_add: AtomicBool,
    /// Group state queued per commit; defaults to `Established`
    pub commit_outcomes: Mutex<VecDeque<GroupState>>,
}

enum FakePoll {
    Event(ProviderEvent),
    Quit,
}

/// Scriptable fake for the managed-client model
pub(crate) struct FakeClientProvider {
    /// Events the client delivers after connecting, in order
    pub events: Vec<ProviderEvent>,
    pub stats: Arc<ClientStats>,
    pub script: Arc<ClientScript>,
    pub fail_connect: bool,
}

impl FakeClientProvider {
    pub fn new(events: Vec<ProviderEvent>) -> Self {
        Self {
            events,
            stats: Arc::new(ClientStats::default()),
            script: Arc::new(ClientScript::default()),
            fail_connect: false,
        }
    }
}

impl ClientProvider for FakeClientProvider {
    type Client = FakeClient;

    fn connect(&mut self) -> Result<FakeClient> {
        if self.fail_connect {
            return Err(AnnounceError::Resource(
                "simulated connect failure".to_string(),
            ));
        }

        let (tx, rx) = flume::unbounded();
        for event in self.events.drain(..) {
            let _ = tx.send(FakePoll::Event(event));
        }

        Ok(FakeClient {
            events: rx,
            tx,
            stats: Arc::clone(&self.stats),
            script: Arc::clone(&self.script),
        })
    }
}

pub(crate) struct FakeClient {
    events: flume::Receiver<FakePoll>,
    tx: flume::Sender<FakePoll>,
    stats: Arc<ClientStats>,
    script: Arc<ClientScript>,
}

impl ManagedClient for FakeClient {
    type Group = FakeGroup;
    type Stop = FakeStop;

    fn new_group(&mut self) -> Result<FakeGroup> {
        self.stats.groups_created.fetch_add(1, Ordering::SeqCst);
        Ok(FakeGroup {
            entries: 0,
            tx: self.tx.clone(),
            stats: Arc::clone(&self.stats),
            script: Arc::clone(&self.script),
        })
    }

    fn next_event(&mut self) -> Option<ProviderEvent> {
        match self.events.recv() {
            Ok(FakePoll::Event(event)) => Some(event),
            Ok(FakePoll::Quit) | Err(_) => None,
        }
    }

    fn stop_handle(&self) -> FakeStop {
        FakeStop { tx: self.tx.clone() }
    }
}

impl Drop for FakeClient {
    fn drop(&mut self) {
        self.stats.clients_dropped.fetch_add(1, Ordering::SeqCst);
    }
}

pub(crate) struct FakeGroup {
    entries: usize,
    tx: flume::Sender<FakePoll>,
    stats: Arc<ClientStats>,
    script: Arc<ClientScript>,
}

impl EntryGroup for FakeGroup {
    fn add_service(&mut self, name: &str, service_type: &'static str, port: u16) -> Result<()> {
        if self.script.fail_add.load(Ordering::SeqCst) {
            return Err(AnnounceError::Provider(
                "simulated add failure".to_string(),
            ));
        }

        loop {
            let remaining = self.script.collide_adds.load(Ordering::SeqCst);
            if remaining == 0 {
                break;
            }
            if self
                .script
                .collide_adds
                .compare_exchange(remaining, remaining - 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return Err(AnnounceError::Collision);
            }
        }

        self.script
            .added
            .lock()
            .unwrap()
            .push((name.to_string(), service_type, port));
        self.entries += 1;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.stats.commits.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .script
            .commit_outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(GroupState::Established);
        let _ = self.tx.send(FakePoll::Event(ProviderEvent::Group(outcome)));
        Ok(())
    }

    fn reset(&mut self) {
        self.entries = 0;
        self.stats.resets.fetch_add(1, Ordering::SeqCst);
    }

    fn is_empty(&self) -> bool {
        self.entries == 0
    }
}

impl Drop for FakeGroup {
    fn drop(&mut self) {
        self.stats.groups_dropped.fetch_add(1, Ordering::SeqCst);
    }
}

pub(crate) struct FakeStop {
    tx: flume::Sender<FakePoll>,
}

impl PollStop for FakeStop {
    fn stop(&self) {
        let _ = self.tx.send(FakePoll::Quit);
    }
}

/// Spins until `check` passes or the timeout elapses; panics on timeout.
/// Used where a test must wait for the worker thread to make progress.
pub(crate) fn wait_until(what: &str, check: impl Fn() -> bool) {
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
    while !check() {
        if std::time::Instant::now() > deadline {
            panic!("timed out waiting for {what}");
        }
        std::thread::yield_now();
    }
}
