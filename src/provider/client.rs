//! Managed-client provider model
//!
//! Mirrors APIs (such as Avahi) where the provider library owns a stateful
//! client and poll loop, services are published atomically as one entry
//! group, and the engine reacts to two nested state machines: the client's
//! and the entry group's.

use crate::descriptor;
use crate::error::Result;

/// Connection state of the provider client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientState {
    /// The client is still connecting to the provider daemon
    Connecting,

    /// The daemon is re-establishing its own records; announced groups
    /// must be withdrawn until it is running again
    Registering,

    /// The daemon is up and services may be published
    Running,

    /// The daemon's host name collided and is being renegotiated
    Collision,

    /// Unrecoverable client failure
    Failure(String),
}

/// State of an entry group of services
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupState {
    /// The group exists but has not been committed
    Uncommitted,

    /// The group has been committed and is being published
    Registering,

    /// Every service in the group is published. Success is all-or-nothing;
    /// there is no per-service signal.
    Established,

    /// At least one service name in the group collided. The provider does
    /// not say which one.
    Collision,

    /// Unrecoverable group failure
    Failure(String),
}

/// One state-change notification, delivered on the worker thread from the
/// provider's poll loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    Client(ClientState),
    Group(GroupState),
}

/// A discovery provider in the managed-client model
pub trait ClientProvider {
    type Client: ManagedClient;

    /// Creates the poll object and client. Connecting triggers the first
    /// client state notification.
    fn connect(&mut self) -> Result<Self::Client>;

    /// Produces an alternative name for a service whose current name
    /// collided. Must differ from the input.
    fn alternative_name(&self, name: &str) -> String {
        descriptor::alternative_name(name)
    }
}

/// A connected provider client, owning the provider's poll object
pub trait ManagedClient: Send + 'static {
    type Group: EntryGroup;
    type Stop: PollStop;

    /// Creates a new, uncommitted entry group
    fn new_group(&mut self) -> Result<Self::Group>;

    /// Blocks inside the provider's poll loop until the next state-change
    /// event, or returns `None` once the poll has been told to stop
    fn next_event(&mut self) -> Option<ProviderEvent>;

    /// Returns a handle that can interrupt [`Self::next_event`] from
    /// another thread
    fn stop_handle(&self) -> Self::Stop;
}

/// An entry group bundling services that publish or fail together
pub trait EntryGroup {
    /// Adds one service to the group: IPv4 only, default domain and host,
    /// the given port. A same-name conflict is reported synchronously as
    /// [`crate::AnnounceError::Collision`].
    fn add_service(&mut self, name: &str, service_type: &'static str, port: u16) -> Result<()>;

    /// Commits the group, publishing all of its services atomically
    fn commit(&mut self) -> Result<()>;

    /// Resets the group to uncommitted, discarding in-flight entries
    fn reset(&mut self);

    /// Returns whether the group currently has no entries
    fn is_empty(&self) -> bool;
}

/// Cross-thread handle that tells the provider's poll loop to quit
pub trait PollStop: Send + 'static {
    fn stop(&self);
}
