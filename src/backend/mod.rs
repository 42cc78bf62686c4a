//! Announcement engine backends
//!
//! Two functionally equivalent backends implement the same contract against
//! the two provider models; a given host links exactly one real provider.
//! Both own one worker thread and a cross-thread stop signal, and both shut
//! down by signal-and-detach: `terminate` interrupts the worker's blocking
//! wait and returns without joining. All cleanup runs on the worker thread.

pub mod client;
pub mod socket;

pub use client::ClientBackend;
pub use socket::SocketBackend;

/// The lifecycle contract shared by both backends
pub trait EngineBackend: Send {
    /// Signals the worker thread to stop. Safe to call repeatedly and safe
    /// when nothing was announced; never blocks on the worker.
    fn terminate(&mut self);

    /// Returns whether a worker may still be running
    fn is_active(&self) -> bool;
}
