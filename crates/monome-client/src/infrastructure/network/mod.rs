//! Network infrastructure for the client.
//!
//! # Sub-modules
//!
//! - **`endpoint`** – One ephemeral UDP socket per session: a stateless
//!   command sender plus a spawned receive loop that decodes datagrams and
//!   hands each message to the session's handler, in arrival order.
//!
//! - **`discovery`** – The serialosc control channel.  Lists devices and
//!   keeps the add/remove subscription alive.
//!
//! - **`grid`** / **`arc`** – Per-device sessions.  Both share the
//!   handshake and readiness plumbing in `device`.
//!
//! Every session follows the same shape:
//!
//! ```text
//! start() ── bind 127.0.0.1:0 ── spawn receive loop ── send handshake
//!                                      │
//!               datagram → HandlerTable → typed event → bounded mpsc
//!                                                           │
//! read().await ◄────────────────────────────────────────────┘
//! close()      ── shutdown signal ── loop exits ── queue closes ── read() → None
//! ```

use std::net::IpAddr;

use monome_core::protocol::address::{DEFAULT_DISCOVERY_PORT, DEFAULT_PREFIX, LOOPBACK};

pub mod arc;
mod device;
pub mod discovery;
pub mod endpoint;
pub mod grid;

pub use arc::ArcSession;
pub use discovery::SerialOscSession;
pub use endpoint::SessionError;
pub use grid::GridSession;

/// Default depth of each session's event queue.
pub const DEFAULT_EVENT_QUEUE_DEPTH: usize = 32;

/// Settings shared by discovery and device sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Address serialosc and its devices listen on, and the address the
    /// session binds its own endpoint to.
    pub host: IpAddr,
    /// serialosc's discovery port.
    pub discovery_port: u16,
    /// Namespace the device roots its non-system messages under.
    pub prefix: String,
    /// How many undelivered events a session buffers before its receive
    /// loop waits for the reader.
    pub event_queue_depth: usize,
}

impl SessionConfig {
    /// Queue depth actually used; a channel needs room for at least one event.
    pub fn queue_depth(&self) -> usize {
        self.event_queue_depth.max(1)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: LOOPBACK,
            discovery_port: DEFAULT_DISCOVERY_PORT,
            prefix: DEFAULT_PREFIX.to_string(),
            event_queue_depth: DEFAULT_EVENT_QUEUE_DEPTH,
        }
    }
}
