//! Session lifecycle.
//!
//! ```text
//! Created ──► Connecting ──► Ready
//!    │            │            │
//!    └────────────┴────────────┴──► Closed
//! ```
//!
//! There is no timeout transition: a session that never becomes ready stays
//! in `Connecting` until its owner closes it.

/// Where a device or discovery session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum SessionState {
    /// Local endpoint bound; nothing sent yet.
    #[default]
    Created,
    /// Handshake sent; waiting for the readiness condition.
    Connecting,
    /// Readiness condition met.
    Ready,
    /// Local endpoint shut down.  Terminal.
    Closed,
}

impl SessionState {
    /// Returns the state after attempting to move to `to`.
    ///
    /// Transitions only move forward, so a late `Connecting` after `Ready`
    /// is ignored, and nothing leaves `Closed`.
    pub fn advance(self, to: SessionState) -> SessionState {
        self.max(to)
    }

    /// Returns `true` for [`SessionState::Closed`].
    pub fn is_closed(self) -> bool {
        self == SessionState::Closed
    }
}
