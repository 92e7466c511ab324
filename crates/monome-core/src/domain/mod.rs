//! Domain layer: per-session state records with no I/O.
//!
//! - **`readiness`** – combines the id and size reports that arrive
//!   independently after the handshake into a single one-shot Ready event.
//! - **`lifecycle`** – the `Created → Connecting → Ready → Closed` state a
//!   session reports to its owner.

pub mod lifecycle;
pub mod readiness;
