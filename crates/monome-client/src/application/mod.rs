//! Application layer: the demo policies the `monome-demo` binary runs.
//!
//! # What lives here? (for beginners)
//!
//! A session only moves messages.  Deciding that "a key press lights that
//! key" is policy, and policy belongs here.  The policies talk to devices
//! through small traits ([`surface::GridSurface`], [`surface::ArcSurface`],
//! [`surface::EventSource`]) instead of the concrete sessions, so the unit
//! tests can drive them with recording doubles and no sockets at all.
//!
//! # Sub-modules
//!
//! - **`surface`**   – The traits and the shared error type.
//! - **`grid_demo`** – Flash on ready, light pressed keys, log tilt.
//! - **`arc_demo`**  – Flash rings 0 and 1 on ready, light a ring while its
//!   encoder is held.

pub mod arc_demo;
pub mod grid_demo;
pub mod surface;
