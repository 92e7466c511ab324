//! monome-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does monome-client do? (for beginners)
//!
//! A monome grid or arc does not talk to applications directly.  The
//! serialosc daemon owns the USB device and exposes it as a set of UDP
//! endpoints on the loopback interface.  This crate is the client side of
//! that arrangement:
//!
//! 1. [`SerialOscSession`](infrastructure::network::SerialOscSession) asks
//!    serialosc which devices exist and keeps a subscription for
//!    attach/detach notifications.
//! 2. [`GridSession`](infrastructure::network::GridSession) and
//!    [`ArcSession`](infrastructure::network::ArcSession) each bind their
//!    own UDP port, point the device at it, and turn the device's OSC
//!    messages into a stream of typed events read with `read().await`.
//! 3. The `application` layer holds the small demo policies that the
//!    `monome-demo` binary runs against those sessions.

/// Application layer: demo policies and the surface traits they drive.
pub mod application;

/// Infrastructure layer: UDP sessions and configuration storage.
pub mod infrastructure;
