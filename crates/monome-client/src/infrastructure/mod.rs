//! Infrastructure layer for the client.
//!
//! Contains OS-facing adapters: UDP sessions for serialosc and its devices,
//! and file-system configuration storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `monome_core`, but MUST NOT be imported by the `application` layer.

pub mod network;
pub mod storage;
