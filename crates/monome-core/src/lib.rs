//! # monome-core
//!
//! Shared protocol layer for talking to monome control surfaces through
//! serialosc.  It contains the address table, the typed inbound events and
//! outbound commands, a thin wrapper around the OSC codec, the data-driven
//! handler tables and the per-session readiness record.
//!
//! This crate has no sockets and no async runtime.  Everything here can be
//! exercised with plain byte slices and `OscMessage` values.
//!
//! # Protocol overview (for beginners)
//!
//! serialosc is a small daemon that owns every attached grid or arc.  It
//! speaks OSC (Open Sound Control) over UDP on the loopback interface:
//!
//! - **Discovery**: the daemon listens on port 12002.  A client asks it for
//!   the device list (`/serialosc/list`) and for add/remove notifications
//!   (`/serialosc/notify`).  Each device is reported with its id, its type
//!   string and the UDP port of its own control channel.
//!
//! - **Device sessions**: the client binds its own UDP port and tells the
//!   device where to send events (`/sys/host`, `/sys/port`,
//!   `/sys/prefix`).  From then on key presses, tilt readings and encoder
//!   pushes arrive as OSC messages rooted under the prefix, and LED/ring
//!   commands are sent the other way.
//!
//! - **`protocol`** – how addresses, arguments and bytes line up.
//! - **`domain`** – the readiness and lifecycle records a session keeps.

pub mod domain;
pub mod protocol;

pub use domain::lifecycle::SessionState;
pub use domain::readiness::Readiness;
pub use protocol::codec::{decode_datagram, encode_command, ProtocolError};
pub use protocol::dispatch::{DeviceInbound, HandlerTable};
pub use protocol::messages::{Command, ControlEvent, ControlEventKind, DeviceEvent, DeviceKind};
