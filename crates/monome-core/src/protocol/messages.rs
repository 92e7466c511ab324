//! Typed inbound events and outbound commands.
//!
//! The variant sets are fixed by the wire protocol, so both directions are
//! modelled as closed enums and consumers match on them exhaustively.

use std::fmt;

use rosc::{OscMessage, OscType};

use crate::protocol::address::{
    prefixed, GRID_LED_ALL, GRID_LED_SET, RING_ALL, RING_SET, SERIALOSC_LIST, SERIALOSC_NOTIFY,
    SYS_HOST, SYS_INFO_ID, SYS_INFO_SIZE, SYS_PORT, SYS_PREFIX,
};

/// Device-type prefix serialosc reports for arc-class hardware.
const ARC_TYPE_PREFIX: &str = "monome arc";

// ── Device events ─────────────────────────────────────────────────────────────

/// An inbound event from a grid or arc session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// The session's readiness condition was met.
    Ready { id: String },
    /// A grid key changed state (`1` = pressed, `0` = released).
    Key { x: i32, y: i32, state: i32 },
    /// A tilt sensor reading.
    Tilt { sensor: i32, x: i32, y: i32, z: i32 },
    /// An arc encoder was pushed or released.
    RingPress { encoder: i32, state: i32 },
    /// An arc encoder was turned by `delta` steps.
    RingDelta { encoder: i32, delta: i32 },
}

impl DeviceEvent {
    /// Returns the discriminant tag for this event.
    pub fn kind(&self) -> &'static str {
        match self {
            DeviceEvent::Ready { .. } => "Ready",
            DeviceEvent::Key { .. } => "Key",
            DeviceEvent::Tilt { .. } => "Tilt",
            DeviceEvent::RingPress { .. } => "RingPress",
            DeviceEvent::RingDelta { .. } => "RingDelta",
        }
    }
}

impl fmt::Display for DeviceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.kind();
        match self {
            DeviceEvent::Ready { id } => write!(f, "{kind}: id: {id}"),
            DeviceEvent::Key { x, y, state } => write!(f, "{kind}: {x}, {y}, {state}"),
            DeviceEvent::Tilt { sensor, x, y, z } => {
                write!(f, "{kind}: {sensor}, {x}, {y}, {z}")
            }
            DeviceEvent::RingPress { encoder, state } => write!(f, "{kind}: {encoder}, {state}"),
            DeviceEvent::RingDelta { encoder, delta } => write!(f, "{kind}: {encoder}, {delta}"),
        }
    }
}

// ── Discovery events ──────────────────────────────────────────────────────────

/// Which discovery message produced a [`ControlEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlEventKind {
    /// Reply to `/serialosc/list`.
    List,
    /// A device was attached.
    Add,
    /// A device was detached.
    Remove,
}

impl fmt::Display for ControlEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ControlEventKind::List => "List",
            ControlEventKind::Add => "Add",
            ControlEventKind::Remove => "Remove",
        })
    }
}

/// A device reported by serialosc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlEvent {
    pub kind: ControlEventKind,
    /// Serial id, e.g. `"m0000001"`.
    pub id: String,
    /// Hardware type string, e.g. `"monome arc 4"`.
    pub device_type: String,
    /// UDP port of the device's own control channel.
    pub port: u16,
}

impl ControlEvent {
    /// Classifies the reported hardware.  See [`DeviceKind::classify`].
    pub fn device_kind(&self) -> DeviceKind {
        DeviceKind::classify(&self.device_type)
    }
}

impl fmt::Display for ControlEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({}) on port {}",
            self.kind, self.id, self.device_type, self.port
        )
    }
}

/// Broad hardware class, which decides the session type to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Grid,
    Arc,
}

impl DeviceKind {
    /// Case-sensitive prefix test on the serialosc type string.
    ///
    /// Anything that does not start with `"monome arc"` is a grid.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use monome_core::DeviceKind;
    ///
    /// assert_eq!(DeviceKind::classify("monome arc 4"), DeviceKind::Arc);
    /// assert_eq!(DeviceKind::classify("monome 128"), DeviceKind::Grid);
    /// ```
    pub fn classify(device_type: &str) -> DeviceKind {
        if device_type.starts_with(ARC_TYPE_PREFIX) {
            DeviceKind::Arc
        } else {
            DeviceKind::Grid
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeviceKind::Grid => "grid",
            DeviceKind::Arc => "arc",
        })
    }
}

// ── Outbound commands ─────────────────────────────────────────────────────────

/// Every message a client sends to serialosc or to a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ask serialosc to list devices to `host:port`.
    List { host: String, port: u16 },
    /// Ask serialosc for one add/remove notification to `host:port`.
    Notify { host: String, port: u16 },
    SysHost(String),
    SysPort(u16),
    SysPrefix(String),
    InfoId,
    InfoSize,
    LedAll { on: bool },
    LedSet { x: i32, y: i32, state: i32 },
    RingAll { encoder: i32, level: i32 },
    RingSet { encoder: i32, led: i32, level: i32 },
}

impl Command {
    /// Builds the OSC message for this command.  `prefix` only affects
    /// device commands.
    pub fn to_message(&self, prefix: &str) -> OscMessage {
        let (addr, args) = match self {
            Command::List { host, port } => (
                SERIALOSC_LIST.to_string(),
                vec![OscType::String(host.clone()), port_arg(*port)],
            ),
            Command::Notify { host, port } => (
                SERIALOSC_NOTIFY.to_string(),
                vec![OscType::String(host.clone()), port_arg(*port)],
            ),
            Command::SysHost(host) => (SYS_HOST.to_string(), vec![OscType::String(host.clone())]),
            Command::SysPort(port) => (SYS_PORT.to_string(), vec![port_arg(*port)]),
            Command::SysPrefix(p) => (SYS_PREFIX.to_string(), vec![OscType::String(p.clone())]),
            Command::InfoId => (SYS_INFO_ID.to_string(), Vec::new()),
            Command::InfoSize => (SYS_INFO_SIZE.to_string(), Vec::new()),
            Command::LedAll { on } => (
                prefixed(prefix, GRID_LED_ALL),
                vec![OscType::Int(i32::from(*on))],
            ),
            Command::LedSet { x, y, state } => (
                prefixed(prefix, GRID_LED_SET),
                vec![OscType::Int(*x), OscType::Int(*y), OscType::Int(*state)],
            ),
            Command::RingAll { encoder, level } => (
                prefixed(prefix, RING_ALL),
                vec![OscType::Int(*encoder), OscType::Int(*level)],
            ),
            Command::RingSet {
                encoder,
                led,
                level,
            } => (
                prefixed(prefix, RING_SET),
                vec![OscType::Int(*encoder), OscType::Int(*led), OscType::Int(*level)],
            ),
        };
        OscMessage { addr, args }
    }
}

/// Ports travel as int32 on the wire.
fn port_arg(port: u16) -> OscType {
    OscType::Int(i32::from(port))
}
