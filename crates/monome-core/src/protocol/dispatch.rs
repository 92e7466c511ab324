//! Data-driven handler tables.
//!
//! Each session builds one [`HandlerTable`] at setup.  It maps an inbound
//! address to a plain decode function that validates the arguments and
//! returns a typed value.  Keeping the table as data means the full inbound
//! surface of a session can be listed and tested without a socket.
//!
//! ```text
//! datagram ──decode_datagram──► OscMessage ──route──► Option<Result<T, ProtocolError>>
//!                                                │
//!                              None  = address not in table (ignored)
//!                              Err   = known address, bad arguments
//!                              Ok(T) = typed value for the session
//! ```

use std::collections::HashMap;
use std::fmt;

use rosc::OscMessage;
use tracing::trace;

use crate::protocol::address::{
    prefixed, ENC_DELTA, ENC_KEY, GRID_KEY, SERIALOSC_ADD, SERIALOSC_DEVICE, SERIALOSC_REMOVE,
    SYS_ID, SYS_SIZE, TILT,
};
use crate::protocol::codec::{Args, ProtocolError};
use crate::protocol::messages::{ControlEvent, ControlEventKind, DeviceEvent};

/// Decode function registered against one address.
pub type Decoder<T> = fn(&OscMessage) -> Result<T, ProtocolError>;

/// Mapping from address to decoder, built once per session.
pub struct HandlerTable<T> {
    routes: HashMap<String, Decoder<T>>,
}

impl<T> HandlerTable<T> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Registers `decoder` for `addr`, replacing any earlier entry.
    pub fn with_route(mut self, addr: impl Into<String>, decoder: Decoder<T>) -> Self {
        self.routes.insert(addr.into(), decoder);
        self
    }

    /// Decodes `msg` with the decoder registered for its address.
    ///
    /// Returns `None` when the address is not routed.
    pub fn route(&self, msg: &OscMessage) -> Option<Result<T, ProtocolError>> {
        match self.routes.get(msg.addr.as_str()) {
            Some(decode) => Some(decode(msg)),
            None => {
                trace!(addr = %msg.addr, "no route for address");
                None
            }
        }
    }

    /// Returns `true` if `addr` has a decoder.
    pub fn handles(&self, addr: &str) -> bool {
        self.routes.contains_key(addr)
    }

    /// Returns the routed addresses in sorted order.
    pub fn addresses(&self) -> Vec<&str> {
        let mut addrs: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        addrs.sort_unstable();
        addrs
    }
}

impl<T> Default for HandlerTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for HandlerTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerTable")
            .field("addresses", &self.addresses())
            .finish()
    }
}

// ── Discovery table ───────────────────────────────────────────────────────────

/// Routes `/serialosc/device`, `/serialosc/add` and `/serialosc/remove`.
pub fn discovery_table() -> HandlerTable<ControlEvent> {
    HandlerTable::new()
        .with_route(SERIALOSC_DEVICE, decode_list)
        .with_route(SERIALOSC_ADD, decode_add)
        .with_route(SERIALOSC_REMOVE, decode_remove)
}

fn decode_list(msg: &OscMessage) -> Result<ControlEvent, ProtocolError> {
    decode_control(msg, ControlEventKind::List)
}

fn decode_add(msg: &OscMessage) -> Result<ControlEvent, ProtocolError> {
    decode_control(msg, ControlEventKind::Add)
}

fn decode_remove(msg: &OscMessage) -> Result<ControlEvent, ProtocolError> {
    decode_control(msg, ControlEventKind::Remove)
}

/// `id(string) type(string) port(int)`
fn decode_control(msg: &OscMessage, kind: ControlEventKind) -> Result<ControlEvent, ProtocolError> {
    let args = Args::require(msg, 3)?;
    Ok(ControlEvent {
        kind,
        id: args.string(0)?,
        device_type: args.string(1)?,
        port: args.port(2)?,
    })
}

// ── Device tables ─────────────────────────────────────────────────────────────

/// A typed inbound message on a grid or arc session.
///
/// `Id` and `Size` feed the session's readiness record; everything else is
/// already a [`DeviceEvent`] and is published as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceInbound {
    Id(String),
    Size { width: i32, height: i32 },
    Event(DeviceEvent),
}

/// Routes `/sys/id`, `/sys/size`, `/<prefix>/grid/key` and `/<prefix>/tilt`.
pub fn grid_table(prefix: &str) -> HandlerTable<DeviceInbound> {
    HandlerTable::new()
        .with_route(SYS_ID, decode_id)
        .with_route(SYS_SIZE, decode_size)
        .with_route(prefixed(prefix, GRID_KEY), decode_key)
        .with_route(prefixed(prefix, TILT), decode_tilt)
}

/// Routes `/sys/id`, `/<prefix>/enc/key` and `/<prefix>/enc/delta`.
///
/// Arcs have no size gate, so `/sys/size` is deliberately left unrouted.
pub fn arc_table(prefix: &str) -> HandlerTable<DeviceInbound> {
    HandlerTable::new()
        .with_route(SYS_ID, decode_id)
        .with_route(prefixed(prefix, ENC_KEY), decode_enc_key)
        .with_route(prefixed(prefix, ENC_DELTA), decode_enc_delta)
}

fn decode_id(msg: &OscMessage) -> Result<DeviceInbound, ProtocolError> {
    let args = Args::require(msg, 1)?;
    Ok(DeviceInbound::Id(args.string(0)?))
}

fn decode_size(msg: &OscMessage) -> Result<DeviceInbound, ProtocolError> {
    let args = Args::require(msg, 2)?;
    Ok(DeviceInbound::Size {
        width: args.int(0)?,
        height: args.int(1)?,
    })
}

fn decode_key(msg: &OscMessage) -> Result<DeviceInbound, ProtocolError> {
    let args = Args::require(msg, 3)?;
    Ok(DeviceInbound::Event(DeviceEvent::Key {
        x: args.int(0)?,
        y: args.int(1)?,
        state: args.int(2)?,
    }))
}

fn decode_tilt(msg: &OscMessage) -> Result<DeviceInbound, ProtocolError> {
    let args = Args::require(msg, 4)?;
    Ok(DeviceInbound::Event(DeviceEvent::Tilt {
        sensor: args.int(0)?,
        x: args.int(1)?,
        y: args.int(2)?,
        z: args.int(3)?,
    }))
}

fn decode_enc_key(msg: &OscMessage) -> Result<DeviceInbound, ProtocolError> {
    let args = Args::require(msg, 2)?;
    Ok(DeviceInbound::Event(DeviceEvent::RingPress {
        encoder: args.int(0)?,
        state: args.int(1)?,
    }))
}

fn decode_enc_delta(msg: &OscMessage) -> Result<DeviceInbound, ProtocolError> {
    let args = Args::require(msg, 2)?;
    Ok(DeviceInbound::Event(DeviceEvent::RingDelta {
        encoder: args.int(0)?,
        delta: args.int(1)?,
    }))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
