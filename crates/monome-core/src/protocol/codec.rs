//! Thin wrapper around the `rosc` OSC codec.
//!
//! Outbound: a [`Command`] is turned into an `OscMessage` and encoded as a
//! single OSC packet, one packet per UDP datagram.
//!
//! Inbound: a datagram is decoded into one packet.  Bundles are flattened
//! so callers always see a list of messages in their original order.
//!
//! Positional arguments are read through [`Args`], which checks arity and
//! type per position and reports a [`ProtocolError`] instead of panicking.

use rosc::{OscMessage, OscPacket, OscType};
use thiserror::Error;

use crate::protocol::messages::Command;

/// Errors that can occur while encoding commands or decoding datagrams.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The datagram is not a valid OSC packet.
    #[error("malformed OSC packet: {0}")]
    Malformed(String),

    /// The codec refused to encode a message.
    #[error("failed to encode {addr}: {reason}")]
    Encode { addr: String, reason: String },

    /// Fewer arguments than the address requires.
    #[error("{addr}: expected at least {expected} argument(s), got {got}")]
    Arity {
        addr: String,
        expected: usize,
        got: usize,
    },

    /// An argument had the wrong OSC type.
    #[error("{addr}: argument {index} is not {expected}")]
    ArgumentType {
        addr: String,
        index: usize,
        expected: &'static str,
    },

    /// An integer argument is outside the range its field allows.
    #[error("{addr}: argument {index} out of range: {value}")]
    OutOfRange {
        addr: String,
        index: usize,
        value: i32,
    },
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes `command` into the bytes of one OSC packet.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if the codec rejects the message.
///
/// # Examples
///
/// ```rust
/// use monome_core::protocol::{decode_datagram, encode_command, Command};
///
/// let bytes = encode_command(&Command::LedSet { x: 3, y: 5, state: 1 }, "monome").unwrap();
/// let messages = decode_datagram(&bytes).unwrap();
/// assert_eq!(messages[0].addr, "/monome/grid/led/set");
/// ```
pub fn encode_command(command: &Command, prefix: &str) -> Result<Vec<u8>, ProtocolError> {
    let message = command.to_message(prefix);
    let addr = message.addr.clone();
    rosc::encoder::encode(&OscPacket::Message(message)).map_err(|e| ProtocolError::Encode {
        addr,
        reason: e.to_string(),
    })
}

/// Decodes one UDP datagram into the messages it carries.
///
/// # Errors
///
/// Returns [`ProtocolError::Malformed`] if the bytes are not an OSC packet.
pub fn decode_datagram(bytes: &[u8]) -> Result<Vec<OscMessage>, ProtocolError> {
    let (_, packet) =
        rosc::decoder::decode_udp(bytes).map_err(|e| ProtocolError::Malformed(e.to_string()))?;
    let mut messages = Vec::new();
    flatten(packet, &mut messages);
    Ok(messages)
}

fn flatten(packet: OscPacket, out: &mut Vec<OscMessage>) {
    match packet {
        OscPacket::Message(m) => out.push(m),
        OscPacket::Bundle(b) => {
            for inner in b.content {
                flatten(inner, out);
            }
        }
    }
}

// ── Positional argument reader ────────────────────────────────────────────────

/// Typed, position-checked view over a message's arguments.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    addr: &'a str,
    args: &'a [OscType],
}

impl<'a> Args<'a> {
    /// Wraps `msg` after checking it carries at least `count` arguments.
    ///
    /// Extra trailing arguments are tolerated.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Arity`] if fewer arguments are present.
    pub fn require(msg: &'a OscMessage, count: usize) -> Result<Self, ProtocolError> {
        if msg.args.len() < count {
            return Err(ProtocolError::Arity {
                addr: msg.addr.clone(),
                expected: count,
                got: msg.args.len(),
            });
        }
        Ok(Self {
            addr: &msg.addr,
            args: &msg.args,
        })
    }

    /// Reads a string argument.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::ArgumentType`] for any other type.
    pub fn string(&self, index: usize) -> Result<String, ProtocolError> {
        match self.args.get(index) {
            Some(OscType::String(s)) => Ok(s.clone()),
            _ => Err(self.type_error(index, "a string")),
        }
    }

    /// Reads an int32 argument.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::ArgumentType`] for any other type.
    pub fn int(&self, index: usize) -> Result<i32, ProtocolError> {
        match self.args.get(index) {
            Some(OscType::Int(v)) => Ok(*v),
            _ => Err(self.type_error(index, "an int32")),
        }
    }

    /// Reads an int32 argument that must be a valid UDP port.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::OutOfRange`] if the value does not fit in `u16`.
    pub fn port(&self, index: usize) -> Result<u16, ProtocolError> {
        let value = self.int(index)?;
        u16::try_from(value).map_err(|_| ProtocolError::OutOfRange {
            addr: self.addr.to_string(),
            index,
            value,
        })
    }

    fn type_error(&self, index: usize, expected: &'static str) -> ProtocolError {
        ProtocolError::ArgumentType {
            addr: self.addr.to_string(),
            index,
            expected,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
