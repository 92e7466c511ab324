//! Protocol module containing the address table, message types, the OSC
//! codec wrapper and the handler tables.

pub mod address;
pub mod codec;
pub mod dispatch;
pub mod messages;

pub use codec::{decode_datagram, encode_command, Args, ProtocolError};
pub use dispatch::{arc_table, discovery_table, grid_table, DeviceInbound, HandlerTable};
pub use messages::*;
