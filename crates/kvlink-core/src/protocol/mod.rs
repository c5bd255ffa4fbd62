//! Key/Value Serial Protocol
//!
//! Implements the host side of the KvLink exchange: length-prefixed
//! key/value frames, the boot-ready handshake, and per-field
//! acknowledgement tracking over a polled byte channel.
//!
//! One frame per field:
//! - key bytes, end-of-key marker
//! - value length as big-endian digits in base `numeric_byte_limit`
//!   (omitted when the value is empty), terminated by the stop byte
//! - raw value bytes
//!
//! The firmware acknowledges each field with a single ack/nack byte;
//! [`Sender`] serializes sends against those acknowledgements.

mod acks;
pub mod channel;
mod error;
pub mod frame;
pub mod handshake;
mod params;
mod sender;
pub mod serial;

pub use channel::{Channel, DummyChannel};
pub use error::ProtocolError;
pub use frame::{decode_field, encode_field, encode_fields, DecodeResult};
pub use handshake::wait_for_ready;
pub use params::ProtocolParams;
pub use sender::{Sender, SenderConfig};
pub use serial::{clear_buffers, configure_port, list_ports, open_port, PortInfo, SerialChannel};

use std::time::Duration;

/// Default baud rate, matching the stock firmware header
pub const DEFAULT_BAUD_RATE: u32 = 28800;

/// Default idle limit while draining acknowledgements
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_millis(500);

/// Default quiet period after boot output before the link counts as ready
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

/// Sleep between empty polls in the handshake and ack-drain loops
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(5);
