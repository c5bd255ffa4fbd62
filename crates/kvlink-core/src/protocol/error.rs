//! Protocol errors

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while driving the key/value link
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("cannot send {len} byte value, {max} byte maximum")]
    OversizedValue { len: usize, max: usize },

    #[error("no acknowledgement data for {idle:.2?} (limit {limit:.2?}), aborting")]
    Timeout { idle: Duration, limit: Duration },

    #[error("key contains the end-of-key marker byte {0:#04x}")]
    InvalidKey(u8),

    #[error("invalid protocol parameters: {0}")]
    InvalidParams(String),

    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    #[error("shared header: {0}")]
    SharedHeader(#[from] crate::shared::HeaderError),

    #[error("serial port error: {0}")]
    SerialError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
