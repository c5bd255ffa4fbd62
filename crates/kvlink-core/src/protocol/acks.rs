//! Acknowledgement tracking
//!
//! The firmware answers every field it receives with a single ack (or
//! nack) byte. Sends are fire-and-forget: the tracker counts how many of
//! those bytes are still owed, and drains them off the stream before the
//! next operation touches it, buffering any interleaved device output it
//! walks past on the way.
//!
//! Detection is a single-byte value match, so unrelated device output that
//! happens to contain the ack byte value is miscounted as an
//! acknowledgement. That is a known weakness of the wire contract itself,
//! shared with the firmware side, and is deliberately not papered over
//! here.

use std::thread;
use std::time::{Duration, Instant};

use super::channel::Channel;
use super::{ProtocolError, ProtocolParams, POLL_INTERVAL};

/// Counts outstanding per-field acknowledgements and buffers non-ack bytes
/// encountered while draining them.
#[derive(Debug, Default)]
pub(crate) struct AckTracker {
    pending: usize,
    output: Vec<u8>,
}

impl AckTracker {
    /// Acknowledgements still owed by the device
    pub(crate) fn pending(&self) -> usize {
        self.pending
    }

    /// Register `n` more expected acknowledgement bytes
    pub(crate) fn expect(&mut self, n: usize) {
        self.pending += n;
    }

    /// Take everything buffered so far, leaving the buffer empty
    pub(crate) fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }

    /// Pull bytes off the channel one at a time until every pending
    /// acknowledgement is resolved.
    ///
    /// Ack and nack both resolve one pending count; a nack is logged but
    /// carries no distinct signal. Anything else is buffered for the next
    /// read. Fails once the channel has produced nothing for longer than
    /// `timeout`, leaving the pending count and buffer exactly as they
    /// were so the caller can retry the drain or abandon the session.
    pub(crate) fn drain(
        &mut self,
        channel: &mut dyn Channel,
        params: &ProtocolParams,
        timeout: Duration,
    ) -> Result<(), ProtocolError> {
        if self.pending == 0 {
            return Ok(());
        }
        tracing::trace!(pending = self.pending, "draining acknowledgements");

        let mut last_data = Instant::now();
        while self.pending > 0 {
            match channel.read_byte()? {
                Some(byte) if byte == params.ack_byte || byte == params.nack_byte => {
                    if byte == params.nack_byte {
                        tracing::warn!("device nacked a field");
                    }
                    self.pending -= 1;
                    last_data = Instant::now();
                }
                Some(byte) => {
                    self.output.push(byte);
                    last_data = Instant::now();
                }
                None => {
                    let idle = last_data.elapsed();
                    if idle > timeout {
                        tracing::debug!(
                            pending = self.pending,
                            ?idle,
                            "acknowledgement drain timed out"
                        );
                        return Err(ProtocolError::Timeout {
                            idle,
                            limit: timeout,
                        });
                    }
                    thread::sleep(POLL_INTERVAL);
                }
            }
        }
        Ok(())
    }
}
