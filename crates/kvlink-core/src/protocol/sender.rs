//! Send/receive façade
//!
//! [`Sender`] owns the transport and serializes every operation behind one
//! mutex: a send drains the previous send's acknowledgements, writes the
//! new frames, and registers the acknowledgements it now expects; a read
//! drains and hands back whatever non-ack output the device produced. The
//! first operation on a fresh link performs the boot-ready handshake
//! automatically.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::acks::AckTracker;
use super::channel::Channel;
use super::serial::SerialChannel;
use super::{frame, handshake};
use super::{ProtocolError, ProtocolParams, DEFAULT_ACK_TIMEOUT, DEFAULT_QUIET_PERIOD};

/// Tunables for a [`Sender`] session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderConfig {
    /// Wait per transport read; zero polls without waiting
    pub read_timeout: Duration,

    /// Idle limit while draining acknowledgements
    pub ack_timeout: Duration,

    /// How long boot output must stay quiet before the link counts as ready
    pub quiet_period: Duration,

    /// Treat the link as ready immediately, skipping the boot handshake.
    /// For boards whose serial is emulated over native USB and which do not
    /// reset (or print anything) when the port opens.
    pub start_ready: bool,

    /// Echo device boot output to stdout while waiting for ready
    pub echo_boot_output: bool,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::ZERO,
            ack_timeout: DEFAULT_ACK_TIMEOUT,
            quiet_period: DEFAULT_QUIET_PERIOD,
            start_ready: false,
            echo_boot_output: true,
        }
    }
}

struct SenderState {
    channel: Box<dyn Channel>,
    ready: bool,
    acks: AckTracker,
}

/// Thread-safe façade over one key/value session.
///
/// All operations serialize on an internal mutex, so a `Sender` can be
/// shared behind an [`Arc`] and driven from multiple threads; no two
/// operations ever interleave their access to the transport. The lock is
/// held for the full duration of each call, including the blocking
/// handshake and ack-drain loops.
pub struct Sender {
    params: Arc<ProtocolParams>,
    config: SenderConfig,
    state: Mutex<SenderState>,
}

impl Sender {
    /// Build a sender over an already-open channel.
    ///
    /// Fails if `params` violates the marker-distinctness rules.
    pub fn new(
        channel: Box<dyn Channel>,
        params: Arc<ProtocolParams>,
        config: SenderConfig,
    ) -> Result<Self, ProtocolError> {
        params.validate()?;
        let state = SenderState {
            channel,
            ready: config.start_ready,
            acks: AckTracker::default(),
        };
        Ok(Self {
            params,
            config,
            state: Mutex::new(state),
        })
    }

    /// Open the serial device at `path` (at the params' baud rate) and
    /// build a sender over it
    pub fn open(
        path: &str,
        params: Arc<ProtocolParams>,
        config: SenderConfig,
    ) -> Result<Self, ProtocolError> {
        let channel = SerialChannel::open(path, params.baud_rate, config.read_timeout)?;
        Self::new(Box::new(channel), params, config)
    }

    /// Parameters this session runs with
    pub fn params(&self) -> &ProtocolParams {
        &self.params
    }

    /// Block until the device has signalled ready; a no-op once it has.
    ///
    /// Performed automatically by the first [`send`](Self::send) or
    /// [`read`](Self::read) if never called explicitly. Never times out: a
    /// device that never prints the ready string blocks this call forever
    /// (see [`handshake::wait_for_ready`]).
    pub fn wait_for_ready(&self) -> Result<(), ProtocolError> {
        let mut state = self.lock();
        self.ensure_ready(&mut state)
    }

    /// Encode `fields` and write them to the device.
    ///
    /// Any acknowledgements still owed from the previous send are drained
    /// first, then the frames are written and `fields.len()` new
    /// acknowledgements are registered. Returns as soon as the write
    /// completes; the new acknowledgements are collected by the next
    /// operation. Rejects the whole batch before writing anything if any
    /// field fails validation.
    pub fn send(&self, fields: &[(&str, &[u8])]) -> Result<(), ProtocolError> {
        let mut state = self.lock();
        self.ensure_ready(&mut state)?;
        let SenderState { channel, acks, .. } = &mut *state;
        acks.drain(channel.as_mut(), &self.params, self.config.ack_timeout)?;

        let payload = frame::encode_fields(&self.params, fields)?;
        channel.write_all(&payload)?;
        acks.expect(fields.len());
        tracing::debug!(fields = fields.len(), bytes = payload.len(), "sent");
        Ok(())
    }

    /// Drain outstanding acknowledgements, then return everything the
    /// device has printed: bytes buffered during past drains first, then
    /// any line output still waiting in the transport.
    ///
    /// Blocks up to the ack timeout for outstanding acknowledgements, but
    /// never waits for more printed output than is already there.
    pub fn read(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut state = self.lock();
        self.ensure_ready(&mut state)?;
        let SenderState { channel, acks, .. } = &mut *state;
        acks.drain(channel.as_mut(), &self.params, self.config.ack_timeout)?;

        let mut output = acks.take_output();
        loop {
            let line = channel.read_line()?;
            if line.is_empty() {
                break;
            }
            output.extend_from_slice(&line);
        }
        tracing::trace!(bytes = output.len(), "read");
        Ok(output)
    }

    /// [`read`](Self::read), lossily decoded as UTF-8
    pub fn read_to_string(&self) -> Result<String, ProtocolError> {
        Ok(String::from_utf8_lossy(&self.read()?).into_owned())
    }

    /// Read and copy the result to stdout
    pub fn read_and_print(&self) -> Result<(), ProtocolError> {
        let text = self.read_to_string()?;
        if !text.is_empty() {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
        }
        Ok(())
    }

    fn ensure_ready(&self, state: &mut SenderState) -> Result<(), ProtocolError> {
        if state.ready {
            return Ok(());
        }
        tracing::debug!(ready_string = %self.params.ready_string, "waiting for device ready");
        if self.config.echo_boot_output {
            handshake::wait_for_ready(
                state.channel.as_mut(),
                &self.params.ready_string,
                self.config.quiet_period,
                &mut io::stdout(),
            )?;
        } else {
            handshake::wait_for_ready(
                state.channel.as_mut(),
                &self.params.ready_string,
                self.config.quiet_period,
                &mut io::sink(),
            )?;
        }
        state.ready = true;
        tracing::debug!("device ready");
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, SenderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
