//! Transport capability abstraction
//!
//! The protocol needs three operations from whatever carries its bytes:
//! bulk write, a zero-or-one-byte read, and a line-oriented read. Anything
//! providing those can sit under a [`Sender`](super::Sender). The real
//! serial implementation lives in [`serial`](super::serial);
//! [`DummyChannel`] here answers like an always-cooperative device for
//! demos and tests without hardware.

use std::io::{self, Write};

use super::ProtocolParams;

/// Duplex byte-stream capability the protocol drives.
///
/// Reads are polled: when no data is available within the transport's
/// configured timeout, [`read_byte`](Channel::read_byte) returns `Ok(None)`
/// and [`read_line`](Channel::read_line) returns an empty buffer rather
/// than blocking indefinitely.
pub trait Channel: Send {
    /// Write all of `data`, flushing through to the device
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Read at most one byte; `None` when nothing is available right now
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Read available output up to one line, newline included when present;
    /// empty when nothing is available right now
    fn read_line(&mut self) -> io::Result<Vec<u8>>;
}

/// In-memory channel that behaves like a fully cooperative device.
///
/// `read_line` produces the ready line exactly once, `read_byte` always
/// produces an ack, and written frames are echoed to stdout unless
/// silenced. A session over it runs the full handshake/send/read cycle
/// with no hardware attached.
pub struct DummyChannel {
    ready_line: Vec<u8>,
    ack_byte: u8,
    silent: bool,
    ready_sent: bool,
}

impl DummyChannel {
    /// Build a dummy speaking the dialect of `params`
    pub fn new(params: &ProtocolParams) -> Self {
        Self {
            ready_line: format!("{}\n", params.ready_string).into_bytes(),
            ack_byte: params.ack_byte,
            silent: false,
            ready_sent: false,
        }
    }

    /// Suppress echoing of written frames
    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }
}

impl Channel for DummyChannel {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        if !self.silent {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", String::from_utf8_lossy(data))?;
        }
        Ok(())
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(Some(self.ack_byte))
    }

    fn read_line(&mut self) -> io::Result<Vec<u8>> {
        if self.ready_sent {
            return Ok(Vec::new());
        }
        self.ready_sent = true;
        Ok(self.ready_line.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dummy_sends_ready_once() {
        let params = ProtocolParams::default();
        let mut dummy = DummyChannel::new(&params).silent();
        assert_eq!(dummy.read_line().unwrap(), b"Ready.\n");
        assert_eq!(dummy.read_line().unwrap(), b"");
        assert_eq!(dummy.read_line().unwrap(), b"");
    }

    #[test]
    fn test_dummy_always_acks() {
        let params = ProtocolParams::default();
        let mut dummy = DummyChannel::new(&params).silent();
        for _ in 0..8 {
            assert_eq!(dummy.read_byte().unwrap(), Some(params.ack_byte));
        }
    }

    #[test]
    fn test_dummy_accepts_writes_when_silent() {
        let params = ProtocolParams::default();
        let mut dummy = DummyChannel::new(&params).silent();
        dummy.write_all(b"NUM\x00\x02\xff42").unwrap();
    }
}
