//! Boot-ready handshake
//!
//! Classic Arduinos reset when the host opens the port, then print their
//! boot output ending in a ready line. Sending before that line has
//! appeared loses frames, and sending right when it appears can still race
//! trailing boot diagnostics. The detector here waits for both: the ready
//! string must have been seen, and the stream must have stayed quiet for a
//! grace period afterwards.

use std::io::{self, Write};
use std::thread;
use std::time::{Duration, Instant};

use super::channel::Channel;
use super::POLL_INTERVAL;

/// Block until `ready_string` has appeared in the device's line output and
/// nothing more has arrived for `quiet_period`.
///
/// Every line read is forwarded to `sink` so an operator can watch the
/// device boot live. Accumulation spans reads, so a ready string split
/// across partial lines still matches.
///
/// This never times out: a device that never prints the ready string blocks
/// the call forever. Callers needing an upper bound must supply their own
/// watchdog.
pub fn wait_for_ready(
    channel: &mut dyn Channel,
    ready_string: &str,
    quiet_period: Duration,
    sink: &mut dyn Write,
) -> io::Result<()> {
    let mut seen: Vec<u8> = Vec::new();
    let mut ready_seen = false;
    let mut last_output = Instant::now();

    loop {
        let line = channel.read_line()?;
        if !line.is_empty() {
            sink.write_all(&line)?;
            sink.flush()?;
            tracing::trace!(
                line = %String::from_utf8_lossy(&line).trim_end(),
                "boot output"
            );
            if !ready_seen {
                seen.extend_from_slice(&line);
                if contains(&seen, ready_string.as_bytes()) {
                    ready_seen = true;
                    tracing::debug!(ready_string, "ready marker observed");
                }
            }
            last_output = Instant::now();
        } else {
            if ready_seen && last_output.elapsed() >= quiet_period {
                return Ok(());
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    struct LineScript {
        lines: VecDeque<Vec<u8>>,
    }

    impl LineScript {
        fn new<const N: usize>(lines: [&[u8]; N]) -> Self {
            Self {
                lines: lines.iter().map(|l| l.to_vec()).collect(),
            }
        }
    }

    impl Channel for LineScript {
        fn write_all(&mut self, _data: &[u8]) -> io::Result<()> {
            Ok(())
        }

        fn read_byte(&mut self) -> io::Result<Option<u8>> {
            Ok(None)
        }

        fn read_line(&mut self) -> io::Result<Vec<u8>> {
            Ok(self.lines.pop_front().unwrap_or_default())
        }
    }

    #[test]
    fn test_returns_after_ready_and_quiet() {
        let mut channel = LineScript::new([b"booting...\n".as_slice(), b"Ready.\n"]);
        let mut sink = Vec::new();
        wait_for_ready(&mut channel, "Ready.", Duration::from_millis(20), &mut sink).unwrap();
        assert_eq!(sink, b"booting...\nReady.\n");
    }

    #[test]
    fn test_matches_ready_split_across_reads() {
        let mut channel = LineScript::new([b"Rea".as_slice(), b"dy.\n"]);
        let mut sink = Vec::new();
        wait_for_ready(&mut channel, "Ready.", Duration::ZERO, &mut sink).unwrap();
        assert_eq!(sink, b"Ready.\n");
    }

    #[test]
    fn test_quiet_period_restarts_on_late_output() {
        // Ready arrives, then more boot noise; the wait must extend past
        // the last line, not end at the ready line.
        let mut channel = LineScript::new([
            b"Ready.\n".as_slice(),
            b"calibrating sensors\n",
            b"done\n",
        ]);
        let mut sink = Vec::new();
        let quiet = Duration::from_millis(40);
        let start = Instant::now();
        wait_for_ready(&mut channel, "Ready.", quiet, &mut sink).unwrap();
        assert!(start.elapsed() >= quiet);
        assert!(sink.ends_with(b"done\n"));
    }
}
