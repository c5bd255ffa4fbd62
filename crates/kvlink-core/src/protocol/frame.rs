//! Frame encoding/decoding
//!
//! Implements the key/value wire format, one frame per field:
//! - key bytes (must not contain the end-of-key marker)
//! - 1 byte: end-of-key marker
//! - N bytes: value length as big-endian digits in base `numeric_byte_limit`,
//!   omitted entirely for an empty value
//! - 1 byte: length stop (the base value itself, never a valid digit)
//! - value bytes, raw
//!
//! For example, with the stock parameters (`\0` end-of-key, base 255):
//! `MESG\0\x06\xffHello!`. The length prefix is what lets value bytes
//! contain marker bytes verbatim.
//!
//! The host only ever encodes; [`decode_field`] exists because the firmware
//! decodes per the same contract and the pairing keeps the format honest in
//! tests.

use super::{ProtocolError, ProtocolParams};

/// Encode one key/value field into its wire frame.
///
/// Rejects a key containing the end-of-key marker and a value longer than
/// `max_value_size` before producing any bytes. A zero-length value encodes
/// to just `key + end-of-key + stop`, with no length digits.
pub fn encode_field(
    params: &ProtocolParams,
    key: &[u8],
    value: &[u8],
) -> Result<Vec<u8>, ProtocolError> {
    if key.contains(&params.end_of_key) {
        return Err(ProtocolError::InvalidKey(params.end_of_key));
    }
    if value.len() > params.max_value_size {
        return Err(ProtocolError::OversizedValue {
            len: value.len(),
            max: params.max_value_size,
        });
    }

    let mut frame = Vec::with_capacity(key.len() + value.len() + 4);
    frame.extend_from_slice(key);
    frame.push(params.end_of_key);
    frame.extend_from_slice(&pack_length(value.len(), params.numeric_byte_limit));
    frame.push(params.length_stop());
    frame.extend_from_slice(value);
    Ok(frame)
}

/// Encode a batch of named fields into one contiguous byte sequence.
///
/// Frames are concatenated in the order given, with no separators; each
/// frame is self-delimiting. Validation is all-or-nothing: if any field is
/// rejected the whole batch produces nothing.
pub fn encode_fields(
    params: &ProtocolParams,
    fields: &[(&str, &[u8])],
) -> Result<Vec<u8>, ProtocolError> {
    let mut out = Vec::new();
    for (key, value) in fields {
        out.extend_from_slice(&encode_field(params, key.as_bytes(), value)?);
    }
    Ok(out)
}

/// Minimal big-endian digits of `n` in base `base`; empty for `n == 0`.
///
/// Every digit is strictly below the base, so the stop byte (equal to the
/// base) can never appear in the digit run.
fn pack_length(n: usize, base: u8) -> Vec<u8> {
    let base = usize::from(base);
    let mut digits = Vec::new();
    let mut n = n;
    while n > 0 {
        digits.push((n % base) as u8);
        n /= base;
    }
    digits.reverse();
    digits
}

/// Outcome of [`decode_field`] on a byte window
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult {
    /// One complete field parsed from the front of the window
    Field {
        /// Key bytes, without the end-of-key marker
        key: Vec<u8>,
        /// Value bytes
        value: Vec<u8>,
        /// How many bytes of the window the frame occupied
        consumed: usize,
    },
    /// The window ends before the frame does
    Incomplete,
}

/// Parse one field from the front of `data`, per the contract the firmware
/// decoder follows.
///
/// Fails only on byte sequences no encoder output can produce (a length
/// digit above the base, or a length too large to represent).
pub fn decode_field(params: &ProtocolParams, data: &[u8]) -> Result<DecodeResult, ProtocolError> {
    // Key runs until the end-of-key marker
    let Some(key_end) = data.iter().position(|&b| b == params.end_of_key) else {
        return Ok(DecodeResult::Incomplete);
    };
    let key = data[..key_end].to_vec();

    // Length digits run until the stop byte
    let base = usize::from(params.numeric_byte_limit);
    let mut len: usize = 0;
    let mut idx = key_end + 1;
    loop {
        let Some(&byte) = data.get(idx) else {
            return Ok(DecodeResult::Incomplete);
        };
        idx += 1;
        if byte == params.length_stop() {
            break;
        }
        if byte > params.numeric_byte_limit {
            return Err(ProtocolError::InvalidFrame(format!(
                "length digit {byte:#04x} at offset {} above base {base}",
                idx - 1
            )));
        }
        len = len
            .checked_mul(base)
            .and_then(|l| l.checked_add(usize::from(byte)))
            .ok_or_else(|| {
                ProtocolError::InvalidFrame("length overflows the host word size".to_string())
            })?;
    }

    // Compared against the remaining window: idx + len can overflow for a
    // declared length near usize::MAX, while idx never passes data.len()
    if data.len() - idx < len {
        return Ok(DecodeResult::Incomplete);
    }
    Ok(DecodeResult::Field {
        key,
        value: data[idx..idx + len].to_vec(),
        consumed: idx + len,
    })
}
