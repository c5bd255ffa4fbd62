//! Protocol parameter set
//!
//! Both ends of the link compile against one set of constants: marker
//! bytes, the length-digit base, size limits, the ready line. The firmware
//! publishes them in its shared header; the host builds a [`ProtocolParams`]
//! from that same header (or from the stock defaults) once, then shares it
//! read-only for the lifetime of the session.

use serde::{Deserialize, Serialize};

use crate::shared::SharedDefines;

use super::{ProtocolError, DEFAULT_BAUD_RATE};

/// Shared-header names the parameter set is built from
const SERIAL_BAUD_NAME: &str = "SERIAL_BAUD";
const READY_STRING_NAME: &str = "READY_STRING";
const NUMERIC_BYTE_LIMIT_NAME: &str = "NUMERIC_BYTE_LIMIT";
const END_OF_KEY_NAME: &str = "END_OF_KEY";
const MAX_VALUE_SIZE_NAME: &str = "MAX_VALUE_SIZE";
const ACK_NAME: &str = "ACK_CHAR_VALUE";
const NACK_NAME: &str = "NACK_CHAR_VALUE";

/// Values agreed with the firmware before any frame is exchanged.
///
/// All fields are fixed for the lifetime of a session. The stock defaults
/// match the header shipped with the reference firmware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolParams {
    /// Serial baud rate both sides run at
    pub baud_rate: u32,

    /// Line the firmware prints once its setup has finished
    pub ready_string: String,

    /// Base for length digits; its value doubles as the length-stop byte
    pub numeric_byte_limit: u8,

    /// Marker byte terminating the key portion of a frame
    pub end_of_key: u8,

    /// Largest value payload a single frame may carry, in bytes
    pub max_value_size: usize,

    /// Byte the firmware sends to confirm one received field
    pub ack_byte: u8,

    /// Byte the firmware sends to reject one received field
    pub nack_byte: u8,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            ready_string: "Ready.".to_string(),
            numeric_byte_limit: 255,
            end_of_key: 0,
            max_value_size: 255,
            // ASCII ACK / NAK control codes
            ack_byte: 6,
            nack_byte: 21,
        }
    }
}

impl ProtocolParams {
    /// Build parameters from the firmware's shared header definitions.
    ///
    /// Every protocol name must be present (`SERIAL_BAUD`, `READY_STRING`,
    /// `NUMERIC_BYTE_LIMIT`, `END_OF_KEY`, `MAX_VALUE_SIZE`,
    /// `ACK_CHAR_VALUE`, `NACK_CHAR_VALUE`); a header missing one is
    /// rejected rather than silently patched with a default.
    pub fn from_defines(defines: &SharedDefines) -> Result<Self, ProtocolError> {
        let params = Self {
            baud_rate: read_u32(defines, SERIAL_BAUD_NAME)?,
            ready_string: defines.get_str(READY_STRING_NAME)?,
            numeric_byte_limit: read_byte(defines, NUMERIC_BYTE_LIMIT_NAME)?,
            end_of_key: read_byte(defines, END_OF_KEY_NAME)?,
            max_value_size: read_usize(defines, MAX_VALUE_SIZE_NAME)?,
            ack_byte: read_byte(defines, ACK_NAME)?,
            nack_byte: read_byte(defines, NACK_NAME)?,
        };
        params.validate()?;
        Ok(params)
    }

    /// Load and validate parameters straight from a header file
    pub fn from_header(path: impl AsRef<std::path::Path>) -> Result<Self, ProtocolError> {
        Self::from_defines(&SharedDefines::load(path)?)
    }

    /// Byte terminating the length-digit run; by contract the base value itself
    pub fn length_stop(&self) -> u8 {
        self.numeric_byte_limit
    }

    /// Check the digit-base bounds and the marker-distinctness rules.
    ///
    /// The end-of-key marker, the length-stop byte, and the two
    /// acknowledgement codes must be four distinct byte values, and the
    /// length-digit base must leave room for at least one non-stop digit.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.numeric_byte_limit < 2 {
            return Err(ProtocolError::InvalidParams(format!(
                "{NUMERIC_BYTE_LIMIT_NAME} must be at least 2, got {}",
                self.numeric_byte_limit
            )));
        }
        let markers = [
            (END_OF_KEY_NAME, self.end_of_key),
            ("length stop byte", self.length_stop()),
            (ACK_NAME, self.ack_byte),
            (NACK_NAME, self.nack_byte),
        ];
        for (i, (name_a, a)) in markers.iter().enumerate() {
            for (name_b, b) in &markers[i + 1..] {
                if a == b {
                    return Err(ProtocolError::InvalidParams(format!(
                        "{name_a} and {name_b} collide on byte value {a:#04x}"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn read_u32(defines: &SharedDefines, name: &str) -> Result<u32, ProtocolError> {
    let n = defines.get_int(name)?;
    u32::try_from(n).map_err(|_| {
        ProtocolError::InvalidParams(format!(
            "{name} must fit in an unsigned 32-bit integer, got {n}"
        ))
    })
}

fn read_usize(defines: &SharedDefines, name: &str) -> Result<usize, ProtocolError> {
    let n = defines.get_int(name)?;
    usize::try_from(n)
        .map_err(|_| ProtocolError::InvalidParams(format!("{name} must be non-negative, got {n}")))
}

fn read_byte(defines: &SharedDefines, name: &str) -> Result<u8, ProtocolError> {
    let n = defines.get_int(name)?;
    u8::try_from(n)
        .map_err(|_| ProtocolError::InvalidParams(format!("{name} must fit in a byte, got {n}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = ProtocolParams::default();
        params.validate().unwrap();
        assert_eq!(params.length_stop(), params.numeric_byte_limit);
    }

    #[test]
    fn test_marker_collision_rejected() {
        let params = ProtocolParams {
            ack_byte: 0, // collides with end_of_key
            ..ProtocolParams::default()
        };
        let err = params.validate().unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidParams(_)));
        assert!(err.to_string().contains("0x00"));
    }

    #[test]
    fn test_degenerate_base_rejected() {
        let params = ProtocolParams {
            numeric_byte_limit: 1,
            ..ProtocolParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_from_defines_reads_all_names() {
        let header = r#"
            #define SERIAL_BAUD 28800
            #define READY_STRING "Ready."
            #define NUMERIC_BYTE_LIMIT 255
            #define END_OF_KEY 0
            #define MAX_VALUE_SIZE 255
            #define ACK_CHAR_VALUE 6
            #define NACK_CHAR_VALUE 21
        "#;
        let params = ProtocolParams::from_defines(&SharedDefines::parse(header)).unwrap();
        assert_eq!(params, ProtocolParams::default());
    }

    #[test]
    fn test_from_defines_missing_name() {
        let header = "#define SERIAL_BAUD 28800\n";
        let err = ProtocolParams::from_defines(&SharedDefines::parse(header)).unwrap_err();
        assert!(err.to_string().contains("READY_STRING"));
    }

    #[test]
    fn test_from_defines_baud_out_of_range() {
        // Parses as an integer but does not fit u32
        let header = r#"
            #define SERIAL_BAUD 5000000000
            #define READY_STRING "Ready."
            #define NUMERIC_BYTE_LIMIT 255
            #define END_OF_KEY 0
            #define MAX_VALUE_SIZE 255
            #define ACK_CHAR_VALUE 6
            #define NACK_CHAR_VALUE 21
        "#;
        let err = ProtocolParams::from_defines(&SharedDefines::parse(header)).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidParams(_)));
        assert!(err.to_string().contains("32-bit"));
    }

    #[test]
    fn test_from_defines_byte_out_of_range() {
        let header = r#"
            #define SERIAL_BAUD 28800
            #define READY_STRING "Ready."
            #define NUMERIC_BYTE_LIMIT 300
            #define END_OF_KEY 0
            #define MAX_VALUE_SIZE 255
            #define ACK_CHAR_VALUE 6
            #define NACK_CHAR_VALUE 21
        "#;
        let err = ProtocolParams::from_defines(&SharedDefines::parse(header)).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidParams(_)));
    }

    #[test]
    fn test_serde_round_trip() {
        let params = ProtocolParams::default();
        let json = serde_json::to_string(&params).unwrap();
        let back: ProtocolParams = serde_json::from_str(&json).unwrap();
        assert_eq!(params, back);
    }
}
