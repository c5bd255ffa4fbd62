//! Firmware-shared header parsing
//!
//! The firmware and this driver agree on their protocol constants through a
//! single C header of `#define` lines compiled into the sketch. This module
//! pulls those definitions out of the header text so host-side parameters
//! can be built from the same file the firmware was flashed with.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use thiserror::Error;

/// Errors from reading or interpreting the shared header
#[derive(Error, Debug)]
pub enum HeaderError {
    #[error("I/O error reading shared header: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing #define {0}")]
    Missing(String),

    #[error("{name}: expected {expected}, got `{literal}`")]
    BadLiteral {
        name: String,
        expected: &'static str,
        literal: String,
    },
}

/// `#define` name → literal pairs extracted from a header
#[derive(Debug, Clone, Default)]
pub struct SharedDefines {
    values: HashMap<String, String>,
}

impl SharedDefines {
    /// Extract every simple `#define NAME LITERAL` from `text`.
    ///
    /// `//` comments are stripped (quote-aware) and a trailing `/* .. */` on
    /// the literal is dropped. Lines that are not simple value defines
    /// (includes, function-like macros, bare flag defines) are skipped.
    pub fn parse(text: &str) -> Self {
        let mut values = HashMap::new();
        for line in text.lines() {
            let line = strip_comment(line).trim();
            let Some(rest) = line.strip_prefix("#define") else {
                continue;
            };
            if !rest.starts_with(char::is_whitespace) {
                continue;
            }
            let mut parts = rest.trim_start().splitn(2, char::is_whitespace);
            let (Some(name), Some(literal)) = (parts.next(), parts.next()) else {
                continue;
            };
            if name.contains('(') {
                continue;
            }
            let literal = match literal.find("/*") {
                Some(i) => literal[..i].trim(),
                None => literal.trim(),
            };
            if literal.is_empty() {
                continue;
            }
            values.insert(name.to_string(), literal.to_string());
        }
        Self { values }
    }

    /// Parse the header file at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HeaderError> {
        Ok(Self::parse(&fs::read_to_string(path)?))
    }

    /// Raw literal for `name`, if defined
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Number of definitions found
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no definitions were found
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Integer literal for `name`: decimal, `0x` hex, or a quoted character
    pub fn get_int(&self, name: &str) -> Result<i64, HeaderError> {
        let literal = self.require(name)?;
        parse_int(literal).ok_or_else(|| HeaderError::BadLiteral {
            name: name.to_string(),
            expected: "integer",
            literal: literal.to_string(),
        })
    }

    /// String literal for `name`, with quotes removed and escapes resolved
    pub fn get_str(&self, name: &str) -> Result<String, HeaderError> {
        let literal = self.require(name)?;
        let inner = literal
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .ok_or_else(|| HeaderError::BadLiteral {
                name: name.to_string(),
                expected: "string literal",
                literal: literal.to_string(),
            })?;
        Ok(unescape(inner))
    }

    fn require(&self, name: &str) -> Result<&str, HeaderError> {
        self.get(name)
            .ok_or_else(|| HeaderError::Missing(name.to_string()))
    }
}

/// Drop a trailing `//` comment, leaving `//` inside string literals alone
fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut in_string = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => in_string = !in_string,
            b'\\' if in_string => i += 1,
            b'/' if !in_string && bytes.get(i + 1) == Some(&b'/') => {
                return &line[..i];
            }
            _ => {}
        }
        i += 1;
    }
    line
}

fn parse_int(literal: &str) -> Option<i64> {
    if let Some(hex) = literal
        .strip_prefix("0x")
        .or_else(|| literal.strip_prefix("0X"))
    {
        return i64::from_str_radix(hex, 16).ok();
    }
    let bytes = literal.as_bytes();
    if bytes.len() == 3 && bytes[0] == b'\'' && bytes[2] == b'\'' {
        return Some(bytes[1] as i64);
    }
    literal.parse().ok()
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const SAMPLE: &str = r#"
#pragma once

/**
 * Values shared with the host-side sender.
 */

#define SERIAL_BAUD 28800
#define READY_STRING "Ready."
#define NUMERIC_BYTE_LIMIT 255
#define END_OF_KEY 0
#define MAX_VALUE_SIZE 255 // bytes per value
#define ACK_CHAR_VALUE 0x06
#define NACK_CHAR_VALUE 21 /* ASCII NAK */
#define DEBUG_OUTPUT
#define MIN(a,b) ((a) < (b) ? (a) : (b))
#define BANNER "boot // check"
"#;

    #[test]
    fn test_parse_simple_defines() {
        let defines = SharedDefines::parse(SAMPLE);
        assert_eq!(defines.get("SERIAL_BAUD"), Some("28800"));
        assert_eq!(defines.get("READY_STRING"), Some("\"Ready.\""));
        assert_eq!(defines.get("MAX_VALUE_SIZE"), Some("255"));
    }

    #[test]
    fn test_flag_and_function_defines_skipped() {
        let defines = SharedDefines::parse(SAMPLE);
        assert_eq!(defines.get("DEBUG_OUTPUT"), None);
        assert_eq!(defines.get("MIN"), None);
        assert_eq!(defines.get("MIN(a,b)"), None);
    }

    #[test]
    fn test_comment_stripping() {
        let defines = SharedDefines::parse(SAMPLE);
        assert_eq!(defines.get_int("MAX_VALUE_SIZE").unwrap(), 255);
        assert_eq!(defines.get_int("NACK_CHAR_VALUE").unwrap(), 21);
        // `//` inside a string literal is content, not a comment
        assert_eq!(defines.get_str("BANNER").unwrap(), "boot // check");
    }

    #[test]
    fn test_int_literal_forms() {
        let defines = SharedDefines::parse("#define A 10\n#define B 0x1f\n#define C 'x'\n");
        assert_eq!(defines.get_int("A").unwrap(), 10);
        assert_eq!(defines.get_int("B").unwrap(), 0x1f);
        assert_eq!(defines.get_int("C").unwrap(), i64::from(b'x'));
    }

    #[test]
    fn test_bad_literal() {
        let defines = SharedDefines::parse("#define X \"text\"\n");
        let err = defines.get_int("X").unwrap_err();
        assert!(matches!(err, HeaderError::BadLiteral { .. }));
        let err = SharedDefines::parse("#define Y 12\n").get_str("Y").unwrap_err();
        assert!(err.to_string().contains("string literal"));
    }

    #[test]
    fn test_missing_name() {
        let defines = SharedDefines::parse("");
        assert!(defines.is_empty());
        assert!(matches!(
            defines.get_int("SERIAL_BAUD"),
            Err(HeaderError::Missing(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let defines = SharedDefines::load(file.path()).unwrap();
        assert_eq!(defines.get_int("SERIAL_BAUD").unwrap(), 28800);
        assert_eq!(defines.get_str("READY_STRING").unwrap(), "Ready.");
    }
}
