//! # KvLink Core Library
//!
//! Host side of a small key/value protocol for talking to microcontrollers
//! over a serial link.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Length-prefixed key/value frame encoding (with a matching decoder)
//! - Boot-ready handshake detection with a quiet-period debounce
//! - Per-field acknowledgement tracking with bounded draining
//! - A serial transport plus an in-memory dummy for hardware-free runs
//! - Protocol parameter loading from the firmware's shared C header
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use kvlink_core::protocol::{Sender, SenderConfig};
//! use kvlink_core::ProtocolParams;
//!
//! // Parameters come from the same header the firmware was built with
//! let params = Arc::new(ProtocolParams::from_header("Shared.h")?);
//!
//! let sender = Sender::open("/dev/ttyACM0", params, SenderConfig::default())?;
//! sender.wait_for_ready()?;
//!
//! sender.send(&[("MESG", b"Hello!")])?;
//! println!("{}", sender.read_to_string()?);
//! ```

pub mod protocol;
pub mod shared;

pub use protocol::{ProtocolError, ProtocolParams};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::protocol::{
        Channel, DummyChannel, ProtocolError, ProtocolParams, Sender, SenderConfig, SerialChannel,
    };
    pub use crate::shared::SharedDefines;
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
