//! Byte-stream transports for BGAPI radio modules.
//!
//! The protocol engine never assumes message framing from the transport: it
//! only needs a byte source and a byte sink. This crate provides:
//! - Serial ports (BLED112 dongles and friends, `serial` feature)
//! - Unix streams (pty bridges such as `socat`, and test doubles)
//!
//! This is the lowest layer of bgapi-rs. Everything else builds on top of
//! the [`BgStream`] type provided here, or on any `Read`/`Write` pair.

pub mod error;
#[cfg(feature = "serial")]
pub mod serial;
pub mod stream;

pub use error::{Result, TransportError};
#[cfg(feature = "serial")]
pub use serial::{
    available_ports, open_serial, PortInfo, PortKind, SerialConfig, DEFAULT_BAUD_RATE,
};
pub use stream::BgStream;
