//! Typed BGAPI events.
//!
//! [`decode_event`] turns an event frame's (category, subtype, payload) into
//! an [`Event`]; [`Observer`] is the callback surface a driver delivers them
//! to. Decoding is permissive: short payloads never fail, they zero-fill.

pub mod cursor;
pub mod decoder;
pub mod event;
pub mod observer;
pub mod types;

pub use cursor::PayloadCursor;
pub use decoder::{decode_event, dispatch_event};
pub use event::Event;
pub use observer::{route, ChannelObserver, LoggingObserver, NoopObserver, Observer};
pub use types::{
    to_hex, BdAddr, BondStatus, ConnectionStatus, IoPortStatus, QualifiedAddr, ScanResponse,
    SystemInfo, VersionIndication,
};
