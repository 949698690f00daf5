//! Host-side driver for BGAPI radio modules (BLED112 class).
//!
//! [`Driver`] owns a transport and two worker threads. Commands are sent
//! one at a time and block their caller until the matching response
//! arrives; events are decoded and handed to an
//! [`Observer`](bgapi_event::Observer) on the reader thread.
//!
//! The typed command set lives in [`commands`] as `impl Driver` blocks
//! named `<class>_<command>`, e.g. [`Driver::system_info_get`].

pub mod commands;
pub mod config;
pub(crate) mod dispatcher;
pub mod driver;
pub mod error;
pub(crate) mod reader_loop;
pub mod stats;

pub use commands::{
    ConnectionParameters, MemoryRead, RegisterValue, SpiConfig, SystemCounters, DISCOVER_GENERIC,
    DISCOVER_LIMITED, DISCOVER_OBSERVATION,
};
pub use config::{DriverConfig, DEFAULT_READ_CHUNK_SIZE, DEFAULT_READ_RETRY_DELAY, DEFAULT_TIMEOUT};
pub use driver::Driver;
pub use error::{DriverError, Result};
pub use stats::{DriverStats, StatsSnapshot};
