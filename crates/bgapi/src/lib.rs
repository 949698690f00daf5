//! Host-side driver for BGAPI Bluetooth LE radio modules (BLED112 class).
//!
//! # Crate Structure
//!
//! - [`transport`]: serial and Unix stream transports
//! - [`frame`]: 4-byte header framing and command encoding
//! - [`event`]: typed events, the decoder and the [`event::Observer`] interface
//! - [`driver`]: the request/response driver and command set (behind `driver` feature)

/// Re-export transport types.
pub mod transport {
    pub use bgapi_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use bgapi_frame::*;
}

/// Re-export event types.
pub mod event {
    pub use bgapi_event::*;
}

/// Re-export driver types (requires `driver` feature).
#[cfg(feature = "driver")]
pub mod driver {
    pub use bgapi_driver::*;
}
