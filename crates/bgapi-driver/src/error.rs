use std::time::Duration;

use bgapi_frame::FrameError;

/// Errors surfaced by the driver.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// No correlated response arrived before the deadline.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// A response arrived for a different command than the one pending.
    #[error(
        "received incorrect response type: expected {expected_category}/{expected_command}, \
         got {actual_category}/{actual_command}"
    )]
    ProtocolMismatch {
        expected_category: u8,
        expected_command: u8,
        actual_category: u8,
        actual_command: u8,
    },

    /// A response frame arrived while no operation was pending.
    #[error("unsolicited response {category}/{command}")]
    UnsolicitedResponse { category: u8, command: u8 },

    /// Writing the command to the transport failed.
    #[error("transport write failed: {0}")]
    TransportWrite(#[source] std::io::Error),

    /// Reading from the transport failed.
    #[error("transport read failed: {0}")]
    TransportRead(#[source] std::io::Error),

    /// Opening or configuring the transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] bgapi_transport::TransportError),

    /// Command framing error (e.g. payload too large).
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// A variable-length argument does not fit its one-byte length prefix.
    #[error("{field} is {len} bytes, a length prefix holds at most 255")]
    ArgumentTooLong { field: &'static str, len: usize },

    /// A driver worker thread could not be started.
    #[error("failed to start driver thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The driver has been shut down.
    #[error("driver is shut down")]
    Closed,
}

impl DriverError {
    /// Map a command write failure.
    pub(crate) fn from_write(err: FrameError) -> Self {
        match err {
            FrameError::Io(source) => Self::TransportWrite(source),
            FrameError::ConnectionClosed => Self::TransportWrite(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                "transport accepted no bytes",
            )),
            other => Self::Frame(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, DriverError>;
