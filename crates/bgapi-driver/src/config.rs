use std::time::Duration;

use bgapi_frame::{CommandFraming, MAX_PAYLOAD};

/// Default time to wait for a command's response.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);
/// Default size of a single transport read.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 128;
/// Default pause after a failed transport read.
pub const DEFAULT_READ_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Runtime configuration for a [`Driver`](crate::Driver).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Timeout used by the command methods and [`Driver::call`](crate::Driver::call).
    pub default_timeout: Duration,
    /// Upper bound on bytes requested per transport read.
    pub read_chunk_size: usize,
    /// Pause before reading again after a read error.
    pub read_retry_delay: Duration,
    /// Wire layout of outgoing commands.
    pub command_framing: CommandFraming,
    /// Largest command payload accepted by [`Driver::send`](crate::Driver::send).
    pub max_payload_size: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            read_retry_delay: DEFAULT_READ_RETRY_DELAY,
            command_framing: CommandFraming::Bare,
            max_payload_size: MAX_PAYLOAD,
        }
    }
}

impl DriverConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_framing(mut self, framing: CommandFraming) -> Self {
        self.command_framing = framing;
        self
    }
}
