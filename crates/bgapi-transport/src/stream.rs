use std::io::{Read, Write};
use std::time::Duration;

use crate::error::Result;

/// A connected duplex byte stream implementing Read + Write.
///
/// This is the I/O type handed to the driver. Reads and writes may be split
/// across threads through [`BgStream::try_clone`].
pub struct BgStream {
    inner: BgStreamInner,
}

enum BgStreamInner {
    #[cfg(feature = "serial")]
    Serial(Box<dyn serialport::SerialPort>),
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl Read for BgStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(feature = "serial")]
            BgStreamInner::Serial(port) => port.read(buf),
            #[cfg(unix)]
            BgStreamInner::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for BgStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(feature = "serial")]
            BgStreamInner::Serial(port) => port.write(buf),
            #[cfg(unix)]
            BgStreamInner::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            #[cfg(feature = "serial")]
            BgStreamInner::Serial(port) => port.flush(),
            #[cfg(unix)]
            BgStreamInner::Unix(stream) => stream.flush(),
        }
    }
}

impl BgStream {
    /// Wrap an opened serial port.
    #[cfg(feature = "serial")]
    pub(crate) fn from_serial(port: Box<dyn serialport::SerialPort>) -> Self {
        Self {
            inner: BgStreamInner::Serial(port),
        }
    }

    /// Wrap a connected Unix stream.
    #[cfg(unix)]
    pub fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: BgStreamInner::Unix(stream),
        }
    }

    /// Connect to a Unix stream socket (e.g. a `socat` bridge to a serial device).
    #[cfg(unix)]
    pub fn connect_unix(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let stream = std::os::unix::net::UnixStream::connect(path).map_err(|source| {
            crate::error::TransportError::Open {
                path: path.to_path_buf(),
                source,
            }
        })?;
        tracing::debug!(?path, "connected to unix stream");
        Ok(Self::from_unix(stream))
    }

    /// Set the read timeout. A zero duration blocks indefinitely where the
    /// platform allows it.
    pub fn set_read_timeout(&mut self, timeout: Duration) -> Result<()> {
        match &mut self.inner {
            #[cfg(feature = "serial")]
            BgStreamInner::Serial(port) => port
                .set_timeout(timeout)
                .map_err(|err| std::io::Error::from(err).into()),
            #[cfg(unix)]
            BgStreamInner::Unix(stream) => {
                let timeout = (!timeout.is_zero()).then_some(timeout);
                stream.set_read_timeout(timeout).map_err(Into::into)
            }
        }
    }

    /// Try to clone this stream (creates a new handle to the same device).
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            #[cfg(feature = "serial")]
            BgStreamInner::Serial(port) => {
                let cloned = port.try_clone().map_err(std::io::Error::from)?;
                Ok(Self::from_serial(cloned))
            }
            #[cfg(unix)]
            BgStreamInner::Unix(stream) => Ok(Self::from_unix(stream.try_clone()?)),
        }
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        match &self.inner {
            #[cfg(feature = "serial")]
            BgStreamInner::Serial(_) => "serial",
            #[cfg(unix)]
            BgStreamInner::Unix(_) => "unix-stream",
        }
    }
}

impl std::fmt::Debug for BgStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BgStream")
            .field("type", &self.transport_name())
            .finish()
    }
}
