use std::io::{ErrorKind, Read, Write};

use tracing::warn;

use crate::{InputStream, OutputStream, SinkError};

/// A sink forwarding all writes to a [Write] implementation, e.g. a file or socket.
pub struct StreamOutput<W> {
    inner: W,
}

impl<W: Write> StreamOutput<W> {
    /// Wraps the given writer.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Flushes the underlying writer.
    pub fn flush(&mut self) -> Result<(), SinkError> {
        self.inner.flush()?;
        Ok(())
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> OutputStream for StreamOutput<W> {
    #[inline]
    fn write_bytes(&mut self, buf: &[u8]) -> Result<(), SinkError> {
        self.inner.write_all(buf)?;
        Ok(())
    }
}

/// A source pulling bytes from a [Read] implementation.
///
/// Reader errors are logged and treated as the end of the stream.
pub struct StreamInput<R> {
    inner: R,
}

impl<R: Read> StreamInput<R> {
    /// Wraps the given reader.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Returns the wrapped reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> InputStream for StreamInput<R> {
    fn read_bytes(&mut self, buf: &mut [u8]) -> usize {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(error = ?e, "Stream read failed, treating as end of input");
                    break;
                },
            }
        }
        filled
    }
}
