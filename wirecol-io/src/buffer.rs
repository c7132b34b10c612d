use std::cmp;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{InputStream, OutputStream, SinkError};

#[derive(Debug, Default)]
/// A growable in-memory sink.
///
/// The sink is unbounded unless created with [BufferOutput::with_limit].
pub struct BufferOutput {
    buffer: BytesMut,
    limit: Option<usize>,
}

impl BufferOutput {
    /// Creates a new, unbounded, empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new sink which rejects writes past `limit` bytes.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            buffer: BytesMut::new(),
            limit: Some(limit),
        }
    }

    #[inline]
    /// The number of bytes written.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    /// Returns if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    #[inline]
    /// Returns a view of the written bytes.
    pub fn as_slice(&self) -> &[u8] {
        self.buffer.as_ref()
    }

    /// Consumes the sink returning the written bytes.
    pub fn freeze(self) -> Bytes {
        self.buffer.freeze()
    }
}

impl OutputStream for BufferOutput {
    fn write_bytes(&mut self, buf: &[u8]) -> Result<(), SinkError> {
        if let Some(limit) = self.limit {
            let remaining = limit.saturating_sub(self.buffer.len());
            if buf.len() > remaining {
                return Err(SinkError::CapacityExhausted {
                    requested: buf.len(),
                    remaining,
                });
            }
        }

        self.buffer.put_slice(buf);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
/// A source reading from a shared [Bytes] buffer.
pub struct BufferInput {
    data: Bytes,
}

impl BufferInput {
    /// Creates a new source over the given bytes.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    #[inline]
    /// The number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.remaining()
    }
}

impl From<Bytes> for BufferInput {
    fn from(data: Bytes) -> Self {
        Self { data }
    }
}

impl InputStream for BufferInput {
    fn read_bytes(&mut self, buf: &mut [u8]) -> usize {
        let n = cmp::min(buf.len(), self.data.remaining());
        self.data.copy_to_slice(&mut buf[..n]);
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{WireRead, WireWrite};

    #[test]
    fn test_buffer_round_trip() {
        let mut output = BufferOutput::new();
        output.write_fixed(42u64).unwrap();
        output.write_string(b"foobar").unwrap();
        assert_eq!(output.len(), 8 + 1 + 6);

        let mut input = BufferInput::new(output.freeze());
        assert_eq!(input.read_fixed::<u64>(), Some(42));
        assert_eq!(input.read_string(64).as_deref(), Some(&b"foobar"[..]));
        assert_eq!(input.remaining(), 0);
    }

    #[test]
    fn test_buffer_limit() {
        let mut output = BufferOutput::with_limit(4);
        output.write_fixed(1u32).expect("Write should fit within limit");
        let err = output.write_fixed(1u8).expect_err("Write should exceed limit");
        assert!(matches!(err, SinkError::CapacityExhausted { requested: 1, remaining: 0 }));
        assert_eq!(output.len(), 4);
    }
}
