use std::cmp;

use crate::{InputStream, OutputStream, SinkError};

/// A bounded sink writing into a caller provided byte slice.
pub struct ArrayOutput<'a> {
    buffer: &'a mut [u8],
    position: usize,
}

impl<'a> ArrayOutput<'a> {
    /// Creates a new sink which starts writing at the beginning of the buffer.
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer, position: 0 }
    }

    #[inline]
    /// The number of bytes written so far.
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    /// The number of bytes that can still be written.
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }
}

impl OutputStream for ArrayOutput<'_> {
    fn write_bytes(&mut self, buf: &[u8]) -> Result<(), SinkError> {
        let remaining = self.remaining();
        if buf.len() > remaining {
            return Err(SinkError::CapacityExhausted {
                requested: buf.len(),
                remaining,
            });
        }

        let end = self.position + buf.len();
        self.buffer[self.position..end].copy_from_slice(buf);
        self.position = end;
        Ok(())
    }
}

/// A source reading from a borrowed byte slice.
pub struct ArrayInput<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ArrayInput<'a> {
    /// Creates a new source reading from the start of the slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    #[inline]
    /// The number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    /// The number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }
}

impl InputStream for ArrayInput<'_> {
    fn read_bytes(&mut self, buf: &mut [u8]) -> usize {
        let n = cmp::min(buf.len(), self.remaining());
        buf[..n].copy_from_slice(&self.data[self.position..self.position + n]);
        self.position += n;
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_output_capacity() {
        let mut buffer = [0u8; 4];
        let mut output = ArrayOutput::new(&mut buffer);
        output.write_bytes(b"abc").expect("Write should fit");
        assert_eq!(output.remaining(), 1);

        let err = output.write_bytes(b"de").expect_err("Write should exceed capacity");
        assert!(matches!(
            err,
            SinkError::CapacityExhausted {
                requested: 2,
                remaining: 1
            }
        ));
        assert_eq!(output.position(), 3, "Rejected writes should not be partially applied");

        output.write_bytes(b"d").expect("Write should fit");
        assert_eq!(&buffer, b"abcd");
    }

    #[test]
    fn test_array_input_short_read() {
        let mut input = ArrayInput::new(b"hello");
        let mut buf = [0u8; 3];
        assert_eq!(input.read_bytes(&mut buf), 3);
        assert_eq!(&buf, b"hel");

        assert_eq!(input.read_bytes(&mut buf), 2);
        assert_eq!(&buf[..2], b"lo");
        assert_eq!(input.read_bytes(&mut buf), 0);
        assert_eq!(input.position(), 5);
    }
}
