use std::mem;

use bytemuck::Pod;
use tracing::warn;

use crate::{InputStream, OutputStream, SinkError};

/// The maximum number of bytes an unsigned LEB128 encoded `u64` can occupy.
pub const MAX_VARINT_LEN: usize = 10;

/// The largest number of bytes [WireRead::read_extend] allocates ahead of
/// the data actually read.
pub const READ_CHUNK_SIZE: usize = 64 << 10;

/// Primitive wire encodings on top of any [OutputStream].
///
/// Fixed width values are written in little-endian byte order.
pub trait WireWrite: OutputStream {
    #[inline]
    /// Writes a single fixed width value.
    fn write_fixed<T: Pod>(&mut self, value: T) -> Result<(), SinkError> {
        self.write_bytes(bytemuck::bytes_of(&value))
    }

    #[inline]
    /// Writes a slice of fixed width values back to back with no framing.
    fn write_slice<T: Pod>(&mut self, values: &[T]) -> Result<(), SinkError> {
        self.write_bytes(bytemuck::cast_slice(values))
    }

    /// Writes an unsigned LEB128 integer.
    fn write_varint(&mut self, mut value: u64) -> Result<(), SinkError> {
        let mut buf = [0u8; MAX_VARINT_LEN];
        let mut len = 0;
        loop {
            let mut byte = (value & 0x7F) as u8;
            value >>= 7;
            if value != 0 {
                byte |= 0x80;
            }
            buf[len] = byte;
            len += 1;

            if value == 0 {
                break;
            }
        }
        self.write_bytes(&buf[..len])
    }

    /// Writes a varint length prefix followed by the raw bytes.
    fn write_string(&mut self, value: &[u8]) -> Result<(), SinkError> {
        self.write_varint(value.len() as u64)?;
        self.write_bytes(value)
    }
}

impl<S: OutputStream + ?Sized> WireWrite for S {}

/// Primitive wire decodings on top of any [InputStream].
///
/// All reads return `None` (or `false`) when the source is exhausted
/// before the value is complete.
pub trait WireRead: InputStream {
    #[inline]
    /// Fills the buffer completely or returns `false`.
    fn read_exact_bytes(&mut self, buf: &mut [u8]) -> bool {
        self.read_bytes(buf) == buf.len()
    }

    #[inline]
    /// Reads a single fixed width value.
    fn read_fixed<T: Pod>(&mut self) -> Option<T> {
        let mut value = T::zeroed();
        self.read_exact_bytes(bytemuck::bytes_of_mut(&mut value))
            .then_some(value)
    }

    #[inline]
    /// Fills the slice with fixed width values.
    fn read_slice_into<T: Pod>(&mut self, values: &mut [T]) -> bool {
        self.read_exact_bytes(bytemuck::cast_slice_mut(values))
    }

    /// Appends `count` fixed width values to the vector.
    ///
    /// The vector grows in chunks of at most [READ_CHUNK_SIZE] bytes, so a
    /// large `count` only allocates as far as the source actually has data.
    /// On a short read the vector is restored to its original length.
    fn read_extend<T: Pod>(&mut self, values: &mut Vec<T>, count: usize) -> bool {
        let start = values.len();
        let chunk = (READ_CHUNK_SIZE / mem::size_of::<T>().max(1)).max(1);

        let mut remaining = count;
        while remaining > 0 {
            let len = remaining.min(chunk);
            let offset = values.len();
            values.resize(offset + len, T::zeroed());
            if !self.read_slice_into(&mut values[offset..]) {
                values.truncate(start);
                return false;
            }
            remaining -= len;
        }
        true
    }

    /// Reads an unsigned LEB128 integer.
    ///
    /// Encodings longer than [MAX_VARINT_LEN] bytes are rejected.
    fn read_varint(&mut self) -> Option<u64> {
        let mut result = 0u64;
        for i in 0..MAX_VARINT_LEN {
            let byte: u8 = self.read_fixed()?;
            result |= u64::from(byte & 0x7F) << (7 * i);
            if byte & 0x80 == 0 {
                return Some(result);
            }
        }

        warn!("Varint exceeds the maximum encoded length");
        None
    }

    /// Reads a varint length prefixed byte string.
    ///
    /// Lengths above `max_len` are treated as corrupt input.
    fn read_string(&mut self, max_len: usize) -> Option<Vec<u8>> {
        let len = self.read_varint()?;
        if len > max_len as u64 {
            warn!(len, max_len, "String length prefix exceeds the configured limit");
            return None;
        }

        let mut value = Vec::new();
        self.read_extend(&mut value, len as usize).then_some(value)
    }
}

impl<S: InputStream + ?Sized> WireRead for S {}
