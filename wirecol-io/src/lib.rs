//! Byte-stream plumbing for the columnar wire format.
//!
//! Columns never own the buffers they are saved to or loaded from, they only
//! produce bytes into an [OutputStream] and consume bytes from an [InputStream].
//! Where those bytes end up (a socket, a file, an in-memory block) is decided
//! by the caller.
//!
//! The two capabilities are deliberately asymmetric:
//!
//! - Writing to a sink can fail, but only when the sink runs out of capacity
//!   (or the underlying writer errors), this is surfaced as a [SinkError].
//! - Reading from a source never fails, it simply returns fewer bytes than
//!   requested once the source is exhausted. Short reads are routine when
//!   decoding network buffers and callers decide whether to retry or abort.

#[cfg(not(target_endian = "little"))]
compile_error!("wirecol-io only supports little-endian targets");

use std::io;

mod array;
mod buffer;
mod stream;
mod wire;

pub use self::array::{ArrayInput, ArrayOutput};
pub use self::buffer::{BufferInput, BufferOutput};
pub use self::stream::{StreamInput, StreamOutput};
pub use self::wire::{WireRead, WireWrite, MAX_VARINT_LEN, READ_CHUNK_SIZE};

#[derive(Debug, thiserror::Error)]
/// An error that can occur when writing to an [OutputStream].
pub enum SinkError {
    #[error("Sink capacity exhausted: requested {requested} bytes, {remaining} remaining")]
    /// The sink is bounded and cannot accept the bytes being written.
    ///
    /// No bytes of the rejected write are written.
    CapacityExhausted { requested: usize, remaining: usize },
    #[error("IO Error: {0}")]
    /// The writer backing the sink returned an error.
    IoError(#[from] io::Error),
}

/// A writable byte sink.
pub trait OutputStream {
    /// Writes the entire buffer to the sink.
    ///
    /// Returns a [SinkError] if the sink cannot hold the buffer.
    fn write_bytes(&mut self, buf: &[u8]) -> Result<(), SinkError>;
}

/// A readable byte source.
pub trait InputStream {
    /// Reads up to `buf.len()` bytes into the buffer.
    ///
    /// Returns the number of bytes actually read, which is only ever
    /// less than the buffer length once the source is exhausted.
    fn read_bytes(&mut self, buf: &mut [u8]) -> usize;
}

impl<S: OutputStream + ?Sized> OutputStream for &mut S {
    #[inline]
    fn write_bytes(&mut self, buf: &[u8]) -> Result<(), SinkError> {
        (**self).write_bytes(buf)
    }
}

impl<S: InputStream + ?Sized> InputStream for &mut S {
    #[inline]
    fn read_bytes(&mut self, buf: &mut [u8]) -> usize {
        (**self).read_bytes(buf)
    }
}
