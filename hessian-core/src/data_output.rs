//! Raw byte sink underneath the Hessian grammar.

use bytes::{BufMut, Bytes, BytesMut};

/// Sink for the fixed-width pieces of the Hessian grammar.
///
/// Multi-byte values are big-endian. Appending to memory cannot fail, so
/// grammar-level failures are reported by the encoder instead.
pub trait WireSink {
    /// Appends a tag or single payload byte.
    fn write_u8(&mut self, v: u8);

    /// Appends a 16-bit length, as used by string and binary chunks.
    fn write_u16(&mut self, v: u16);

    /// Appends a 32-bit integer payload.
    fn write_i32(&mut self, v: i32);

    /// Appends a 64-bit integer payload.
    fn write_i64(&mut self, v: i64);

    /// Appends the IEEE 754 bits of a double.
    fn write_f64(&mut self, v: f64);

    /// Appends raw bytes with no length prefix.
    fn write_bytes(&mut self, v: &[u8]);

    /// Appends a chunk tag followed by its 16-bit length.
    fn write_chunk_header(&mut self, tag: u8, len: u16) {
        self.write_u8(tag);
        self.write_u16(len);
    }
}

/// Growable in-memory [`WireSink`] owned by an encoder.
#[derive(Debug, Default)]
pub struct WireWriter {
    buf: BytesMut,
}

impl WireWriter {
    const INITIAL_CAPACITY: usize = 256;

    /// Creates an empty writer with a small initial allocation.
    pub fn new() -> Self {
        Self::with_capacity(Self::INITIAL_CAPACITY)
    }

    /// Creates an empty writer that can hold `capacity` bytes before growing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Bytes written since creation or the last [`clear`](Self::clear).
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Copies the written bytes out into a vector.
    pub fn into_bytes(self) -> Vec<u8> {
        Vec::from(&self.buf[..])
    }

    /// Hands the buffer over as shared [`Bytes`] without copying.
    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }

    /// Number of bytes written.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Drops the written bytes but keeps the allocation for the next stream.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

impl WireSink for WireWriter {
    fn write_u8(&mut self, v: u8) {
        self.buf.put_u8(v);
    }

    fn write_u16(&mut self, v: u16) {
        self.buf.put_u16(v);
    }

    fn write_i32(&mut self, v: i32) {
        self.buf.put_i32(v);
    }

    fn write_i64(&mut self, v: i64) {
        self.buf.put_i64(v);
    }

    fn write_f64(&mut self, v: f64) {
        self.buf.put_f64(v);
    }

    fn write_bytes(&mut self, v: &[u8]) {
        self.buf.extend_from_slice(v);
    }
}
