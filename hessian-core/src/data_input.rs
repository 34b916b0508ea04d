//! Raw byte cursor underneath the Hessian grammar.

use crate::error::{HessianError, Result};
use bytes::Buf;

/// Source for the fixed-width pieces of the Hessian grammar.
///
/// Multi-byte values are big-endian. Every read that would run past the end
/// of the input fails with [`HessianError::TruncatedInput`] and consumes
/// nothing.
pub trait WireSource {
    /// Reads a tag or single payload byte.
    fn read_u8(&mut self) -> Result<u8>;

    /// Returns the next tag without consuming it.
    fn peek_u8(&self) -> Result<u8>;

    /// Reads a 16-bit chunk length.
    fn read_u16(&mut self) -> Result<u16>;

    /// Reads a 32-bit integer payload.
    fn read_i32(&mut self) -> Result<i32>;

    /// Reads a 64-bit integer payload.
    fn read_i64(&mut self) -> Result<i64>;

    /// Reads the IEEE 754 bits of a double.
    fn read_f64(&mut self) -> Result<f64>;

    /// Borrows the next `len` bytes of the input.
    fn read_bytes(&mut self, len: usize) -> Result<&[u8]>;

    /// Bytes left unread.
    fn remaining(&self) -> usize;

    /// Offset of the next unread byte, used in error reports.
    fn position(&self) -> usize;
}

/// [`WireSource`] over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    /// Starts reading at the first byte of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Splits off the next `n` bytes, or reports how short the input is.
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let data: &'a [u8] = self.data;
        let rest = &data[self.pos..];
        if rest.len() < n {
            return Err(HessianError::TruncatedInput {
                needed: n,
                remaining: rest.len(),
            });
        }
        self.pos += n;
        Ok(&rest[..n])
    }
}

impl WireSource for WireReader<'_> {
    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn peek_u8(&self) -> Result<u8> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or(HessianError::TruncatedInput {
                needed: 1,
                remaining: 0,
            })
    }

    fn read_u16(&mut self) -> Result<u16> {
        self.take(2).map(|mut b| b.get_u16())
    }

    fn read_i32(&mut self) -> Result<i32> {
        self.take(4).map(|mut b| b.get_i32())
    }

    fn read_i64(&mut self) -> Result<i64> {
        self.take(8).map(|mut b| b.get_i64())
    }

    fn read_f64(&mut self) -> Result<f64> {
        self.take(8).map(|mut b| b.get_f64())
    }

    fn read_bytes(&mut self, len: usize) -> Result<&[u8]> {
        self.take(len)
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn position(&self) -> usize {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_then_payload() {
        let bytes = [b'I', 0x00, 0x00, 0x01, 0x00, b'Z'];
        let mut reader = WireReader::new(&bytes);
        assert_eq!(reader.peek_u8().unwrap(), b'I');
        assert_eq!(reader.read_u8().unwrap(), b'I');
        assert_eq!(reader.read_i32().unwrap(), 256);
        assert_eq!(reader.position(), 5);
        assert_eq!(reader.read_u8().unwrap(), b'Z');
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_chunk_length_and_body() {
        let bytes = [b'R', 0x00, 0x02, b'h', b'i'];
        let mut reader = WireReader::new(&bytes);
        reader.read_u8().unwrap();
        let len = reader.read_u16().unwrap() as usize;
        assert_eq!(reader.read_bytes(len).unwrap(), b"hi");
    }

    #[test]
    fn test_long_and_double_payloads() {
        let mut bytes = vec![0, 0, 0, 0xd0, 0x4b, 0x92, 0x84, 0xb8];
        bytes.extend_from_slice(&[0x3f, 0xf0, 0, 0, 0, 0, 0, 0]);
        let mut reader = WireReader::new(&bytes);
        assert_eq!(reader.read_i64().unwrap(), 894621091000);
        assert_eq!(reader.read_f64().unwrap(), 1.0);
    }

    #[test]
    fn test_short_read_consumes_nothing() {
        let bytes = [b'D', 0x3f, 0xf0];
        let mut reader = WireReader::new(&bytes);
        reader.read_u8().unwrap();
        assert!(matches!(
            reader.read_f64(),
            Err(HessianError::TruncatedInput {
                needed: 8,
                remaining: 2
            })
        ));
        assert_eq!(reader.position(), 1);
        assert!(reader.read_bytes(3).is_err());
        assert_eq!(reader.read_u16().unwrap(), 0x3ff0);
    }

    #[test]
    fn test_empty_input() {
        let reader = WireReader::new(&[]);
        assert!(reader.peek_u8().is_err());
        assert_eq!(reader.remaining(), 0);
    }
}
