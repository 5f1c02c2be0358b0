//! Append-only in-memory byte buffer with endian-aware primitives and back-patching.
//!
//! [`ByteWriter`] has no I/O of its own; it is handed to [`crate::file_writer`] once assembly
//! is complete. Every other component in this crate writes through one `ByteWriter`, which is
//! what lets addresses be back-patched after the fact: a component records `writer.position()`
//! before emitting a placeholder, and later calls [`ByteWriter::write_at`] once the real value
//! is known.

use crate::error::{HdfWriteError, Result};

/// Byte order used when encoding multi-byte primitives.
///
/// HDF5 files produced by this crate are always little-endian, but the writer itself is
/// endian-parametric so the encoding logic in this module has a single place that knows how to
/// flip bytes.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum Endian {
    /// Least-significant byte first.
    #[default]
    Little,
    /// Most-significant byte first.
    Big,
}

/// A growable, append-only byte buffer that also supports patching previously-written bytes.
pub struct ByteWriter {
    buf: Vec<u8>,
    endian: Endian,
}

impl ByteWriter {
    /// Creates an empty writer using the given byte order.
    pub fn new(endian: Endian) -> Self {
        Self { buf: Vec::new(), endian }
    }

    /// The byte order this writer encodes multi-byte values with.
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Current write position, i.e. the number of bytes written so far.
    pub fn position(&self) -> u64 {
        self.buf.len() as u64
    }

    /// Alias for [`Self::position`]; the buffer only ever grows by appending.
    pub fn size(&self) -> u64 {
        self.position()
    }

    /// Discards all buffered bytes.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Returns the full contents written so far.
    pub fn snapshot(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the writer, returning the buffered bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Appends a single byte.
    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    /// Appends a signed byte.
    pub fn write_i8(&mut self, v: i8) {
        self.buf.push(v as u8);
    }

    /// Appends a 16-bit unsigned integer.
    pub fn write_u16(&mut self, v: u16) {
        self.write_bytes(&encode_u16(v, self.endian));
    }

    /// Appends a 16-bit signed integer.
    pub fn write_i16(&mut self, v: i16) {
        self.write_u16(v as u16);
    }

    /// Appends a 32-bit unsigned integer.
    pub fn write_u32(&mut self, v: u32) {
        self.write_bytes(&encode_u32(v, self.endian));
    }

    /// Appends a 32-bit signed integer.
    pub fn write_i32(&mut self, v: i32) {
        self.write_u32(v as u32);
    }

    /// Appends a 64-bit unsigned integer.
    pub fn write_u64(&mut self, v: u64) {
        self.write_bytes(&encode_u64(v, self.endian));
    }

    /// Appends a 64-bit signed integer.
    pub fn write_i64(&mut self, v: i64) {
        self.write_u64(v as u64);
    }

    /// Appends an IEEE-754 single-precision float.
    pub fn write_f32(&mut self, v: f32) {
        self.write_u32(v.to_bits());
    }

    /// Appends an IEEE-754 double-precision float.
    pub fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    /// Appends raw bytes verbatim.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Appends `count` zero bytes.
    pub fn write_zeros(&mut self, count: usize) {
        self.buf.resize(self.buf.len() + count, 0);
    }

    /// Appends a UTF-8 string, optionally followed by a NUL terminator.
    pub fn write_string(&mut self, s: &str, null_terminate: bool) {
        self.write_bytes(s.as_bytes());
        if null_terminate {
            self.write_u8(0);
        }
    }

    /// Pads the buffer with zero bytes until `position() % n == 0`.
    ///
    /// `n` must be greater than zero.
    pub fn align_to(&mut self, n: u64) -> Result<()> {
        if n == 0 {
            return Err(HdfWriteError::invalid_argument("align_to requires n > 0"));
        }
        let rem = self.position() % n;
        if rem != 0 {
            self.write_zeros((n - rem) as usize);
        }
        Ok(())
    }

    /// Overwrites `bytes.len()` bytes starting at `offset`, without changing [`Self::position`].
    ///
    /// `offset` must be within the already-written extent; this can never grow the buffer.
    pub fn write_at(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
        let start = usize::try_from(offset)
            .map_err(|_| HdfWriteError::invalid_argument("write_at offset overflows usize"))?;
        let end = start
            .checked_add(bytes.len())
            .ok_or_else(|| HdfWriteError::invalid_argument("write_at range overflows usize"))?;
        if end > self.buf.len() {
            return Err(HdfWriteError::invalid_argument(format!(
                "write_at range {start}..{end} exceeds buffer size {}",
                self.buf.len()
            )));
        }
        self.buf[start..end].copy_from_slice(bytes);
        Ok(())
    }

    /// Overwrites an 8-byte little/big-endian `u64` at `offset`, honoring this writer's endianness.
    pub fn patch_u64(&mut self, offset: u64, v: u64) -> Result<()> {
        self.write_at(offset, &encode_u64(v, self.endian))
    }

    /// Overwrites a 4-byte `u32` at `offset`, honoring this writer's endianness.
    pub fn patch_u32(&mut self, offset: u64, v: u32) -> Result<()> {
        self.write_at(offset, &encode_u32(v, self.endian))
    }

    /// Overwrites a 2-byte `u16` at `offset`, honoring this writer's endianness.
    pub fn patch_u16(&mut self, offset: u64, v: u16) -> Result<()> {
        self.write_at(offset, &encode_u16(v, self.endian))
    }
}

fn encode_u16(v: u16, endian: Endian) -> [u8; 2] {
    match endian {
        Endian::Little => v.to_le_bytes(),
        Endian::Big => v.to_be_bytes(),
    }
}

fn encode_u32(v: u32, endian: Endian) -> [u8; 4] {
    match endian {
        Endian::Little => v.to_le_bytes(),
        Endian::Big => v.to_be_bytes(),
    }
}

fn encode_u64(v: u64, endian: Endian) -> [u8; 8] {
    match endian {
        Endian::Little => v.to_le_bytes(),
        Endian::Big => v.to_be_bytes(),
    }
}
