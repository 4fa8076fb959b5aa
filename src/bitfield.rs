//! Byte-backed growable bit array with sequential read/write cursors.
//!
//! [`BitField`] is the storage arena: a vector of bytes addressed one bit at
//! a time, MSB-first within each byte, growing on demand. [`BitWriter`] and
//! [`BitReader`] are thin cursor wrappers over it, one append-only and one
//! forward-consuming, each able to move a whole stream to or from a file in
//! a single operation.
//!
//! # Limitations
//!
//! - The reader cannot signal end of data: popping past the last written bit
//!   returns `false` indefinitely. Callers must carry their own framing
//!   (a length prefix or a reserved stop symbol).
//! - The whole stream lives in memory; file loading is eager. Capacity is
//!   capped at [`MAX_BITS`] (1 TiB of bits) and in practice by available
//!   memory.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Addressing capacity of a [`BitField`], in bits (1 TiB of data).
///
/// Indices are 64-bit, so the cap is a policy choice rather than a type
/// limit; it exists to turn runaway addressing into a clean error before an
/// allocation failure does.
pub const MAX_BITS: u64 = 1 << 43;

/// A dynamically growing array of bits, materialized as bytes.
///
/// Bit `i` lives in byte `i >> 3` under the mask `0x80 >> (i & 7)`, so the
/// first bit written occupies the most significant position of the first
/// byte and a partial final byte is zero-padded in its low-order bits.
#[derive(Debug, Default, Clone)]
pub struct BitField {
    data: Vec<u8>,
}

impl BitField {
    /// Create an empty bit field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the bit at `index`.
    ///
    /// Bits that were never written read as `false`; this is the defined
    /// value of unwritten storage, not an error.
    pub fn get_bit(&self, index: u64) -> bool {
        let byte = (index >> 3) as usize;
        match self.data.get(byte) {
            Some(&b) => b & (0x80 >> (index & 7)) != 0,
            None => false,
        }
    }

    /// Write the bit at `index`, zero-extending the arena to cover it.
    ///
    /// # Errors
    /// Returns [`Error::StoreOverflow`] if `index` is at or beyond
    /// [`MAX_BITS`]; the arena is untouched in that case.
    pub fn set_bit(&mut self, index: u64, value: bool) -> Result<()> {
        if index >= MAX_BITS {
            return Err(Error::StoreOverflow(index));
        }
        let byte = (index >> 3) as usize;
        if self.data.len() <= byte {
            self.data.resize(byte + 1, 0);
        }
        let mask = 0x80 >> (index & 7);
        if value {
            self.data[byte] |= mask;
        } else {
            self.data[byte] &= !mask;
        }
        Ok(())
    }

    /// Reset to empty.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// The backing bytes accumulated so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl From<Vec<u8>> for BitField {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

/// Forward-only bit consumer over a [`BitField`].
#[derive(Debug)]
pub struct BitReader {
    field: BitField,
    cursor: u64,
}

impl BitReader {
    /// Load an entire file into memory and position the cursor at its
    /// first bit.
    ///
    /// # Errors
    /// Surfaces the underlying I/O error if the file cannot be opened or
    /// read.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path)?;
        Ok(Self::from_bytes(data))
    }

    /// Wrap an in-memory byte stream.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self {
            field: BitField::from(data.into()),
            cursor: 0,
        }
    }

    /// Return the bit under the cursor and advance by one.
    ///
    /// Past the end of the loaded data this keeps returning `false`; there
    /// is no end-of-data signal.
    pub fn pop_bit(&mut self) -> bool {
        let bit = self.field.get_bit(self.cursor);
        self.cursor += 1;
        bit
    }
}

/// Append-only bit producer over a [`BitField`].
#[derive(Debug, Default)]
pub struct BitWriter {
    field: BitField,
    cursor: u64,
}

impl BitWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one bit and advance the cursor.
    ///
    /// # Errors
    /// Returns [`Error::StoreOverflow`] once the addressing cap is reached.
    pub fn push_bit(&mut self, value: bool) -> Result<()> {
        self.field.set_bit(self.cursor, value)?;
        self.cursor += 1;
        Ok(())
    }

    /// Number of bits pushed so far.
    pub fn len(&self) -> u64 {
        self.cursor
    }

    /// Whether no bits have been pushed yet.
    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// The accumulated bytes, final partial byte zero-padded.
    pub fn as_bytes(&self) -> &[u8] {
        self.field.as_bytes()
    }

    /// Consume the writer and return the accumulated bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.field.data
    }

    /// Serialize the accumulated bytes to `path`.
    ///
    /// # Errors
    /// Surfaces the underlying I/O error on failure to create or write the
    /// file.
    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.field.as_bytes())?;
        Ok(())
    }
}
