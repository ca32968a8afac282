//! Bit-level reader and writer over a mounted byte buffer.
//!
//! Fields are packed MSB first and may straddle byte boundaries. Bits within each byte are
//! numbered 7 (most significant, read/written first) down to 0. Both cursors are bounded by the
//! buffer they are mounted on; running past its end is an error, never a silent truncation.

use crate::{Error, Result};

const MAX_FIELD_BITS: u32 = 32;

/// Reads big-endian bit fields from a byte slice.
#[derive(Debug, Clone, Copy)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Absolute bit position of the next unread bit.
    pos:  usize,
}

impl<'a> BitReader<'a> {
    /// Mounts a reader on `data`, skipping the first `start_bit` bits of the first byte.
    ///
    /// # Panics
    ///
    /// Panics if `start_bit > 7`.
    pub fn mount(data: &'a [u8], start_bit: u8) -> Self {
        assert!(start_bit < 8, "start bit must be 0..=7, got {start_bit}");
        let pos = if data.is_empty() { 0 } else { usize::from(start_bit) };
        Self { data, pos }
    }

    /// Mounts a reader at the first bit of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self::mount(data, 0)
    }

    /// Bits left before the end of the buffer.
    pub const fn unread_bits(&self) -> usize {
        self.data.len() * 8 - self.pos
    }

    /// Bits consumed so far, counted from the first bit of the buffer.
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Rewinds to the first bit of the buffer.
    ///
    /// The `start_bit` given to [`BitReader::mount`] is not kept: after a reset the
    /// reader starts at bit 0 of byte 0.
    pub const fn reset(&mut self) {
        self.pos = 0;
    }

    /// Reads a single bit.
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_number_be(1)? == 1)
    }

    /// Reads `bits` bits, most significant first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InsufficientData`] if fewer than `bits` bits are left; nothing is consumed
    /// in that case.
    ///
    /// # Panics
    ///
    /// Panics if `bits` is not in `1..=32`.
    pub fn read_number_be(&mut self, bits: u32) -> Result<u32> {
        assert!((1..=MAX_FIELD_BITS).contains(&bits), "bit count must be 1..=32, got {bits}");
        let available = self.unread_bits();
        if bits as usize > available {
            return Err(Error::InsufficientData {
                needed: bits,
                available,
            });
        }

        let mut value = 0u64;
        let mut remaining = bits;
        while remaining > 0 {
            let byte = u64::from(self.data[self.pos / 8]);
            let free = 8 - (self.pos % 8) as u32;
            let take = free.min(remaining);
            let chunk = (byte >> (free - take)) & ((1 << take) - 1);
            value = (value << take) | chunk;
            self.pos += take as usize;
            remaining -= take;
        }
        Ok(value as u32)
    }
}

/// Writes big-endian bit fields into a mutable byte slice.
///
/// Only the bits being written are touched; neighbouring bits keep their previous contents.
#[derive(Debug)]
pub struct BitWriter<'a> {
    buf: &'a mut [u8],
    /// Absolute bit position of the next bit to write.
    pos: usize,
}

impl<'a> BitWriter<'a> {
    /// Mounts a writer on `buf`, skipping the first `start_bit` bits of the first byte.
    ///
    /// # Panics
    ///
    /// Panics if `start_bit > 7`.
    pub fn mount(buf: &'a mut [u8], start_bit: u8) -> Self {
        assert!(start_bit < 8, "start bit must be 0..=7, got {start_bit}");
        let pos = if buf.is_empty() { 0 } else { usize::from(start_bit) };
        Self { buf, pos }
    }

    /// Mounts a writer at the first bit of `buf`.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self::mount(buf, 0)
    }

    /// Bits left before the end of the buffer.
    pub const fn unwritten_bits(&self) -> usize {
        self.buf.len() * 8 - self.pos
    }

    /// Bits written so far, counted from the first bit of the buffer.
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Rewinds to the first bit of the buffer, forgetting any mount offset.
    pub const fn reset(&mut self) {
        self.pos = 0;
    }

    /// Writes a single bit.
    pub fn write_bit(&mut self, bit: bool) -> Result<()> {
        self.write_number_be(u32::from(bit), 1)
    }

    /// Writes the low `bits` bits of `value`, most significant first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferFull`] if fewer than `bits` bits are left; nothing is written in
    /// that case.
    ///
    /// # Panics
    ///
    /// Panics if `bits` is not in `1..=32`.
    pub fn write_number_be(&mut self, value: u32, bits: u32) -> Result<()> {
        assert!((1..=MAX_FIELD_BITS).contains(&bits), "bit count must be 1..=32, got {bits}");
        debug_assert!(
            bits == MAX_FIELD_BITS || value >> bits == 0,
            "value {value} does not fit in {bits} bits"
        );
        let available = self.unwritten_bits();
        if bits as usize > available {
            return Err(Error::BufferFull {
                needed: bits,
                available,
            });
        }

        let value = u64::from(value);
        let mut remaining = bits;
        while remaining > 0 {
            let free = 8 - (self.pos % 8) as u32;
            let take = free.min(remaining);
            let shift = free - take;
            let mask = (((1u64 << take) - 1) << shift) as u8;
            let chunk = (((value >> (remaining - take)) << shift) as u8) & mask;
            let byte = &mut self.buf[self.pos / 8];
            *byte = (*byte & !mask) | chunk;
            self.pos += take as usize;
            remaining -= take;
        }
        Ok(())
    }
}

/// A value with a fixed-width wire form.
///
/// `deserialize` never validates: a value read from an untrusted stream may be out of range
/// until [`BitPacked::validate`] has accepted it.
pub trait BitPacked: Sized {
    /// Width of the wire form in bits.
    const BITS: u32;

    /// Writes exactly [`Self::BITS`] bits.
    fn serialize(&self, writer: &mut BitWriter<'_>) -> Result<()>;

    /// Reads exactly [`Self::BITS`] bits without range checks.
    fn deserialize(reader: &mut BitReader<'_>) -> Result<Self>;

    /// Checks every field against its documented range.
    fn validate(&self) -> Result<()>;

    /// Serializes into a fresh buffer, zero padded to a whole byte.
    fn to_packed(&self) -> Result<Vec<u8>> {
        let mut buf = vec![0; Self::BITS.div_ceil(8) as usize];
        self.serialize(&mut BitWriter::new(&mut buf))?;
        Ok(buf)
    }

    /// Deserializes from the start of `bytes`. The result is not validated.
    fn from_packed(bytes: &[u8]) -> Result<Self> {
        Self::deserialize(&mut BitReader::new(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_with_start_bit() {
        let data = [0xAA];
        let mut reader = BitReader::mount(&data, 1);
        assert_eq!(reader.unread_bits(), 7);
        assert_eq!(reader.read_number_be(3).unwrap(), 0b010);
        assert_eq!(reader.unread_bits(), 4);
    }

    #[test]
    fn test_reset_drops_start_bit() {
        let data = [0xAA];
        let mut reader = BitReader::mount(&data, 1);
        reader.read_number_be(2).unwrap();
        reader.reset();
        assert_eq!(reader.unread_bits(), 8);
        assert_eq!(reader.read_number_be(3).unwrap(), 0b101);
    }

    #[test]
    fn test_read_across_bytes() {
        let data = [0b1010_1100, 0b0011_0101, 0xFF];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read_number_be(4).unwrap(), 0b1010);
        assert_eq!(reader.read_number_be(10).unwrap(), 0b11_0000_1101);
        assert_eq!(reader.read_number_be(10).unwrap(), 0b01_1111_1111);
        assert_eq!(reader.unread_bits(), 0);
    }

    #[test]
    fn test_read_32_bits() {
        let data = [0xDE, 0xAD, 0xBE, 0xEF, 0x80];
        let mut reader = BitReader::mount(&data, 0);
        assert_eq!(reader.read_number_be(32).unwrap(), 0xDEAD_BEEF);
        assert!(reader.read_bit().unwrap());

        let data = [0x7F, 0xFF, 0xFF, 0xFF, 0x80];
        let mut reader = BitReader::mount(&data, 1);
        assert_eq!(reader.read_number_be(32).unwrap(), u32::MAX);
    }

    #[test]
    fn test_insufficient_bits() {
        let data = [0xFF, 0x00];
        let mut reader = BitReader::mount(&data, 3);
        let err = reader.read_number_be(14).unwrap_err();
        assert_eq!(
            err,
            Error::InsufficientData {
                needed:    14,
                available: 13,
            }
        );
        // nothing consumed
        assert_eq!(reader.read_number_be(13).unwrap(), 0b1_1111_0000_0000);

        let mut empty = BitReader::new(&[]);
        assert_eq!(empty.unread_bits(), 0);
        assert!(empty.read_bit().is_err());
    }

    #[test]
    fn test_write_across_bytes() {
        let mut buf = [0u8; 3];
        let mut writer = BitWriter::new(&mut buf);
        writer.write_number_be(0b1010, 4).unwrap();
        writer.write_number_be(0b11_0000_1101, 10).unwrap();
        writer.write_number_be(0b01_1111_1111, 10).unwrap();
        assert_eq!(writer.unwritten_bits(), 0);
        assert_eq!(buf, [0b1010_1100, 0b0011_0101, 0xFF]);
    }

    #[test]
    fn test_write_keeps_neighbouring_bits() {
        let mut buf = [0xFF, 0xFF];
        let mut writer = BitWriter::mount(&mut buf, 2);
        writer.write_number_be(0, 9).unwrap();
        assert_eq!(writer.position(), 11);
        assert_eq!(buf, [0b1100_0000, 0b0001_1111]);
    }

    #[test]
    fn test_write_overflow_is_an_error() {
        let mut buf = [0u8; 1];
        let mut writer = BitWriter::mount(&mut buf, 4);
        let err = writer.write_number_be(0b11111, 5).unwrap_err();
        assert_eq!(
            err,
            Error::BufferFull {
                needed:    5,
                available: 4,
            }
        );
        writer.write_number_be(0b1111, 4).unwrap();
        assert_eq!(buf, [0x0F]);
    }

    #[test]
    fn test_write_then_read() {
        let fields = [(1, 1), (0x7FFF, 15), (11, 4), (30, 5), (999_999, 20), (0xFFFF_FFFF, 32), (5, 3)];
        let mut buf = [0u8; 11];
        let mut writer = BitWriter::mount(&mut buf, 5);
        for &(value, bits) in &fields {
            writer.write_number_be(value, bits).unwrap();
        }

        let mut reader = BitReader::mount(&buf, 5);
        for &(value, bits) in &fields {
            assert_eq!(reader.read_number_be(bits).unwrap(), value, "{bits}-bit field");
        }
    }

    #[test]
    #[should_panic(expected = "bit count must be 1..=32")]
    fn test_zero_bit_read_panics() {
        let data = [0u8];
        let _ = BitReader::new(&data).read_number_be(0);
    }
}
