//! Big-endian field access inside a value's byte cell.
//!
//! Every value owns a fixed array; composites place their components at constant offsets and read
//! them back through these helpers. Fields are 1 to 4 bytes wide. Big-endian storage keeps the
//! byte-wise order of a cell equal to the numeric order of its fields.

/// Reads the `width`-byte field at the start of `cell`.
pub(crate) fn get(cell: &[u8], width: usize) -> u32 {
    debug_assert!((1..=4).contains(&width));
    cell[..width].iter().fold(0, |acc, &byte| (acc << 8) | u32::from(byte))
}

/// Stores `value` as a `width`-byte field at the start of `cell`.
pub(crate) fn put(cell: &mut [u8], width: usize, value: u32) {
    debug_assert!((1..=4).contains(&width));
    debug_assert!(width == 4 || value >> (width * 8) == 0, "{value} does not fit in {width} bytes");
    for (i, byte) in cell[..width].iter_mut().enumerate() {
        *byte = (value >> ((width - 1 - i) * 8)) as u8;
    }
}
