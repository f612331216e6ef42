//! Byte-level helpers for field units inside a window.
//!
//! Control planes expose their state as fixed-size field units (the identity header, one
//! slot, one trigger descriptor, one register word). A request must fit inside a single
//! unit; these helpers check that and move little-endian bytes in and out of a unit.

use crate::common::{AccessSize, AlignmentFault, CpnResult};

/// Checks that `size` bytes starting `unit_offset` into a unit of `unit_len` bytes stay
/// inside the unit. `window_offset` is reported on failure.
pub(crate) fn check_unit(
    window_offset: u64,
    unit_offset: u64,
    unit_len: u64,
    size: AccessSize,
) -> CpnResult<()> {
    if unit_offset + size.bytes() > unit_len {
        return Err(AlignmentFault::Straddle {
            addr: window_offset,
            size: size.bytes(),
        }
        .into());
    }
    Ok(())
}

/// Reads `size` little-endian bytes at `offset`.
pub(crate) fn load(bytes: &[u8], offset: u64, size: AccessSize) -> u64 {
    let n = size.bytes() as usize;
    let start = offset as usize;
    let mut buf = [0u8; 8];
    buf[..n].copy_from_slice(&bytes[start..start + n]);
    u64::from_le_bytes(buf)
}

/// Writes the low `size` bytes of `value` little-endian at `offset`.
pub(crate) fn store(bytes: &mut [u8], offset: u64, size: AccessSize, value: u64) {
    let n = size.bytes() as usize;
    let start = offset as usize;
    bytes[start..start + n].copy_from_slice(&value.to_le_bytes()[..n]);
}

/// `true` if `[offset, offset + size)` intersects `range`.
pub(crate) const fn touches(offset: u64, size: AccessSize, range: &std::ops::Range<u64>) -> bool {
    offset < range.end && offset + size.bytes() > range.start
}
