//! CPN address codec.
//!
//! This module defines the strong address type used on the control-plane network and
//! the pure encode/decode functions between `(device, function, offset)` and a flat
//! address. It provides the following:
//! 1. **Type Safety:** `CpnAddr` keeps network addresses apart from primary-system addresses.
//! 2. **Encoding:** Packs device and function ids into the high bits above a 64 KiB region.
//! 3. **Decoding:** Recovers `(device, function, offset)` exactly for every in-space address.
//!
//! Two shift constants circulate for this formula; this crate uses `REGION_SHIFT = 16`
//! throughout, so the device id occupies bits 31..24 and the function id bits 23..16.

use std::fmt;

use super::constants::{CPN_ADDR_LIMIT, REGION_MASK, REGION_SHIFT, REGION_SIZE};

const FUNCTION_SHIFT: u32 = REGION_SHIFT;
const DEVICE_SHIFT: u32 = REGION_SHIFT + 8;

/// An address on the control-plane network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CpnAddr(pub u64);

impl CpnAddr {
    /// Creates a new CPN address from a raw 64-bit value.
    #[inline]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the base address of the region owned by `(device, function)`.
    #[inline]
    pub const fn encode(device: u8, function: u8) -> Self {
        Self(((device as u64) << DEVICE_SHIFT) | ((function as u64) << FUNCTION_SHIFT))
    }

    /// Returns the raw 64-bit address value.
    #[inline]
    pub const fn val(self) -> u64 {
        self.0
    }

    /// Returns this address advanced by `offset` bytes, or `None` on overflow.
    #[inline]
    pub const fn checked_add(self, offset: u64) -> Option<Self> {
        match self.0.checked_add(offset) {
            Some(addr) => Some(Self(addr)),
            None => None,
        }
    }

    /// Splits the address into `(device, function, offset)`.
    ///
    /// # Returns
    ///
    /// `None` if the address lies outside the 32-bit CPN address space.
    #[inline]
    pub const fn decode(self) -> Option<(u8, u8, u64)> {
        if self.0 >= CPN_ADDR_LIMIT {
            return None;
        }
        Some((
            (self.0 >> DEVICE_SHIFT) as u8,
            (self.0 >> FUNCTION_SHIFT) as u8,
            self.0 & REGION_MASK,
        ))
    }

    /// Returns the base address of the region containing this address.
    #[inline]
    pub const fn region_base(self) -> Self {
        Self(self.0 & !REGION_MASK)
    }

    /// Returns the offset of this address inside its region.
    #[inline]
    pub const fn region_offset(self) -> u64 {
        self.0 & REGION_MASK
    }
}

impl fmt::Display for CpnAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.decode() {
            Some((dev, fun, off)) => write!(f, "{dev:02x}:{fun:02x}+{off:#06x}"),
            None => write!(f, "{:#x}", self.0),
        }
    }
}

impl From<CpnAddr> for u64 {
    fn from(addr: CpnAddr) -> Self {
        addr.0
    }
}

/// Packs `(device, function)` into the base address of their region.
#[inline]
pub const fn encode(device: u8, function: u8) -> u64 {
    CpnAddr::encode(device, function).val()
}

/// Splits a flat CPN address into `(device, function, offset)`.
///
/// Exact inverse of [`encode`]: `decode(encode(d, f) + o) == Some((d, f, o))` for every
/// `o < REGION_SIZE`.
#[inline]
pub const fn decode(addr: u64) -> Option<(u8, u8, u64)> {
    CpnAddr(addr).decode()
}

/// Returns the `[base, base + REGION_SIZE)` range owned by `(device, function)`.
pub const fn region(device: u8, function: u8) -> (u64, u64) {
    (encode(device, function), REGION_SIZE)
}
