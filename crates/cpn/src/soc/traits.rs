//! Device trait for the primary system's bus.
//!
//! This module defines the `Device` trait implemented by everything the bus routes to. It provides:
//! 1. **Identification:** `name` and `address_range` for bus routing.
//! 2. **Access:** One request/response entry point at device-relative offsets.
//! 3. **Typed helpers:** Byte, half, word, and doubleword read/write built on `access`.
//!
//! All implementors must be `Send + Sync` so a system can be driven from several threads.

use crate::common::{AccessSize, CpnResult, Request, Response};

/// Trait for memory-mapped devices attached to the primary system bus.
pub trait Device: Send + Sync {
    /// Returns a short name for this device (e.g., `"CPA.BAR0"`).
    fn name(&self) -> &str;

    /// Returns (base_address, size_in_bytes) for this device's region.
    fn address_range(&self) -> (u64, u64);

    /// Serves one request; `req.addr` is relative to the device base.
    ///
    /// # Errors
    ///
    /// Device-specific rejections.
    fn access(&mut self, req: &Request) -> CpnResult<Response>;

    /// Reads one byte at the given device-relative offset.
    ///
    /// # Errors
    ///
    /// As for [`access`](Self::access).
    fn read_u8(&mut self, offset: u64) -> CpnResult<u8> {
        Ok(self.access(&Request::read(offset, AccessSize::Byte))?.data as u8)
    }
    /// Reads two bytes (little-endian) at the given offset.
    ///
    /// # Errors
    ///
    /// As for [`access`](Self::access).
    fn read_u16(&mut self, offset: u64) -> CpnResult<u16> {
        Ok(self.access(&Request::read(offset, AccessSize::Half))?.data as u16)
    }
    /// Reads four bytes (little-endian) at the given offset.
    ///
    /// # Errors
    ///
    /// As for [`access`](Self::access).
    fn read_u32(&mut self, offset: u64) -> CpnResult<u32> {
        Ok(self.access(&Request::read(offset, AccessSize::Word))?.data as u32)
    }
    /// Reads eight bytes (little-endian) at the given offset.
    ///
    /// # Errors
    ///
    /// As for [`access`](Self::access).
    fn read_u64(&mut self, offset: u64) -> CpnResult<u64> {
        Ok(self.access(&Request::read(offset, AccessSize::Double))?.data)
    }
    /// Writes one byte at the given offset.
    ///
    /// # Errors
    ///
    /// As for [`access`](Self::access).
    fn write_u8(&mut self, offset: u64, val: u8) -> CpnResult<()> {
        self.access(&Request::write(offset, AccessSize::Byte, u64::from(val)))
            .map(drop)
    }
    /// Writes two bytes (little-endian) at the given offset.
    ///
    /// # Errors
    ///
    /// As for [`access`](Self::access).
    fn write_u16(&mut self, offset: u64, val: u16) -> CpnResult<()> {
        self.access(&Request::write(offset, AccessSize::Half, u64::from(val)))
            .map(drop)
    }
    /// Writes four bytes (little-endian) at the given offset.
    ///
    /// # Errors
    ///
    /// As for [`access`](Self::access).
    fn write_u32(&mut self, offset: u64, val: u32) -> CpnResult<()> {
        self.access(&Request::write(offset, AccessSize::Word, u64::from(val)))
            .map(drop)
    }
    /// Writes eight bytes (little-endian) at the given offset.
    ///
    /// # Errors
    ///
    /// As for [`access`](Self::access).
    fn write_u64(&mut self, offset: u64, val: u64) -> CpnResult<()> {
        self.access(&Request::write(offset, AccessSize::Double, val))
            .map(drop)
    }
}
