//! Primary system bus.
//!
//! This module implements the bus that routes primary-system addresses to devices. It provides:
//! 1. **Device registration:** Devices are added by address range, checked for overlap, and
//!    sorted for lookup.
//! 2. **Access routing:** Requests go to the claiming device with a last-device hint for
//!    repeated accesses; unclaimed addresses answer the unmapped sentinel.
//! 3. **Typed helpers:** Byte to doubleword read/write by bus address.

use tracing::debug;

use super::traits::Device;
use crate::common::{AccessSize, AlignmentFault, CpnError, CpnResult, Request, Response};

/// Primary system bus; routes requests by address to registered devices.
pub struct Bus {
    /// Registered devices, sorted by base address.
    devices: Vec<Box<dyn Device>>,
    last_device_idx: usize,
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bus")
            .field("devices", &self.device_names())
            .finish_non_exhaustive()
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus {
    /// Creates an empty bus; add devices with `add_device`.
    pub const fn new() -> Self {
        Self {
            devices: Vec::new(),
            last_device_idx: 0,
        }
    }

    /// Registers a device; devices are sorted by base address for lookup.
    ///
    /// # Errors
    ///
    /// `RangeOverlap` if the device's range is empty, wraps past the top of the address
    /// space, or intersects a registered device.
    pub fn add_device(&mut self, dev: Box<dyn Device>) -> CpnResult<()> {
        let (base, size) = dev.address_range();
        let bad_range = size == 0 || base.checked_add(size - 1).is_none();
        if bad_range
            || self
                .devices
                .iter()
                .any(|d| overlaps((base, size), d.address_range()))
        {
            return Err(CpnError::RangeOverlap {
                name: dev.name().to_owned(),
                base,
                size,
            });
        }
        debug!(name = dev.name(), base, size, "bus device added");
        self.devices.push(dev);
        self.devices.sort_by_key(|d| d.address_range().0);
        self.last_device_idx = 0;
        Ok(())
    }

    /// Names of the registered devices in address order.
    pub fn device_names(&self) -> Vec<&str> {
        self.devices.iter().map(|d| d.name()).collect()
    }

    /// Returns whether some device's range contains `paddr`.
    pub fn is_valid_address(&self, paddr: u64) -> bool {
        self.devices
            .iter()
            .any(|d| contains(d.address_range(), paddr).is_some())
    }

    fn find_device(&mut self, paddr: u64) -> Option<(&mut Box<dyn Device>, u64, u64)> {
        if self.last_device_idx < self.devices.len() {
            let range = self.devices[self.last_device_idx].address_range();
            if let Some(offset) = contains(range, paddr) {
                return Some((&mut self.devices[self.last_device_idx], offset, range.1));
            }
        }

        for (i, dev) in self.devices.iter_mut().enumerate() {
            let range = dev.address_range();
            if let Some(offset) = contains(range, paddr) {
                self.last_device_idx = i;
                return Some((dev, offset, range.1));
            }
        }
        None
    }

    /// Routes a request at bus address `req.addr`.
    ///
    /// # Errors
    ///
    /// `AlignmentError` if the request runs past the end of the claiming device; otherwise
    /// whatever the device returns.
    pub fn access(&mut self, req: &Request) -> CpnResult<Response> {
        let Some((dev, offset, size)) = self.find_device(req.addr) else {
            return Ok(Response::unmapped_for(req));
        };
        if size - offset < req.size.bytes() {
            return Err(AlignmentFault::Straddle {
                addr: req.addr,
                size: req.size.bytes(),
            }
            .into());
        }
        dev.access(&req.with_addr(offset))
    }

    /// Reads one byte at the given bus address; all-ones if unclaimed.
    ///
    /// # Errors
    ///
    /// As for [`access`](Self::access).
    pub fn read_u8(&mut self, paddr: u64) -> CpnResult<u8> {
        Ok(self.access(&Request::read(paddr, AccessSize::Byte))?.data as u8)
    }
    /// Reads two bytes (little-endian) at the given bus address; all-ones if unclaimed.
    ///
    /// # Errors
    ///
    /// As for [`access`](Self::access).
    pub fn read_u16(&mut self, paddr: u64) -> CpnResult<u16> {
        Ok(self.access(&Request::read(paddr, AccessSize::Half))?.data as u16)
    }
    /// Reads four bytes (little-endian) at the given bus address; all-ones if unclaimed.
    ///
    /// # Errors
    ///
    /// As for [`access`](Self::access).
    pub fn read_u32(&mut self, paddr: u64) -> CpnResult<u32> {
        Ok(self.access(&Request::read(paddr, AccessSize::Word))?.data as u32)
    }
    /// Reads eight bytes (little-endian) at the given bus address; all-ones if unclaimed.
    ///
    /// # Errors
    ///
    /// As for [`access`](Self::access).
    pub fn read_u64(&mut self, paddr: u64) -> CpnResult<u64> {
        Ok(self.access(&Request::read(paddr, AccessSize::Double))?.data)
    }
    /// Writes one byte at the given bus address; dropped if unclaimed.
    ///
    /// # Errors
    ///
    /// As for [`access`](Self::access).
    pub fn write_u8(&mut self, paddr: u64, val: u8) -> CpnResult<()> {
        self.access(&Request::write(paddr, AccessSize::Byte, u64::from(val)))
            .map(drop)
    }
    /// Writes two bytes (little-endian) at the given bus address; dropped if unclaimed.
    ///
    /// # Errors
    ///
    /// As for [`access`](Self::access).
    pub fn write_u16(&mut self, paddr: u64, val: u16) -> CpnResult<()> {
        self.access(&Request::write(paddr, AccessSize::Half, u64::from(val)))
            .map(drop)
    }
    /// Writes four bytes (little-endian) at the given bus address; dropped if unclaimed.
    ///
    /// # Errors
    ///
    /// As for [`access`](Self::access).
    pub fn write_u32(&mut self, paddr: u64, val: u32) -> CpnResult<()> {
        self.access(&Request::write(paddr, AccessSize::Word, u64::from(val)))
            .map(drop)
    }
    /// Writes eight bytes (little-endian) at the given bus address; dropped if unclaimed.
    ///
    /// # Errors
    ///
    /// As for [`access`](Self::access).
    pub fn write_u64(&mut self, paddr: u64, val: u64) -> CpnResult<()> {
        self.access(&Request::write(paddr, AccessSize::Double, val))
            .map(drop)
    }
}

/// Offset of `paddr` inside `(start, size)`, if it falls there.
fn contains((start, size): (u64, u64), paddr: u64) -> Option<u64> {
    paddr.checked_sub(start).filter(|&offset| offset < size)
}

/// Whether two non-empty `(base, size)` ranges share an address.
const fn overlaps((a, a_size): (u64, u64), (b, b_size): (u64, u64)) -> bool {
    if a <= b { b - a < a_size } else { a - b < b_size }
}
