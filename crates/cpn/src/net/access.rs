//! Request issuing on the control-plane network.

use crate::common::{AccessSize, CpnResult, Request, Response};

/// Anything that answers CPN requests: the network itself, or a driver reaching it through an
/// adaptor. Addresses are flat CPN addresses.
pub trait CpnAccess {
    /// Serves one request.
    ///
    /// # Errors
    ///
    /// Whatever the target rejects the request with; unmapped addresses are not errors.
    fn access(&self, req: &Request) -> CpnResult<Response>;

    /// Reads one byte.
    ///
    /// # Errors
    ///
    /// As for [`access`](Self::access).
    fn read_u8(&self, addr: u64) -> CpnResult<u8> {
        Ok(self.access(&Request::read(addr, AccessSize::Byte))?.data as u8)
    }

    /// Reads two bytes (little-endian).
    ///
    /// # Errors
    ///
    /// As for [`access`](Self::access).
    fn read_u16(&self, addr: u64) -> CpnResult<u16> {
        Ok(self.access(&Request::read(addr, AccessSize::Half))?.data as u16)
    }

    /// Reads four bytes (little-endian).
    ///
    /// # Errors
    ///
    /// As for [`access`](Self::access).
    fn read_u32(&self, addr: u64) -> CpnResult<u32> {
        Ok(self.access(&Request::read(addr, AccessSize::Word))?.data as u32)
    }

    /// Reads eight bytes (little-endian).
    ///
    /// # Errors
    ///
    /// As for [`access`](Self::access).
    fn read_u64(&self, addr: u64) -> CpnResult<u64> {
        Ok(self.access(&Request::read(addr, AccessSize::Double))?.data)
    }

    /// Writes one byte.
    ///
    /// # Errors
    ///
    /// As for [`access`](Self::access).
    fn write_u8(&self, addr: u64, val: u8) -> CpnResult<()> {
        self.access(&Request::write(addr, AccessSize::Byte, u64::from(val)))
            .map(drop)
    }

    /// Writes two bytes (little-endian).
    ///
    /// # Errors
    ///
    /// As for [`access`](Self::access).
    fn write_u16(&self, addr: u64, val: u16) -> CpnResult<()> {
        self.access(&Request::write(addr, AccessSize::Half, u64::from(val)))
            .map(drop)
    }

    /// Writes four bytes (little-endian).
    ///
    /// # Errors
    ///
    /// As for [`access`](Self::access).
    fn write_u32(&self, addr: u64, val: u32) -> CpnResult<()> {
        self.access(&Request::write(addr, AccessSize::Word, u64::from(val)))
            .map(drop)
    }

    /// Writes eight bytes (little-endian).
    ///
    /// # Errors
    ///
    /// As for [`access`](Self::access).
    fn write_u64(&self, addr: u64, val: u64) -> CpnResult<()> {
        self.access(&Request::write(addr, AccessSize::Double, val))
            .map(drop)
    }
}
