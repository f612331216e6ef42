//! Port contract types.
//!
//! Every hop on the way to a control plane (primary bus, adaptor, remapper, network,
//! connector) speaks the same request/response pair:
//! 1. **Access size:** One of byte, half, word, or double-word.
//! 2. **Request:** Address, size, direction, and write data.
//! 3. **Response:** Read data (or zero for a write acknowledgement) and an `unmapped` flag.

use super::constants::UNMAPPED_SENTINEL;
use super::error::CpnError;

/// Width of a single request on the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AccessSize {
    /// One byte.
    Byte = 1,
    /// Two bytes (little-endian).
    Half = 2,
    /// Four bytes (little-endian).
    Word = 4,
    /// Eight bytes (little-endian).
    Double = 8,
}

impl AccessSize {
    /// Returns the access width in bytes.
    #[inline]
    pub const fn bytes(self) -> u64 {
        self as u64
    }

    /// Returns a mask covering the low `bytes()` bytes of a `u64`.
    #[inline]
    pub const fn mask(self) -> u64 {
        match self {
            Self::Byte => 0xFF,
            Self::Half => 0xFFFF,
            Self::Word => 0xFFFF_FFFF,
            Self::Double => u64::MAX,
        }
    }
}

impl TryFrom<u64> for AccessSize {
    type Error = CpnError;

    fn try_from(bytes: u64) -> Result<Self, CpnError> {
        match bytes {
            1 => Ok(Self::Byte),
            2 => Ok(Self::Half),
            4 => Ok(Self::Word),
            8 => Ok(Self::Double),
            other => Err(CpnError::InvalidSize(other)),
        }
    }
}

/// A single read or write travelling towards a control plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Request {
    /// Target address; absolute on a bus or network, relative once handed to a device.
    pub addr: u64,
    /// Access width.
    pub size: AccessSize,
    /// `true` for a write, `false` for a read.
    pub is_write: bool,
    /// Write data, already truncated to `size`; zero for reads.
    pub data: u64,
}

impl Request {
    /// Builds a read request.
    #[inline]
    pub const fn read(addr: u64, size: AccessSize) -> Self {
        Self {
            addr,
            size,
            is_write: false,
            data: 0,
        }
    }

    /// Builds a write request; `data` is truncated to the access width.
    #[inline]
    pub const fn write(addr: u64, size: AccessSize, data: u64) -> Self {
        Self {
            addr,
            size,
            is_write: true,
            data: data & size.mask(),
        }
    }

    /// Returns the same request retargeted at `addr`.
    #[inline]
    pub const fn with_addr(self, addr: u64) -> Self {
        Self { addr, ..self }
    }

    /// Returns the first address past the request, or `None` if it wraps the address space.
    #[inline]
    pub const fn end(&self) -> Option<u64> {
        self.addr.checked_add(self.size.bytes())
    }
}

/// The answer to a [`Request`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Response {
    /// Read data (zero for write acknowledgements).
    pub data: u64,
    /// `true` when nothing claimed the address and the sentinel was returned.
    pub unmapped: bool,
}

impl Response {
    /// A mapped read that produced `data`.
    #[inline]
    pub const fn data(data: u64) -> Self {
        Self {
            data,
            unmapped: false,
        }
    }

    /// A mapped write acknowledgement.
    #[inline]
    pub const fn ack() -> Self {
        Self {
            data: 0,
            unmapped: false,
        }
    }

    /// The fixed answer for a request nobody claims: all-ones for reads, a dropped write otherwise.
    #[inline]
    pub const fn unmapped_for(req: &Request) -> Self {
        Self {
            data: if req.is_write {
                0
            } else {
                UNMAPPED_SENTINEL & req.size.mask()
            },
            unmapped: true,
        }
    }
}
