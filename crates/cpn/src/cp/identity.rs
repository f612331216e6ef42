//! Control plane identity and its wire header.
//!
//! Every DataWindow starts with a 16-byte identity header that a scanning agent reads
//! to decide whether a control plane is present:
//!
//! ```text
//!  0      1                        13     14     15     16
//!  +------+------------------------+------+------+------+
//!  | Type | IDENT (12 bytes, NUL)  | dev  | fun  | rsvd |
//!  +------+------------------------+------+------+------+
//! ```

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::common::CpnAddr;
use crate::common::constants::IDENT_LEN;
use crate::config::ConfigError;

/// Type code reserved for "no control plane here".
pub const TYPE_ABSENT: u8 = 0x00;

/// Type code that collides with the unmapped sentinel byte.
pub const TYPE_RESERVED: u8 = 0xFF;

/// Identity of one control plane: category, name, and network address.
///
/// `(device, function)` must be unique on one network; the network enforces this at bind time.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ControlPlaneIdentity {
    cp_type: u8,
    ident: String,
    device: u8,
    function: u8,
}

impl ControlPlaneIdentity {
    /// Creates a validated identity.
    ///
    /// # Errors
    ///
    /// Rejects empty, non-ASCII, or over-long (more than 12 bytes) IDENT strings, and the
    /// reserved type codes `0x00` and `0xFF` which a scanner would read as "absent".
    pub fn new(cp_type: u8, ident: &str, device: u8, function: u8) -> Result<Self, ConfigError> {
        if ident.is_empty() {
            return Err(ConfigError::EmptyIdent { device, function });
        }
        if !ident.is_ascii() || ident.contains('\0') {
            return Err(ConfigError::InvalidIdent {
                ident: ident.to_owned(),
            });
        }
        if ident.len() > IDENT_LEN {
            return Err(ConfigError::IdentTooLong {
                ident: ident.to_owned(),
                len: ident.len(),
            });
        }
        if cp_type == TYPE_ABSENT || cp_type == TYPE_RESERVED {
            return Err(ConfigError::ReservedType {
                ident: ident.to_owned(),
                cp_type,
            });
        }
        Ok(Self {
            cp_type,
            ident: ident.to_owned(),
            device,
            function,
        })
    }

    /// Category code (e.g. `b'S'` for a system control plane).
    pub const fn cp_type(&self) -> u8 {
        self.cp_type
    }

    /// Human-readable identifier.
    pub fn ident(&self) -> &str {
        &self.ident
    }

    /// Device id.
    pub const fn device(&self) -> u8 {
        self.device
    }

    /// Function id.
    pub const fn function(&self) -> u8 {
        self.function
    }

    /// Base CPN address of this control plane's region.
    pub const fn base(&self) -> CpnAddr {
        CpnAddr::encode(self.device, self.function)
    }

    /// Builds the wire header for this identity.
    pub fn header(&self) -> IdentityHeader {
        let mut ident = [0u8; IDENT_LEN];
        ident[..self.ident.len()].copy_from_slice(self.ident.as_bytes());
        IdentityHeader {
            cp_type: self.cp_type,
            ident,
            device: self.device,
            function: self.function,
            reserved: 0,
        }
    }
}

/// Wire layout of the identity header.
#[repr(C)]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned,
)]
pub struct IdentityHeader {
    /// Category code; `0` means absent.
    pub cp_type: u8,
    /// NUL-padded IDENT string.
    pub ident: [u8; IDENT_LEN],
    /// Device id.
    pub device: u8,
    /// Function id.
    pub function: u8,
    /// Always zero.
    pub reserved: u8,
}

impl IdentityHeader {
    /// Reassembles a header from the two little-endian double-words a scanner reads.
    pub fn from_words(low: u64, high: u64) -> Self {
        let mut raw = [0u8; 16];
        raw[..8].copy_from_slice(&low.to_le_bytes());
        raw[8..].copy_from_slice(&high.to_le_bytes());
        zerocopy::transmute!(raw)
    }

    /// Returns the header as its 16 wire bytes.
    pub fn to_bytes(self) -> [u8; 16] {
        zerocopy::transmute!(self)
    }

    /// IDENT with trailing NUL padding removed.
    pub fn ident(&self) -> String {
        let end = self
            .ident
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(IDENT_LEN);
        String::from_utf8_lossy(&self.ident[..end]).into_owned()
    }
}
