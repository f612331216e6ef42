//! Control plane discovery.
//!
//! A scanning agent walks the `(device, function)` space and reads the 16-byte identity
//! header at each region base. An unmapped response or a `Type` of zero means absent;
//! anything else is a present control plane with the IDENT found in the header.

use std::ops::RangeInclusive;

use tracing::info;

use crate::common::{AccessSize, CpnResult, Request, encode};
use crate::cp::IdentityHeader;
use crate::cp::identity::TYPE_ABSENT;
use crate::net::CpnAccess;

/// What a scan found at one `(device, function)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presence {
    /// A control plane answered with a non-zero type.
    Present {
        /// Type code from the header.
        cp_type: u8,
        /// IDENT from the header.
        ident: String,
    },
    /// Nothing there.
    Absent,
}

/// One scanned address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    /// Device id.
    pub device: u8,
    /// Function id.
    pub function: u8,
    /// Outcome.
    pub presence: Presence,
}

impl ScanEntry {
    /// IDENT if present.
    pub fn ident(&self) -> Option<&str> {
        match &self.presence {
            Presence::Present { ident, .. } => Some(ident),
            Presence::Absent => None,
        }
    }
}

/// Result of a scan, in scan order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Every scanned address.
    pub entries: Vec<ScanEntry>,
}

impl ScanReport {
    /// Entries with a control plane.
    pub fn present(&self) -> impl Iterator<Item = &ScanEntry> + '_ {
        self.entries
            .iter()
            .filter(|e| matches!(e.presence, Presence::Present { .. }))
    }

    /// Number of empty addresses.
    pub fn absent_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.presence == Presence::Absent)
            .count()
    }

    /// Number of scanned addresses.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if nothing was scanned.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reads the identity header at `(device, function)`.
///
/// # Errors
///
/// Any error the access path reports; unmapped is not an error.
pub fn probe<A: CpnAccess + ?Sized>(access: &A, device: u8, function: u8) -> CpnResult<Presence> {
    let base = encode(device, function);
    let low = access.access(&Request::read(base, AccessSize::Double))?;
    if low.unmapped || low.data & 0xFF == u64::from(TYPE_ABSENT) {
        return Ok(Presence::Absent);
    }
    let high = access.access(&Request::read(base + 8, AccessSize::Double))?;
    let header = IdentityHeader::from_words(low.data, high.data);
    Ok(Presence::Present {
        cp_type: header.cp_type,
        ident: header.ident(),
    })
}

/// Scans the given device and function ranges, devices outermost.
///
/// # Errors
///
/// The first error from [`probe`].
pub fn scan_range<A: CpnAccess + ?Sized>(
    access: &A,
    devices: RangeInclusive<u8>,
    functions: RangeInclusive<u8>,
) -> CpnResult<ScanReport> {
    let mut entries = Vec::new();
    for device in devices {
        for function in functions.clone() {
            entries.push(ScanEntry {
                device,
                function,
                presence: probe(access, device, function)?,
            });
        }
    }
    let report = ScanReport { entries };
    info!(
        scanned = report.len(),
        present = report.present().count(),
        "scan complete"
    );
    Ok(report)
}

/// Scans the whole `(device, function)` space.
///
/// # Errors
///
/// The first error from [`probe`].
pub fn scan<A: CpnAccess + ?Sized>(access: &A) -> CpnResult<ScanReport> {
    scan_range(access, 0..=u8::MAX, 0..=u8::MAX)
}
