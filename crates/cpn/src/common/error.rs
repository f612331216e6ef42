//! Error definitions.
//!
//! This module defines the failures a request or a bind can produce. It provides:
//! 1. **Bind failures:** Two components claiming the same `(device, function)` or overlapping ranges.
//! 2. **Alignment faults:** Requests that straddle a window or field, or name a missing table index.
//! 3. **Access faults:** Read-only fields, bad sizes, rejected values, and an unset adaptor selector.
//!
//! An unmapped address is not an error: it answers with the sentinel response.
//! Build-time configuration failures live in [`crate::config::ConfigError`].

use std::fmt;

use thiserror::Error;

/// Result alias for network operations.
pub type CpnResult<T> = Result<T, CpnError>;

/// Tables and register blocks addressable inside a control plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Table {
    /// Identity header at the start of the DataWindow.
    Header,
    /// Parameter table.
    Parameter,
    /// Statistics table.
    Statistic,
    /// Trigger table.
    Trigger,
    /// ConfigWindow registers.
    Config,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Header => "header",
            Self::Parameter => "parameter",
            Self::Statistic => "statistic",
            Self::Trigger => "trigger",
            Self::Config => "config",
        };
        f.write_str(name)
    }
}

/// Why a request was rejected as misaligned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum AlignmentFault {
    /// The request crosses the end of a connector range or of a field unit.
    #[error("request at {addr:#x} ({size} bytes) straddles a boundary")]
    Straddle {
        /// Address (or window offset) of the request.
        addr: u64,
        /// Request width in bytes.
        size: u64,
    },
    /// A table index past the end of its table.
    #[error("{table} index {index} out of range ({len} entries)")]
    Index {
        /// Table that was indexed.
        table: Table,
        /// Requested index.
        index: usize,
        /// Number of entries in the table.
        len: usize,
    },
    /// A register accessed at an offset or width it does not support.
    #[error("no {size}-byte register at offset {offset:#x}")]
    Register {
        /// Offset inside the register block.
        offset: u64,
        /// Request width in bytes.
        size: u64,
    },
}

/// Errors raised while binding control planes or serving requests.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CpnError {
    /// Another connector already owns this `(device, function)` on the network.
    #[error("duplicate CPN address {device:02x}:{function:02x}")]
    DuplicateAddress {
        /// Device id.
        device: u8,
        /// Function id.
        function: u8,
    },
    /// A range overlaps one that is already registered.
    #[error("{name}: range {base:#x}+{size:#x} overlaps an existing mapping")]
    RangeOverlap {
        /// Name of the component being added.
        name: String,
        /// Base of the rejected range.
        base: u64,
        /// Size of the rejected range.
        size: u64,
    },
    /// The control plane has already been attached to a network.
    #[error("control plane {device:02x}:{function:02x} is already bound")]
    AlreadyBound {
        /// Device id.
        device: u8,
        /// Function id.
        function: u8,
    },
    /// The request is misaligned with the layout it targets.
    #[error("alignment error: {0}")]
    Alignment(#[from] AlignmentFault),
    /// A write to a field the network side may only read.
    #[error("{table} field at offset {offset:#x} is read-only")]
    ReadOnly {
        /// Block containing the field.
        table: Table,
        /// Window offset of the write.
        offset: u64,
    },
    /// A request width other than 1, 2, 4, or 8 bytes.
    #[error("invalid access size {0}")]
    InvalidSize(u64),
    /// A DataWindow access through an adaptor whose selector was never written.
    #[error("adaptor data window accessed before any selector write")]
    SelectorUnset,
    /// A value the target field does not accept.
    #[error("value {value:#x} rejected by {field}")]
    InvalidValue {
        /// Field or attribute name.
        field: String,
        /// Rejected value.
        value: u64,
    },
    /// A domain-keyed lookup found fewer rows than requested.
    #[error("domain {domain} owns no {table} row {row}")]
    NoDomainRow {
        /// Table searched.
        table: Table,
        /// Owning domain id.
        domain: u16,
        /// Position among the domain's rows.
        row: usize,
    },
}

impl CpnError {
    /// Returns `true` for the alignment class of failures.
    pub const fn is_alignment(&self) -> bool {
        matches!(self, Self::Alignment(_))
    }
}
