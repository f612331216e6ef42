//! Control-plane network constants.
//!
//! This module fixes the geometry shared by every component on the network:
//! 1. **Addressing:** Region shift and size for the `(device, function)` codec.
//! 2. **Region layout:** Where the DataWindow and ConfigWindow live inside a region.
//! 3. **Table layout:** Identity header, slot, and trigger descriptor sizes.
//! 4. **Limits:** Bounds checked when a configuration is validated.

/// Number of low-order address bits reserved for the per-device offset.
///
/// `encode(d, f) = (d << 24) | (f << 16)`, so every `(device, function)` pair owns
/// a 64 KiB region and the whole network spans 32 bits.
pub const REGION_SHIFT: u32 = 16;

/// Size in bytes of the region owned by one `(device, function)` pair.
pub const REGION_SIZE: u64 = 1 << REGION_SHIFT;

/// Mask selecting the offset part of a CPN address.
pub const REGION_MASK: u64 = REGION_SIZE - 1;

/// Width of the CPN address space in bits.
pub const CPN_ADDR_BITS: u32 = 32;

/// First address past the end of the CPN address space.
pub const CPN_ADDR_LIMIT: u64 = 1 << CPN_ADDR_BITS;

/// Region offset of a control plane's ConfigWindow.
pub const CONFIG_WINDOW_OFFSET: u64 = 0xF000;

/// Size in bytes of a control plane's ConfigWindow.
pub const CONFIG_WINDOW_SIZE: u64 = 32;

/// Largest DataWindow a control plane may expose; it must end before the ConfigWindow.
pub const DATA_WINDOW_LIMIT: u64 = CONFIG_WINDOW_OFFSET;

/// Size in bytes of the identity header at the start of every DataWindow.
pub const HEADER_SIZE: u64 = 16;

/// Maximum length of an IDENT string in bytes.
pub const IDENT_LEN: usize = 12;

/// Size in bytes of one parameter or statistics slot (one little-endian `u64`).
pub const SLOT_SIZE: u64 = 8;

/// Size in bytes of one trigger descriptor.
pub const TRIGGER_DESC_SIZE: u64 = 16;

/// Upper bound on the entry count of any single table.
pub const MAX_TABLE_ENTRIES: usize = 256;

/// Maximum length of an attribute name in bytes.
pub const MAX_ATTR_NAME_LEN: usize = 32;

/// Value returned by reads that no control plane claims, before truncation to the access size.
pub const UNMAPPED_SENTINEL: u64 = u64::MAX;

/// ConfigWindow `status` value after a command nobody handled.
pub const COMMAND_STATUS_UNKNOWN: u8 = 0xFF;

/// ConfigWindow `status` value after a table get or set that named no cell or was refused.
pub const COMMAND_STATUS_FAILED: u8 = 0xFE;
