//! Management agent side of the network.
//!
//! This module provides what an agent needs to operate control planes. It includes:
//! 1. **Driver:** Serialized select-then-access through the adaptor.
//! 2. **Discovery:** Scanning the `(device, function)` space for identity headers.

/// Control plane discovery.
pub mod discovery;

/// Adaptor host driver.
pub mod driver;

pub use discovery::{Presence, ScanEntry, ScanReport, probe, scan, scan_range};
pub use driver::AdaptorDriver;
