//! Common types used throughout the control-plane network.
//!
//! This module provides the building blocks shared by every component. It includes:
//! 1. **Address Codec:** The `CpnAddr` type and `(device, function, offset)` encode/decode.
//! 2. **Constants:** Region, window, and table geometry.
//! 3. **Port Contract:** Access sizes, requests, and responses.
//! 4. **Error Handling:** Bind, alignment, and access failures.

/// CPN address type and codec.
pub mod addr;

/// Region, window, and table geometry.
pub mod constants;

/// Request/response types shared by every port.
pub mod data;

/// Error types.
pub mod error;

pub use addr::{CpnAddr, decode, encode};
pub use data::{AccessSize, Request, Response};
pub use error::{AlignmentFault, CpnError, CpnResult, Table};
