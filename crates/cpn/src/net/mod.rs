//! Control-plane network: connectors, routing, and the request-issuing trait.
//!
//! This module provides the fabric between management agents and control planes. It includes:
//! 1. **Access:** The `CpnAccess` trait with typed read/write helpers.
//! 2. **Connectors:** Per-control-plane endpoints owning a DataWindow and a ConfigWindow range.
//! 3. **Network:** Bind-time disjointness checks and range-based request routing.

/// Request issuing.
pub mod access;

/// Per-control-plane endpoints.
pub mod connector;

/// The network fabric.
pub mod network;

pub use access::CpnAccess;
pub use connector::{ControlPlaneConnector, Mapping, Window};
pub use network::{ControlPlaneNetwork, NetworkBuilder};
