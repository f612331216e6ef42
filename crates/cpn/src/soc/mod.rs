//! Primary system components.
//!
//! This module organizes what the control-plane network is attached to: the primary bus, the
//! devices on it that reach into the network, and the builder assembling the whole system.

/// System builder.
pub mod builder;

/// Adaptor and remapper devices.
pub mod devices;

/// Primary bus interconnect and routing.
pub mod interconnect;

/// Device trait definitions.
pub mod traits;

pub use builder::{System, SystemControlPlane};
