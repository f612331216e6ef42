//! Control-plane network library.
//!
//! This crate implements a management side-channel for simulated hardware with the following:
//! 1. **Addressing:** `(device, function, offset)` encoding into a flat 32-bit CPN address space.
//! 2. **Control planes:** Identity headers, typed parameter/statistics tables, and triggers.
//! 3. **Network:** Connectors bound at disjoint ranges and range-based request routing.
//! 4. **SoC:** A primary bus carrying the selector + window adaptor and remapped windows.
//! 5. **Management:** A serializing adaptor driver, discovery scans, and traffic statistics.

/// Common types and constants (addresses, port contract, errors).
pub mod common;
/// Configuration (defaults, control plane declarations, adaptor and remappers).
pub mod config;
/// Control planes (identity, tables, triggers, ConfigWindow).
pub mod cp;
/// Management agent helpers (driver, discovery).
pub mod mgmt;
/// Control-plane network (connectors, routing).
pub mod net;
/// Primary system (builder, bus, adaptor and remapper devices).
pub mod soc;
/// Network traffic statistics.
pub mod stats;

/// Root configuration type; use `Config::default()` or load JSON.
pub use crate::config::Config;
/// Issues requests onto the network.
pub use crate::net::CpnAccess;
/// The network fabric; build with `ControlPlaneNetwork::builder()`.
pub use crate::net::ControlPlaneNetwork;
/// Top-level system; construct with `System::new`.
pub use crate::soc::System;
