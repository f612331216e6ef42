//! # Unit Components
//!
//! Tests grouped by library module: addressing and the port contract, control planes,
//! the network, the primary-bus side, management helpers, configuration, and statistics.


/// Unit tests for configuration loading and validation.
pub mod config;


/// Unit tests for management helpers (adaptor driver and discovery scans).
pub mod mgmt;
