/// Discovery scans.
pub mod discovery;

/// Serialized adaptor access.
pub mod driver;
