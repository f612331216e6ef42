//! Primary-bus devices that reach into the control-plane network.
//!
//! The adaptor exposes selector + window indirection; remapped windows expose a slice of the
//! network directly in the primary address map.

/// Selector + window adaptor.
pub mod adaptor;

/// Transparent address range translation.
pub mod remapper;

pub use adaptor::{AdaptorSelectorPort, AdaptorState, AdaptorWindowPort, ControlPlaneAdaptor};
pub use remapper::{AddressRemapper, RemappedWindow};

pub use crate::soc::traits::Device;
