//! Control planes: the management-facing state of a hardware component.
//!
//! This module provides the `ControlPlane` capability and its variants. It includes:
//! 1. **Identity:** Type code, IDENT string, and `(device, function)` address.
//! 2. **Variants:** A header-only basic control plane and a general one with tables.
//! 3. **Tables:** Typed parameter/statistic schemas and edge-triggered trigger entries.
//! 4. **ConfigWindow:** Geometry registers, a command mailbox, and a domain-keyed table port.
//!
//! A control plane is owned by its component and shared with the network through a
//! [`SharedControlPlane`]. The fair mutex serves competing requests in arrival order.

use std::fmt;
use std::sync::Arc;

use parking_lot::FairMutex;

use crate::common::{AccessSize, CpnResult};

/// Shared identity, bind state, and ConfigWindow.
pub mod base;

/// Header-only control plane.
pub mod basic;

/// ConfigWindow registers and command handlers.
pub mod command;

/// Control plane with parameter, statistics, and trigger tables.
pub mod general;

/// Identity and its wire header.
pub mod identity;

/// Typed attribute descriptors.
pub mod schema;

/// Trigger entries, descriptors, and actions.
pub mod trigger;

mod window;

pub use base::{BindState, CpCore};
pub use basic::BasicControlPlane;
pub use command::{CommandHandler, ConfigRegs, Geometry, TableCell};
pub use general::{GeneralControlPlane, GeneralLayout};
pub use identity::{ControlPlaneIdentity, IdentityHeader};
pub use schema::{AttrKind, AttrSchema, Attribute, ParameterAttr, StatisticAttr};
pub use trigger::{Comparator, EventLog, TriggerAction, TriggerDescriptor, TriggerEntry, TriggerEvent};

/// A control plane as seen by the network.
pub type SharedControlPlane = Arc<FairMutex<dyn ControlPlane>>;

/// A control plane as kept by its owning component; coerces to [`SharedControlPlane`].
pub type ControlPlaneHandle<T> = Arc<FairMutex<T>>;

/// Wraps a control plane for sharing between its owner and the network.
pub fn share<T: ControlPlane + 'static>(cp: T) -> ControlPlaneHandle<T> {
    Arc::new(FairMutex::new(cp))
}

/// Capability implemented by every control plane variant.
///
/// Offsets passed to the window methods are relative to the start of the window.
pub trait ControlPlane: Send + fmt::Debug {
    /// Shared state.
    fn core(&self) -> &CpCore;

    /// Mutable shared state.
    fn core_mut(&mut self) -> &mut CpCore;

    /// Size of the DataWindow in bytes.
    fn data_window_size(&self) -> u64;

    /// Reads `size` bytes of the DataWindow at `offset`.
    ///
    /// # Errors
    ///
    /// `AlignmentError` for an access outside the window, across a field unit, or at a
    /// missing table index.
    fn read_data(&self, offset: u64, size: AccessSize) -> CpnResult<u64>;

    /// Writes `size` bytes of the DataWindow at `offset`. Nothing is applied on error.
    ///
    /// # Errors
    ///
    /// As for [`read_data`](Self::read_data), plus `ReadOnly` and `InvalidValue`.
    fn write_data(&mut self, offset: u64, size: AccessSize, value: u64) -> CpnResult<()>;

    /// Identity consumed by scanning agents.
    fn identity(&self) -> &ControlPlaneIdentity {
        self.core().identity()
    }

    /// Current attachment state.
    fn bind_state(&self) -> BindState {
        self.core().state()
    }

    /// Moves the control plane to `Bound`.
    ///
    /// # Errors
    ///
    /// `AlreadyBound` on a second call.
    fn mark_bound(&mut self) -> CpnResult<()> {
        self.core_mut().mark_bound()
    }

    /// Table geometry advertised in the ConfigWindow.
    fn geometry(&self) -> Geometry {
        self.core().regs().geometry()
    }

    /// Reads the ConfigWindow.
    ///
    /// # Errors
    ///
    /// `AlignmentError` for an access outside the window or across a register word.
    fn read_config(&self, offset: u64, size: AccessSize) -> CpnResult<u64> {
        self.core().regs().read(offset, size)
    }

    /// Writes the ConfigWindow; a byte write to the command register runs the command
    /// before this returns.
    ///
    /// # Errors
    ///
    /// As for [`read_config`](Self::read_config), plus `ReadOnly`. A failed command is
    /// reported through the status register, not here.
    fn write_config(&mut self, offset: u64, size: AccessSize, value: u64) -> CpnResult<()> {
        if let Some(cmd) = self.core_mut().regs_mut().write(offset, size, value)? {
            command::execute(self, cmd);
        }
        Ok(())
    }

    /// Reads the cell `dest` among the rows owned by `domain`. Backs the `G` command.
    ///
    /// # Errors
    ///
    /// `NoDomainRow` if the domain owns no such row, `InvalidValue` for a bad `dest`.
    fn query_table(&self, domain: u16, dest: u32) -> CpnResult<u64> {
        Err(TableCell::decode(dest)?.missing(domain))
    }

    /// Writes `data` into the cell `dest` among the rows owned by `domain`. Backs the `S`
    /// command.
    ///
    /// # Errors
    ///
    /// As for [`query_table`](Self::query_table), plus `ReadOnly` and `InvalidValue` for
    /// cells the network side may not set.
    fn update_table(&mut self, domain: u16, dest: u32, _data: u64) -> CpnResult<()> {
        Err(TableCell::decode(dest)?.missing(domain))
    }

    /// Installs the handler for ConfigWindow commands.
    fn set_command_handler(&mut self, handler: Box<dyn CommandHandler>) {
        self.core_mut().set_command_handler(handler);
    }
}
