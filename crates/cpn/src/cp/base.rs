//! State every control plane variant carries: identity, bind state, and ConfigWindow.

use tracing::info;

use super::command::{CommandHandler, ConfigRegs, Geometry};
use super::identity::ControlPlaneIdentity;
use super::window::{check_unit, load};
use crate::common::constants::HEADER_SIZE;
use crate::common::{AccessSize, AlignmentFault, CpnError, CpnResult};

/// Attachment state of a control plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BindState {
    /// Not attached to any network.
    #[default]
    Unbound,
    /// Attached; stays so for the life of the network.
    Bound,
}

/// Composition root shared by [`BasicControlPlane`](super::BasicControlPlane) and
/// [`GeneralControlPlane`](super::GeneralControlPlane).
#[derive(Debug)]
pub struct CpCore {
    identity: ControlPlaneIdentity,
    state: BindState,
    regs: ConfigRegs,
}

impl CpCore {
    /// An unbound core advertising `geometry` in its ConfigWindow.
    pub const fn new(identity: ControlPlaneIdentity, geometry: Geometry) -> Self {
        Self {
            identity,
            state: BindState::Unbound,
            regs: ConfigRegs::new(geometry),
        }
    }

    /// Identity.
    pub const fn identity(&self) -> &ControlPlaneIdentity {
        &self.identity
    }

    /// Current attachment state.
    pub const fn state(&self) -> BindState {
        self.state
    }

    /// Performs the single `Unbound -> Bound` transition.
    ///
    /// # Errors
    ///
    /// `AlreadyBound` if the transition already happened.
    pub fn mark_bound(&mut self) -> CpnResult<()> {
        if self.state == BindState::Bound {
            return Err(CpnError::AlreadyBound {
                device: self.identity.device(),
                function: self.identity.function(),
            });
        }
        self.state = BindState::Bound;
        info!(
            ident = self.identity.ident(),
            device = self.identity.device(),
            function = self.identity.function(),
            "control plane bound"
        );
        Ok(())
    }

    /// ConfigWindow registers.
    pub const fn regs(&self) -> &ConfigRegs {
        &self.regs
    }

    /// Mutable ConfigWindow registers.
    pub const fn regs_mut(&mut self) -> &mut ConfigRegs {
        &mut self.regs
    }

    /// Installs the ConfigWindow command handler.
    pub fn set_command_handler(&mut self, handler: Box<dyn CommandHandler>) {
        self.regs.set_handler(handler);
    }

    /// Reads from the identity header; `offset` is relative to the DataWindow.
    pub fn read_header(&self, offset: u64, size: AccessSize) -> CpnResult<u64> {
        check_unit(offset, offset, HEADER_SIZE, size)?;
        Ok(load(&self.identity.header().to_bytes(), offset, size))
    }
}

/// Rejects a request that runs past the end of a `window_size`-byte window.
pub(crate) fn check_window(offset: u64, size: AccessSize, window_size: u64) -> CpnResult<()> {
    match offset.checked_add(size.bytes()) {
        Some(end) if end <= window_size => Ok(()),
        _ => Err(AlignmentFault::Straddle {
            addr: offset,
            size: size.bytes(),
        }
        .into()),
    }
}
