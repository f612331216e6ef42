//! Per-control-plane network endpoint.
//!
//! A connector owns the two address ranges a control plane occupies inside its region and
//! delegates requests that fall in them. It never sees out-of-range addresses: the network
//! filters by range before dispatch.

use crate::common::constants::{CONFIG_WINDOW_OFFSET, CONFIG_WINDOW_SIZE};
use crate::common::{CpnResult, Request, Response};
use crate::cp::{ControlPlaneIdentity, SharedControlPlane};

/// Which of a control plane's windows a range or request belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Window {
    /// Identity header and tables, at region offset 0.
    Data,
    /// Geometry and command registers, at region offset `0xF000`.
    Config,
}

/// A bound address range `[base, base + size)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mapping {
    /// First CPN address of the range.
    pub base: u64,
    /// Size in bytes.
    pub size: u64,
    /// Window served by the range.
    pub window: Window,
}

impl Mapping {
    /// First address past the range.
    pub const fn end(&self) -> u64 {
        self.base + self.size
    }

    /// `true` if `addr` lies inside the range.
    pub const fn contains(&self, addr: u64) -> bool {
        addr >= self.base && addr < self.end()
    }

    /// `true` if the two ranges share at least one address.
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.base < other.end() && other.base < self.end()
    }
}

/// Network endpoint for one control plane.
#[derive(Debug)]
pub struct ControlPlaneConnector {
    identity: ControlPlaneIdentity,
    data: Mapping,
    config: Mapping,
    cp: SharedControlPlane,
}

impl ControlPlaneConnector {
    /// Computes the ranges a control plane would occupy, without binding it.
    pub fn mappings_for(cp: &SharedControlPlane) -> (ControlPlaneIdentity, [Mapping; 2]) {
        let guard = cp.lock();
        let identity = guard.identity().clone();
        let base = identity.base().val();
        let mappings = [
            Mapping {
                base,
                size: guard.data_window_size(),
                window: Window::Data,
            },
            Mapping {
                base: base + CONFIG_WINDOW_OFFSET,
                size: CONFIG_WINDOW_SIZE,
                window: Window::Config,
            },
        ];
        (identity, mappings)
    }

    /// Binds a control plane at the ranges derived from its identity; the control plane moves
    /// to `Bound`.
    ///
    /// # Errors
    ///
    /// `AlreadyBound` if the control plane was bound before.
    pub fn bind(cp: SharedControlPlane) -> CpnResult<Self> {
        let (identity, [data, config]) = Self::mappings_for(&cp);
        cp.lock().mark_bound()?;
        Ok(Self {
            identity,
            data,
            config,
            cp,
        })
    }

    /// Identity of the bound control plane.
    pub const fn identity(&self) -> &ControlPlaneIdentity {
        &self.identity
    }

    /// DataWindow and ConfigWindow ranges.
    pub const fn mappings(&self) -> [Mapping; 2] {
        [self.data, self.config]
    }

    /// The bound control plane.
    pub fn control_plane(&self) -> &SharedControlPlane {
        &self.cp
    }

    /// Serves a request `offset` bytes into `window`.
    ///
    /// Holds the control plane's lock for the whole request; concurrent requests to the same
    /// connector are served one after another in arrival order.
    ///
    /// # Errors
    ///
    /// Whatever the control plane rejects the request with.
    pub fn handle(&self, window: Window, offset: u64, req: &Request) -> CpnResult<Response> {
        let mut cp = self.cp.lock();
        match (window, req.is_write) {
            (Window::Data, false) => cp.read_data(offset, req.size).map(Response::data),
            (Window::Data, true) => cp
                .write_data(offset, req.size, req.data)
                .map(|()| Response::ack()),
            (Window::Config, false) => cp.read_config(offset, req.size).map(Response::data),
            (Window::Config, true) => cp
                .write_config(offset, req.size, req.data)
                .map(|()| Response::ack()),
        }
    }
}
