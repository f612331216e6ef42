//! Control-plane adaptor: selector + window indirection onto the network.
//!
//! The adaptor occupies two small regions on the primary bus:
//! 1. **Selector (BAR0):** one 32-bit register holding the CPN address currently targeted.
//! 2. **Data window (BAR1):** `window_size` bytes; an access at offset `k` is forwarded to the
//!    network at `selector + k` and the response is relayed unchanged.
//!
//! The selector is a single shared value. Independent callers that each select and then access
//! race, and the last selector write wins; callers needing an atomic select-then-access must
//! serialize themselves (see `mgmt::AdaptorDriver`).
//!
//! A data window access issued while the adaptor is idle (no selector written since creation
//! or reset) fails with `SelectorUnset`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::common::{AccessSize, AlignmentFault, CpnError, CpnResult, Request, Response};
use crate::net::{ControlPlaneNetwork, CpnAccess};
use crate::soc::traits::Device;

/// Size of the selector register in bytes.
pub const SELECTOR_SIZE: u64 = 4;

/// Value a selector read returns while the adaptor is idle.
pub const SELECTOR_IDLE_READ: u64 = 0xFFFF_FFFF;

/// Selector value meaning "nothing selected"; never a valid 32-bit CPN address.
const IDLE: u64 = u64::MAX;

/// Adaptor state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdaptorState {
    /// No selector written since creation or the last reset.
    Idle,
    /// Forwarding window accesses relative to this CPN address.
    Selected(u64),
}

/// Selector + window indirection onto a control-plane network.
#[derive(Debug)]
pub struct ControlPlaneAdaptor {
    network: Arc<ControlPlaneNetwork>,
    selector: AtomicU64,
    window_size: u64,
}

impl ControlPlaneAdaptor {
    /// An idle adaptor with a `window_size`-byte data window.
    pub const fn new(network: Arc<ControlPlaneNetwork>, window_size: u64) -> Self {
        Self {
            network,
            selector: AtomicU64::new(IDLE),
            window_size,
        }
    }

    /// The network behind the window.
    pub const fn network(&self) -> &Arc<ControlPlaneNetwork> {
        &self.network
    }

    /// Data window size in bytes.
    pub const fn window_size(&self) -> u64 {
        self.window_size
    }

    /// Current state.
    pub fn state(&self) -> AdaptorState {
        match self.selector.load(Ordering::Acquire) {
            IDLE => AdaptorState::Idle,
            target => AdaptorState::Selected(target),
        }
    }

    /// Targets the data window at CPN address `target` (truncated to 32 bits).
    pub fn select(&self, target: u64) {
        let target = target & 0xFFFF_FFFF;
        self.selector.store(target, Ordering::Release);
        debug!(target, "adaptor selector written");
    }

    /// Returns the adaptor to `Idle`.
    pub fn reset(&self) {
        self.selector.store(IDLE, Ordering::Release);
        debug!("adaptor reset");
    }

    /// Serves a request at `req.addr` inside the selector region.
    ///
    /// Only full 4-byte accesses at offset 0 are accepted.
    ///
    /// # Errors
    ///
    /// `AlignmentError` for any other offset or width.
    pub fn access_selector(&self, req: &Request) -> CpnResult<Response> {
        if req.addr != 0 || req.size != AccessSize::Word {
            warn!(offset = req.addr, size = req.size.bytes(), "bad selector access");
            return Err(AlignmentFault::Register {
                offset: req.addr,
                size: req.size.bytes(),
            }
            .into());
        }
        if req.is_write {
            self.select(req.data);
            return Ok(Response::ack());
        }
        Ok(Response::data(match self.state() {
            AdaptorState::Idle => SELECTOR_IDLE_READ,
            AdaptorState::Selected(target) => target,
        }))
    }

    /// Serves a request `req.addr` bytes into the data window by forwarding it to
    /// `selector + req.addr` on the network.
    ///
    /// # Errors
    ///
    /// `SelectorUnset` while idle, `AlignmentError` if the access leaves the window, and
    /// whatever the network returns.
    pub fn access_window(&self, req: &Request) -> CpnResult<Response> {
        let k = req.addr;
        if k + req.size.bytes() > self.window_size {
            return Err(AlignmentFault::Straddle {
                addr: k,
                size: req.size.bytes(),
            }
            .into());
        }
        let AdaptorState::Selected(target) = self.state() else {
            warn!(offset = k, "adaptor window accessed while idle");
            return Err(CpnError::SelectorUnset);
        };
        self.network.access(&req.with_addr(target + k))
    }
}

/// The adaptor's selector register as a bus device.
#[derive(Debug, Clone)]
pub struct AdaptorSelectorPort {
    adaptor: Arc<ControlPlaneAdaptor>,
    base: u64,
}

impl AdaptorSelectorPort {
    /// Places the selector register at bus address `base`.
    pub const fn new(adaptor: Arc<ControlPlaneAdaptor>, base: u64) -> Self {
        Self { adaptor, base }
    }
}

impl Device for AdaptorSelectorPort {
    fn name(&self) -> &str {
        "CPA.BAR0"
    }

    fn address_range(&self) -> (u64, u64) {
        (self.base, SELECTOR_SIZE)
    }

    fn access(&mut self, req: &Request) -> CpnResult<Response> {
        self.adaptor.access_selector(req)
    }
}

/// The adaptor's data window as a bus device.
#[derive(Debug, Clone)]
pub struct AdaptorWindowPort {
    adaptor: Arc<ControlPlaneAdaptor>,
    base: u64,
}

impl AdaptorWindowPort {
    /// Places the data window at bus address `base`.
    pub const fn new(adaptor: Arc<ControlPlaneAdaptor>, base: u64) -> Self {
        Self { adaptor, base }
    }
}

impl Device for AdaptorWindowPort {
    fn name(&self) -> &str {
        "CPA.BAR1"
    }

    fn address_range(&self) -> (u64, u64) {
        (self.base, self.adaptor.window_size())
    }

    fn access(&mut self, req: &Request) -> CpnResult<Response> {
        self.adaptor.access_window(req)
    }
}
