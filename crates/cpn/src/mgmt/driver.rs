//! Host driver for the control-plane adaptor.
//!
//! The adaptor has no atomic select-then-access primitive. `AdaptorDriver` supplies the
//! missing discipline: every clone shares one lock, held across the selector write and the
//! window access, so agents going through drivers never interleave. Anything touching the
//! adaptor directly bypasses the lock.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::common::constants::{CPN_ADDR_LIMIT, SLOT_SIZE};
use crate::common::{CpnResult, Request, Response};
use crate::net::CpnAccess;
use crate::soc::devices::{AdaptorState, ControlPlaneAdaptor};

/// Serialized access to the network through an adaptor.
#[derive(Debug, Clone)]
pub struct AdaptorDriver {
    adaptor: Arc<ControlPlaneAdaptor>,
    lock: Arc<Mutex<()>>,
}

impl AdaptorDriver {
    /// A driver for `adaptor` with its own lock.
    pub fn new(adaptor: Arc<ControlPlaneAdaptor>) -> Self {
        Self {
            adaptor,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// The driven adaptor.
    pub const fn adaptor(&self) -> &Arc<ControlPlaneAdaptor> {
        &self.adaptor
    }

    /// Window offset for `req` under the current selector, if it already covers the request.
    fn covered(&self, req: &Request) -> Option<u64> {
        let AdaptorState::Selected(target) = self.adaptor.state() else {
            return None;
        };
        let k = req.addr.checked_sub(target)?;
        (k + req.size.bytes() <= self.adaptor.window_size()).then_some(k)
    }

    /// Selects a target covering `req` and returns the window offset to use.
    fn select_for(&self, req: &Request) -> u64 {
        let aligned = req.addr & !(SLOT_SIZE - 1);
        let (target, k) = if req.addr - aligned + req.size.bytes() <= self.adaptor.window_size() {
            (aligned, req.addr - aligned)
        } else {
            (req.addr, 0)
        };
        self.adaptor.select(target);
        k
    }
}

impl CpnAccess for AdaptorDriver {
    fn access(&self, req: &Request) -> CpnResult<Response> {
        if req.addr >= CPN_ADDR_LIMIT {
            return Ok(Response::unmapped_for(req));
        }
        let _guard = self.lock.lock();
        let k = match self.covered(req) {
            Some(k) => k,
            None => self.select_for(req),
        };
        trace!(addr = req.addr, offset = k, "driver window access");
        self.adaptor.access_window(&req.with_addr(k))
    }
}
