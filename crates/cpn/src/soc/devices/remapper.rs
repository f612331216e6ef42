//! Transparent range translation from the primary bus onto the network.
//!
//! Used when a component's control interface has to appear directly in the primary address
//! map (for example an I/O hub's own control plane) instead of behind the adaptor.

use std::sync::Arc;

use crate::common::{CpnResult, Request, Response};
use crate::net::{ControlPlaneNetwork, CpnAccess};
use crate::soc::traits::Device;

/// Maps `[range_start, range_start + range_size)` onto CPN addresses starting at `base`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRemapper {
    name: String,
    range_start: u64,
    range_size: u64,
    base: u64,
}

impl AddressRemapper {
    /// A remapper sending `range_start + i` to `base + i`.
    pub fn new(name: &str, range_start: u64, range_size: u64, base: u64) -> Self {
        Self {
            name: name.to_owned(),
            range_start,
            range_size,
            base,
        }
    }

    /// CPN address for primary address `paddr`, or `None` outside the range.
    pub const fn translate(&self, paddr: u64) -> Option<u64> {
        if paddr >= self.range_start && paddr - self.range_start < self.range_size {
            self.base.checked_add(paddr - self.range_start)
        } else {
            None
        }
    }

    /// Primary-bus range as `(start, size)`.
    pub const fn range(&self) -> (u64, u64) {
        (self.range_start, self.range_size)
    }

    /// CPN address of the first byte of the range.
    pub const fn base(&self) -> u64 {
        self.base
    }
}

/// A remapped window as a bus device; requests are forwarded to the network.
#[derive(Debug, Clone)]
pub struct RemappedWindow {
    remapper: AddressRemapper,
    network: Arc<ControlPlaneNetwork>,
}

impl RemappedWindow {
    /// Puts `remapper`'s range on the bus, backed by `network`.
    pub const fn new(remapper: AddressRemapper, network: Arc<ControlPlaneNetwork>) -> Self {
        Self { remapper, network }
    }

    /// The translation applied.
    pub const fn remapper(&self) -> &AddressRemapper {
        &self.remapper
    }
}

impl Device for RemappedWindow {
    fn name(&self) -> &str {
        &self.remapper.name
    }

    fn address_range(&self) -> (u64, u64) {
        self.remapper.range()
    }

    /// `req.addr` is relative to the start of the range; anything `translate` rejects
    /// answers unmapped.
    fn access(&mut self, req: &Request) -> CpnResult<Response> {
        let target = self
            .remapper
            .range_start
            .checked_add(req.addr)
            .and_then(|paddr| self.remapper.translate(paddr));
        match target {
            Some(addr) => self.network.access(&req.with_addr(addr)),
            None => Ok(Response::unmapped_for(req)),
        }
    }
}
