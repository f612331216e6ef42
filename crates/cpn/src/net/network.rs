//! The control-plane network fabric.
//!
//! Connectors are bound on a [`NetworkBuilder`], which keeps every bound range pairwise
//! disjoint. [`NetworkBuilder::build`] freezes the topology into a [`ControlPlaneNetwork`]
//! that only routes: it takes `&self`, so one network can be shared behind an `Arc` by the
//! adaptor, remappers, and management agents.
//!
//! Routing rules:
//! - A request wholly inside one range goes to that range's connector.
//! - A request touching no range is unmapped: reads return all-ones, writes are dropped.
//! - A request crossing the end of a range (into another range or into unmapped space) is an
//!   alignment error and nothing is applied.

use tracing::{debug, info, warn};

use super::access::CpnAccess;
use super::connector::{ControlPlaneConnector, Mapping};
use crate::common::{AlignmentFault, CpnAddr, CpnError, CpnResult, Request, Response};
use crate::cp::SharedControlPlane;
use crate::stats::NetworkStats;

#[derive(Clone, Copy, Debug)]
struct Route {
    mapping: Mapping,
    connector: usize,
}

/// Collects connectors before the network goes live.
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    connectors: Vec<ControlPlaneConnector>,
    routes: Vec<Route>,
}

impl NetworkBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a control plane at the ranges its identity selects.
    ///
    /// Nothing is registered and the control plane stays unbound if this fails.
    ///
    /// # Errors
    ///
    /// `DuplicateAddress` if its `(device, function)` is taken, `RangeOverlap` if a range
    /// collides with an existing one, `AlreadyBound` if it sits on another network.
    pub fn bind(&mut self, cp: SharedControlPlane) -> CpnResult<()> {
        let (identity, mappings) = ControlPlaneConnector::mappings_for(&cp);
        let (device, function) = (identity.device(), identity.function());

        if self.connector(device, function).is_some() {
            warn!(device, function, ident = identity.ident(), "duplicate CPN address");
            return Err(CpnError::DuplicateAddress { device, function });
        }
        for m in &mappings {
            if self.routes.iter().any(|r| r.mapping.overlaps(m)) {
                return Err(CpnError::RangeOverlap {
                    name: identity.ident().to_owned(),
                    base: m.base,
                    size: m.size,
                });
            }
        }

        let connector = ControlPlaneConnector::bind(cp)?;
        let idx = self.connectors.len();
        for mapping in connector.mappings() {
            self.routes.push(Route {
                mapping,
                connector: idx,
            });
        }
        info!(
            ident = identity.ident(),
            addr = %identity.base(),
            data_size = mappings[0].size,
            "connector bound"
        );
        self.connectors.push(connector);
        Ok(())
    }

    /// Connector bound at `(device, function)`, if any.
    pub fn connector(&self, device: u8, function: u8) -> Option<&ControlPlaneConnector> {
        self.connectors
            .iter()
            .find(|c| c.identity().device() == device && c.identity().function() == function)
    }

    /// Freezes the topology.
    pub fn build(mut self) -> ControlPlaneNetwork {
        self.routes.sort_by_key(|r| r.mapping.base);
        info!(connectors = self.connectors.len(), "control-plane network built");
        ControlPlaneNetwork {
            connectors: self.connectors,
            routes: self.routes,
            stats: NetworkStats::new(),
        }
    }
}

/// A live, immutable control-plane network.
#[derive(Debug)]
pub struct ControlPlaneNetwork {
    connectors: Vec<ControlPlaneConnector>,
    /// Sorted by base; pairwise disjoint.
    routes: Vec<Route>,
    stats: NetworkStats,
}

impl ControlPlaneNetwork {
    /// Starts an empty topology.
    pub fn builder() -> NetworkBuilder {
        NetworkBuilder::new()
    }

    /// Bound connectors in bind order.
    pub fn connectors(&self) -> &[ControlPlaneConnector] {
        &self.connectors
    }

    /// Connector bound at `(device, function)`, if any.
    pub fn connector(&self, device: u8, function: u8) -> Option<&ControlPlaneConnector> {
        self.connectors
            .iter()
            .find(|c| c.identity().device() == device && c.identity().function() == function)
    }

    /// Every bound range, sorted by base address.
    pub fn mappings(&self) -> impl Iterator<Item = Mapping> + '_ {
        self.routes.iter().map(|r| r.mapping)
    }

    /// Traffic counters.
    pub const fn stats(&self) -> &NetworkStats {
        &self.stats
    }

    /// Index of the first route whose end lies past `addr`.
    fn first_ending_after(&self, addr: u64) -> usize {
        self.routes.partition_point(|r| r.mapping.end() <= addr)
    }

    fn route(&self, req: &Request) -> CpnResult<Response> {
        let straddle = || -> CpnError {
            AlignmentFault::Straddle {
                addr: req.addr,
                size: req.size.bytes(),
            }
            .into()
        };
        let end = req.end().ok_or_else(straddle)?;

        let idx = self.first_ending_after(req.addr);
        let Some(route) = self.routes.get(idx) else {
            return Ok(Response::unmapped_for(req));
        };

        if route.mapping.contains(req.addr) {
            if end > route.mapping.end() {
                return Err(straddle());
            }
            let connector = &self.connectors[route.connector];
            return connector.handle(route.mapping.window, req.addr - route.mapping.base, req);
        }
        if route.mapping.base < end {
            return Err(straddle());
        }
        Ok(Response::unmapped_for(req))
    }
}

impl CpnAccess for ControlPlaneNetwork {
    fn access(&self, req: &Request) -> CpnResult<Response> {
        let outcome = self.route(req);
        self.stats.record(req, &outcome);
        match &outcome {
            Ok(resp) => debug!(
                addr = %CpnAddr(req.addr),
                size = req.size.bytes(),
                write = req.is_write,
                data = resp.data,
                unmapped = resp.unmapped,
                "cpn request"
            ),
            Err(e) => warn!(addr = %CpnAddr(req.addr), write = req.is_write, "cpn request rejected: {e}"),
        }
        outcome
    }
}
