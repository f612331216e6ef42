//! A control plane with an identity header and nothing else.

use super::base::{CpCore, check_window};
use super::command::Geometry;
use super::identity::ControlPlaneIdentity;
use super::ControlPlane;
use crate::common::constants::HEADER_SIZE;
use crate::common::{AccessSize, CpnError, CpnResult, Table};

/// Header-only control plane; its DataWindow is read-only and its geometry is zero.
#[derive(Debug)]
pub struct BasicControlPlane {
    core: CpCore,
}

impl BasicControlPlane {
    /// A basic control plane for `identity`.
    pub const fn new(identity: ControlPlaneIdentity) -> Self {
        Self {
            core: CpCore::new(identity, Geometry {
                param_entries: 0,
                stat_entries: 0,
                trigger_entries: 0,
            }),
        }
    }
}

impl ControlPlane for BasicControlPlane {
    fn core(&self) -> &CpCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CpCore {
        &mut self.core
    }

    fn data_window_size(&self) -> u64 {
        HEADER_SIZE
    }

    fn read_data(&self, offset: u64, size: AccessSize) -> CpnResult<u64> {
        check_window(offset, size, HEADER_SIZE)?;
        self.core.read_header(offset, size)
    }

    fn write_data(&mut self, offset: u64, size: AccessSize, _value: u64) -> CpnResult<()> {
        check_window(offset, size, HEADER_SIZE)?;
        Err(CpnError::ReadOnly {
            table: Table::Header,
            offset,
        })
    }
}
