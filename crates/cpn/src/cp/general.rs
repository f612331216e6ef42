//! Control plane with parameter, statistics, and trigger tables.
//!
//! The DataWindow is laid out as:
//!
//! ```text
//!  0         16                 16+8P              16+8P+8S            16+8P+8S+16T
//!  +---------+------------------+------------------+--------------------+
//!  | header  | parameters (8 B) | statistics (8 B) | triggers (16 B)    |
//!  +---------+------------------+------------------+--------------------+
//! ```
//!
//! From the network side the header and statistics are read-only. Statistics change only
//! through [`GeneralControlPlane::update`] and [`GeneralControlPlane::incr`], which evaluate
//! the trigger table before returning.
//!
//! Rows tagged with a domain are also reachable as "the `n`th row of domain `d`", through
//! the `*_for` methods and the ConfigWindow `G`/`S` commands.

use std::fmt;

use tracing::debug;

use super::ControlPlane;
use super::base::{CpCore, check_window};
use super::command::{Geometry, TableCell};
use super::identity::ControlPlaneIdentity;
use super::schema::{AttrSchema, Attribute, ParameterAttr, StatisticAttr};
use super::trigger::{FIRE_COUNT_BYTES, TriggerAction, TriggerDescriptor, TriggerEntry, TriggerEvent};
use super::window::{check_unit, load, store, touches};
use crate::common::constants::{
    DATA_WINDOW_LIMIT, HEADER_SIZE, MAX_TABLE_ENTRIES, SLOT_SIZE, TRIGGER_DESC_SIZE,
};
use crate::common::{AccessSize, AlignmentFault, CpnError, CpnResult, Table};
use crate::config::ConfigError;

/// Table declarations for a [`GeneralControlPlane`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneralLayout {
    /// Parameter descriptors in index order.
    pub parameters: Vec<ParameterAttr>,
    /// Statistic descriptors in index order.
    pub statistics: Vec<StatisticAttr>,
    /// Number of trigger table slots.
    pub trigger_entries_nr: usize,
    /// Initial contents of the first trigger slots; the rest start disabled.
    pub triggers: Vec<TriggerEntry>,
}

#[derive(Debug, Clone, Copy, Default)]
struct TriggerSlot {
    entry: TriggerEntry,
    fire_count: u32,
}

/// The DataWindow parts a field unit can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Header,
    Parameter,
    Statistic,
    Trigger,
}

impl Region {
    const fn table(self) -> Table {
        match self {
            Self::Header => Table::Header,
            Self::Parameter => Table::Parameter,
            Self::Statistic => Table::Statistic,
            Self::Trigger => Table::Trigger,
        }
    }
}

/// A field unit inside the DataWindow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Unit {
    region: Region,
    index: usize,
    offset: u64,
    len: u64,
}

/// Control plane exposing typed parameter and statistics tables plus triggers.
pub struct GeneralControlPlane {
    core: CpCore,
    params: AttrSchema<ParameterAttr>,
    param_values: Vec<u64>,
    stats: AttrSchema<StatisticAttr>,
    stat_values: Vec<u64>,
    triggers: Vec<TriggerSlot>,
    action: Option<Box<dyn TriggerAction>>,
}

impl fmt::Debug for GeneralControlPlane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneralControlPlane")
            .field("core", &self.core)
            .field("params", &self.param_values)
            .field("stats", &self.stat_values)
            .field("triggers", &self.triggers)
            .field("action", &self.action.is_some())
            .finish()
    }
}

impl GeneralControlPlane {
    /// Builds a control plane from validated table declarations.
    ///
    /// # Errors
    ///
    /// Schema errors, more triggers than slots, a trigger naming a missing statistic, or a
    /// DataWindow that would reach the ConfigWindow.
    pub fn new(identity: ControlPlaneIdentity, layout: GeneralLayout) -> Result<Self, ConfigError> {
        let params = AttrSchema::new(Table::Parameter, layout.parameters)?;
        let stats = AttrSchema::new(Table::Statistic, layout.statistics)?;

        if layout.trigger_entries_nr > MAX_TABLE_ENTRIES {
            return Err(ConfigError::TooManyEntries {
                table: Table::Trigger,
                count: layout.trigger_entries_nr,
            });
        }
        if layout.triggers.len() > layout.trigger_entries_nr {
            return Err(ConfigError::TooManyTriggers {
                ident: identity.ident().to_owned(),
                count: layout.triggers.len(),
                slots: layout.trigger_entries_nr,
            });
        }
        for (slot, t) in layout.triggers.iter().enumerate() {
            if t.is_enabled() && t.stat_index >= stats.len() {
                return Err(ConfigError::TriggerStat {
                    slot,
                    stat_index: t.stat_index,
                });
            }
        }

        let size = window_size(params.len(), stats.len(), layout.trigger_entries_nr);
        if size > DATA_WINDOW_LIMIT {
            return Err(ConfigError::WindowTooLarge {
                ident: identity.ident().to_owned(),
                size,
            });
        }

        let mut triggers = vec![TriggerSlot::default(); layout.trigger_entries_nr];
        for (slot, entry) in triggers.iter_mut().zip(layout.triggers) {
            slot.entry = entry;
        }

        let geometry = Geometry {
            param_entries: params.len() as u16,
            stat_entries: stats.len() as u16,
            trigger_entries: layout.trigger_entries_nr as u16,
        };

        Ok(Self {
            core: CpCore::new(identity, geometry),
            param_values: params.initial_values(),
            params,
            stat_values: stats.initial_values(),
            stats,
            triggers,
            action: None,
        })
    }

    /// Installs the handler that receives trigger firings.
    ///
    /// The handler runs inside [`update`](Self::update). When this control plane is shared,
    /// that means while its lock is held, so the handler must not access this control plane
    /// through the network or the adaptor.
    pub fn set_action_handler(&mut self, action: Box<dyn TriggerAction>) {
        self.action = Some(action);
    }

    /// Parameter schema.
    pub const fn parameters(&self) -> &AttrSchema<ParameterAttr> {
        &self.params
    }

    /// Statistics schema.
    pub const fn statistics(&self) -> &AttrSchema<StatisticAttr> {
        &self.stats
    }

    /// Number of trigger slots.
    pub fn trigger_entries(&self) -> usize {
        self.triggers.len()
    }

    /// Current value of parameter `index`.
    ///
    /// # Errors
    ///
    /// `AlignmentError` if `index` is out of range.
    pub fn param(&self, index: usize) -> CpnResult<u64> {
        let i = check_index(Table::Parameter, index, self.param_values.len())?;
        Ok(self.param_values[i])
    }

    /// Current value of the parameter called `name`, if declared.
    pub fn param_by_name(&self, name: &str) -> Option<u64> {
        self.params.index_of(name).map(|i| self.param_values[i])
    }

    /// Sets parameter `index`.
    ///
    /// # Errors
    ///
    /// `AlignmentError` for a bad index, `InvalidValue` if the attribute kind rejects `value`.
    pub fn set_param(&mut self, index: usize, value: u64) -> CpnResult<()> {
        let i = check_index(Table::Parameter, index, self.param_values.len())?;
        if let Some(attr) = self.params.get(i) {
            attr.kind().check(attr.name(), value)?;
        }
        self.param_values[i] = value;
        Ok(())
    }

    /// Current value of statistic `index`.
    ///
    /// # Errors
    ///
    /// `AlignmentError` if `index` is out of range.
    pub fn stat(&self, index: usize) -> CpnResult<u64> {
        let i = check_index(Table::Statistic, index, self.stat_values.len())?;
        Ok(self.stat_values[i])
    }

    /// Current value of the statistic called `name`, if declared.
    pub fn stat_by_name(&self, name: &str) -> Option<u64> {
        self.stats.index_of(name).map(|i| self.stat_values[i])
    }

    /// Stores a new statistic value and runs every trigger whose condition it makes true.
    ///
    /// Triggers are evaluated in slot order and their actions run before this returns, under
    /// whatever lock the caller holds on this control plane. An action that reads this
    /// control plane back through the network blocks on that lock forever.
    ///
    /// # Errors
    ///
    /// `AlignmentError` for a bad index, `InvalidValue` if the attribute kind rejects `value`.
    pub fn update(&mut self, index: usize, value: u64) -> CpnResult<()> {
        let i = check_index(Table::Statistic, index, self.stat_values.len())?;
        if let Some(attr) = self.stats.get(i) {
            attr.kind().check(attr.name(), value)?;
        }
        let old = std::mem::replace(&mut self.stat_values[i], value);

        for (slot, t) in self.triggers.iter_mut().enumerate() {
            if t.entry.stat_index != i || !t.entry.fires(old, value) {
                continue;
            }
            t.fire_count = t.fire_count.wrapping_add(1);
            let event = TriggerEvent {
                slot,
                stat_index: i,
                action: t.entry.action,
                old,
                new: value,
            };
            debug!(
                ident = self.core.identity().ident(),
                slot,
                stat = i,
                old,
                new = value,
                "trigger fired"
            );
            if let Some(action) = self.action.as_mut() {
                action.fire(&event);
            }
        }
        Ok(())
    }

    /// Adds `delta` (wrapping) to statistic `index`, then behaves as [`update`](Self::update).
    ///
    /// # Errors
    ///
    /// As for [`update`](Self::update).
    pub fn incr(&mut self, index: usize, delta: i64) -> CpnResult<()> {
        let old = self.stat(index)?;
        self.update(index, old.wrapping_add_signed(delta))
    }

    /// Value of the `row`th parameter owned by `domain`.
    ///
    /// # Errors
    ///
    /// `NoDomainRow` if the domain owns fewer rows.
    pub fn param_for(&self, domain: u16, row: usize) -> CpnResult<u64> {
        let i = self.param_row(domain, row)?;
        Ok(self.param_values[i])
    }

    /// Sets the `row`th parameter owned by `domain`.
    ///
    /// # Errors
    ///
    /// `NoDomainRow` if the domain owns fewer rows, `InvalidValue` as for
    /// [`set_param`](Self::set_param).
    pub fn set_param_for(&mut self, domain: u16, row: usize, value: u64) -> CpnResult<()> {
        let i = self.param_row(domain, row)?;
        self.set_param(i, value)
    }

    /// Value of the `row`th statistic owned by `domain`.
    ///
    /// # Errors
    ///
    /// `NoDomainRow` if the domain owns fewer rows.
    pub fn stat_for(&self, domain: u16, row: usize) -> CpnResult<u64> {
        let i = self.stat_row(domain, row)?;
        Ok(self.stat_values[i])
    }

    /// [`update`](Self::update) on the `row`th statistic owned by `domain`.
    ///
    /// # Errors
    ///
    /// `NoDomainRow` if the domain owns fewer rows, otherwise as for `update`.
    pub fn update_for(&mut self, domain: u16, row: usize, value: u64) -> CpnResult<()> {
        let i = self.stat_row(domain, row)?;
        self.update(i, value)
    }

    /// [`incr`](Self::incr) on the `row`th statistic owned by `domain`.
    ///
    /// # Errors
    ///
    /// As for [`update_for`](Self::update_for).
    pub fn incr_for(&mut self, domain: u16, row: usize, delta: i64) -> CpnResult<()> {
        let i = self.stat_row(domain, row)?;
        self.incr(i, delta)
    }

    /// Trigger entry in `slot`.
    ///
    /// # Errors
    ///
    /// `AlignmentError` if `slot` is out of range.
    pub fn trigger(&self, slot: usize) -> CpnResult<TriggerEntry> {
        let i = check_index(Table::Trigger, slot, self.triggers.len())?;
        Ok(self.triggers[i].entry)
    }

    /// Number of times the entry in `slot` has fired.
    ///
    /// # Errors
    ///
    /// `AlignmentError` if `slot` is out of range.
    pub fn fire_count(&self, slot: usize) -> CpnResult<u32> {
        let i = check_index(Table::Trigger, slot, self.triggers.len())?;
        Ok(self.triggers[i].fire_count)
    }

    /// Replaces the entry in `slot`; its fire count is kept.
    ///
    /// # Errors
    ///
    /// `AlignmentError` for a bad slot or an enabled entry naming a missing statistic.
    pub fn set_trigger(&mut self, slot: usize, entry: TriggerEntry) -> CpnResult<()> {
        let i = check_index(Table::Trigger, slot, self.triggers.len())?;
        if entry.is_enabled() {
            let _ = check_index(Table::Statistic, entry.stat_index, self.stat_values.len())?;
        }
        self.triggers[i].entry = entry;
        Ok(())
    }

    fn param_row(&self, domain: u16, row: usize) -> CpnResult<usize> {
        self.params
            .domain_row(domain, row)
            .ok_or(CpnError::NoDomainRow {
                table: Table::Parameter,
                domain,
                row,
            })
    }

    fn stat_row(&self, domain: u16, row: usize) -> CpnResult<usize> {
        self.stats
            .domain_row(domain, row)
            .ok_or(CpnError::NoDomainRow {
                table: Table::Statistic,
                domain,
                row,
            })
    }

    fn params_start() -> u64 {
        HEADER_SIZE
    }

    fn stats_start(&self) -> u64 {
        Self::params_start() + self.param_values.len() as u64 * SLOT_SIZE
    }

    fn triggers_start(&self) -> u64 {
        self.stats_start() + self.stat_values.len() as u64 * SLOT_SIZE
    }

    /// Maps a DataWindow offset to the field unit containing it.
    fn locate(&self, offset: u64) -> CpnResult<Unit> {
        let (region, start, len, count) = if offset < Self::params_start() {
            (Region::Header, 0, HEADER_SIZE, 1)
        } else if offset < self.stats_start() {
            (
                Region::Parameter,
                Self::params_start(),
                SLOT_SIZE,
                self.param_values.len(),
            )
        } else if offset < self.triggers_start() {
            (
                Region::Statistic,
                self.stats_start(),
                SLOT_SIZE,
                self.stat_values.len(),
            )
        } else {
            (
                Region::Trigger,
                self.triggers_start(),
                TRIGGER_DESC_SIZE,
                self.triggers.len(),
            )
        };
        let index = ((offset - start) / len) as usize;
        let _ = check_index(region.table(), index, count)?;
        Ok(Unit {
            region,
            index,
            offset: (offset - start) % len,
            len,
        })
    }

    fn descriptor_bytes(&self, slot: usize) -> [u8; 16] {
        let t = &self.triggers[slot];
        TriggerDescriptor::encode(&t.entry, t.fire_count).to_bytes()
    }

    fn write_descriptor(
        &mut self,
        window_offset: u64,
        unit: Unit,
        size: AccessSize,
        value: u64,
    ) -> CpnResult<()> {
        if touches(unit.offset, size, &FIRE_COUNT_BYTES) {
            return Err(CpnError::ReadOnly {
                table: Table::Trigger,
                offset: window_offset,
            });
        }
        let mut raw = self.descriptor_bytes(unit.index);
        store(&mut raw, unit.offset, size, value);
        let desc = TriggerDescriptor::from_bytes(raw);
        let entry = desc.entry().ok_or(CpnError::InvalidValue {
            field: "comparator".to_owned(),
            value: u64::from(desc.comparator),
        })?;
        self.set_trigger(unit.index, entry)
    }
}

impl ControlPlane for GeneralControlPlane {
    fn core(&self) -> &CpCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CpCore {
        &mut self.core
    }

    fn data_window_size(&self) -> u64 {
        window_size(
            self.param_values.len(),
            self.stat_values.len(),
            self.triggers.len(),
        )
    }

    fn read_data(&self, offset: u64, size: AccessSize) -> CpnResult<u64> {
        check_window(offset, size, self.data_window_size())?;
        let unit = self.locate(offset)?;
        check_unit(offset, unit.offset, unit.len, size)?;
        let raw = match unit.region {
            Region::Header => return self.core.read_header(offset, size),
            Region::Parameter => self.param_values[unit.index].to_le_bytes().to_vec(),
            Region::Statistic => self.stat_values[unit.index].to_le_bytes().to_vec(),
            Region::Trigger => self.descriptor_bytes(unit.index).to_vec(),
        };
        Ok(load(&raw, unit.offset, size))
    }

    fn write_data(&mut self, offset: u64, size: AccessSize, value: u64) -> CpnResult<()> {
        check_window(offset, size, self.data_window_size())?;
        let unit = self.locate(offset)?;
        check_unit(offset, unit.offset, unit.len, size)?;
        match unit.region {
            Region::Parameter => {
                let mut raw = self.param_values[unit.index].to_le_bytes();
                store(&mut raw, unit.offset, size, value);
                self.set_param(unit.index, u64::from_le_bytes(raw))
            }
            Region::Trigger => self.write_descriptor(offset, unit, size, value),
            region @ (Region::Header | Region::Statistic) => Err(CpnError::ReadOnly {
                table: region.table(),
                offset,
            }),
        }
    }

    fn query_table(&self, domain: u16, dest: u32) -> CpnResult<u64> {
        let cell = TableCell::decode(dest)?;
        match cell.table() {
            Table::Statistic => self.stat_for(domain, cell.row()),
            _ => self.param_for(domain, cell.row()),
        }
    }

    fn update_table(&mut self, domain: u16, dest: u32, data: u64) -> CpnResult<()> {
        let cell = TableCell::decode(dest)?;
        match cell.table() {
            Table::Parameter => self.set_param_for(domain, cell.row(), data),
            table => Err(CpnError::ReadOnly {
                table,
                offset: u64::from(dest),
            }),
        }
    }
}

fn window_size(params: usize, stats: usize, triggers: usize) -> u64 {
    HEADER_SIZE
        + (params as u64 + stats as u64) * SLOT_SIZE
        + triggers as u64 * TRIGGER_DESC_SIZE
}

fn check_index(table: Table, index: usize, len: usize) -> CpnResult<usize> {
    if index >= len {
        return Err(AlignmentFault::Index { table, index, len }.into());
    }
    Ok(index)
}
