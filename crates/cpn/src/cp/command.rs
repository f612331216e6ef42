//! ConfigWindow registers: table geometry, a command mailbox, and a domain-keyed table port.
//!
//! ```text
//!  0        2        4        6      7      8                       16
//!  +--------+--------+--------+------+------+-----------------------+
//!  | params | stats  | trigs  | stat | cmd  | argument              |
//!  +--------+--------+--------+------+------+-----------------------+
//!  16       18       20              24                             32
//!  +--------+--------+---------------+------------------------------+
//!  | domain | rsvd   | dest addr     | data                         |
//!  +--------+--------+---------------+------------------------------+
//! ```
//!
//! Geometry and status are read-only; the reserved half-word reads as zero and ignores
//! writes. A one-byte write to `cmd` runs the command:
//! - `G` copies the table cell named by `(domain, dest addr)` into `data`.
//! - `S` stores `data` into that cell.
//! - anything else goes to the registered `CommandHandler` as `(cmd, argument)`.
//!
//! Status ends up `0` on success, `0xFE` when a table command fails and `0xFF` when no
//! handler understands the command.

use std::fmt;

use tracing::{debug, warn};

use super::ControlPlane;
use super::window::{check_unit, load, store, touches};
use crate::common::constants::{
    COMMAND_STATUS_FAILED, COMMAND_STATUS_UNKNOWN, CONFIG_WINDOW_SIZE, UNMAPPED_SENTINEL,
};
use crate::common::{AccessSize, AlignmentFault, CpnError, CpnResult, Table};

/// Offset of the status byte (`0` ok, `0xFE` table command failed, `0xFF` unknown command).
pub const STATUS_OFFSET: u64 = 6;
/// Offset of the command byte; writing it runs the command.
pub const COMMAND_OFFSET: u64 = 7;
/// Offset of the 8-byte command argument.
pub const ARGUMENT_OFFSET: u64 = 8;
/// Offset of the 2-byte domain id register.
pub const DOMAIN_OFFSET: u64 = 16;
/// Offset of the 4-byte dest-addr register.
pub const DEST_ADDR_OFFSET: u64 = 20;
/// Offset of the 8-byte data register used by `G` and `S`.
pub const DATA_OFFSET: u64 = 24;

/// Built-in command: read one domain-keyed table cell into `data`.
pub const CMD_GET: u8 = b'G';
/// Built-in command: write `data` into one domain-keyed table cell.
pub const CMD_SET: u8 = b'S';

const WORD: u64 = 8;

/// Receiver of mailbox commands, supplied by the component that owns the control plane.
pub trait CommandHandler: Send {
    /// Executes `cmd`; returns `false` if the command is not understood.
    fn handle_command(&mut self, cmd: u8, argument: u64) -> bool;
}

/// Entry counts advertised in the ConfigWindow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    /// Parameter table entries.
    pub param_entries: u16,
    /// Statistics table entries.
    pub stat_entries: u16,
    /// Trigger table entries.
    pub trigger_entries: u16,
}

/// One cell addressed by the dest-addr register: a table and a row among the rows one
/// domain owns.
///
/// The register holds the table in bits 16..24 (`0` parameters, `1` statistics) and the
/// domain-relative row in bits 0..16.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCell {
    table: Table,
    row: u16,
}

impl TableCell {
    const TABLE_SHIFT: u32 = 16;
    const PARAMETER: u32 = 0;
    const STATISTIC: u32 = 1;

    /// Row `row` of a domain's parameters.
    pub const fn parameter(row: u16) -> Self {
        Self {
            table: Table::Parameter,
            row,
        }
    }

    /// Row `row` of a domain's statistics.
    pub const fn statistic(row: u16) -> Self {
        Self {
            table: Table::Statistic,
            row,
        }
    }

    /// Decodes a dest-addr register value.
    ///
    /// # Errors
    ///
    /// `InvalidValue` if the table selector names neither parameters nor statistics.
    pub fn decode(dest: u32) -> CpnResult<Self> {
        let row = (dest & 0xFFFF) as u16;
        match dest >> Self::TABLE_SHIFT {
            Self::PARAMETER => Ok(Self::parameter(row)),
            Self::STATISTIC => Ok(Self::statistic(row)),
            _ => Err(CpnError::InvalidValue {
                field: "dest_addr".to_owned(),
                value: u64::from(dest),
            }),
        }
    }

    /// Value to write to the dest-addr register.
    pub const fn dest(self) -> u32 {
        let table = match self.table {
            Table::Statistic => Self::STATISTIC,
            _ => Self::PARAMETER,
        };
        (table << Self::TABLE_SHIFT) | self.row as u32
    }

    /// Table holding the cell.
    pub const fn table(self) -> Table {
        self.table
    }

    /// Position among the domain's rows.
    pub const fn row(self) -> usize {
        self.row as usize
    }

    /// The error for a domain that owns no such row.
    pub const fn missing(self, domain: u16) -> CpnError {
        CpnError::NoDomainRow {
            table: self.table,
            domain,
            row: self.row as usize,
        }
    }
}

/// ConfigWindow register state.
pub struct ConfigRegs {
    geometry: Geometry,
    status: u8,
    command: u8,
    argument: u64,
    domain: u16,
    dest_addr: u32,
    data: u64,
    handler: Option<Box<dyn CommandHandler>>,
}

impl fmt::Debug for ConfigRegs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigRegs")
            .field("geometry", &self.geometry)
            .field("status", &self.status)
            .field("command", &self.command)
            .field("argument", &self.argument)
            .field("domain", &self.domain)
            .field("dest_addr", &self.dest_addr)
            .field("data", &self.data)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

impl ConfigRegs {
    /// Registers advertising `geometry`, with no handler installed.
    pub const fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            status: 0,
            command: 0,
            argument: 0,
            domain: 0,
            dest_addr: 0,
            data: 0,
            handler: None,
        }
    }

    /// Installs the command handler, replacing any previous one.
    pub fn set_handler(&mut self, handler: Box<dyn CommandHandler>) {
        self.handler = Some(handler);
    }

    /// Advertised geometry.
    pub const fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Status of the last command.
    pub const fn status(&self) -> u8 {
        self.status
    }

    /// Domain id register.
    pub const fn domain(&self) -> u16 {
        self.domain
    }

    /// Dest-addr register.
    pub const fn dest_addr(&self) -> u32 {
        self.dest_addr
    }

    /// Data register.
    pub const fn data(&self) -> u64 {
        self.data
    }

    fn word(&self, index: u64) -> [u8; 8] {
        let mut word = [0u8; 8];
        match index {
            0 => {
                store(&mut word, 0, AccessSize::Half, self.geometry.param_entries as u64);
                store(&mut word, 2, AccessSize::Half, self.geometry.stat_entries as u64);
                store(&mut word, 4, AccessSize::Half, self.geometry.trigger_entries as u64);
                word[STATUS_OFFSET as usize] = self.status;
                word[COMMAND_OFFSET as usize] = self.command;
            }
            1 => word = self.argument.to_le_bytes(),
            2 => {
                store(&mut word, 0, AccessSize::Half, self.domain as u64);
                store(&mut word, 4, AccessSize::Word, self.dest_addr as u64);
            }
            _ => word = self.data.to_le_bytes(),
        }
        word
    }

    fn check(offset: u64, size: AccessSize) -> CpnResult<()> {
        if offset + size.bytes() > CONFIG_WINDOW_SIZE {
            return Err(AlignmentFault::Register {
                offset,
                size: size.bytes(),
            }
            .into());
        }
        check_unit(offset, offset % WORD, WORD, size)
    }

    /// Reads `size` bytes at `offset`.
    ///
    /// # Errors
    ///
    /// `AlignmentError` if the access leaves the window or crosses an 8-byte word boundary.
    pub fn read(&self, offset: u64, size: AccessSize) -> CpnResult<u64> {
        Self::check(offset, size)?;
        Ok(load(&self.word(offset / WORD), offset % WORD, size))
    }

    /// Writes `size` bytes at `offset`. Returns the command byte when the write landed on
    /// the command register; running it is left to [`execute`].
    ///
    /// # Errors
    ///
    /// `AlignmentError` as for [`read`](Self::read); `ReadOnly` for geometry or status bytes.
    pub fn write(&mut self, offset: u64, size: AccessSize, value: u64) -> CpnResult<Option<u8>> {
        Self::check(offset, size)?;
        let unit = offset % WORD;
        let mut word = self.word(offset / WORD);
        store(&mut word, unit, size, value);
        match offset / WORD {
            0 => {
                if touches(unit, size, &(0..COMMAND_OFFSET)) {
                    return Err(CpnError::ReadOnly {
                        table: Table::Config,
                        offset,
                    });
                }
                return Ok(Some(word[COMMAND_OFFSET as usize]));
            }
            1 => self.argument = u64::from_le_bytes(word),
            2 => {
                self.domain = load(&word, 0, AccessSize::Half) as u16;
                self.dest_addr = load(&word, 4, AccessSize::Word) as u32;
            }
            _ => self.data = u64::from_le_bytes(word),
        }
        Ok(None)
    }

    fn finish(&mut self, cmd: u8, status: u8) {
        self.command = cmd;
        self.status = status;
    }

    fn dispatch(&mut self, cmd: u8) {
        let handled = self
            .handler
            .as_mut()
            .is_some_and(|h| h.handle_command(cmd, self.argument));
        if handled {
            debug!(cmd, argument = self.argument, "control plane command handled");
            self.finish(cmd, 0);
        } else {
            warn!(cmd, "unknown control plane command");
            self.finish(cmd, COMMAND_STATUS_UNKNOWN);
        }
    }
}

/// Runs `cmd` on `cp`: the table commands against its domain-keyed rows, anything else
/// through the installed handler.
pub fn execute<C: ControlPlane + ?Sized>(cp: &mut C, cmd: u8) {
    let regs = cp.core().regs();
    let (domain, dest, data) = (regs.domain, regs.dest_addr, regs.data);
    let outcome = match cmd {
        CMD_GET => match cp.query_table(domain, dest) {
            Ok(value) => {
                cp.core_mut().regs_mut().data = value;
                Ok(())
            }
            Err(e) => {
                cp.core_mut().regs_mut().data = UNMAPPED_SENTINEL;
                Err(e)
            }
        },
        CMD_SET => cp.update_table(domain, dest, data),
        _ => {
            cp.core_mut().regs_mut().dispatch(cmd);
            return;
        }
    };
    let regs = cp.core_mut().regs_mut();
    match outcome {
        Ok(()) => {
            debug!(cmd, domain, dest, data = regs.data, "table command done");
            regs.finish(cmd, 0);
        }
        Err(error) => {
            warn!(cmd, domain, dest, %error, "table command failed");
            regs.finish(cmd, COMMAND_STATUS_FAILED);
        }
    }
}
