//! Configuration for a control-plane network and its primary-system attachments.
//!
//! This module defines everything fixed at system-build time. It provides:
//! 1. **Defaults:** Adaptor placement and window size, default control plane type.
//! 2. **Structures:** Control planes (identity and tables), the adaptor, and remappers.
//! 3. **Validation:** Every configuration error is caught before anything is bound.
//!
//! Configuration is supplied as JSON (`Config::from_json` / `Config::from_file`) or taken from
//! `Config::default()`, which builds the reference two control plane topology.

use std::collections::HashSet;
use std::io;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::common::constants::{REGION_SIZE, SLOT_SIZE};
use crate::common::{CpnError, Table};
use crate::cp::{
    AttrKind, Comparator, ControlPlaneIdentity, GeneralControlPlane, GeneralLayout,
    ParameterAttr, StatisticAttr, TriggerEntry,
};
use crate::soc::devices::adaptor::SELECTOR_SIZE;

/// Default configuration constants.
pub mod defaults {
    /// Primary-bus address of the adaptor's selector register.
    pub const ADAPTOR_SELECTOR_BASE: u64 = 0x4000_0000;

    /// Primary-bus address of the adaptor's data window.
    pub const ADAPTOR_WINDOW_BASE: u64 = 0x4000_1000;

    /// Size of the adaptor's data window in bytes.
    ///
    /// Large enough to reach the identity header and the first tables of any control plane
    /// from a single selector value.
    pub const ADAPTOR_WINDOW_SIZE: u64 = 256;

    /// Type code of a general control plane (`'G'`).
    pub const CP_TYPE: u8 = b'G';
}

/// Errors raised while loading or validating a configuration, or while building a system.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A control plane with an empty IDENT.
    #[error("control plane {device:02x}:{function:02x} has an empty IDENT")]
    EmptyIdent {
        /// Device id.
        device: u8,
        /// Function id.
        function: u8,
    },
    /// IDENT containing non-ASCII or NUL bytes.
    #[error("IDENT {ident:?} must be printable ASCII")]
    InvalidIdent {
        /// Offending IDENT.
        ident: String,
    },
    /// IDENT longer than 12 bytes.
    #[error("IDENT {ident:?} is {len} bytes, at most 12 allowed")]
    IdentTooLong {
        /// Offending IDENT.
        ident: String,
        /// Its length.
        len: usize,
    },
    /// Type code `0x00` or `0xFF`.
    #[error("{ident}: type code {cp_type:#04x} is reserved")]
    ReservedType {
        /// IDENT of the control plane.
        ident: String,
        /// Rejected type code.
        cp_type: u8,
    },
    /// Two control planes configured at the same `(device, function)`.
    #[error("control planes {first} and {second} both claim {device:02x}:{function:02x}")]
    DuplicateIdentity {
        /// IDENT of the first claimant.
        first: String,
        /// IDENT of the second claimant.
        second: String,
        /// Device id.
        device: u8,
        /// Function id.
        function: u8,
    },
    /// A table with too many entries.
    #[error("{table} table has {count} entries, at most 256 allowed")]
    TooManyEntries {
        /// Table concerned.
        table: Table,
        /// Declared entry count.
        count: usize,
    },
    /// An attribute with an empty name.
    #[error("{table} attribute {index} has an empty name")]
    EmptyAttrName {
        /// Table concerned.
        table: Table,
        /// Declaration index.
        index: usize,
    },
    /// An attribute name over 32 bytes.
    #[error("attribute name {name:?} is too long")]
    AttrNameTooLong {
        /// Offending name.
        name: String,
    },
    /// Two attributes with the same name in one table.
    #[error("{table} attribute {name:?} declared twice")]
    DuplicateAttr {
        /// Table concerned.
        table: Table,
        /// Repeated name.
        name: String,
    },
    /// More initial triggers than trigger slots.
    #[error("{ident}: {count} triggers configured for {slots} slots")]
    TooManyTriggers {
        /// IDENT of the control plane.
        ident: String,
        /// Configured triggers.
        count: usize,
        /// Available slots.
        slots: usize,
    },
    /// An enabled trigger watching a statistic that does not exist.
    #[error("trigger {slot} watches missing statistic {stat_index}")]
    TriggerStat {
        /// Trigger slot.
        slot: usize,
        /// Statistic index named by the trigger.
        stat_index: usize,
    },
    /// A DataWindow that would run into the ConfigWindow.
    #[error("{ident}: data window of {size:#x} bytes does not fit its region")]
    WindowTooLarge {
        /// IDENT of the control plane.
        ident: String,
        /// Computed window size.
        size: u64,
    },
    /// Tables declared on a basic (header-only) control plane.
    #[error("{ident}: basic control planes carry no tables")]
    BasicWithTables {
        /// IDENT of the control plane.
        ident: String,
    },
    /// Adaptor data window of unusable size.
    #[error("adaptor window size {size:#x} must be a non-zero multiple of 8 no larger than a region")]
    InvalidAdaptorWindow {
        /// Configured size.
        size: u64,
    },
    /// Adaptor port whose range runs past the end of the bus address space.
    #[error("adaptor {port} at {base:#x} (+{size:#x}) wraps the bus address space")]
    AdaptorRange {
        /// `"selector"` or `"window"`.
        port: &'static str,
        /// Configured base.
        base: u64,
        /// Port size.
        size: u64,
    },
    /// Remapper whose target does not fit inside one region.
    #[error("remapper {name}: {reason}")]
    InvalidRemapper {
        /// Remapper name.
        name: String,
        /// What is wrong with it.
        reason: &'static str,
    },
    /// Binding a validated configuration failed.
    #[error("bind failed: {0}")]
    Bind(#[from] CpnError),
    /// Malformed JSON.
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// Config file could not be read.
    #[error("config read error: {0}")]
    Io(#[from] io::Error),
}

/// Flavour of control plane to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum CpKind {
    /// Identity header only.
    Basic,
    /// Parameter, statistics, and trigger tables.
    #[default]
    General,
}

/// Top-level configuration.
///
/// # Example
///
/// ```
/// use cpn_core::config::{Config, CpKind};
///
/// let json = r#"{
///     "control_planes": [
///         { "ident": "MemCP", "cp_type": 77, "device": 2,
///           "parameters": [ { "name": "quota", "default": 64 } ],
///           "statistics": [ { "name": "reads" } ] },
///         { "ident": "HelloCP", "device": 10, "kind": "Basic" }
///     ],
///     "adaptor": { "window_size": 128 }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.control_planes[0].parameters[0].default, 64);
/// assert_eq!(config.control_planes[1].kind, CpKind::Basic);
/// assert_eq!(config.adaptor.window_size, 128);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Control planes to bind, in bind order.
    #[serde(default)]
    pub control_planes: Vec<ControlPlaneConfig>,
    /// The primary-bus adaptor.
    #[serde(default)]
    pub adaptor: AdaptorConfig,
    /// Direct windows into the network.
    #[serde(default)]
    pub remappers: Vec<RemapperConfig>,
}

impl Default for Config {
    /// GenCP at `0:0` and HelloCP at `10:0`, one adaptor, no remappers.
    fn default() -> Self {
        Self {
            control_planes: vec![ControlPlaneConfig::gen_cp(), ControlPlaneConfig::hello_cp()],
            adaptor: AdaptorConfig::default(),
            remappers: Vec::new(),
        }
    }
}

impl Config {
    /// Parses a JSON configuration.
    ///
    /// # Errors
    ///
    /// `Parse` if the text is not a valid configuration document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, `Parse` if it is malformed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Checks the whole configuration without binding anything.
    ///
    /// # Errors
    ///
    /// The first problem found, in declaration order.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen: Vec<(u8, u8, &str)> = Vec::new();
        for cp in &self.control_planes {
            let _ = cp.identity()?;
            if let Some(&(_, _, first)) = seen
                .iter()
                .find(|(d, f, _)| *d == cp.device && *f == cp.function)
            {
                return Err(ConfigError::DuplicateIdentity {
                    first: first.to_owned(),
                    second: cp.ident.clone(),
                    device: cp.device,
                    function: cp.function,
                });
            }
            seen.push((cp.device, cp.function, &cp.ident));
            match cp.kind {
                CpKind::Basic if cp.has_tables() => {
                    return Err(ConfigError::BasicWithTables {
                        ident: cp.ident.clone(),
                    });
                }
                CpKind::Basic => {}
                CpKind::General => {
                    let _ = GeneralControlPlane::new(cp.identity()?, cp.layout())?;
                }
            }
        }

        self.adaptor.validate()?;

        let mut names = HashSet::new();
        for remapper in &self.remappers {
            remapper.validate()?;
            if !names.insert(remapper.name.as_str()) {
                return Err(ConfigError::InvalidRemapper {
                    name: remapper.name.clone(),
                    reason: "name used twice",
                });
            }
        }
        Ok(())
    }
}

/// One control plane: identity plus table declarations.
#[derive(Debug, Clone, Deserialize)]
pub struct ControlPlaneConfig {
    /// IDENT string, at most 12 ASCII bytes.
    pub ident: String,
    /// Category code.
    #[serde(default = "ControlPlaneConfig::default_cp_type")]
    pub cp_type: u8,
    /// Device id.
    pub device: u8,
    /// Function id.
    #[serde(default)]
    pub function: u8,
    /// Variant to build.
    #[serde(default)]
    pub kind: CpKind,
    /// Parameter table, in index order.
    #[serde(default)]
    pub parameters: Vec<ParameterAttr>,
    /// Statistics table, in index order.
    #[serde(default)]
    pub statistics: Vec<StatisticAttr>,
    /// Trigger table size.
    #[serde(default)]
    pub trigger_entries_nr: usize,
    /// Initial trigger entries.
    #[serde(default)]
    pub triggers: Vec<TriggerEntry>,
}

impl ControlPlaneConfig {
    /// Returns the default type code.
    fn default_cp_type() -> u8 {
        defaults::CP_TYPE
    }

    /// The reference general control plane at `0:0`.
    pub fn gen_cp() -> Self {
        Self {
            ident: "GenCP".to_owned(),
            cp_type: defaults::CP_TYPE,
            device: 0,
            function: 0,
            kind: CpKind::General,
            parameters: vec![
                ParameterAttr::new("cpu_mask")
                    .with_kind(AttrKind::Mask)
                    .with_default(u64::MAX),
                ParameterAttr::new("mem_quota").with_default(128 << 20),
                ParameterAttr::new("enable")
                    .with_kind(AttrKind::Flag)
                    .with_default(1),
            ],
            statistics: vec![StatisticAttr::new("mem_reads"), StatisticAttr::new("mem_writes")],
            trigger_entries_nr: 4,
            triggers: vec![TriggerEntry::new(0, Comparator::Gt, 100, 1)],
        }
    }

    /// The reference basic control plane at `10:0`.
    pub fn hello_cp() -> Self {
        Self {
            ident: "HelloCP".to_owned(),
            cp_type: b'S',
            device: 10,
            function: 0,
            kind: CpKind::Basic,
            parameters: Vec::new(),
            statistics: Vec::new(),
            trigger_entries_nr: 0,
            triggers: Vec::new(),
        }
    }

    /// Validated identity.
    ///
    /// # Errors
    ///
    /// Bad IDENT or reserved type code.
    pub fn identity(&self) -> Result<ControlPlaneIdentity, ConfigError> {
        ControlPlaneIdentity::new(self.cp_type, &self.ident, self.device, self.function)
    }

    /// Table declarations for a general control plane.
    pub fn layout(&self) -> GeneralLayout {
        GeneralLayout {
            parameters: self.parameters.clone(),
            statistics: self.statistics.clone(),
            trigger_entries_nr: self.trigger_entries_nr,
            triggers: self.triggers.clone(),
        }
    }

    fn has_tables(&self) -> bool {
        !self.parameters.is_empty()
            || !self.statistics.is_empty()
            || self.trigger_entries_nr != 0
            || !self.triggers.is_empty()
    }
}

/// Placement of the selector+window adaptor on the primary bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AdaptorConfig {
    /// Bus address of the 4-byte selector register.
    #[serde(default = "AdaptorConfig::default_selector_base")]
    pub selector_base: u64,
    /// Bus address of the data window.
    #[serde(default = "AdaptorConfig::default_window_base")]
    pub window_base: u64,
    /// Data window size in bytes.
    #[serde(default = "AdaptorConfig::default_window_size")]
    pub window_size: u64,
}

impl AdaptorConfig {
    /// Returns the default selector register address.
    fn default_selector_base() -> u64 {
        defaults::ADAPTOR_SELECTOR_BASE
    }

    /// Returns the default data window address.
    fn default_window_base() -> u64 {
        defaults::ADAPTOR_WINDOW_BASE
    }

    /// Returns the default data window size.
    fn default_window_size() -> u64 {
        defaults::ADAPTOR_WINDOW_SIZE
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let size = self.window_size;
        if size == 0 || size % SLOT_SIZE != 0 || size > REGION_SIZE {
            return Err(ConfigError::InvalidAdaptorWindow { size });
        }
        for (port, base, size) in [
            ("selector", self.selector_base, SELECTOR_SIZE),
            ("window", self.window_base, self.window_size),
        ] {
            if base.checked_add(size).is_none() {
                return Err(ConfigError::AdaptorRange { port, base, size });
            }
        }
        Ok(())
    }
}

impl Default for AdaptorConfig {
    fn default() -> Self {
        Self {
            selector_base: defaults::ADAPTOR_SELECTOR_BASE,
            window_base: defaults::ADAPTOR_WINDOW_BASE,
            window_size: defaults::ADAPTOR_WINDOW_SIZE,
        }
    }
}

/// A direct, translated window from the primary bus into one control plane's region.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemapperConfig {
    /// Device name on the primary bus.
    pub name: String,
    /// First primary-bus address of the window.
    pub range_start: u64,
    /// Window size in bytes.
    pub range_size: u64,
    /// Target device id.
    pub device: u8,
    /// Target function id.
    #[serde(default)]
    pub function: u8,
    /// Offset inside the target region where the window starts.
    #[serde(default)]
    pub offset: u64,
}

impl RemapperConfig {
    /// CPN address the first byte of the window maps to.
    pub const fn base(&self) -> u64 {
        crate::common::encode(self.device, self.function) + self.offset
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let reason = if self.range_size == 0 {
            "empty range"
        } else if self.range_start.checked_add(self.range_size).is_none() {
            "range wraps the bus address space"
        } else if self.offset.saturating_add(self.range_size) > REGION_SIZE {
            "window leaves its target region"
        } else {
            return Ok(());
        };
        Err(ConfigError::InvalidRemapper {
            name: self.name.clone(),
            reason,
        })
    }
}
