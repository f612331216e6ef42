//! Typed attribute descriptor tables.
//!
//! Parameter and statistics tables are declared once, at configuration time, as ordered
//! lists of named descriptors. Declaration order is index order. `AttrSchema` checks the
//! list eagerly (non-empty names unique within their domain, bounded count) so the running
//! network never interprets attribute names.
//!
//! A row may be tagged with the logical domain (DSid) it belongs to. Domain-keyed lookups
//! address the `n`th row a domain owns, so the same attribute can be declared once per
//! domain.

use serde::Deserialize;

use crate::common::Table;
use crate::common::constants::{MAX_ATTR_NAME_LEN, MAX_TABLE_ENTRIES};
use crate::common::error::CpnError;
use crate::config::ConfigError;

/// Value type carried by an attribute slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum AttrKind {
    /// Any 64-bit value.
    #[default]
    Value,
    /// A bit mask (e.g. a CPU or way mask); any 64-bit value.
    Mask,
    /// A boolean switch; only `0` and `1` are accepted.
    Flag,
}

impl AttrKind {
    /// Checks that `value` is legal for this kind.
    ///
    /// # Errors
    ///
    /// `InvalidValue` naming `field` if a `Flag` receives anything but 0 or 1.
    pub fn check(self, field: &str, value: u64) -> Result<(), CpnError> {
        match self {
            Self::Flag if value > 1 => Err(CpnError::InvalidValue {
                field: field.to_owned(),
                value,
            }),
            _ => Ok(()),
        }
    }
}

/// Shared view of a named, typed descriptor.
pub trait Attribute {
    /// Attribute name, unique within its table.
    fn name(&self) -> &str;
    /// Value type.
    fn kind(&self) -> AttrKind;
    /// Initial slot value.
    fn initial(&self) -> u64;
    /// Owning domain, if the row is domain-keyed.
    fn domain(&self) -> Option<u16>;
}

/// Descriptor of one tunable parameter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ParameterAttr {
    /// Parameter name.
    pub name: String,
    /// Value type.
    #[serde(default)]
    pub kind: AttrKind,
    /// Value after reset.
    #[serde(default)]
    pub default: u64,
    /// Owning domain.
    #[serde(default)]
    pub domain: Option<u16>,
}

impl ParameterAttr {
    /// A `Value` parameter defaulting to zero.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            kind: AttrKind::Value,
            default: 0,
            domain: None,
        }
    }

    /// Sets the value type.
    #[must_use]
    pub const fn with_kind(mut self, kind: AttrKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the reset value.
    #[must_use]
    pub const fn with_default(mut self, default: u64) -> Self {
        self.default = default;
        self
    }

    /// Tags the row with its owning domain.
    #[must_use]
    pub const fn with_domain(mut self, domain: u16) -> Self {
        self.domain = Some(domain);
        self
    }
}

impl Attribute for ParameterAttr {
    fn name(&self) -> &str {
        &self.name
    }
    fn kind(&self) -> AttrKind {
        self.kind
    }
    fn initial(&self) -> u64 {
        self.default
    }
    fn domain(&self) -> Option<u16> {
        self.domain
    }
}

/// Descriptor of one observed statistic.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatisticAttr {
    /// Statistic name.
    pub name: String,
    /// Value type.
    #[serde(default)]
    pub kind: AttrKind,
    /// Owning domain.
    #[serde(default)]
    pub domain: Option<u16>,
}

impl StatisticAttr {
    /// A `Value` statistic.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            kind: AttrKind::Value,
            domain: None,
        }
    }

    /// Tags the row with its owning domain.
    #[must_use]
    pub const fn with_domain(mut self, domain: u16) -> Self {
        self.domain = Some(domain);
        self
    }
}

impl Attribute for StatisticAttr {
    fn name(&self) -> &str {
        &self.name
    }
    fn kind(&self) -> AttrKind {
        self.kind
    }
    fn initial(&self) -> u64 {
        0
    }
    fn domain(&self) -> Option<u16> {
        self.domain
    }
}

/// An ordered, validated list of attribute descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrSchema<A> {
    table: Table,
    attrs: Vec<A>,
}

impl<A: Attribute> AttrSchema<A> {
    /// Validates and freezes a descriptor list.
    ///
    /// # Errors
    ///
    /// Empty or over-long names, a name repeated within one domain, or more than
    /// `MAX_TABLE_ENTRIES` entries.
    pub fn new(table: Table, attrs: Vec<A>) -> Result<Self, ConfigError> {
        if attrs.len() > MAX_TABLE_ENTRIES {
            return Err(ConfigError::TooManyEntries {
                table,
                count: attrs.len(),
            });
        }
        for (i, attr) in attrs.iter().enumerate() {
            let name = attr.name();
            if name.is_empty() {
                return Err(ConfigError::EmptyAttrName { table, index: i });
            }
            if name.len() > MAX_ATTR_NAME_LEN {
                return Err(ConfigError::AttrNameTooLong {
                    name: name.to_owned(),
                });
            }
            if attrs[..i]
                .iter()
                .any(|a| a.name() == name && a.domain() == attr.domain())
            {
                return Err(ConfigError::DuplicateAttr {
                    table,
                    name: name.to_owned(),
                });
            }
        }
        Ok(Self { table, attrs })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    /// `true` when the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Descriptor at `index`.
    pub fn get(&self, index: usize) -> Option<&A> {
        self.attrs.get(index)
    }

    /// Index of the first descriptor named `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.attrs.iter().position(|a| a.name() == name)
    }

    /// Index of the `row`th descriptor owned by `domain`.
    pub fn domain_row(&self, domain: u16, row: usize) -> Option<usize> {
        self.attrs
            .iter()
            .enumerate()
            .filter(|(_, a)| a.domain() == Some(domain))
            .nth(row)
            .map(|(i, _)| i)
    }

    /// Which table this schema describes.
    pub const fn table(&self) -> Table {
        self.table
    }

    /// Iterates descriptors in index order.
    pub fn iter(&self) -> impl Iterator<Item = &A> + '_ {
        self.attrs.iter()
    }

    /// Initial slot values in index order.
    pub fn initial_values(&self) -> Vec<u64> {
        self.attrs.iter().map(Attribute::initial).collect()
    }
}
