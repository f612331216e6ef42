//! Trigger table entries and their evaluation policy.
//!
//! A trigger watches one statistic and runs an action when its condition becomes true.
//! The policy is edge-triggered: an entry fires on an update only when the condition was
//! false for the old value and is true for the new one. Repeating an update that keeps the
//! condition true does not fire again.
//!
//! # Descriptor layout
//!
//! ```text
//!  0            2      3      4              8                      16
//!  +------------+------+------+--------------+----------------------+
//!  | stat_index | cmp  | act  | fire_count   | threshold            |
//!  +------------+------+------+--------------+----------------------+
//! ```
//!
//! `fire_count` is read-only from the network side.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;
use zerocopy::byteorder::little_endian::{U16, U32, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Byte range of the descriptor the network side may not write.
pub const FIRE_COUNT_BYTES: std::ops::Range<u64> = 4..8;

/// Comparison applied between a statistic and a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
#[repr(u8)]
pub enum Comparator {
    /// Never holds; the entry is inactive.
    #[default]
    Disabled = 0,
    /// `value > threshold`.
    Gt = 1,
    /// `value >= threshold`.
    Ge = 2,
    /// `value < threshold`.
    Lt = 3,
    /// `value <= threshold`.
    Le = 4,
    /// `value == threshold`.
    Eq = 5,
    /// `value != threshold`.
    Ne = 6,
}

impl Comparator {
    /// Evaluates the comparison.
    pub const fn holds(self, value: u64, threshold: u64) -> bool {
        match self {
            Self::Disabled => false,
            Self::Gt => value > threshold,
            Self::Ge => value >= threshold,
            Self::Lt => value < threshold,
            Self::Le => value <= threshold,
            Self::Eq => value == threshold,
            Self::Ne => value != threshold,
        }
    }

    /// Wire code.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Decodes a wire code.
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::Disabled,
            1 => Self::Gt,
            2 => Self::Ge,
            3 => Self::Lt,
            4 => Self::Le,
            5 => Self::Eq,
            6 => Self::Ne,
            _ => return None,
        })
    }
}

/// One trigger: `statistic[stat_index] <comparator> threshold` runs `action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct TriggerEntry {
    /// Index of the watched statistic.
    pub stat_index: usize,
    /// Condition applied to the statistic.
    pub comparator: Comparator,
    /// Right-hand side of the condition.
    pub threshold: u64,
    /// Action code handed to the control plane's action handler.
    #[serde(default)]
    pub action: u8,
}

impl TriggerEntry {
    /// An entry firing `action` when statistic `stat_index` crosses into `comparator threshold`.
    pub const fn new(stat_index: usize, comparator: Comparator, threshold: u64, action: u8) -> Self {
        Self {
            stat_index,
            comparator,
            threshold,
            action,
        }
    }

    /// `true` if the entry is armed.
    pub const fn is_enabled(&self) -> bool {
        !matches!(self.comparator, Comparator::Disabled)
    }

    /// Edge condition: false for `old`, true for `new`.
    pub const fn fires(&self, old: u64, new: u64) -> bool {
        !self.comparator.holds(old, self.threshold) && self.comparator.holds(new, self.threshold)
    }
}

/// Wire layout of a trigger descriptor.
#[repr(C)]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned,
)]
pub struct TriggerDescriptor {
    /// Index of the watched statistic.
    pub stat_index: U16,
    /// Comparator wire code.
    pub comparator: u8,
    /// Action code.
    pub action: u8,
    /// Number of times this entry has fired.
    pub fire_count: U32,
    /// Threshold.
    pub threshold: U64,
}

impl TriggerDescriptor {
    /// Encodes an entry and its fire count.
    pub fn encode(entry: &TriggerEntry, fire_count: u32) -> Self {
        Self {
            stat_index: U16::new(entry.stat_index as u16),
            comparator: entry.comparator.code(),
            action: entry.action,
            fire_count: U32::new(fire_count),
            threshold: U64::new(entry.threshold),
        }
    }

    /// Returns the descriptor as its 16 wire bytes.
    pub fn to_bytes(self) -> [u8; 16] {
        zerocopy::transmute!(self)
    }

    /// Reinterprets 16 wire bytes as a descriptor.
    pub fn from_bytes(raw: [u8; 16]) -> Self {
        zerocopy::transmute!(raw)
    }

    /// Decodes the entry, or `None` for an unknown comparator code.
    pub fn entry(&self) -> Option<TriggerEntry> {
        Some(TriggerEntry {
            stat_index: self.stat_index.get() as usize,
            comparator: Comparator::from_code(self.comparator)?,
            threshold: self.threshold.get(),
            action: self.action,
        })
    }
}

/// What a firing trigger reports to its action handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerEvent {
    /// Trigger table slot that fired.
    pub slot: usize,
    /// Statistic that was updated.
    pub stat_index: usize,
    /// Action code of the entry.
    pub action: u8,
    /// Statistic value before the update.
    pub old: u64,
    /// Statistic value after the update.
    pub new: u64,
}

/// Receiver of trigger firings, supplied by the component that owns the control plane.
///
/// `fire` runs while the control plane's `FairMutex` is held by whoever called `update`.
/// An action must not access its own control plane through the network or the adaptor:
/// that request waits on the same lock and never completes. Record the event and act on it
/// after `update` returns instead (as [`EventLog`] does).
pub trait TriggerAction: Send {
    /// Runs the action for `event`; called synchronously from inside the update, under the
    /// control plane's lock.
    fn fire(&mut self, event: &TriggerEvent);
}

/// A `TriggerAction` that records every event; clones share one log.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<TriggerEvent>>>,
}

impl EventLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every event recorded so far, oldest first.
    pub fn events(&self) -> Vec<TriggerEvent> {
        self.events.lock().clone()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// `true` if nothing has fired.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl TriggerAction for EventLog {
    fn fire(&mut self, event: &TriggerEvent) {
        self.events.lock().push(*event);
    }
}
