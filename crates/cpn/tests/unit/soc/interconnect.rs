//! # Bus Interconnect Tests
//!
//! Device registration, address routing, and unclaimed accesses on the primary bus.

use cpn_core::common::{AccessSize, CpnError, Request};
use cpn_core::soc::interconnect::Bus;

use crate::common::mocks::memory::MockMemory;

const RAM_BASE: u64 = 0x8000_0000;

// ══════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════

fn make_bus_with_ram() -> Bus {
    let mut bus = Bus::new();
    bus.add_device(Box::new(MockMemory::new("RAM", RAM_BASE, 0x1000)))
        .unwrap();
    bus
}

// ══════════════════════════════════════════════════════════
// 1. Registration
// ══════════════════════════════════════════════════════════

#[test]
fn overlapping_devices_are_rejected() {
    let mut bus = make_bus_with_ram();
    let err = bus
        .add_device(Box::new(MockMemory::new("ROM", RAM_BASE + 0x800, 0x1000)))
        .unwrap_err();
    assert!(matches!(err, CpnError::RangeOverlap { ref name, .. } if name == "ROM"));
    assert_eq!(bus.device_names(), vec!["RAM"]);
}

#[test]
fn adjacent_devices_are_accepted() {
    let mut bus = make_bus_with_ram();
    bus.add_device(Box::new(MockMemory::new("ROM", RAM_BASE + 0x1000, 0x100)))
        .unwrap();
    assert_eq!(bus.device_names(), vec!["RAM", "ROM"]);
}

#[test]
fn empty_device_is_rejected() {
    let mut bus = Bus::new();
    assert!(bus.add_device(Box::new(MockMemory::new("NIL", 0x10, 0))).is_err());
}

#[test]
fn device_wrapping_the_address_space_is_rejected() {
    let mut bus = Bus::new();
    let err = bus
        .add_device(Box::new(MockMemory::new("TOP", u64::MAX - 3, 8)))
        .unwrap_err();
    assert!(matches!(err, CpnError::RangeOverlap { ref name, .. } if name == "TOP"));
}

#[test]
fn device_ending_at_the_top_of_the_address_space_is_routed() {
    let mut bus = make_bus_with_ram();
    bus.add_device(Box::new(MockMemory::new("TOP", u64::MAX - 0xF, 0x10)))
        .unwrap();
    bus.write_u64(u64::MAX - 7, 0x1122_3344).unwrap();
    assert_eq!(bus.read_u64(u64::MAX - 7).unwrap(), 0x1122_3344);
    assert!(bus.is_valid_address(u64::MAX));
    let err = bus
        .access(&Request::read(u64::MAX - 3, AccessSize::Double))
        .unwrap_err();
    assert!(err.is_alignment());

    let err = bus
        .add_device(Box::new(MockMemory::new("LOW", u64::MAX - 0x1F, 0x18)))
        .unwrap_err();
    assert!(matches!(err, CpnError::RangeOverlap { ref name, .. } if name == "LOW"));
}

// ══════════════════════════════════════════════════════════
// 2. Routing
// ══════════════════════════════════════════════════════════

#[test]
fn accesses_use_device_relative_offsets() {
    let mut bus = make_bus_with_ram();
    bus.write_u32(RAM_BASE + 0x10, 0xCAFE_BABE).unwrap();
    assert_eq!(bus.read_u32(RAM_BASE + 0x10).unwrap(), 0xCAFE_BABE);
    assert_eq!(bus.read_u16(RAM_BASE + 0x12).unwrap(), 0xCAFE);
    assert!(bus.is_valid_address(RAM_BASE + 0xFFF));
    assert!(!bus.is_valid_address(RAM_BASE + 0x1000));
}

#[test]
fn unclaimed_reads_return_all_ones() {
    let mut bus = make_bus_with_ram();
    assert_eq!(bus.read_u32(0x1000).unwrap(), 0xFFFF_FFFF);
    assert_eq!(bus.read_u64(0x1000).unwrap(), u64::MAX);
    bus.write_u64(0x1000, 5).unwrap();
}

#[test]
fn access_running_off_a_device_is_rejected() {
    let mut bus = make_bus_with_ram();
    let err = bus
        .access(&Request::read(RAM_BASE + 0xFFC, AccessSize::Double))
        .unwrap_err();
    assert!(err.is_alignment());
}
