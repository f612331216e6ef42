//! # Basic Control Plane Tests
//!
//! Identity validation and the read-only identity header.

use cpn_core::common::{AccessSize, CpnError, Table};
use cpn_core::config::ConfigError;
use cpn_core::cp::{BasicControlPlane, BindState, ControlPlane, ControlPlaneIdentity, IdentityHeader};
use rstest::rstest;

use crate::common::harness::identity;

// ══════════════════════════════════════════════════════════
// 1. Identity validation
// ══════════════════════════════════════════════════════════

#[test]
fn twelve_byte_ident_is_accepted() {
    let id = identity(b'S', "PARDg5vSysCP", 1, 2);
    assert_eq!(id.ident(), "PARDg5vSysCP");
    assert_eq!(id.base().val(), 0x0102_0000);
}

#[test]
fn thirteen_byte_ident_is_rejected() {
    let err = ControlPlaneIdentity::new(b'S', "ThirteenBytes", 0, 0).unwrap_err();
    assert!(matches!(err, ConfigError::IdentTooLong { len: 13, .. }));
}

#[test]
fn empty_and_non_ascii_idents_are_rejected() {
    assert!(matches!(
        ControlPlaneIdentity::new(b'S', "", 4, 5).unwrap_err(),
        ConfigError::EmptyIdent { device: 4, function: 5 }
    ));
    assert!(matches!(
        ControlPlaneIdentity::new(b'S', "café", 0, 0).unwrap_err(),
        ConfigError::InvalidIdent { .. }
    ));
}

#[rstest]
#[case(0x00)]
#[case(0xFF)]
fn reserved_type_codes_are_rejected(#[case] cp_type: u8) {
    let err = ControlPlaneIdentity::new(cp_type, "X", 0, 0).unwrap_err();
    assert!(matches!(err, ConfigError::ReservedType { .. }));
}

// ══════════════════════════════════════════════════════════
// 2. Header through the DataWindow
// ══════════════════════════════════════════════════════════

fn hello() -> BasicControlPlane {
    BasicControlPlane::new(identity(b'S', "HelloCP", 10, 0))
}

#[test]
fn data_window_is_the_header() {
    let cp = hello();
    assert_eq!(cp.data_window_size(), 16);
    assert_eq!(cp.read_data(0, AccessSize::Byte).unwrap(), u64::from(b'S'));

    let low = cp.read_data(0, AccessSize::Double).unwrap();
    let high = cp.read_data(8, AccessSize::Double).unwrap();
    let header = IdentityHeader::from_words(low, high);
    assert_eq!(header.ident(), "HelloCP");
    assert_eq!(header.device, 10);
    assert_eq!(header.function, 0);
    assert_eq!(header.reserved, 0);
}

#[test]
fn header_bytes_match_identity_encoding() {
    let cp = hello();
    let bytes = cp.identity().header().to_bytes();
    for (i, b) in bytes.iter().enumerate() {
        assert_eq!(cp.read_data(i as u64, AccessSize::Byte).unwrap(), u64::from(*b));
    }
}

#[test]
fn header_is_read_only() {
    let mut cp = hello();
    let err = cp.write_data(0, AccessSize::Byte, 0x41).unwrap_err();
    assert!(matches!(err, CpnError::ReadOnly { table: Table::Header, .. }));
    assert_eq!(cp.read_data(0, AccessSize::Byte).unwrap(), u64::from(b'S'));
}

#[test]
fn reads_past_the_header_are_alignment_errors() {
    let cp = hello();
    assert!(cp.read_data(12, AccessSize::Double).unwrap_err().is_alignment());
    assert!(cp.read_data(16, AccessSize::Byte).unwrap_err().is_alignment());
}

#[test]
fn bind_state_moves_once() {
    let mut cp = hello();
    assert_eq!(cp.bind_state(), BindState::Unbound);
    cp.mark_bound().unwrap();
    assert_eq!(cp.bind_state(), BindState::Bound);
    assert_eq!(
        cp.mark_bound().unwrap_err(),
        CpnError::AlreadyBound { device: 10, function: 0 }
    );
}
