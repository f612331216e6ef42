//! # Discovery Tests
//!
//! Full and partial scans of the `(device, function)` space, directly on the network and
//! through the adaptor.

use cpn_core::mgmt::{Presence, ScanEntry, discovery};
use pretty_assertions::assert_eq;

use crate::common::harness::{TestContext, basic_cp, dynamic, network};

fn present(entries: &[&ScanEntry]) -> Vec<(u8, u8, String)> {
    entries
        .iter()
        .map(|e| (e.device, e.function, e.ident().unwrap_or_default().to_owned()))
        .collect()
}

#[test]
fn full_scan_finds_exactly_the_reference_control_planes() {
    let ctx = TestContext::new();
    let report = discovery::scan(ctx.network()).unwrap();

    assert_eq!(report.len(), 65_536);
    assert_eq!(report.absent_count(), 65_534);
    let found: Vec<_> = report.present().collect();
    assert_eq!(
        present(&found),
        vec![(0, 0, "GenCP".to_owned()), (10, 0, "HelloCP".to_owned())]
    );
    assert_eq!(
        found[1].presence,
        Presence::Present { cp_type: b'S', ident: "HelloCP".to_owned() }
    );
}

#[test]
fn scan_through_the_driver_matches_the_direct_scan() {
    let ctx = TestContext::new();
    let direct = discovery::scan_range(ctx.network(), 0..=15, 0..=3).unwrap();
    let indirect = discovery::scan_range(&ctx.driver(), 0..=15, 0..=3).unwrap();
    assert_eq!(direct, indirect);
    assert_eq!(direct.present().count(), 2);
}

#[test]
fn probe_reports_absent_for_empty_addresses() {
    let net = network(vec![dynamic(basic_cp("Solo", 4, 2))]);
    assert_eq!(discovery::probe(&*net, 4, 3).unwrap(), Presence::Absent);
    assert_eq!(
        discovery::probe(&*net, 4, 2).unwrap(),
        Presence::Present { cp_type: b'S', ident: "Solo".to_owned() }
    );
}

#[test]
fn twelve_byte_idents_survive_the_scan() {
    let net = network(vec![dynamic(basic_cp("PARDg5vSysCP", 1, 0))]);
    let report = discovery::scan_range(&*net, 1..=1, 0..=0).unwrap();
    assert_eq!(report.entries[0].ident(), Some("PARDg5vSysCP"));
}

#[test]
fn scan_does_not_fault_on_an_empty_network() {
    let net = network(Vec::new());
    let report = discovery::scan_range(&*net, 0..=255, 0..=0).unwrap();
    assert_eq!(report.absent_count(), 256);
    assert!(!report.is_empty());
    assert_eq!(net.stats().snapshot().faults(), 0);
}
