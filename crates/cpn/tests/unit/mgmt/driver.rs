//! # Adaptor Driver Tests
//!
//! Select-then-access serialization and transparency of the driver.

use std::thread;

use cpn_core::common::{AccessSize, Request, encode};
use cpn_core::net::CpnAccess;
use cpn_core::soc::devices::AdaptorState;

use crate::common::harness::TestContext;

#[test]
fn driver_reads_match_network_reads() {
    let ctx = TestContext::new();
    let driver = ctx.driver();
    for addr in [encode(0, 0), encode(0, 0) + 24, encode(10, 0) + 8] {
        assert_eq!(
            driver.read_u64(addr).unwrap(),
            ctx.network().read_u64(addr).unwrap(),
            "{addr:#x}"
        );
    }
}

#[test]
fn driver_reuses_a_covering_selection() {
    let ctx = TestContext::new();
    let driver = ctx.driver();
    let _ = driver.read_u64(encode(0, 0) + 16).unwrap();
    let _ = driver.read_u64(encode(0, 0) + 24).unwrap();
    assert_eq!(
        driver.adaptor().state(),
        AdaptorState::Selected(encode(0, 0) + 16)
    );
}

#[test]
fn addresses_beyond_the_cpn_space_are_unmapped() {
    let ctx = TestContext::new();
    let resp = ctx
        .driver()
        .access(&Request::read(1 << 32, AccessSize::Double))
        .unwrap();
    assert!(resp.unmapped);
    assert_eq!(resp.data, u64::MAX);
}

#[test]
fn driver_writes_reach_the_control_plane() {
    let ctx = TestContext::new();
    ctx.driver().write_u64(encode(0, 0) + 24, 1 << 30).unwrap();
    assert_eq!(ctx.gen_cp().lock().param_by_name("mem_quota"), Some(1 << 30));
}

#[test]
fn concurrent_drivers_never_mix_targets() {
    let ctx = TestContext::new();
    let threads: Vec<_> = [(encode(0, 0) + 1, b'G'), (encode(10, 0) + 1, b'H')]
        .into_iter()
        .map(|(addr, expected)| {
            let driver = ctx.driver();
            thread::spawn(move || {
                for _ in 0..500 {
                    assert_eq!(driver.read_u8(addr).unwrap(), expected);
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }
}
