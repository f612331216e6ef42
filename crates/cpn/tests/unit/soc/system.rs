//! # System Assembly Tests
//!
//! Building the primary bus, the network, and the adaptor from configuration.

use cpn_core::common::{AccessSize, Request, encode};
use cpn_core::config::{Config, ConfigError, ControlPlaneConfig, CpKind, RemapperConfig};
use cpn_core::cp::{BindState, ControlPlane};
use cpn_core::net::CpnAccess;
use cpn_core::soc::SystemControlPlane;
use pretty_assertions::assert_eq;

use crate::common::harness::TestContext;

#[test]
fn default_system_binds_both_reference_control_planes() {
    let ctx = TestContext::new();
    assert_eq!(ctx.network().connectors().len(), 2);
    assert!(ctx.network().connector(0, 0).is_some());
    assert!(ctx.network().connector(10, 0).is_some());
    for cp in &ctx.system.control_planes {
        assert_eq!(cp.shared().lock().bind_state(), BindState::Bound);
    }
}

#[test]
fn bus_carries_both_adaptor_ports() {
    let ctx = TestContext::new();
    assert_eq!(ctx.system.bus.device_names(), vec!["CPA.BAR0", "CPA.BAR1"]);
}

#[test]
fn control_planes_are_found_by_ident() {
    let ctx = TestContext::new();
    assert!(matches!(
        ctx.system.control_plane("HelloCP"),
        Some(SystemControlPlane::Basic(_))
    ));
    assert!(ctx.system.general("HelloCP").is_none());
    assert_eq!(ctx.gen_cp().lock().identity().ident(), "GenCP");
    assert!(ctx.system.control_plane("Nobody").is_none());
}

#[test]
fn gen_cp_layout_is_visible_on_the_network() {
    let ctx = TestContext::new();
    let net = ctx.network();
    assert_eq!(net.read_u64(encode(0, 0) + 16).unwrap(), u64::MAX);
    assert_eq!(net.read_u64(encode(0, 0) + 24).unwrap(), 128 << 20);
    assert_eq!(net.read_u64(encode(0, 0) + 32).unwrap(), 1);
}

#[test]
fn remappers_are_placed_on_the_bus() {
    let config = Config {
        remappers: vec![RemapperConfig {
            name: "GEN".to_owned(),
            range_start: 0x9000_0000,
            range_size: 0x100,
            device: 0,
            function: 0,
            offset: 0,
        }],
        ..Config::default()
    };
    let mut ctx = TestContext::with_config(&config);
    assert_eq!(ctx.system.bus.read_u8(0x9000_0000).unwrap(), b'G');
    let resp = ctx
        .system
        .bus
        .access(&Request::read(0x9000_0001, AccessSize::Byte))
        .unwrap();
    assert_eq!(resp.data, u64::from(b'G'));
}

#[test]
fn duplicate_identity_fails_the_build() {
    let mut twin = ControlPlaneConfig::hello_cp();
    twin.ident = "Twin".to_owned();
    let config = Config {
        control_planes: vec![ControlPlaneConfig::hello_cp(), twin],
        ..Config::default()
    };
    let err = cpn_core::System::new(&config).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::DuplicateIdentity { device: 10, function: 0, .. }
    ));
}

#[test]
fn basic_kind_with_tables_fails_the_build() {
    let mut cp = ControlPlaneConfig::gen_cp();
    cp.kind = CpKind::Basic;
    let config = Config {
        control_planes: vec![cp],
        ..Config::default()
    };
    assert!(matches!(
        cpn_core::System::new(&config).unwrap_err(),
        ConfigError::BasicWithTables { .. }
    ));
}

#[test]
fn remapper_overlapping_the_adaptor_fails_the_build() {
    let config = Config {
        remappers: vec![RemapperConfig {
            name: "BAD".to_owned(),
            range_start: 0x4000_0000,
            range_size: 0x10,
            device: 0,
            function: 0,
            offset: 0,
        }],
        ..Config::default()
    };
    assert!(matches!(
        cpn_core::System::new(&config).unwrap_err(),
        ConfigError::Bind(_)
    ));
}

#[test]
fn adaptor_selector_at_the_top_of_the_bus_fails_the_build() {
    let mut config = Config::default();
    config.adaptor.selector_base = u64::MAX - 3;
    assert!(matches!(
        cpn_core::System::new(&config).unwrap_err(),
        ConfigError::AdaptorRange { port: "selector", base, size: 4 } if base == u64::MAX - 3
    ));
}

#[test]
fn adaptor_window_at_the_top_of_the_bus_fails_the_build() {
    let mut config = Config::default();
    config.adaptor.window_base = u64::MAX - 0x7F;
    assert!(matches!(
        cpn_core::System::new(&config).unwrap_err(),
        ConfigError::AdaptorRange { port: "window", .. }
    ));
}
