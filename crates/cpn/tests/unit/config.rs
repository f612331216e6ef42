//! # Configuration Tests
//!
//! Defaults, JSON loading from disk, and validation failures.

use std::io::Write;

use cpn_core::config::{
    AdaptorConfig, Config, ConfigError, ControlPlaneConfig, CpKind, RemapperConfig, defaults,
};
use cpn_core::cp::{AttrKind, Comparator};
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

fn write_config(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

// ══════════════════════════════════════════════════════════
// 1. Defaults
// ══════════════════════════════════════════════════════════

#[test]
fn test_adaptor_defaults() {
    let a = AdaptorConfig::default();
    assert_eq!(a.selector_base, defaults::ADAPTOR_SELECTOR_BASE);
    assert_eq!(a.window_base, defaults::ADAPTOR_WINDOW_BASE);
    assert_eq!(a.window_size, 256);
}

#[test]
fn test_reference_control_planes() {
    let gen_cp = ControlPlaneConfig::gen_cp();
    assert_eq!((gen_cp.device, gen_cp.function, gen_cp.cp_type), (0, 0, b'G'));
    assert_eq!(gen_cp.parameters[2].kind, AttrKind::Flag);
    assert_eq!(gen_cp.triggers[0].comparator, Comparator::Gt);

    let hello = ControlPlaneConfig::hello_cp();
    assert_eq!((hello.device, hello.kind), (10, CpKind::Basic));
}

// ══════════════════════════════════════════════════════════
// 2. Loading
// ══════════════════════════════════════════════════════════

#[test]
fn test_load_from_file() {
    let file = write_config(
        r#"{
            "control_planes": [
                { "ident": "CacheCP", "cp_type": 67, "device": 3, "function": 1,
                  "parameters": [ { "name": "way_mask", "kind": "Mask", "default": 255 } ],
                  "statistics": [ { "name": "misses" } ],
                  "trigger_entries_nr": 2,
                  "triggers": [ { "stat_index": 0, "comparator": "Ge", "threshold": 10, "action": 2 } ] }
            ],
            "remappers": [
                { "name": "CACHE", "range_start": 2415919104, "range_size": 256, "device": 3, "function": 1 }
            ]
        }"#,
    );
    let config = Config::from_file(file.path()).unwrap();
    config.validate().unwrap();

    let cp = &config.control_planes[0];
    assert_eq!(cp.kind, CpKind::General);
    assert_eq!(cp.parameters[0].kind, AttrKind::Mask);
    assert_eq!(cp.triggers[0].threshold, 10);
    assert_eq!(config.adaptor, AdaptorConfig::default());
    assert_eq!(config.remappers[0].base(), 0x0301_0000);
}

#[test]
fn test_domain_tagged_rows_share_names() {
    let config = Config::from_json(
        r#"{
            "control_planes": [
                { "ident": "SysCP", "device": 5,
                  "parameters": [
                    { "name": "cpu_mask", "kind": "Mask", "default": 3, "domain": 1 },
                    { "name": "cpu_mask", "kind": "Mask", "default": 12, "domain": 2 }
                  ] }
            ]
        }"#,
    )
    .unwrap();
    config.validate().unwrap();
    assert_eq!(config.control_planes[0].parameters[1].domain, Some(2));

    let system = cpn_core::System::new(&config).unwrap();
    let cp = system.general("SysCP").unwrap();
    assert_eq!(cp.lock().param_for(2, 0).unwrap(), 12);
}

#[test]
fn test_cp_type_defaults_to_general() {
    let config = Config::from_json(r#"{ "control_planes": [ { "ident": "X", "device": 1 } ] }"#)
        .unwrap();
    assert_eq!(config.control_planes[0].cp_type, defaults::CP_TYPE);
    assert_eq!(config.control_planes[0].function, 0);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::from_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_malformed_json_is_parse_error() {
    let file = write_config("{ control_planes: ");
    assert!(matches!(Config::from_file(file.path()).unwrap_err(), ConfigError::Parse(_)));
}

#[test]
fn test_unknown_comparator_is_parse_error() {
    let json = r#"{ "control_planes": [ { "ident": "X", "device": 1,
        "statistics": [ { "name": "s" } ], "trigger_entries_nr": 1,
        "triggers": [ { "stat_index": 0, "comparator": "Between", "threshold": 1 } ] } ] }"#;
    assert!(matches!(Config::from_json(json).unwrap_err(), ConfigError::Parse(_)));
}

// ══════════════════════════════════════════════════════════
// 3. Validation
// ══════════════════════════════════════════════════════════

#[test]
fn test_ident_too_long_is_rejected() {
    let mut config = Config::default();
    config.control_planes[0].ident = "ThirteenBytes".to_owned();
    assert!(matches!(config.validate(), Err(ConfigError::IdentTooLong { .. })));
}

#[test]
fn test_reserved_type_is_rejected() {
    let mut config = Config::default();
    config.control_planes[1].cp_type = 0;
    assert!(matches!(config.validate(), Err(ConfigError::ReservedType { cp_type: 0, .. })));
}

#[test]
fn test_adaptor_window_sizes() {
    for size in [0, 12, 0x2_0000] {
        let config = Config {
            adaptor: AdaptorConfig { window_size: size, ..AdaptorConfig::default() },
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidAdaptorWindow { size: s }) if s == size
        ));
    }
}

fn remapper(name: &str, range_size: u64, offset: u64) -> RemapperConfig {
    RemapperConfig {
        name: name.to_owned(),
        range_start: 0x9000_0000,
        range_size,
        device: 0,
        function: 0,
        offset,
    }
}

#[test]
fn test_remapper_validation() {
    let cases = [
        (remapper("EMPTY", 0, 0), "empty range"),
        (remapper("WIDE", 0x100, 0xFFF0), "window leaves its target region"),
    ];
    for (r, expected) in cases {
        let config = Config { remappers: vec![r], ..Config::default() };
        match config.validate() {
            Err(ConfigError::InvalidRemapper { reason, .. }) => assert_eq!(reason, expected),
            other => panic!("unexpected {other:?}"),
        }
    }
}

#[test]
fn test_remapper_names_are_unique() {
    let config = Config {
        remappers: vec![remapper("A", 0x10, 0), remapper("A", 0x10, 0x100)],
        ..Config::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::InvalidRemapper { .. })));
}
