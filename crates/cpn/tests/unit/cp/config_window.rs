//! # ConfigWindow Tests
//!
//! Table geometry, status, command dispatch, and the domain-keyed `G`/`S` table port
//! through the 32-byte register block.

use cpn_core::common::constants::{
    COMMAND_STATUS_FAILED, CONFIG_WINDOW_OFFSET, COMMAND_STATUS_UNKNOWN,
};
use cpn_core::common::{AccessSize, AlignmentFault, CpnError, Table, encode};
use cpn_core::cp::command::{
    ARGUMENT_OFFSET, CMD_GET, CMD_SET, COMMAND_OFFSET, DATA_OFFSET, DEST_ADDR_OFFSET,
    DOMAIN_OFFSET, STATUS_OFFSET,
};
use cpn_core::cp::{ControlPlane, GeneralControlPlane, TableCell, share};
use cpn_core::net::CpnAccess;
use mockall::predicate::eq;
use pretty_assertions::assert_eq;

use crate::common::harness::{basic_cp, counters_cp, domains_cp, dynamic, network};
use crate::common::mocks::handlers::MockHandler;

/// Loads the target registers and runs `cmd`; returns the status byte.
fn run(cp: &mut GeneralControlPlane, cmd: u8, domain: u16, cell: TableCell, data: u64) -> u64 {
    cp.write_config(DOMAIN_OFFSET, AccessSize::Half, u64::from(domain)).unwrap();
    cp.write_config(DEST_ADDR_OFFSET, AccessSize::Word, u64::from(cell.dest())).unwrap();
    cp.write_config(DATA_OFFSET, AccessSize::Double, data).unwrap();
    cp.write_config(COMMAND_OFFSET, AccessSize::Byte, u64::from(cmd)).unwrap();
    cp.read_config(STATUS_OFFSET, AccessSize::Byte).unwrap()
}

// ══════════════════════════════════════════════════════════
// 1. Geometry and mailbox
// ══════════════════════════════════════════════════════════

#[test]
fn geometry_is_reported_in_the_control_word() {
    let cp = counters_cp(2, 0);
    assert_eq!(cp.read_config(0, AccessSize::Half).unwrap(), 2);
    assert_eq!(cp.read_config(2, AccessSize::Half).unwrap(), 2);
    assert_eq!(cp.read_config(4, AccessSize::Half).unwrap(), 2);
    assert_eq!(cp.read_config(STATUS_OFFSET, AccessSize::Byte).unwrap(), 0);
}

#[test]
fn geometry_is_read_only() {
    let mut cp = counters_cp(2, 0);
    let err = cp.write_config(0, AccessSize::Half, 9).unwrap_err();
    assert_eq!(err, CpnError::ReadOnly { table: Table::Config, offset: 0 });
    assert_eq!(cp.geometry().param_entries, 2);
}

#[test]
fn command_reaches_the_handler_with_its_argument() {
    let mut cp = counters_cp(2, 0);
    let mut handler = MockHandler::new();
    let _ = handler
        .expect_handle_command()
        .with(eq(b'R'), eq(0xDEAD_BEEF))
        .times(1)
        .return_const(true);
    cp.set_command_handler(Box::new(handler));

    cp.write_config(ARGUMENT_OFFSET, AccessSize::Double, 0xDEAD_BEEF).unwrap();
    cp.write_config(COMMAND_OFFSET, AccessSize::Byte, u64::from(b'R')).unwrap();

    assert_eq!(cp.read_config(STATUS_OFFSET, AccessSize::Byte).unwrap(), 0);
    assert_eq!(cp.read_config(COMMAND_OFFSET, AccessSize::Byte).unwrap(), u64::from(b'R'));
    assert_eq!(cp.read_config(ARGUMENT_OFFSET, AccessSize::Double).unwrap(), 0xDEAD_BEEF);
}

#[test]
fn rejected_command_sets_unknown_status() {
    let mut cp = counters_cp(2, 0);
    let mut handler = MockHandler::new();
    let _ = handler.expect_handle_command().return_const(false);
    cp.set_command_handler(Box::new(handler));

    cp.write_config(COMMAND_OFFSET, AccessSize::Byte, 0x42).unwrap();
    assert_eq!(cp.read_config(STATUS_OFFSET, AccessSize::Byte).unwrap(), 0xFF);
}

#[test]
fn command_without_a_handler_is_unknown() {
    let mut cp = counters_cp(2, 0);
    cp.write_config(COMMAND_OFFSET, AccessSize::Byte, 1).unwrap();
    assert_eq!(cp.read_config(STATUS_OFFSET, AccessSize::Byte).unwrap(), 0xFF);
}

#[test]
fn accesses_outside_the_block_are_register_faults() {
    let cp = counters_cp(2, 0);
    assert_eq!(
        cp.read_config(32, AccessSize::Byte).unwrap_err(),
        CpnError::Alignment(AlignmentFault::Register { offset: 32, size: 1 })
    );
    assert!(cp.read_config(4, AccessSize::Double).unwrap_err().is_alignment());
    assert!(cp.read_config(DEST_ADDR_OFFSET, AccessSize::Double).unwrap_err().is_alignment());
}

// ══════════════════════════════════════════════════════════
// 2. Domain-keyed table port
// ══════════════════════════════════════════════════════════

#[test]
fn target_registers_read_back() {
    let mut cp = domains_cp(4, 0);
    cp.write_config(DOMAIN_OFFSET, AccessSize::Half, 2).unwrap();
    cp.write_config(DEST_ADDR_OFFSET, AccessSize::Word, 0x1_0003).unwrap();
    cp.write_config(DATA_OFFSET, AccessSize::Double, 0xABCD).unwrap();
    assert_eq!(cp.read_config(DOMAIN_OFFSET, AccessSize::Half).unwrap(), 2);
    assert_eq!(cp.read_config(DEST_ADDR_OFFSET, AccessSize::Word).unwrap(), 0x1_0003);
    assert_eq!(cp.read_config(DATA_OFFSET, AccessSize::Double).unwrap(), 0xABCD);
    assert_eq!(cp.core().regs().domain(), 2);
}

#[test]
fn get_reads_the_nth_parameter_of_a_domain() {
    let mut cp = domains_cp(4, 0);
    assert_eq!(run(&mut cp, CMD_GET, 1, TableCell::parameter(1), 0), 0);
    assert_eq!(cp.read_config(DATA_OFFSET, AccessSize::Double).unwrap(), 64);
    assert_eq!(cp.read_config(COMMAND_OFFSET, AccessSize::Byte).unwrap(), u64::from(CMD_GET));

    assert_eq!(run(&mut cp, CMD_GET, 2, TableCell::parameter(0), 0), 0);
    assert_eq!(cp.read_config(DATA_OFFSET, AccessSize::Double).unwrap(), 0xC);
}

#[test]
fn set_writes_only_the_addressed_domain() {
    let mut cp = domains_cp(4, 0);
    assert_eq!(run(&mut cp, CMD_SET, 2, TableCell::parameter(0), 0xF0), 0);
    assert_eq!(cp.param_for(2, 0).unwrap(), 0xF0);
    assert_eq!(cp.param_for(1, 0).unwrap(), 0x3);
    assert_eq!(cp.param(2).unwrap(), 0xF0);
}

#[test]
fn get_reads_statistics_kept_with_update_for() {
    let mut cp = domains_cp(4, 0);
    cp.update_for(2, 0, 5).unwrap();
    assert_eq!(run(&mut cp, CMD_GET, 2, TableCell::statistic(0), 0), 0);
    assert_eq!(cp.read_config(DATA_OFFSET, AccessSize::Double).unwrap(), 5);
    assert_eq!(cp.stat_for(1, 0).unwrap(), 0);
}

#[test]
fn get_for_a_missing_row_fails_and_clears_data() {
    let mut cp = domains_cp(4, 0);
    assert_eq!(
        run(&mut cp, CMD_GET, 2, TableCell::parameter(1), 7),
        u64::from(COMMAND_STATUS_FAILED)
    );
    assert_eq!(cp.read_config(DATA_OFFSET, AccessSize::Double).unwrap(), u64::MAX);
    assert_eq!(
        run(&mut cp, CMD_GET, 9, TableCell::statistic(0), 0),
        u64::from(COMMAND_STATUS_FAILED)
    );
}

#[test]
fn set_on_a_statistic_is_refused() {
    let mut cp = domains_cp(4, 0);
    assert_eq!(
        run(&mut cp, CMD_SET, 1, TableCell::statistic(0), 99),
        u64::from(COMMAND_STATUS_FAILED)
    );
    assert_eq!(cp.stat_for(1, 0).unwrap(), 0);
}

#[test]
fn bad_dest_table_fails() {
    let mut cp = domains_cp(4, 0);
    cp.write_config(DEST_ADDR_OFFSET, AccessSize::Word, 7 << 16).unwrap();
    cp.write_config(COMMAND_OFFSET, AccessSize::Byte, u64::from(CMD_GET)).unwrap();
    assert_eq!(
        cp.read_config(STATUS_OFFSET, AccessSize::Byte).unwrap(),
        u64::from(COMMAND_STATUS_FAILED)
    );
}

#[test]
fn table_commands_do_not_reach_the_handler() {
    let mut cp = domains_cp(4, 0);
    let mut handler = MockHandler::new();
    let _ = handler.expect_handle_command().times(0);
    cp.set_command_handler(Box::new(handler));
    assert_eq!(run(&mut cp, CMD_SET, 1, TableCell::parameter(1), 128), 0);
    assert_eq!(cp.param_for(1, 1).unwrap(), 128);
}

#[test]
fn basic_control_plane_fails_table_commands() {
    let shared = basic_cp("B", 1, 0);
    let mut cp = shared.lock();
    cp.write_config(COMMAND_OFFSET, AccessSize::Byte, u64::from(CMD_GET)).unwrap();
    assert_eq!(
        cp.read_config(STATUS_OFFSET, AccessSize::Byte).unwrap(),
        u64::from(COMMAND_STATUS_FAILED)
    );
    cp.write_config(COMMAND_OFFSET, AccessSize::Byte, u64::from(b'?')).unwrap();
    assert_eq!(
        cp.read_config(STATUS_OFFSET, AccessSize::Byte).unwrap(),
        u64::from(COMMAND_STATUS_UNKNOWN)
    );
}

#[test]
fn set_through_the_network_updates_the_row() {
    let cp = share(domains_cp(4, 0));
    let net = network(vec![dynamic(cp.clone())]);
    let config = encode(4, 0) + CONFIG_WINDOW_OFFSET;

    net.write_u16(config + DOMAIN_OFFSET, 1).unwrap();
    net.write_u32(config + DEST_ADDR_OFFSET, TableCell::parameter(0).dest()).unwrap();
    net.write_u64(config + DATA_OFFSET, 0xFF).unwrap();
    net.write_u8(config + COMMAND_OFFSET, CMD_SET).unwrap();

    assert_eq!(net.read_u8(config + STATUS_OFFSET).unwrap(), 0);
    assert_eq!(cp.lock().param_for(1, 0).unwrap(), 0xFF);
}
