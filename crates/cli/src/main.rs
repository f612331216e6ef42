//! Control-plane network management CLI.
//!
//! This binary builds a system from configuration and acts as a management agent on it. It performs:
//! 1. **Scan:** Walk the `(device, function)` space and list the control planes found.
//! 2. **Read / write:** Single CPN accesses, through the adaptor or straight on the network.
//! 3. **Update:** Drive a statistic as its owning component would and report trigger firings.
//! 4. **Stats:** Print network traffic counters.

use std::error::Error;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cpn_core::common::{AccessSize, CpnAddr, Request};
use cpn_core::config::Config;
use cpn_core::cp::EventLog;
use cpn_core::mgmt::{Presence, discovery};
use cpn_core::{CpnAccess, System};

#[derive(Parser, Debug)]
#[command(
    name = "cpn",
    author,
    version,
    about = "Control-plane network management agent",
    long_about = "Build a control-plane network from a JSON config (or the built-in GenCP/HelloCP topology) and operate on it.\n\nAddresses are either raw (0x0a000010) or dd:ff+offset in hex (0a:00+0x10).\n\nExamples:\n  cpn scan\n  cpn read 00:00+0x10 --size 8\n  cpn write 00:00+0x18 0x40 --direct\n  cpn update GenCP mem_reads 150\n  cpn --config topo.json stats"
)]
struct Cli {
    /// JSON configuration file; the built-in topology is used when omitted.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Bypass the adaptor and access the network directly.
    #[arg(long, global = true)]
    direct: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every control plane on the network.
    Scan,

    /// Read one value.
    Read {
        /// CPN address.
        addr: String,
        /// Access width in bytes (1, 2, 4, or 8).
        #[arg(short, long, default_value_t = 8)]
        size: u64,
    },

    /// Write one value.
    Write {
        /// CPN address.
        addr: String,
        /// Value (decimal or 0x-prefixed hex).
        value: String,
        /// Access width in bytes (1, 2, 4, or 8).
        #[arg(short, long, default_value_t = 8)]
        size: u64,
    },

    /// Set a statistic on a general control plane and report which triggers fired.
    Update {
        /// IDENT of the control plane.
        ident: String,
        /// Statistic name.
        stat: String,
        /// New values, applied in order.
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// Scan, then print network statistics.
    Stats {
        /// Sections to print (traffic, errors); all when omitted.
        sections: Vec<String>,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let system = System::new(&config)?;
    let driver = system.driver();
    let access: &dyn CpnAccess = if cli.direct {
        &*system.network
    } else {
        &driver
    };

    match &cli.command {
        Commands::Scan => cmd_scan(access),
        Commands::Read { addr, size } => {
            let req = Request::read(parse_addr(addr)?, AccessSize::try_from(*size)?);
            let resp = access.access(&req)?;
            println!(
                "{} = {:#0width$x}{}",
                CpnAddr(req.addr),
                resp.data,
                if resp.unmapped { " (unmapped)" } else { "" },
                width = (*size as usize) * 2 + 2
            );
            Ok(())
        }
        Commands::Write { addr, value, size } => {
            let req = Request::write(
                parse_addr(addr)?,
                AccessSize::try_from(*size)?,
                parse_u64(value)?,
            );
            let resp = access.access(&req)?;
            if resp.unmapped {
                println!("{}: unmapped, write dropped", CpnAddr(req.addr));
            }
            Ok(())
        }
        Commands::Update {
            ident,
            stat,
            values,
        } => cmd_update(&system, ident, stat, values),
        Commands::Stats { sections } => {
            let _ = discovery::scan(access)?;
            system.network.stats().print_sections(sections);
            Ok(())
        }
    }
}

fn cmd_scan(access: &dyn CpnAccess) -> Result<(), Box<dyn Error>> {
    let report = discovery::scan(access)?;
    println!("DEV FUN  TYPE  IDENT");
    for entry in report.present() {
        if let Presence::Present { cp_type, ident } = &entry.presence {
            println!(
                " {:02x}  {:02x}  {:>4}  {}",
                entry.device,
                entry.function,
                printable(*cp_type),
                ident
            );
        }
    }
    println!(
        "{} present, {} absent",
        report.present().count(),
        report.absent_count()
    );
    Ok(())
}

fn cmd_update(
    system: &System,
    ident: &str,
    stat: &str,
    values: &[String],
) -> Result<(), Box<dyn Error>> {
    let handle = system
        .general(ident)
        .ok_or_else(|| format!("no general control plane named {ident}"))?;
    let log = EventLog::new();
    let mut cp = handle.lock();
    cp.set_action_handler(Box::new(log.clone()));
    let index = cp
        .statistics()
        .index_of(stat)
        .ok_or_else(|| format!("{ident} has no statistic {stat}"))?;

    for value in values {
        let value = parse_u64(value)?;
        let before = log.len();
        cp.update(index, value)?;
        println!("{ident}.{stat} = {value}: {} trigger(s) fired", log.len() - before);
    }
    for event in log.events() {
        println!(
            "  slot {} action {:#04x}: {} -> {}",
            event.slot, event.action, event.old, event.new
        );
    }
    Ok(())
}

fn printable(cp_type: u8) -> String {
    if cp_type.is_ascii_graphic() {
        format!("'{}'", cp_type as char)
    } else {
        format!("{cp_type:#04x}")
    }
}

fn parse_u64(s: &str) -> Result<u64, Box<dyn Error>> {
    let v = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16)?,
        None => s.parse()?,
    };
    Ok(v)
}

/// Parses `0x...`, a decimal address, or `dd:ff[+offset]` with hex fields.
fn parse_addr(s: &str) -> Result<u64, Box<dyn Error>> {
    let Some((dev, rest)) = s.split_once(':') else {
        return parse_u64(s);
    };
    let (fun, offset) = match rest.split_once('+') {
        Some((fun, off)) => (fun, parse_u64(off)?),
        None => (rest, 0),
    };
    let device = u8::from_str_radix(dev, 16)?;
    let function = u8::from_str_radix(fun, 16)?;
    let addr = CpnAddr::encode(device, function)
        .checked_add(offset)
        .ok_or_else(|| format!("address {s} overflows"))?;
    Ok(addr.val())
}
