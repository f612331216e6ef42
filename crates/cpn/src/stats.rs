//! Network traffic statistics.
//!
//! This module counts what the network routes. It provides:
//! 1. **Traffic:** Reads, writes, and bytes moved in each direction.
//! 2. **Misses:** Requests answered with the unmapped sentinel.
//! 3. **Faults:** Requests rejected with an error, split into alignment and other faults.
//!
//! Counters are atomics so the network can be shared behind an `Arc` and served from several
//! callers at once.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::common::{CpnError, Request, Response};

/// Live counters owned by a `ControlPlaneNetwork`.
#[derive(Debug, Default)]
pub struct NetworkStats {
    reads: AtomicU64,
    writes: AtomicU64,
    bytes_read: AtomicU64,
    bytes_written: AtomicU64,
    unmapped: AtomicU64,
    alignment_faults: AtomicU64,
    other_faults: AtomicU64,
}

/// Point-in-time copy of [`NetworkStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Read requests seen.
    pub reads: u64,
    /// Write requests seen.
    pub writes: u64,
    /// Bytes returned by mapped reads.
    pub bytes_read: u64,
    /// Bytes accepted by mapped writes.
    pub bytes_written: u64,
    /// Requests nobody claimed.
    pub unmapped: u64,
    /// Requests rejected with an alignment error.
    pub alignment_faults: u64,
    /// Requests rejected with any other error.
    pub other_faults: u64,
}

impl StatsSnapshot {
    /// All rejected requests.
    pub const fn faults(&self) -> u64 {
        self.alignment_faults + self.other_faults
    }

    /// All requests.
    pub const fn requests(&self) -> u64 {
        self.reads + self.writes
    }
}

fn bump(counter: &AtomicU64, by: u64) {
    let _ = counter.fetch_add(by, Ordering::Relaxed);
}

impl NetworkStats {
    /// Zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accounts for one routed request and its outcome.
    pub fn record(&self, req: &Request, outcome: &Result<Response, CpnError>) {
        bump(if req.is_write { &self.writes } else { &self.reads }, 1);
        match outcome {
            Ok(resp) if resp.unmapped => bump(&self.unmapped, 1),
            Ok(_) if req.is_write => bump(&self.bytes_written, req.size.bytes()),
            Ok(_) => bump(&self.bytes_read, req.size.bytes()),
            Err(e) if e.is_alignment() => bump(&self.alignment_faults, 1),
            Err(_) => bump(&self.other_faults, 1),
        }
    }

    /// Copies the current counter values.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            unmapped: self.unmapped.load(Ordering::Relaxed),
            alignment_faults: self.alignment_faults.load(Ordering::Relaxed),
            other_faults: self.other_faults.load(Ordering::Relaxed),
        }
    }

    /// Renders the requested sections (`"traffic"`, `"errors"`); all of them if `sections`
    /// is empty.
    pub fn render_sections(&self, sections: &[String]) -> String {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let s = self.snapshot();
        let total = s.requests().max(1);
        let pct = |n: u64| n as f64 / total as f64 * 100.0;
        let mut out = String::new();

        let _ = writeln!(out, "\n==========================================================");
        let _ = writeln!(out, "CONTROL-PLANE NETWORK STATISTICS");
        let _ = writeln!(out, "==========================================================");
        if want("traffic") {
            let _ = writeln!(out, "cpn.requests             {}", s.requests());
            let _ = writeln!(out, "cpn.reads                {}", s.reads);
            let _ = writeln!(out, "cpn.writes               {}", s.writes);
            let _ = writeln!(out, "cpn.bytes_read           {}", s.bytes_read);
            let _ = writeln!(out, "cpn.bytes_written        {}", s.bytes_written);
            let _ = writeln!(out, "----------------------------------------------------------");
        }
        if want("errors") {
            let _ = writeln!(out, "ERRORS");
            let _ = writeln!(out, "  unmapped               {} ({:.2}%)", s.unmapped, pct(s.unmapped));
            let _ = writeln!(
                out,
                "  faults.alignment       {} ({:.2}%)",
                s.alignment_faults,
                pct(s.alignment_faults)
            );
            let _ = writeln!(
                out,
                "  faults.other           {} ({:.2}%)",
                s.other_faults,
                pct(s.other_faults)
            );
        }
        let _ = writeln!(out, "==========================================================");
        out
    }

    /// Prints the requested sections to stdout.
    pub fn print_sections(&self, sections: &[String]) {
        print!("{}", self.render_sections(sections));
    }

    /// Prints all sections to stdout.
    ///
    /// Equivalent to `print_sections(&[])`.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}
