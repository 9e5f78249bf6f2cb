//! Simulation statistics collection and reporting.
//!
//! This module tracks what a program run did. It provides:
//! 1. **Instruction mix:** Retired instructions by class (ALU, load, store, branch, stack, system).
//! 2. **Control flow:** Taken branches, calls and returns.
//! 3. **Memory traffic:** Demand reads and writes issued and their accumulated latency.
//! 4. **Report:** A sectioned text report that also pulls per-level counters from the
//!    memory hierarchy.

use std::fmt::Write as _;
use std::time::Instant;

use crate::isa::instruction::InstrClass;
use crate::soc::MemoryHierarchy;

/// Executor statistics.
#[derive(Clone, Debug)]
pub struct SimStats {
    start_time: Instant,
    /// Number of instructions retired.
    pub instructions_retired: u64,

    /// Register-only arithmetic, logic and compare instructions retired.
    pub inst_alu: u64,
    /// Loads (`mov reg, [mem]`) retired.
    pub inst_load: u64,
    /// Stores (`mov [mem], src`) retired.
    pub inst_store: u64,
    /// Jumps, calls and returns retired.
    pub inst_branch: u64,
    /// Pushes and pops retired.
    pub inst_stack: u64,
    /// Flush, dump, nop and halt retired.
    pub inst_system: u64,

    /// Branches that transferred control.
    pub branches_taken: u64,

    /// Demand reads issued to the hierarchy.
    pub mem_reads: u64,
    /// Demand writes issued to the hierarchy.
    pub mem_writes: u64,
    /// Sum of the latencies of every demand access, in nanoseconds.
    pub mem_latency_ns: u64,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            instructions_retired: 0,
            inst_alu: 0,
            inst_load: 0,
            inst_store: 0,
            inst_branch: 0,
            inst_stack: 0,
            inst_system: 0,
            branches_taken: 0,
            mem_reads: 0,
            mem_writes: 0,
            mem_latency_ns: 0,
        }
    }
}

/// Section names for selective stats output.
///
/// Valid section identifiers: `"summary"`, `"instruction_mix"`, `"memory"`.
/// Pass an empty slice to `print_sections` to print all sections.
pub const STATS_SECTIONS: &[&str] = &["summary", "instruction_mix", "memory"];

const RULE: &str = "==========================================================";
const THIN_RULE: &str = "----------------------------------------------------------";

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

impl SimStats {
    /// Counts one retired instruction of `class`.
    pub const fn retire(&mut self, class: InstrClass) {
        self.instructions_retired += 1;
        match class {
            InstrClass::Alu => self.inst_alu += 1,
            InstrClass::Load => self.inst_load += 1,
            InstrClass::Store => self.inst_store += 1,
            InstrClass::Branch => self.inst_branch += 1,
            InstrClass::Stack => self.inst_stack += 1,
            InstrClass::System => self.inst_system += 1,
        }
    }

    /// Mean latency of a demand access in nanoseconds, 0 when none were issued.
    pub fn avg_access_latency(&self) -> f64 {
        let accesses = self.mem_reads + self.mem_writes;
        if accesses == 0 {
            0.0
        } else {
            self.mem_latency_ns as f64 / accesses as f64
        }
    }

    /// Renders the requested sections.
    ///
    /// Each element of `sections` should be one of [`STATS_SECTIONS`]; unknown names are
    /// ignored. An empty slice renders every section.
    pub fn render_sections(&self, sections: &[String], memory: &MemoryHierarchy) -> String {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let mut out = String::new();

        if want("summary") {
            let seconds = self.start_time.elapsed().as_secs_f64();
            let _ = writeln!(out, "{RULE}");
            let _ = writeln!(out, "MEMORY HIERARCHY SIMULATION STATISTICS");
            let _ = writeln!(out, "{RULE}");
            let _ = writeln!(out, "host_seconds             {seconds:.4} s");
            let _ = writeln!(out, "sim_insts                {}", self.instructions_retired);
            let _ = writeln!(out, "mem.reads                {}", self.mem_reads);
            let _ = writeln!(out, "mem.writes               {}", self.mem_writes);
            let _ = writeln!(out, "mem.latency_ns           {}", self.mem_latency_ns);
            let _ = writeln!(
                out,
                "mem.avg_latency_ns       {:.2}",
                self.avg_access_latency()
            );
            let _ = writeln!(out, "{THIN_RULE}");
        }
        if want("instruction_mix") {
            let total = self.instructions_retired;
            let _ = writeln!(out, "INSTRUCTION MIX");
            for (name, count) in [
                ("alu", self.inst_alu),
                ("load", self.inst_load),
                ("store", self.inst_store),
                ("branch", self.inst_branch),
                ("stack", self.inst_stack),
                ("system", self.inst_system),
            ] {
                let _ = writeln!(
                    out,
                    "  op.{name:<19} {count} ({:.2}%)",
                    percent(count, total)
                );
            }
            let _ = writeln!(
                out,
                "  branches.taken         {} ({:.2}%)",
                self.branches_taken,
                percent(self.branches_taken, self.inst_branch)
            );
            let _ = writeln!(out, "{THIN_RULE}");
        }
        if want("memory") {
            let _ = writeln!(out, "MEMORY HIERARCHY");
            for level in memory.levels() {
                let s = level.stats();
                let _ = writeln!(
                    out,
                    "  {:<6} accesses: {:<8} | hits: {:<8} | misses: {:<8} | hit_rate: {:.2}%",
                    level.name(),
                    s.lookups(),
                    s.hits(),
                    s.misses(),
                    s.hit_rate() * 100.0
                );
                let _ = writeln!(
                    out,
                    "         reads: {}/{} | writes: {}/{} | fills: {} | evictions: {} | writebacks: {} | {:?}, {} ns",
                    s.read_hits,
                    s.read_hits + s.read_misses,
                    s.write_hits,
                    s.write_hits + s.write_misses,
                    s.fills,
                    s.evictions,
                    s.writebacks,
                    level.policy(),
                    level.latency()
                );
            }
            let store = memory.main_store();
            let _ = writeln!(
                out,
                "  memory reads: {:<11} | writes: {:<8} | {} ns",
                store.stats().reads,
                store.stats().writes,
                store.latency()
            );
        }
        let _ = writeln!(out, "{RULE}");
        out
    }

    /// Prints the requested sections to stdout. See [`Self::render_sections`].
    pub fn print_sections(&self, sections: &[String], memory: &MemoryHierarchy) {
        print!("{}", self.render_sections(sections, memory));
    }

    /// Prints all statistics sections to stdout.
    ///
    /// Equivalent to `print_sections(&[], memory)`.
    pub fn print(&self, memory: &MemoryHierarchy) {
        self.print_sections(&[], memory);
    }
}
