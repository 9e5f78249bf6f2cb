//! Cache hierarchy simulator CLI.
//!
//! This binary provides a single entry point for all simulation modes. It performs:
//! 1. **Program run:** Parse an assembly program, run it against the configured hierarchy,
//!    and report statistics, the access trace and the final cache contents.
//! 2. **Config dump:** Print the effective configuration as JSON, to use as a template.
//! 3. **Disassembly:** Print a parsed program with resolved labels.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use memsim_core::config::Config;
use memsim_core::sim::{Simulator, load_program};
use memsim_core::stats::STATS_SECTIONS;

#[derive(Parser, Debug)]
#[command(
    name = "memsim",
    author,
    version,
    about = "Two-level cache hierarchy simulator",
    long_about = "Run assembly programs against a configurable stack of set-associative caches.\n\nConfiguration is JSON; `memsim config` prints the defaults.\n\nExamples:\n  memsim run programs/sum.asm --stats memory\n  memsim run programs/sum.asm --config wb.json --trace --dump\n  memsim config > cfg.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a program.
    Run {
        /// Assembly source file.
        program: PathBuf,

        /// JSON configuration file (defaults when omitted).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Record and print every memory access; raises logging to debug.
        #[arg(long)]
        trace: bool,

        /// Print the cache contents after the run.
        #[arg(long)]
        dump: bool,

        /// Statistics sections to print (comma separated; all when empty).
        #[arg(long, value_delimiter = ',', num_args = 0..)]
        stats: Option<Vec<String>>,

        /// Override `general.max_steps`.
        #[arg(long)]
        max_steps: Option<u64>,
    },

    /// Print the effective configuration as JSON.
    Config {
        /// JSON configuration file to validate and echo.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the parsed program.
    Disasm {
        /// Assembly source file.
        program: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Run { trace: true, .. });
    init_logging(verbose);

    let result = match cli.command {
        Commands::Run {
            program,
            config,
            trace,
            dump,
            stats,
            max_steps,
        } => cmd_run(&program, config.as_deref(), trace, dump, stats, max_steps),
        Commands::Config { config } => cmd_config(config.as_deref()),
        Commands::Disasm { program } => cmd_disasm(&program),
    };

    if let Err(e) = result {
        eprintln!("\n[!] FATAL: {e}");
        process::exit(1);
    }
}

/// Installs the `tracing` subscriber. `RUST_LOG` wins over the default level.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<Config, String> {
    match path {
        Some(p) => {
            debug!(path = %p.display(), "loading configuration");
            Config::from_json_file(p).map_err(|e| format!("{}: {e}", p.display()))
        }
        None => Ok(Config::default()),
    }
}

/// Runs a program to completion and prints the requested reports.
///
/// On an execution fault the registers and statistics are still printed before the
/// error is returned.
fn cmd_run(
    program: &Path,
    config: Option<&Path>,
    trace: bool,
    dump: bool,
    stats: Option<Vec<String>>,
    max_steps: Option<u64>,
) -> Result<(), String> {
    let mut config = load_config(config)?;
    if trace {
        config.general.trace_accesses = true;
    }
    if let Some(steps) = max_steps {
        config.general.max_steps = steps;
    }
    if let Some(unknown) = stats
        .iter()
        .flatten()
        .find(|s| !STATS_SECTIONS.contains(&s.as_str()))
    {
        return Err(format!(
            "unknown stats section `{unknown}` (expected one of: {})",
            STATS_SECTIONS.join(", ")
        ));
    }

    let parsed = load_program(program).map_err(|e| e.to_string())?;
    let mut sim = Simulator::new(&config, parsed).map_err(|e| e.to_string())?;

    println!("[*] Running {}", program.display());
    let outcome = sim.run();

    if trace {
        println!("\n  step   pc  op  addr   value       lvl   lat   instruction");
        for entry in sim.trace() {
            println!("{entry}");
        }
    }
    if dump {
        println!("\n{}", sim.memory.snapshot());
    }
    println!("\n[*] Registers: {}  flags: {}", sim.cpu.regs, sim.cpu.flags);
    sim.cpu
        .stats
        .print_sections(stats.as_deref().unwrap_or_default(), &sim.memory);

    outcome.map_err(|e| e.to_string())
}

fn cmd_config(path: Option<&Path>) -> Result<(), String> {
    let config = load_config(path)?;
    let json = serde_json::to_string_pretty(&config).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}

fn cmd_disasm(path: &Path) -> Result<(), String> {
    let program = load_program(path).map_err(|e| e.to_string())?;
    for segment in program.data() {
        println!(
            "        .data {} {}",
            segment.base,
            segment
                .values
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ")
        );
    }
    for (pc, instruction) in program.instructions().iter().enumerate() {
        for (name, _) in program.labels().iter().filter(|&(_, &at)| at == pc) {
            println!("{name}:");
        }
        println!("  {pc:>4}  {instruction}");
    }
    Ok(())
}
