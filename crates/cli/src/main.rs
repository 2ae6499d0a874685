//! RV32I out-of-order simulator CLI.
//!
//! Loads a text hex memory image from a file (or standard input when no
//! path is given), runs it to completion on the out-of-order core, prints
//! the decimal exit code on standard output, and exits with that code.

use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tomasim_core::sim::loader;
use tomasim_core::{Config, Simulator};

#[derive(Parser, Debug)]
#[command(
    name = "tomasim",
    author,
    version,
    about = "Cycle-accurate RV32I simulator with a Tomasulo out-of-order engine",
    long_about = "Runs a text hex memory image to completion and reports the program's \
exit code (the low 8 bits of a0 at the termination trap).\n\n\
Examples:\n  tomasim testcases/naive.data\n  tomasim < testcases/naive.data\n  \
RUST_LOG=tomasim_core=debug tomasim --dump-registers dump.txt prog.data"
)]
struct Cli {
    /// Hex memory image to execute; read from stdin when omitted.
    image: Option<PathBuf>,

    /// Write a per-commit register trace to this file.
    #[arg(long)]
    dump_registers: Option<String>,

    /// Safety cap on simulated cycles.
    #[arg(long)]
    cycle_limit: Option<u64>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config {
        dump_registers: cli.dump_registers,
        ..Config::default()
    };
    if let Some(limit) = cli.cycle_limit {
        config.cycle_limit = limit;
    }

    let image = match &cli.image {
        Some(path) => loader::load_image_file(path),
        None => loader::load_image(BufReader::new(io::stdin().lock())),
    };
    let image = image.unwrap_or_else(|e| {
        eprintln!("error: {}", e);
        process::exit(1);
    });

    let code = Simulator::new(image, &config)
        .and_then(|mut sim| sim.run())
        .unwrap_or_else(|e| {
            eprintln!("error: {}", e);
            process::exit(1);
        });

    println!("{}", code);
    process::exit(code as i32);
}
