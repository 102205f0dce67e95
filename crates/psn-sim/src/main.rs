use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    batch::{self, BatchArgs},
    check::{self, CheckArgs},
    doctor::{self, DoctorArgs},
    sweep::{self, SweepArgs},
    version::{self, VersionArgs},
};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "psn-sim", about = "Power-supply-noise sweeps over the Modest checker")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sweep one topology until convergence or the clock upper bound.
    Sweep(SweepArgs),
    /// Run every sweep of a YAML batch plan.
    Batch(BatchArgs),
    /// Check or simulate a single model once.
    Check(CheckArgs),
    /// Verify the checker is installed and report its version.
    Doctor(DoctorArgs),
    /// Print version information.
    Version(VersionArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Sweep(args) => sweep::run(&args),
        Command::Batch(args) => batch::run(&args),
        Command::Check(args) => check::run(&args),
        Command::Doctor(args) => doctor::run(&args),
        Command::Version(args) => version::run(&args),
    }
}
