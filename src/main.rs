use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use mpos_sim::{sim::workload, Machine, SystemConfig};

#[derive(Parser)]
#[command(
    name = "mpos-sim",
    about = "Simulate a multiprogramming OS: admission, SRTF dispatch and memory deadlock recovery",
    version
)]
struct Cli {
    /// TOML configuration file; flags below override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for the workload generator.
    #[arg(short, long)]
    seed: Option<u64>,

    #[arg(long)]
    total_memory: Option<u64>,

    #[arg(long)]
    os_memory: Option<u64>,

    /// Print every machine event as it happens.
    #[arg(long)]
    events: bool,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => SystemConfig::from_file(path)?,
        None => SystemConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.workload.seed = Some(seed);
    }
    if let Some(total) = cli.total_memory {
        config.total_memory = total;
    }
    if let Some(os) = cli.os_memory {
        config.os_memory = os;
    }
    let jobs = workload::generate(&config.workload)?;
    tracing::info!(jobs = jobs.len(), "workload generated");

    let mut machine = Machine::new(&config)?;
    machine
        .submit(jobs)
        .context("workload does not fit this machine")?;
    machine.boot();

    if cli.events {
        loop {
            let now = machine.now();
            for event in machine.drain_events() {
                println!("t={now} {event:?}");
            }
            if !machine.step() {
                break;
            }
        }
        for event in machine.drain_events() {
            println!("t={} {event:?}", machine.now());
        }
    } else {
        machine.run_to_completion();
    }

    println!("{}", machine.report());
    Ok(())
}
