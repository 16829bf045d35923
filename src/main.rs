use std::{
    fs::File,
    io::{self, BufWriter},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pagesim::{
    batch::run_batch,
    config::{DEFAULT_FRAME_COUNTS, DEFAULT_TOP_SHOWN, SimConfig},
    paging::PolicyKind,
    report::write_final_report,
    trace::write_trace,
    workload::{Workload, WorkloadConfig},
};

#[derive(Parser)]
#[command(
    name = "pagesim",
    version,
    about = "Replay memory traces under FIFO, LRU and OPT page replacement"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Simulate every trace under each frame count and policy
    Simulate(SimulateArgs),
    /// Write a synthetic trace with working-set locality
    Generate(GenerateArgs),
}

#[derive(Args)]
struct SimulateArgs {
    /// Trace files to replay
    #[arg(required = true)]
    traces: Vec<PathBuf>,
    /// Frame counts to simulate
    #[arg(long, num_args = 1.., default_values_t = DEFAULT_FRAME_COUNTS)]
    frames: Vec<usize>,
    /// Replacement policies to evaluate (fifo, lru, opt)
    #[arg(long, num_args = 1.., value_parser = parse_policy, default_values = ["fifo", "lru", "opt"])]
    policies: Vec<PolicyKind>,
    /// Worker threads (defaults to one per core)
    #[arg(long)]
    jobs: Option<usize>,
    /// Pages listed in each individual report
    #[arg(long, default_value_t = DEFAULT_TOP_SHOWN)]
    top: usize,
}

#[derive(Args)]
struct GenerateArgs {
    /// Where to write the trace
    output: PathBuf,
    /// Number of accesses
    #[arg(long, default_value_t = WorkloadConfig::default().length)]
    length: usize,
    /// Size of the address space in pages
    #[arg(long, default_value_t = WorkloadConfig::default().page_count)]
    pages: u64,
    /// Pages in the working set
    #[arg(long, default_value_t = WorkloadConfig::default().working_set_size)]
    working_set: usize,
    /// Accesses before the working set is redrawn
    #[arg(long, default_value_t = WorkloadConfig::default().working_set_lifespan)]
    working_set_lifespan: usize,
    /// Probability that an access targets the working set
    #[arg(long, default_value_t = WorkloadConfig::default().locality)]
    locality: f64,
    /// Probability that an access is a read
    #[arg(long, default_value_t = WorkloadConfig::default().read_ratio)]
    read_ratio: f64,
    /// Seed for a reproducible trace
    #[arg(long)]
    seed: Option<u64>,
}

fn parse_policy(s: &str) -> Result<PolicyKind, String> {
    s.parse().map_err(|e: pagesim::SimError| e.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Simulate(args) => run_simulate(args),
        Command::Generate(args) => run_generate(args),
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run_simulate(args: SimulateArgs) -> Result<()> {
    let config = SimConfig::new(args.traces)
        .with_frame_counts(args.frames)
        .with_policies(args.policies)
        .with_jobs(args.jobs);

    let outcome = run_batch(&config).context("Simulation could not start")?;
    for failure in &outcome.failures {
        eprintln!("error: {}", failure.error);
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    write_final_report(&mut out, &outcome, args.top).context("Failed to write report")?;
    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let config = WorkloadConfig {
        length: args.length,
        page_count: args.pages,
        working_set_size: args.working_set,
        working_set_lifespan: args.working_set_lifespan,
        locality: args.locality,
        read_ratio: args.read_ratio,
        seed: args.seed,
    };
    let workload = Workload::new(config)?;

    let file = File::create(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    let mut writer = BufWriter::new(file);
    let written = write_trace(&mut writer, workload)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    info!(output = %args.output.display(), accesses = written, "wrote synthetic trace");
    Ok(())
}
