use std::path::PathBuf;

use rayon::{ThreadPoolBuilder, prelude::*};
use tracing::{info, warn};

use crate::{
    config::SimConfig,
    engine,
    error::{Result, SimError},
    paging::PolicyKind,
    stats::{RunStatistics, Summary},
    trace::TraceFile,
};

#[derive(Clone, Debug)]
pub struct TraceSummary {
    pub name: String,
    pub lines: usize,
    pub references: usize,
}

#[derive(Clone, Debug)]
pub struct RunReport {
    pub trace: String,
    pub stats: RunStatistics,
}

#[derive(Debug)]
pub struct TraceFailure {
    pub trace: PathBuf,
    pub error: SimError,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub traces: Vec<TraceSummary>,
    pub runs: Vec<RunReport>,
    pub failures: Vec<TraceFailure>,
}
impl BatchOutcome {
    pub fn summary(&self) -> Summary {
        Summary::from_runs(self.runs.iter().map(|run| &run.stats))
    }
}

pub fn run_batch(config: &SimConfig) -> Result<BatchOutcome> {
    config.validate()?;
    match config.jobs {
        Some(jobs) => {
            let pool = ThreadPoolBuilder::new().num_threads(jobs).build()?;
            pool.install(|| execute(config))
        }
        None => execute(config),
    }
}

fn execute(config: &SimConfig) -> Result<BatchOutcome> {
    let mut outcome = BatchOutcome::default();
    let mut loaded = Vec::new();

    for path in &config.traces {
        match TraceFile::load(path) {
            Ok(trace) => {
                outcome.traces.push(TraceSummary {
                    name: trace.name(),
                    lines: trace.lines,
                    references: trace.references.len(),
                });
                loaded.push(trace);
            }
            Err(error) => {
                warn!(trace = %path.display(), %error, "skipping trace");
                outcome.failures.push(TraceFailure {
                    trace: path.clone(),
                    error,
                });
            }
        }
    }

    let jobs: Vec<(&TraceFile, usize, PolicyKind)> = loaded
        .iter()
        .flat_map(|trace| {
            config
                .combinations()
                .map(move |(frames, policy)| (trace, frames, policy))
        })
        .collect();

    outcome.runs = jobs
        .par_iter()
        .map(|&(trace, frames, policy)| -> Result<RunReport> {
            info!(trace = %trace.name(), %policy, frames, "running simulation");
            let stats = engine::run(&trace.references, frames, policy)?;
            Ok(RunReport {
                trace: trace.name(),
                stats,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(outcome)
}
