use std::path::PathBuf;

use crate::{
    error::{Result, SimError},
    paging::PolicyKind,
};

pub const DEFAULT_FRAME_COUNTS: [usize; 3] = [10, 50, 100];
pub const DEFAULT_POLICIES: [PolicyKind; 3] = PolicyKind::ALL;
/// Pages listed in each individual run report.
pub const DEFAULT_TOP_SHOWN: usize = 10;

#[derive(Clone, Debug, PartialEq)]
pub struct SimConfig {
    pub traces: Vec<PathBuf>,
    pub frame_counts: Vec<usize>,
    pub policies: Vec<PolicyKind>,
    /// Worker threads for the batch; `None` lets rayon decide.
    pub jobs: Option<usize>,
}

impl SimConfig {
    pub fn new(traces: Vec<PathBuf>) -> Self {
        Self {
            traces,
            frame_counts: DEFAULT_FRAME_COUNTS.to_vec(),
            policies: DEFAULT_POLICIES.to_vec(),
            jobs: None,
        }
    }

    pub fn with_frame_counts(mut self, frame_counts: Vec<usize>) -> Self {
        self.frame_counts = frame_counts;
        self
    }

    pub fn with_policies(mut self, policies: Vec<PolicyKind>) -> Self {
        self.policies = policies;
        self
    }

    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Rejects configurations that cannot produce a run.
    pub fn validate(&self) -> Result<()> {
        if self.traces.is_empty() {
            return Err(SimError::NoTraces);
        }
        if self.policies.is_empty() {
            return Err(SimError::NoPolicies);
        }
        if let Some(&bad) = self.frame_counts.iter().find(|&&frames| frames == 0) {
            return Err(SimError::InvalidFrameCount(bad));
        }
        Ok(())
    }

    /// (frame count, policy) pairs in the order their runs are reported.
    pub fn combinations(&self) -> impl Iterator<Item = (usize, PolicyKind)> + '_ {
        self.frame_counts
            .iter()
            .flat_map(|&frames| self.policies.iter().map(move |&policy| (frames, policy)))
    }
}
