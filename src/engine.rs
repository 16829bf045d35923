use std::time::Instant;

use tracing::debug;

use crate::{
    error::{Result, SimError},
    hardware::mmu::TranslationResult,
    memory::{Eviction, MemoryManager},
    paging::{Fifo, Lru, Opt, PageReplacementPolicy, PolicyKind},
    stats::{RunStatistics, StatsCollector},
    trace::Reference,
};

/// Replays references one at a time against a single frame pool.
pub struct Engine<P: PageReplacementPolicy> {
    pub mm: MemoryManager<P>,
    pub stats: StatsCollector,
    position: usize,
}

impl<P: PageReplacementPolicy> Engine<P> {
    pub fn new(frame_count: usize, policy: P) -> Result<Self> {
        if frame_count == 0 {
            return Err(SimError::InvalidFrameCount(frame_count));
        }
        Ok(Self {
            mm: MemoryManager::new(frame_count, policy),
            stats: StatsCollector::new(),
            position: 0,
        })
    }

    /// Index of the next reference in the replayed sequence.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn access(&mut self, reference: Reference) -> Result<AccessResult> {
        let position = self.position;
        self.position += 1;

        self.stats.record_access(&reference);
        // Lookahead must reflect "now" before the hit/fault decision.
        self.mm
            .policy_mut()
            .record_access(reference.vpn, position);

        let mm = &mut self.mm;
        let translation = mm.mmu.translate(
            &mm.page_table,
            &mut mm.frame_table,
            reference.vpn,
            reference.operation,
        );
        match translation {
            TranslationResult::Success(_) => {
                self.stats.record_hit();
                mm.policy_mut().record_hit(reference.vpn);
                Ok(AccessResult::Hit)
            }
            TranslationResult::PageFault => {
                self.stats.record_fault();
                let evicted = mm.handle_page_fault(reference.vpn, reference.operation)?;
                Ok(AccessResult::Miss { evicted })
            }
        }
    }

    pub fn replay(&mut self, references: &[Reference]) -> Result<()> {
        for &reference in references {
            self.access(reference)?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessResult {
    Hit,
    Miss { evicted: Option<Eviction> },
}

/// Runs one (frame count, policy) configuration over `references`.
pub fn run(references: &[Reference], frame_count: usize, policy: PolicyKind) -> Result<RunStatistics> {
    if frame_count == 0 {
        return Err(SimError::InvalidFrameCount(frame_count));
    }
    let started = Instant::now();
    match policy {
        PolicyKind::Fifo => run_with(references, frame_count, policy, Fifo::new(), started),
        PolicyKind::Lru => run_with(references, frame_count, policy, Lru::new(), started),
        PolicyKind::Opt => run_with(
            references,
            frame_count,
            policy,
            Opt::new(references),
            started,
        ),
    }
}

/// Like [`run`], with the policy given by name (`fifo`, `lru` or `opt`, any
/// case).
pub fn run_named(references: &[Reference], frame_count: usize, policy: &str) -> Result<RunStatistics> {
    let policy: PolicyKind = policy.parse()?;
    run(references, frame_count, policy)
}

fn run_with<P: PageReplacementPolicy>(
    references: &[Reference],
    frame_count: usize,
    kind: PolicyKind,
    policy: P,
    started: Instant,
) -> Result<RunStatistics> {
    let mut engine = Engine::new(frame_count, policy)?;
    engine.replay(references)?;

    let Engine { mm, stats, .. } = engine;
    let result = stats.finish(kind, frame_count, mm.stats, started.elapsed());
    debug!(
        policy = %kind,
        frames = frame_count,
        accesses = result.accesses,
        faults = result.faults,
        evictions = result.evictions,
        "run finished"
    );
    Ok(result)
}
