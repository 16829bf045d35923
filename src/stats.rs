use std::{collections::HashMap, time::Duration};

use crate::{
    hardware::mmu::Operation,
    memory::MemoryStats,
    paging::{PolicyKind, Vpn},
    trace::Reference,
};

pub const BASE_MEMORY_ACCESS_NS: f64 = 100.0;
pub const PAGE_FAULT_SERVICE_NS: f64 = 10_000_000.0;
/// Number of pages kept in a run's frequency ranking.
pub const TOP_PAGES: usize = 20;

/// Memory latency blended with the fault penalty, weighted by `fault_rate`
/// (a percentage).
pub fn effective_access_time(fault_rate: f64) -> f64 {
    BASE_MEMORY_ACCESS_NS + (fault_rate / 100.0) * PAGE_FAULT_SERVICE_NS
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageFrequency {
    pub vpn: Vpn,
    pub count: u64,
}

/// Access counts per page, remembered in first-seen order so that ranking
/// ties are resolved the same way on every run.
#[derive(Clone, Debug, Default)]
pub struct FrequencyTable {
    counts: Vec<PageFrequency>,
    index: HashMap<Vpn, usize>,
}
impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, vpn: Vpn, count: u64) {
        match self.index.get(&vpn) {
            Some(&idx) => self.counts[idx].count += count,
            None => {
                self.index.insert(vpn, self.counts.len());
                self.counts.push(PageFrequency { vpn, count });
            }
        }
    }

    pub fn get(&self, vpn: Vpn) -> u64 {
        self.index
            .get(&vpn)
            .map_or(0, |&idx| self.counts[idx].count)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Highest counts first; equal counts keep first-seen order.
    pub fn top(&self, n: usize) -> Vec<PageFrequency> {
        let mut ranked = self.counts.clone();
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(n);
        ranked
    }
}

#[derive(Debug, Default)]
pub struct StatsCollector {
    pub accesses: u64,
    pub hits: u64,
    pub faults: u64,
    pub reads: u64,
    pub writes: u64,
    pub frequency: FrequencyTable,
}
impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_access(&mut self, reference: &Reference) {
        self.accesses += 1;
        match reference.operation {
            Operation::Read => self.reads += 1,
            Operation::Write => self.writes += 1,
        }
        self.frequency.add(reference.vpn, 1);
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_fault(&mut self) {
        self.faults += 1;
    }

    pub fn finish(
        self,
        policy: PolicyKind,
        frame_count: usize,
        memory: MemoryStats,
        elapsed: Duration,
    ) -> RunStatistics {
        // An empty trace yields zeros throughout, EAT included.
        let (hit_rate, fault_rate, eat_ns) = if self.accesses == 0 {
            (0.0, 0.0, 0.0)
        } else {
            let fault_rate = percent(self.faults, self.accesses);
            (
                percent(self.hits, self.accesses),
                fault_rate,
                effective_access_time(fault_rate),
            )
        };

        RunStatistics {
            policy,
            frame_count,
            accesses: self.accesses,
            hits: self.hits,
            faults: self.faults,
            evictions: memory.eviction_count,
            disk_writes: memory.disk_write_count,
            reads: self.reads,
            writes: self.writes,
            hit_rate,
            fault_rate,
            eat_ns,
            elapsed,
            top_pages: self.frequency.top(TOP_PAGES),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunStatistics {
    pub policy: PolicyKind,
    pub frame_count: usize,
    pub accesses: u64,
    pub hits: u64,
    pub faults: u64,
    pub evictions: u64,
    pub disk_writes: u64,
    pub reads: u64,
    pub writes: u64,
    pub hit_rate: f64,
    pub fault_rate: f64,
    pub eat_ns: f64,
    pub elapsed: Duration,
    pub top_pages: Vec<PageFrequency>,
}
impl RunStatistics {
    pub fn read_share(&self) -> f64 {
        percent(self.reads, self.reads + self.writes)
    }

    pub fn write_share(&self) -> f64 {
        percent(self.writes, self.reads + self.writes)
    }

    /// Share of this run's accesses that went to one page.
    pub fn page_share(&self, page: &PageFrequency) -> f64 {
        percent(page.count, self.accesses)
    }

    /// Copy with the wall-clock time zeroed, for comparing outcomes.
    pub fn without_timing(&self) -> Self {
        Self {
            elapsed: Duration::ZERO,
            ..self.clone()
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PolicyAverages {
    pub policy: PolicyKind,
    pub runs: usize,
    pub hit_rate: f64,
    pub faults: f64,
    pub eat_ns: f64,
    pub disk_writes: f64,
    pub elapsed_secs: f64,
}

/// Aggregates across every run of a batch.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    pub total_accesses: u64,
    /// Per-run top pages summed together and re-ranked.
    pub top_pages: Vec<PageFrequency>,
    /// In order of each policy's first appearance.
    pub policies: Vec<PolicyAverages>,
}
impl Summary {
    pub fn from_runs<'a>(runs: impl IntoIterator<Item = &'a RunStatistics>) -> Self {
        let mut total_accesses = 0;
        let mut combined = FrequencyTable::new();
        let mut per_policy: Vec<(PolicyKind, Vec<&RunStatistics>)> = Vec::new();

        for run in runs {
            total_accesses += run.accesses;
            for page in &run.top_pages {
                combined.add(page.vpn, page.count);
            }
            match per_policy.iter_mut().find(|(policy, _)| *policy == run.policy) {
                Some((_, group)) => group.push(run),
                None => per_policy.push((run.policy, vec![run])),
            }
        }

        let policies = per_policy
            .into_iter()
            .map(|(policy, group)| {
                let n = group.len() as f64;
                let mean = |f: fn(&RunStatistics) -> f64| group.iter().map(|r| f(r)).sum::<f64>() / n;
                PolicyAverages {
                    policy,
                    runs: group.len(),
                    hit_rate: mean(|r| r.hit_rate),
                    faults: mean(|r| r.faults as f64),
                    eat_ns: mean(|r| r.eat_ns),
                    disk_writes: mean(|r| r.disk_writes as f64),
                    elapsed_secs: mean(|r| r.elapsed.as_secs_f64()),
                }
            })
            .collect();

        Self {
            total_accesses,
            top_pages: combined.top(TOP_PAGES),
            policies,
        }
    }

    pub fn page_share(&self, page: &PageFrequency) -> f64 {
        percent(page.count, self.total_accesses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector(pages: &[(u64, Operation)]) -> StatsCollector {
        let mut stats = StatsCollector::new();
        for &(page, operation) in pages {
            stats.record_access(&Reference::new(Vpn(page), operation));
        }
        stats
    }

    fn run(policy: PolicyKind, hits: u64, faults: u64, disk_writes: u64) -> RunStatistics {
        let mut stats = StatsCollector::new();
        for _ in 0..hits + faults {
            stats.record_access(&Reference::new(Vpn(1), Operation::Read));
        }
        stats.hits = hits;
        stats.faults = faults;
        let memory = MemoryStats {
            eviction_count: 0,
            disk_write_count: disk_writes,
        };
        stats.finish(policy, 4, memory, Duration::from_millis(500))
    }

    #[test]
    fn eat_blends_memory_and_fault_latency() {
        assert_eq!(effective_access_time(0.0), 100.0);
        assert_eq!(effective_access_time(100.0), 10_000_100.0);
        assert_eq!(effective_access_time(25.0), 2_500_100.0);
    }

    #[test]
    fn rates_are_percentages_of_accesses() {
        let stats = run(PolicyKind::Lru, 3, 1, 0);
        assert_eq!(stats.accesses, 4);
        assert_eq!(stats.hit_rate, 75.0);
        assert_eq!(stats.fault_rate, 25.0);
        assert_eq!(stats.eat_ns, 2_500_100.0);
    }

    #[test]
    fn empty_run_is_all_zero() {
        let stats = StatsCollector::new().finish(
            PolicyKind::Opt,
            3,
            MemoryStats::default(),
            Duration::ZERO,
        );
        assert_eq!(stats.accesses, 0);
        assert_eq!(stats.hit_rate, 0.0);
        assert_eq!(stats.fault_rate, 0.0);
        assert_eq!(stats.eat_ns, 0.0);
        assert_eq!(stats.read_share(), 0.0);
        assert!(stats.top_pages.is_empty());
    }

    #[test]
    fn counts_reads_and_writes() {
        let stats = collector(&[(1, Operation::Read), (1, Operation::Write), (2, Operation::Read)]);
        assert_eq!(stats.reads, 2);
        assert_eq!(stats.writes, 1);
        assert_eq!(stats.frequency.get(Vpn(1)), 2);
        assert_eq!(stats.frequency.len(), 2);
    }

    #[test]
    fn top_pages_rank_by_count_then_first_seen() {
        let stats = collector(&[
            (5, Operation::Read),
            (9, Operation::Read),
            (7, Operation::Read),
            (9, Operation::Read),
            (7, Operation::Read),
            (5, Operation::Read),
            (3, Operation::Read),
        ]);
        let ranked: Vec<_> = stats
            .frequency
            .top(TOP_PAGES)
            .iter()
            .map(|p| (p.vpn.0, p.count))
            .collect();
        assert_eq!(ranked, vec![(5, 2), (9, 2), (7, 2), (3, 1)]);
    }

    #[test]
    fn top_pages_are_capped() {
        let pages: Vec<_> = (0..50).map(|p| (p, Operation::Read)).collect();
        let stats = collector(&pages).finish(
            PolicyKind::Fifo,
            1,
            MemoryStats::default(),
            Duration::ZERO,
        );
        assert_eq!(stats.top_pages.len(), TOP_PAGES);
        assert_eq!(stats.top_pages[0].vpn, Vpn(0));
    }

    #[test]
    fn summary_averages_per_policy_in_first_seen_order() {
        let runs = [
            run(PolicyKind::Lru, 3, 1, 2),
            run(PolicyKind::Fifo, 2, 2, 0),
            run(PolicyKind::Lru, 1, 3, 4),
        ];
        let summary = Summary::from_runs(&runs);

        assert_eq!(summary.total_accesses, 12);
        assert_eq!(summary.policies.len(), 2);

        let lru = &summary.policies[0];
        assert_eq!(lru.policy, PolicyKind::Lru);
        assert_eq!(lru.runs, 2);
        assert_eq!(lru.hit_rate, 50.0);
        assert_eq!(lru.faults, 2.0);
        assert_eq!(lru.disk_writes, 3.0);
        assert_eq!(lru.elapsed_secs, 0.5);

        assert_eq!(summary.policies[1].policy, PolicyKind::Fifo);
        assert_eq!(summary.top_pages, vec![PageFrequency { vpn: Vpn(1), count: 12 }]);
        assert_eq!(summary.page_share(&summary.top_pages[0]), 100.0);
    }
}
