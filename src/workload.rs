use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    error::{Result, SimError},
    hardware::mmu::{Operation, PAGE_OFFSET_BITS, PAGE_SIZE},
    paging::Vpn,
};

#[derive(Clone, Debug, PartialEq)]
pub struct WorkloadConfig {
    /// Number of accesses to produce.
    pub length: usize,
    pub page_count: u64,
    pub working_set_size: usize,
    /// Accesses between working-set redraws.
    pub working_set_lifespan: usize,
    /// Probability that an access targets the working set.
    pub locality: f64,
    pub read_ratio: f64,
    pub seed: Option<u64>,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            length: 100_000,
            page_count: 16_384,
            working_set_size: 512,
            working_set_lifespan: 1_024,
            locality: 0.9,
            read_ratio: 0.8,
            seed: None,
        }
    }
}

impl WorkloadConfig {
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(SimError::InvalidWorkload(msg.to_string()));
        if self.page_count == 0 || self.page_count > (u64::MAX >> PAGE_OFFSET_BITS) {
            return invalid("page count must be between 1 and 2^52");
        }
        if self.working_set_size == 0 {
            return invalid("working set must hold at least one page");
        }
        if self.working_set_lifespan == 0 {
            return invalid("working set lifespan must be positive");
        }
        if !(0.0..=1.0).contains(&self.locality) {
            return invalid("locality must be a probability in [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.read_ratio) {
            return invalid("read ratio must be a probability in [0, 1]");
        }
        Ok(())
    }
}

/// Pages most accesses are drawn from until the set is redrawn.
struct WorkingSet {
    pages: Vec<Vpn>,
    age: usize,
}
impl WorkingSet {
    fn draw<R: Rng>(size: usize, page_count: u64, rng: &mut R) -> Self {
        let pages = (0..size)
            .map(|_| Vpn(rng.random_range(0..page_count)))
            .collect();
        Self { pages, age: 0 }
    }

    fn pick<R: Rng>(&self, rng: &mut R) -> Vpn {
        self.pages[rng.random_range(0..self.pages.len())]
    }
}

/// Yields `(address, operation)` pairs until `length` accesses are produced.
pub struct Workload {
    config: WorkloadConfig,
    rng: StdRng,
    working_set: WorkingSet,
    produced: usize,
}

impl Workload {
    pub fn new(config: WorkloadConfig) -> Result<Self> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let working_set = WorkingSet::draw(config.working_set_size, config.page_count, &mut rng);

        Ok(Self {
            config,
            rng,
            working_set,
            produced: 0,
        })
    }
}

impl Iterator for Workload {
    type Item = (u64, Operation);

    fn next(&mut self) -> Option<Self::Item> {
        if self.produced >= self.config.length {
            return None;
        }

        let config = &self.config;
        if self.working_set.age >= config.working_set_lifespan {
            self.working_set =
                WorkingSet::draw(config.working_set_size, config.page_count, &mut self.rng);
        }

        self.produced += 1;
        self.working_set.age += 1;

        let rng = &mut self.rng;
        let Vpn(page) = if rng.random_bool(config.locality) {
            self.working_set.pick(rng)
        } else {
            Vpn(rng.random_range(0..config.page_count))
        };
        let offset = rng.random_range(0..PAGE_SIZE);

        let operation = if rng.random_bool(config.read_ratio) {
            Operation::Read
        } else {
            Operation::Write
        };

        Some(((page << PAGE_OFFSET_BITS) | offset, operation))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.config.length - self.produced;
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::hardware::mmu::Mmu;

    fn seeded(seed: u64) -> WorkloadConfig {
        WorkloadConfig {
            length: 2_000,
            page_count: 256,
            working_set_size: 8,
            working_set_lifespan: 500,
            seed: Some(seed),
            ..WorkloadConfig::default()
        }
    }

    #[test]
    fn produces_exactly_length_accesses_within_address_space() {
        let accesses: Vec<_> = Workload::new(seeded(7)).unwrap().collect();
        assert_eq!(accesses.len(), 2_000);
        assert!(
            accesses
                .iter()
                .all(|&(address, _)| Mmu::page_number(address).0 < 256)
        );
    }

    #[test]
    fn same_seed_same_trace() {
        let a: Vec<_> = Workload::new(seeded(42)).unwrap().collect();
        let b: Vec<_> = Workload::new(seeded(42)).unwrap().collect();
        let c: Vec<_> = Workload::new(seeded(43)).unwrap().collect();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn full_locality_stays_in_working_set_until_redraw() {
        let config = WorkloadConfig {
            locality: 1.0,
            working_set_lifespan: 1_000,
            ..seeded(3)
        };
        let pages: HashSet<u64> = Workload::new(config)
            .unwrap()
            .take(1_000)
            .map(|(address, _)| Mmu::page_number(address).0)
            .collect();
        assert!(pages.len() <= 8);
    }

    #[test]
    fn read_ratio_bounds_operations() {
        let all_reads = WorkloadConfig {
            read_ratio: 1.0,
            ..seeded(1)
        };
        assert!(
            Workload::new(all_reads)
                .unwrap()
                .all(|(_, op)| op == Operation::Read)
        );
    }

    #[test]
    fn rejects_bad_parameters() {
        for config in [
            WorkloadConfig {
                page_count: 0,
                ..seeded(1)
            },
            WorkloadConfig {
                working_set_size: 0,
                ..seeded(1)
            },
            WorkloadConfig {
                locality: 1.5,
                ..seeded(1)
            },
            WorkloadConfig {
                read_ratio: -0.1,
                ..seeded(1)
            },
        ] {
            assert!(matches!(
                Workload::new(config),
                Err(SimError::InvalidWorkload(_))
            ));
        }
    }
}
