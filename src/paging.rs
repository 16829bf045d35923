use std::{
    collections::{BTreeMap, HashMap, hash_map::Entry},
    fmt,
    str::FromStr,
};

use crate::{error::SimError, memory::FrameTable};

mod fifo;
mod lru;
mod opt;

pub use fifo::Fifo;
pub use lru::Lru;
pub use opt::Opt;

/// Page number: an address with its offset bits shifted out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Vpn(pub u64);

/// Frame number: a slot index in the simulated resident set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pfn(pub usize);

/// Maps resident pages to the frame they occupy. Always the inverse of the
/// occupied part of the [`FrameTable`].
///
/// Iteration follows load order: a page evicted and loaded again moves to the
/// back.
#[derive(Default)]
pub struct PageTable {
    entries: HashMap<Vpn, (Pfn, u64)>,
    load_order: BTreeMap<u64, Vpn>,
    next_seq: u64,
}
impl PageTable {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            load_order: BTreeMap::new(),
            next_seq: 0,
        }
    }

    pub fn get(&self, vpn: Vpn) -> Option<Pfn> {
        self.entries.get(&vpn).map(|&(pfn, _)| pfn)
    }

    pub fn contains(&self, vpn: Vpn) -> bool {
        self.entries.contains_key(&vpn)
    }

    pub fn insert(&mut self, vpn: Vpn, pfn: Pfn) {
        match self.entries.entry(vpn) {
            Entry::Occupied(mut entry) => entry.get_mut().0 = pfn,
            Entry::Vacant(entry) => {
                entry.insert((pfn, self.next_seq));
                self.load_order.insert(self.next_seq, vpn);
                self.next_seq += 1;
            }
        }
    }

    pub fn remove(&mut self, vpn: Vpn) -> Option<Pfn> {
        let (pfn, seq) = self.entries.remove(&vpn)?;
        self.load_order.remove(&seq);
        Some(pfn)
    }

    /// Resident pages, oldest load first.
    pub fn iter(&self) -> impl Iterator<Item = (Vpn, Pfn)> + '_ {
        self.load_order
            .values()
            .filter_map(|&vpn| self.get(vpn).map(|pfn| (vpn, pfn)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Victim selection plus the bookkeeping each discipline needs to make it.
///
/// The engine drives every implementation through the same sequence: one
/// `record_access` per reference, then either `record_hit`, or (on a fault)
/// `pick_victim` when all frames are taken followed by `record_load`.
pub trait PageReplacementPolicy {
    /// Seen before the hit/fault decision for the reference at `position`.
    fn record_access(&mut self, _vpn: Vpn, _position: usize) {}

    fn record_hit(&mut self, _vpn: Vpn) {}

    fn record_load(&mut self, _vpn: Vpn) {}

    /// Chooses the frame to reclaim and forgets the victim page. Returns
    /// `None` only if the policy tracks no resident page.
    fn pick_victim(&mut self, frame_table: &FrameTable, page_table: &PageTable) -> Option<Pfn>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    Fifo,
    Lru,
    Opt,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 3] = [PolicyKind::Fifo, PolicyKind::Lru, PolicyKind::Opt];

    pub fn name(self) -> &'static str {
        match self {
            PolicyKind::Fifo => "FIFO",
            PolicyKind::Lru => "LRU",
            PolicyKind::Opt => "OPT",
        }
    }
}

impl FromStr for PolicyKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fifo" => Ok(PolicyKind::Fifo),
            "lru" => Ok(PolicyKind::Lru),
            "opt" => Ok(PolicyKind::Opt),
            _ => Err(SimError::UnknownPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
