use std::collections::HashSet;

use tracing::debug;

use crate::{
    error::{Result, SimError},
    hardware::mmu::{Mmu, Operation},
    paging::{PageReplacementPolicy, PageTable, Pfn, Vpn},
};

pub struct MemoryManager<P: PageReplacementPolicy> {
    pub page_table: PageTable,
    pub frame_table: FrameTable,
    pub mmu: Mmu,
    policy: P,
    pub stats: MemoryStats,
}
impl<P: PageReplacementPolicy> MemoryManager<P> {
    pub fn new(frame_count: usize, policy: P) -> Self {
        Self {
            page_table: PageTable::new(),
            frame_table: FrameTable::new(frame_count),
            mmu: Mmu::new(),
            policy,
            stats: MemoryStats::new(),
        }
    }

    pub fn policy_mut(&mut self) -> &mut P {
        &mut self.policy
    }

    pub fn resident_count(&self) -> usize {
        self.page_table.len()
    }

    /// Hands out the lowest free frame, or reclaims one chosen by the policy.
    pub fn allocate_frame(&mut self) -> Result<(Pfn, Option<Eviction>)> {
        if let Some(pfn) = self.frame_table.get_unassigned() {
            return Ok((pfn, None));
        }
        let victim_pfn = self
            .policy
            .pick_victim(&self.frame_table, &self.page_table)
            .ok_or(SimError::VictimUnavailable)?;
        let eviction = self.evict_page(victim_pfn)?;
        Ok((victim_pfn, Some(eviction)))
    }

    pub fn evict_page(&mut self, pfn: Pfn) -> Result<Eviction> {
        let entry = self.frame_table.clear(pfn);
        let vpn = entry.vpn.ok_or(SimError::VictimUnavailable)?;
        self.page_table.remove(vpn);

        self.stats.eviction_count += 1;
        if entry.dirty {
            self.write_back();
        }

        debug!(page = vpn.0, frame = pfn.0, dirty = entry.dirty, "evicted page");
        Ok(Eviction {
            vpn,
            pfn,
            dirty: entry.dirty,
        })
    }

    /// Installs `vpn` after a miss. The frame starts dirty iff the faulting
    /// access is a write.
    pub fn handle_page_fault(&mut self, vpn: Vpn, operation: Operation) -> Result<Option<Eviction>> {
        let (pfn, eviction) = self.allocate_frame()?;

        let dirty = matches!(operation, Operation::Write);
        self.frame_table.assign(pfn, vpn, dirty);
        self.page_table.insert(vpn, pfn);
        self.policy.record_load(vpn);

        Ok(eviction)
    }

    /// Models flushing a dirty page before its frame is reused.
    pub fn write_back(&mut self) {
        self.stats.disk_write_count += 1;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Eviction {
    pub vpn: Vpn,
    pub pfn: Pfn,
    pub dirty: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryStats {
    pub eviction_count: u64,
    pub disk_write_count: u64,
}
impl MemoryStats {
    fn new() -> Self {
        Self {
            eviction_count: 0,
            disk_write_count: 0,
        }
    }
}

/// Frame-indexed view of the resident set.
///
/// `dirty` mirrors the per-frame dirty flags as a set of page numbers; both
/// are only changed together through `assign`, `mark_dirty` and `clear`.
pub struct FrameTable {
    entries: Vec<FrameTableEntry>,
    dirty: HashSet<Vpn>,
    occupied: usize,
    // No frame below this index is free.
    free_hint: usize,
}
impl FrameTable {
    pub fn new(frame_count: usize) -> Self {
        let mut entries = Vec::with_capacity(frame_count);
        for _ in 0..frame_count {
            entries.push(FrameTableEntry::new());
        }
        Self {
            entries,
            dirty: HashSet::new(),
            occupied: 0,
            free_hint: 0,
        }
    }

    pub fn occupied(&self) -> usize {
        self.occupied
    }

    pub fn get_unassigned(&self) -> Option<Pfn> {
        if self.occupied == self.entries.len() {
            return None;
        }
        self.entries[self.free_hint..]
            .iter()
            .position(|frame| frame.is_free())
            .map(|offset| Pfn(self.free_hint + offset))
    }

    /// Occupied frames in frame-number order.
    pub fn resident(&self) -> impl Iterator<Item = (Pfn, Vpn)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(idx, frame)| frame.vpn.map(|vpn| (Pfn(idx), vpn)))
    }

    pub fn assign(&mut self, pfn: Pfn, vpn: Vpn, dirty: bool) {
        let fte = &mut self.entries[pfn.0];
        debug_assert!(fte.is_free(), "assign to an occupied frame");
        fte.assign(vpn, dirty);
        if dirty {
            self.dirty.insert(vpn);
        }
        self.occupied += 1;
        if pfn.0 == self.free_hint {
            self.free_hint += 1;
        }
    }

    pub fn mark_dirty(&mut self, pfn: Pfn) {
        let fte = &mut self.entries[pfn.0];
        if let Some(vpn) = fte.vpn {
            fte.dirty = true;
            self.dirty.insert(vpn);
        }
    }

    /// Frees `pfn` and returns what it held.
    pub fn clear(&mut self, pfn: Pfn) -> FrameTableEntry {
        let fte = &mut self.entries[pfn.0];
        let previous = *fte;
        fte.clear();
        if let Some(vpn) = previous.vpn {
            self.dirty.remove(&vpn);
            self.occupied -= 1;
            self.free_hint = self.free_hint.min(pfn.0);
        }
        previous
    }

    pub fn is_dirty(&self, pfn: Pfn) -> bool {
        self.entries[pfn.0].dirty
    }

    pub fn dirty_pages(&self) -> &HashSet<Vpn> {
        &self.dirty
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameTableEntry {
    pub vpn: Option<Vpn>,
    pub dirty: bool,
}
impl FrameTableEntry {
    pub fn new() -> Self {
        FrameTableEntry {
            vpn: None,
            dirty: false,
        }
    }

    pub fn is_free(&self) -> bool {
        self.vpn.is_none()
    }

    pub fn clear(&mut self) {
        self.vpn = None;
        self.dirty = false;
    }

    pub fn assign(&mut self, vpn: Vpn, dirty: bool) {
        self.vpn = Some(vpn);
        self.dirty = dirty;
    }
}

impl Default for FrameTableEntry {
    fn default() -> Self {
        Self::new()
    }
}
