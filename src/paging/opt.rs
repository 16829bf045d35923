use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap},
};

use crate::{
    memory::FrameTable,
    paging::{PageReplacementPolicy, PageTable, Pfn, Vpn},
    trace::Reference,
};

pub struct Opt {
    future_refs: HashMap<Vpn, BinaryHeap<Reverse<usize>>>,
    /// `None` once the page has no remaining reference.
    next_ref: HashMap<Vpn, Option<usize>>,
}
impl Opt {
    pub fn new(references: &[Reference]) -> Self {
        let mut future_refs: HashMap<Vpn, BinaryHeap<Reverse<usize>>> = HashMap::new();
        for (position, reference) in references.iter().enumerate() {
            future_refs
                .entry(reference.vpn)
                .or_default()
                .push(Reverse(position));
        }

        let next_ref = future_refs
            .iter_mut()
            .map(|(&vpn, positions)| (vpn, positions.pop().map(|Reverse(pos)| pos)))
            .collect();

        Self {
            future_refs,
            next_ref,
        }
    }

    /// Position of the next unconsumed reference to `vpn`.
    pub fn next_use(&self, vpn: Vpn) -> Option<usize> {
        self.next_ref.get(&vpn).copied().flatten()
    }
}

impl PageReplacementPolicy for Opt {
    fn record_access(&mut self, vpn: Vpn, position: usize) {
        if self.next_use(vpn) != Some(position) {
            return;
        }
        let next = self
            .future_refs
            .get_mut(&vpn)
            .and_then(|positions| positions.pop())
            .map(|Reverse(pos)| pos);
        self.next_ref.insert(vpn, next);
    }

    /// Scans resident pages oldest load first; a page with no later reference
    /// wins outright.
    fn pick_victim(&mut self, _frame_table: &FrameTable, page_table: &PageTable) -> Option<Pfn> {
        let mut farthest: Option<(Pfn, usize)> = None;

        for (vpn, pfn) in page_table.iter() {
            let Some(next_use) = self.next_use(vpn) else {
                return Some(pfn);
            };
            if farthest.is_none_or(|(_, best)| next_use > best) {
                farthest = Some((pfn, next_use));
            }
        }

        farthest.map(|(pfn, _)| pfn)
    }
}
