use std::collections::VecDeque;

use crate::{
    memory::FrameTable,
    paging::{PageReplacementPolicy, PageTable, Pfn, Vpn},
};

/// Evicts the longest-resident page. Hits do not reorder the queue.
#[derive(Default)]
pub struct Fifo {
    // Front is the next victim.
    queue: VecDeque<Vpn>,
}
impl Fifo {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl PageReplacementPolicy for Fifo {
    fn record_load(&mut self, vpn: Vpn) {
        self.queue.push_back(vpn);
    }

    fn pick_victim(&mut self, _frame_table: &FrameTable, page_table: &PageTable) -> Option<Pfn> {
        let victim = self.queue.pop_front()?;
        page_table.get(victim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resident(pages: &[u64]) -> (FrameTable, PageTable) {
        let mut frame_table = FrameTable::new(pages.len());
        let mut page_table = PageTable::new();
        for (idx, &page) in pages.iter().enumerate() {
            frame_table.assign(Pfn(idx), Vpn(page), false);
            page_table.insert(Vpn(page), Pfn(idx));
        }
        (frame_table, page_table)
    }

    #[test]
    fn evicts_in_load_order_regardless_of_hits() {
        let (frame_table, page_table) = resident(&[5, 6, 7]);
        let mut fifo = Fifo::new();
        fifo.record_load(Vpn(5));
        fifo.record_load(Vpn(6));
        fifo.record_load(Vpn(7));

        fifo.record_hit(Vpn(5));
        fifo.record_hit(Vpn(5));

        assert_eq!(fifo.pick_victim(&frame_table, &page_table), Some(Pfn(0)));
        assert_eq!(fifo.pick_victim(&frame_table, &page_table), Some(Pfn(1)));
        assert_eq!(fifo.len(), 1);
    }

    #[test]
    fn empty_queue_has_no_victim() {
        let (frame_table, page_table) = resident(&[]);
        let mut fifo = Fifo::new();
        assert!(fifo.is_empty());
        assert_eq!(fifo.pick_victim(&frame_table, &page_table), None);
    }
}
