use std::collections::HashMap;

use crate::{
    memory::FrameTable,
    paging::{PageReplacementPolicy, PageTable, Pfn, Vpn},
};

#[derive(Clone, Copy, Debug)]
struct Link {
    prev: Option<Vpn>,
    next: Option<Vpn>,
}

#[derive(Default)]
pub struct Lru {
    links: HashMap<Vpn, Link>,
    /// Least recently used.
    head: Option<Vpn>,
    /// Most recently used.
    tail: Option<Vpn>,
}
impl Lru {
    pub fn new() -> Self {
        Self {
            links: HashMap::new(),
            head: None,
            tail: None,
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Pages from least to most recently used.
    pub fn iter(&self) -> impl Iterator<Item = Vpn> + '_ {
        std::iter::successors(self.head, |vpn| self.links.get(vpn).and_then(|link| link.next))
    }

    /// Moves `vpn` to the most-recently-used end, inserting it if absent.
    pub fn touch(&mut self, vpn: Vpn) {
        if self.tail == Some(vpn) {
            return;
        }
        if self.links.contains_key(&vpn) {
            self.unlink(vpn);
        }
        self.push_back(vpn);
    }

    pub fn pop_front(&mut self) -> Option<Vpn> {
        let head = self.head?;
        self.unlink(head);
        Some(head)
    }

    fn push_back(&mut self, vpn: Vpn) {
        let link = Link {
            prev: self.tail,
            next: None,
        };
        match self.tail {
            Some(old_tail) => {
                if let Some(old) = self.links.get_mut(&old_tail) {
                    old.next = Some(vpn);
                }
            }
            None => self.head = Some(vpn),
        }
        self.links.insert(vpn, link);
        self.tail = Some(vpn);
    }

    fn unlink(&mut self, vpn: Vpn) {
        let Some(link) = self.links.remove(&vpn) else {
            return;
        };

        match link.prev {
            Some(p) => {
                if let Some(prev) = self.links.get_mut(&p) {
                    prev.next = link.next;
                }
            }
            None => self.head = link.next,
        }
        match link.next {
            Some(n) => {
                if let Some(next) = self.links.get_mut(&n) {
                    next.prev = link.prev;
                }
            }
            None => self.tail = link.prev,
        }
    }
}

impl PageReplacementPolicy for Lru {
    fn record_hit(&mut self, vpn: Vpn) {
        self.touch(vpn);
    }

    fn record_load(&mut self, vpn: Vpn) {
        self.touch(vpn);
    }

    fn pick_victim(&mut self, _frame_table: &FrameTable, page_table: &PageTable) -> Option<Pfn> {
        let victim = self.pop_front()?;
        page_table.get(victim)
    }
}
