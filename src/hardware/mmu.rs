use crate::{
    memory::FrameTable,
    paging::{PageTable, Pfn, Vpn},
};

/// Width of the in-page offset; pages are 4 KiB.
pub const PAGE_OFFSET_BITS: u32 = 12;
pub const PAGE_SIZE: u64 = 1 << PAGE_OFFSET_BITS;

pub struct Mmu;

impl Mmu {
    pub fn new() -> Self {
        Self {}
    }

    pub fn page_number(address: u64) -> Vpn {
        Vpn(address >> PAGE_OFFSET_BITS)
    }

    /// Resolves `vpn` against the page table. A write hit dirties the frame.
    pub fn translate(
        &self,
        page_table: &PageTable,
        frame_table: &mut FrameTable,
        vpn: Vpn,
        operation: Operation,
    ) -> TranslationResult {
        let Some(pfn) = page_table.get(vpn) else {
            return TranslationResult::PageFault;
        };

        if let Operation::Write = operation {
            frame_table.mark_dirty(pfn);
        }

        TranslationResult::Success(pfn)
    }
}

impl Default for Mmu {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Write,
}

impl Operation {
    /// Parses the trace operation code: exactly `R` or `W`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "R" => Some(Operation::Read),
            "W" => Some(Operation::Write),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            Operation::Read => 'R',
            Operation::Write => 'W',
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum TranslationResult {
    Success(Pfn),
    PageFault,
}
