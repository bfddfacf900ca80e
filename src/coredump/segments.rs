use crate::elf::{OutOfBounds, Stream};
use std::fmt;
use std::ops::Range;

/// Four stack pages plus the faulting page.
pub const MAX_SEGMENTS: usize = 5;

/// Size of one segment table entry.
pub const SEGMENT_ENTRY_SIZE: u64 = 32;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SegmentType {
    Zero,
    StackPage,
    FaultPage,
    Unknown(u32),
}

/// A chunk of the crashed task's address space captured in the dump.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CoreDumpSegment {
    pub vaddr: u64,
    pub size: u64,

    /// Where the segment's bytes start in the dump file.
    pub file_offset: u64,
    pub stype: SegmentType,

    /// False if the kernel couldn't capture the segment.
    pub present: bool,
}

impl SegmentType {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => SegmentType::Zero,
            1 => SegmentType::StackPage,
            2 => SegmentType::FaultPage,
            n => SegmentType::Unknown(n),
        }
    }
}

impl fmt::Display for SegmentType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SegmentType::Zero => write!(f, "Zero/Unmapped"),
            SegmentType::StackPage => write!(f, "StackPage"),
            SegmentType::FaultPage => write!(f, "FaultPage"),
            SegmentType::Unknown(n) => write!(f, "Unknown({n})"),
        }
    }
}

impl CoreDumpSegment {
    pub fn read(s: &mut Stream) -> Result<Self, OutOfBounds> {
        let vaddr = s.read_xword()?;
        let size = s.read_xword()?;
        let file_offset = s.read_xword()?;
        let stype = SegmentType::from_u32(s.read_word()?);
        let present = s.read_word()? != 0;
        Ok(CoreDumpSegment {
            vaddr,
            size,
            file_offset,
            stype,
            present,
        })
    }

    /// None if vaddr + size overflows.
    pub fn end(&self) -> Option<u64> {
        self.vaddr.checked_add(self.size)
    }

    /// The addresses the segment covers. None for empty or overflowing segments, these
    /// are never readable.
    pub fn vrange(&self) -> Option<Range<u64>> {
        let end = self.end()?;
        (self.size > 0).then_some(self.vaddr..end)
    }
}
