//! WOS kernel core dumps. These are a fixed 488 byte header followed by a table of
//! captured segments, the segments' bytes, and a copy of the crashed program's ELF
//! image. Everything is little-endian and the table and image are found through
//! absolute offsets in the header.
//!
//! ```text
//!   0  header: magic, version, size, timestamp, pid, cpu, vector, error code, cr2, cr3
//!  72  trap frame + trap registers, saved frame + saved registers
//! 424  task entry, pagemap, ELF addresses, segment count/offset, ELF size/offset
//! 488  usually the segment table: 5 x (vaddr, size, file offset, type, present)
//!      segment bytes and the ELF image
//! ```
pub mod header;
pub mod interrupts;
pub mod memory;
pub mod segments;

pub use header::*;
pub use interrupts::*;
pub use memory::*;
pub use segments::*;

use crate::elf::{Reader, Stream};

pub struct CoreDump<'a> {
    pub header: CoreDumpHeader,

    /// Always MAX_SEGMENTS entries, see valid_segments.
    pub segments: Vec<CoreDumpSegment>,
    bytes: &'a [u8],
    map: SegmentMap,
}

impl<'a> CoreDump<'a> {
    pub fn decode(bytes: &'a [u8]) -> Result<Self, DecodeError> {
        let reader = Reader::new(bytes);
        let header = CoreDumpHeader::read(&mut Stream::new(reader, 0))?;

        // The table is fixed size and read whole no matter what segment_count says.
        let offset = header.segment_table_offset;
        reader
            .slice(offset, MAX_SEGMENTS as u64 * SEGMENT_ENTRY_SIZE)
            .map_err(DecodeError::truncated("segment table"))?;
        let mut s = Stream::new(reader, offset);
        let segments = (0..MAX_SEGMENTS)
            .map(|_| CoreDumpSegment::read(&mut s))
            .collect::<Result<Vec<_>, _>>()
            .map_err(DecodeError::truncated("segment table"))?;

        let valid = CoreDump::valid_count(&header);
        let map = SegmentMap::new(&segments[..valid]);
        Ok(CoreDump {
            header,
            segments,
            bytes,
            map,
        })
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// The entries segment_count says were filled in.
    pub fn valid_segments(&self) -> &[CoreDumpSegment] {
        &self.segments[..CoreDump::valid_count(&self.header)]
    }

    /// True if the header claims more segments than the table can hold.
    pub fn too_many_segments(&self) -> bool {
        self.header.segment_count > MAX_SEGMENTS as u64
    }

    /// Pairs of valid, present segments that cover some of the same addresses.
    pub fn overlaps(&self) -> &[(usize, usize)] {
        self.map.overlaps()
    }

    /// The program's ELF image if the dump has one.
    pub fn embedded_elf(&self) -> Option<&'a [u8]> {
        let h = &self.header;
        if h.elf_size == 0 || h.elf_offset == 0 {
            return None;
        }
        Reader::new(self.bytes).slice(h.elf_offset, h.elf_size).ok()
    }

    /// Bytes at [va, va + len) or None if any of them weren't captured.
    pub fn read_range(&self, va: u64, len: u64) -> Option<Vec<u8>> {
        self.map
            .read_range(Reader::new(self.bytes), self.valid_segments(), va, len)
    }

    fn valid_count(header: &CoreDumpHeader) -> usize {
        header.segment_count.min(MAX_SEGMENTS as u64) as usize
    }
}
