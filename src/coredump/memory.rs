//! Reassembles virtual address ranges from the segments captured in a dump.
use super::CoreDumpSegment;
use crate::elf::Reader;
use rangemap::RangeMap;
use std::ops::Range;

/// Maps virtual addresses to the segment that holds them. Only present segments with a
/// non-empty range are mapped. Where segments overlap the one earliest in the table
/// wins.
pub struct SegmentMap {
    ranges: RangeMap<u64, usize>,

    /// Index pairs (lower first) of present segments that overlap.
    overlaps: Vec<(usize, usize)>,
}

impl SegmentMap {
    pub fn new(segments: &[CoreDumpSegment]) -> Self {
        let mapped: Vec<(usize, Range<u64>)> = segments
            .iter()
            .enumerate()
            .filter(|(_, segment)| segment.present)
            .filter_map(|(i, segment)| segment.vrange().map(|range| (i, range)))
            .collect();

        // Inserting later segments first lets earlier ones overwrite them.
        let mut ranges = RangeMap::new();
        for (i, range) in mapped.iter().rev() {
            ranges.insert(range.clone(), *i);
        }

        let mut overlaps = Vec::new();
        for (n, (i, a)) in mapped.iter().enumerate() {
            for (j, b) in &mapped[n + 1..] {
                if a.start < b.end && b.start < a.end {
                    overlaps.push((*i, *j));
                }
            }
        }

        SegmentMap { ranges, overlaps }
    }

    pub fn overlaps(&self) -> &[(usize, usize)] {
        &self.overlaps
    }

    /// Copies len bytes starting at va, possibly spanning several segments. Returns
    /// None if any byte isn't covered by a present segment or if a segment's file
    /// bytes are missing from the dump.
    pub fn read_range(
        &self,
        reader: Reader,
        segments: &[CoreDumpSegment],
        va: u64,
        len: u64,
    ) -> Option<Vec<u8>> {
        let end = va.checked_add(len)?;
        let mut result = Vec::new();
        let mut va = va;
        while va < end {
            let (range, &index) = self.ranges.get_key_value(&va)?;
            let segment = &segments[index];
            let count = range.end.min(end) - va;
            let file_offset = segment.file_offset.checked_add(va - segment.vaddr)?;
            match reader.slice(file_offset, count) {
                Ok(bytes) => result.extend_from_slice(bytes),
                Err(err) => {
                    log::debug!("segment {index} is truncated: {err}");
                    return None;
                }
            }
            va += count;
        }
        Some(result)
    }
}
