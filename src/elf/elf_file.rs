//! An ELF64 image held in memory: either the executable embedded in a core dump or a
//! file the user pointed us at.
use super::{
    ElfHeader, Reader, SECTION_HEADER_SIZE, SYMBOL_ENTRY_SIZE, SectionHeader, SectionType,
    SymbolTableEntry, c_string,
};
use crate::resolve::{
    Demangler, LookupLimits, SectionEntry, SectionTable, SymbolTable, SymbolTableBuilder,
};

pub struct ElfImage<'a> {
    pub header: ElfHeader,
    reader: Reader<'a>,

    /// Indexed by section number. Headers that couldn't be read are None so that
    /// links and the string table index still line up.
    sections: Vec<Option<SectionHeader>>,
}

impl<'a> ElfImage<'a> {
    /// Returns None if bytes isn't an ELF64 little-endian image with a usable section
    /// header table.
    pub fn parse(bytes: &'a [u8]) -> Option<Self> {
        let reader = Reader::new(bytes);
        let header = ElfHeader::new(reader)?;
        if header.section_offset == 0
            || header.num_section_entries == 0
            || (header.section_entry_size as u64) < SECTION_HEADER_SIZE
        {
            log::debug!(
                "no usable section headers (offset {:#x}, count {}, entry size {})",
                header.section_offset,
                header.num_section_entries,
                header.section_entry_size
            );
            return None;
        }
        let sections = ElfImage::load_sections(reader, &header);
        Some(ElfImage {
            header,
            reader,
            sections,
        })
    }

    pub fn section(&self, index: u32) -> Option<&SectionHeader> {
        self.sections.get(index as usize)?.as_ref()
    }

    /// The section's bytes, clamped to the image.
    pub fn section_bytes(&self, section: &SectionHeader) -> &'a [u8] {
        self.reader.clamped(section.offset, section.size)
    }

    /// The section name string table.
    pub fn section_names(&self) -> Option<&'a [u8]> {
        let index = self.header.string_table_index as u32;
        if index >= self.sections.len() as u32 {
            log::debug!(
                "section name table index {index} is out of range ({} sections)",
                self.sections.len()
            );
            return None;
        }
        let table = self.section(index)?;
        Some(self.section_bytes(table))
    }

    /// Full symbol table if present, else the dynamic one.
    pub fn symbol_section(&self) -> Option<&SectionHeader> {
        self.find_section(SectionType::SymbolTable)
            .or_else(|| self.find_section(SectionType::DynamicSymbolTable))
    }

    fn find_section(&self, stype: SectionType) -> Option<&SectionHeader> {
        self.sections.iter().flatten().find(|s| s.stype == stype)
    }

    fn load_sections(reader: Reader, header: &ElfHeader) -> Vec<Option<SectionHeader>> {
        let mut sections = Vec::with_capacity(header.num_section_entries as usize);
        for i in 0..header.num_section_entries as u64 {
            let offset = (header.section_entry_size as u64)
                .checked_mul(i)
                .and_then(|o| o.checked_add(header.section_offset));
            let section = match offset {
                Some(offset) => match SectionHeader::new(reader, offset) {
                    Ok(section) => Some(section),
                    Err(err) => {
                        log::debug!("skipping section header {i}: {err}");
                        None
                    }
                },
                None => None,
            };
            sections.push(section);
        }
        sections
    }
}

/// Allocated sections with a name, address and size.
pub fn parse_sections(bytes: &[u8]) -> Option<SectionTable> {
    let image = ElfImage::parse(bytes)?;
    let names = image.section_names()?;

    let entries: Vec<SectionEntry> = image
        .sections
        .iter()
        .flatten()
        .filter(|s| s.allocated() && s.vaddr != 0 && s.size != 0)
        .filter_map(|s| {
            let name = c_string(names, s.name);
            (!name.is_empty()).then(|| SectionEntry::new(s.vaddr, s.size, name))
        })
        .collect();
    if entries.is_empty() {
        None
    } else {
        Some(SectionTable::new(entries))
    }
}

/// Function and untyped symbols with a non-zero address and a name.
pub fn parse_symbols(
    bytes: &[u8],
    limits: LookupLimits,
    demangler: &dyn Demangler,
) -> Option<SymbolTable> {
    let image = ElfImage::parse(bytes)?;
    let section = image.symbol_section()?;

    let entry_size = match section.entry_size {
        0 => SYMBOL_ENTRY_SIZE,
        n if n < SYMBOL_ENTRY_SIZE => {
            log::debug!("symbol entry size {n} is too small");
            return None;
        }
        n => n,
    };

    if section.link as usize >= image.sections.len() {
        log::debug!("symbol string table index {} is out of range", section.link);
        return None;
    }
    let strings = image.section_bytes(image.section(section.link)?);

    let end = section
        .offset
        .saturating_add(section.size)
        .min(image.reader.len() as u64);
    let mut builder = SymbolTableBuilder::new();
    let mut offset = section.offset;
    while offset.checked_add(entry_size).is_some_and(|e| e <= end) {
        match SymbolTableEntry::new(image.reader, offset) {
            Ok(entry) => {
                if entry.is_code() && entry.value != 0 {
                    let name = c_string(strings, entry.name);
                    if !name.is_empty() {
                        builder.add(entry.value, name, entry.size);
                    }
                }
            }
            Err(err) => log::debug!("skipping symbol at {offset:#x}: {err}"),
        }
        offset += entry_size;
    }

    if builder.is_empty() {
        None
    } else {
        Some(builder.finish(limits, demangler))
    }
}
