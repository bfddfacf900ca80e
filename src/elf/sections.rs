//! Section headers. These are used by the linker and debugger and are what we use to
//! name addresses when no symbol covers them.
use super::{OutOfBounds, Reader, Stream};

/// Occupies memory during execution.
pub const ALLOC_FLAG: u64 = 1 << 1;

/// Size of an Elf64_Shdr.
pub const SECTION_HEADER_SIZE: u64 = 64;

/// Describes a section.
#[derive(Clone, Debug)]
pub struct SectionHeader {
    // Elf64_Shdr, see https://gist.github.com/x0nu11byt3/bcb35c3de461e5fb66173071a2379779
    /// Index into the section name string table. Zero means no name.
    pub name: u32,

    /// Type of the section.
    pub stype: SectionType,

    /// Write, alloc, and/or exec.
    pub flags: u64,

    /// Virtual address of the section at execution.
    pub vaddr: u64,

    /// Offset from the start of the ELF file to the section's bytes.
    pub offset: u64,

    /// Size of the section in bytes.
    pub size: u64,

    /// Link to another section with related information, usually a string
    /// or symbol table.
    pub link: u32,

    /// Additional section info.
    pub info: u32,

    /// Section alignment.
    pub align: u64,

    /// Set if the section holds a table of entries.
    pub entry_size: u64,
}

/// The section types wosdump cares about. Everything else is carried as Other.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SectionType {
    Null,
    ProgBits,
    SymbolTable,
    StringTable,
    NoBits,
    DynamicSymbolTable,
    Other(u32),
}

impl SectionType {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => SectionType::Null,
            1 => SectionType::ProgBits,
            2 => SectionType::SymbolTable,
            3 => SectionType::StringTable,
            8 => SectionType::NoBits,
            11 => SectionType::DynamicSymbolTable,
            _ => SectionType::Other(value),
        }
    }
}

impl SectionHeader {
    pub fn new(reader: Reader, offset: u64) -> Result<Self, OutOfBounds> {
        // Check the whole entry up front so a header straddling the end of the file
        // is rejected as a unit.
        reader.slice(offset, SECTION_HEADER_SIZE)?;

        let mut s = Stream::new(reader, offset);
        let name = s.read_word()?;
        let stype = SectionType::from_u32(s.read_word()?);
        let flags = s.read_xword()?;
        let vaddr = s.read_xword()?;
        let offset = s.read_xword()?;
        let size = s.read_xword()?;
        let link = s.read_word()?;
        let info = s.read_word()?;
        let align = s.read_xword()?;
        let entry_size = s.read_xword()?;
        Ok(SectionHeader {
            name,
            stype,
            flags,
            vaddr,
            offset,
            size,
            link,
            info,
            align,
            entry_size,
        })
    }

    pub fn allocated(&self) -> bool {
        self.flags & ALLOC_FLAG != 0
    }
}
