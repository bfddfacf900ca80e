use super::{OutOfBounds, Reader, Stream};

const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];
const CLASS_64: u8 = 2;
const DATA_LITTLE: u8 = 1;

/// Size of an Elf64_Ehdr.
pub const ELF64_HEADER_SIZE: u64 = 64;

/// The parts of the Elf64_Ehdr we care about. Only 64-bit little-endian images get
/// this far, everything else is treated as "no ELF".
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ElfHeader {
    /// Exe, shared lib, core, etc.
    pub etype: u16,

    /// CPU architecture.
    pub machine: u16,

    /// Virtual address of the entry point.
    pub entry: u64,

    /// Offset in the ELF file to the program header table.
    pub ph_offset: u64,

    /// Offset in the ELF file to the section header table.
    pub section_offset: u64,

    pub flags: u32,

    pub ph_entry_size: u16,
    pub num_ph_entries: u16,

    pub section_entry_size: u16,
    pub num_section_entries: u16,

    /// Section index for the section name string table.
    pub string_table_index: u16,
}

impl ElfHeader {
    /// Returns None if the bytes aren't an ELF64 little-endian image.
    pub fn new(reader: Reader) -> Option<Self> {
        // see https://en.wikipedia.org/wiki/Executable_and_Linkable_Format
        if (reader.len() as u64) < ELF64_HEADER_SIZE {
            return None;
        }
        if reader.slice(0, 4).ok()? != ELF_MAGIC {
            return None;
        }
        if reader.read_byte(4).ok()? != CLASS_64 || reader.read_byte(5).ok()? != DATA_LITTLE {
            return None;
        }
        ElfHeader::read(reader).ok()
    }

    fn read(reader: Reader) -> Result<Self, OutOfBounds> {
        let mut s = Stream::new(reader, 16);
        let etype = s.read_half()?;
        let machine = s.read_half()?;
        let _version = s.read_word()?;
        let entry = s.read_xword()?;
        let ph_offset = s.read_xword()?;
        let section_offset = s.read_xword()?;
        let flags = s.read_word()?;
        let _header_size = s.read_half()?;
        let ph_entry_size = s.read_half()?;
        let num_ph_entries = s.read_half()?;
        let section_entry_size = s.read_half()?;
        let num_section_entries = s.read_half()?;
        let string_table_index = s.read_half()?;
        Ok(ElfHeader {
            etype,
            machine,
            entry,
            ph_offset,
            section_offset,
            flags,
            ph_entry_size,
            num_ph_entries,
            section_entry_size,
            num_section_entries,
            string_table_index,
        })
    }

    pub fn stype(&self) -> &'static str {
        match self.etype {
            0 => "none",
            1 => "relocatable",
            2 => "executable",
            3 => "shared object",
            4 => "core",
            _ => "unknown",
        }
    }

    pub fn machine(&self) -> &'static str {
        match self.machine {
            0x03 => "x86",
            0x28 => "ARM",
            0x3e => "x86-64",
            0xb7 => "AArch64",
            0xf3 => "RISC-V",
            _ => "unknown",
        }
    }
}
