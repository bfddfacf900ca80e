use super::{OutOfBounds, Reader, Stream};

/// Size of an Elf64_Sym.
pub const SYMBOL_ENTRY_SIZE: u64 = 24;

pub struct SymbolTableEntry {
    // see https://refspecs.linuxbase.org/elf/gabi4+/ch4.symtab.html
    /// Index into the symbol string table.
    pub name: u32,

    /// Can be an address, absolute value, etc.
    pub value: u64,

    /// Size of the symbol. Zero if the symbol has no or unknown size.
    pub size: u64,

    pub stype: SymbolType,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SymbolType {
    /// NOTYPE, used by most assembly labels.
    None,

    /// A variable, array, etc.
    Object,

    /// Function or other executable code.
    Func,

    /// Section, file, TLS, and the OS/CPU specific types.
    Other(u8),
}

impl SymbolTableEntry {
    pub fn new(reader: Reader, offset: u64) -> Result<Self, OutOfBounds> {
        let mut s = Stream::new(reader, offset);
        let name = s.read_word()?; // 4
        let info = s.read_byte()?; // 1
        let _other = s.read_byte()?; // 1
        let _index = s.read_half()?; // 2
        let value = s.read_xword()?; // 8
        let size = s.read_xword()?; // 8
        Ok(SymbolTableEntry {
            name,
            value,
            size,
            stype: SymbolType::from_u8(info),
        })
    }

    /// Only code-ish symbols are useful for naming addresses. Hand written assembly
    /// labels usually come through as NOTYPE.
    pub fn is_code(&self) -> bool {
        matches!(self.stype, SymbolType::Func | SymbolType::None)
    }
}

impl SymbolType {
    /// The type lives in the low four bits of st_info.
    pub fn from_u8(value: u8) -> Self {
        match value & 0xf {
            0 => SymbolType::None,
            1 => SymbolType::Object,
            2 => SymbolType::Func,
            n => SymbolType::Other(n),
        }
    }
}
