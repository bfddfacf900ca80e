//! Just enough ELF64 support to name addresses. We only look at the ELF header, the
//! section header table, the section name string table, and one symbol table.
//! Quick ELF reference: https://gist.github.com/x0nu11byt3/bcb35c3de461e5fb66173071a2379779
//!
//! ELF files start with an ELF header which includes:
//! * A magic number to identify the file as an ELF file.
//! * Class and data bytes. We require 64-bit little-endian.
//! * The offset to, size of, and number of section headers.
//! * The index of the section that holds section names.
//!
//! Section headers have name, type, flags, vaddr, offset, size, and a link to a related
//! section. Allocated sections occupy memory at run time so they can be used to name an
//! address when no symbol covers it. The symbol table (.symtab, or .dynsym for stripped
//! images) links to the string table holding symbol names.
pub mod elf_file;
pub mod header;
pub mod io;
pub mod sections;
pub mod symbols;

pub use elf_file::*;
pub use header::*;
pub use io::*;
pub use sections::*;
pub use symbols::*;
