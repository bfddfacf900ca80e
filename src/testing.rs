//! Builders for synthetic dumps and ELF images used by the unit tests.
use crate::coredump::{
    COREDUMP_MAGIC, CoreDumpHeader, GPRegs, HEADER_SIZE, InterruptFrame, MAX_SEGMENTS,
    SEGMENT_ENTRY_SIZE, SegmentType,
};

fn push_u16(bytes: &mut Vec<u8>, value: u16) {
    bytes.extend_from_slice(&value.to_le_bytes());
}

fn push_u32(bytes: &mut Vec<u8>, value: u32) {
    bytes.extend_from_slice(&value.to_le_bytes());
}

fn push_u64(bytes: &mut Vec<u8>, value: u64) {
    bytes.extend_from_slice(&value.to_le_bytes());
}

fn push_frame(bytes: &mut Vec<u8>, frame: &InterruptFrame) {
    for (_, value) in frame.fields() {
        push_u64(bytes, value);
    }
}

fn push_regs(bytes: &mut Vec<u8>, r: &GPRegs) {
    // layout order, not display order
    for value in [
        r.r15, r.r14, r.r13, r.r12, r.r11, r.r10, r.r9, r.r8, r.rbp, r.rdi, r.rsi, r.rdx, r.rcx,
        r.rbx, r.rax,
    ] {
        push_u64(bytes, value);
    }
}

pub fn encode_header(h: &CoreDumpHeader) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(HEADER_SIZE as usize);
    push_u64(&mut bytes, h.magic);
    push_u32(&mut bytes, h.version);
    push_u32(&mut bytes, h.header_size);
    for value in [
        h.timestamp,
        h.pid,
        h.cpu,
        h.int_num,
        h.err_code,
        h.cr2,
        h.cr3,
    ] {
        push_u64(&mut bytes, value);
    }
    push_frame(&mut bytes, &h.trap_frame);
    push_regs(&mut bytes, &h.trap_regs);
    push_frame(&mut bytes, &h.saved_frame);
    push_regs(&mut bytes, &h.saved_regs);
    for value in [
        h.task_entry,
        h.task_pagemap,
        h.elf_header_addr,
        h.program_header_addr,
        h.segment_count,
        h.segment_table_offset,
        h.elf_size,
        h.elf_offset,
    ] {
        push_u64(&mut bytes, value);
    }
    assert_eq!(bytes.len() as u64, HEADER_SIZE);
    bytes
}

struct TestSegment {
    vaddr: u64,
    size: u64,
    stype: SegmentType,
    data: Option<Vec<u8>>,
}

type HeaderEdit = Box<dyn FnOnce(&mut CoreDumpHeader)>;

/// Lays a dump out as: header, segment table, segment bytes, ELF image.
pub struct DumpBuilder {
    header: CoreDumpHeader,
    segments: Vec<TestSegment>,
    count: Option<u64>,
    elf: Option<Vec<u8>>,
    edits: Vec<HeaderEdit>,
}

impl DumpBuilder {
    pub fn new() -> Self {
        let header = CoreDumpHeader {
            magic: COREDUMP_MAGIC,
            version: 1,
            header_size: HEADER_SIZE as u32,
            ..CoreDumpHeader::default()
        };
        DumpBuilder {
            header,
            segments: Vec::new(),
            count: None,
            elf: None,
            edits: Vec::new(),
        }
    }

    /// Edits are applied after the layout fields are filled in so they can override
    /// them.
    pub fn header<F>(mut self, edit: F) -> Self
    where
        F: FnOnce(&mut CoreDumpHeader) + 'static,
    {
        self.edits.push(Box::new(edit));
        self
    }

    pub fn segment(mut self, vaddr: u64, stype: SegmentType, data: Vec<u8>) -> Self {
        self.segments.push(TestSegment {
            vaddr,
            size: data.len() as u64,
            stype,
            data: Some(data),
        });
        self
    }

    pub fn absent(mut self, vaddr: u64, size: u64, stype: SegmentType) -> Self {
        self.segments.push(TestSegment {
            vaddr,
            size,
            stype,
            data: None,
        });
        self
    }

    /// Overrides segment_count, which otherwise is the number of segments added.
    pub fn count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn elf(mut self, bytes: Vec<u8>) -> Self {
        self.elf = Some(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        assert!(self.segments.len() <= MAX_SEGMENTS);
        let mut header = self.header;
        let table_offset = HEADER_SIZE;
        let mut data_offset = table_offset + MAX_SEGMENTS as u64 * SEGMENT_ENTRY_SIZE;

        let mut table = Vec::new();
        let mut data = Vec::new();
        for segment in self.segments.iter() {
            push_u64(&mut table, segment.vaddr);
            push_u64(&mut table, segment.size);
            match &segment.data {
                Some(bytes) => {
                    push_u64(&mut table, data_offset);
                    data.extend_from_slice(bytes);
                    data_offset += bytes.len() as u64;
                }
                None => push_u64(&mut table, 0),
            }
            push_u32(&mut table, encode_type(segment.stype));
            push_u32(&mut table, segment.data.is_some() as u32);
        }
        table.resize((MAX_SEGMENTS as u64 * SEGMENT_ENTRY_SIZE) as usize, 0);

        header.segment_count = self.count.unwrap_or(self.segments.len() as u64);
        header.segment_table_offset = table_offset;
        if let Some(elf) = &self.elf {
            header.elf_offset = data_offset;
            header.elf_size = elf.len() as u64;
        }
        for edit in self.edits {
            edit(&mut header);
        }

        let mut bytes = encode_header(&header);
        bytes.extend(table);
        bytes.extend(data);
        if let Some(elf) = self.elf {
            bytes.extend(elf);
        }
        bytes
    }
}

fn encode_type(stype: SegmentType) -> u32 {
    match stype {
        SegmentType::Zero => 0,
        SegmentType::StackPage => 1,
        SegmentType::FaultPage => 2,
        SegmentType::Unknown(n) => n,
    }
}

struct TestSection {
    name: String,
    addr: u64,
    size: u64,
}

struct TestSymbol {
    name: String,
    value: u64,
    size: u64,
    stype: u8,
}

/// Emits a minimal little-endian ELF64 executable laid out as: ELF header, symbol
/// table, symbol strings, section names, section headers. Sections are numbered null,
/// the user's sections, then the symbol table, its strings, and the section names.
pub struct ElfBuilder {
    sections: Vec<TestSection>,
    symbols: Vec<TestSymbol>,
    dynamic: bool,
    symtab: bool,
}

impl ElfBuilder {
    pub fn new() -> Self {
        ElfBuilder {
            sections: Vec::new(),
            symbols: Vec::new(),
            dynamic: false,
            symtab: true,
        }
    }

    /// Allocated, executable PROGBITS section.
    pub fn section(mut self, name: &str, addr: u64, size: u64) -> Self {
        self.sections.push(TestSection {
            name: name.to_string(),
            addr,
            size,
        });
        self
    }

    /// stype is the STT_ value, binding is always GLOBAL.
    pub fn symbol(mut self, name: &str, value: u64, size: u64, stype: u8) -> Self {
        self.symbols.push(TestSymbol {
            name: name.to_string(),
            value,
            size,
            stype,
        });
        self
    }

    /// Emit .dynsym/.dynstr instead of .symtab/.strtab.
    pub fn dynamic(mut self) -> Self {
        self.dynamic = true;
        self
    }

    /// Leave out the symbol table and its strings.
    pub fn without_symtab(mut self) -> Self {
        self.symtab = false;
        self
    }

    pub fn build(self) -> Vec<u8> {
        const EHDR_SIZE: u64 = 64;
        const SHDR_SIZE: u64 = 64;
        const SYM_SIZE: u64 = 24;

        // symbol table, starting with the null symbol
        let mut strtab = vec![0u8];
        let mut symtab = vec![0u8; SYM_SIZE as usize];
        for symbol in self.symbols.iter() {
            let name = if symbol.name.is_empty() {
                0
            } else {
                let index = strtab.len() as u32;
                strtab.extend_from_slice(symbol.name.as_bytes());
                strtab.push(0);
                index
            };
            push_u32(&mut symtab, name);
            symtab.push(0x10 | symbol.stype);
            symtab.push(0);
            push_u16(&mut symtab, 1);
            push_u64(&mut symtab, symbol.value);
            push_u64(&mut symtab, symbol.size);
        }

        let (symtab_name, strtab_name, symtab_type) = if self.dynamic {
            (".dynsym", ".dynstr", 11)
        } else {
            (".symtab", ".strtab", 2)
        };

        // section names
        let mut shstrtab = vec![0u8];
        let mut add_name = |name: &str| {
            let index = shstrtab.len() as u32;
            shstrtab.extend_from_slice(name.as_bytes());
            shstrtab.push(0);
            index
        };
        let user_names: Vec<u32> = self.sections.iter().map(|s| add_name(&s.name)).collect();
        let symtab_name = add_name(symtab_name);
        let strtab_name = add_name(strtab_name);
        let shstrtab_name = add_name(".shstrtab");

        let symtab_offset = EHDR_SIZE;
        let strtab_offset = symtab_offset + symtab.len() as u64;
        let shstrtab_offset = strtab_offset + strtab.len() as u64;
        let shdr_offset = (shstrtab_offset + shstrtab.len() as u64).next_multiple_of(8);

        let user_count = self.sections.len() as u32;
        let strtab_index = user_count + 2;
        let shstrtab_index = if self.symtab {
            user_count + 3
        } else {
            user_count + 1
        };
        let num_sections = shstrtab_index + 1;

        let mut shdrs = vec![0u8; SHDR_SIZE as usize];
        for (section, name) in self.sections.iter().zip(user_names) {
            push_shdr(
                &mut shdrs,
                [name, 1],
                [0x6, section.addr, 0, section.size],
                [0, 0],
                [16, 0],
            );
        }
        if self.symtab {
            push_shdr(
                &mut shdrs,
                [symtab_name, symtab_type],
                [0, 0, symtab_offset, symtab.len() as u64],
                [strtab_index, 1],
                [8, SYM_SIZE],
            );
            push_shdr(
                &mut shdrs,
                [strtab_name, 3],
                [0, 0, strtab_offset, strtab.len() as u64],
                [0, 0],
                [1, 0],
            );
        }
        push_shdr(
            &mut shdrs,
            [shstrtab_name, 3],
            [0, 0, shstrtab_offset, shstrtab.len() as u64],
            [0, 0],
            [1, 0],
        );

        let entry = self.sections.first().map_or(0, |s| s.addr);
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&[0x7f, b'E', b'L', b'F', 2, 1, 1, 0]);
        bytes.extend_from_slice(&[0; 8]);
        push_u16(&mut bytes, 2); // ET_EXEC
        push_u16(&mut bytes, 0x3e); // x86-64
        push_u32(&mut bytes, 1);
        push_u64(&mut bytes, entry);
        push_u64(&mut bytes, 0); // no program headers
        push_u64(&mut bytes, shdr_offset);
        push_u32(&mut bytes, 0);
        push_u16(&mut bytes, EHDR_SIZE as u16);
        push_u16(&mut bytes, 56);
        push_u16(&mut bytes, 0);
        push_u16(&mut bytes, SHDR_SIZE as u16);
        push_u16(&mut bytes, num_sections as u16);
        push_u16(&mut bytes, shstrtab_index as u16);
        assert_eq!(bytes.len() as u64, EHDR_SIZE);

        bytes.extend(symtab);
        bytes.extend(strtab);
        bytes.extend(shstrtab);
        bytes.resize(shdr_offset as usize, 0);
        bytes.extend(shdrs);
        bytes
    }
}

/// [name, type], [flags, addr, offset, size], [link, info], [align, entsize]
fn push_shdr(bytes: &mut Vec<u8>, id: [u32; 2], place: [u64; 4], link: [u32; 2], table: [u64; 2]) {
    push_u32(bytes, id[0]);
    push_u32(bytes, id[1]);
    for value in place {
        push_u64(bytes, value);
    }
    push_u32(bytes, link[0]);
    push_u32(bytes, link[1]);
    push_u64(bytes, table[0]);
    push_u64(bytes, table[1]);
}
