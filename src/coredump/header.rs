use crate::elf::{OutOfBounds, Stream};
use thiserror::Error;

/// "OSCODUMP" read as a little-endian u64.
pub const COREDUMP_MAGIC: u64 = 0x504D55444F43534F;

/// Size of the fixed header. The segment table and ELF image are located with absolute
/// offsets so the header's own size field is only displayed.
pub const HEADER_SIZE: u64 = 488;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum DecodeError {
    #[error("bad magic: {found:#018x} (expected {expected:#018x})")]
    BadMagic { found: u64, expected: u64 },

    #[error("truncated {what}: {source}")]
    Truncated {
        what: &'static str,
        source: OutOfBounds,
    },
}

impl DecodeError {
    pub fn truncated(what: &'static str) -> impl FnOnce(OutOfBounds) -> DecodeError {
        move |source| DecodeError::Truncated { what, source }
    }
}

/// What the CPU pushed on interrupt (plus the vector and error code the stub pushed).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InterruptFrame {
    pub int_num: u64,
    pub err_code: u64,
    pub rip: u64,
    pub cs: u64,
    pub rflags: u64,
    pub rsp: u64,
    pub ss: u64,
}

/// General purpose registers in the order the interrupt stub pushes them.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GPRegs {
    pub r15: u64,
    pub r14: u64,
    pub r13: u64,
    pub r12: u64,
    pub r11: u64,
    pub r10: u64,
    pub r9: u64,
    pub r8: u64,
    pub rbp: u64,
    pub rdi: u64,
    pub rsi: u64,
    pub rdx: u64,
    pub rcx: u64,
    pub rbx: u64,
    pub rax: u64,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CoreDumpHeader {
    pub magic: u64,
    pub version: u32,
    pub header_size: u32,

    /// In scheduler quantums, not wall clock time.
    pub timestamp: u64,
    pub pid: u64,
    pub cpu: u64,
    pub int_num: u64,
    pub err_code: u64,

    /// Faulting address for page faults.
    pub cr2: u64,

    /// Page table root.
    pub cr3: u64,

    /// State at the moment of the trap.
    pub trap_frame: InterruptFrame,
    pub trap_regs: GPRegs,

    /// The task's last saved context.
    pub saved_frame: InterruptFrame,
    pub saved_regs: GPRegs,

    pub task_entry: u64,
    pub task_pagemap: u64,
    pub elf_header_addr: u64,
    pub program_header_addr: u64,
    pub segment_count: u64,
    pub segment_table_offset: u64,
    pub elf_size: u64,
    pub elf_offset: u64,
}

impl InterruptFrame {
    pub fn read(s: &mut Stream) -> Result<Self, OutOfBounds> {
        Ok(InterruptFrame {
            int_num: s.read_xword()?,
            err_code: s.read_xword()?,
            rip: s.read_xword()?,
            cs: s.read_xword()?,
            rflags: s.read_xword()?,
            rsp: s.read_xword()?,
            ss: s.read_xword()?,
        })
    }

    /// Name and value of each field, in layout order.
    pub fn fields(&self) -> [(&'static str, u64); 7] {
        [
            ("intNum", self.int_num),
            ("errCode", self.err_code),
            ("rip", self.rip),
            ("cs", self.cs),
            ("rflags", self.rflags),
            ("rsp", self.rsp),
            ("ss", self.ss),
        ]
    }
}

impl GPRegs {
    pub fn read(s: &mut Stream) -> Result<Self, OutOfBounds> {
        Ok(GPRegs {
            r15: s.read_xword()?,
            r14: s.read_xword()?,
            r13: s.read_xword()?,
            r12: s.read_xword()?,
            r11: s.read_xword()?,
            r10: s.read_xword()?,
            r9: s.read_xword()?,
            r8: s.read_xword()?,
            rbp: s.read_xword()?,
            rdi: s.read_xword()?,
            rsi: s.read_xword()?,
            rdx: s.read_xword()?,
            rcx: s.read_xword()?,
            rbx: s.read_xword()?,
            rax: s.read_xword()?,
        })
    }

    /// Name and value of each register, rax first (the way people read them).
    pub fn fields(&self) -> [(&'static str, u64); 15] {
        [
            ("rax", self.rax),
            ("rbx", self.rbx),
            ("rcx", self.rcx),
            ("rdx", self.rdx),
            ("rsi", self.rsi),
            ("rdi", self.rdi),
            ("rbp", self.rbp),
            ("r8", self.r8),
            ("r9", self.r9),
            ("r10", self.r10),
            ("r11", self.r11),
            ("r12", self.r12),
            ("r13", self.r13),
            ("r14", self.r14),
            ("r15", self.r15),
        ]
    }
}

impl CoreDumpHeader {
    /// Magic is checked before anything else is read.
    pub fn read(s: &mut Stream) -> Result<Self, DecodeError> {
        let magic = s.read_xword().map_err(DecodeError::truncated("magic"))?;
        if magic != COREDUMP_MAGIC {
            return Err(DecodeError::BadMagic {
                found: magic,
                expected: COREDUMP_MAGIC,
            });
        }
        CoreDumpHeader::read_rest(s, magic).map_err(DecodeError::truncated("header"))
    }

    fn read_rest(s: &mut Stream, magic: u64) -> Result<Self, OutOfBounds> {
        // Check the whole header up front so the error names the header, not a field.
        s.reader.slice(0, HEADER_SIZE)?;
        Ok(CoreDumpHeader {
            magic,
            version: s.read_word()?,
            header_size: s.read_word()?,
            timestamp: s.read_xword()?,
            pid: s.read_xword()?,
            cpu: s.read_xword()?,
            int_num: s.read_xword()?,
            err_code: s.read_xword()?,
            cr2: s.read_xword()?,
            cr3: s.read_xword()?,
            trap_frame: InterruptFrame::read(s)?,
            trap_regs: GPRegs::read(s)?,
            saved_frame: InterruptFrame::read(s)?,
            saved_regs: GPRegs::read(s)?,
            task_entry: s.read_xword()?,
            task_pagemap: s.read_xword()?,
            elf_header_addr: s.read_xword()?,
            program_header_addr: s.read_xword()?,
            segment_count: s.read_xword()?,
            segment_table_offset: s.read_xword()?,
            elf_size: s.read_xword()?,
            elf_offset: s.read_xword()?,
        })
    }
}
