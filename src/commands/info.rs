use super::Context;
use super::tables::{Fields, Table};
use crate::coredump::InterruptVector;
use crate::elf::{ElfHeader, Reader};
use crate::utils::{Styling, u64_hex, uwriteln};
use std::io::Write;
use std::path::Path;

/// Dumps are written as {program}_{timestamp}_coredump.bin.
pub fn program_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_string_lossy();
    match stem.find('_') {
        Some(i) if i > 0 => Some(stem[..i].to_string()),
        _ => None,
    }
}

fn title(out: &mut impl Write, title: &str) {
    uwriteln!(out);
    uwriteln!(out, "{}", title.section_title());
}

pub fn print_header(out: &mut impl Write, cx: &Context, path: &Path) {
    let h = &cx.dump.header;
    let mut fields = Fields::new();
    fields.add("file", path.display(), "path to the core dump");
    if let Some(name) = program_name(path) {
        fields.add("program", name, "program that crashed, from the dump's file name");
    }
    fields.add("magic", u64_hex(h.magic), "identifies the file as a WOS core dump");
    fields.add("version", h.version, "dump layout version");
    fields.add("header size", h.header_size, "size of the fixed header in bytes");
    fields.add(
        "timestamp",
        h.timestamp,
        "scheduler quantums since boot when the dump was written",
    );
    fields.add("pid", h.pid, "id of the task that crashed");
    fields.add("cpu", h.cpu, "CPU the task was running on");
    fields.add(
        "interrupt",
        format!("{} ({})", h.int_num, InterruptVector::new(h.int_num)),
        "the exception or interrupt vector that triggered the dump",
    );
    fields.add("error code", u64_hex(h.err_code), "error code pushed by the CPU");
    fields.add(
        "cr2",
        cx.fmt_addr(h.cr2),
        "the faulting address for page faults",
    );
    fields.add("cr3", u64_hex(h.cr3), "physical address of the page table root");
    fields.add(
        "task entry",
        cx.fmt_addr(h.task_entry),
        "entry point of the crashed task",
    );
    fields.add(
        "task pagemap",
        u64_hex(h.task_pagemap),
        "the task's page map",
    );
    fields.add(
        "ELF header",
        u64_hex(h.elf_header_addr),
        "where the task's ELF header was loaded",
    );
    fields.add(
        "program headers",
        u64_hex(h.program_header_addr),
        "where the task's program headers were loaded",
    );

    title(out, "Header");
    fields.writeln(out, cx.explain);
}

/// Trap and saved values side by side.
pub fn print_registers(out: &mut impl Write, cx: &Context) {
    let h = &cx.dump.header;
    let mut table = Table::new()
        .left("register", "frame field or general purpose register")
        .left("trap", "value when the interrupt was taken")
        .left("saved", "value from the task's last saved context");

    let frames = h.trap_frame.fields().into_iter().zip(h.saved_frame.fields());
    let regs = h.trap_regs.fields().into_iter().zip(h.saved_regs.fields());
    for ((name, trap), (_, saved)) in frames.chain(regs) {
        let (trap, saved) = if name == "rip" {
            (cx.fmt_addr(trap), cx.fmt_addr(saved))
        } else {
            (u64_hex(trap), u64_hex(saved))
        };
        table.add_row(vec![name.to_string(), trap, saved]);
    }

    title(out, "Registers");
    table.writeln(out, cx.explain);
}

pub fn print_segments(out: &mut impl Write, cx: &Context) {
    title(out, "Segments");
    let segments = cx.dump.valid_segments();
    if segments.is_empty() {
        uwriteln!(out, "No segments.");
        return;
    }

    let mut table = Table::new()
        .right("index", "position in the dump's segment table")
        .left("type", "what the kernel captured")
        .left("start", "virtual address of the first byte")
        .left("end", "virtual address after the last byte")
        .right("size", "size in bytes (hex)")
        .right("file offset", "where the bytes start in the dump (hex)")
        .left("present", "whether the bytes were captured");
    for (i, s) in segments.iter().enumerate() {
        table.add_row(vec![
            i.to_string(),
            s.stype.to_string(),
            u64_hex(s.vaddr),
            s.end().map_or("overflow".to_string(), u64_hex),
            format!("{:x}", s.size),
            format!("{:x}", s.file_offset),
            if s.present { "present" } else { "NOT present" }.to_string(),
        ]);
    }
    table.writeln(out, cx.explain);
}

/// The embedded ELF image and the symbol sources built from it and from --symbols.
pub fn print_elf(out: &mut impl Write, cx: &Context) {
    let h = &cx.dump.header;
    let mut fields = Fields::new();
    fields.add("size", h.elf_size, "size of the embedded ELF image in bytes");
    fields.add("offset", h.elf_offset, "where the image starts in the dump");

    if h.elf_size != 0 && h.elf_offset != 0 {
        let bytes = Reader::new(cx.dump.bytes()).clamped(h.elf_offset, 4);
        fields.add(
            "magic",
            bytes.escape_ascii(),
            "first bytes of the image, \\x7fELF for ELF files",
        );
        match cx.dump.embedded_elf().and_then(|elf| ElfHeader::new(Reader::new(elf))) {
            Some(header) => {
                fields.add("type", header.stype(), "executable, shared object, etc");
                fields.add("machine", header.machine(), "CPU architecture");
                fields.add("entry", cx.fmt_addr(header.entry), "program entry point");
            }
            None if cx.dump.embedded_elf().is_none() => {
                fields.add("status", "truncated", "the image runs past the end of the dump")
            }
            None => fields.add("status", "not ELF64", "only 64-bit little-endian images are used"),
        }
    }

    title(out, "ELF");
    fields.writeln(out, cx.explain);

    let sources = cx.resolver.sources();
    title(out, "Symbol sources");
    if sources.is_empty() {
        uwriteln!(out, "No symbol sources.");
        return;
    }
    let mut table = Table::new()
        .left("source", "the embedded image or a --symbols file")
        .right("symbols", "function symbols loaded")
        .right("sections", "allocated sections loaded");
    for s in sources {
        table.add_row(vec![
            s.label.clone(),
            s.symbols.as_ref().map_or(0, |t| t.len()).to_string(),
            s.sections.as_ref().map_or(0, |t| t.len()).to_string(),
        ]);
    }
    table.writeln(out, cx.explain);
}

pub fn print_sections(out: &mut impl Write, cx: &Context) {
    for source in cx.resolver.sources() {
        let Some(sections) = &source.sections else {
            continue;
        };
        let mut table = Table::new()
            .left("name", "section name")
            .left("start", "virtual address of the first byte")
            .left("end", "virtual address after the last byte")
            .right("size", "size in bytes (hex)");
        for s in sections.iter() {
            table.add_row(vec![
                s.name.clone(),
                u64_hex(s.vaddr),
                s.vaddr.checked_add(s.size).map_or("overflow".to_string(), u64_hex),
                format!("{:x}", s.size),
            ]);
        }
        title(out, &format!("Sections from {}", source.label));
        table.writeln(out, cx.explain);
    }
}

pub fn print_resolved(out: &mut impl Write, cx: &Context, addrs: &[u64]) {
    title(out, "Resolved");
    for &addr in addrs {
        match cx.resolver.lookup(addr) {
            Some(name) => uwriteln!(out, "{} {name}", u64_hex(addr)),
            None => uwriteln!(out, "{} (unknown)", u64_hex(addr)),
        }
    }
}
