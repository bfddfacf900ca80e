//! Annotated memory dumps. Each 8-byte word gets notes guessing at what it is: a saved
//! stack or base pointer, a return address, a small integer, etc.
use super::Context;
use crate::coredump::CoreDump;
use crate::utils::{Styling, u64_hex, uwriteln};
use std::io::Write;
use thiserror::Error;

/// Largest range we'll dump.
pub const MAX_DUMP_LEN: u64 = 0x10000;

/// User space code lives here.
const CODE_RANGE: std::ops::RangeInclusive<u64> = 0x400000..=0xFFFFFF;

/// Start of the higher half kernel.
const KERNEL_BASE: u64 = 0xffffffff80000000;

const BANNER_WIDTH: usize = 95;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum RequestError {
    #[error("end address must be greater than start address")]
    EmptyRange,

    #[error("requested range too large ({len} bytes, max 64KiB)")]
    RangeTooLarge { len: u64 },

    #[error("address range {start:#018x}..{end:#018x} is not fully covered by present segments")]
    Uncovered { start: u64, end: u64 },

    #[error("segment index {index} out of range ({count} valid segments)")]
    SegmentOutOfRange { index: usize, count: usize },

    #[error("segment [{index}] is not present in the dump")]
    SegmentNotPresent { index: usize },
}

/// Notes for the word at va. Any number of notes may apply.
pub fn annotate_word(cx: &Context, va: u64, value: u64) -> Vec<String> {
    let h = &cx.dump.header;
    let trap_rsp = h.trap_frame.rsp;
    let mut notes = Vec::new();

    let markers = [
        (trap_rsp, "<-- trap RSP"),
        (trap_rsp.wrapping_sub(8), "<-- trap RSP-8"),
        (trap_rsp.wrapping_add(8), "<-- trap RSP+8"),
        (h.trap_regs.rbp, "<-- trap RBP"),
        (h.saved_frame.rsp, "<-- saved RSP"),
        (h.saved_regs.rbp, "<-- saved RBP"),
    ];
    for (addr, note) in markers {
        if va == addr {
            notes.push(note.to_string());
        }
    }

    if value == 0 {
        notes.push("[zero]".to_string());
    }
    if value > 0 && value < 0x1000 {
        notes.push(format!("[small: {value}]"));
    }
    if CODE_RANGE.contains(&value) {
        match cx.resolver.lookup(value) {
            Some(name) => notes.push(format!("[code: {name}]")),
            None => notes.push("[code addr?]".to_string()),
        }
    }
    // top 16 bits of a 48-bit user stack address
    if matches!(value >> 32, 0x7ffe | 0x7fff) {
        notes.push("[stack ptr?]".to_string());
    }
    if value == h.trap_frame.rip {
        notes.push("[== trap RIP]".to_string());
    }
    if value == h.saved_frame.rip {
        notes.push("[== saved RIP]".to_string());
    }
    if value >= KERNEL_BASE {
        if let Some(name) = cx.resolver.lookup(value) {
            notes.push(format!("[kernel: {name}]"));
        }
    }
    notes
}

/// Dumps [start, end) as annotated words followed by hex and ASCII. Start is rounded
/// down to a multiple of 8.
pub fn dump_range(
    out: &mut impl Write,
    cx: &Context,
    start: u64,
    end: u64,
) -> Result<(), RequestError> {
    let start = start & !7;
    let len = match end.checked_sub(start) {
        Some(len) if len > 0 => len,
        _ => return Err(RequestError::EmptyRange),
    };
    if len > MAX_DUMP_LEN {
        return Err(RequestError::RangeTooLarge { len });
    }
    let data = cx
        .dump
        .read_range(start, len)
        .ok_or(RequestError::Uncovered { start, end })?;

    let h = &cx.dump.header;
    let trap_rsp = h.trap_frame.rsp;
    let rule = "=".repeat(BANNER_WIDTH);
    uwriteln!(out);
    uwriteln!(out, "{rule}");
    uwriteln!(
        out,
        "  Memory dump: {} .. {}  ({len} bytes, {} words)",
        u64_hex(start),
        u64_hex(end),
        len / 8
    );
    uwriteln!(
        out,
        "  Trap RSP: {}  Trap RIP: {}",
        u64_hex(trap_rsp),
        u64_hex(h.trap_frame.rip)
    );
    uwriteln!(
        out,
        "  Stack grows toward lower addresses (v); callers toward higher addresses (^)"
    );
    uwriteln!(out, "{rule}");
    uwriteln!(
        out,
        "      {:<20}  {:<18}  NOTES",
        "VIRTUAL ADDRESS",
        "VALUE (LE uint64)"
    );
    uwriteln!(out, "      {}  {}  {}", "-".repeat(18), "-".repeat(18), "-".repeat(40));

    for (va, chunk) in (start..).step_by(8).zip(data.chunks_exact(8)) {
        let mut word = [0; 8];
        word.copy_from_slice(chunk);
        let value = u64::from_le_bytes(word);
        let gutter = match va.cmp(&trap_rsp) {
            std::cmp::Ordering::Less => " v ",
            std::cmp::Ordering::Equal => ">>>",
            std::cmp::Ordering::Greater => " ^ ",
        };
        let notes = annotate_word(cx, va, value).join("  ");
        if notes.is_empty() {
            uwriteln!(out, "  {} {}    {}", gutter.dump_gutter(), u64_hex(va), u64_hex(value));
        } else {
            uwriteln!(
                out,
                "  {} {}    {}  {}",
                gutter.dump_gutter(),
                u64_hex(va),
                u64_hex(value),
                notes.dump_note()
            );
        }
    }
    uwriteln!(out, "{rule}");

    uwriteln!(out);
    uwriteln!(out, "  Raw hex bytes:");
    write_hex_rows(out, start, &data);
    Ok(())
}

/// Dumps all of a present segment.
pub fn dump_segment(out: &mut impl Write, cx: &Context, index: usize) -> Result<(), RequestError> {
    let segments = cx.dump.valid_segments();
    let segment = segments.get(index).ok_or(RequestError::SegmentOutOfRange {
        index,
        count: segments.len(),
    })?;
    if !segment.present {
        return Err(RequestError::SegmentNotPresent { index });
    }
    let end = segment.end().unwrap_or(u64::MAX);
    dump_range(out, cx, segment.vaddr, end)
}

/// Prints the error and, if the range wasn't covered, what is.
pub fn report_request_error(out: &mut impl Write, dump: &CoreDump, err: &RequestError) {
    uwriteln!(out, "{}", format!("Error: {err}").warn());
    if let RequestError::Uncovered { .. } = err {
        uwriteln!(out, "Available segments:");
        for (i, s) in dump.valid_segments().iter().enumerate() {
            let end = s.end().map_or("overflow".to_string(), u64_hex);
            let present = if s.present { "present" } else { "NOT present" };
            uwriteln!(out, "  [{i}] {}..{end} {present}", u64_hex(s.vaddr));
        }
    }
}

/// 16 bytes per row:
///   0x0000000000007000:  48 65 6c 6c 6f 00 ...                            |Hello...|
fn write_hex_rows(out: &mut impl Write, start: u64, data: &[u8]) {
    for (va, row) in (start..).step_by(16).zip(data.chunks(16)) {
        let hex: Vec<String> = row.iter().map(|b| format!("{b:02x}")).collect();
        let hex = format!("{:<48}", hex.join(" "));
        let ascii: String = row
            .iter()
            .map(|&b| if (32..127).contains(&b) { b as char } else { '.' })
            .collect();
        uwriteln!(
            out,
            "  {}:  {}  |{}|",
            u64_hex(va).hex_offset(),
            hex.hex_hex(),
            ascii.hex_ascii()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coredump::SegmentType;
    use crate::resolve::{LookupLimits, NoDemangle, Resolver, SymbolSource};
    use crate::testing::{DumpBuilder, ElfBuilder};
    use crate::utils::captured;

    const RSP: u64 = 0x7ffefffeed98;
    const PAGE: u64 = 0x7ffefffee000;

    fn words(values: &[u64]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn dump_bytes() -> Vec<u8> {
        let elf = ElfBuilder::new()
            .section(".text", 0x401000, 0x1000)
            .symbol("kmain", 0x401000, 0x100, 2)
            .symbol("page_fault", 0xffffffff80001000, 0x200, 2)
            .build();
        let mut stack = vec![0u8; 0xd90];
        stack.extend(words(&[
            0x401020,           // 0xd90: code
            0x7ffefffeee00,     // 0xd98: trap rsp, stack pointer
            5,                  // 0xda0: small
            0x1234567812345678, // 0xda8
            0xffffffff80001010, // 0xdb0: kernel
        ]));
        stack.resize(0x1000, 0x41);
        DumpBuilder::new()
            .header(|h| {
                h.trap_frame.rip = 0x1234567812345678;
                h.trap_frame.rsp = RSP;
                h.trap_regs.rbp = RSP + 0x10;
                h.saved_frame.rsp = RSP;
                h.saved_frame.rip = 0x401020;
            })
            .segment(PAGE, SegmentType::StackPage, stack)
            .absent(PAGE + 0x1000, 0x1000, SegmentType::StackPage)
            .elf(elf)
            .build()
    }

    fn with_context<F: FnOnce(&Context)>(f: F) {
        let bytes = dump_bytes();
        let dump = CoreDump::decode(&bytes).unwrap();
        let source = SymbolSource::from_elf(
            "embedded",
            dump.embedded_elf().unwrap(),
            LookupLimits::default(),
            &NoDemangle,
        );
        let resolver = Resolver::new(vec![source]);
        let cx = Context {
            dump: &dump,
            resolver: &resolver,
            explain: false,
        };
        f(&cx);
    }

    #[test]
    fn notes_are_independent() {
        with_context(|cx| {
            let notes = annotate_word(cx, RSP, 0x7ffefffeee00);
            assert_eq!(notes, vec!["<-- trap RSP", "<-- saved RSP", "[stack ptr?]"]);

            // code address that is also the saved rip
            let notes = annotate_word(cx, RSP - 8, 0x401020);
            assert_eq!(
                notes,
                vec!["<-- trap RSP-8", "[code: kmain+0x20]", "[== saved RIP]"]
            );

            let notes = annotate_word(cx, RSP + 8, 5);
            assert_eq!(notes, vec!["<-- trap RSP+8", "[small: 5]"]);

            let notes = annotate_word(cx, RSP + 0x10, 0);
            assert_eq!(notes, vec!["<-- trap RBP", "[zero]"]);

            let notes = annotate_word(cx, 0x10, 0x900000);
            assert_eq!(notes, vec!["[code addr?]"]);

            let notes = annotate_word(cx, 0x10, 0xffffffff80001010);
            assert_eq!(notes, vec!["[kernel: page_fault+0x10]"]);

            let notes = annotate_word(cx, 0x10, 0xffffffff90000000);
            assert!(notes.is_empty());

            let notes = annotate_word(cx, 0x10, 0x1234567812345678);
            assert_eq!(notes, vec!["[== trap RIP]"]);

            for value in [0x7fffffffe000, 0x7ffe00000000, 0x7fffffffffff] {
                assert_eq!(annotate_word(cx, 0x10, value), vec!["[stack ptr?]"]);
            }
            assert!(annotate_word(cx, 0x10, 0x7ffdffffffff).is_empty());
            assert!(annotate_word(cx, 0x10, 0x800000000000).is_empty());
        });
    }

    #[test]
    fn word_lines() {
        with_context(|cx| {
            let text = captured(|out| dump_range(out, cx, RSP - 8, RSP + 0x20).unwrap());
            let lines: Vec<&str> = text
                .lines()
                .filter(|l| l.contains("    0x"))
                .map(|l| l.trim())
                .collect();

            assert_eq!(lines.len(), 5);
            insta::assert_snapshot!(lines[0], @"v 0x00007ffefffeed90    0x0000000000401020  <-- trap RSP-8  [code: kmain+0x20]  [== saved RIP]");
            insta::assert_snapshot!(lines[1], @">>> 0x00007ffefffeed98    0x00007ffefffeee00  <-- trap RSP  <-- saved RSP  [stack ptr?]");
            insta::assert_snapshot!(lines[2], @"^ 0x00007ffefffeeda0    0x0000000000000005  <-- trap RSP+8  [small: 5]");
            insta::assert_snapshot!(lines[3], @"^ 0x00007ffefffeeda8    0x1234567812345678  <-- trap RBP  [== trap RIP]");
            insta::assert_snapshot!(lines[4], @"^ 0x00007ffefffeedb0    0xffffffff80001010  [kernel: page_fault+0x10]");
            assert!(text.contains("(40 bytes, 5 words)"));
        });
    }

    #[test]
    fn hex_rows() {
        with_context(|cx| {
            let text = captured(|out| dump_range(out, cx, PAGE + 0xff0, PAGE + 0x1000).unwrap());
            let row = text
                .lines()
                .find(|l| l.contains("0x00007ffefffeeff0:"))
                .unwrap();
            insta::assert_snapshot!(row.trim(), @"0x00007ffefffeeff0:  41 41 41 41 41 41 41 41 41 41 41 41 41 41 41 41   |AAAAAAAAAAAAAAAA|");
        });
    }

    #[test]
    fn start_is_aligned() {
        with_context(|cx| {
            let text = captured(|out| dump_range(out, cx, RSP + 3, RSP + 8).unwrap());
            assert!(text.contains("Memory dump: 0x00007ffefffeed98 .. 0x00007ffefffeeda0"));
            assert!(text.contains("(8 bytes, 1 words)"));
        });
    }

    #[test]
    fn bad_requests() {
        with_context(|cx| {
            let mut out = Vec::new();
            assert_eq!(
                dump_range(&mut out, cx, PAGE + 0x10, PAGE + 0x10),
                Err(RequestError::EmptyRange)
            );
            assert_eq!(
                dump_range(&mut out, cx, PAGE + 0x10, PAGE + 0x8),
                Err(RequestError::EmptyRange)
            );
            assert_eq!(
                dump_range(&mut out, cx, PAGE, PAGE + 0x10008),
                Err(RequestError::RangeTooLarge { len: 0x10008 })
            );
            assert_eq!(
                dump_range(&mut out, cx, PAGE + 0xff8, PAGE + 0x1008),
                Err(RequestError::Uncovered {
                    start: PAGE + 0xff8,
                    end: PAGE + 0x1008
                })
            );
            assert!(out.is_empty());

            assert_eq!(
                dump_segment(&mut out, cx, 2),
                Err(RequestError::SegmentOutOfRange { index: 2, count: 2 })
            );
            assert_eq!(
                dump_segment(&mut out, cx, 1),
                Err(RequestError::SegmentNotPresent { index: 1 })
            );
        });
    }

    #[test]
    fn whole_segment() {
        with_context(|cx| {
            let text = captured(|out| dump_segment(out, cx, 0).unwrap());
            assert!(text.contains("(4096 bytes, 512 words)"));
        });
    }

    #[test]
    fn uncovered_report() {
        with_context(|cx| {
            let err = RequestError::Uncovered {
                start: PAGE + 0xff8,
                end: PAGE + 0x1008,
            };
            let text = captured(|out| report_request_error(out, cx.dump, &err));
            assert!(text.contains("Error: address range 0x00007ffefffeeff8..0x00007ffefffef008"));
            assert!(text.contains("Available segments:"));
            assert!(text.contains("[0] 0x00007ffefffee000..0x00007ffefffef000 present"));
            assert!(text.contains("[1] 0x00007ffefffef000..0x00007ffeffff0000 NOT present"));

            let text = captured(|out| report_request_error(out, cx.dump, &RequestError::EmptyRange));
            assert!(!text.contains("Available segments:"));
        });
    }
}
