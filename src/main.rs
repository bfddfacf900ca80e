mod cli;
mod commands;
mod coredump;
mod elf;
mod resolve;
#[cfg(test)]
mod testing;
mod utils;

use clap::Parser;
use cli::Cli;
use commands::Context;
use coredump::{CoreDump, MAX_SEGMENTS};
use memmap2::Mmap;
use resolve::{CxxFilt, Demangler, NoDemangle, Resolver, SymbolSource};
use std::error::Error;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::process;
use utils::warn;

fn map_file(path: &Path) -> Result<Mmap, Box<dyn Error>> {
    let file = File::open(path)?;

    // This is unsafe because it has undefined behavior if the underlying file is
    // modified while the memory map is in use.
    let bytes = unsafe { Mmap::map(&file) }?;
    Ok(bytes)
}

fn warn_about_layout(dump: &CoreDump) {
    if dump.too_many_segments() {
        warn(&format!(
            "segment count {} is larger than the table ({MAX_SEGMENTS}), using the first {MAX_SEGMENTS}",
            dump.header.segment_count
        ));
    }
    for (i, j) in dump.overlaps() {
        warn(&format!(
            "segments {i} and {j} overlap, using segment {i} for the shared addresses"
        ));
    }
}

/// Symbols from the embedded image first, then each --symbols file in order.
fn load_sources(cli: &Cli, dump: &CoreDump, demangler: &dyn Demangler) -> Vec<SymbolSource> {
    let limits = cli.limits();
    let mut sources = Vec::new();
    if let Some(elf) = dump.embedded_elf() {
        sources.push(SymbolSource::from_elf("embedded", elf, limits, demangler));
    }
    for path in cli.symbols.iter() {
        let label = path.display().to_string();
        match map_file(path) {
            Ok(bytes) => {
                let source = SymbolSource::from_elf(&label, &bytes, limits, demangler);
                if source.is_empty() {
                    warn(&format!("no symbols or sections found in {label}"));
                }
                sources.push(source);
            }
            Err(err) => warn(&format!("couldn't open {label}: {err}")),
        }
    }
    sources
}

fn run(cli: &Cli) -> Result<bool, Box<dyn Error>> {
    let bytes = map_file(&cli.dump)?;
    let dump = CoreDump::decode(&bytes)?;
    warn_about_layout(&dump);

    let demangler: Box<dyn Demangler> = if cli.no_demangle {
        Box::new(NoDemangle)
    } else {
        Box::new(CxxFilt::new(&cli.demangler, cli.demangle_timeout()))
    };
    let resolver = Resolver::new(load_sources(cli, &dump, demangler.as_ref()));
    let cx = Context {
        dump: &dump,
        resolver: &resolver,
        explain: cli.explain,
    };

    let mut out = io::stdout().lock();
    commands::print_header(&mut out, &cx, &cli.dump);
    commands::print_registers(&mut out, &cx);
    commands::print_segments(&mut out, &cx);
    commands::print_elf(&mut out, &cx);
    if cli.sections {
        commands::print_sections(&mut out, &cx);
    }
    if !cli.resolve.is_empty() {
        commands::print_resolved(&mut out, &cx, &cli.resolve);
    }

    let mut ok = true;
    if let Some(range) = &cli.dump_range {
        if let Err(err) = commands::dump_range(&mut out, &cx, range[0], range[1]) {
            let _ = out.flush();
            commands::report_request_error(&mut io::stderr(), &dump, &err);
            ok = false;
        }
    }
    if let Some(index) = cli.dump_segment {
        if let Err(err) = commands::dump_segment(&mut out, &cx, index) {
            let _ = out.flush();
            commands::report_request_error(&mut io::stderr(), &dump, &err);
            ok = false;
        }
    }
    Ok(ok)
}

fn main() {
    env_logger::init();
    utils::generate_style_file();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(true) => (),
        Ok(false) => process::exit(1),
        Err(err) => {
            warn(&format!("{}: {err}", cli.dump.display()));
            process::exit(1);
        }
    }
}
