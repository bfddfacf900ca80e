use crate::resolve::LookupLimits;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Analyze WOS kernel core dumps.
///
/// Prints the dump's header, registers, segments, and embedded ELF image. Symbols from
/// the embedded image are always used to name addresses, --symbols adds more.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a {program}_{timestamp}_coredump.bin file
    pub dump: PathBuf,

    /// Dump memory from START to END as annotated words plus raw hex
    #[arg(
        long,
        num_args = 2,
        value_names = ["START", "END"],
        value_parser = parse_u64_expr,
        conflicts_with = "dump_segment"
    )]
    pub dump_range: Option<Vec<u64>>,

    /// Dump the full contents of the segment at INDEX
    #[arg(long, value_name = "INDEX")]
    pub dump_segment: Option<usize>,

    /// Load symbols from an ELF file (can be repeated)
    #[arg(long = "symbols", value_name = "ELF")]
    pub symbols: Vec<PathBuf>,

    /// Print the symbol for ADDR (can be repeated)
    #[arg(long, value_name = "ADDR", value_parser = parse_u64_expr)]
    pub resolve: Vec<u64>,

    /// List the sections from every ELF image
    #[arg(long)]
    pub sections: bool,

    /// Print help for each field
    #[arg(short, long)]
    pub explain: bool,

    /// c++filt style program used to demangle symbols
    #[arg(long, value_name = "PROG", default_value = "llvm-cxxfilt")]
    pub demangler: String,

    /// Seconds to wait for the demangler
    #[arg(long, value_name = "SECS", default_value_t = 10)]
    pub demangle_timeout: u64,

    /// Leave symbol names mangled
    #[arg(long)]
    pub no_demangle: bool,

    /// How far past the end of a sized symbol an address can be and still use it
    #[arg(long, value_name = "N", value_parser = parse_u64_expr, default_value = "0x100")]
    pub sized_slack: u64,

    /// How far past an unsized symbol an address can be and still use it
    #[arg(long, value_name = "N", value_parser = parse_u64_expr, default_value = "0x10000")]
    pub unsized_slack: u64,
}

impl Cli {
    pub fn limits(&self) -> LookupLimits {
        LookupLimits {
            sized_slack: self.sized_slack,
            unsized_slack: self.unsized_slack,
        }
    }

    pub fn demangle_timeout(&self) -> Duration {
        Duration::from_secs(self.demangle_timeout)
    }
}

/// Hex with a 0x prefix or decimal.
pub fn parse_u64_expr(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let result = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    result.map_err(|_| format!("`{s}` isn't a hex or decimal number"))
}
