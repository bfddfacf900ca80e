//! The reports wosdump prints. Everything here writes to an io::Write so the reports can
//! be tested against a buffer.
pub mod info;
pub mod memory;
pub mod tables;

pub use info::*;
pub use memory::*;

use crate::coredump::CoreDump;
use crate::resolve::Resolver;
use crate::utils::u64_hex;

/// What every report needs.
pub struct Context<'a> {
    pub dump: &'a CoreDump<'a>,
    pub resolver: &'a Resolver,

    /// Add a line of help for each field.
    pub explain: bool,
}

impl<'a> Context<'a> {
    /// Hex address followed by its symbol, if we know it.
    pub fn fmt_addr(&self, addr: u64) -> String {
        match self.resolver.lookup(addr) {
            Some(name) => format!("{} <{name}>", u64_hex(addr)),
            None => u64_hex(addr),
        }
    }
}
