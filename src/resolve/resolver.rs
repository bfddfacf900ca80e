use super::{Demangler, LookupLimits, SectionTable, SymbolTable};
use crate::elf::{parse_sections, parse_symbols};

/// The tables parsed from one ELF image.
pub struct SymbolSource {
    /// Where the tables came from, e.g. "embedded" or a path.
    pub label: String,
    pub symbols: Option<SymbolTable>,
    pub sections: Option<SectionTable>,
}

impl SymbolSource {
    pub fn from_elf(
        label: &str,
        bytes: &[u8],
        limits: LookupLimits,
        demangler: &dyn Demangler,
    ) -> Self {
        let symbols = parse_symbols(bytes, limits, demangler);
        let sections = parse_sections(bytes);
        log::info!(
            "{label}: {} symbols, {} sections",
            symbols.as_ref().map_or(0, |t| t.len()),
            sections.as_ref().map_or(0, |t| t.len())
        );
        SymbolSource {
            label: label.to_string(),
            symbols,
            sections,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_none() && self.sections.is_none()
    }
}

/// Names addresses using every source we have. Symbols from any source beat sections
/// from any source; within each kind sources are tried in order.
pub struct Resolver {
    sources: Vec<SymbolSource>,
}

impl Resolver {
    pub fn new(sources: Vec<SymbolSource>) -> Self {
        Resolver { sources }
    }

    pub fn sources(&self) -> &[SymbolSource] {
        &self.sources
    }

    pub fn lookup(&self, addr: u64) -> Option<String> {
        self.sources
            .iter()
            .filter_map(|s| s.symbols.as_ref())
            .find_map(|t| t.lookup(addr))
            .or_else(|| {
                self.sources
                    .iter()
                    .filter_map(|s| s.sections.as_ref())
                    .find_map(|t| t.lookup(addr))
            })
    }
}
