use super::{Demangler, LookupLimits, demangle_batch, offset_name};

#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct Symbol {
    // field order gives the sort order: address, then name, then size
    pub addr: u64,
    pub name: String,

    /// Zero if unknown.
    pub size: u64,
}

/// Collects symbols while an ELF image is being walked.
#[derive(Default)]
pub struct SymbolTableBuilder {
    symbols: Vec<Symbol>,
}

/// Symbols sorted by address. Immutable once built.
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    limits: LookupLimits,
}

impl SymbolTableBuilder {
    pub fn new() -> Self {
        SymbolTableBuilder::default()
    }

    pub fn add(&mut self, addr: u64, name: String, size: u64) {
        self.symbols.push(Symbol { addr, name, size });
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Demangles every name in one batch and sorts.
    pub fn finish(self, limits: LookupLimits, demangler: &dyn Demangler) -> SymbolTable {
        let names: Vec<String> = self.symbols.iter().map(|s| s.name.clone()).collect();
        let names = demangle_batch(demangler, names);

        let mut symbols: Vec<Symbol> = self
            .symbols
            .into_iter()
            .zip(names)
            .map(|(s, name)| Symbol { name, ..s })
            .collect();
        symbols.sort();
        SymbolTable { symbols, limits }
    }
}

impl SymbolTable {
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    /// Names addr using the closest symbol at or below it. Returns None if there is no
    /// such symbol or addr is too far past it.
    pub fn lookup(&self, addr: u64) -> Option<String> {
        let index = self.symbols.partition_point(|s| s.addr <= addr);
        let symbol = &self.symbols[index.checked_sub(1)?];

        let offset = addr - symbol.addr;
        let limit = if symbol.size > 0 {
            if offset < symbol.size {
                offset
            } else {
                self.limits.sized_slack
            }
        } else {
            self.limits.unsized_slack
        };
        if offset > limit {
            return None;
        }
        Some(offset_name(&symbol.name, offset))
    }
}
