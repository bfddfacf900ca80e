use super::offset_name;

#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct SectionEntry {
    pub vaddr: u64,
    pub size: u64,
    pub name: String,
}

impl SectionEntry {
    pub fn new(vaddr: u64, size: u64, name: String) -> Self {
        SectionEntry { vaddr, size, name }
    }
}

/// Allocated sections sorted by address. Used when no symbol names an address.
pub struct SectionTable {
    sections: Vec<SectionEntry>,
}

impl SectionTable {
    pub fn new(mut sections: Vec<SectionEntry>) -> Self {
        sections.sort();
        SectionTable { sections }
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SectionEntry> {
        self.sections.iter()
    }

    /// Unlike symbols sections have exact bounds: addr must be inside the section.
    pub fn lookup(&self, addr: u64) -> Option<String> {
        let index = self.sections.partition_point(|s| s.vaddr <= addr);
        let section = &self.sections[index.checked_sub(1)?];
        let offset = addr - section.vaddr;
        (offset < section.size).then(|| offset_name(&section.name, offset))
    }
}
