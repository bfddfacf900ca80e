//! Naming addresses. Symbol and section tables are built once from parsed ELF images
//! and then only queried. A [`Resolver`] combines the tables from every image we know
//! about in the order the user gave them.
pub mod demangle;
pub mod resolver;
pub mod sections;
pub mod symbols;

pub use demangle::*;
pub use resolver::*;
pub use sections::*;
pub use symbols::*;

/// How far past a symbol an address can be and still be named after it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LookupLimits {
    /// Symbols with a size still match this far from their start even when the offset
    /// is past the end (sizes on hand written assembly are often wrong).
    pub sized_slack: u64,

    /// Symbols without a size match this far from their start.
    pub unsized_slack: u64,
}

impl Default for LookupLimits {
    fn default() -> Self {
        LookupLimits {
            sized_slack: 0x100,
            unsized_slack: 0x10000,
        }
    }
}

/// "name" or "name+0x1a".
pub fn offset_name(name: &str, offset: u64) -> String {
    if offset == 0 {
        name.to_string()
    } else {
        format!("{name}+0x{offset:x}")
    }
}
