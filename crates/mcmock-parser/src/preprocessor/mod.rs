//! Header Preprocessing
//!
//! Approximates the C preprocessor for one header: macro expansion,
//! conditional block stripping and include resolution.

pub mod conditional;
pub mod headers;
pub mod macros;

pub use conditional::{Clause, Condition, ConditionalStripper, Directive, Operator, Symbol};
pub use headers::{FsReader, HeaderResolver, MemoryReader, SourceReader};
pub use macros::{Expansion, MacroExpander};

use mcmock_core::DefinedSymbol;

use crate::preparse::PreParsedHeader;

/// Symbols visible from one header
///
/// The header's own symbols are searched first, then each included header
/// in inclusion order. First match wins.
#[derive(Clone, Copy)]
pub struct SymbolTable<'a> {
    header: &'a PreParsedHeader,
    includes: &'a [&'a PreParsedHeader],
}

impl<'a> SymbolTable<'a> {
    pub fn new(header: &'a PreParsedHeader, includes: &'a [&'a PreParsedHeader]) -> Self {
        Self { header, includes }
    }

    pub fn lookup(&self, name: &str) -> Option<&'a DefinedSymbol> {
        self.header
            .lookup(name)
            .or_else(|| self.includes.iter().find_map(|h| h.lookup(name)))
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}
