//! Textual rendering of a mock
//!
//! Both emitters write into a `String` through `std::fmt::Write`; a
//! formatting failure surfaces as [`mcmock_core::Error::Render`].

mod header;
mod source;

pub use header::render_header;
pub use source::render_source;

use mcmock_parser::ParsedHeader;
use std::fmt::{self, Write};

use crate::builder::MockData;

/// Name of the table of mocked function names in generated sources
pub const API_NAMES_TABLE: &str = "mocked_api_names";

/// Everything rendered for one header-to-mock
pub struct MockUnit<'a> {
    pub parsed: &'a ParsedHeader,
    pub data: &'a MockData,
    /// Date stamp written into both banners
    pub date: &'a str,
}

impl<'a> MockUnit<'a> {
    pub fn new(parsed: &'a ParsedHeader, data: &'a MockData, date: &'a str) -> Self {
        Self { parsed, data, date }
    }

    pub fn header_file_name(&self) -> String {
        format!("mock_{}.h", self.parsed.mock_name())
    }

    pub fn source_file_name(&self) -> String {
        format!("mock_{}.c", self.parsed.mock_name())
    }

    /// Name the header-to-mock is included by
    pub fn mocked_header(&self) -> &str {
        self.parsed.header.name()
    }

    /// `mocked_api_names[<index>]` for a mocked function
    fn api_name_ref(&self, function: &str) -> String {
        let index = self
            .parsed
            .functions
            .iter()
            .position(|f| f.name == function)
            .unwrap_or_default();
        format!("{}[{}]", API_NAMES_TABLE, index)
    }

    /// Forwarded application includes, then system includes
    fn write_forwarded_includes(&self, out: &mut String) -> fmt::Result {
        let header = &self.parsed.header;
        if !header.application_includes().is_empty() {
            for include in header.application_includes() {
                writeln!(out, "#include \"{}\"", include)?;
            }
            writeln!(out)?;
        }
        if !header.system_includes().is_empty() {
            for include in header.system_includes() {
                writeln!(out, "#include <{}>", include)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

fn write_banner(out: &mut String, file: &str, brief: &str, date: &str) -> fmt::Result {
    writeln!(out, "/**")?;
    writeln!(out, " * @file {}", file)?;
    writeln!(out, " *")?;
    writeln!(out, " * @brief {}", brief)?;
    writeln!(out, " *")?;
    writeln!(out, " * Generated by mcmock on {}. Do not edit, regenerate instead.", date)?;
    writeln!(out, " */")?;
    writeln!(out)
}

fn write_cplusplus_open(out: &mut String) -> fmt::Result {
    writeln!(out, "#ifdef __cplusplus")?;
    writeln!(out, "extern \"C\" {{")?;
    writeln!(out, "#endif")?;
    writeln!(out)
}

fn write_cplusplus_close(out: &mut String) -> fmt::Result {
    writeln!(out, "#ifdef __cplusplus")?;
    writeln!(out, "}}")?;
    writeln!(out, "#endif")?;
    writeln!(out)
}

/// `MOCK_<NAME>_H` with every non-identifier character replaced
fn include_guard(mock_name: &str) -> String {
    let name: String = mock_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("MOCK_{}_H", name)
}
