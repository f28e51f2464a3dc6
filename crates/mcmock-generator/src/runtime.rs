//! C runtime linked with every generated mock
//!
//! Generated sources include [`RUNTIME_HEADER`] and call into it to queue,
//! consume and verify expectations. Both files are embedded in the binary
//! and written next to the mocks on request.

use mcmock_core::Result;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::writer::OutputWriter;

/// Name of the C runtime header every generated source includes
pub const RUNTIME_HEADER: &str = "mcmock.h";
/// Name of the C runtime source
pub const RUNTIME_SOURCE: &str = "mcmock.c";

pub const RUNTIME_HEADER_TEXT: &str = include_str!("../runtime/mcmock.h");
pub const RUNTIME_SOURCE_TEXT: &str = include_str!("../runtime/mcmock.c");

/// Write `mcmock.h` and `mcmock.c` into `dir`
pub fn write_runtime(writer: &dyn OutputWriter, dir: &Path) -> Result<(PathBuf, PathBuf)> {
    let header = writer.write(dir, RUNTIME_HEADER, RUNTIME_HEADER_TEXT)?;
    let source = writer.write(dir, RUNTIME_SOURCE, RUNTIME_SOURCE_TEXT)?;
    info!("Wrote the mcmock runtime to {:?}", dir);
    Ok((header, source))
}
