//! Persistence of generated mock files

use mcmock_core::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Persists one generated file, overwriting any previous version
pub trait OutputWriter: Send + Sync {
    fn write(&self, dir: &Path, file_name: &str, contents: &str) -> Result<PathBuf>;
}

/// Writes straight to the file system
#[derive(Debug, Clone, Copy, Default)]
pub struct FsWriter;

impl OutputWriter for FsWriter {
    fn write(&self, dir: &Path, file_name: &str, contents: &str) -> Result<PathBuf> {
        let path = dir.join(file_name);
        fs::write(&path, contents)?;
        debug!("Wrote {} bytes to {:?}", contents.len(), path);
        Ok(path)
    }
}
