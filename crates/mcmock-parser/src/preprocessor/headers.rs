//! Header File Resolver
//!
//! Finds the files behind `#include "..."` directives and reads them through
//! a [`SourceReader`], so tests can supply headers from memory.

use mcmock_core::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read access to header sources
pub trait SourceReader: Send + Sync {
    /// Read the text of `path`; a missing file is [`Error::FileNotFound`]
    fn read(&self, path: &Path) -> Result<String>;

    fn exists(&self, path: &Path) -> bool;
}

/// Reads headers from the file system
#[derive(Debug, Default, Clone, Copy)]
pub struct FsReader;

impl SourceReader for FsReader {
    fn read(&self, path: &Path) -> Result<String> {
        if !path.is_file() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
        Ok(std::fs::read_to_string(path)?)
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// Headers held in memory, keyed by path
#[derive(Debug, Default, Clone)]
pub struct MemoryReader {
    files: HashMap<PathBuf, String>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.files.insert(path.into(), text.into());
        self
    }
}

impl SourceReader for MemoryReader {
    fn read(&self, path: &Path) -> Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| Error::FileNotFound(path.display().to_string()))
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }
}

/// Resolves application includes against a list of search directories
pub struct HeaderResolver<R = FsReader> {
    reader: R,
    /// Include search paths
    include_paths: Vec<PathBuf>,
}

impl HeaderResolver<FsReader> {
    pub fn new(include_paths: Vec<PathBuf>) -> Self {
        Self::with_reader(FsReader, include_paths)
    }
}

impl<R: SourceReader> HeaderResolver<R> {
    pub fn with_reader(reader: R, include_paths: Vec<PathBuf>) -> Self {
        let mut resolver = Self {
            reader,
            include_paths: Vec::new(),
        };
        for path in include_paths {
            resolver.add_include_path(path);
        }
        resolver
    }

    /// Add an include path
    pub fn add_include_path(&mut self, path: PathBuf) {
        if !self.include_paths.contains(&path) {
            self.include_paths.push(path);
        }
    }

    /// Get all include paths
    pub fn include_paths(&self) -> &[PathBuf] {
        &self.include_paths
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Resolve an application include
    ///
    /// The directory of the including file is tried first, then each include
    /// path in order. First match wins.
    pub fn resolve(&self, header: &str, from_file: Option<&Path>) -> Option<PathBuf> {
        if let Some(parent) = from_file.and_then(Path::parent) {
            let relative_path = parent.join(header);
            if self.reader.exists(&relative_path) {
                debug!("Resolved {} relative to {:?}", header, from_file);
                return Some(relative_path);
            }
        }

        for include_path in &self.include_paths {
            let full_path = include_path.join(header);
            if self.reader.exists(&full_path) {
                debug!("Resolved {} in {:?}", header, include_path);
                return Some(full_path);
            }
        }

        debug!("Failed to resolve header: {}", header);
        None
    }

    pub fn read(&self, path: &Path) -> Result<String> {
        self.reader.read(path)
    }
}
