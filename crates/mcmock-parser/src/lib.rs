//! mcmock Parser
//!
//! Line-oriented understanding of C headers: enough of the preprocessor and
//! the declaration grammar to recover every function a header declares.
//!
//! ## Modules
//!
//! - `lexical` - Comment and blank line removal
//! - `scanner` - Bracket depth tracking shared by every scanning pass
//! - `preparse` - Symbol, include and typedef extraction
//! - `preprocessor` - Macro expansion, conditional stripping, include resolution
//! - `declaration` - Function declaration parsing
//! - `cache` - Cache of pre-parsed included headers

pub mod cache;
pub mod declaration;
pub mod lexical;
pub mod preparse;
pub mod preprocessor;
pub mod scanner;

pub use cache::HeaderCache;
pub use declaration::{classify_parameter, DeclarationParser};
pub use preparse::PreParsedHeader;
pub use preprocessor::{FsReader, HeaderResolver, MemoryReader, SourceReader, SymbolTable};

use mcmock_core::{Function, Result, Warning};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use cache::hash_content;
use preprocessor::{ConditionalStripper, MacroExpander};

/// Everything learnt about one header-to-mock
#[derive(Debug, Clone)]
pub struct ParsedHeader {
    pub path: PathBuf,
    /// The header, pre-parsed again after macro expansion
    pub header: PreParsedHeader,
    /// Pre-parsed application includes, depth-first in inclusion order
    pub includes: Vec<Arc<PreParsedHeader>>,
    /// Declared functions, in declaration order
    pub functions: Vec<Function>,
    pub warnings: Vec<Warning>,
}

impl ParsedHeader {
    /// File name used for the generated `mock_<name>` files
    pub fn mock_name(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.header.name().to_string())
    }
}

/// Runs the parsing pipeline for one header at a time
pub struct HeaderParser<R = FsReader> {
    resolver: HeaderResolver<R>,
    cache: Arc<HeaderCache>,
}

impl HeaderParser<FsReader> {
    pub fn new(include_paths: Vec<PathBuf>) -> Self {
        Self::with_reader(FsReader, include_paths)
    }
}

impl<R: SourceReader> HeaderParser<R> {
    pub fn with_reader(reader: R, include_paths: Vec<PathBuf>) -> Self {
        Self {
            resolver: HeaderResolver::with_reader(reader, include_paths),
            cache: Arc::new(HeaderCache::new()),
        }
    }

    /// Share a cache of included headers with other parsers
    pub fn with_cache(mut self, cache: Arc<HeaderCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &Arc<HeaderCache> {
        &self.cache
    }

    /// Read and parse a header-to-mock
    pub fn parse_file(&self, path: &Path) -> Result<ParsedHeader> {
        let text = self.resolver.read(path)?;
        self.parse_source(path, &text)
    }

    /// Parse header text as if it was read from `path`
    pub fn parse_source(&self, path: &Path, text: &str) -> Result<ParsedHeader> {
        info!("Parsing {:?}", path);
        let header = PreParsedHeader::parse(file_name(path), text)?;

        let mut missing = Vec::new();
        let includes = self.load_includes(&header, path, &mut missing)?;
        let scope: Vec<&PreParsedHeader> = includes.iter().map(Arc::as_ref).collect();

        let expander = MacroExpander::new(SymbolTable::new(&header, &scope));
        let expansion = expander.expand(header.lines());
        let header = header
            .reparse(expansion.lines)?
            .with_warnings(expansion.warnings)
            .with_warnings(missing);

        let stripped = ConditionalStripper::new(SymbolTable::new(&header, &scope))
            .strip(header.lines().to_vec())?;
        let functions = DeclarationParser::new().parse(&stripped)?;
        debug!("{:?} declares {} functions", path, functions.len());

        Ok(ParsedHeader {
            path: path.to_path_buf(),
            warnings: header.warnings().to_vec(),
            header,
            includes,
            functions,
        })
    }

    /// Pre-parse every reachable application include, depth-first
    fn load_includes(
        &self,
        header: &PreParsedHeader,
        path: &Path,
        warnings: &mut Vec<Warning>,
    ) -> Result<Vec<Arc<PreParsedHeader>>> {
        let mut loaded = Vec::new();
        let mut visited = HashSet::from([path.to_path_buf()]);
        self.visit_includes(header, path, &mut visited, &mut loaded, warnings)?;
        Ok(loaded)
    }

    fn visit_includes(
        &self,
        header: &PreParsedHeader,
        from: &Path,
        visited: &mut HashSet<PathBuf>,
        loaded: &mut Vec<Arc<PreParsedHeader>>,
        warnings: &mut Vec<Warning>,
    ) -> Result<()> {
        for name in header.application_includes() {
            let Some(resolved) = self.resolver.resolve(name, Some(from)) else {
                let warning = Warning::MissingInclude {
                    header: name.clone(),
                };
                warn!("{}", warning);
                warnings.push(warning);
                continue;
            };
            if !visited.insert(resolved.clone()) {
                continue;
            }

            let included = self.load(&resolved)?;
            loaded.push(included.clone());
            self.visit_includes(&included, &resolved, visited, loaded, warnings)?;
        }
        Ok(())
    }

    /// Pre-parse one included header, through the cache
    fn load(&self, path: &Path) -> Result<Arc<PreParsedHeader>> {
        let text = self.resolver.read(path)?;
        let hash = hash_content(&text);
        if let Some(cached) = self.cache.get(path, hash) {
            debug!("Cache hit for {:?}", path);
            return Ok(cached);
        }

        let header = PreParsedHeader::parse(file_name(path), &text)?;
        Ok(self.cache.insert(path.to_path_buf(), hash, header))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests;
