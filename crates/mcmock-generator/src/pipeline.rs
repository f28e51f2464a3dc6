//! Per-header generation pipeline
//!
//! Parse, derive the mock surface, render both files, then write them.
//! Every stage runs to completion before the next one starts; any fatal
//! error stops this header only.

use mcmock_core::{GeneratorConfig, Result, Warning};
use mcmock_parser::{FsReader, HeaderCache, HeaderParser, ParsedHeader, SourceReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::builder::MockData;
use crate::clock::{Clock, SystemClock};
use crate::emit::{render_header, render_source, MockUnit};
use crate::writer::{FsWriter, OutputWriter};

/// A parsed header together with its derived mock surface
#[derive(Debug, Clone)]
pub struct MockPlan {
    pub parsed: ParsedHeader,
    pub data: MockData,
}

/// Rendered contents of both mock files, not yet written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMock {
    pub header_name: String,
    pub header: String,
    pub source_name: String,
    pub source: String,
    pub warnings: Vec<Warning>,
}

/// Paths of the two written files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFiles {
    pub header_path: PathBuf,
    pub source_path: PathBuf,
    pub warnings: Vec<Warning>,
}

/// Generates mocks for headers, one at a time
///
/// A generator is `Sync`; the batch driver shares one between workers, so
/// included headers are pre-parsed once per run.
pub struct MockGenerator<R = FsReader> {
    parser: HeaderParser<R>,
    output_dir: PathBuf,
    clock: Box<dyn Clock>,
    writer: Box<dyn OutputWriter>,
}

impl MockGenerator<FsReader> {
    pub fn new(include_paths: Vec<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self::with_parser(HeaderParser::new(include_paths), output_dir)
    }

    /// Generator for a validated configuration
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(config.include_paths.clone(), config.output_dir.clone())
    }
}

impl<R: SourceReader> MockGenerator<R> {
    pub fn with_parser(parser: HeaderParser<R>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            parser,
            output_dir: output_dir.into(),
            clock: Box::new(SystemClock),
            writer: Box::new(FsWriter),
        }
    }

    /// Replace the clock stamping file banners
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replace the writer persisting generated files
    pub fn with_writer(mut self, writer: impl OutputWriter + 'static) -> Self {
        self.writer = Box::new(writer);
        self
    }

    /// Share a cache of pre-parsed includes with other generators
    pub fn with_cache(mut self, cache: Arc<HeaderCache>) -> Self {
        self.parser = self.parser.with_cache(cache);
        self
    }

    pub fn cache(&self) -> &Arc<HeaderCache> {
        self.parser.cache()
    }

    /// Parse `header` and derive its mock surface
    pub fn plan(&self, header: &Path) -> Result<MockPlan> {
        let parsed = self.parser.parse_file(header)?;
        let data = MockData::build(&parsed.functions);
        debug!("{:?}: {} mock APIs", header, data.apis.len());
        Ok(MockPlan { parsed, data })
    }

    /// Render both mock files for `header` without writing them
    pub fn render(&self, header: &Path) -> Result<RenderedMock> {
        let plan = self.plan(header)?;
        let date = self.clock.date_stamp();
        let unit = MockUnit::new(&plan.parsed, &plan.data, &date);

        Ok(RenderedMock {
            header_name: unit.header_file_name(),
            header: render_header(&unit)?,
            source_name: unit.source_file_name(),
            source: render_source(&unit)?,
            warnings: plan.parsed.warnings.clone(),
        })
    }

    /// Generate and write `mock_<name>.h` and `mock_<name>.c` for `header`
    pub fn generate(&self, header: &Path) -> Result<GeneratedFiles> {
        let rendered = self.render(header)?;
        let header_path =
            self.writer
                .write(&self.output_dir, &rendered.header_name, &rendered.header)?;
        let source_path =
            self.writer
                .write(&self.output_dir, &rendered.source_name, &rendered.source)?;
        info!("Generated {:?} and {:?}", header_path, source_path);

        Ok(GeneratedFiles {
            header_path,
            source_path,
            warnings: rendered.warnings,
        })
    }
}
