//! Parallel mock generation using rayon
//!
//! Every header-to-mock runs its own pipeline; only the cache of
//! pre-parsed includes is shared. A failing header never stops the others.

use mcmock_core::{check_distinct_outputs, Error, Result};
use mcmock_parser::SourceReader;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::pipeline::{GeneratedFiles, MockGenerator};

/// Progress callback type
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Progress event for tracking a batch
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub phase: ProgressPhase,
    pub current: usize,
    pub total: usize,
    pub message: String,
}

/// Batch phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    Generating,
    Complete,
}

/// Outcome of one header in a batch
pub type BatchResult = (PathBuf, Result<GeneratedFiles>);

/// Runs one [`MockGenerator`] over many headers in parallel
pub struct BatchGenerator<R> {
    generator: MockGenerator<R>,
    jobs: Option<usize>,
    progress_callback: Option<Arc<ProgressCallback>>,
}

impl<R: SourceReader> BatchGenerator<R> {
    pub fn new(generator: MockGenerator<R>) -> Self {
        Self {
            generator,
            jobs: None,
            progress_callback: None,
        }
    }

    /// Limit the number of worker threads; the rayon default otherwise
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }

    /// Set progress callback
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressEvent) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(Box::new(callback)));
        self
    }

    /// Generate mocks for every header, results in input order
    ///
    /// Headers that would overwrite each other's mocks fail the whole batch
    /// before anything is parsed.
    pub fn generate_all(&self, headers: &[PathBuf]) -> Result<Vec<BatchResult>> {
        check_distinct_outputs(headers)?;
        match self.jobs {
            Some(jobs) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(jobs)
                    .build()
                    .map_err(|e| Error::Config(format!("cannot start {} workers: {}", jobs, e)))?;
                Ok(pool.install(|| self.run(headers)))
            }
            None => Ok(self.run(headers)),
        }
    }

    fn run(&self, headers: &[PathBuf]) -> Vec<BatchResult> {
        let total = headers.len();
        let processed = AtomicUsize::new(0);

        self.emit_progress(ProgressPhase::Generating, 0, total, "Starting mock generation...");

        let results: Vec<_> = headers
            .par_iter()
            .map(|header| {
                let result = self.generator.generate(header);
                if let Err(e) = &result {
                    debug!("Generation failed for {:?}: {}", header, e);
                }

                let current = processed.fetch_add(1, Ordering::SeqCst) + 1;
                let outcome = if result.is_ok() { "mocked" } else { "failed" };
                self.emit_progress(
                    ProgressPhase::Generating,
                    current,
                    total,
                    format!("{} {}", outcome, header.display()),
                );

                (header.clone(), result)
            })
            .collect();

        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        info!(
            "Generated mocks for {} of {} headers ({} cached includes)",
            total - failed,
            total,
            self.generator.cache().stats().entries
        );
        self.emit_progress(ProgressPhase::Complete, total, total, "Generation complete");
        results
    }

    fn emit_progress<S: Into<String>>(
        &self,
        phase: ProgressPhase,
        current: usize,
        total: usize,
        message: S,
    ) {
        if let Some(ref callback) = self.progress_callback {
            callback(ProgressEvent {
                phase,
                current,
                total,
                message: message.into(),
            });
        }
    }
}

/// Every `.h` file below `dir`, sorted for a stable batch order
pub fn find_headers(dir: &Path) -> Vec<PathBuf> {
    let mut headers: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext == "h")
                .unwrap_or(false)
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    headers.sort();
    info!("Found {} headers under {:?}", headers.len(), dir);
    headers
}
