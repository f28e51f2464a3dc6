//! mcmock Generator
//!
//! Turns parsed headers into C mocks: derives the mock control API surface
//! and renders `mock_<name>.h` / `mock_<name>.c`.
//!
//! ## Modules
//!
//! - `builder` - Mock API and hook typedef derivation
//! - `emit` - Header and source rendering
//! - `clock` - Injectable generation date
//! - `writer` - Injectable output persistence
//! - `runtime` - Embedded C runtime the generated mocks link against
//! - `pipeline` - Per-header generation
//! - `parallel` - Parallel batch generation

pub mod builder;
pub mod clock;
pub mod emit;
pub mod parallel;
pub mod pipeline;
pub mod runtime;
pub mod writer;

pub use builder::MockData;
pub use clock::{Clock, FixedClock, SystemClock};
pub use emit::{render_header, render_source, MockUnit};
pub use parallel::{find_headers, BatchGenerator, BatchResult, ProgressEvent, ProgressPhase};
pub use pipeline::{GeneratedFiles, MockGenerator, MockPlan, RenderedMock};
pub use runtime::write_runtime;
pub use writer::{FsWriter, OutputWriter};
