//! mcmock Core
//!
//! Core types shared by the mcmock header parser and mock generator.

pub mod config;
pub mod error;
pub mod types;

pub use config::{check_distinct_outputs, GeneratorConfig};
pub use error::{Error, Result, Warning};
pub use types::*;
