//! Error types for mcmock

use thiserror::Error;

/// mcmock error type
///
/// Parse variants are fatal for the header being mocked and carry the
/// offending text. `Config` aborts the whole run.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse typedef definition [{0}]")]
    Typedef(String),

    #[error("failed to parse the conditional statement [{0}]")]
    Conditional(String),

    #[error("failed to parse declaration [{0}]")]
    Declaration(String),

    #[error("failed to parse the function pointer [{0}]")]
    FunctionPointer(String),

    #[error("failed to parse parameter [{parameter}] for function [{function}]")]
    Parameter { function: String, parameter: String },

    #[error("failed to render mock: {0}")]
    Render(#[from] std::fmt::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

impl Error {
    /// Whether this error aborts the whole run rather than one header
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

/// Result type alias for mcmock
pub type Result<T> = std::result::Result<T, Error>;

/// Recoverable condition; generation continues with degraded information
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// An application include could not be found on any search path
    MissingInclude { header: String },
    /// A function-like `#define` has a malformed parameter list
    UnparsedMacro { text: String },
    /// A macro invocation was recognised but could not be expanded
    UnexpandedMacro { name: String, line: String },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::MissingInclude { header } => write!(
                f,
                "could not find the included header [{}] for pre-parsing",
                header
            ),
            Warning::UnparsedMacro { text } => {
                write!(f, "failed to parse the #define [{}]", text)
            }
            Warning::UnexpandedMacro { name, line } => {
                write!(f, "left macro {} unexpanded in [{}]", name, line)
            }
        }
    }
}
