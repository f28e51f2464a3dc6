//! Configuration types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Configuration of one generation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Headers to mock
    pub headers: Vec<PathBuf>,

    /// Additional directories searched for application includes, in order
    pub include_paths: Vec<PathBuf>,

    /// Directory the generated mocks are written to
    pub output_dir: PathBuf,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            headers: vec![],
            include_paths: vec![],
            output_dir: PathBuf::from("."),
        }
    }
}

impl GeneratorConfig {
    /// Check the configuration before any header is parsed
    pub fn validate(&self) -> Result<()> {
        if self.headers.is_empty() {
            return Err(Error::Config(
                "no header files supplied; nothing to mock".into(),
            ));
        }

        for header in &self.headers {
            if header.extension().and_then(|ext| ext.to_str()) != Some("h") {
                return Err(Error::Config(format!(
                    "expected a C header file, but got [{}]",
                    header.display()
                )));
            }
        }

        check_distinct_outputs(&self.headers)?;

        if !self.output_dir.is_dir() {
            return Err(Error::Config(format!(
                "output directory {} does not exist",
                self.output_dir.display()
            )));
        }

        for dir in &self.include_paths {
            if !dir.is_dir() {
                return Err(Error::Config(format!(
                    "include directory {} does not exist",
                    dir.display()
                )));
            }
        }

        Ok(())
    }
}

/// Fail when two headers would be mocked into the same `mock_<stem>` files
///
/// Every mock is written flat into the output directory, so `net/util.h`
/// and `disk/util.h` cannot be generated in one run.
pub fn check_distinct_outputs(headers: &[PathBuf]) -> Result<()> {
    let mut seen: HashMap<&OsStr, &PathBuf> = HashMap::new();
    for header in headers {
        let Some(stem) = header.file_stem() else {
            continue;
        };
        if let Some(first) = seen.insert(stem, header) {
            return Err(Error::Config(format!(
                "{} and {} would both be mocked as mock_{}.h",
                first.display(),
                header.display(),
                stem.to_string_lossy()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_no_headers_is_config_error() {
        let config = GeneratorConfig::default();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_non_header() {
        let temp = TempDir::new().unwrap();
        let config = GeneratorConfig {
            headers: vec![PathBuf::from("foo.c")],
            output_dir: temp.path().to_path_buf(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_directories() {
        let temp = TempDir::new().unwrap();
        let mut config = GeneratorConfig {
            headers: vec![PathBuf::from("foo.h")],
            output_dir: temp.path().join("missing"),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.output_dir = temp.path().to_path_buf();
        assert!(config.validate().is_ok());

        config.include_paths.push(temp.path().join("nope"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_headers_sharing_a_stem_are_rejected() {
        let temp = TempDir::new().unwrap();
        let config = GeneratorConfig {
            headers: vec![
                PathBuf::from("net/util.h"),
                PathBuf::from("net/socket.h"),
                PathBuf::from("disk/util.h"),
            ],
            output_dir: temp.path().to_path_buf(),
            ..Default::default()
        };
        let Err(Error::Config(message)) = config.validate() else {
            panic!("expected a configuration error");
        };
        assert!(message.contains("net/util.h and disk/util.h"));
        assert!(message.contains("mock_util.h"));

        assert!(check_distinct_outputs(&config.headers[..2]).is_ok());
    }
}
