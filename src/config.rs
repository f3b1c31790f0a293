use std::fs::read_to_string;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// The number of worker threads to use. Defaults to the number of logical
    /// CPUs as detected by rayon.
    pub threads: usize,

    /// How many input lines to read and dispatch to the workers at once. Larger
    /// batches keep the workers busier at the cost of holding more results in
    /// memory.
    pub batch_size: usize,

    /// Whether to count the input lines up front and show a progress bar.
    pub progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threads: 0,
            batch_size: 1024,
            progress: true,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = read_to_string(path).map_err(|e| Error::file_access(path, e))?;
        toml::from_str(&s).map_err(|e| {
            Error::Config(format!("failed to parse {}: {e}", path.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "threads = 3\nbatch_size = 16").unwrap();
        let got = Config::load(f.path()).unwrap();
        assert_eq!(
            got,
            Config {
                threads: 3,
                batch_size: 16,
                progress: true,
            }
        );
    }

    #[test]
    fn empty_is_default() {
        let f = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(Config::load(f.path()).unwrap(), Config::default());
    }

    #[test]
    fn unknown_field() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "thread = 3").unwrap();
        assert!(matches!(Config::load(f.path()), Err(Error::Config(_))));
    }

    #[test]
    fn missing() {
        let got = Config::load("testfiles/nonexistent.toml");
        assert!(matches!(got, Err(Error::FileAccess { .. })));
    }
}
