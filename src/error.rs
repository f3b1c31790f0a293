use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid record {line:?}: {reason}")]
    InvalidRecord { line: String, reason: String },

    #[error("failed to access {}: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// errors from the descriptor engine are passed through untouched
    #[error(transparent)]
    Calculation(Box<dyn std::error::Error + Send + Sync>),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn invalid_record(
        line: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidRecord {
            line: line.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn file_access(
        path: impl Into<PathBuf>,
        source: io::Error,
    ) -> Self {
        Self::FileAccess {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn calculation(
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Calculation(Box::new(err))
    }
}
