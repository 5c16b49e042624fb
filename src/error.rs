use std::path::PathBuf;
use thiserror::Error;

pub type SplitResult<T> = Result<T, SplitError>;

/// Everything that can go wrong while loading, splitting or saving a dataset.
/// All of them are recoverable and left to the caller to report.
#[derive(Debug, Error)]
pub enum SplitError {
    /// The source annotation file is missing, unreadable, malformed or inconsistent.
    #[error("invalid input {path}: {msg}")]
    InvalidInput { path: PathBuf, msg: String },
    /// A split ratio or count outside of its valid range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Nothing was written because the destination is already taken.
    #[error("file already exists: {0}")]
    FileAlreadyExists(PathBuf),
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SplitError {
    pub(crate) fn invalid_input(path: impl Into<PathBuf>, msg: impl Into<String>) -> SplitError {
        SplitError::InvalidInput {
            path: path.into(),
            msg: msg.into(),
        }
    }
}
