//! Document error types.

use tds_core::CoreError;

/// Errors raised while reading, mutating or writing a datasource document.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    /// The artifact is not a well-formed datasource document.
    #[error("Format error: {0}")]
    Format(String),

    /// Entity lookup, duplicate key or attribute validation failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The `.tdsx` container could not be read or rebuilt.
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// I/O error (reading or writing artifact files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FileError {
    pub(crate) fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }
}
