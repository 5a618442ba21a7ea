use std::path::Path;

use thiserror::Error;

pub type Result<T, E = CompressError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum CompressError {
    /// Bad level value, missing input, or a file that is not named `.pdf`.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The external tool could not be started, exited non-zero, or wrote nothing.
    #[error("{tool} failed: {diagnostic}")]
    ToolExecution { tool: String, diagnostic: String },

    #[error("not a readable PDF: {0}")]
    InvalidPdf(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CompressError {
    pub(crate) fn missing_input(path: &Path) -> Self {
        CompressError::InvalidArgument(format!("input file not found: {}", path.display()))
    }
}
