//! Error taxonomy shared by all converters
//!
//! Startup errors stop the run before any file is touched. Everything that
//! happens to a single file during the batch is reported per file and never
//! surfaces here.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("External tool not found: {tool} ({reason})")]
    ToolNotFound { tool: String, reason: String },

    #[error("Invalid value for {name}: {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error(
        "Output directory is not empty: {0} (pass --ignore-not-empty or --ignore-not-empty-and-preserve)"
    )]
    OutputNotEmpty(PathBuf),

    #[error("Input not found: {0}")]
    InputNotFound(PathBuf),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Worker pool error: {0}")]
    Pool(String),

    #[error("PDF assembly failed: {0}")]
    PdfAssembly(String),

    #[error("Interrupted by user")]
    Interrupted,
}

impl BatchError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BatchError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        BatchError::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Errors that end the run with exit status -1 before any work starts.
    pub fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            BatchError::ToolNotFound { .. }
                | BatchError::InvalidArgument { .. }
                | BatchError::OutputNotEmpty(_)
                | BatchError::InputNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BatchError>;
