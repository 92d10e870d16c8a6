//! Error types for huffpack

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Where a container decode was when it gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    HeaderRead,
    TreeRebuild,
    Unpack,
    Manifest,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::HeaderRead => "header",
            Stage::TreeRebuild => "tree rebuild",
            Stage::Unpack => "unpack",
            Stage::Manifest => "manifest",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("malformed header ({stage}): {reason}")]
    MalformedHeader { stage: Stage, reason: String },

    #[error("destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    #[error("input too large: {size} bytes exceeds limit of {limit}")]
    InputTooLarge { size: u64, limit: u64 },

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("worker task failed: {0}")]
    Worker(String),
}

impl CompressError {
    pub(crate) fn malformed(stage: Stage, reason: impl Into<String>) -> Self {
        CompressError::MalformedHeader {
            stage,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CompressError>;
