//! Error taxonomy for batch runs and engine operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by an [`ImageEngine`](crate::engine::ImageEngine)
/// implementation while operating on a single document.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("action set '{set}' not found")]
    UnknownActionSet { set: String },

    #[error("action '{action}' not found in set '{set}'")]
    UnknownAction { action: String, set: String },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to encode PNG {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("{0} is not supported by this engine")]
    Unsupported(&'static str),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Failures that abort a batch run.
///
/// The rendered message of one of these becomes the `error: {message}`
/// payload of the completion signal.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to create output directory {path}: {source}")]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read input directory {path}: {source}")]
    ReadInputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A per-file failure. Aborts the remaining batch; outputs written for
    /// earlier files stay on disk.
    #[error("failed to process {path}: {source}")]
    Processing {
        path: PathBuf,
        #[source]
        source: EngineError,
    },

    /// The run task died without producing an outcome (e.g. a panic).
    #[error("batch task aborted: {0}")]
    Aborted(String),
}
