//! External-engine capability seam.
//!
//! The batch runner addresses the editing engine purely by name: open a
//! document, run one named action from a named action set against it, save
//! the result as PNG, close without saving. The engine's internal behavior is
//! opaque to the runner. [`BuiltinEngine`] implements the seam in-process; a
//! bridge to a real host application would implement the same traits.

mod builtin;

pub use builtin::{BuiltinEngine, BUILTIN_ACTION_SET};

use async_trait::async_trait;
use std::path::Path;

use crate::error::EngineError;

/// PNG encoding options for [`EngineDocument::save_png`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PngSaveOptions {
    /// Compression level, 0 (fastest) to 9 (maximum).
    pub compression: u8,
    pub interlaced: bool,
}

impl Default for PngSaveOptions {
    /// Maximum compression, non-interlaced.
    fn default() -> Self {
        Self {
            compression: 9,
            interlaced: false,
        }
    }
}

/// An image-editing engine addressed by named capabilities.
#[async_trait]
pub trait ImageEngine: Send + Sync {
    /// Open the file at `path` as a new document.
    async fn open(&self, path: &Path) -> Result<Box<dyn EngineDocument>, EngineError>;

    fn name(&self) -> &'static str;
}

/// A handle to one open document.
///
/// Scoped to a single transformation: opened, acted on once, saved, then
/// closed before the next document is opened.
#[async_trait]
pub trait EngineDocument: Send {
    /// Run a named action from a named action set against this document.
    async fn run_action(&mut self, action: &str, action_set: &str) -> Result<(), EngineError>;

    /// Encode the current document state as PNG at `dest`, overwriting any
    /// existing file of that name.
    async fn save_png(&mut self, dest: &Path, options: &PngSaveOptions)
        -> Result<(), EngineError>;

    /// Close the document, discarding any changes to the source file.
    async fn close(self: Box<Self>) -> Result<(), EngineError>;
}
