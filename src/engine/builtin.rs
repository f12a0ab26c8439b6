//! In-process engine backed by the `image` crate.

use async_trait::async_trait;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageReader};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use super::{EngineDocument, ImageEngine, PngSaveOptions};
use crate::error::EngineError;

/// Action set name served by [`BuiltinEngine`].
pub const BUILTIN_ACTION_SET: &str = "builtin";

/// Engine that runs a fixed set of named actions in-process.
///
/// Available actions, all under the action set `builtin`:
/// - `grayscale`
/// - `invert`
/// - `flip-horizontal`
/// - `flip-vertical`
/// - `rotate90`
/// - `rotate180`
#[derive(Debug, Default)]
pub struct BuiltinEngine;

impl BuiltinEngine {
    pub fn new() -> Self {
        Self
    }

    /// All `(action_set, action)` pairs this engine can run.
    pub fn available_actions() -> Vec<(&'static str, &'static str)> {
        [
            "grayscale",
            "invert",
            "flip-horizontal",
            "flip-vertical",
            "rotate90",
            "rotate180",
        ]
        .into_iter()
        .map(|action| (BUILTIN_ACTION_SET, action))
        .collect()
    }
}

#[async_trait]
impl ImageEngine for BuiltinEngine {
    async fn open(&self, path: &Path) -> Result<Box<dyn EngineDocument>, EngineError> {
        let image = ImageReader::open(path)?
            .decode()
            .map_err(|source| EngineError::Decode {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::debug!(path = %path.display(), "opened document");
        Ok(Box::new(BuiltinDocument {
            path: path.to_path_buf(),
            image,
        }))
    }

    fn name(&self) -> &'static str {
        "builtin"
    }
}

struct BuiltinDocument {
    path: PathBuf,
    image: DynamicImage,
}

#[async_trait]
impl EngineDocument for BuiltinDocument {
    async fn run_action(&mut self, action: &str, action_set: &str) -> Result<(), EngineError> {
        if action_set != BUILTIN_ACTION_SET {
            return Err(EngineError::UnknownActionSet {
                set: action_set.to_string(),
            });
        }
        let img = std::mem::replace(&mut self.image, DynamicImage::new_rgba8(0, 0));
        self.image = match action {
            "grayscale" => img.grayscale(),
            "invert" => {
                let mut img = img;
                img.invert();
                img
            }
            "flip-horizontal" => img.fliph(),
            "flip-vertical" => img.flipv(),
            "rotate90" => img.rotate90(),
            "rotate180" => img.rotate180(),
            _ => {
                // Put the pixels back so the handle stays usable.
                self.image = img;
                return Err(EngineError::UnknownAction {
                    action: action.to_string(),
                    set: action_set.to_string(),
                });
            }
        };
        Ok(())
    }

    async fn save_png(
        &mut self,
        dest: &Path,
        options: &PngSaveOptions,
    ) -> Result<(), EngineError> {
        if options.interlaced {
            return Err(EngineError::Unsupported("interlaced PNG output"));
        }
        let compression = match options.compression {
            0..=2 => CompressionType::Fast,
            3..=6 => CompressionType::Default,
            _ => CompressionType::Best,
        };
        let writer = BufWriter::new(File::create(dest)?);
        let encoder = PngEncoder::new_with_quality(writer, compression, FilterType::Adaptive);
        self.image
            .write_with_encoder(encoder)
            .map_err(|source| EngineError::Encode {
                path: dest.to_path_buf(),
                source,
            })?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), EngineError> {
        // The source file at `path` was never written to; dropping the handle
        // releases the decoded pixels.
        tracing::debug!(path = %self.path.display(), "closed document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    fn write_test_png(path: &Path) {
        RgbaImage::from_pixel(2, 2, Rgba([200, 100, 50, 255]))
            .save(path)
            .expect("write test png");
    }

    #[tokio::test]
    async fn grayscale_round_trip() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src.png");
        let dst = dir.path().join("dst.png");
        write_test_png(&src);

        let engine = BuiltinEngine::new();
        let mut doc = engine.open(&src).await.unwrap();
        doc.run_action("grayscale", BUILTIN_ACTION_SET).await.unwrap();
        doc.save_png(&dst, &PngSaveOptions::default()).await.unwrap();
        doc.close().await.unwrap();

        let out = image::ImageReader::open(&dst).unwrap().decode().unwrap();
        assert_eq!(out.width(), 2);
        assert_eq!(out.height(), 2);
    }

    #[tokio::test]
    async fn unknown_action_is_rejected() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src.png");
        write_test_png(&src);

        let engine = BuiltinEngine::new();
        let mut doc = engine.open(&src).await.unwrap();
        let err = doc
            .run_action("remove-background", BUILTIN_ACTION_SET)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownAction { .. }));
    }

    #[tokio::test]
    async fn unknown_action_set_is_rejected() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src.png");
        write_test_png(&src);

        let engine = BuiltinEngine::new();
        let mut doc = engine.open(&src).await.unwrap();
        let err = doc.run_action("grayscale", "default-actions").await.unwrap_err();
        assert!(matches!(err, EngineError::UnknownActionSet { .. }));
    }

    #[tokio::test]
    async fn interlaced_output_is_unsupported() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src.png");
        write_test_png(&src);

        let engine = BuiltinEngine::new();
        let mut doc = engine.open(&src).await.unwrap();
        let options = PngSaveOptions {
            compression: 9,
            interlaced: true,
        };
        let err = doc
            .save_png(&dir.path().join("dst.png"), &options)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Unsupported(_)));
    }

    #[tokio::test]
    async fn open_rejects_non_image_files() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("not-an-image.png");
        std::fs::write(&src, b"plain text").unwrap();

        let engine = BuiltinEngine::new();
        let err = engine.open(&src).await.err().unwrap();
        assert!(matches!(err, EngineError::Decode { .. }));
    }
}
