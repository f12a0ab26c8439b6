//! Shared fixtures: a scripted engine for failure injection and PNG helpers.
#![allow(dead_code)]

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use photoshop_batch::engine::{EngineDocument, ImageEngine, PngSaveOptions};
use photoshop_batch::error::EngineError;
use photoshop_batch::model::JobConfig;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct ScriptedState {
    /// Source paths in the order the runner opened them.
    pub opened: Vec<PathBuf>,
    /// 1-based open index whose action should fail.
    pub fail_action_on: Option<usize>,
}

/// Engine that records the order documents are opened in and can be scripted
/// to fail the action on the nth document. Saving writes the source path as
/// the output content so tests can check the source-to-sequence mapping.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    state: Arc<Mutex<ScriptedState>>,
}

impl ScriptedEngine {
    pub fn failing_on(index: usize) -> Self {
        let engine = Self::default();
        engine.state.lock().unwrap().fail_action_on = Some(index);
        engine
    }

    pub fn state(&self) -> Arc<Mutex<ScriptedState>> {
        self.state.clone()
    }
}

#[async_trait]
impl ImageEngine for ScriptedEngine {
    async fn open(&self, path: &Path) -> Result<Box<dyn EngineDocument>, EngineError> {
        let mut state = self.state.lock().unwrap();
        state.opened.push(path.to_path_buf());
        Ok(Box::new(ScriptedDocument {
            source: path.to_path_buf(),
            seq: state.opened.len(),
            state: self.state.clone(),
        }))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

struct ScriptedDocument {
    source: PathBuf,
    seq: usize,
    state: Arc<Mutex<ScriptedState>>,
}

#[async_trait]
impl EngineDocument for ScriptedDocument {
    async fn run_action(&mut self, _action: &str, _action_set: &str) -> Result<(), EngineError> {
        if self.state.lock().unwrap().fail_action_on == Some(self.seq) {
            return Err(EngineError::Io(io::Error::other("scripted action failure")));
        }
        Ok(())
    }

    async fn save_png(
        &mut self,
        dest: &Path,
        _options: &PngSaveOptions,
    ) -> Result<(), EngineError> {
        std::fs::write(dest, self.source.to_string_lossy().as_bytes())?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), EngineError> {
        Ok(())
    }
}

/// Write a tiny valid PNG at `dir/name`.
pub fn write_png(dir: &Path, name: &str) {
    RgbaImage::from_pixel(2, 2, Rgba([128, 64, 32, 255]))
        .save(dir.join(name))
        .expect("write test png");
}

/// Job configuration with no startup delay, suitable for tests.
pub fn job_config(input: &Path, output: &Path, prefix: &str) -> JobConfig {
    JobConfig {
        input_dir: input.to_path_buf(),
        output_dir: output.to_path_buf(),
        prefix: prefix.to_string(),
        action: "noop".to_string(),
        action_set: "scripted".to_string(),
        startup_delay: Duration::ZERO,
    }
}
