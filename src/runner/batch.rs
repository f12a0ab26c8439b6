use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use super::naming::output_file_name;
use crate::engine::{ImageEngine, PngSaveOptions};
use crate::error::RunError;
use crate::model::{InfoEvent, JobConfig, Phase, RunEvent, RunReport};

pub struct BatchRunner {
    cfg: JobConfig,
}

impl BatchRunner {
    pub fn new(cfg: JobConfig) -> Self {
        Self { cfg }
    }

    /// Run the batch to completion.
    ///
    /// Strictly sequential: each source document is opened, transformed by
    /// one named action, saved under its sequence name, and closed before the
    /// next file begins. The first failure aborts the remaining batch;
    /// outputs already written stay on disk. An empty source directory is a
    /// successful run with no output.
    pub async fn run(
        self,
        engine: Arc<dyn ImageEngine>,
        event_tx: mpsc::UnboundedSender<RunEvent>,
    ) -> Result<RunReport, RunError> {
        let started = Instant::now();
        tracing::info!(
            engine = engine.name(),
            input = %self.cfg.input_dir.display(),
            output = %self.cfg.output_dir.display(),
            action = %self.cfg.action,
            action_set = %self.cfg.action_set,
            "starting batch run",
        );

        let _ = event_tx.send(RunEvent::PhaseStarted {
            phase: Phase::Startup,
        });
        // Give the host environment time to finish its own startup before any
        // work begins. Not cancellable; happens once per run.
        tokio::time::sleep(self.cfg.startup_delay).await;

        tokio::fs::create_dir_all(&self.cfg.output_dir)
            .await
            .map_err(|source| RunError::CreateOutputDir {
                path: self.cfg.output_dir.clone(),
                source,
            })?;

        let _ = event_tx.send(RunEvent::PhaseStarted { phase: Phase::Scan });
        let sources = self.collect_sources().await?;
        if sources.is_empty() {
            let _ = event_tx.send(RunEvent::Info(InfoEvent::EmptyInput));
        } else {
            let _ = event_tx.send(RunEvent::Info(InfoEvent::Matched {
                count: sources.len(),
            }));
        }

        let _ = event_tx.send(RunEvent::PhaseStarted {
            phase: Phase::Process,
        });
        let total = sources.len();
        let mut outputs = Vec::with_capacity(total);
        for (i, source) in sources.iter().enumerate() {
            let seq = i + 1;
            let name = output_file_name(&self.cfg.prefix, seq);
            let dest = self.cfg.output_dir.join(&name);
            let wrap = |e| RunError::Processing {
                path: source.clone(),
                source: e,
            };

            let mut doc = engine.open(source).await.map_err(wrap)?;
            doc.run_action(&self.cfg.action, &self.cfg.action_set)
                .await
                .map_err(wrap)?;
            doc.save_png(&dest, &PngSaveOptions::default())
                .await
                .map_err(wrap)?;
            doc.close().await.map_err(wrap)?;

            tracing::debug!(seq, source = %source.display(), output = %dest.display(), "file processed");
            let _ = event_tx.send(RunEvent::FileDone {
                index: seq,
                total,
                source: source
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                output: name.clone(),
            });
            outputs.push(name);
        }

        let report = RunReport {
            timestamp_utc: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_else(|_| "now".into()),
            input_dir: self.cfg.input_dir.clone(),
            output_dir: self.cfg.output_dir.clone(),
            prefix: self.cfg.prefix.clone(),
            action: self.cfg.action.clone(),
            action_set: self.cfg.action_set.clone(),
            matched: total,
            processed: outputs.len(),
            outputs,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        tracing::info!(processed = report.processed, duration_ms = report.duration_ms, "batch run complete");
        let _ = event_tx.send(RunEvent::RunCompleted {
            result: Box::new(report.clone()),
        });
        Ok(report)
    }

    /// PNG files in the input directory, sorted by file name so repeated runs
    /// assign identical sequence numbers regardless of enumeration order.
    async fn collect_sources(&self) -> Result<Vec<PathBuf>, RunError> {
        let mut rd = tokio::fs::read_dir(&self.cfg.input_dir)
            .await
            .map_err(|e| self.read_dir_error(e))?;
        let mut sources = Vec::new();
        while let Some(entry) = rd.next_entry().await.map_err(|e| self.read_dir_error(e))? {
            if !entry
                .file_type()
                .await
                .map_err(|e| self.read_dir_error(e))?
                .is_file()
            {
                continue;
            }
            let path = entry.path();
            let is_png = path
                .extension()
                .map_or(false, |ext| ext.eq_ignore_ascii_case("png"));
            if is_png {
                sources.push(path);
            }
        }
        sources.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(sources)
    }

    fn read_dir_error(&self, source: io::Error) -> RunError {
        RunError::ReadInputDir {
            path: self.cfg.input_dir.clone(),
            source,
        }
    }
}
