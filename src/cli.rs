use crate::engine::{BuiltinEngine, ImageEngine, BUILTIN_ACTION_SET};
use crate::error::RunError;
use crate::model::{JobConfig, RunEvent, RunReport, DEFAULT_ACTION, DEFAULT_PREFIX};
use crate::runner::BatchRunner;
use crate::signal::SignalFile;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for the stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "photoshop-batch-cli",
    version,
    about = "Apply a named action to every PNG in a folder and signal completion"
)]
pub struct Cli {
    /// JSON job file describing the run; the completion signal is written
    /// beside this file, and the remaining flags below are ignored
    #[arg(long)]
    pub job: Option<PathBuf>,

    /// Directory containing the source PNG images
    #[arg(long, required_unless_present = "job")]
    pub input: Option<PathBuf>,

    /// Directory for the transformed images (created if missing)
    #[arg(long, required_unless_present = "job")]
    pub output: Option<PathBuf>,

    /// Output filename prefix
    #[arg(long, default_value = DEFAULT_PREFIX)]
    pub prefix: String,

    /// Named action to run against each image
    #[arg(long, default_value = DEFAULT_ACTION)]
    pub action: String,

    /// Action set the action belongs to
    #[arg(long, default_value = BUILTIN_ACTION_SET)]
    pub action_set: String,

    /// Delay before the batch starts, giving the host environment time to
    /// finish its own startup
    #[arg(long, default_value = "3s")]
    pub startup_delay: humantime::Duration,

    /// Directory for the completion signal (defaults to the job file's
    /// directory, or the current directory)
    #[arg(long)]
    pub signal_dir: Option<PathBuf>,

    /// Print the run report as JSON on completion
    #[arg(long)]
    pub json: bool,

    /// Suppress progress and report output for orchestrated runs; the signal
    /// file carries the outcome, failures still print one line to stderr
    #[arg(long, conflicts_with = "json")]
    pub silent: bool,

    /// List the actions the built-in engine can run and exit
    #[arg(long)]
    pub list_actions: bool,
}

/// Assemble the job configuration and signal location from CLI arguments.
///
/// A `--job` file provides the whole configuration (keys missing from the
/// file fall back to the same defaults the flags use) and fixes the signal
/// location to its own directory unless `--signal-dir` overrides it.
pub fn build_job(args: &Cli) -> Result<(JobConfig, SignalFile)> {
    let cfg = if let Some(job_path) = args.job.as_deref() {
        let raw = std::fs::read_to_string(job_path)
            .with_context(|| format!("failed to read job file {}", job_path.display()))?;
        serde_json::from_str::<JobConfig>(&raw)
            .with_context(|| format!("invalid job file {}", job_path.display()))?
    } else {
        let (input_dir, output_dir) = match (args.input.clone(), args.output.clone()) {
            (Some(input), Some(output)) => (input, output),
            _ => anyhow::bail!("--input and --output are required without --job"),
        };
        JobConfig {
            input_dir,
            output_dir,
            prefix: args.prefix.clone(),
            action: args.action.clone(),
            action_set: args.action_set.clone(),
            startup_delay: Duration::from(args.startup_delay),
        }
    };

    let signal = if let Some(dir) = args.signal_dir.as_deref() {
        SignalFile::in_dir(dir)
    } else if let Some(job_path) = args.job.as_deref() {
        SignalFile::beside(job_path)
    } else {
        SignalFile::in_dir(Path::new("."))
    };

    Ok((cfg, signal))
}

pub async fn run(args: Cli) -> Result<()> {
    if args.list_actions {
        for (set, action) in BuiltinEngine::available_actions() {
            println!("{set}/{action}");
        }
        return Ok(());
    }

    let (cfg, signal) = build_job(&args)?;
    signal.clear().with_context(|| {
        format!("failed to remove stale signal {}", signal.path().display())
    })?;

    let engine: Arc<dyn ImageEngine> = Arc::new(BuiltinEngine::new());
    let outcome = drive_run(&args, cfg, engine).await;

    // Writing the signal is the terminal action of both outcomes; a failure
    // writing it propagates with no recorded outcome.
    match outcome {
        Ok(report) => {
            signal.write_done().with_context(|| {
                format!("failed to write signal {}", signal.path().display())
            })?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else if !args.silent {
                println!(
                    "Processed {} file(s) into {}",
                    report.processed,
                    report.output_dir.display()
                );
                println!("Signal: done ({})", signal.path().display());
            }
            Ok(())
        }
        Err(e) => {
            signal.write_error(&e.to_string()).with_context(|| {
                format!("failed to write signal {}", signal.path().display())
            })?;
            if !args.silent {
                eprintln!("Signal: error ({})", signal.path().display());
            }
            Err(anyhow::Error::new(e))
        }
    }
}

/// Run the batch task and consume its progress events.
async fn drive_run(
    args: &Cli,
    cfg: JobConfig,
    engine: Arc<dyn ImageEngine>,
) -> Result<RunReport, RunError> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<RunEvent>();
    let runner = BatchRunner::new(cfg);
    let handle = tokio::spawn(async move { runner.run(engine, event_tx).await });

    if args.silent || args.json {
        // No progress output; the runner ignores send failures.
        drop(event_rx);
    } else {
        let (out_tx, out_handle) = spawn_output_writer();
        while let Some(ev) = event_rx.recv().await {
            match ev {
                RunEvent::PhaseStarted { phase } => {
                    let _ = out_tx.send(OutputLine::Stderr(format!("== {phase:?} ==")));
                }
                RunEvent::FileDone {
                    index,
                    total,
                    source,
                    output,
                } => {
                    let _ = out_tx.send(OutputLine::Stderr(format!(
                        "[{index}/{total}] {source} -> {output}"
                    )));
                }
                RunEvent::Info(info) => {
                    let _ = out_tx.send(OutputLine::Stderr(info.to_message()));
                }
                RunEvent::RunCompleted { .. } => {}
            }
        }
        drop(out_tx);
        let _ = out_handle.await;
    }

    match handle.await {
        Ok(res) => res,
        Err(e) => Err(RunError::Aborted(e.to_string())),
    }
}
