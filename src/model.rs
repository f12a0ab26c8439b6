use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::engine::BUILTIN_ACTION_SET;

/// Default output filename prefix.
pub const DEFAULT_PREFIX: &str = "frame";

/// Default action when none is configured.
pub const DEFAULT_ACTION: &str = "grayscale";

/// Default wait before the batch starts.
pub const DEFAULT_STARTUP_DELAY: Duration = Duration::from_secs(3);

/// Configuration for one batch job, immutable for the duration of a run.
///
/// A job may be described by a JSON file; keys missing from the file fall
/// back to the same defaults the CLI flags use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Directory holding the source PNG images.
    pub input_dir: PathBuf,
    /// Directory the transformed images are written to (created if missing).
    pub output_dir: PathBuf,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Name of the action to run against each open document.
    #[serde(default = "default_action")]
    pub action: String,
    /// Action set (group) the action belongs to.
    #[serde(default = "default_action_set")]
    pub action_set: String,
    /// Wait before any work starts, giving the host environment time to
    /// finish its own startup.
    #[serde(default = "default_startup_delay", with = "humantime_serde")]
    pub startup_delay: Duration,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_action() -> String {
    DEFAULT_ACTION.to_string()
}

fn default_action_set() -> String {
    BUILTIN_ACTION_SET.to_string()
}

fn default_startup_delay() -> Duration {
    DEFAULT_STARTUP_DELAY
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Startup,
    Scan,
    Process,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RunEvent {
    PhaseStarted {
        phase: Phase,
    },
    /// A source document was transformed, saved, and closed.
    FileDone {
        /// 1-based sequence number of the file within the sorted batch.
        index: usize,
        total: usize,
        source: String,
        output: String,
    },
    Info(InfoEvent),
    RunCompleted {
        result: Box<RunReport>,
    },
}

/// Structured info events emitted by the runner and consumed by the CLI layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InfoEvent {
    Message(String),
    Matched { count: usize },
    EmptyInput,
}

impl InfoEvent {
    /// Render a human-readable message for presentation layers.
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Message(msg) => msg.clone(),
            InfoEvent::Matched { count } => format!("{count} PNG file(s) to process"),
            InfoEvent::EmptyInput => "No PNG files matched; nothing to do".to_string(),
        }
    }
}

/// Machine-readable summary of a successful run.
///
/// Printed as JSON under `--json`. The completion signal file remains the
/// only contract guaranteed to external orchestrators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(default)]
    pub timestamp_utc: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub prefix: String,
    pub action: String,
    pub action_set: String,
    /// Source files matched by the PNG filter.
    pub matched: usize,
    /// Source files fully processed (equal to `matched` on success).
    pub processed: usize,
    /// Output filenames in sequence order.
    pub outputs: Vec<String>,
    pub duration_ms: u64,
}
