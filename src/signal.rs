//! Completion-signal contract.
//!
//! The signal file is the sole machine-readable result guaranteed to an
//! external orchestrator: it polls for `photoshop_done.tmp` beside the job
//! definition and branches on the content. The contract is a three-state
//! machine: absent (not started), `done`, or `error: {message}`.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Fixed signal filename, written as a sibling of the job definition.
pub const SIGNAL_FILE_NAME: &str = "photoshop_done.tmp";

/// Literal content of a success signal.
pub const DONE_TOKEN: &str = "done";

/// Prefix of a failure signal; the remainder is a human-readable message.
pub const ERROR_PREFIX: &str = "error: ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalState {
    NotStarted,
    Done,
    Error(String),
}

impl SignalState {
    /// Parse signal file content.
    ///
    /// The writer emits exact tokens; the reader is lenient about trailing
    /// whitespace and treats any content other than the success token as a
    /// failure message, stripping the `error: ` prefix when present.
    pub fn parse(content: &str) -> Self {
        let content = content.trim_end();
        if content == DONE_TOKEN {
            SignalState::Done
        } else if let Some(msg) = content.strip_prefix(ERROR_PREFIX) {
            SignalState::Error(msg.to_string())
        } else {
            SignalState::Error(content.to_string())
        }
    }
}

/// Handle to the signal file for one job.
#[derive(Debug, Clone)]
pub struct SignalFile {
    path: PathBuf,
}

impl SignalFile {
    /// Signal location for a job defined by the file at `job_path`: the fixed
    /// name in that file's directory.
    pub fn beside(job_path: &Path) -> Self {
        let dir = job_path.parent().filter(|p| !p.as_os_str().is_empty());
        Self::in_dir(dir.unwrap_or_else(|| Path::new(".")))
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(SIGNAL_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove a stale signal left over from a prior run. A missing file is
    /// not an error.
    pub fn clear(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    pub fn write_done(&self) -> io::Result<()> {
        std::fs::write(&self.path, DONE_TOKEN)
    }

    pub fn write_error(&self, message: &str) -> io::Result<()> {
        std::fs::write(&self.path, format!("{ERROR_PREFIX}{message}"))
    }

    /// Current state; [`SignalState::NotStarted`] while the file is absent.
    pub fn read(&self) -> io::Result<SignalState> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(SignalState::parse(&content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(SignalState::NotStarted),
            Err(e) => Err(e),
        }
    }

    /// Poll until the signal appears, the way the orchestrating caller waits
    /// on a running job. Returns `None` if the deadline passes first.
    pub async fn wait(
        &self,
        poll_interval: Duration,
        timeout: Duration,
    ) -> io::Result<Option<SignalState>> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match self.read()? {
                SignalState::NotStarted => {}
                state => return Ok(Some(state)),
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}
