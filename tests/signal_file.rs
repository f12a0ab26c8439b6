//! Signal file contract: lifecycle, content tokens, and polling.

use photoshop_batch::signal::{SignalFile, SignalState, SIGNAL_FILE_NAME};
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn lifecycle_not_started_done_error_cleared() {
    let dir = tempdir().unwrap();
    let signal = SignalFile::in_dir(dir.path());
    assert_eq!(signal.read().unwrap(), SignalState::NotStarted);

    signal.write_done().unwrap();
    assert_eq!(signal.read().unwrap(), SignalState::Done);
    let content = fs::read_to_string(dir.path().join(SIGNAL_FILE_NAME)).unwrap();
    assert_eq!(content, "done");

    signal.write_error("disk full").unwrap();
    assert_eq!(
        signal.read().unwrap(),
        SignalState::Error("disk full".to_string())
    );
    let content = fs::read_to_string(dir.path().join(SIGNAL_FILE_NAME)).unwrap();
    assert_eq!(content, "error: disk full");

    signal.clear().unwrap();
    assert_eq!(signal.read().unwrap(), SignalState::NotStarted);
    // Clearing an already absent signal is a no-op.
    signal.clear().unwrap();
}

#[test]
fn exactly_one_signal_file_exists_after_state_changes() {
    let dir = tempdir().unwrap();
    let signal = SignalFile::in_dir(dir.path());
    signal.write_error("first attempt failed").unwrap();
    signal.write_done().unwrap();

    let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(signal.read().unwrap(), SignalState::Done);
}

#[tokio::test]
async fn wait_observes_a_signal_written_mid_poll() {
    let dir = tempdir().unwrap();
    let signal = SignalFile::in_dir(dir.path());

    let writer = signal.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        writer.write_done().unwrap();
    });

    let state = signal
        .wait(Duration::from_millis(10), Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(state, Some(SignalState::Done));
}

#[tokio::test]
async fn wait_returns_none_on_timeout() {
    let dir = tempdir().unwrap();
    let signal = SignalFile::in_dir(dir.path());

    let state = signal
        .wait(Duration::from_millis(10), Duration::from_millis(60))
        .await
        .unwrap();
    assert_eq!(state, None);
}
