//! Blocking external tool invocation with a deadline.

use std::fs::File;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::parser::CancelToken;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Run `command` to completion, killing it on timeout or cancellation.
///
/// Stdout is discarded and stderr goes to `stderr_log`, whose contents are
/// quoted in the error when the tool exits unsuccessfully.
pub(crate) fn run_tool(
    mut command: Command,
    label: &str,
    timeout: Duration,
    cancel: &CancelToken,
    stderr_log: &Path,
) -> Result<()> {
    let stderr = File::create(stderr_log)?;
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::from(stderr));

    let mut child = command
        .spawn()
        .map_err(|e| Error::Ocr(format!("Failed to run {}: {}", label, e)))?;

    let started = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if cancel.is_cancelled() {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::Cancelled);
        }
        if started.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::Ocr(format!(
                "{} timed out after {}s",
                label,
                timeout.as_secs()
            )));
        }
        thread::sleep(POLL_INTERVAL);
    };

    if status.success() {
        Ok(())
    } else {
        let detail = std::fs::read_to_string(stderr_log).unwrap_or_default();
        Err(Error::Ocr(format!(
            "{} failed ({}): {}",
            label,
            status,
            detail.trim()
        )))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn test_successful_tool() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("ok.err");
        run_tool(shell("exit 0"), "sh", Duration::from_secs(5), &CancelToken::new(), &log).unwrap();
    }

    #[test]
    fn test_failure_quotes_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("fail.err");
        let err = run_tool(
            shell("echo broken >&2; exit 3"),
            "sh",
            Duration::from_secs(5),
            &CancelToken::new(),
            &log,
        )
        .unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_timeout_kills_child() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("slow.err");
        let started = Instant::now();
        let err = run_tool(
            shell("sleep 5"),
            "sh",
            Duration::from_millis(100),
            &CancelToken::new(),
            &log,
        )
        .unwrap_err();
        assert!(err.to_string().contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_cancelled_before_completion() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("cancel.err");
        let token = CancelToken::new();
        token.cancel();
        let err = run_tool(shell("sleep 5"), "sh", Duration::from_secs(10), &token, &log).unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[test]
    fn test_missing_binary() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("missing.err");
        let err = run_tool(
            Command::new("definitely-not-a-real-tool-xyz"),
            "missing",
            Duration::from_secs(1),
            &CancelToken::new(),
            &log,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Ocr(_)));
    }
}
