//! Subprocess execution with timeouts
//!
//! Interpreter stdout/stderr stream straight into the layout's capture
//! files, so workers never buffer interpreter output in memory. The child
//! is polled with [`Child::try_wait`] and killed once its deadline passes;
//! the timeout and launch-failure paths rewrite the capture files with the
//! sentinel contents so that what is on disk always matches the recorded
//! exit code.

use std::fs::{self, File};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use luaparity_corpus::NOT_RUN;

use crate::error::{RunnerError, RunnerResult};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Run one interpreter over one fixture.
///
/// `argv` is the interpreter command (program plus leading arguments);
/// the fixture path is appended as the final positional argument. Returns
/// the exit code that was recorded: the real code on completion, or
/// [`NOT_RUN`] with stderr "Timeout" on expiry, or [`NOT_RUN`] with the
/// launch error text when the process could not start. Launch and timeout
/// failures never propagate; only capture-file I/O errors do.
pub fn run_capture(
    argv: &[String],
    fixture: &Path,
    timeout: Duration,
    stdout_path: &Path,
    stderr_path: &Path,
) -> RunnerResult<i32> {
    let stdout_file =
        File::create(stdout_path).map_err(|e| RunnerError::io(stdout_path, e))?;
    let stderr_file =
        File::create(stderr_path).map_err(|e| RunnerError::io(stderr_path, e))?;

    let (program, args) = match argv.split_first() {
        Some(split) => split,
        None => {
            fs::write(stderr_path, "empty interpreter command")
                .map_err(|e| RunnerError::io(stderr_path, e))?;
            return Ok(NOT_RUN);
        }
    };

    let child = Command::new(program)
        .args(args)
        .arg(fixture)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout_file))
        .stderr(Stdio::from(stderr_file))
        .spawn();

    let mut child = match child {
        Ok(child) => child,
        Err(e) => {
            fs::write(stderr_path, format!("{}: {}", program, e))
                .map_err(|e| RunnerError::io(stderr_path, e))?;
            return Ok(NOT_RUN);
        }
    };

    match wait_with_timeout(&mut child, timeout) {
        WaitOutcome::Exited(status) => Ok(exit_code(status)),
        WaitOutcome::TimedOut => {
            fs::write(stdout_path, "").map_err(|e| RunnerError::io(stdout_path, e))?;
            fs::write(stderr_path, "Timeout").map_err(|e| RunnerError::io(stderr_path, e))?;
            Ok(NOT_RUN)
        }
    }
}

enum WaitOutcome {
    Exited(ExitStatus),
    TimedOut,
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> WaitOutcome {
    let started_at = Instant::now();

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return WaitOutcome::Exited(status),
            Ok(None) => {
                if started_at.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return WaitOutcome::TimedOut;
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(_) => {
                let _ = child.kill();
                let _ = child.wait();
                return WaitOutcome::TimedOut;
            }
        }
    }
}

/// Exit code of a finished child, signal deaths as negative numbers
#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|s| -s))
        .unwrap_or(NOT_RUN)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(NOT_RUN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn capture_paths(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
        (dir.join("fixture.out"), dir.join("fixture.err"))
    }

    #[test]
    fn test_successful_run_captures_stdout() {
        let dir = tempdir().unwrap();
        let fixture = dir.path().join("hello.lua");
        fs::write(&fixture, "hello\n").unwrap();
        let (out, err) = capture_paths(dir.path());

        let argv = vec!["cat".to_string()];
        let rc = run_capture(&argv, &fixture, Duration::from_secs(5), &out, &err).unwrap();

        assert_eq!(rc, 0);
        assert_eq!(fs::read_to_string(&out).unwrap(), "hello\n");
        assert_eq!(fs::read_to_string(&err).unwrap(), "");
    }

    #[test]
    fn test_nonzero_exit_code_recorded() {
        let dir = tempdir().unwrap();
        let fixture = dir.path().join("absent.lua");
        let (out, err) = capture_paths(dir.path());

        // cat on a missing file exits 1 with a message on stderr
        let argv = vec!["cat".to_string()];
        let rc = run_capture(&argv, &fixture, Duration::from_secs(5), &out, &err).unwrap();

        assert_eq!(rc, 1);
        assert!(!fs::read_to_string(&err).unwrap().is_empty());
    }

    #[test]
    fn test_launch_failure_is_sentinel() {
        let dir = tempdir().unwrap();
        let fixture = dir.path().join("any.lua");
        fs::write(&fixture, "").unwrap();
        let (out, err) = capture_paths(dir.path());

        let argv = vec!["definitely-not-an-interpreter-9000".to_string()];
        let rc = run_capture(&argv, &fixture, Duration::from_secs(5), &out, &err).unwrap();

        assert_eq!(rc, NOT_RUN);
        let captured = fs::read_to_string(&err).unwrap();
        assert!(captured.starts_with("definitely-not-an-interpreter-9000:"));
    }

    #[test]
    fn test_timeout_kills_and_records_sentinel() {
        let dir = tempdir().unwrap();
        let fixture = dir.path().join("any.lua");
        fs::write(&fixture, "").unwrap();
        let (out, err) = capture_paths(dir.path());

        // The appended fixture path lands in $0, which sh ignores here
        let argv = vec!["sh".to_string(), "-c".to_string(), "sleep 30".to_string()];
        let started = Instant::now();
        let rc =
            run_capture(&argv, &fixture, Duration::from_millis(200), &out, &err).unwrap();

        assert_eq!(rc, NOT_RUN);
        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(fs::read_to_string(&out).unwrap(), "");
        assert_eq!(fs::read_to_string(&err).unwrap(), "Timeout");
    }

    #[test]
    fn test_empty_command_is_sentinel() {
        let dir = tempdir().unwrap();
        let fixture = dir.path().join("any.lua");
        let (out, err) = capture_paths(dir.path());

        let rc = run_capture(&[], &fixture, Duration::from_secs(1), &out, &err).unwrap();
        assert_eq!(rc, NOT_RUN);
        assert_eq!(
            fs::read_to_string(&err).unwrap(),
            "empty interpreter command"
        );
    }
}
