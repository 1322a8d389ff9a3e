//! Best-effort `git` invocations.
//!
//! Nothing here is allowed to fail a generation: a missing binary, a
//! non-zero exit or a timeout all collapse to `None` and the caller treats
//! the feature as unavailable.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Run `git <args>` in `dir`, returning trimmed stdout on success.
pub fn run_git(dir: &Path, args: &[&str], timeout: Duration) -> Option<String> {
    if which::which("git").is_err() {
        tracing::debug!("git not found on PATH");
        return None;
    }
    let mut cmd = Command::new("git");
    cmd.args(args)
        .current_dir(dir)
        .env_remove("GIT_DIR")
        .env_remove("GIT_WORK_TREE")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            tracing::debug!(error = %e, "failed to spawn git");
            return None;
        }
    };

    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(_)) => break,
            Ok(None) => {}
            Err(e) => {
                tracing::debug!(error = %e, "failed to poll git");
                let _ = child.kill();
                return None;
            }
        }
        if start.elapsed() > timeout {
            let _ = child.kill();
            let _ = child.wait();
            tracing::warn!(?args, timeout_secs = timeout.as_secs(), "git timed out");
            return None;
        }
        std::thread::sleep(POLL_INTERVAL);
    }

    let output = child.wait_with_output().ok()?;
    if !output.status.success() {
        tracing::debug!(
            ?args,
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "git exited non-zero"
        );
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Short commit hash of the library checkout, or `""` when unavailable.
pub fn library_version(library_root: &Path, timeout: Duration) -> String {
    if !library_root.exists() {
        return String::new();
    }
    run_git(library_root, &["rev-parse", "--short", "HEAD"], timeout).unwrap_or_default()
}

/// `git init` in `dir`. Returns false when git is unavailable or failed.
pub fn init_repo(dir: &Path, timeout: Duration) -> bool {
    run_git(dir, &["init", "--quiet"], timeout).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn library_version_outside_repo_is_empty() {
        let dir = TempDir::new().unwrap();
        // A fresh temp dir is not a git checkout (or git is absent); either
        // way the lookup degrades to an empty string.
        let version = library_version(dir.path(), Duration::from_secs(5));
        assert!(version.is_empty() || version.len() >= 4);
    }

    #[test]
    fn library_version_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            library_version(&dir.path().join("missing"), Duration::from_secs(5)),
            ""
        );
    }

    #[test]
    fn run_git_in_missing_dir_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(run_git(&dir.path().join("nope"), &["status"], Duration::from_secs(5)).is_none());
    }
}
