// ABOUTME: Spawns the external environment tool with captured stdio and a bounded timeout
// ABOUTME: Maps exit status onto the import error taxonomy, including direnv's blocked case

use direnvoy_logging::{debug, warn};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::time::timeout;

use crate::config::{ExportFormat, ImportConfig};
use crate::error::ImportError;
use crate::locate::EnvFile;

/// Tool resolved from PATH when no explicit path is configured.
pub const DEFAULT_TOOL: &str = "direnv";

/// direnv prints this when an `.envrc` has not been approved yet.
const BLOCKED_MARKER: &str = " is blocked";

/// Runs `<tool> export <format>` (and `<tool> allow`) against a project
/// directory.
///
/// Exactly one process is spawned per call, with the declaration file's
/// directory as working directory and stdout/stderr captured. A timeout
/// bounds every invocation; the child is spawned with kill-on-drop so a
/// timed-out tool is killed rather than orphaned. A semaphore caps how many
/// tool processes run at once across directories.
#[derive(Debug)]
pub struct DirenvInvoker {
    tool: Option<PathBuf>,
    format: ExportFormat,
    timeout: Duration,
    permits: Arc<Semaphore>,
}

impl DirenvInvoker {
    pub fn new(config: &ImportConfig) -> Self {
        Self {
            tool: config.direnv_path.clone(),
            format: config.format,
            timeout: config.timeout(),
            permits: Arc::new(Semaphore::new(config.max_concurrent_invocations.max(1))),
        }
    }

    /// Evaluate the declaration file, returning the tool's raw stdout.
    pub async fn invoke(&self, file: &EnvFile) -> Result<Vec<u8>, ImportError> {
        let output = self
            .run(&file.dir, &["export", self.format.as_arg()])
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            if stderr.contains(BLOCKED_MARKER) {
                return Err(ImportError::EnvrcBlocked {
                    path: file.path.clone(),
                });
            }
            warn!(
                code = output.status.code().unwrap_or(-1),
                stderr = %stderr.trim(),
                "environment tool failed"
            );
            return Err(ImportError::ToolExitNonZero {
                code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        Ok(output.stdout)
    }

    /// Approve the declaration file (`<tool> allow`).
    pub async fn allow(&self, file: &EnvFile) -> Result<(), ImportError> {
        let output = self.run(&file.dir, &["allow"]).await?;

        if !output.status.success() {
            return Err(ImportError::ToolExitNonZero {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(())
    }

    async fn run(&self, dir: &Path, args: &[&str]) -> Result<std::process::Output, ImportError> {
        let tool = self.resolve_tool()?;

        // The semaphore we own is never closed, so acquire cannot fail.
        let _permit = self.permits.acquire().await.ok();

        debug!(tool = %tool.display(), args = ?args, dir = %dir.display(), "spawning environment tool");

        let child = Command::new(&tool)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => ImportError::ToolNotFound {
                    tool: tool.display().to_string(),
                },
                _ => ImportError::io(&tool, &err),
            })?;

        // Dropping the output future on timeout kills the child via
        // kill_on_drop, so nothing is left running. Stdout is drained
        // concurrently with waiting; direnv does not exit until its output
        // has been read.
        match timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(err)) => Err(ImportError::io(&tool, &err)),
            Err(_) => {
                warn!(timeout = ?self.timeout, "environment tool timed out");
                Err(ImportError::ToolTimeout {
                    timeout: self.timeout,
                })
            }
        }
    }

    fn resolve_tool(&self) -> Result<PathBuf, ImportError> {
        let requested = self
            .tool
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TOOL));

        which::which(&requested).map_err(|_| ImportError::ToolNotFound {
            tool: requested.display().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{fake_tool, fake_tool_config};
    use tempfile::tempdir;

    fn env_file(dir: &Path) -> EnvFile {
        EnvFile {
            path: dir.join(".envrc"),
            dir: dir.to_path_buf(),
        }
    }

    #[tokio::test]
    async fn test_invoke_captures_stdout() {
        let dir = tempdir().unwrap();
        let tool = fake_tool(dir.path(), "printf '{\"FOO\":\"bar\"}'");
        let invoker = DirenvInvoker::new(&fake_tool_config(&tool));

        let stdout = invoker.invoke(&env_file(dir.path())).await.unwrap();
        assert_eq!(stdout, b"{\"FOO\":\"bar\"}");
    }

    #[tokio::test]
    async fn test_invoke_runs_in_project_directory() {
        let dir = tempdir().unwrap();
        let tool = fake_tool(dir.path(), "pwd");
        let invoker = DirenvInvoker::new(&fake_tool_config(&tool));

        let stdout = invoker.invoke(&env_file(dir.path())).await.unwrap();
        let cwd = String::from_utf8(stdout).unwrap();
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(cwd.trim(), expected.to_str().unwrap());
    }

    #[tokio::test]
    async fn test_nonzero_exit_carries_code_and_stderr() {
        let dir = tempdir().unwrap();
        let tool = fake_tool(dir.path(), "echo 'command not found' >&2; exit 1");
        let invoker = DirenvInvoker::new(&fake_tool_config(&tool));

        let err = invoker.invoke(&env_file(dir.path())).await.unwrap_err();
        match err {
            ImportError::ToolExitNonZero { code, stderr } => {
                assert_eq!(code, 1);
                assert!(stderr.contains("command not found"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blocked_stderr_is_its_own_error() {
        let dir = tempdir().unwrap();
        let tool = fake_tool(dir.path(), "echo '.envrc is blocked' >&2; exit 1");
        let invoker = DirenvInvoker::new(&fake_tool_config(&tool));

        let err = invoker.invoke(&env_file(dir.path())).await.unwrap_err();
        assert!(matches!(err, ImportError::EnvrcBlocked { .. }));
    }

    #[tokio::test]
    async fn test_missing_tool_is_tool_not_found() {
        let dir = tempdir().unwrap();
        let mut config = ImportConfig::default();
        config.direnv_path = Some(dir.path().join("definitely-not-here"));
        let invoker = DirenvInvoker::new(&config);

        let err = invoker.invoke(&env_file(dir.path())).await.unwrap_err();
        assert!(matches!(err, ImportError::ToolNotFound { .. }));
    }

    #[tokio::test]
    async fn test_timeout_kills_the_tool() {
        let dir = tempdir().unwrap();
        let tool = fake_tool(dir.path(), "sleep 30");
        let mut config = fake_tool_config(&tool);
        config.timeout_ms = 250;
        let invoker = DirenvInvoker::new(&config);

        let started = std::time::Instant::now();
        let err = invoker.invoke(&env_file(dir.path())).await.unwrap_err();
        let elapsed = started.elapsed();

        assert!(matches!(err, ImportError::ToolTimeout { .. }));
        // Well under the 30s the tool would sleep for
        assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");
    }

    /// Alive according to /proc; a zombie is as dead as a reaped process here.
    fn process_is_running(pid: u32) -> bool {
        match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
            Ok(stat) => !stat.contains(") Z "),
            Err(_) => false,
        }
    }

    #[tokio::test]
    async fn test_timed_out_tool_is_killed() {
        let dir = tempdir().unwrap();
        let pid_file = dir.path().join("pid");
        // exec keeps it a single process so the recorded pid is the sleeper
        let tool = fake_tool(
            dir.path(),
            &format!("echo $$ > '{}'\nexec sleep 30", pid_file.display()),
        );
        let mut config = fake_tool_config(&tool);
        config.timeout_ms = 250;
        let invoker = DirenvInvoker::new(&config);

        let err = invoker.invoke(&env_file(dir.path())).await.unwrap_err();
        assert!(matches!(err, ImportError::ToolTimeout { .. }));

        let pid: u32 = std::fs::read_to_string(&pid_file)
            .unwrap()
            .trim()
            .parse()
            .unwrap();

        // The kill signal lands when the wait future is dropped; give the
        // kernel a moment to deliver it
        for _ in 0..50 {
            if !process_is_running(pid) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        panic!("tool process {pid} survived the timeout");
    }

    #[tokio::test]
    async fn test_allow_succeeds_on_zero_exit() {
        let dir = tempdir().unwrap();
        let tool = fake_tool(dir.path(), "exit 0");
        let invoker = DirenvInvoker::new(&fake_tool_config(&tool));

        invoker.allow(&env_file(dir.path())).await.unwrap();
    }
}
