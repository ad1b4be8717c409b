//! Shell command execution
//!
//! Every interaction with `nmcli`, `mmcli`, `wg` and `ip` goes through
//! [`CommandRunner`], so managers can be exercised against a mock.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::config::CommandSettings;
use crate::error::{GatewayError, GatewayResult};

/// Result of a finished command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Command line as it was requested
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn new(command: impl Into<String>, stdout: impl Into<String>, stderr: impl Into<String>, exit_code: i32) -> Self {
        Self {
            command: command.into(),
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a shell command line, optionally elevated and with data fed to stdin.
    ///
    /// A non-zero exit code is not an error here; callers interpret it.
    async fn run(&self, command: &str, need_sudo: bool, stdin: Option<String>) -> GatewayResult<CommandOutput>;
}

/// Runs command lines through `sh -c`
pub struct ShellCommandRunner {
    settings: CommandSettings,
}

impl ShellCommandRunner {
    pub fn new(settings: CommandSettings) -> Self {
        Self { settings }
    }

    fn command_line(&self, command: &str, need_sudo: bool) -> String {
        if need_sudo && self.settings.sudo && !is_root() {
            format!("sudo {}", command)
        } else {
            command.to_string()
        }
    }
}

#[async_trait]
impl CommandRunner for ShellCommandRunner {
    async fn run(&self, command: &str, need_sudo: bool, stdin: Option<String>) -> GatewayResult<CommandOutput> {
        let line = self.command_line(command, need_sudo);
        debug!("Executing: {}", line);

        let mut child = Command::new(&self.settings.shell)
            .arg("-c")
            .arg(&line)
            .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| GatewayError::CommandFailed {
                cmd: line.clone(),
                code: None,
                stderr: e.to_string(),
            })?;

        if let (Some(data), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(data.as_bytes()).await?;
            // Closing stdin lets tools like `wg pubkey` finish reading
            drop(pipe);
        }

        let output = child.wait_with_output().await?;
        let exit_code = output.status.code().unwrap_or(-1);
        debug!("Command '{}' exited with {}", line, exit_code);

        Ok(CommandOutput {
            command: command.to_string(),
            stdout: String::from_utf8_lossy(&output.stdout).trim_end().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
            exit_code,
        })
    }
}

/// Quote a single shell argument, POSIX style
pub fn escape_shell_arg(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', "'\\''"))
}

fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}
