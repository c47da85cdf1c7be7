//! SSH remote executor
//! RemoteExecutor implementation over the system ssh binary

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::constants::{DEFAULT_STEP_TIMEOUT, SSH_CONNECT_TIMEOUT_SECS};
use crate::domain::ports::{CommandOutput, RemoteExecutor};
use crate::domain::{ServerRecord, StepError};

/// Runs commands on managed hosts through `ssh` in batch mode.
///
/// Every invocation is wrapped in an outer timeout so a wedged transport can
/// never hold a deploy slot past its ceiling; the ssh process itself also
/// carries a connect timeout. Sessions are one process per command, so
/// teardown is the process exiting, on every path.
pub struct SshRemoteExecutor {
    step_timeout: Duration,
    connect_timeout_secs: u64,
}

impl SshRemoteExecutor {
    pub fn new() -> Self {
        Self {
            step_timeout: DEFAULT_STEP_TIMEOUT,
            connect_timeout_secs: SSH_CONNECT_TIMEOUT_SECS,
        }
    }

    /// Outer timeout applied to each remote command
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    fn ssh_args(&self, server: &ServerRecord, command: &str) -> Vec<String> {
        vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout_secs),
            "-i".to_string(),
            server.ssh_key_path.clone(),
            format!("{}@{}", server.ssh_user, server.hostname),
            command.to_string(),
        ]
    }

    async fn invoke(&self, server: &ServerRecord, command: &str) -> Result<CommandOutput, StepError> {
        let args = self.ssh_args(server, command);
        debug!(server = %server.name, command, "Running remote command");

        let child = Command::new("ssh")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.step_timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(StepError::Transport(format!("failed to spawn ssh: {}", e)));
            }
            Err(_) => {
                warn!(
                    server = %server.name,
                    timeout_secs = self.step_timeout.as_secs(),
                    "Remote command timed out"
                );
                return Err(StepError::Timeout(self.step_timeout.as_secs()));
            }
        };

        Ok(CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl Default for SshRemoteExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteExecutor for SshRemoteExecutor {
    async fn connect(&self, server: &ServerRecord) -> Result<(), StepError> {
        // ssh exit 255 covers auth, DNS and routing failures alike
        let output = self.invoke(server, "true").await?;
        if output.success() {
            Ok(())
        } else {
            Err(StepError::Connectivity(
                output.stderr.trim().to_string(),
            ))
        }
    }

    async fn run(
        &self,
        server: &ServerRecord,
        command: &str,
    ) -> Result<CommandOutput, StepError> {
        self.invoke(server, command).await
    }
}
