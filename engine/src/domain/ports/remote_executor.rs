//! RemoteExecutor port
//! Interface for running commands on managed hosts over SSH (or equivalent)

use async_trait::async_trait;

use crate::domain::{ServerRecord, StepError};

/// Captured result of one remote command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Port for executing commands on a managed host.
///
/// Implementations own their transport (session setup, timeouts, teardown);
/// a session is exclusive to the task deploying that host and is released on
/// every exit path. Errors are per-host and are recorded against that host's
/// outcome, never propagated to sibling hosts.
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Open (and immediately close) a session to verify reachability.
    /// Must fail within a bounded timeout rather than hang.
    async fn connect(&self, server: &ServerRecord) -> Result<(), StepError>;

    /// Run one shell command on the host, capturing exit status and output
    async fn run(&self, server: &ServerRecord, command: &str)
        -> Result<CommandOutput, StepError>;
}
