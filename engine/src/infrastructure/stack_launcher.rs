//! Central stack launcher
//! Brings up the local Prometheus/Grafana collector stack via docker compose

use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

use crate::domain::{DomainError, Result};

/// Launches the central metrics-collection stack on the controller host.
///
/// The launcher only writes the freshly generated scrape config into the
/// stack directory and shells out to `docker compose up -d`; compose file
/// contents (Prometheus, Grafana, Alertmanager) are the operator's.
pub struct StackLauncher {
    stack_dir: PathBuf,
}

impl StackLauncher {
    pub fn new(stack_dir: impl Into<PathBuf>) -> Self {
        Self {
            stack_dir: stack_dir.into(),
        }
    }

    pub fn stack_dir(&self) -> &Path {
        &self.stack_dir
    }

    /// Write the rendered scrape config into the stack directory and bring
    /// the stack up. Compose is idempotent: already-running services are
    /// left alone, changed ones are recreated.
    pub async fn launch(&self, scrape_config_yaml: &str) -> Result<()> {
        let config_path = self.stack_dir.join("prometheus.yml");
        std::fs::create_dir_all(&self.stack_dir)
            .and_then(|_| std::fs::write(&config_path, scrape_config_yaml))
            .map_err(|e| {
                DomainError::StackLaunch(format!("{}: {}", config_path.display(), e))
            })?;
        debug!(path = %config_path.display(), "Wrote scrape config for the central stack");

        let output = Command::new("docker")
            .args(["compose", "up", "-d"])
            .current_dir(&self.stack_dir)
            .output()
            .await
            .map_err(|e| DomainError::StackLaunch(format!("failed to run docker compose: {}", e)))?;

        if !output.status.success() {
            return Err(DomainError::StackLaunch(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        info!(stack_dir = %self.stack_dir.display(), "Central stack is up");
        Ok(())
    }
}
