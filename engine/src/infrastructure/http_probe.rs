//! HTTP metrics probe
//! MetricsProbe implementation against GET /metrics endpoints

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::constants::PROBE_TIMEOUT;
use crate::domain::ports::MetricsProbe;
use crate::domain::ProbeError;

/// Probes `http://host:port/metrics` with a short timeout.
///
/// Uses ureq inside spawn_blocking; any 2xx answer counts as healthy.
pub struct HttpMetricsProbe {
    timeout: Duration,
}

impl HttpMetricsProbe {
    pub fn new() -> Self {
        Self {
            timeout: PROBE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for HttpMetricsProbe {
    fn default() -> Self {
        Self::new()
    }
}

fn metrics_url(hostname: &str, port: u16) -> String {
    format!("http://{}:{}/metrics", hostname, port)
}

#[async_trait]
impl MetricsProbe for HttpMetricsProbe {
    async fn probe(&self, hostname: &str, port: u16) -> Result<(), ProbeError> {
        let url = metrics_url(hostname, port);
        let timeout = self.timeout;
        debug!(url = %url, "Probing metrics endpoint");

        let result = tokio::task::spawn_blocking(move || {
            let agent = ureq::AgentBuilder::new().timeout(timeout).build();
            match agent.get(&url).call() {
                Ok(resp) => {
                    let status = resp.status();
                    if (200..300).contains(&status) {
                        Ok(())
                    } else {
                        Err(ProbeError::BadStatus(status))
                    }
                }
                Err(ureq::Error::Status(code, _)) => Err(ProbeError::BadStatus(code)),
                Err(e) => Err(ProbeError::Unreachable(e.to_string())),
            }
        })
        .await;

        match result {
            Ok(outcome) => outcome,
            Err(e) => Err(ProbeError::Unreachable(format!("probe task failed: {}", e))),
        }
    }
}
