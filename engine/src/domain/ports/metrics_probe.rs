//! MetricsProbe port
//! Interface for probing a host's metrics HTTP endpoint

use async_trait::async_trait;

use crate::domain::ProbeError;

/// Port for checking that a metrics endpoint answers.
///
/// The verifier is an HTTP client only; probes are read-only and safe to
/// repeat.
#[async_trait]
pub trait MetricsProbe: Send + Sync {
    /// GET the /metrics endpoint at `hostname:port`; Ok means healthy
    async fn probe(&self, hostname: &str, port: u16) -> Result<(), ProbeError>;
}
