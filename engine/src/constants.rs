//! Engine-wide default values

use std::time::Duration;

/// Default maximum number of hosts deployed concurrently
pub const DEFAULT_MAX_PARALLEL: usize = 5;

/// Wall-clock ceiling for one host's full deploy step sequence
pub const DEFAULT_SERVER_TIMEOUT: Duration = Duration::from_secs(120);

/// Timeout for a single remote command
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(30);

/// SSH connection establishment timeout (seconds, passed to ssh -o ConnectTimeout)
pub const SSH_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default port for the node_exporter system-metrics agent
pub const DEFAULT_PROMETHEUS_PORT: u16 = 9100;

/// Default port for the cAdvisor container-metrics agent
pub const DEFAULT_CADVISOR_PORT: u16 = 8080;

/// HTTP probe timeout used by the verifier
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Number of probe attempts per endpoint before declaring it unhealthy
pub const PROBE_ATTEMPTS: u32 = 3;

/// Fixed delay between probe attempts
pub const PROBE_BACKOFF: Duration = Duration::from_secs(2);

/// Default SSH user when the inventory entry does not set one
pub const DEFAULT_SSH_USER: &str = "ubuntu";

/// Default SSH private key path when the inventory entry does not set one
pub const DEFAULT_SSH_KEY_PATH: &str = "~/.ssh/id_rsa";
