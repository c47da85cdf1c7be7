pub mod metrics_probe;
pub mod mock_transport;
pub mod remote_executor;

pub use metrics_probe::MetricsProbe;
pub use mock_transport::{ScriptedExecutor, ScriptedProbe};
pub use remote_executor::{CommandOutput, RemoteExecutor};
