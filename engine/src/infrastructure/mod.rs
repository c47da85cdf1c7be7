pub mod http_probe;
pub mod inventory_store;
pub mod ssh_executor;
pub mod stack_launcher;

pub use http_probe::HttpMetricsProbe;
pub use inventory_store::YamlInventoryStore;
pub use ssh_executor::SshRemoteExecutor;
pub use stack_launcher::StackLauncher;
