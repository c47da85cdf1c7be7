pub mod capability;
pub mod deploy_step;
pub mod monitoring_type;

pub use capability::Capability;
pub use deploy_step::{DeployState, DeployStep, DeploymentOutcome, StepOutcome, StepStatus};
pub use monitoring_type::MonitoringType;
