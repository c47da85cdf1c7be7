pub mod entities;
pub mod error;
pub mod ports;
pub mod services;
pub mod value_objects;

pub use entities::{Inventory, ServerRecord};
pub use error::{DomainError, ProbeError, Result, StepError};
pub use ports::{CommandOutput, MetricsProbe, RemoteExecutor};
pub use services::{
    all_succeeded, generate_scrape_config, render_scrape_config, validate_inventory,
    CapabilityFailure, FleetDeploymentService, ScrapeConfig, ValidationError,
    VerificationService, VerificationSummary,
};
pub use value_objects::{
    Capability, DeployState, DeployStep, DeploymentOutcome, MonitoringType, StepOutcome,
    StepStatus,
};
