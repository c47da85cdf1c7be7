pub mod deployment_service;
pub mod scrape_config_service;
pub mod validation_service;
pub mod verification_service;

pub use deployment_service::{all_succeeded, FleetDeploymentService};
pub use scrape_config_service::{
    generate as generate_scrape_config, render as render_scrape_config, GlobalConfig,
    ScrapeConfig, ScrapeJob, StaticConfig,
};
pub use validation_service::{validate_inventory, ValidationError};
pub use verification_service::{CapabilityFailure, VerificationService, VerificationSummary};
