//! Fleet Monitor Engine
//!
//! A library for inventory-driven monitoring fleet management:
//! - Declarative server inventory (load, validate, mutate, persist)
//! - Deterministic Prometheus scrape-config generation
//! - Bounded-parallel agent rollout over SSH with per-host failure isolation
//! - HTTP verification of deployed metrics endpoints

pub mod constants;

// Core architecture modules
pub mod domain;
pub mod infrastructure;

// Re-export public types
pub use domain::{
    Capability, CapabilityFailure, CommandOutput, DeployState, DeployStep, DeploymentOutcome,
    DomainError, Inventory, MonitoringType, ProbeError, Result, ServerRecord, StepError,
    StepOutcome, StepStatus, ValidationError, VerificationSummary,
};
