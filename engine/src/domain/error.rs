//! Domain-level errors
//! These represent broken operator input or per-host failures, not bugs

use thiserror::Error;

/// Errors from local, offline operations (inventory CRUD, config generation).
/// These abort the whole command: they indicate input the operator must fix.
#[derive(Debug, Error, Clone)]
pub enum DomainError {
    #[error("server '{0}' not found in inventory")]
    ServerNotFound(String),

    #[error("server '{0}' already exists in inventory")]
    DuplicateServer(String),

    #[error("unknown server field '{0}'")]
    UnknownField(String),

    #[error("invalid value for field '{field}': {reason}")]
    InvalidFieldValue { field: String, reason: String },

    #[error("invalid monitoring type '{0}' (expected system, docker+system or kubernetes+system)")]
    InvalidMonitoringType(String),

    #[error("failed to parse inventory: {0}")]
    InventoryParse(String),

    #[error("inventory I/O error: {0}")]
    InventoryIo(String),

    #[error("inventory has {0} validation error(s)")]
    InvalidInventory(usize),

    #[error("failed to write scrape config: {0}")]
    ConfigWrite(String),

    #[error("central stack command failed: {0}")]
    StackLaunch(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;

/// Errors from one remote provisioning step against one host.
/// Always recorded in that host's outcome, never propagated to siblings.
#[derive(Debug, Error, Clone)]
pub enum StepError {
    #[error("connection failed: {0}")]
    Connectivity(String),

    #[error("remote command timed out after {0}s")]
    Timeout(u64),

    #[error("remote command exited {code}: {stderr}")]
    CommandFailed { code: i32, stderr: String },

    #[error("remote execution failed: {0}")]
    Transport(String),
}

/// Errors from one HTTP probe against one capability endpoint.
#[derive(Debug, Error, Clone)]
pub enum ProbeError {
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("endpoint returned HTTP {0}")]
    BadStatus(u16),

    #[error("probe timed out")]
    Timeout,
}
