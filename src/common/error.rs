//! Error types for the harness
//!
//! Every failure from a collaborator (agent control, metrics backend,
//! parameter store) is an explicit error return; the orchestrator converts
//! them into Failed test results with the original message retained.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the harness
#[derive(Error, Debug)]
pub enum Error {
    // === Agent lifecycle errors ===
    #[error("Agent could not start: {0}")]
    AgentStartFailed(String),

    #[error("Agent could not stop: {0}")]
    AgentStopFailed(String),

    #[error("Failed to deploy agent configuration '{path}': {reason}")]
    ConfigDeployFailed { path: String, reason: String },

    #[error("Failed to clean up deployed config '{path}': {reason}")]
    CleanupFailed { path: String, reason: String },

    // === Setup hook errors ===
    #[error("Failed to complete setup before agent run: {0}")]
    SetupBeforeRun(String),

    #[error("Failed to complete setup after agent run: {0}")]
    SetupAfterRun(String),

    // === Metrics backend errors ===
    #[error("Metrics backend query failed: {0}")]
    BackendQuery(String),

    #[error("Metrics backend returned malformed response: {0}")]
    BackendResponse(String),

    // === Dimension resolution errors ===
    #[error("Unresolved dimension instructions: {0}")]
    UnresolvedDimensions(String),

    // === Parameter store / service control errors ===
    #[error("Failed to put parameter '{name}': {reason}")]
    ParameterPutFailed { name: String, reason: String },

    #[error("Failed to restart service '{service}' on cluster '{cluster}': {reason}")]
    ServiceRestartFailed {
        cluster: String,
        service: String,
        reason: String,
    },

    #[error("The 'aws' CLI was not found on PATH. Install the AWS CLI or run EC2-only suites")]
    AwsCliNotFound,

    // === Cancellation ===
    #[error("Harness run was cancelled")]
    Cancelled,

    // === Configuration errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === HTTP Errors ===
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a config deploy error
    pub fn config_deploy(path: &str, reason: impl ToString) -> Self {
        Self::ConfigDeployFailed {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a cleanup error
    pub fn cleanup(path: &str, reason: impl ToString) -> Self {
        Self::CleanupFailed {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a parameter put error
    pub fn parameter_put(name: &str, reason: impl ToString) -> Self {
        Self::ParameterPutFailed {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a service restart error
    pub fn service_restart(cluster: &str, service: &str, reason: impl ToString) -> Self {
        Self::ServiceRestartFailed {
            cluster: cluster.to_string(),
            service: service.to_string(),
            reason: reason.to_string(),
        }
    }

}
