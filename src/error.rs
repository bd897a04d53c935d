//! Error types for LLM Rate Lens
//!
//! Probe-level failures are recovered by the sampling controller; driver and
//! benchmark errors surface on the result bundle of the parameter set that
//! produced them.

use thiserror::Error;

/// Errors from a single completion probe
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Network/HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Endpoint returned a non-success status
    #[error("Unexpected status code: {0}")]
    Status(u16),

    /// Response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Request exceeded the client timeout
    #[error("Request timeout after {0}s")]
    Timeout(u64),

    /// No target URL was resolved for the probe
    #[error("No endpoint URL configured")]
    MissingUrl,
}

impl ProbeError {
    /// Classify a reqwest error, separating timeouts from other transport failures
    pub fn from_transport(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            ProbeError::Timeout(timeout_secs)
        } else {
            ProbeError::Network(err)
        }
    }
}

/// Errors from environment drivers
#[derive(Debug, Error)]
pub enum DriverError {
    /// Driver name not recognised
    #[error("Unsupported driver type: {0}")]
    Unsupported(String),

    /// Command template references an unknown parameter or is malformed
    #[error("Invalid command template: {0}")]
    Template(String),

    /// Shell command exited unsuccessfully
    #[error("{stage} command failed ({status}): {output}")]
    CommandFailed {
        stage: &'static str,
        status: String,
        output: String,
    },

    /// Shell command could not be spawned
    #[error("Failed to spawn {stage} command: {source}")]
    Spawn {
        stage: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Errors terminating the run of one parameter set
#[derive(Debug, Error)]
pub enum BenchmarkError {
    /// Every probe in both context classes failed
    #[error("All benchmark configurations failed")]
    AllProbesFailed,

    /// Environment setup failed before sampling started
    #[error("Driver setup failed: {0}")]
    DriverSetup(#[source] DriverError),

    /// Matrix produced no parameter combinations
    #[error("No parameter combinations generated from matrix")]
    EmptyMatrix,

    /// Completion client could not be built for the resolved endpoint
    #[error("Failed to create completion client: {0}")]
    Client(#[from] ProbeError),

    /// Driver could not be created
    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// File does not exist
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    /// YAML is malformed
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Matrix entry has an unsupported shape
    #[error("Invalid parameter format for key {key}: {reason}")]
    InvalidParameter { key: String, reason: String },
}
