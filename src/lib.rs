//! STRESSBENCH - CPU/GPU Stress Engine
//!
//! A cross-platform library for driving CPU and GPU load at a configurable
//! intensity while concurrently sampling estimated power draw and thermal
//! state, producing timestamped sample series suitable for charting.
//!
//! The engine exposes two blocking-until-complete entry points,
//! [`stress::run_cpu_stress_test`] and [`stress::run_gpu_stress_test`], which
//! a presentation layer is expected to call from a context that does not
//! freeze its UI.

use std::fmt;

// Public re-exports
pub mod config;
pub mod models;
pub mod monitor;
pub mod stress;
pub mod telemetry;
pub mod util;

// Common error types
#[derive(Debug)]
pub enum StressError {
    /// I/O operation failed
    IoError(std::io::Error),
    /// Configuration validation or parsing error
    ConfigError(String),
    /// Telemetry read or parse error
    TelemetryError(String),
    /// Monitoring sampler task error
    MonitorError(String),
    /// Workload worker task error
    WorkerError(String),
    /// GPU device or dispatch error
    GpuError(String),
    /// Results serialization error
    SerializationError(String),
}

impl fmt::Display for StressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StressError::IoError(err) => write!(f, "I/O error: {}", err),
            StressError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            StressError::TelemetryError(msg) => write!(f, "Telemetry error: {}", msg),
            StressError::MonitorError(msg) => write!(f, "Monitor error: {}", msg),
            StressError::WorkerError(msg) => write!(f, "Worker error: {}", msg),
            StressError::GpuError(msg) => write!(f, "GPU error: {}", msg),
            StressError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for StressError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StressError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StressError {
    fn from(err: std::io::Error) -> Self {
        StressError::IoError(err)
    }
}

impl From<serde_json::Error> for StressError {
    fn from(err: serde_json::Error) -> Self {
        StressError::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl From<toml::de::Error> for StressError {
    fn from(err: toml::de::Error) -> Self {
        StressError::ConfigError(format!("TOML parsing error: {}", err))
    }
}

impl From<toml::ser::Error> for StressError {
    fn from(err: toml::ser::Error) -> Self {
        StressError::ConfigError(format!("TOML serialization error: {}", err))
    }
}

/// Result type alias for stressbench operations
pub type Result<T> = std::result::Result<T, StressError>;

// Common types and constants
pub const APP_NAME: &str = "stressbench";
pub const CONFIG_FILE: &str = "stressbench.toml";
