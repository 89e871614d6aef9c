//! Configuration management module
//!
//! Holds the engine tunables (duration ceiling, sampling cadence, workload
//! base sizes), the stress-level-to-workload-parameter mapping, and TOML
//! persistence of the tunables.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Result, StressError, APP_NAME, CONFIG_FILE};

/// Which workload a test drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StressKind {
    /// Parallel SHA-512 hashing across all cores
    Cpu,
    /// Repeated matrix-multiply compute dispatches
    Gpu,
}

impl StressKind {
    /// Short human-readable name used in result summaries
    pub fn description(&self) -> &'static str {
        match self {
            StressKind::Cpu => "CPU",
            StressKind::Gpu => "GPU",
        }
    }
}

/// Workload parameters derived from a stress level
///
/// Computed once per test run and never mutated. Every field scales
/// monotonically with the level that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadParams {
    /// Nominal test duration
    pub duration: Duration,
    /// SHA-512 iterations each CPU worker performs
    pub iterations_per_core: u64,
    /// Square matrix dimension for the GPU workload
    pub matrix_size: u32,
    /// Multiply repetitions per GPU dispatch
    pub batch_count: u32,
}

impl WorkloadParams {
    /// Map a stress level in [10, 100] using the default engine tunables
    pub fn from_level(level: u32) -> Self {
        EngineConfig::default().params_for(level)
    }
}

/// Engine tunables with defaults matching the reference behavior
///
/// The defaults give the full-scale workload: a 600 second ceiling, 5 second
/// sampling cadence, 500k hash iterations per core, 1024x1024 matrices and
/// 10 multiply batches per dispatch at level 100.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Duration ceiling reached at level 100
    pub max_duration: Duration,
    /// Cadence of the monitoring sampler
    pub sample_interval: Duration,
    /// Hash iterations per core reached at level 100
    pub base_iterations: u64,
    /// Matrix dimension reached at level 100
    pub base_matrix_size: u32,
    /// Multiply batches per dispatch reached at level 100
    pub base_batch_count: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_duration: Duration::from_secs(600),
            sample_interval: Duration::from_secs(5),
            base_iterations: 500_000,
            base_matrix_size: 1024,
            base_batch_count: 10,
        }
    }
}

impl EngineConfig {
    /// Create a new engine configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a stress level in [10, 100] to workload parameters
    ///
    /// Pure and total over the contract range; levels outside [10, 100] are
    /// a caller contract violation and are not clamped here. All scaled
    /// values truncate toward zero, so `params_for(10)` with the defaults
    /// yields a 60 second duration, 50_000 iterations per core, a 102x102
    /// matrix and a single batch.
    pub fn params_for(&self, level: u32) -> WorkloadParams {
        let fraction = level as f64 / 100.0;
        WorkloadParams {
            duration: self.max_duration.mul_f64(fraction),
            iterations_per_core: self.base_iterations * level as u64 / 100,
            matrix_size: (self.base_matrix_size as u64 * level as u64 / 100) as u32,
            batch_count: (self.base_batch_count as u64 * level as u64 / 100) as u32,
        }
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.max_duration.is_zero() {
            return Err(StressError::ConfigError(
                "Maximum duration must be greater than 0".to_string(),
            ));
        }

        const MAX_CEILING: Duration = Duration::from_secs(3600); // 1 hour
        if self.max_duration > MAX_CEILING {
            return Err(StressError::ConfigError(format!(
                "Maximum duration too long: {}s (max: {}s)",
                self.max_duration.as_secs(),
                MAX_CEILING.as_secs()
            )));
        }

        if self.sample_interval.is_zero() {
            return Err(StressError::ConfigError(
                "Sample interval must be greater than 0".to_string(),
            ));
        }

        if self.sample_interval > self.max_duration {
            return Err(StressError::ConfigError(
                "Sample interval must not exceed the maximum duration".to_string(),
            ));
        }

        if self.base_matrix_size == 0 {
            return Err(StressError::ConfigError(
                "Base matrix size must be greater than 0".to_string(),
            ));
        }

        const MAX_MATRIX_SIZE: u32 = 8192;
        if self.base_matrix_size > MAX_MATRIX_SIZE {
            return Err(StressError::ConfigError(format!(
                "Base matrix size too large: {} (max: {})",
                self.base_matrix_size, MAX_MATRIX_SIZE
            )));
        }

        if self.base_batch_count == 0 {
            return Err(StressError::ConfigError(
                "Base batch count must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Set the duration ceiling
    pub fn with_max_duration(mut self, duration: Duration) -> Self {
        self.max_duration = duration;
        self
    }

    /// Set the sampling cadence
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    /// Set the hash iteration base
    pub fn with_base_iterations(mut self, iterations: u64) -> Self {
        self.base_iterations = iterations;
        self
    }

    /// Set the matrix dimension base
    pub fn with_base_matrix_size(mut self, size: u32) -> Self {
        self.base_matrix_size = size;
        self
    }

    /// Set the batch count base
    pub fn with_base_batch_count(mut self, count: u32) -> Self {
        self.base_batch_count = count;
        self
    }

    /// Get the standard configuration file path
    /// Uses $CONFIG_HOME/stressbench/stressbench.toml
    pub fn config_file_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            StressError::ConfigError("Unable to determine config directory".to_string())
        })?;

        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Load configuration from the standard path, falling back to defaults
    /// when no file exists
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            StressError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: EngineConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the standard path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StressError::ConfigError(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| {
            StressError::ConfigError(format!(
                "Failed to write config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_params_for_level_10() {
        let params = WorkloadParams::from_level(10);
        assert_eq!(params.duration, Duration::from_secs(60));
        assert_eq!(params.iterations_per_core, 50_000);
        assert_eq!(params.matrix_size, 102);
        assert_eq!(params.batch_count, 1);
    }

    #[test]
    fn test_params_for_level_100() {
        let params = WorkloadParams::from_level(100);
        assert_eq!(params.duration, Duration::from_secs(600));
        assert_eq!(params.iterations_per_core, 500_000);
        assert_eq!(params.matrix_size, 1024);
        assert_eq!(params.batch_count, 10);
    }

    #[test]
    fn test_params_monotonic_in_level() {
        let config = EngineConfig::default();
        let levels: Vec<u32> = (1..=10).map(|step| step * 10).collect();

        for pair in levels.windows(2) {
            let low = config.params_for(pair[0]);
            let high = config.params_for(pair[1]);
            assert!(low.duration <= high.duration);
            assert!(low.iterations_per_core <= high.iterations_per_core);
            assert!(low.matrix_size <= high.matrix_size);
            assert!(low.batch_count <= high.batch_count);
        }
    }

    #[test]
    fn test_params_idempotent() {
        let config = EngineConfig::default();
        for level in (10..=100).step_by(10) {
            assert_eq!(config.params_for(level), config.params_for(level));
        }
    }

    #[test]
    fn test_validate_rejects_zero_duration() {
        let config = EngineConfig::default().with_max_duration(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = EngineConfig::default().with_sample_interval(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_interval_above_ceiling() {
        let config = EngineConfig::default()
            .with_max_duration(Duration::from_secs(1))
            .with_sample_interval(Duration::from_secs(2));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_matrix_size() {
        let config = EngineConfig::default().with_base_matrix_size(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_matrix() {
        let config = EngineConfig::default().with_base_matrix_size(16384);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("stressbench.toml");

        let config = EngineConfig::default()
            .with_max_duration(Duration::from_secs(120))
            .with_sample_interval(Duration::from_secs(1))
            .with_base_iterations(1_000);
        config.save_to(&path).expect("save config");

        let loaded = EngineConfig::load_from(&path).expect("load config");
        assert_eq!(loaded.max_duration, Duration::from_secs(120));
        assert_eq!(loaded.sample_interval, Duration::from_secs(1));
        assert_eq!(loaded.base_iterations, 1_000);
    }

    #[test]
    fn test_load_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing.toml");

        let loaded = EngineConfig::load_from(&path).expect("load config");
        assert_eq!(loaded.max_duration, Duration::from_secs(600));
    }

    #[test]
    fn test_stress_kind_description() {
        assert_eq!(StressKind::Cpu.description(), "CPU");
        assert_eq!(StressKind::Gpu.description(), "GPU");
    }
}
