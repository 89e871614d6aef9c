//! Telemetry estimation module
//!
//! Produces instantaneous (power, temperature) estimates for the monitoring
//! sampler. No portable, privilege-free API exists for instantaneous power
//! and temperature across all target platforms, so the estimator picks one
//! of two strategies at startup:
//!
//! - **ThermalZone**: on Linux hosts exposing a readable
//!   `/sys/class/thermal/thermal_zone*/temp` node, the reading is folded
//!   into a coarse four-state classification and each state maps to a fixed
//!   power/temperature pair.
//! - **DirectEstimate**: everywhere else, pseudo-random values drawn from
//!   bounded ranges keep the sampling cadence populated.
//!
//! Neither strategy claims measurement accuracy; the contract is bounded,
//! physically-plausible values on a steady cadence.

use std::fs;
use std::path::PathBuf;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::{Result, StressError};

/// Coarse thermal classification, ordinal-ranked coolest to hottest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ThermalState {
    Nominal,
    Fair,
    Serious,
    Critical,
}

impl ThermalState {
    /// Classify a temperature reading in degrees Celsius
    pub fn from_celsius(celsius: f64) -> Self {
        if celsius < 45.0 {
            ThermalState::Nominal
        } else if celsius < 60.0 {
            ThermalState::Fair
        } else if celsius < 75.0 {
            ThermalState::Serious
        } else {
            ThermalState::Critical
        }
    }

    /// Fixed power estimate for this state, in watts
    pub fn power_watts(&self) -> f64 {
        match self {
            ThermalState::Nominal => 5.0,
            ThermalState::Fair => 10.0,
            ThermalState::Serious => 15.0,
            ThermalState::Critical => 20.0,
        }
    }

    /// Fixed temperature estimate for this state, in degrees Celsius
    pub fn temperature_celsius(&self) -> f64 {
        match self {
            ThermalState::Nominal => 30.0,
            ThermalState::Fair => 50.0,
            ThermalState::Serious => 70.0,
            ThermalState::Critical => 85.0,
        }
    }
}

/// One instantaneous telemetry estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryReading {
    /// Estimated power draw in watts
    pub power_watts: f64,
    /// Estimated temperature in degrees Celsius
    pub temperature_celsius: f64,
}

/// Estimate source, selected once by a capability probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryStrategy {
    /// Bounded pseudo-random estimates
    DirectEstimate,
    /// Coarse classification of a sysfs thermal zone reading
    ThermalZone { path: PathBuf },
}

impl TelemetryStrategy {
    /// Probe platform capabilities and pick the best available strategy
    ///
    /// Intended to run once per engine, not per sample.
    pub fn detect() -> Self {
        if let Some(path) = Self::probe_thermal_zone() {
            log::info!("telemetry: using thermal zone {}", path.display());
            return TelemetryStrategy::ThermalZone { path };
        }
        log::info!("telemetry: no usable thermal sensor, using direct estimates");
        TelemetryStrategy::DirectEstimate
    }

    /// Find the first readable thermal zone temperature node
    fn probe_thermal_zone() -> Option<PathBuf> {
        // Zone numbering is not contiguous on all kernels; scan a small range.
        for zone in 0..8 {
            let path = PathBuf::from(format!("/sys/class/thermal/thermal_zone{}/temp", zone));
            if let Ok(content) = fs::read_to_string(&path) {
                if content.trim().parse::<i64>().is_ok() {
                    return Some(path);
                }
            }
        }
        None
    }
}

/// Telemetry estimator polled by the monitoring sampler
#[derive(Debug)]
pub struct TelemetryEstimator {
    strategy: TelemetryStrategy,
    rng: SmallRng,
}

impl TelemetryEstimator {
    /// Create an estimator using the given strategy
    pub fn new(strategy: TelemetryStrategy) -> Self {
        Self {
            strategy,
            rng: SmallRng::from_entropy(),
        }
    }

    /// Create an estimator, probing the platform for the best strategy
    pub fn detect() -> Self {
        Self::new(TelemetryStrategy::detect())
    }

    /// The strategy this estimator was built with
    pub fn strategy(&self) -> &TelemetryStrategy {
        &self.strategy
    }

    /// Produce one (power, temperature) estimate
    ///
    /// Reads system state but has no other side effects. A sysfs read or
    /// parse failure surfaces as [`StressError::TelemetryError`]; the
    /// sampler skips that tick rather than failing the test.
    pub fn sample(&mut self) -> Result<TelemetryReading> {
        match &self.strategy {
            TelemetryStrategy::DirectEstimate => Ok(TelemetryReading {
                power_watts: self.rng.gen_range(10.0..=40.0),
                temperature_celsius: self.rng.gen_range(30.0..=90.0),
            }),
            TelemetryStrategy::ThermalZone { path } => {
                let content = fs::read_to_string(path).map_err(|e| {
                    StressError::TelemetryError(format!(
                        "Failed to read thermal zone {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                let state = match content.trim().parse::<i64>() {
                    // Sysfs reports millidegrees Celsius.
                    Ok(milli) => ThermalState::from_celsius(milli as f64 / 1000.0),
                    // Unrecognized reading: fall back to the middle state.
                    Err(_) => ThermalState::Fair,
                };
                Ok(TelemetryReading {
                    power_watts: state.power_watts(),
                    temperature_celsius: state.temperature_celsius(),
                })
            }
        }
    }
}
