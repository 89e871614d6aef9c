//! Stress test result data models
//!
//! Contains structures for the timestamped power/thermal sample series and
//! the completed test result handed back to the caller.

use crate::config::StressKind;
use crate::util::units::format_duration;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One estimated power draw reading
///
/// `time` is seconds since the test started; samples within a series are
/// ordered by non-decreasing `time`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerSample {
    /// Seconds since test start
    pub time: f64,
    /// Estimated power draw in watts
    pub power: f64,
}

/// One estimated temperature reading
///
/// Produced pairwise with [`PowerSample`] at the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermalSample {
    /// Seconds since test start
    pub time: f64,
    /// Estimated temperature in degrees Celsius
    pub temperature: f64,
}

/// Complete result of one stress test run
///
/// Owned exclusively by the caller once the engine returns; the engine keeps
/// no reference to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    /// Timestamp when the test was executed
    pub timestamp: DateTime<Utc>,
    /// Which workload was driven
    pub kind: StressKind,
    /// Stress level the test was run at
    pub level: u32,
    /// Total elapsed wall-clock time
    #[serde(with = "duration_serde")]
    pub elapsed: Duration,
    /// Power samples collected by the monitor, ordered by time
    pub power_series: Vec<PowerSample>,
    /// Thermal samples collected by the monitor, ordered by time
    pub thermal_series: Vec<ThermalSample>,
}

impl TestResult {
    /// Create a new test result
    pub fn new(
        kind: StressKind,
        level: u32,
        elapsed: Duration,
        power_series: Vec<PowerSample>,
        thermal_series: Vec<ThermalSample>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            level,
            elapsed,
            power_series,
            thermal_series,
        }
    }

    /// Create the zero-duration, empty-series result that signals a test
    /// which could not run (e.g. no compute-capable GPU)
    pub fn empty(kind: StressKind, level: u32) -> Self {
        Self::new(kind, level, Duration::ZERO, Vec::new(), Vec::new())
    }

    /// Whether this result signals a test that did not run
    pub fn is_empty(&self) -> bool {
        self.elapsed.is_zero() && self.power_series.is_empty() && self.thermal_series.is_empty()
    }

    /// Get a human-readable summary of the test result
    pub fn summary(&self) -> String {
        if self.is_empty() {
            return format!("{} test at level {}: did not run", self.kind.description(), self.level);
        }
        format!(
            "{} test at level {}: {} ({} samples)",
            self.kind.description(),
            self.level,
            format_duration(self.elapsed),
            self.power_series.len()
        )
    }

    /// Serialize the result for handoff to a presentation layer
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// Custom serde module for Duration serialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_nanos().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let nanos = u128::deserialize(deserializer)?;
        Ok(Duration::from_nanos(nanos as u64))
    }
}
