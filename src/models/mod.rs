//! Data models module
//!
//! Contains the sample and result structures produced by a stress test run.

pub mod result;

// Re-export commonly used types
pub use result::{PowerSample, TestResult, ThermalSample};
