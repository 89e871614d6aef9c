//! Stress engine module
//!
//! Contains the workload drivers (CPU hashing, GPU matrix multiply) and the
//! test orchestrator that coordinates them with the monitoring sampler.

pub mod cpu;
pub mod engine;
pub mod gpu;

// Re-export commonly used types
pub use cpu::CpuStressDriver;
pub use engine::StressEngine;
pub use gpu::{GpuContext, GpuStressDriver};

use crate::models::TestResult;
use crate::Result;

/// Run a CPU stress test at the given level in [10, 100] using a default
/// engine
///
/// Long-running and blocking until complete; callers with a UI are expected
/// to off-load the call.
pub async fn run_cpu_stress_test(level: u32) -> Result<TestResult> {
    StressEngine::new()?.run_cpu_test(level).await
}

/// Run a GPU stress test at the given level in [10, 100] using a default
/// engine
///
/// Reports a zero-duration, empty-series result when no compute-capable GPU
/// is available.
pub async fn run_gpu_stress_test(level: u32) -> Result<TestResult> {
    StressEngine::new()?.run_gpu_test(level).await
}
