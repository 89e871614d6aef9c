//! CPU workload driver
//!
//! Saturates every available core with fixed-cost SHA-512 hashing for the
//! nominal test duration. The parallel phase fans one worker out per core;
//! a sequential tail keeps hashing until the wall clock catches up, since
//! hash throughput varies by core speed and the parallel phase alone does
//! not reliably consume the full duration.

use std::hint::black_box;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha512};
use tokio::task;

use crate::config::WorkloadParams;
use crate::{Result, StressError};

/// Constant input buffer hashed by every worker
const HASH_INPUT: &[u8] = b"ExtremeStressTestData";

/// Hashes per batch in the sequential tail loop
const TAIL_BATCH: u32 = 1000;

/// CPU stress driver executing one test run
#[derive(Debug, Clone)]
pub struct CpuStressDriver {
    params: WorkloadParams,
}

impl CpuStressDriver {
    /// Create a driver for the given workload parameters
    pub fn new(params: WorkloadParams) -> Self {
        Self { params }
    }

    /// Number of workers to fan out, defended against a zero report
    fn worker_count() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .max(1)
    }

    /// Run the workload to completion and return total elapsed wall-clock
    /// time
    ///
    /// Spawns one blocking worker per core, each hashing the constant input
    /// `iterations_per_core` times, joins them all, then busy-hashes in
    /// batches on the blocking pool until `duration` has elapsed. With
    /// `iterations_per_core = 0` the tail loop alone bounds the run.
    pub async fn run(&self) -> Result<Duration> {
        let start = Instant::now();
        let cores = Self::worker_count();
        let iterations = self.params.iterations_per_core;

        log::debug!("cpu driver: {} workers x {} iterations", cores, iterations);

        let mut workers = Vec::with_capacity(cores);
        for _ in 0..cores {
            workers.push(task::spawn_blocking(move || {
                for _ in 0..iterations {
                    black_box(Sha512::digest(HASH_INPUT));
                }
            }));
        }

        for worker in workers {
            worker
                .await
                .map_err(|e| StressError::WorkerError(format!("Hash worker failed: {}", e)))?;
        }

        // Sequential tail: dominant saturation mechanism at low levels.
        let duration = self.params.duration;
        task::spawn_blocking(move || {
            while start.elapsed() < duration {
                for _ in 0..TAIL_BATCH {
                    black_box(Sha512::digest(HASH_INPUT));
                }
            }
        })
        .await
        .map_err(|e| StressError::WorkerError(format!("Tail hash loop failed: {}", e)))?;

        Ok(start.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn tiny_params(duration_ms: u64, iterations: u64) -> WorkloadParams {
        let config = EngineConfig::default()
            .with_max_duration(Duration::from_millis(duration_ms))
            .with_sample_interval(Duration::from_millis(duration_ms.max(1)))
            .with_base_iterations(iterations);
        config.params_for(100)
    }

    #[test]
    fn test_worker_count_is_nonzero() {
        assert!(CpuStressDriver::worker_count() >= 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_run_covers_nominal_duration() {
        let driver = CpuStressDriver::new(tiny_params(200, 100));
        let elapsed = driver.run().await.expect("driver completes");
        assert!(elapsed >= Duration::from_millis(200));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_zero_iterations_still_bounded_by_tail() {
        let driver = CpuStressDriver::new(tiny_params(100, 0));
        let elapsed = driver.run().await.expect("driver completes");
        assert!(elapsed >= Duration::from_millis(100));
        // The tail loop exits promptly once the duration is reached.
        assert!(elapsed < Duration::from_secs(10));
    }
}
