//! Monitoring sampler module
//!
//! Implements the concurrent sampling loop that polls the telemetry
//! estimator at a fixed cadence while a workload driver runs, with
//! cooperative cancellation and a join that guarantees the caller sees
//! exactly the samples collected before the stop took effect.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};

use crate::models::{PowerSample, ThermalSample};
use crate::telemetry::TelemetryEstimator;
use crate::{Result, StressError};

/// Handle to a running monitoring sampler
///
/// The sampler task exclusively owns the growing sample buffers; ownership
/// transfers to the caller when [`MonitorHandle::stop`] joins the task.
#[derive(Debug)]
pub struct MonitorHandle {
    cancel_tx: oneshot::Sender<()>,
    task: JoinHandle<(Vec<PowerSample>, Vec<ThermalSample>)>,
}

impl MonitorHandle {
    /// Whether the sampling loop has already exited on its own
    /// (duration ceiling reached)
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Request cooperative cancellation and wait for the loop to quiesce
    ///
    /// The loop observes the cancellation at its next wake-up, at most one
    /// cadence interval after this call, and appends nothing for a wake-up
    /// that was cancelled mid-suspension. Returns only after the task has
    /// fully exited, so no sample is appended after `stop` returns.
    pub async fn stop(self) -> Result<(Vec<PowerSample>, Vec<ThermalSample>)> {
        // The loop may have exited already; a failed send is fine.
        let _ = self.cancel_tx.send(());
        self.task
            .await
            .map_err(|e| StressError::MonitorError(format!("Sampler task failed: {}", e)))
    }
}

/// Spawn the monitoring sampler
///
/// The loop checks elapsed time against `ceiling` before every tick, polls
/// the estimator, appends one power and one thermal sample sharing the same
/// `time` value, then suspends for `interval` or until cancelled. A failed
/// telemetry read skips the tick; the sampler never fails the overall test.
pub fn spawn_monitor(
    mut estimator: TelemetryEstimator,
    ceiling: Duration,
    interval: Duration,
) -> MonitorHandle {
    let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let start = Instant::now();
        let mut power_series: Vec<PowerSample> = Vec::new();
        let mut thermal_series: Vec<ThermalSample> = Vec::new();

        loop {
            let elapsed = start.elapsed();
            if elapsed >= ceiling {
                break;
            }

            match estimator.sample() {
                Ok(reading) => {
                    let time = elapsed.as_secs_f64();
                    power_series.push(PowerSample {
                        time,
                        power: reading.power_watts,
                    });
                    thermal_series.push(ThermalSample {
                        time,
                        temperature: reading.temperature_celsius,
                    });
                }
                Err(err) => {
                    log::warn!("telemetry read failed, skipping tick: {}", err);
                }
            }

            tokio::select! {
                biased;
                _ = &mut cancel_rx => break,
                _ = sleep(interval) => {}
            }
        }

        (power_series, thermal_series)
    });

    MonitorHandle { cancel_tx, task }
}
