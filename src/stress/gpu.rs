//! GPU workload driver
//!
//! Saturates the GPU by repeatedly dispatching a matrix-multiply compute
//! kernel sized by the workload parameters. Submission is synchronous: one
//! command buffer in flight, waited to completion before the next iteration,
//! which bounds memory growth and gives a well-defined iteration unit for
//! timing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tokio::task;
use wgpu::util::DeviceExt;

use crate::config::WorkloadParams;
use crate::{Result, StressError};

/// WGSL matrix-multiply kernel
///
/// Repeats the full multiply `batches` times per dispatch to amplify GPU
/// load per submission and amortize dispatch overhead. Accumulating across
/// batches into the output keeps the repeated work observable.
const MATMUL_SHADER: &str = r#"
struct MatmulParams {
    size: u32,
    batches: u32,
}

@group(0) @binding(0) var<storage, read> lhs: array<f32>;
@group(0) @binding(1) var<storage, read> rhs: array<f32>;
@group(0) @binding(2) var<storage, read_write> output: array<f32>;
@group(0) @binding(3) var<uniform> params: MatmulParams;

@compute @workgroup_size(16, 16)
fn main(@builtin(global_invocation_id) gid: vec3<u32>) {
    let n = params.size;
    if (gid.x >= n || gid.y >= n) {
        return;
    }
    var total: f32 = 0.0;
    for (var batch: u32 = 0u; batch < params.batches; batch = batch + 1u) {
        var acc: f32 = 0.0;
        for (var k: u32 = 0u; k < n; k = k + 1u) {
            acc = acc + lhs[gid.y * n + k] * rhs[k * n + gid.x];
        }
        total = total + acc;
    }
    output[gid.y * n + gid.x] = total;
}
"#;

/// Workgroup tile edge matching the kernel's @workgroup_size
const TILE: u32 = 16;

/// Kernel uniform block, padded to 16 bytes
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct MatmulParams {
    size: u32,
    batches: u32,
    _pad: [u32; 2],
}

/// Acquired compute device, queue and compiled kernel
///
/// Acquisition failing at any step is the "unsupported hardware" signal: the
/// orchestrator reports it as a zero-duration, empty-series result rather
/// than an error.
#[derive(Debug)]
pub struct GpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
}

impl GpuContext {
    /// Try to acquire a compute device, queue and matmul pipeline
    pub async fn acquire(backends: wgpu::Backends) -> Option<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .await?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("stressbench-gpu"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .ok()?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("matmul"),
            source: wgpu::ShaderSource::Wgsl(MATMUL_SHADER.into()),
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("matmul"),
            layout: None,
            module: &shader,
            entry_point: "main",
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        Some(Self {
            device,
            queue,
            pipeline,
        })
    }
}

/// GPU stress driver executing one test run
#[derive(Debug, Clone)]
pub struct GpuStressDriver {
    params: WorkloadParams,
}

impl GpuStressDriver {
    /// Create a driver for the given workload parameters
    pub fn new(params: WorkloadParams) -> Self {
        Self { params }
    }

    /// Run the workload to completion and return total elapsed wall-clock
    /// time
    ///
    /// The dispatch loop runs on the blocking pool since every iteration
    /// waits for device-side completion. A device error mid-loop aborts the
    /// loop early and returns the elapsed time accumulated so far; the
    /// samples the monitor collected up to that point stay valid.
    pub async fn run(self, ctx: GpuContext) -> Result<Duration> {
        task::spawn_blocking(move || Self::run_blocking(&ctx, &self.params))
            .await
            .map_err(|e| StressError::GpuError(format!("GPU dispatch task failed: {}", e)))
    }

    fn run_blocking(ctx: &GpuContext, params: &WorkloadParams) -> Duration {
        let start = Instant::now();
        let n = params.matrix_size as usize;
        if n == 0 {
            return start.elapsed();
        }

        // Device errors (buffer allocation, validation) surface through the
        // uncaptured-error handler; the loop checks the flag once per
        // iteration and aborts early, keeping the partial elapsed time.
        let failed = Arc::new(AtomicBool::new(false));
        let failed_flag = Arc::clone(&failed);
        ctx.device.on_uncaptured_error(Box::new(move |err| {
            log::warn!("gpu device error, aborting dispatch loop: {}", err);
            failed_flag.store(true, Ordering::SeqCst);
        }));

        let uniforms = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("matmul-params"),
                contents: bytemuck::bytes_of(&MatmulParams {
                    size: params.matrix_size,
                    batches: params.batch_count,
                    _pad: [0; 2],
                }),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let mut rng = SmallRng::from_entropy();
        let byte_len = (n * n * std::mem::size_of::<f32>()) as wgpu::BufferAddress;

        log::debug!(
            "gpu driver: {}x{} matrices, {} batches per dispatch",
            n,
            n,
            params.batch_count
        );

        while start.elapsed() < params.duration {
            let lhs: Vec<f32> = (0..n * n).map(|_| rng.gen_range(0.0..=1.0)).collect();
            let rhs: Vec<f32> = (0..n * n).map(|_| rng.gen_range(0.0..=1.0)).collect();

            let lhs_buffer = ctx
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("matmul-lhs"),
                    contents: bytemuck::cast_slice(&lhs),
                    usage: wgpu::BufferUsages::STORAGE,
                });
            let rhs_buffer = ctx
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("matmul-rhs"),
                    contents: bytemuck::cast_slice(&rhs),
                    usage: wgpu::BufferUsages::STORAGE,
                });
            // Zero-initialized output of the same shape.
            let output_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("matmul-output"),
                size: byte_len,
                usage: wgpu::BufferUsages::STORAGE,
                mapped_at_creation: false,
            });

            let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("matmul"),
                layout: &ctx.pipeline.get_bind_group_layout(0),
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: lhs_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: rhs_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: output_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: uniforms.as_entire_binding(),
                    },
                ],
            });

            let mut encoder = ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("matmul"),
                });
            {
                let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some("matmul"),
                    timestamp_writes: None,
                });
                pass.set_pipeline(&ctx.pipeline);
                pass.set_bind_group(0, &bind_group, &[]);
                let groups = (params.matrix_size + TILE - 1) / TILE;
                pass.dispatch_workgroups(groups, groups, 1);
            }

            // Single in-flight submission: wait for completion before the
            // next iteration.
            ctx.queue.submit(Some(encoder.finish()));
            let _ = ctx.device.poll(wgpu::Maintain::Wait);

            if failed.load(Ordering::SeqCst) {
                break;
            }
        }

        start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn tiny_params(duration_ms: u64, size: u32) -> WorkloadParams {
        let config = EngineConfig::default()
            .with_max_duration(Duration::from_millis(duration_ms))
            .with_sample_interval(Duration::from_millis(duration_ms.max(1)))
            .with_base_matrix_size(size)
            .with_base_batch_count(2);
        config.params_for(100)
    }

    #[tokio::test]
    async fn test_acquire_with_no_backends_fails_fast() {
        assert!(GpuContext::acquire(wgpu::Backends::empty()).await.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_dispatch_loop_covers_duration() {
        // Hardware-dependent: skip quietly on hosts without a compute device.
        let Some(ctx) = GpuContext::acquire(wgpu::Backends::PRIMARY).await else {
            return;
        };

        let driver = GpuStressDriver::new(tiny_params(100, 64));
        let elapsed = driver.run(ctx).await.expect("dispatch loop completes");
        assert!(elapsed >= Duration::from_millis(100));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_zero_matrix_size_returns_immediately() {
        let Some(ctx) = GpuContext::acquire(wgpu::Backends::PRIMARY).await else {
            return;
        };

        let mut params = tiny_params(5_000, 64);
        params.matrix_size = 0;
        let driver = GpuStressDriver::new(params);
        let elapsed = driver.run(ctx).await.expect("driver returns");
        assert!(elapsed < Duration::from_secs(1));
    }
}
