use super::context::GpuContext;
use super::stream::GpuStream;
use crate::backend::ExecutionBackend;
use crate::error::ExecError;
use crate::tensor::Tensor;
use mazerun_core::ElementType;
use tracing::debug;
use wgpu::util::DeviceExt;

/// A device buffer shared by every world.
#[derive(Clone, Copy, Debug)]
pub struct SharedBufferDesc<'a> {
    /// Debug label.
    pub label: &'a str,
    /// Initial contents; a multiple of four bytes.
    pub contents: &'a [u8],
    /// Whether the kernel binds it read-only.
    pub read_only: bool,
}

/// Kernel and buffer layout for a [`GpuExecutor`].
#[derive(Clone, Copy, Debug)]
pub struct GpuExecConfig<'a> {
    /// Number of worlds.
    pub num_worlds: u32,
    /// WGSL source of the kernel.
    pub kernel_source: &'a str,
    /// Entry point that constructs each world.
    pub init_entry: &'a str,
    /// Entry point that steps each world.
    pub step_entry: &'a str,
    /// Workgroup size declared by both entry points.
    pub workgroup_size: u32,
    /// Uniform parameter block; a nonzero multiple of 16 bytes.
    pub params: &'a [u8],
    /// Shared buffers, bound after the parameter block.
    pub shared: &'a [SharedBufferDesc<'a>],
    /// Bytes of per-world state.
    pub world_data_bytes: u64,
    /// Bytes per world of each export slot, in slot order.
    pub export_bytes: &'a [u64],
}

impl GpuExecConfig<'_> {
    /// Storage bindings the kernel uses.
    pub fn num_storage_buffers(&self) -> u32 {
        (self.shared.len() + 1 + self.export_bytes.len()) as u32
    }

    /// Check that the device can bind every buffer this layout allocates.
    /// The error names the first limit exceeded.
    pub fn check_limits(&self, limits: &wgpu::Limits) -> Result<(), String> {
        if limits.max_storage_buffers_per_shader_stage < self.num_storage_buffers() {
            return Err(format!(
                "device opened with {} storage buffers per stage, kernel needs {}",
                limits.max_storage_buffers_per_shader_stage,
                self.num_storage_buffers()
            ));
        }
        let n = u64::from(self.num_worlds);
        let max_binding = u64::from(limits.max_storage_buffer_binding_size);
        let sizes = std::iter::once(("world state", self.world_data_bytes))
            .chain(self.export_bytes.iter().map(|&b| ("export slot", b)));
        for (what, per_world) in sizes {
            let size = n.saturating_mul(per_world);
            if size > limits.max_buffer_size || size > max_binding {
                return Err(format!(
                    "{what} needs {size} bytes for {} worlds, device binds at most {} \
                     (max buffer {})",
                    self.num_worlds, max_binding, limits.max_buffer_size
                ));
            }
        }
        if let Some(s) = self
            .shared
            .iter()
            .find(|s| s.contents.len() as u64 > max_binding)
        {
            return Err(format!(
                "shared buffer '{}' is {} bytes, device binds at most {max_binding}",
                s.label,
                s.contents.len()
            ));
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ExecError> {
        if self.num_worlds == 0 {
            return Err(ExecError::NoWorlds);
        }
        if self.workgroup_size == 0 {
            return Err(ExecError::KernelConfig("workgroup size must be nonzero".into()));
        }
        if self.params.is_empty() || self.params.len() % 16 != 0 {
            return Err(ExecError::KernelConfig(format!(
                "parameter block is {} bytes, must be a nonzero multiple of 16",
                self.params.len()
            )));
        }
        if let Some(s) = self
            .shared
            .iter()
            .find(|s| s.contents.is_empty() || s.contents.len() % 4 != 0)
        {
            return Err(ExecError::KernelConfig(format!(
                "shared buffer '{}' is {} bytes, must be a nonzero multiple of 4",
                s.label,
                s.contents.len()
            )));
        }
        let bad_size = |b: u64| b == 0 || b % 4 != 0;
        if bad_size(self.world_data_bytes) {
            return Err(ExecError::KernelConfig(format!(
                "world state is {} bytes, must be a nonzero multiple of 4",
                self.world_data_bytes
            )));
        }
        if let Some((slot, b)) = self
            .export_bytes
            .iter()
            .enumerate()
            .find(|(_, b)| bad_size(**b))
        {
            return Err(ExecError::KernelConfig(format!(
                "export slot {slot} is {b} bytes per world, must be a nonzero multiple of 4"
            )));
        }
        Ok(())
    }
}

/// Steps a batch of worlds with a WGSL compute kernel.
///
/// World state and every export slot live in device storage buffers.
/// Exported tensors alias those buffers directly.
pub struct GpuExecutor {
    ctx: GpuContext,
    num_worlds: u32,
    workgroups: u32,
    shared: Vec<wgpu::Buffer>,
    exports: Vec<wgpu::Buffer>,
    export_sizes: Vec<u64>,
    bind_group: wgpu::BindGroup,
    step_pipeline: wgpu::ComputePipeline,
}

impl GpuExecutor {
    /// Compile the kernel, allocate every buffer, and run the init entry
    /// point once per world.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::KernelConfig`] for an inconsistent layout,
    /// [`ExecError::UnsupportedDevice`] if the device cannot bind every
    /// buffer, or [`ExecError::Poll`] if initialization fails to finish.
    pub fn new(ctx: GpuContext, cfg: &GpuExecConfig<'_>) -> Result<Self, ExecError> {
        cfg.validate()?;
        let device = ctx.device();
        let limits = device.limits();
        cfg.check_limits(&limits)
            .map_err(|reason| ExecError::UnsupportedDevice {
                adapter: ctx.adapter_name().to_owned(),
                reason,
            })?;
        let n = u64::from(cfg.num_worlds);

        let params = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mazerun_params"),
            contents: cfg.params,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let storage =
            wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST;
        let shared: Vec<_> = cfg
            .shared
            .iter()
            .map(|s| {
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(s.label),
                    contents: s.contents,
                    usage: storage,
                })
            })
            .collect();
        let world_data = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("mazerun_world_data"),
            size: n * cfg.world_data_bytes,
            usage: storage,
            mapped_at_creation: false,
        });
        let export_sizes: Vec<u64> = cfg.export_bytes.iter().map(|b| n * b).collect();
        let exports: Vec<_> = export_sizes
            .iter()
            .enumerate()
            .map(|(slot, &size)| {
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&format!("mazerun_export_{slot}")),
                    size,
                    usage: storage,
                    mapped_at_creation: false,
                })
            })
            .collect();

        // ── Layout ──────────────────────────────────────────────
        let buffer_entry = |binding: u32, ty: wgpu::BufferBindingType| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let mut layout_entries = vec![buffer_entry(0, wgpu::BufferBindingType::Uniform)];
        let mut binding = 1;
        for s in cfg.shared {
            layout_entries.push(buffer_entry(
                binding,
                wgpu::BufferBindingType::Storage {
                    read_only: s.read_only,
                },
            ));
            binding += 1;
        }
        for _ in 0..1 + exports.len() {
            layout_entries.push(buffer_entry(
                binding,
                wgpu::BufferBindingType::Storage { read_only: false },
            ));
            binding += 1;
        }
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("mazerun_bgl"),
            entries: &layout_entries,
        });

        let group_buffers = std::iter::once(&params)
            .chain(shared.iter())
            .chain(std::iter::once(&world_data))
            .chain(exports.iter());
        let group_entries: Vec<_> = group_buffers
            .enumerate()
            .map(|(i, buffer)| wgpu::BindGroupEntry {
                binding: i as u32,
                resource: buffer.as_entire_binding(),
            })
            .collect();
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("mazerun_bind_group"),
            layout: &bind_group_layout,
            entries: &group_entries,
        });

        // ── Pipelines ───────────────────────────────────────────
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mazerun_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mazerun_kernel"),
            source: wgpu::ShaderSource::Wgsl(cfg.kernel_source.into()),
        });
        let pipeline = |entry: &str| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(entry),
                layout: Some(&pipeline_layout),
                module: &module,
                entry_point: Some(entry),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                cache: None,
            })
        };
        let init_pipeline = pipeline(cfg.init_entry);
        let step_pipeline = pipeline(cfg.step_entry);

        let workgroups = cfg.num_worlds.div_ceil(cfg.workgroup_size);
        debug!(
            worlds = cfg.num_worlds,
            workgroups,
            bindings = group_entries.len(),
            "built GPU executor"
        );

        let exec = Self {
            ctx,
            num_worlds: cfg.num_worlds,
            workgroups,
            shared,
            exports,
            export_sizes,
            bind_group,
            step_pipeline,
        };

        let mut encoder = exec.encoder("mazerun_init");
        exec.encode_pipeline(&mut encoder, &init_pipeline, "init_worlds");
        let submission = exec.ctx.queue().submit(Some(encoder.finish()));
        exec.ctx.wait(Some(submission))?;
        Ok(exec)
    }

    /// The device this executor runs on.
    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    /// Record one step of every world into `encoder`.
    pub fn encode_step(&self, encoder: &mut wgpu::CommandEncoder) {
        self.encode_pipeline(encoder, &self.step_pipeline, "step_worlds");
    }

    /// Submit one step on `stream` without waiting for it.
    pub fn run_async(&self, stream: &mut GpuStream) {
        let mut encoder = stream.encoder("mazerun_step");
        self.encode_step(&mut encoder);
        stream.submit(encoder.finish());
    }

    /// Device buffer backing export slot `slot`.
    pub fn exported_buffer(&self, slot: u32) -> &wgpu::Buffer {
        &self.exports[slot as usize]
    }

    /// Total bytes of export slot `slot`.
    pub fn export_size(&self, slot: u32) -> u64 {
        self.export_sizes[slot as usize]
    }

    /// Read shared buffer `idx` back to the host.
    ///
    /// # Errors
    ///
    /// Returns a readback error if the buffer cannot be mapped.
    pub fn read_shared(&self, idx: usize) -> Result<Vec<u8>, ExecError> {
        let buffer = &self.shared[idx];
        self.ctx.read_buffer(buffer, buffer.size())
    }

    fn encoder(&self, label: &str) -> wgpu::CommandEncoder {
        self.ctx
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) })
    }

    fn encode_pipeline(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pipeline: &wgpu::ComputePipeline,
        label: &str,
    ) {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some(label),
            timestamp_writes: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.dispatch_workgroups(self.workgroups, 1, 1);
    }
}

impl ExecutionBackend for GpuExecutor {
    fn num_worlds(&self) -> u32 {
        self.num_worlds
    }

    fn run(&mut self) -> Result<(), ExecError> {
        let mut encoder = self.encoder("mazerun_step");
        self.encode_step(&mut encoder);
        let submission = self.ctx.queue().submit(Some(encoder.finish()));
        self.ctx.wait(Some(submission))
    }

    fn export_tensor(&self, slot: u32, dtype: ElementType, dims: &[i64]) -> Tensor<'_> {
        Tensor::device(self.exported_buffer(slot), &self.ctx, dtype, dims)
    }

    fn write_exported(&mut self, slot: u32, byte_offset: usize, bytes: &[u8]) {
        self.ctx
            .queue()
            .write_buffer(self.exported_buffer(slot), byte_offset as u64, bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: [u8; 16] = [0; 16];
    const EXPORTS: [u64; 2] = [8, 1024];

    fn layout(num_worlds: u32) -> GpuExecConfig<'static> {
        GpuExecConfig {
            num_worlds,
            kernel_source: "",
            init_entry: "init",
            step_entry: "step",
            workgroup_size: 64,
            params: &PARAMS,
            shared: &[],
            world_data_bytes: 1200,
            export_bytes: &EXPORTS,
        }
    }

    fn limits(max_binding: u32) -> wgpu::Limits {
        wgpu::Limits {
            max_storage_buffers_per_shader_stage: 8,
            max_storage_buffer_binding_size: max_binding,
            max_buffer_size: 1 << 30,
            ..wgpu::Limits::default()
        }
    }

    #[test]
    fn small_batch_fits() {
        assert_eq!(layout(64).check_limits(&limits(1 << 20)), Ok(()));
    }

    #[test]
    fn oversized_world_state_is_rejected() {
        // 1000 worlds of 1200 bytes exceed a 1 MiB binding.
        let err = layout(1000).check_limits(&limits(1 << 20)).unwrap_err();
        assert!(err.contains("world state"), "{err}");
        assert!(err.contains("1200000"), "{err}");
    }

    #[test]
    fn oversized_export_is_rejected() {
        let cfg = GpuExecConfig {
            world_data_bytes: 4,
            ..layout(2048)
        };
        let err = cfg.check_limits(&limits(1 << 20)).unwrap_err();
        assert!(err.contains("export slot"), "{err}");
    }

    #[test]
    fn max_buffer_size_applies_too() {
        let tight = wgpu::Limits {
            max_buffer_size: 1024,
            ..limits(1 << 20)
        };
        assert!(layout(2).check_limits(&tight).is_err());
    }

    #[test]
    fn storage_buffer_count_is_checked() {
        let few = wgpu::Limits {
            max_storage_buffers_per_shader_stage: 2,
            ..limits(1 << 20)
        };
        let err = layout(1).check_limits(&few).unwrap_err();
        assert!(err.contains("storage buffers"), "{err}");
    }
}
