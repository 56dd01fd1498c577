//! Adapter selection, device creation and buffer readback.

use crate::error::ExecError;
use tracing::info;

/// A logical device and its queue, selected by adapter index.
#[derive(Clone, Debug)]
pub struct GpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    gpu_id: u32,
    adapter_name: String,
}

impl GpuContext {
    /// Open adapter `gpu_id`, requiring at least `min_storage_buffers`
    /// storage bindings per shader stage.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::NoAdapter`] if the index is out of range,
    /// [`ExecError::UnsupportedDevice`] if the adapter is too limited,
    /// and [`ExecError::RequestDevice`] if device creation fails.
    pub fn new(gpu_id: u32, min_storage_buffers: u32) -> Result<Self, ExecError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapters = instance.enumerate_adapters(wgpu::Backends::all());
        let available = adapters.len();
        let adapter = adapters
            .into_iter()
            .nth(gpu_id as usize)
            .ok_or(ExecError::NoAdapter { gpu_id, available })?;

        let adapter_info = adapter.get_info();
        let adapter_limits = adapter.limits();
        if adapter_limits.max_storage_buffers_per_shader_stage < min_storage_buffers {
            return Err(ExecError::UnsupportedDevice {
                adapter: adapter_info.name,
                reason: format!(
                    "{} storage buffers per stage, kernel needs {}",
                    adapter_limits.max_storage_buffers_per_shader_stage, min_storage_buffers
                ),
            });
        }

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("mazerun_device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits {
                max_storage_buffers_per_shader_stage: min_storage_buffers,
                max_storage_buffer_binding_size: adapter_limits.max_storage_buffer_binding_size,
                max_buffer_size: adapter_limits.max_buffer_size,
                ..Default::default()
            },
            experimental_features: wgpu::ExperimentalFeatures::default(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| ExecError::RequestDevice(e.to_string()))?;

        info!(
            gpu_id,
            adapter = %adapter_info.name,
            backend = ?adapter_info.backend,
            "opened GPU device"
        );

        Ok(Self {
            device,
            queue,
            gpu_id,
            adapter_name: adapter_info.name,
        })
    }

    /// The logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// The device's queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Adapter index this context was opened on.
    pub fn gpu_id(&self) -> u32 {
        self.gpu_id
    }

    /// Human-readable adapter name.
    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    /// Block until `submission` (or all work, for `None`) has finished.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Poll`] if the device is lost or times out.
    pub fn wait(&self, submission: Option<wgpu::SubmissionIndex>) -> Result<(), ExecError> {
        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: submission,
                timeout: None,
            })
            .map(|_| ())
            .map_err(|e| ExecError::Poll(format!("{e:?}")))
    }

    /// Copy the first `size` bytes of `buffer` back to the host.
    ///
    /// Blocks until every previously submitted command has finished.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Readback`] if the staging buffer cannot be
    /// mapped, or [`ExecError::Poll`] if waiting fails.
    pub fn read_buffer(&self, buffer: &wgpu::Buffer, size: u64) -> Result<Vec<u8>, ExecError> {
        let padded = size.div_ceil(wgpu::COPY_BUFFER_ALIGNMENT) * wgpu::COPY_BUFFER_ALIGNMENT;
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("mazerun_readback"),
            size: padded,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("mazerun_readback_encoder"),
            });
        encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, padded);
        let submission = self.queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = crossbeam_channel::bounded(1);
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.wait(Some(submission))?;

        rx.recv()
            .map_err(|e| ExecError::Readback(e.to_string()))?
            .map_err(|e| ExecError::Readback(e.to_string()))?;

        let bytes = slice.get_mapped_range()[..size as usize].to_vec();
        staging.unmap();
        Ok(bytes)
    }
}
