//! Asynchronous rollout steps on the GPU backend.
//!
//! A rollout step moves a training loop's inputs into the simulator,
//! steps every world and moves the outputs back out, all recorded into
//! one command buffer on the caller's stream. Nothing blocks the host;
//! the caller synchronizes the stream before reading the outputs.

use crate::backend::Backend;
use crate::error::RolloutError;
use crate::manager::Manager;
use crate::registry::ExportSpec;
use crate::train::TrainInterface;
use mazerun_exec::{GpuExecutor, GpuStream};
use smallvec::SmallVec;

impl Manager {
    /// A new stream on the manager's device.
    ///
    /// # Errors
    ///
    /// Returns [`RolloutError::NotGpu`] on the CPU backend.
    pub fn create_stream(&self) -> Result<GpuStream, RolloutError> {
        Ok(GpuStream::new(self.gpu_executor()?.context()))
    }

    /// Allocate one device buffer per tensor of
    /// [`train_interface`](Self::train_interface), in rollout order,
    /// each sized to its tensor.
    ///
    /// # Errors
    ///
    /// Returns [`RolloutError::NotGpu`] on the CPU backend.
    pub fn create_rollout_buffers(&self) -> Result<Vec<wgpu::Buffer>, RolloutError> {
        let exec = self.gpu_executor()?;
        let iface = self.train_interface();
        let device = exec.context().device();
        Ok(iface
            .rollout_order()
            .map(|spec| {
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&format!("mazerun_rollout_{}", spec.name())),
                    size: spec.num_bytes(),
                    usage: wgpu::BufferUsages::STORAGE
                        | wgpu::BufferUsages::COPY_SRC
                        | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                })
            })
            .collect())
    }

    /// One rollout step over this manager's own
    /// [`train_interface`](Self::train_interface).
    ///
    /// # Errors
    ///
    /// See [`gpu_rollout`](Self::gpu_rollout).
    pub fn gpu_rollout_step(
        &self,
        stream: &mut GpuStream,
        buffers: &[wgpu::Buffer],
    ) -> Result<(), RolloutError> {
        let iface = self.train_interface();
        self.gpu_rollout(stream, buffers, &iface)
    }

    /// Record and submit one rollout step on `stream`.
    ///
    /// `buffers` holds one external buffer per tensor of `iface`, in
    /// [`rollout_order`](TrainInterface::rollout_order). In order, the
    /// step copies actions and resets in, steps every world, then copies
    /// rewards, dones, the policy assignment if present, every
    /// observation and every statistic out. Each copy moves the full
    /// declared size of its tensor.
    ///
    /// # Errors
    ///
    /// Returns [`RolloutError::NotGpu`] on the CPU backend, or a buffer
    /// error if `buffers` does not match `iface`. Nothing is submitted
    /// when an error is returned.
    pub fn gpu_rollout(
        &self,
        stream: &mut GpuStream,
        buffers: &[wgpu::Buffer],
        iface: &TrainInterface,
    ) -> Result<(), RolloutError> {
        let exec = self.gpu_executor()?;
        let specs: SmallVec<[&ExportSpec; 16]> = iface.rollout_order().collect();
        check_buffers(&specs, buffers)?;

        let (inputs, outputs) = specs.split_at(2);
        let (in_bufs, out_bufs) = buffers.split_at(2);
        let mut encoder = stream.encoder("mazerun_rollout");
        for (spec, src) in inputs.iter().zip(in_bufs) {
            let dst = exec.exported_buffer(spec.id.slot());
            encoder.copy_buffer_to_buffer(src, 0, dst, 0, spec.num_bytes());
        }
        exec.encode_step(&mut encoder);
        for (spec, dst) in outputs.iter().zip(out_bufs) {
            let src = exec.exported_buffer(spec.id.slot());
            encoder.copy_buffer_to_buffer(src, 0, dst, 0, spec.num_bytes());
        }
        stream.submit(encoder.finish());
        Ok(())
    }

    fn gpu_executor(&self) -> Result<&GpuExecutor, RolloutError> {
        match &self.backend {
            Backend::Gpu(exec) => Ok(exec),
            Backend::Cpu(_) => Err(RolloutError::NotGpu),
        }
    }
}

fn check_buffers(specs: &[&ExportSpec], buffers: &[wgpu::Buffer]) -> Result<(), RolloutError> {
    if buffers.len() != specs.len() {
        return Err(RolloutError::BufferCount {
            expected: specs.len(),
            got: buffers.len(),
        });
    }
    for (spec, buf) in specs.iter().zip(buffers) {
        if buf.size() < spec.num_bytes() {
            return Err(RolloutError::BufferTooSmall {
                name: spec.name().to_owned(),
                needed: spec.num_bytes(),
                got: buf.size(),
            });
        }
    }
    Ok(())
}
