//! The closed set of executors a manager can drive.

use crate::config::ExecMode;
use mazerun_core::ElementType;
use mazerun_exec::{ExecError, ExecutionBackend, TaskGraphExecutor, Tensor};
use mazerun_sim::Sim;

#[cfg(feature = "gpu")]
use mazerun_exec::GpuExecutor;

/// An executor selected once at construction.
pub enum Backend {
    /// Worlds in host memory on a worker pool.
    Cpu(TaskGraphExecutor<Sim>),
    /// Worlds in device memory.
    #[cfg(feature = "gpu")]
    Gpu(GpuExecutor),
}

impl Backend {
    /// Which variant this is.
    pub fn mode(&self) -> ExecMode {
        match self {
            Backend::Cpu(_) => ExecMode::Cpu,
            #[cfg(feature = "gpu")]
            Backend::Gpu(_) => ExecMode::Gpu,
        }
    }

    fn inner(&self) -> &dyn ExecutionBackend {
        match self {
            Backend::Cpu(exec) => exec,
            #[cfg(feature = "gpu")]
            Backend::Gpu(exec) => exec,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ExecutionBackend {
        match self {
            Backend::Cpu(exec) => exec,
            #[cfg(feature = "gpu")]
            Backend::Gpu(exec) => exec,
        }
    }
}

impl ExecutionBackend for Backend {
    fn num_worlds(&self) -> u32 {
        self.inner().num_worlds()
    }

    fn run(&mut self) -> Result<(), ExecError> {
        self.inner_mut().run()
    }

    fn export_tensor(&self, slot: u32, dtype: ElementType, dims: &[i64]) -> Tensor<'_> {
        self.inner().export_tensor(slot, dtype, dims)
    }

    fn write_exported(&mut self, slot: u32, byte_offset: usize, bytes: &[u8]) {
        self.inner_mut().write_exported(slot, byte_offset, bytes)
    }
}
