use super::context::GpuContext;
use crate::error::ExecError;

/// An ordered submission queue for asynchronous device work.
///
/// Command buffers submitted on a stream execute in submission order.
/// The stream remembers its latest submission so callers can block on
/// it with [`synchronize`](Self::synchronize).
#[derive(Debug)]
pub struct GpuStream {
    ctx: GpuContext,
    last: Option<wgpu::SubmissionIndex>,
}

impl GpuStream {
    /// A stream on `ctx`'s queue.
    pub fn new(ctx: &GpuContext) -> Self {
        Self {
            ctx: ctx.clone(),
            last: None,
        }
    }

    /// The device this stream submits to.
    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    /// A fresh command encoder on the stream's device.
    pub fn encoder(&self, label: &str) -> wgpu::CommandEncoder {
        self.ctx
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) })
    }

    /// Submit a command buffer without waiting for it.
    pub fn submit(&mut self, commands: wgpu::CommandBuffer) {
        self.last = Some(self.ctx.queue().submit(Some(commands)));
    }

    /// Whether no submission is outstanding.
    pub fn is_idle(&self) -> bool {
        self.last.is_none()
    }

    /// Block until every submission on this stream has finished.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Poll`] if waiting fails.
    pub fn synchronize(&mut self) -> Result<(), ExecError> {
        match self.last.take() {
            Some(idx) => self.ctx.wait(Some(idx)),
            None => Ok(()),
        }
    }
}
