//! Zero-copy views of exported buffers.

use crate::error::ExecError;
use bytemuck::Pod;
use mazerun_core::ElementType;
use smallvec::SmallVec;

#[cfg(feature = "gpu")]
use crate::gpu::GpuContext;

/// Where a tensor's bytes live.
#[derive(Clone, Copy, Debug)]
pub enum TensorData<'a> {
    /// Host memory owned by a CPU executor.
    Host(&'a [u8]),
    /// A device buffer owned by a GPU executor.
    #[cfg(feature = "gpu")]
    Device {
        /// The exported buffer.
        buffer: &'a wgpu::Buffer,
        /// Device owning the buffer.
        ctx: &'a GpuContext,
    },
}

/// Typed, shaped view of an exported buffer.
///
/// A tensor never owns its data. It borrows the executor that produced
/// it, so the borrow checker prevents stepping while a view is alive.
#[derive(Clone, Debug)]
pub struct Tensor<'a> {
    data: TensorData<'a>,
    dtype: ElementType,
    dims: SmallVec<[i64; 4]>,
}

impl<'a> Tensor<'a> {
    /// View host bytes.
    pub fn host(bytes: &'a [u8], dtype: ElementType, dims: &[i64]) -> Self {
        let t = Self {
            data: TensorData::Host(bytes),
            dtype,
            dims: SmallVec::from_slice(dims),
        };
        debug_assert!(
            t.num_bytes() <= bytes.len(),
            "tensor {:?} {} needs {} bytes, buffer holds {}",
            t.dims,
            dtype,
            t.num_bytes(),
            bytes.len()
        );
        t
    }

    /// View a device buffer.
    #[cfg(feature = "gpu")]
    pub fn device(
        buffer: &'a wgpu::Buffer,
        ctx: &'a GpuContext,
        dtype: ElementType,
        dims: &[i64],
    ) -> Self {
        Self {
            data: TensorData::Device { buffer, ctx },
            dtype,
            dims: SmallVec::from_slice(dims),
        }
    }

    /// Element type.
    pub fn dtype(&self) -> ElementType {
        self.dtype
    }

    /// Shape, outermost dimension first.
    pub fn dims(&self) -> &[i64] {
        &self.dims
    }

    /// Product of the dimensions.
    pub fn num_elements(&self) -> usize {
        self.dims.iter().map(|&d| d.max(0) as usize).product()
    }

    /// Size of the viewed data in bytes.
    pub fn num_bytes(&self) -> usize {
        self.num_elements() * self.dtype.size_of()
    }

    /// Where the bytes live.
    pub fn data(&self) -> TensorData<'a> {
        self.data
    }

    /// Whether the data is in device memory.
    pub fn is_on_gpu(&self) -> bool {
        !matches!(self.data, TensorData::Host(_))
    }

    /// Index of the device holding the data, or `None` for host data.
    pub fn gpu_id(&self) -> Option<u32> {
        match self.data {
            TensorData::Host(_) => None,
            #[cfg(feature = "gpu")]
            TensorData::Device { ctx, .. } => Some(ctx.gpu_id()),
        }
    }

    /// Host bytes, exactly [`num_bytes`](Self::num_bytes) long.
    pub fn host_bytes(&self) -> Option<&'a [u8]> {
        match self.data {
            TensorData::Host(bytes) => Some(&bytes[..self.num_bytes()]),
            #[cfg(feature = "gpu")]
            TensorData::Device { .. } => None,
        }
    }

    /// Host data reinterpreted as a slice of `T`.
    ///
    /// Returns `None` for device data or if the bytes are not a whole
    /// number of suitably aligned `T`.
    pub fn host_slice<T: Pod>(&self) -> Option<&'a [T]> {
        self.host_bytes()
            .and_then(|b| bytemuck::try_cast_slice(b).ok())
    }

    /// Raw address of host data, for handing to foreign code. Null for
    /// device data.
    pub fn as_ptr(&self) -> *const u8 {
        match self.data {
            TensorData::Host(bytes) => bytes.as_ptr(),
            #[cfg(feature = "gpu")]
            TensorData::Device { .. } => std::ptr::null(),
        }
    }

    /// The exported device buffer, if the data is on a device.
    #[cfg(feature = "gpu")]
    pub fn device_buffer(&self) -> Option<&'a wgpu::Buffer> {
        match self.data {
            TensorData::Device { buffer, .. } => Some(buffer),
            TensorData::Host(_) => None,
        }
    }

    /// Copy the data into `out`, reading back from the device if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::BufferTooSmall`] if `out` is shorter than
    /// [`num_bytes`](Self::num_bytes), or a readback error for device
    /// data.
    pub fn copy_to_host(&self, out: &mut [u8]) -> Result<(), ExecError> {
        let needed = self.num_bytes();
        if out.len() < needed {
            return Err(ExecError::BufferTooSmall {
                needed,
                got: out.len(),
            });
        }
        match self.data {
            TensorData::Host(bytes) => out[..needed].copy_from_slice(&bytes[..needed]),
            #[cfg(feature = "gpu")]
            TensorData::Device { buffer, ctx } => {
                let bytes = ctx.read_buffer(buffer, needed as u64)?;
                out[..needed].copy_from_slice(&bytes);
            }
        }
        Ok(())
    }

    /// Copy the data out as a vector of `T`.
    ///
    /// # Errors
    ///
    /// Returns a readback error for device data that cannot be mapped.
    pub fn to_vec<T: Pod>(&self) -> Result<Vec<T>, ExecError> {
        let mut bytes = vec![0u8; self.num_bytes()];
        self.copy_to_host(&mut bytes)?;
        Ok(bytemuck::pod_collect_to_vec(&bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_view_reports_shape() {
        let values = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let t = Tensor::host(bytemuck::cast_slice(&values), ElementType::Float32, &[3, 2]);
        assert_eq!(t.dims(), &[3, 2]);
        assert_eq!(t.num_elements(), 6);
        assert_eq!(t.num_bytes(), 24);
        assert!(!t.is_on_gpu());
        assert_eq!(t.gpu_id(), None);
        assert_eq!(t.host_slice::<f32>().unwrap(), &values);
        assert_eq!(t.as_ptr(), values.as_ptr().cast());
    }

    #[test]
    fn copy_to_host_checks_capacity() {
        let values = [7i32, 8];
        let t = Tensor::host(bytemuck::cast_slice(&values), ElementType::Int32, &[2, 1]);
        let mut small = [0u8; 4];
        assert!(matches!(
            t.copy_to_host(&mut small),
            Err(ExecError::BufferTooSmall { needed: 8, got: 4 })
        ));
        assert_eq!(t.to_vec::<i32>().unwrap(), vec![7, 8]);
    }

    #[test]
    fn to_vec_decodes_unaligned_bytes() {
        let values = [0.5f32, -2.0, 3.25];
        let mut bytes = vec![0u8];
        bytes.extend_from_slice(bytemuck::cast_slice(&values));
        let t = Tensor::host(&bytes[1..], ElementType::Float32, &[3]);
        assert_eq!(t.to_vec::<f32>().unwrap(), values.to_vec());
    }

    #[test]
    fn view_may_cover_a_prefix() {
        let values = [0u8; 16];
        let t = Tensor::host(&values, ElementType::UInt8, &[2, 4]);
        assert_eq!(t.host_bytes().unwrap().len(), 8);
    }
}
