//! Device-side layout of the escape-room task graph.
//!
//! `kernel.wgsl` binds, in order: the [`GpuParams`] uniform, the object
//! catalog, the shared [`Counters`], the per-world state array, and the
//! export slots in [`ExportId`](mazerun_core::ExportId) order.

use crate::config::{GpuParams, SimConfig};
use crate::exports::SimExports;
use bytemuck::{Pod, Zeroable};
use mazerun_assets::{ObjectCatalog, ObjectMeta};
use mazerun_core::state::WorldData;
use std::mem::size_of;

/// WGSL source of the world kernel.
pub const KERNEL_SOURCE: &str = include_str!("kernel.wgsl");

/// Entry point constructing each world.
pub const INIT_ENTRY: &str = "init_worlds";

/// Entry point stepping each world.
pub const STEP_ENTRY: &str = "step_worlds";

/// Workgroup size declared by both entry points.
pub const WORKGROUP_SIZE: u32 = 64;

/// Index of the object catalog among the shared buffers.
pub const SHARED_CATALOG: usize = 0;

/// Index of the [`Counters`] block among the shared buffers.
pub const SHARED_COUNTERS: usize = 1;

/// Cross-world counters kept in device memory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Counters {
    /// Episodes started, incremented atomically by each reset.
    pub episodes: u32,
    /// Bits of the best normalized progress, raised with an atomic max.
    pub progress_bits: u32,
    /// Padding to 16 bytes.
    pub pad: [u32; 2],
}

impl Counters {
    /// Best normalized progress.
    pub fn progress(&self) -> f32 {
        f32::from_bits(self.progress_bits)
    }

    /// Decode a counters block read back from the device. Returns `None`
    /// if `bytes` is too short.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        bytes
            .get(..size_of::<Self>())
            .map(bytemuck::pod_read_unaligned)
    }
}

/// Host-side contents of every buffer the kernel expects, ready to
/// upload.
#[derive(Clone, Debug)]
pub struct DeviceLayout {
    params: GpuParams,
    catalog: Vec<ObjectMeta>,
    counters: Counters,
    export_bytes: Vec<u64>,
}

impl DeviceLayout {
    /// Layout for `num_worlds` worlds running `cfg`.
    pub fn new(cfg: &SimConfig, num_worlds: u32, catalog: &ObjectCatalog) -> Self {
        Self {
            params: GpuParams::new(cfg, num_worlds),
            catalog: catalog.gpu_table(),
            counters: Counters::default(),
            export_bytes: SimExports::bytes_per_world().to_vec(),
        }
    }

    /// Uniform parameter block.
    pub fn params(&self) -> &GpuParams {
        &self.params
    }

    /// Object catalog uploaded as the first shared buffer.
    pub fn catalog(&self) -> &[ObjectMeta] {
        &self.catalog
    }

    /// Initial contents of the counters block.
    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Bytes per world of each export slot.
    pub fn export_bytes(&self) -> &[u64] {
        &self.export_bytes
    }

    /// Bytes of per-world state.
    pub fn world_data_bytes() -> u64 {
        size_of::<WorldData>() as u64
    }

    /// Call `f` with an executor configuration borrowing this layout.
    #[cfg(feature = "gpu")]
    pub fn with_exec_config<R>(
        &self,
        f: impl FnOnce(&mazerun_exec::GpuExecConfig<'_>) -> R,
    ) -> R {
        use mazerun_exec::{GpuExecConfig, SharedBufferDesc};

        let shared = [
            SharedBufferDesc {
                label: "mazerun_catalog",
                contents: bytemuck::cast_slice(self.catalog()),
                read_only: true,
            },
            SharedBufferDesc {
                label: "mazerun_counters",
                contents: bytemuck::bytes_of(self.counters()),
                read_only: false,
            },
        ];
        let cfg = GpuExecConfig {
            num_worlds: self.params.num_worlds,
            kernel_source: KERNEL_SOURCE,
            init_entry: INIT_ENTRY,
            step_entry: STEP_ENTRY,
            workgroup_size: WORKGROUP_SIZE,
            params: bytemuck::bytes_of(&self.params),
            shared: &shared,
            world_data_bytes: Self::world_data_bytes(),
            export_bytes: &self.export_bytes,
        };
        f(&cfg)
    }

    /// Storage buffers the kernel binds.
    pub fn num_storage_buffers(&self) -> u32 {
        (2 + 1 + self.export_bytes.len()) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::test_catalog;
    use mazerun_core::consts;
    use mazerun_core::ExportId;

    fn declares(line: &str) -> bool {
        KERNEL_SOURCE.lines().any(|l| l.trim() == line)
    }

    #[test]
    fn kernel_constants_match_the_host() {
        for (name, value) in [
            ("NUM_AGENTS", consts::NUM_AGENTS),
            ("NUM_ROOMS", consts::NUM_ROOMS),
            ("MAX_BUTTONS", consts::MAX_BUTTONS),
            ("MAX_CUBES", consts::MAX_CUBES),
            ("NUM_WALLS", consts::NUM_WALLS),
            ("MAX_OBSERVATIONS_PER_AGENT", consts::MAX_OBSERVATIONS_PER_AGENT),
            ("NUM_LIDAR_SAMPLES", consts::NUM_LIDAR_SAMPLES),
        ] {
            let line = format!("const {name}: u32 = {value}u;");
            assert!(declares(&line), "kernel is missing `{line}`");
        }
        assert!(declares(&format!(
            "const FIXED_WORLD_SEED: u32 = 0x{:08x}u;",
            crate::rng::FIXED_WORLD_SEED
        )));
        assert!(declares(&format!(
            "@compute @workgroup_size({WORKGROUP_SIZE})"
        )));
        assert!(KERNEL_SOURCE.contains(&format!("fn {INIT_ENTRY}(")));
        assert!(KERNEL_SOURCE.contains(&format!("fn {STEP_ENTRY}(")));
    }

    #[test]
    fn every_export_slot_has_a_binding() {
        let first = 1 + 2 + 1;
        let last = first + ExportId::COUNT - 1;
        assert!(KERNEL_SOURCE.contains(&format!("@binding({first}) var<storage")));
        assert!(KERNEL_SOURCE.contains(&format!("@binding({last}) var<storage")));
        assert!(!KERNEL_SOURCE.contains(&format!("@binding({})", last + 1)));
    }

    #[test]
    fn layout_sizes() {
        let layout = DeviceLayout::new(&SimConfig::default(), 8, &test_catalog());
        assert_eq!(layout.export_bytes().len(), ExportId::COUNT);
        assert_eq!(layout.num_storage_buffers(), 17);
        assert_eq!(size_of::<Counters>(), 16);
        assert_eq!(DeviceLayout::world_data_bytes() % 4, 0);
        assert_eq!(layout.params().num_worlds, 8);
        assert_eq!(layout.catalog().len(), test_catalog().gpu_table().len());
        assert_eq!(layout.counters(), &Counters::default());
    }

    #[test]
    fn counters_decode() {
        let c = Counters {
            episodes: 9,
            progress_bits: 0.5f32.to_bits(),
            pad: [0; 2],
        };
        let decoded = Counters::from_bytes(bytemuck::bytes_of(&c)).unwrap();
        assert_eq!(decoded.episodes, 9);
        assert_eq!(decoded.progress(), 0.5);
        assert!(Counters::from_bytes(&[0; 8]).is_none());
    }
}
