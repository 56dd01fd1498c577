//! CPU executor: every world in host memory, stepped on a fixed pool.

use crate::backend::ExecutionBackend;
use crate::error::ExecError;
use crate::graph::{ExportTable, WorldTaskGraph};
use crate::tensor::Tensor;
use mazerun_core::ElementType;
use rayon::prelude::*;
use tracing::debug;

/// Sizing of a [`TaskGraphExecutor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThreadPoolConfig {
    /// Number of worlds.
    pub num_worlds: u32,
    /// Number of export slots the task graph must register.
    pub num_exported_buffers: u32,
    /// Worker threads, or `None` for one per available core.
    pub num_threads: Option<usize>,
}

/// Steps a batch of [`WorldTaskGraph`] worlds on a dedicated rayon pool.
///
/// The pool is created once and lives as long as the executor. Each
/// [`run`](ExecutionBackend::run) partitions the worlds across the pool
/// and returns once every world has stepped.
pub struct TaskGraphExecutor<T: WorldTaskGraph> {
    pool: rayon::ThreadPool,
    cfg: T::Config,
    worlds: Vec<T>,
    exports: T::Exports,
}

impl<T: WorldTaskGraph> TaskGraphExecutor<T> {
    /// Build the pool, construct every world, and allocate the export
    /// buffers.
    ///
    /// `inits` holds one record per world. World construction runs on
    /// the pool, so `T::init_world` may be called concurrently.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::NoWorlds`], [`ExecError::InitCount`] or
    /// [`ExecError::ExportCount`] on inconsistent sizing, and
    /// [`ExecError::ThreadPool`] if the pool cannot be built.
    pub fn new(
        pool_cfg: ThreadPoolConfig,
        cfg: T::Config,
        inits: &[T::Init],
    ) -> Result<Self, ExecError> {
        if pool_cfg.num_worlds == 0 {
            return Err(ExecError::NoWorlds);
        }
        if inits.len() != pool_cfg.num_worlds as usize {
            return Err(ExecError::InitCount {
                expected: pool_cfg.num_worlds,
                got: inits.len(),
            });
        }

        let exports = T::Exports::with_worlds(pool_cfg.num_worlds as usize);
        if exports.num_exports() != pool_cfg.num_exported_buffers as usize {
            return Err(ExecError::ExportCount {
                expected: pool_cfg.num_exported_buffers,
                got: exports.num_exports(),
            });
        }

        let mut builder =
            rayon::ThreadPoolBuilder::new().thread_name(|i| format!("mazerun-worker-{i}"));
        if let Some(n) = pool_cfg.num_threads {
            builder = builder.num_threads(n);
        }
        let pool = builder.build()?;
        debug!(
            threads = pool.current_num_threads(),
            worlds = pool_cfg.num_worlds,
            "built CPU worker pool"
        );

        let worlds = pool.install(|| {
            inits
                .par_iter()
                .enumerate()
                .map(|(i, init)| T::init_world(&cfg, init, i as u32))
                .collect()
        });

        Ok(Self {
            pool,
            cfg,
            worlds,
            exports,
        })
    }

    /// Worker threads in the pool.
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Shared task-graph configuration.
    pub fn config(&self) -> &T::Config {
        &self.cfg
    }

    /// All worlds, in world order.
    pub fn worlds(&self) -> &[T] {
        &self.worlds
    }

    /// The export table.
    pub fn exports(&self) -> &T::Exports {
        &self.exports
    }
}

impl<T: WorldTaskGraph> ExecutionBackend for TaskGraphExecutor<T> {
    fn num_worlds(&self) -> u32 {
        self.worlds.len() as u32
    }

    fn run(&mut self) -> Result<(), ExecError> {
        let Self {
            pool,
            cfg,
            worlds,
            exports,
        } = self;
        let views = exports.split_worlds();
        let cfg = &*cfg;
        pool.install(|| {
            worlds
                .par_iter_mut()
                .zip(views.into_par_iter())
                .for_each(|(world, io)| world.step(cfg, io));
        });
        Ok(())
    }

    fn export_tensor(&self, slot: u32, dtype: ElementType, dims: &[i64]) -> Tensor<'_> {
        Tensor::host(self.exports.exported(slot), dtype, dims)
    }

    fn write_exported(&mut self, slot: u32, byte_offset: usize, bytes: &[u8]) {
        let dst = self.exports.exported_mut(slot);
        dst[byte_offset..byte_offset + bytes.len()].copy_from_slice(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Two slots: slot 0 holds one input `u32` per world, slot 1 one
    /// output `u32` per world.
    struct Io {
        input: Vec<u32>,
        output: Vec<u32>,
    }

    struct IoView<'a> {
        input: &'a mut u32,
        output: &'a mut u32,
    }

    impl ExportTable for Io {
        type World<'a> = IoView<'a>;

        fn with_worlds(n: usize) -> Self {
            Io {
                input: vec![0; n],
                output: vec![0; n],
            }
        }

        fn num_exports(&self) -> usize {
            2
        }

        fn exported(&self, slot: u32) -> &[u8] {
            match slot {
                0 => bytemuck::cast_slice(&self.input),
                1 => bytemuck::cast_slice(&self.output),
                _ => panic!("unregistered slot {slot}"),
            }
        }

        fn exported_mut(&mut self, slot: u32) -> &mut [u8] {
            match slot {
                0 => bytemuck::cast_slice_mut(&mut self.input),
                1 => bytemuck::cast_slice_mut(&mut self.output),
                _ => panic!("unregistered slot {slot}"),
            }
        }

        fn split_worlds(&mut self) -> Vec<IoView<'_>> {
            self.input
                .iter_mut()
                .zip(self.output.iter_mut())
                .map(|(input, output)| IoView { input, output })
                .collect()
        }
    }

    /// Accumulates its input; records a unique construction ticket.
    struct Counter {
        total: u32,
        ticket: u32,
    }

    impl WorldTaskGraph for Counter {
        type Config = u32;
        type Init = Arc<AtomicU32>;
        type Exports = Io;

        fn init_world(_: &u32, tickets: &Arc<AtomicU32>, _: u32) -> Self {
            Counter {
                total: 0,
                ticket: tickets.fetch_add(1, Ordering::Relaxed),
            }
        }

        fn step(&mut self, scale: &u32, io: IoView<'_>) {
            self.total += *io.input * scale;
            *io.input = 0;
            *io.output = self.total;
        }
    }

    fn pool(n: u32) -> ThreadPoolConfig {
        ThreadPoolConfig {
            num_worlds: n,
            num_exported_buffers: 2,
            num_threads: Some(4),
        }
    }

    fn shared_inits(n: usize) -> (Arc<AtomicU32>, Vec<Arc<AtomicU32>>) {
        let tickets = Arc::new(AtomicU32::new(0));
        let inits = (0..n).map(|_| Arc::clone(&tickets)).collect();
        (tickets, inits)
    }

    #[test]
    fn inputs_reach_only_their_world() {
        let (_, inits) = shared_inits(8);
        let mut exec = TaskGraphExecutor::<Counter>::new(pool(8), 3, &inits).unwrap();
        exec.write_exported(0, 5 * 4, bytemuck::bytes_of(&2u32));
        exec.run().unwrap();

        let out = exec.export_tensor(1, ElementType::Int32, &[8, 1]);
        let out = out.host_slice::<u32>().unwrap();
        assert_eq!(out[5], 6);
        assert_eq!(out.iter().filter(|&&v| v != 0).count(), 1);

        // The input was consumed.
        exec.run().unwrap();
        assert_eq!(exec.exports().input, vec![0; 8]);
        assert_eq!(exec.exports().output[5], 6);
    }

    #[test]
    fn concurrent_construction_hands_out_unique_tickets() {
        let (tickets, inits) = shared_inits(64);
        let exec = TaskGraphExecutor::<Counter>::new(pool(64), 1, &inits).unwrap();
        assert_eq!(tickets.load(Ordering::Relaxed), 64);

        let mut seen: Vec<u32> = exec.worlds().iter().map(|w| w.ticket).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..64).collect::<Vec<_>>());
        assert_eq!(exec.num_worlds(), 64);
        assert_eq!(exec.num_threads(), 4);
    }

    #[test]
    fn sizing_errors() {
        let (_, inits) = shared_inits(2);
        assert!(matches!(
            TaskGraphExecutor::<Counter>::new(pool(3), 1, &inits),
            Err(ExecError::InitCount {
                expected: 3,
                got: 2
            })
        ));
        let mut cfg = pool(2);
        cfg.num_exported_buffers = 5;
        assert!(matches!(
            TaskGraphExecutor::<Counter>::new(cfg, 1, &inits),
            Err(ExecError::ExportCount {
                expected: 5,
                got: 2
            })
        ));
        assert!(matches!(
            TaskGraphExecutor::<Counter>::new(pool(0), 1, &[]),
            Err(ExecError::NoWorlds)
        ));
    }
}
