//! Manager lifecycle and control FFI: create, step, reset, checkpoint,
//! actions, destroy.
//!
//! Each manager sits behind its own `Arc<Mutex<_>>`, so the global table
//! lock is held only for handle lookup and different managers can step
//! concurrently from different caller threads.

use std::sync::{Arc, Mutex};

use mazerun_core::consts::NUM_AGENTS;
use mazerun_engine::{Config, Manager};
use tracing::error;

use crate::handle::HandleTable;
use crate::status::MazerunStatus;
use crate::types::MazerunConfig;

type ManagerArc = Arc<Mutex<Manager>>;

static MANAGERS: Mutex<HandleTable<ManagerArc>> = Mutex::new(HandleTable::new());

/// Clone the Arc for a manager handle, briefly locking the global table.
///
/// Returns `None` if the handle is invalid or the table lock is poisoned.
pub(crate) fn get_manager(handle: u64) -> Option<ManagerArc> {
    MANAGERS.lock().ok()?.get(handle).cloned()
}

/// Fill `out` with the default configuration (one CPU world, built-in
/// mesh directory).
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn mazerun_config_default(out: *mut MazerunConfig) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return MazerunStatus::InvalidArgument as i32;
        }
        let cfg = MazerunConfig::from_config(&Config::default());
        // SAFETY: out is valid per caller contract.
        unsafe { *out = cfg };
        MazerunStatus::Ok as i32
    })
}

/// Build a manager and write its handle to `handle_out`.
///
/// Setup is all or nothing: on failure no handle is written, nothing is
/// left allocated, and the cause is logged through `tracing`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn mazerun_manager_create(cfg: *const MazerunConfig, handle_out: *mut u64) -> i32 {
    ffi_guard!({
        if cfg.is_null() || handle_out.is_null() {
            return MazerunStatus::InvalidArgument as i32;
        }
        // SAFETY: cfg points to a valid MazerunConfig whose data_dir is null
        // or NUL-terminated, per caller contract.
        let cfg = match unsafe { (*cfg).to_config() } {
            Ok(c) => c,
            Err(status) => return status as i32,
        };
        let mgr = match Manager::new(cfg) {
            Ok(m) => m,
            Err(e) => return MazerunStatus::from(&e) as i32,
        };
        let handle = ffi_lock!(MANAGERS).insert(Arc::new(Mutex::new(mgr)));
        // SAFETY: handle_out is valid per caller contract.
        unsafe { *handle_out = handle };
        MazerunStatus::Ok as i32
    })
}

/// Destroy a manager, releasing its executor and all exported buffers.
///
/// Host pointers obtained from `mazerun_export_tensor` dangle afterwards.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn mazerun_manager_destroy(handle: u64) -> i32 {
    ffi_guard!({
        match ffi_lock!(MANAGERS).remove(handle) {
            Some(_) => MazerunStatus::Ok as i32,
            None => MazerunStatus::InvalidHandle as i32,
        }
    })
}

/// Advance every world by one step.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn mazerun_manager_step(handle: u64) -> i32 {
    ffi_guard!({
        let Some(arc) = get_manager(handle) else {
            return MazerunStatus::InvalidHandle as i32;
        };
        let mut mgr = ffi_lock!(arc);
        match mgr.step() {
            Ok(()) => MazerunStatus::Ok as i32,
            Err(e) => {
                error!(handle, error = %e, "step failed");
                MazerunStatus::from(&e) as i32
            }
        }
    })
}

/// Write the batch size to `out`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn mazerun_manager_num_worlds(handle: u64, out: *mut u32) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return MazerunStatus::InvalidArgument as i32;
        }
        let Some(arc) = get_manager(handle) else {
            return MazerunStatus::InvalidHandle as i32;
        };
        let n = ffi_lock!(arc).num_worlds();
        // SAFETY: out is valid per caller contract.
        unsafe { *out = n };
        MazerunStatus::Ok as i32
    })
}

/// Write the shared progress value (furthest normalised progress any
/// agent has reached) to `out`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn mazerun_manager_progress(handle: u64, out: *mut f32) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return MazerunStatus::InvalidArgument as i32;
        }
        let Some(arc) = get_manager(handle) else {
            return MazerunStatus::InvalidHandle as i32;
        };
        let progress = match ffi_lock!(arc).progress() {
            Ok(p) => p,
            Err(e) => return MazerunStatus::from(&e) as i32,
        };
        // SAFETY: out is valid per caller contract.
        unsafe { *out = progress };
        MazerunStatus::Ok as i32
    })
}

/// Run `f` on a locked manager after checking `world_idx`.
///
/// Indices are range-checked here, unlike the Rust API, since C callers
/// have no debug assertions to catch them.
fn with_world(handle: u64, world_idx: u32, f: impl FnOnce(&mut Manager)) -> i32 {
    let Some(arc) = get_manager(handle) else {
        return MazerunStatus::InvalidHandle as i32;
    };
    let mut mgr = ffi_lock!(arc);
    if world_idx >= mgr.num_worlds() {
        return MazerunStatus::InvalidArgument as i32;
    }
    f(&mut mgr);
    MazerunStatus::Ok as i32
}

/// Start a fresh episode in world `world_idx` on the next step.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn mazerun_manager_trigger_reset(handle: u64, world_idx: u32) -> i32 {
    ffi_guard!({ with_world(handle, world_idx, |m| m.trigger_reset(world_idx)) })
}

/// Arm (nonzero `save`) or disarm checkpoint capture for world `world_idx`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn mazerun_manager_set_save_checkpoint(
    handle: u64,
    world_idx: u32,
    save: u8,
) -> i32 {
    ffi_guard!({
        with_world(handle, world_idx, |m| {
            m.set_save_checkpoint(world_idx, save != 0)
        })
    })
}

/// Restore world `world_idx` from its checkpoint on the next step.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn mazerun_manager_trigger_load_checkpoint(handle: u64, world_idx: u32) -> i32 {
    ffi_guard!({
        with_world(handle, world_idx, |m| m.trigger_load_checkpoint(world_idx))
    })
}

/// Set the next action of agent `agent_idx` in world `world_idx`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn mazerun_manager_set_action(
    handle: u64,
    world_idx: u32,
    agent_idx: u32,
    move_amount: i32,
    move_angle: i32,
    rotate: i32,
    interact: i32,
) -> i32 {
    ffi_guard!({
        if agent_idx as usize >= NUM_AGENTS {
            return MazerunStatus::InvalidArgument as i32;
        }
        with_world(handle, world_idx, |m| {
            m.set_action(world_idx, agent_idx, move_amount, move_angle, rotate, interact)
        })
    })
}
