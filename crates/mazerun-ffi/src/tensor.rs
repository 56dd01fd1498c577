//! Exported tensor FFI: descriptors and host copies.
//!
//! Export ids are the slot numbers of `ExportId`: 0 reset, 1 action,
//! 2 reward, 3 done, 4 self, 5 agentID, 6 partners, 7 roomEntities,
//! 8 door, 9 lidar, 10 stepsRemaining, 11 checkpoint, 12 checkpointReset,
//! 13 checkpointSave.

use mazerun_core::ExportId;

use crate::manager::get_manager;
use crate::status::MazerunStatus;
use crate::types::MazerunTensor;

/// Number of export ids.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn mazerun_export_count() -> u32 {
    ExportId::COUNT as u32
}

/// Describe export `export_id` of a manager.
///
/// On the CPU backend the descriptor's `data` can be read in place
/// between steps. Inputs (resets, actions, checkpoint flags) are written
/// through the `mazerun_manager_*` control functions.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn mazerun_export_tensor(handle: u64, export_id: u32, out: *mut MazerunTensor) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return MazerunStatus::InvalidArgument as i32;
        }
        let Some(id) = ExportId::from_slot(export_id) else {
            return MazerunStatus::InvalidArgument as i32;
        };
        let Some(arc) = get_manager(handle) else {
            return MazerunStatus::InvalidHandle as i32;
        };
        let mgr = ffi_lock!(arc);
        let desc = MazerunTensor::describe(&mgr.export_tensor(id));
        // SAFETY: out is valid per caller contract.
        unsafe { *out = desc };
        MazerunStatus::Ok as i32
    })
}

/// Copy export `export_id` into `buf`, which holds `buf_len` bytes.
///
/// Works on both backends. Returns `MAZERUN_STATUS_BUFFER_TOO_SMALL` if
/// `buf_len` is less than the tensor's `num_bytes`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn mazerun_tensor_copy_to_host(
    handle: u64,
    export_id: u32,
    buf: *mut u8,
    buf_len: usize,
) -> i32 {
    ffi_guard!({
        if buf.is_null() {
            return MazerunStatus::InvalidArgument as i32;
        }
        let Some(id) = ExportId::from_slot(export_id) else {
            return MazerunStatus::InvalidArgument as i32;
        };
        let Some(arc) = get_manager(handle) else {
            return MazerunStatus::InvalidHandle as i32;
        };
        let mgr = ffi_lock!(arc);
        // SAFETY: buf points to buf_len writable bytes per caller contract.
        let out = unsafe { std::slice::from_raw_parts_mut(buf, buf_len) };
        match mgr.export_tensor(id).copy_to_host(out) {
            Ok(()) => MazerunStatus::Ok as i32,
            Err(e) => MazerunStatus::from(&e) as i32,
        }
    })
}
