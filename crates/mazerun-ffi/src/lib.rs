//! C ABI for the mazerun batch manager.
//!
//! External training processes create a manager from a [`MazerunConfig`],
//! drive it through integer handles, and read the exported tensors either
//! in place (CPU backend, via the pointer in [`MazerunTensor`]) or by
//! copying them into caller memory. The header `include/mazerun.h` is
//! generated from this crate by cbindgen.
//!
//! Every entry point returns a [`MazerunStatus`] code as `i32`. Panics never
//! unwind across the boundary; they surface as `MAZERUN_STATUS_PANICKED`.
//!
//! This is the only crate in the workspace that contains `unsafe` code.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

/// Run `body`, converting a panic into `MazerunStatus::Panicked`.
macro_rules! ffi_guard {
    ($body:block) => {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| -> i32 { $body })) {
            Ok(code) => code,
            Err(_) => $crate::status::MazerunStatus::Panicked as i32,
        }
    };
}

/// Lock a mutex, returning `MazerunStatus::InternalError` from the
/// enclosing closure if it is poisoned.
macro_rules! ffi_lock {
    ($mutex:expr) => {
        match $mutex.lock() {
            Ok(guard) => guard,
            Err(_) => return $crate::status::MazerunStatus::InternalError as i32,
        }
    };
}

mod handle;
pub mod manager;
pub mod status;
pub mod tensor;
pub mod types;

pub use status::MazerunStatus;
pub use types::{MazerunConfig, MazerunExecMode, MazerunTensor};
