//! Core types for the mazerun batched escape-room simulator.
//!
//! This is the leaf crate with no internal dependencies. It defines the
//! identifiers shared by every layer (export slots, object kinds, entity
//! types), the compile-time world constants, and the `#[repr(C)]` record
//! layouts that back every exported tensor. All layouts are plain old
//! data so they can be viewed as bytes on the host and bound as storage
//! buffers on the device without conversion.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod consts;
pub mod dtype;
pub mod flags;
pub mod id;
pub mod layout;
pub mod math;
pub mod state;

pub use dtype::ElementType;
pub use flags::{RewardMode, SimFlags};
pub use id::{EntityType, ExportId, SimObject};
pub use math::{Quat, Vec3};
pub use state::{Checkpoint, WorldState};
