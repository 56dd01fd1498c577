//! Collision asset import and rigid-body metadata.
//!
//! Loading runs in three stages:
//!
//! 1. [`ImportedAssets::import_from_disk`] parses one Wavefront OBJ file
//!    per object kind into source meshes.
//! 2. [`RigidBodyAssets::process`] validates each hull and derives
//!    extents, mass and inertia for every collision object.
//! 3. [`PhysicsLoader::load_rigid_bodies`] publishes the result as a
//!    shared, read-only [`ObjectCatalog`] that every world references.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod obj;
pub mod rigid;

pub use catalog::{ObjectCatalog, ObjectMeta, PhysicsLoader};
pub use error::AssetError;
pub use obj::{ImportedAssets, SourceMesh, SourceObject};
pub use rigid::{
    CollisionPrimitive, Friction, RigidBodyAssets, RigidBodyMetadata, SourceCollisionObject,
};
