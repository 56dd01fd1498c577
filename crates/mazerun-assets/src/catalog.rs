//! The shared object catalog and the loader that publishes it.

use crate::error::AssetError;
use crate::rigid::{RigidBodyAssets, RigidBodyMetadata};
use bytemuck::{Pod, Zeroable};
use mazerun_core::{SimObject, Vec3};
use std::sync::Arc;
use tracing::debug;

/// Device-side layout of one catalog entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct ObjectMeta {
    /// Half extents of the object's bounds.
    pub half_extents: Vec3,
    /// Inverse mass.
    pub inv_mass: f32,
    /// Inverse inertia diagonal.
    pub inv_inertia: Vec3,
    /// Static friction.
    pub mu_s: f32,
    /// Dynamic friction.
    pub mu_d: f32,
}

/// Read-only rigid-body metadata for every registered object kind.
///
/// Built once per manager and shared by every world through an [`Arc`].
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectCatalog {
    metadatas: Vec<RigidBodyMetadata>,
}

impl ObjectCatalog {
    /// Number of registered object kinds.
    pub fn len(&self) -> usize {
        self.metadatas.len()
    }

    /// Whether no objects are registered.
    pub fn is_empty(&self) -> bool {
        self.metadatas.is_empty()
    }

    /// Metadata for an object kind.
    ///
    /// # Panics
    ///
    /// Panics if the kind was not registered.
    pub fn get(&self, obj: SimObject) -> &RigidBodyMetadata {
        &self.metadatas[obj.index()]
    }

    /// Half extents of an object kind.
    pub fn half_extents(&self, obj: SimObject) -> Vec3 {
        self.get(obj).half_extents
    }

    /// Catalog packed for upload to a device storage buffer.
    pub fn gpu_table(&self) -> Vec<ObjectMeta> {
        self.metadatas
            .iter()
            .map(|m| ObjectMeta {
                half_extents: m.half_extents,
                inv_mass: m.inv_mass,
                inv_inertia: m.inv_inertia,
                mu_s: m.friction.mu_s,
                mu_d: m.friction.mu_d,
            })
            .collect()
    }
}

/// Turns processed rigid-body assets into a shared [`ObjectCatalog`].
#[derive(Debug)]
pub struct PhysicsLoader {
    max_objects: usize,
    catalog: Option<Arc<ObjectCatalog>>,
}

impl PhysicsLoader {
    /// Create a loader that accepts up to `max_objects` object kinds.
    pub fn new(max_objects: usize) -> Self {
        Self {
            max_objects,
            catalog: None,
        }
    }

    /// Publish processed assets as the loader's catalog.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::TooManyObjects`] if the assets exceed the
    /// loader's capacity.
    pub fn load_rigid_bodies(
        &mut self,
        assets: RigidBodyAssets,
    ) -> Result<Arc<ObjectCatalog>, AssetError> {
        let count = assets.metadatas.len();
        if count > self.max_objects {
            return Err(AssetError::TooManyObjects {
                count,
                max: self.max_objects,
            });
        }
        debug!(objects = count, "loaded rigid bodies");
        let catalog = Arc::new(ObjectCatalog {
            metadatas: assets.metadatas,
        });
        self.catalog = Some(Arc::clone(&catalog));
        Ok(catalog)
    }

    /// The published catalog, if any.
    pub fn object_catalog(&self) -> Option<Arc<ObjectCatalog>> {
        self.catalog.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rigid::Friction;

    fn meta(h: f32) -> RigidBodyMetadata {
        RigidBodyMetadata {
            half_extents: Vec3::new(h, h, h),
            inv_mass: 1.0,
            inv_inertia: Vec3::new(2.0, 2.0, 2.0),
            friction: Friction {
                mu_s: 0.5,
                mu_d: 0.75,
            },
        }
    }

    #[test]
    fn loader_enforces_capacity() {
        let mut loader = PhysicsLoader::new(1);
        let assets = RigidBodyAssets {
            metadatas: vec![meta(1.0), meta(2.0)],
        };
        let e = loader.load_rigid_bodies(assets).unwrap_err();
        assert!(matches!(e, AssetError::TooManyObjects { count: 2, max: 1 }));
        assert!(loader.object_catalog().is_none());
    }

    #[test]
    fn catalog_is_shared() {
        let mut loader = PhysicsLoader::new(4);
        let catalog = loader
            .load_rigid_bodies(RigidBodyAssets {
                metadatas: vec![meta(0.75)],
            })
            .unwrap();
        let again = loader.object_catalog().unwrap();
        assert!(Arc::ptr_eq(&catalog, &again));
        assert_eq!(catalog.half_extents(SimObject::Cube).x, 0.75);
    }

    #[test]
    fn gpu_table_packs_friction() {
        let mut loader = PhysicsLoader::new(4);
        let catalog = loader
            .load_rigid_bodies(RigidBodyAssets {
                metadatas: vec![meta(0.5)],
            })
            .unwrap();
        let table = catalog.gpu_table();
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].mu_d, 0.75);
        assert_eq!(std::mem::size_of::<ObjectMeta>(), 9 * 4);
    }
}
