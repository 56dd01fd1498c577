//! Registration of the escape room's physics objects.

use mazerun_assets::{
    AssetError, CollisionPrimitive, Friction, ImportedAssets, ObjectCatalog, PhysicsLoader,
    RigidBodyAssets, SourceCollisionObject, SourceMesh,
};
use mazerun_core::consts::MAX_PHYSICS_OBJECTS;
use mazerun_core::SimObject;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Directory holding the bundled collision meshes.
pub fn default_data_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../../data"))
}

/// Collision mesh file for each hull-backed object, in [`SimObject`]
/// order.
const HULL_FILES: [(SimObject, &str); SimObject::COUNT - 1] = [
    (SimObject::Cube, "cube_collision.obj"),
    (SimObject::Wall, "wall_collision.obj"),
    (SimObject::Door, "wall_collision.obj"),
    (SimObject::Agent, "agent_collision_simplified.obj"),
    (SimObject::Button, "cube_collision.obj"),
    (SimObject::Key, "cube_collision.obj"),
];

fn mass_properties(obj: SimObject) -> (f32, Friction) {
    let (inv_mass, mu_s, mu_d) = match obj {
        SimObject::Cube => (0.075, 0.5, 0.75),
        SimObject::Wall | SimObject::Door | SimObject::Plane => (0.0, 0.5, 0.5),
        SimObject::Agent | SimObject::Button | SimObject::Key => (1.0, 0.5, 0.5),
    };
    (inv_mass, Friction { mu_s, mu_d })
}

/// Import the collision meshes under `data_dir` and publish the object
/// catalog through `loader`.
///
/// Agents get zero inverse inertia about x and y so they only ever turn
/// about the vertical axis.
///
/// # Errors
///
/// Returns any [`AssetError`] raised while importing or processing the
/// meshes.
pub fn load_physics_objects(
    loader: &mut PhysicsLoader,
    data_dir: &Path,
) -> Result<Arc<ObjectCatalog>, AssetError> {
    let paths: Vec<PathBuf> = HULL_FILES
        .iter()
        .map(|(_, file)| data_dir.join(file))
        .collect();
    let imported = ImportedAssets::import_from_disk(&paths)?;

    let mut hulls: Vec<SourceMesh> = Vec::new();
    let mut objects: Vec<SourceCollisionObject> = Vec::with_capacity(SimObject::COUNT);
    for ((obj, _), source) in HULL_FILES.iter().zip(imported.objects) {
        let mut prims = Vec::with_capacity(source.meshes.len());
        for mesh in source.meshes {
            prims.push(CollisionPrimitive::Hull {
                hull_idx: hulls.len() as u32,
            });
            hulls.push(mesh);
        }
        let (inv_mass, friction) = mass_properties(*obj);
        objects.push(SourceCollisionObject {
            prims,
            inv_mass,
            friction,
        });
    }
    let (inv_mass, friction) = mass_properties(SimObject::Plane);
    objects.push(SourceCollisionObject {
        prims: vec![CollisionPrimitive::Plane],
        inv_mass,
        friction,
    });

    let mut assets = RigidBodyAssets::process(&hulls, &objects)?;
    let agent = &mut assets.metadatas[SimObject::Agent.index()];
    agent.inv_inertia.x = 0.0;
    agent.inv_inertia.y = 0.0;

    let catalog = loader.load_rigid_bodies(assets)?;
    info!(
        data_dir = %data_dir.display(),
        hulls = hulls.len(),
        objects = catalog.len(),
        "physics objects loaded"
    );
    Ok(catalog)
}

/// Catalog built from the bundled meshes.
#[cfg(test)]
pub(crate) fn test_catalog() -> Arc<ObjectCatalog> {
    load_physics_objects(
        &mut PhysicsLoader::new(MAX_PHYSICS_OBJECTS),
        &default_data_dir(),
    )
    .expect("bundled meshes load")
}

/// Load the bundled meshes with a fresh loader sized for this
/// simulator.
///
/// # Errors
///
/// See [`load_physics_objects`].
pub fn load_catalog(data_dir: &Path) -> Result<Arc<ObjectCatalog>, AssetError> {
    load_physics_objects(&mut PhysicsLoader::new(MAX_PHYSICS_OBJECTS), data_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_object_kind_is_registered() {
        let catalog = test_catalog();
        assert_eq!(catalog.len(), SimObject::COUNT);
        assert_eq!(catalog.half_extents(SimObject::Cube).x, 0.75);
        assert_eq!(catalog.half_extents(SimObject::Button).x, 0.75);
        assert_eq!(catalog.half_extents(SimObject::Wall).y, 0.5);
        assert_eq!(catalog.half_extents(SimObject::Plane).x, 0.0);
    }

    #[test]
    fn agents_only_turn_about_z() {
        let agent = *test_catalog().get(SimObject::Agent);
        assert_eq!(agent.inv_inertia.x, 0.0);
        assert_eq!(agent.inv_inertia.y, 0.0);
        assert!(agent.inv_inertia.z > 0.0);
        assert_eq!(agent.inv_mass, 1.0);
    }

    #[test]
    fn static_objects_have_no_mass() {
        let catalog = test_catalog();
        for obj in [SimObject::Wall, SimObject::Door, SimObject::Plane] {
            assert_eq!(catalog.get(obj).inv_mass, 0.0, "{obj:?}");
        }
        assert_eq!(catalog.get(SimObject::Cube).friction.mu_d, 0.75);
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let err = load_catalog(Path::new("/nonexistent/mazerun")).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }
}
