//! End-to-end asset import from files on disk.

use mazerun_assets::{
    AssetError, CollisionPrimitive, Friction, ImportedAssets, PhysicsLoader, RigidBodyAssets,
    SourceCollisionObject,
};
use mazerun_core::SimObject;
use std::io::Write;
use std::path::PathBuf;

fn data_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../../data"))
}

#[test]
fn bundled_meshes_import_and_process() {
    let dir = data_dir();
    let paths = [
        dir.join("cube_collision.obj"),
        dir.join("wall_collision.obj"),
        dir.join("agent_collision_simplified.obj"),
    ];
    let imported = ImportedAssets::import_from_disk(&paths).unwrap();
    assert_eq!(imported.objects.len(), 3);

    let hulls: Vec<_> = imported
        .objects
        .iter()
        .flat_map(|o| o.meshes.iter().cloned())
        .collect();
    let objects: Vec<_> = (0..hulls.len() as u32)
        .map(|hull_idx| SourceCollisionObject {
            prims: vec![CollisionPrimitive::Hull { hull_idx }],
            inv_mass: 1.0,
            friction: Friction {
                mu_s: 0.5,
                mu_d: 0.5,
            },
        })
        .collect();
    let assets = RigidBodyAssets::process(&hulls, &objects).unwrap();

    let mut loader = PhysicsLoader::new(10);
    let catalog = loader.load_rigid_bodies(assets).unwrap();
    let cube = catalog.half_extents(SimObject::Cube);
    assert!((cube.x - 0.75).abs() < 1e-6);
    assert!((cube.z - 0.75).abs() < 1e-6);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let e = ImportedAssets::import_from_disk(&[dir.path().join("nope.obj")]).unwrap_err();
    assert!(matches!(e, AssetError::Io { .. }));
    assert!(e.to_string().contains("nope.obj"));
}

#[test]
fn malformed_file_reports_its_line() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "v 0 0 0").unwrap();
    writeln!(file, "f 1 1").unwrap();
    let e = ImportedAssets::import_from_disk(&[file.path()]).unwrap_err();
    assert!(matches!(e, AssetError::Parse { line: 2, .. }));
}
