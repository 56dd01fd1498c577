//! Startup failures are reported as errors and leave nothing behind.

use mazerun_assets::AssetError;
use mazerun_engine::{Config, ConfigError, ExecMode, Manager, SetupError};
use mazerun_test_utils::{cpu_config, init_tracing, ScratchAssets};

fn setup(cfg: Config) -> SetupError {
    init_tracing();
    match Manager::new(cfg) {
        Ok(_) => panic!("setup should fail"),
        Err(e) => e,
    }
}

#[test]
fn invalid_config_is_rejected_before_loading_assets() {
    let err = setup(Config {
        num_worlds: 0,
        data_dir: "/nonexistent".into(),
        ..cpu_config(1)
    });
    assert!(matches!(err, SetupError::Config(ConfigError::NoWorlds)));
}

#[test]
fn missing_mesh_is_fatal() {
    let scratch = ScratchAssets::new().unwrap();
    scratch.remove("wall_collision.obj").unwrap();
    let err = setup(Config {
        data_dir: scratch.path().to_owned(),
        ..cpu_config(2)
    });
    assert!(matches!(err, SetupError::Assets(AssetError::Io { .. })), "{err}");
}

#[test]
fn malformed_mesh_is_fatal() {
    let scratch = ScratchAssets::new().unwrap();
    scratch
        .replace("cube_collision.obj", "v 0 0 0\nv 1 0 0\nf 1 2 9\n")
        .unwrap();
    let err = setup(Config {
        data_dir: scratch.path().to_owned(),
        ..cpu_config(2)
    });
    assert!(matches!(err, SetupError::Assets(_)), "{err}");
}

#[test]
fn degenerate_hull_is_fatal() {
    let scratch = ScratchAssets::new().unwrap();
    scratch
        .replace(
            "agent_collision_simplified.obj",
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n",
        )
        .unwrap();
    let err = setup(Config {
        data_dir: scratch.path().to_owned(),
        ..cpu_config(2)
    });
    assert!(
        matches!(err, SetupError::Assets(AssetError::InvalidHull { .. })),
        "{err}"
    );
}

#[test]
fn scratch_copy_builds_normally() {
    init_tracing();
    let scratch = ScratchAssets::new().unwrap();
    let mgr = Manager::new(Config {
        data_dir: scratch.path().to_owned(),
        ..cpu_config(2)
    })
    .unwrap();
    assert_eq!(mgr.num_worlds(), 2);
}

#[cfg(not(feature = "gpu"))]
#[test]
fn gpu_backend_needs_the_feature() {
    let err = setup(Config {
        exec_mode: ExecMode::Gpu,
        ..cpu_config(2)
    });
    assert!(matches!(err, SetupError::GpuNotCompiled));
}

#[cfg(feature = "gpu")]
#[test]
fn missing_adapter_is_a_backend_error() {
    use mazerun_engine::ExecError;

    let err = setup(Config {
        exec_mode: ExecMode::Gpu,
        gpu_id: 4096,
        ..cpu_config(2)
    });
    assert!(matches!(
        err,
        SetupError::Backend {
            mode: ExecMode::Gpu,
            source: ExecError::NoAdapter { gpu_id: 4096, .. }
        }
    ));
}
