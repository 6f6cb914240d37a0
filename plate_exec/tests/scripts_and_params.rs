//! Checks of the shipped parameter files and scripts.

use std::path::PathBuf;

use plate_lib::{input::PlateCmd, plate_ctrl::Params, sim::SimParams};
use util::script_interpreter::{PendingCmds, ScriptInterpreter};

fn root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .to_path_buf()
}

#[test]
fn test_plate_ctrl_params_file() {
    let params: Params = util::params::load_from_path(root().join("params/plate_ctrl.toml")).unwrap();
    assert_eq!(params, Params::default());
}

#[test]
fn test_plate_exec_params_file() {
    #[derive(serde::Deserialize)]
    struct ExecSim {
        sim: SimParams,
        cycle_frequency_hz: f64,
    }

    let params: ExecSim = util::params::load_from_path(root().join("params/plate_exec.toml")).unwrap();
    assert_eq!(params.sim, SimParams::default());
    assert_eq!(params.cycle_frequency_hz, 75.0);
}

#[test]
fn test_demo_script() {
    let mut si: ScriptInterpreter<PlateCmd> =
        ScriptInterpreter::new(root().join("scripts/sim_demo.txt")).unwrap();

    assert_eq!(si.get_duration(), 30.0);

    match si.get_pending(0.25) {
        PendingCmds::Some(cmds) => {
            assert_eq!(cmds.len(), 3);
            assert!(cmds
                .iter()
                .all(|c| matches!(c, PlateCmd::CalibrationPoint { .. })));
        }
        p => panic!("Expected calibration points, got {:?}", p),
    }

    match si.get_pending(16.0) {
        PendingCmds::Some(cmds) => assert_eq!(cmds.len(), 4),
        p => panic!("Expected targets and gains, got {:?}", p),
    }
}

#[test]
fn test_script_rejects_unknown_command() {
    let script = "0.0: {\"type\": \"CalibrationPoint\", \"x\": 1, \"y\": 2};\n1.0: {\"type\": \"Fly\"};";
    assert!(ScriptInterpreter::<PlateCmd>::from_script(script).is_err());
}
