//! End to end runs of the controller against the simulated plate.

use nalgebra::Point2;

use plate_lib::{
    actuator::{MemorySink, SerialLink},
    input::{self, PlateCmd},
    plate_ctrl::{ControlMode, InputData, Params, PlateCtrl},
    sim::{SimParams, SimPlate},
    vision::{RadiusGate, VisionParams},
};
use util::module::State;

const DT_S: f64 = 1.0 / 75.0;

struct Rig {
    ctrl: PlateCtrl,
    link: SerialLink<MemorySink>,
    gate: RadiusGate,
    sim: SimPlate,
    time_s: f64,
}

impl Rig {
    fn new() -> Self {
        let mut ctrl = PlateCtrl::default();
        ctrl.init(Params::default()).unwrap();

        let mut link = SerialLink::new(MemorySink::new());
        link.enable().unwrap();

        Self {
            ctrl,
            link,
            gate: RadiusGate::new(VisionParams::default()),
            sim: SimPlate::new(SimParams::default()),
            time_s: 0.0,
        }
    }

    fn cmd(&mut self, cmd: PlateCmd) -> Result<(), input::InputError> {
        input::exec(&cmd, self.time_s, &mut self.ctrl, &mut self.link, &mut self.gate)
    }

    fn calibrate(&mut self) {
        for p in self.sim.support_points_px().iter() {
            self.cmd(PlateCmd::CalibrationPoint { x: p[0], y: p[1] })
                .unwrap();
        }
    }

    fn cycle(&mut self) {
        let detection = self.gate.detect(&mut self.sim);
        let (out, rpt) = self
            .ctrl
            .run_frame(
                &InputData {
                    time_s: self.time_s,
                    detection,
                },
                &mut self.link,
            )
            .unwrap();

        if let (Some(dems), true) = (out, rpt.emitted) {
            self.sim.set_demands(&dems);
        }

        self.sim.step(DT_S);
        self.time_s += DT_S;
    }
}

fn parse_line(line: &str) -> Vec<f64> {
    assert!(line.ends_with(" \n"), "Bad line ending: {:?}", line);
    line.split_whitespace()
        .map(|a| a.parse::<f64>().unwrap())
        .collect()
}

#[test]
fn test_neutral_until_calibrated() {
    let mut rig = Rig::new();

    for _ in 0..10 {
        rig.cycle();
    }

    assert_eq!(rig.ctrl.mode(), ControlMode::Calibrating);
    assert_eq!(rig.link.sink().lines().len(), 10);
    for l in rig.link.sink().lines() {
        assert_eq!(l, "45.00000 45.00000 45.00000 \n");
    }
}

#[test]
fn test_running_lines_well_formed() {
    let mut rig = Rig::new();
    rig.calibrate();
    assert_eq!(rig.ctrl.mode(), ControlMode::Running);

    rig.cmd(PlateCmd::SetTarget { x: 300.0, y: 220.0 }).unwrap();

    for _ in 0..150 {
        rig.cycle();
        if !rig.sim.is_ball_on_plate() {
            break;
        }
    }

    assert!(!rig.link.sink().lines().is_empty());
    for l in rig.link.sink().lines() {
        let angles = parse_line(l);
        assert_eq!(angles.len(), 3);
        for a in angles {
            assert!(a >= 35.0 - 1e-9 && a <= 90.0 + 1e-9, "Angle out of range: {}", a);
        }
    }
}

#[test]
fn test_ball_settles_on_target() {
    let mut rig = Rig::new();
    rig.calibrate();

    let target = Point2::new(330.0, 235.0);
    rig.cmd(PlateCmd::SetTarget {
        x: target[0],
        y: target[1],
    })
    .unwrap();

    // 20 seconds of closed loop control
    for _ in 0..1500 {
        rig.cycle();
        assert!(rig.sim.is_ball_on_plate(), "Ball fell off at {:.2} s", rig.time_s);
    }

    let miss = (rig.sim.ball_px() - target).norm();
    assert!(miss < 5.0, "Ball settled {:.2} px from the target", miss);
}

#[test]
fn test_lost_ball_holds_last_command() {
    let mut rig = Rig::new();
    rig.calibrate();

    rig.cycle();
    let sent = rig.link.sink().lines().len();

    // Tracking off looks the same as losing the ball
    rig.cmd(PlateCmd::TrackBall { enabled: false }).unwrap();
    for _ in 0..5 {
        rig.cycle();
    }
    assert_eq!(rig.link.sink().lines().len(), sent);

    rig.cmd(PlateCmd::TrackBall { enabled: true }).unwrap();
    rig.cycle();
    assert_eq!(rig.link.sink().lines().len(), sent + 1);
}

#[test]
fn test_serial_failure_not_fatal() {
    let mut rig = Rig::new();
    rig.calibrate();

    rig.link.sink_mut().fail_sends("cable pulled");
    for _ in 0..5 {
        rig.cycle();
    }
    assert!(rig.ctrl.report().emit_failed);
    assert!(rig.link.sink().lines().is_empty());

    rig.link.sink_mut().restore();
    rig.cycle();
    assert!(!rig.ctrl.report().emit_failed);
    assert_eq!(rig.link.sink().lines().len(), 1);
}

#[test]
fn test_serial_disable_stops_output() {
    let mut rig = Rig::new();
    rig.cmd(PlateCmd::SerialDisable).unwrap();

    for _ in 0..5 {
        rig.cycle();
    }
    assert!(rig.link.sink().lines().is_empty());

    rig.cmd(PlateCmd::SerialEnable).unwrap();
    rig.cycle();
    assert_eq!(rig.link.sink().lines().len(), 1);
}

#[test]
fn test_recalibrate_mid_run() {
    let mut rig = Rig::new();
    rig.calibrate();

    rig.sim.place_ball(Point2::new(360.0, 260.0));
    for _ in 0..20 {
        rig.cycle();
    }

    rig.cmd(PlateCmd::Recalibrate).unwrap();
    assert_eq!(rig.ctrl.mode(), ControlMode::Calibrating);
    for pid in rig.ctrl.controllers().iter() {
        assert_eq!(pid.integral(), 0.0);
    }

    rig.cycle();
    assert_eq!(
        rig.link.sink().last(),
        Some("45.00000 45.00000 45.00000 \n")
    );

    // Target commands are rejected until calibrated again
    assert!(rig.cmd(PlateCmd::SetTarget { x: 1.0, y: 1.0 }).is_err());

    rig.calibrate();
    assert_eq!(rig.ctrl.mode(), ControlMode::Running);
}
