//! Implementations for the PlateCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use nalgebra::Point2;
use serde::Serialize;

// Internal
use super::{
    AxisCoords, AxisPid, AxisStep, Calibration, Params, PlateCtrlError, ServoDemands,
    SetpointMotion, NUM_AXES,
};
use crate::actuator::{ActuatorSink, SerialLink};
use crate::vision::BallDetection;
use util::{
    archive::{ArchiveError, Archived, Archiver},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Plate control module state
#[derive(Default)]
pub struct PlateCtrl {
    params: Params,

    phase: Phase,

    /// One controller per axis, only stepped while running
    pids: [AxisPid; NUM_AXES],

    report: StatusReport,
    arch_report: Archiver,
}

/// Input data to plate control.
#[derive(Debug, Default, Clone, Copy)]
pub struct InputData {
    /// Current time, used to advance the setpoint.
    ///
    /// Units: seconds
    pub time_s: f64,

    /// The ball found in this frame, or `None` if it wasn't seen
    pub detection: Option<BallDetection>,
}

/// Status report for plate control processing.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct StatusReport {
    /// Time the frame was processed at
    pub time_s: f64,

    /// Mode during processing
    pub mode: ControlMode,

    /// Ball position in the camera frame, if it was seen
    pub ball_px: Option<Point2<f64>>,

    /// Interpolated setpoint in the camera frame, while running
    pub setpoint_px: Option<Point2<f64>>,

    /// Ball position along each axis
    pub ball_axes: Option<AxisCoords>,

    /// Setpoint position along each axis
    pub setpoint_axes: Option<AxisCoords>,

    /// The controller steps, if the controllers ran
    pub steps: Option<[AxisStep; NUM_AXES]>,

    /// True if a command was sent to the servos
    pub emitted: bool,

    /// True if sending the command failed
    pub emit_failed: bool,
}

/// Whether vision-driven control is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ControlMode {
    /// Waiting for the operator to mark the axes
    Calibrating,

    /// Steering the ball towards the setpoint
    Running,
}

/// Mode along with the data that only exists in that mode.
#[derive(Debug, Clone)]
enum Phase {
    Calibrating {
        points: Vec<Point2<f64>>,
    },
    Running {
        calib: Calibration,
        setpoint: SetpointMotion,
    },
}

/// Flattened status report for archiving.
#[derive(Serialize)]
struct ArchRecord {
    time_s: f64,
    mode: ControlMode,
    ball_x_px: Option<f64>,
    ball_y_px: Option<f64>,
    setpoint_x_px: Option<f64>,
    setpoint_y_px: Option<f64>,
    ball_0: Option<f64>,
    ball_1: Option<f64>,
    ball_2: Option<f64>,
    setpoint_0: Option<f64>,
    setpoint_1: Option<f64>,
    setpoint_2: Option<f64>,
    error_0: Option<f64>,
    error_1: Option<f64>,
    error_2: Option<f64>,
    smoothed_0: Option<bool>,
    smoothed_1: Option<bool>,
    smoothed_2: Option<bool>,
    demand_0_deg: Option<f64>,
    demand_1_deg: Option<f64>,
    demand_2_deg: Option<f64>,
    emitted: bool,
    emit_failed: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ControlMode {
    fn default() -> Self {
        ControlMode::Calibrating
    }
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Calibrating {
            points: Vec::with_capacity(NUM_AXES),
        }
    }
}

impl Phase {
    fn mode(&self) -> ControlMode {
        match self {
            Phase::Calibrating { .. } => ControlMode::Calibrating,
            Phase::Running { .. } => ControlMode::Running,
        }
    }
}

impl State for PlateCtrl {
    type InitData = Params;
    type InitError = PlateCtrlError;

    type InputData = InputData;
    type OutputData = Option<ServoDemands>;
    type StatusReport = StatusReport;
    type ProcError = PlateCtrlError;

    /// Initialise the PlateCtrl module.
    ///
    /// Leaves the module calibrating with no points marked.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        self.params = init_data;
        self.phase = Phase::default();
        self.reset_controllers();
        self.report = StatusReport::default();

        Ok(())
    }

    /// Process one frame.
    ///
    /// While calibrating the output is the neutral command. While running the
    /// output is the controllers' demand, or `None` if the ball wasn't seen in
    /// this frame.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        self.report = StatusReport {
            time_s: input_data.time_s,
            mode: self.phase.mode(),
            ball_px: input_data.detection.map(|d| d.position()),
            ..Default::default()
        };

        let output = match &self.phase {
            Phase::Calibrating { .. } => Some(ServoDemands::neutral(self.params.neutral_angle_deg)),
            Phase::Running { calib, setpoint } => {
                let setpoint_px = setpoint.current(input_data.time_s);
                let setpoint_axes = calib.project(&setpoint_px);

                self.report.setpoint_px = Some(setpoint_px);
                self.report.setpoint_axes = Some(setpoint_axes);

                // Without a ball there's nothing to correct, the servos keep
                // their last command.
                match self.report.ball_px {
                    Some(ball_px) => {
                        let ball_axes = calib.project(&ball_px);
                        let mut steps = [AxisStep::default(); NUM_AXES];
                        let mut angles_deg = [0f64; NUM_AXES];

                        for i in 0..NUM_AXES {
                            steps[i] =
                                self.pids[i].step(setpoint_axes[i], ball_axes[i], &self.params);
                            angles_deg[i] = steps[i].demand_deg;
                        }

                        self.report.ball_axes = Some(ball_axes);
                        self.report.steps = Some(steps);

                        trace!(
                            "PlateCtrl errors: {:?}, demands: {:?}",
                            [steps[0].error, steps[1].error, steps[2].error],
                            angles_deg
                        );

                        Some(ServoDemands { angles_deg })
                    }
                    None => None,
                }
            }
        };

        Ok((output, self.report))
    }
}

impl Archived for PlateCtrl {
    fn init_archives(&mut self, session: &Session) -> Result<(), ArchiveError> {
        self.arch_report = Archiver::from_path(session, "plate_ctrl/status_report.csv")?;
        Ok(())
    }

    fn write(&mut self) -> Result<(), ArchiveError> {
        self.arch_report.serialise(ArchRecord::from(&self.report))
    }
}

impl PlateCtrl {
    /// Create a new, calibrating, plate controller.
    pub fn new(params: Params) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    /// Process one frame and send any resulting command over the link.
    ///
    /// Failing to send is not fatal: a warning is logged, the failure is
    /// flagged in the report and the controller state is kept so sending can
    /// resume once the link recovers.
    pub fn run_frame<S: ActuatorSink>(
        &mut self,
        input_data: &InputData,
        link: &mut SerialLink<S>,
    ) -> Result<(Option<ServoDemands>, StatusReport), PlateCtrlError> {
        let (output, _) = self.proc(input_data)?;

        if let Some(dems) = output {
            match link.emit(&dems) {
                Ok(sent) => self.report.emitted = sent,
                Err(e) => {
                    warn!("Could not send servo demands: {}", e);
                    self.report.emit_failed = true;
                }
            }
        }

        Ok((output, self.report))
    }

    /// Mark the next axis' calibration point.
    ///
    /// Once the last point is marked the calibration is computed and, if the
    /// geometry is valid, the module starts running with the setpoint at the
    /// centre of the frame. Invalid point sets are discarded so calibration
    /// can start again from the first point.
    pub fn add_calibration_point(
        &mut self,
        point: Point2<f64>,
    ) -> Result<ControlMode, PlateCtrlError> {
        let points = match &mut self.phase {
            Phase::Calibrating { points } => points,
            Phase::Running { .. } => return Err(PlateCtrlError::NotCalibrating),
        };

        points.push(point);
        debug!(
            "Calibration point {} marked at ({:.1}, {:.1})",
            points.len(),
            point[0],
            point[1]
        );

        if points.len() < NUM_AXES {
            return Ok(ControlMode::Calibrating);
        }

        let marked = [points[0], points[1], points[2]];
        points.clear();

        match Calibration::from_points(marked, self.params.target_scale()) {
            Ok(calib) => {
                info!(
                    "Calibration complete, centre at ({:.1}, {:.1})",
                    calib.center()[0],
                    calib.center()[1]
                );

                self.phase = Phase::Running {
                    calib,
                    setpoint: SetpointMotion::hold(self.frame_center()),
                };
                self.reset_controllers();

                info!("PlateCtrl running");
                Ok(ControlMode::Running)
            }
            Err(e) => {
                warn!("Calibration rejected, mark the points again: {}", e);
                Err(e)
            }
        }
    }

    /// Move the setpoint to a new target, starting now.
    pub fn set_target(&mut self, target: Point2<f64>, time_s: f64) -> Result<(), PlateCtrlError> {
        match &mut self.phase {
            Phase::Running { setpoint, .. } => {
                setpoint.set_target(target, time_s, self.params.setpoint_speed_pxs);
                debug!(
                    "New target ({:.1}, {:.1}), arriving in {:.2} s",
                    target[0],
                    target[1],
                    setpoint.duration_s()
                );
                Ok(())
            }
            Phase::Calibrating { .. } => Err(PlateCtrlError::NotRunning),
        }
    }

    /// Drop the current calibration and wait for new points.
    ///
    /// The controllers are reset too, their history belongs to the old
    /// geometry.
    pub fn recalibrate(&mut self) {
        self.phase = Phase::default();
        self.reset_controllers();

        info!("PlateCtrl recalibrating");
    }

    /// Replace the parameters.
    ///
    /// Gains, limits and the setpoint speed take effect from the next frame
    /// and controller state is kept. A new target side length rescales the
    /// active calibration straight away. The frame size is only used for the
    /// initial setpoint, so it applies from the next calibration.
    pub fn set_params(&mut self, params: Params) {
        if params != self.params {
            info!(
                "PlateCtrl gains set to k_p = {}, k_i = {}, k_d = {}",
                params.k_p, params.k_i, params.k_d
            );
        }

        if let Phase::Running { calib, .. } = &mut self.phase {
            if params.target_scale() != calib.target_scale() {
                match Calibration::from_points(*calib.points(), params.target_scale()) {
                    Ok(c) => {
                        *calib = c;
                        info!("Calibration rescaled to {}", params.target_scale());
                    }
                    Err(e) => warn!("Could not rescale the calibration, keeping the old one: {}", e),
                }
            }
        }

        self.params = params;
    }

    /// The current parameters.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The current mode.
    pub fn mode(&self) -> ControlMode {
        self.phase.mode()
    }

    /// Number of calibration points marked so far.
    pub fn num_calibration_points(&self) -> usize {
        match &self.phase {
            Phase::Calibrating { points } => points.len(),
            Phase::Running { .. } => NUM_AXES,
        }
    }

    /// The active calibration, if running.
    pub fn calibration(&self) -> Option<&Calibration> {
        match &self.phase {
            Phase::Running { calib, .. } => Some(calib),
            Phase::Calibrating { .. } => None,
        }
    }

    /// The interpolated setpoint at `time_s`, if running.
    pub fn setpoint(&self, time_s: f64) -> Option<Point2<f64>> {
        match &self.phase {
            Phase::Running { setpoint, .. } => Some(setpoint.current(time_s)),
            Phase::Calibrating { .. } => None,
        }
    }

    /// The per-axis controllers.
    pub fn controllers(&self) -> &[AxisPid; NUM_AXES] {
        &self.pids
    }

    /// The report from the last processed frame.
    pub fn report(&self) -> &StatusReport {
        &self.report
    }

    fn frame_center(&self) -> Point2<f64> {
        Point2::new(
            self.params.frame_width_px / 2.0,
            self.params.frame_height_px / 2.0,
        )
    }

    fn reset_controllers(&mut self) {
        for pid in self.pids.iter_mut() {
            pid.reset();
        }
    }
}

impl From<&StatusReport> for ArchRecord {
    fn from(r: &StatusReport) -> Self {
        let axis = |c: Option<AxisCoords>, i: usize| c.map(|c| c[i]);
        let step = |i: usize| r.steps.map(|s| s[i]);

        Self {
            time_s: r.time_s,
            mode: r.mode,
            ball_x_px: r.ball_px.map(|p| p[0]),
            ball_y_px: r.ball_px.map(|p| p[1]),
            setpoint_x_px: r.setpoint_px.map(|p| p[0]),
            setpoint_y_px: r.setpoint_px.map(|p| p[1]),
            ball_0: axis(r.ball_axes, 0),
            ball_1: axis(r.ball_axes, 1),
            ball_2: axis(r.ball_axes, 2),
            setpoint_0: axis(r.setpoint_axes, 0),
            setpoint_1: axis(r.setpoint_axes, 1),
            setpoint_2: axis(r.setpoint_axes, 2),
            error_0: step(0).map(|s| s.error),
            error_1: step(1).map(|s| s.error),
            error_2: step(2).map(|s| s.error),
            smoothed_0: step(0).map(|s| s.smoothed),
            smoothed_1: step(1).map(|s| s.smoothed),
            smoothed_2: step(2).map(|s| s.smoothed),
            demand_0_deg: step(0).map(|s| s.demand_deg),
            demand_1_deg: step(1).map(|s| s.demand_deg),
            demand_2_deg: step(2).map(|s| s.demand_deg),
            emitted: r.emitted,
            emit_failed: r.emit_failed,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::actuator::MemorySink;
    use crate::plate_ctrl::GeometryFault;

    /// Support points of an equilateral plate centred in the frame
    fn support_points() -> [Point2<f64>; NUM_AXES] {
        [
            Point2::new(320.0, 140.0),
            Point2::new(406.6, 290.0),
            Point2::new(233.4, 290.0),
        ]
    }

    fn running_ctrl() -> PlateCtrl {
        let mut ctrl = PlateCtrl::new(Params::default());
        for p in support_points().iter() {
            ctrl.add_calibration_point(*p).unwrap();
        }
        ctrl
    }

    fn input(time_s: f64, x: f64, y: f64) -> InputData {
        InputData {
            time_s,
            detection: Some(BallDetection::new(x, y, 20.0)),
        }
    }

    #[test]
    fn test_calibrating_outputs_neutral() {
        let mut ctrl = PlateCtrl::new(Params::default());
        ctrl.add_calibration_point(Point2::new(1.0, 2.0)).unwrap();

        let (out, rpt) = ctrl.proc(&input(0.0, 100.0, 100.0)).unwrap();

        assert_eq!(out, Some(ServoDemands::neutral(45.0)));
        assert_eq!(rpt.mode, ControlMode::Calibrating);
        assert!(rpt.steps.is_none());
        assert_eq!(ctrl.num_calibration_points(), 1);
    }

    #[test]
    fn test_calibration_completes() {
        let mut ctrl = PlateCtrl::new(Params::default());
        let pts = support_points();

        assert_eq!(ctrl.add_calibration_point(pts[0]).unwrap(), ControlMode::Calibrating);
        assert_eq!(ctrl.add_calibration_point(pts[1]).unwrap(), ControlMode::Calibrating);
        assert_eq!(ctrl.add_calibration_point(pts[2]).unwrap(), ControlMode::Running);

        assert_eq!(ctrl.mode(), ControlMode::Running);
        assert!(ctrl.calibration().is_some());

        // Setpoint starts at the frame centre
        let sp = ctrl.setpoint(0.0).unwrap();
        assert!((sp[0] - 320.0).abs() < 1e-9);
        assert!((sp[1] - 240.0).abs() < 1e-9);

        match ctrl.add_calibration_point(pts[0]) {
            Err(PlateCtrlError::NotCalibrating) => (),
            r => panic!("Expected NotCalibrating, got {:?}", r),
        }
    }

    #[test]
    fn test_degenerate_calibration_rejected() {
        let mut ctrl = PlateCtrl::new(Params::default());

        ctrl.add_calibration_point(Point2::new(0.0, 0.0)).unwrap();
        ctrl.add_calibration_point(Point2::new(10.0, 10.0)).unwrap();
        match ctrl.add_calibration_point(Point2::new(20.0, 20.0)) {
            Err(PlateCtrlError::InvalidCalibrationGeometry(GeometryFault::Collinear(_))) => (),
            r => panic!("Expected collinear rejection, got {:?}", r),
        }

        // Points are discarded, marking starts again
        assert_eq!(ctrl.mode(), ControlMode::Calibrating);
        assert_eq!(ctrl.num_calibration_points(), 0);
    }

    #[test]
    fn test_ball_at_setpoint() {
        let mut ctrl = running_ctrl();

        let (out, rpt) = ctrl.proc(&input(0.0, 320.0, 240.0)).unwrap();
        let dems = out.unwrap();

        for (a, s) in dems.angles_deg.iter().zip(rpt.steps.unwrap().iter()) {
            assert!(s.error.abs() < 1e-9);
            assert!((a - 45.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_no_detection_no_output() {
        let mut ctrl = running_ctrl();
        ctrl.proc(&input(0.0, 330.0, 240.0)).unwrap();
        let integrals: Vec<f64> = ctrl.controllers().iter().map(|p| p.integral()).collect();

        let (out, rpt) = ctrl
            .proc(&InputData {
                time_s: 0.1,
                detection: None,
            })
            .unwrap();

        assert!(out.is_none());
        assert!(rpt.steps.is_none());
        assert!(rpt.setpoint_px.is_some());

        // Controllers untouched
        for (p, i) in ctrl.controllers().iter().zip(integrals.iter()) {
            assert_eq!(p.integral(), *i);
        }
    }

    #[test]
    fn test_recalibrate_resets() {
        let mut ctrl = running_ctrl();
        for i in 0..10 {
            ctrl.proc(&input(i as f64 * 0.1, 380.0, 200.0)).unwrap();
        }
        assert!(ctrl.controllers().iter().any(|p| p.integral() != 0.0));

        ctrl.recalibrate();

        assert_eq!(ctrl.mode(), ControlMode::Calibrating);
        assert!(ctrl.setpoint(0.0).is_none());
        for p in ctrl.controllers().iter() {
            assert_eq!(p.integral(), 0.0);
            assert_eq!(p.prev_error(), 0.0);
        }
    }

    #[test]
    fn test_set_params_rescales_calibration() {
        let mut ctrl = running_ctrl();
        let p0 = support_points()[0];
        assert!((ctrl.calibration().unwrap().project(&p0)[0] - 125.0).abs() < 1e-9);

        let params = Params {
            target_side_length: 400.0,
            ..Params::default()
        };
        ctrl.set_params(params);

        let calib = ctrl.calibration().unwrap();
        assert_eq!(calib.target_scale(), 200.0);
        assert!((calib.project(&p0)[0] - 200.0).abs() < 1e-9);
        assert_eq!(ctrl.mode(), ControlMode::Running);
    }

    #[test]
    fn test_set_target_needs_running() {
        let mut ctrl = PlateCtrl::new(Params::default());
        match ctrl.set_target(Point2::new(1.0, 1.0), 0.0) {
            Err(PlateCtrlError::NotRunning) => (),
            r => panic!("Expected NotRunning, got {:?}", r),
        }
    }

    #[test]
    fn test_run_frame_emits() {
        let mut ctrl = PlateCtrl::new(Params::default());
        let mut link = SerialLink::new(MemorySink::new());

        // Disabled link, nothing sent
        let (out, rpt) = ctrl.run_frame(&input(0.0, 0.0, 0.0), &mut link).unwrap();
        assert!(out.is_some());
        assert!(!rpt.emitted);
        assert!(link.sink().lines().is_empty());

        link.enable().unwrap();
        let (_, rpt) = ctrl.run_frame(&input(0.1, 0.0, 0.0), &mut link).unwrap();
        assert!(rpt.emitted);
        assert_eq!(link.sink().last(), Some("45.00000 45.00000 45.00000 \n"));

        // A failing sink doesn't stop processing
        link.sink_mut().fail_sends("unplugged");
        let (out, rpt) = ctrl.run_frame(&input(0.2, 0.0, 0.0), &mut link).unwrap();
        assert!(out.is_some());
        assert!(!rpt.emitted);
        assert!(rpt.emit_failed);
        assert_eq!(link.sink().lines().len(), 1);
    }
}
