//! Main plate executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Operator command processing
//!         - Ball detection
//!         - Plate control processing
//!         - Servo demand emission
//!         - Archiving
//!         - Simulation step (if simulating)
//!
//! # Usage
//!
//! ```text
//! plate_exec [--script <path>] [--sim]
//! ```
//!
//! With `--sim` the camera and mechanics are replaced by a simulated plate.
//! If no script is given in that mode the plate is calibrated from the
//! simulation's own support points and the ball is held at the centre.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::thread;
use std::time::Instant;
use structopt::StructOpt;

// Internal
use params::PlateExecParams;
use plate_lib::{
    actuator::{ActuatorSink, ConsoleSink, DeviceSink, SerialLink},
    input::{self, PlateCmd},
    plate_ctrl::{InputData, Params, PlateCtrl},
    sim::SimPlate,
    vision::RadiusGate,
};
use util::{
    archive::Archived,
    logger::{logger_init, LevelFilter},
    module::State,
    script_interpreter::{PendingCmds, ScriptInterpreter},
    session::Session,
    time::period_from_frequency,
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "plate_exec", about = "Ball on plate control executable")]
struct Opt {
    /// Script of timestamped operator commands to run
    #[structopt(short, long, parse(from_os_str))]
    script: Option<PathBuf>,

    /// Run against the simulated plate instead of hardware
    #[structopt(long)]
    sim: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("plate_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Ball on Plate Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opt);

    // ---- LOAD PARAMETERS ----

    let exec_params: PlateExecParams =
        util::params::load("plate_exec.toml").wrap_err("Could not load exec params")?;
    let ctrl_params: Params =
        util::params::load("plate_ctrl.toml").wrap_err("Could not load PlateCtrl params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE COMMAND SOURCE ----

    let mut script: Option<ScriptInterpreter<PlateCmd>> = match opt.script {
        Some(ref path) => {
            info!("Loading script from {:?}", path);

            let si = ScriptInterpreter::new(path).wrap_err("Failed to load script")?;

            info!(
                "Loaded script lasts {:.02} s and contains {} commands\n",
                si.get_duration(),
                si.get_num_cmds()
            );

            Some(si)
        }
        None => None,
    };

    let mut sim = if opt.sim {
        info!("Running against the simulated plate");
        Some(SimPlate::new(exec_params.sim.clone()))
    } else {
        None
    };

    if script.is_none() && sim.is_none() {
        return Err(eyre!(
            "Nothing to run, provide a script, the --sim flag or both"
        ));
    }

    // ---- INITIALISE ACTUATOR LINK ----

    let sink: Box<dyn ActuatorSink> = match exec_params.serial_device {
        Some(ref device) => {
            info!("Servo demands will be sent to {}", device);
            Box::new(DeviceSink::new(device))
        }
        None => {
            info!("No serial device configured, servo demands will be printed to stdout");
            Box::new(ConsoleSink)
        }
    };
    let mut link = SerialLink::new(sink);

    if exec_params.serial_enabled {
        // Not fatal, the link can be enabled again by command
        if let Err(e) = link.enable() {
            warn!("Could not enable the serial link: {}", e);
        }
    }

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut gate = RadiusGate::new(exec_params.vision.clone());

    let mut plate_ctrl = PlateCtrl::default();
    plate_ctrl
        .init(ctrl_params)
        .wrap_err("Failed to initialise PlateCtrl")?;
    if exec_params.archive {
        plate_ctrl
            .init_archives(&session)
            .wrap_err("Failed to initialise PlateCtrl archives")?;
    }
    info!("PlateCtrl init complete");

    // Without an operator the simulation calibrates itself
    if let (Some(s), None) = (&sim, &script) {
        for point in s.support_points_px().iter() {
            plate_ctrl
                .add_calibration_point(*point)
                .wrap_err("Failed to calibrate against the simulated plate")?;
        }
    }

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    let cycle_period = period_from_frequency(exec_params.cycle_frequency_hz)
        .ok_or_else(|| eyre!("Cycle frequency must be positive, got {}", exec_params.cycle_frequency_hz))
        .wrap_err("Invalid exec params")?;
    let loop_start = Instant::now();
    let mut num_cycles: u64 = 0;

    info!("Begining main loop\n");

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();
        let time_s = (cycle_start_instant - loop_start).as_secs_f64();

        // ---- COMMAND PROCESSING ----

        if let Some(ref mut si) = script {
            match si.get_pending(time_s) {
                PendingCmds::None => (),
                PendingCmds::Some(cmds) => {
                    for cmd in cmds.iter() {
                        // A rejected command leaves everything as it was
                        if let Err(e) = input::exec(cmd, time_s, &mut plate_ctrl, &mut link, &mut gate) {
                            warn!("Could not execute {:?}: {}", cmd, e);
                        }
                    }
                }
                PendingCmds::EndOfScript => {
                    info!("End of script reached, stopping");
                    break;
                }
            }
        }

        // ---- DATA INPUT ----

        let detection = match sim {
            Some(ref mut s) => gate.detect(s),
            None => None,
        };

        // ---- CONTROL ALGORITHM PROCESSING ----

        match plate_ctrl.run_frame(&InputData { time_s, detection }, &mut link) {
            Ok((Some(dems), report)) => {
                if exec_params.echo_demands {
                    info!("Demands: {}", dems.to_line().trim_end());
                }

                // The simulated servos only move if the command reached them
                if report.emitted {
                    if let Some(ref mut s) = sim {
                        s.set_demands(&dems);
                    }
                }
            }
            Ok((None, _)) => (),
            Err(e) => warn!("Error during PlateCtrl processing: {}", e),
        }

        // ---- WRITE ARCHIVES ----

        if exec_params.archive {
            if let Err(e) = plate_ctrl.write() {
                warn!("Could not archive the PlateCtrl status: {}", e);
            }
        }

        // ---- SIMULATION ----

        if let Some(ref mut s) = sim {
            s.step(cycle_period.as_secs_f64());

            if !s.is_ball_on_plate() {
                info!("Ball has left the plate, stopping");
                break;
            }
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Cycle overran by {:.06} s",
                cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
            ),
        }

        num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    link.disable();

    info!("End of execution after {} cycles", num_cycles);

    Ok(())
}
