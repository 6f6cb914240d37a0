//! # Plate library
//!
//! Everything needed to balance a ball on a three-servo plate, usable from
//! the executable, the integration tests and the benchmarks.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Actuator link - sends servo demands to the plate's microcontroller
pub mod actuator;

/// Operator input - commands that drive calibration, targets and settings
pub mod input;

/// Plate control module - turns ball positions into servo demands
pub mod plate_ctrl;

/// Simulated plate - a stand-in for the camera and mechanics
pub mod sim;

/// Vision interface - ball detections and their filtering
pub mod vision;
