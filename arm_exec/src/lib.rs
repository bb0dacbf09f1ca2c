//! # Arm library.
//!
//! This library exposes the arm control modules to the executable and to the
//! integration tests.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Arm control module - builds the arm model and turns operator input and
/// pose restores into per-cycle actuator demands
pub mod arm_ctrl;

/// Global data store shared by the executable's cyclic processing
pub mod data_store;

/// Telecommand processor - dispatches parsed commands into the data store
pub mod tc_processor;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Target period of one cycle.
pub const CYCLE_PERIOD_S: f64 = 0.10;

/// Number of cycles per second
pub const CYCLE_FREQUENCY_HZ: f64 = 1.0 / CYCLE_PERIOD_S;
