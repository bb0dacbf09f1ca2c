//! # World interface crate.
//!
//! Provides the common interface between the arm control software and the
//! physics world it drives: equipment types, topology scan data,
//! telecommand definitions and a deterministic simulated world used by the
//! executable and by tests.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Equipment definitions (actuators, senses, demands, logical axes)
pub mod eqpt;

/// Topology scan data returned by the world for a tagged arm
pub mod scan;

/// Simulated world
pub mod sim;

/// Telecommand definitions and parsing
pub mod tc;
