//! Arm control module
//!
//! The heart of the software: builds the arm model from a topology scan,
//! routes operator input to the active segment, and sequences pose
//! restores. The module is pure with respect to the world, taking a sense
//! snapshot in and producing demands out each cycle.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod arm;
mod axis_assign;
mod joint;
mod params;
mod pose;
mod restore;
mod state;
mod topology;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use arm::*;
pub use joint::Joint;
pub use params::*;
pub use pose::*;
pub use state::*;
pub use topology::TopologyError;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Position tolerance for "at position" checks.
///
/// Units: degrees for rotary joints, offset units for linear ones.
pub const POS_TOLERANCE: f64 = 0.1;

/// Input magnitude at or beyond which raw operator input is treated as a
/// digital held key, carrying sign only.
pub const INPUT_SATURATION: f64 = 1.0;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during ArmCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum ArmCtrlError {
    #[error("No segment named \"{0}\" exists on this arm")]
    UnknownSegment(String),
}
