//! # Telecommand processor module
//!
//! The telecommand processor handles parsed commands coming from any source.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};

// Internal
use crate::data_store::DataStore;
use world_if::eqpt::AxisInput;
use world_if::tc::ArmTc;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
///
/// Mutates the datastore to send commands to the arm controller.
pub fn exec(ds: &mut DataStore, tc: &ArmTc) {
    debug!("Executing {:?}", tc);

    match tc {
        ArmTc::Segment(name) => {
            if let Err(e) = ds.arm_ctrl.set_active_segment(name) {
                warn!("Cannot change segment: {}", e);
            }
        }
        ArmTc::Store(name) => {
            if let Err(e) = ds.arm_ctrl.store_pose(name, &ds.arm_sense) {
                warn!("Cannot store pose \"{}\": {}", name, e);
            }
        }
        ArmTc::Go(name) => ds.arm_ctrl.go(name),
        ArmTc::ToolMode(enabled) => ds.arm_ctrl.set_tool_mode(*enabled),
        ArmTc::Pause => ds.arm_ctrl.pause(&ds.arm_sense),
        ArmTc::Unpause => ds.arm_ctrl.unpause(),
        ArmTc::Reload => {
            if let Err(e) = ds.arm_ctrl.reload() {
                warn!("Cannot reload parameters: {}", e);
            }
        }
        ArmTc::Lock(locked) => ds.arm_ctrl.toggle_lock(*locked),
        ArmTc::Input(axis, value) => ds.operator_input.set(*axis, *value),
        ArmTc::InputClear => ds.operator_input = AxisInput::default(),
    }
}
