//! # Data Store

use crate::arm_ctrl;
use world_if::eqpt::{ArmDems, ArmSense, AxisInput};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Session elapsed time
    pub elapsed_time_s: f64,

    // World input
    /// Sense snapshot taken at the start of this cycle
    pub arm_sense: ArmSense,

    /// Operator input on the logical axes. Unlike the per-cycle items this
    /// persists across cycles, input is held until changed.
    pub operator_input: AxisInput,

    // ArmCtrl
    pub arm_ctrl: arm_ctrl::ArmCtrl,
    pub arm_ctrl_output: ArmDems,
    pub arm_ctrl_status_rpt: arm_ctrl::StatusReport,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Clear items that need wiping at the start of each cycle.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        self.is_1_hz_cycle = self.num_cycles % (cycle_frequency_hz as u128) == 0;

        self.arm_sense = ArmSense::default();
        self.arm_ctrl_output = ArmDems::default();
        self.arm_ctrl_status_rpt = arm_ctrl::StatusReport::default();

        self.elapsed_time_s = util::session::get_elapsed_seconds();
    }
}
