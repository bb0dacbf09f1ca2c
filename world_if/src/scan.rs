//! # Topology scan data
//!
//! The world answers a scan request for a tagged arm with the full set of
//! declared actuators (the root block-group) plus the named segment and
//! group sub-groups the operator has declared. The control software turns
//! this into its joint model at startup; the scan itself carries no
//! distances or axis assignments.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::eqpt::{ActuatorId, ActuatorInfo, StructId};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Result of a topology scan for one tagged arm.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TopologyScan {
    /// The tag the scan was made for
    pub tag: String,

    /// The sub-structure carrying the arm's reference point
    pub reference_struct: StructId,

    /// Every actuator declared as part of the arm
    pub actuators: Vec<ActuatorInfo>,

    /// Named segment sub-groups, mapping segment name to member actuators
    pub segments: BTreeMap<String, Vec<ActuatorId>>,

    /// Named group sub-groups, mapping group name to member actuators
    pub groups: BTreeMap<String, Vec<ActuatorId>>,
}
