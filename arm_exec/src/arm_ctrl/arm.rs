//! In-memory model of a discovered arm.
//!
//! Built once by the topology builder at initialisation (and again on a
//! reload), then treated as mostly static: only axis assignments, inversion
//! flags and desired targets change after construction.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::joint::Joint;
use super::ArmCtrlError;
use world_if::eqpt::{ActuatorId, ActuatorKind};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Name of the implicit segment owning every joint not claimed by a named
/// segment.
pub const MAIN_SEGMENT: &str = "Main";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A named segment and the joints it owns.
#[derive(Debug, Clone)]
pub struct Segment {
    pub name: String,

    /// Indices into the arm's joint table, in discovery order
    pub joints: Vec<usize>,
}

/// A named group and the joints it owns.
#[derive(Debug, Clone)]
pub struct Group {
    pub name: String,

    /// Indices into the arm's joint table, in discovery order
    pub joints: Vec<usize>,
}

/// The discovered arm.
#[derive(Debug, Clone)]
pub struct Arm {
    /// Tag the arm was scanned under
    pub tag: String,

    /// Every reachable joint, in breadth-first discovery order
    pub joints: Vec<Joint>,

    /// Segment table. Index 0 is always the main segment.
    pub segments: Vec<Segment>,

    /// Group table, in name order
    pub groups: Vec<Group>,

    /// Index of the segment live input is routed to
    pub active_segment: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Arm {
    fn default() -> Self {
        Arm {
            tag: String::new(),
            joints: Vec::new(),
            segments: vec![Segment {
                name: MAIN_SEGMENT.to_string(),
                joints: Vec::new(),
            }],
            groups: Vec::new(),
            active_segment: 0,
        }
    }
}

impl Arm {
    /// Select the active segment by name.
    pub fn set_active_segment(&mut self, name: &str) -> Result<(), ArmCtrlError> {
        match self.segments.iter().position(|s| s.name == name) {
            Some(index) => {
                self.active_segment = index;
                Ok(())
            }
            None => Err(ArmCtrlError::UnknownSegment(name.to_string())),
        }
    }

    /// Name of the active segment.
    pub fn active_segment_name(&self) -> &str {
        &self.segments[self.active_segment].name
    }

    /// Effective chain distance of a joint.
    ///
    /// Grouped joints share their group's largest member distance, so a
    /// whole group moves in the same restore stage.
    pub fn effective_distance(&self, joint_index: usize) -> u32 {
        match self.joints[joint_index].group {
            Some(group_index) => self.groups[group_index]
                .joints
                .iter()
                .map(|&ji| self.joints[ji].distance)
                .max()
                .unwrap_or(self.joints[joint_index].distance),
            None => self.joints[joint_index].distance,
        }
    }

    /// Ids of every rotary joint.
    pub fn rotary_ids(&self) -> Vec<ActuatorId> {
        self.joints
            .iter()
            .filter(|j| j.kind == ActuatorKind::Rotary)
            .map(|j| j.act_id)
            .collect()
    }

    /// Find the joint wrapping the given actuator.
    pub fn joint_by_id(&self, id: ActuatorId) -> Option<&Joint> {
        self.joints.iter().find(|j| j.act_id == id)
    }

    /// Name of a joint's group, if it has one.
    pub fn group_name(&self, joint_index: usize) -> Option<&str> {
        self.joints[joint_index]
            .group
            .map(|gi| self.groups[gi].name.as_str())
    }
}
