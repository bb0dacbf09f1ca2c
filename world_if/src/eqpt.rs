//! # Arm Equipment Definitions
//!
//! Types shared between the control software and the world: actuator
//! identity and geometry, per-tick sense snapshots, per-tick demands, and
//! the logical control axes operator input is expressed in.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// Stable identity of an actuator in the world.
///
/// Ids survive for the life of the world and are never reused, so they are
/// safe to persist in pose snapshots.
pub type ActuatorId = u64;

/// Identity of a rigid sub-structure in the world.
///
/// Every actuator joins exactly two sub-structures: the one its base is
/// mounted on and the one its moving side carries.
pub type StructId = u32;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The kind of an actuator.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ActuatorKind {
    /// A rotary actuator. Positions are angles in degrees, [0, 360).
    Rotary,

    /// A linear actuator. Positions are extension offsets in units.
    Linear,
}

/// Mount direction of an actuator relative to the arm's reference frame,
/// quantised to the six axis-aligned directions.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MountDir {
    Up,
    Down,
    Left,
    Right,
    Forward,
    Backward,
}

/// Logical control axes a joint can be mapped onto.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Axis {
    RotX,
    RotY,
    MovX,
    MovY,
    MovZ,
    Roll,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Static description of one actuator, as returned by the topology scan.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ActuatorInfo {
    /// Stable id of the actuator
    pub id: ActuatorId,

    /// Display name of the actuator
    pub name: String,

    /// Kind of the actuator
    pub kind: ActuatorKind,

    /// The sub-structure the actuator's base is mounted on
    pub base_struct: StructId,

    /// The sub-structure the actuator's moving side carries
    pub head_struct: StructId,

    /// Mount direction relative to the arm's reference frame
    pub mount_dir: MountDir,

    /// Position limits (min, max), or `None` for an unlimited rotary
    /// actuator.
    ///
    /// Units: degrees for rotary actuators, offset units for linear ones.
    pub limits: Option<(f64, f64)>,
}

/// Live state of one actuator as sensed at the start of a tick.
#[derive(Serialize, Deserialize, Debug, Copy, Clone)]
pub struct ActuatorSense {
    /// Current position.
    ///
    /// Units: degrees for rotary actuators, offset units for linear ones.
    pub position: f64,

    /// Whether the actuator is mechanically locked (rotary only, always
    /// `false` for linear actuators).
    pub locked: bool,
}

/// Sense snapshot for the whole arm.
///
/// Actuators which have been destroyed in the world are simply absent from
/// the map; every consumer must treat absence as "do nothing".
#[derive(Debug, Clone, Default)]
pub struct ArmSense {
    pub actuators: HashMap<ActuatorId, ActuatorSense>,
}

/// Demands output by the controller for one tick, applied to the world by
/// the executable.
#[derive(Debug, Clone, Default)]
pub struct ArmDems {
    /// Demanded actuator velocities.
    ///
    /// Units: degrees/second for rotary actuators, units/second for linear
    /// ones.
    pub velocity: HashMap<ActuatorId, f64>,

    /// Demanded rotary lock state changes.
    pub lock: HashMap<ActuatorId, bool>,

    /// Name of a pose whose bound timer should fire this tick, if any.
    pub timer: Option<String>,

    /// Change to the tool-mode flag (suppresses unrelated vehicle controls
    /// in the world while active), if any.
    pub tool_mode: Option<bool>,
}

/// Operator input expressed in logical axes.
///
/// Values at or beyond the saturation magnitude of the input device are
/// digital "held key" inputs and carry sign only.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default)]
pub struct AxisInput {
    pub rot_x: f64,
    pub rot_y: f64,
    pub mov_x: f64,
    pub mov_y: f64,
    pub mov_z: f64,
    pub roll: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MountDir {
    /// Quantise a unit vector in the reference frame to the closest of the
    /// six axis-aligned directions.
    ///
    /// Frame: x right, y up, z backward.
    pub fn from_unit_vector(v: &Vector3<f64>) -> Self {
        let ax = v.x.abs();
        let ay = v.y.abs();
        let az = v.z.abs();

        if ax >= ay && ax >= az {
            if v.x >= 0.0 {
                MountDir::Right
            } else {
                MountDir::Left
            }
        } else if ay >= ax && ay >= az {
            if v.y >= 0.0 {
                MountDir::Up
            } else {
                MountDir::Down
            }
        } else if v.z >= 0.0 {
            MountDir::Backward
        } else {
            MountDir::Forward
        }
    }

    /// True for the directions which oppose nominal control-positive motion
    /// (down, left, forward).
    pub fn opposes_control_positive(&self) -> bool {
        matches!(self, MountDir::Down | MountDir::Left | MountDir::Forward)
    }
}

impl Axis {
    /// Parse an axis from its lowercase name, as used on the command
    /// surface.
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "rotx" => Some(Axis::RotX),
            "roty" => Some(Axis::RotY),
            "movx" => Some(Axis::MovX),
            "movy" => Some(Axis::MovY),
            "movz" => Some(Axis::MovZ),
            "roll" => Some(Axis::Roll),
            _ => None,
        }
    }

    /// Short display name of the axis.
    pub fn name(&self) -> &'static str {
        match self {
            Axis::RotX => "RotX",
            Axis::RotY => "RotY",
            Axis::MovX => "MovX",
            Axis::MovY => "MovY",
            Axis::MovZ => "MovZ",
            Axis::Roll => "Roll",
        }
    }
}

impl ArmSense {
    /// Get the sensed position of an actuator, or `None` if it no longer
    /// exists in the world.
    pub fn position(&self, id: ActuatorId) -> Option<f64> {
        self.actuators.get(&id).map(|s| s.position)
    }

    /// True if the actuator still exists in the world.
    pub fn exists(&self, id: ActuatorId) -> bool {
        self.actuators.contains_key(&id)
    }

    /// True if the actuator exists and is locked.
    pub fn is_locked(&self, id: ActuatorId) -> bool {
        self.actuators.get(&id).map(|s| s.locked).unwrap_or(false)
    }
}

impl AxisInput {
    /// Get the input value on the given logical axis.
    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::RotX => self.rot_x,
            Axis::RotY => self.rot_y,
            Axis::MovX => self.mov_x,
            Axis::MovY => self.mov_y,
            Axis::MovZ => self.mov_z,
            Axis::Roll => self.roll,
        }
    }

    /// Set the input value on the given logical axis.
    pub fn set(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::RotX => self.rot_x = value,
            Axis::RotY => self.rot_y = value,
            Axis::MovX => self.mov_x = value,
            Axis::MovY => self.mov_y = value,
            Axis::MovZ => self.mov_z = value,
            Axis::Roll => self.roll = value,
        }
    }

    /// True if any axis carries a non-zero input.
    pub fn is_active(&self) -> bool {
        self.rot_x != 0.0
            || self.rot_y != 0.0
            || self.mov_x != 0.0
            || self.mov_y != 0.0
            || self.mov_z != 0.0
            || self.roll != 0.0
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mount_dir_quantisation() {
        assert_eq!(
            MountDir::from_unit_vector(&Vector3::new(0.0, 1.0, 0.0)),
            MountDir::Up
        );
        assert_eq!(
            MountDir::from_unit_vector(&Vector3::new(0.1, -0.9, 0.0)),
            MountDir::Down
        );
        assert_eq!(
            MountDir::from_unit_vector(&Vector3::new(-0.8, 0.1, 0.2)),
            MountDir::Left
        );
        assert_eq!(
            MountDir::from_unit_vector(&Vector3::new(0.0, 0.0, -1.0)),
            MountDir::Forward
        );
    }

    #[test]
    fn test_control_positive_opposition() {
        assert!(MountDir::Down.opposes_control_positive());
        assert!(MountDir::Left.opposes_control_positive());
        assert!(MountDir::Forward.opposes_control_positive());
        assert!(!MountDir::Up.opposes_control_positive());
        assert!(!MountDir::Right.opposes_control_positive());
        assert!(!MountDir::Backward.opposes_control_positive());
    }
}
