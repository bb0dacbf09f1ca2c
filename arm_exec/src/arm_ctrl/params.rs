//! Parameters structures for ArmCtrl
//!
//! Every field carries a preset default so partial parameter files are
//! valid. Segment configuration applies to any joint without a group; for a
//! grouped joint the whole of the group's block applies instead, never a
//! mix of the two.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use std::collections::BTreeMap;
use world_if::eqpt::{ActuatorKind, Axis};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Arm control.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Tag identifying the arm to scan for in the world
    #[serde(default = "default_arm_tag")]
    pub arm_tag: String,

    /// Whether pausing also locks every rotary actuator
    #[serde(default = "default_true")]
    pub lock_on_pause: bool,

    /// Whether pose restores run staged (tip first) rather than all at once
    #[serde(default = "default_true")]
    pub staged_restore: bool,

    /// Path of the pose snapshot store, relative to the software root
    #[serde(default = "default_pose_file")]
    pub pose_file: String,

    /// Name of the scene parameter file describing the simulated world
    #[serde(default = "default_scene_file")]
    pub scene_file: String,

    /// Configuration applied to segments without an entry in `segments`
    #[serde(default)]
    pub default_segment: SegmentConfig,

    /// Per-segment configuration overrides
    #[serde(default)]
    pub segments: BTreeMap<String, SegmentConfig>,

    /// Per-group configuration blocks
    #[serde(default)]
    pub groups: BTreeMap<String, GroupConfig>,
}

/// Configuration defaults shared by the joints of one segment.
#[derive(Debug, Clone, Deserialize)]
pub struct SegmentConfig {
    /// Motion parameters for rotary joints
    #[serde(default)]
    pub rot: RotMotionParams,

    /// Motion parameters for linear joints
    #[serde(default)]
    pub lin: LinMotionParams,

    /// Which logical axes may be claimed by this segment's joints
    #[serde(default)]
    pub enabled: AxisEnable,

    /// Invert operator input for rotary joints
    #[serde(default)]
    pub invert_rot: bool,

    /// Invert operator input for linear joints
    #[serde(default)]
    pub invert_lin: bool,
}

/// Motion parameters for rotary joints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RotMotionParams {
    /// Largest target step per tick of full input.
    ///
    /// Units: degrees
    #[serde(default = "default_rot_sensitivity")]
    pub sensitivity: f64,

    /// Velocity command saturation.
    ///
    /// Units: degrees/second
    #[serde(default = "default_rot_max_speed")]
    pub max_speed: f64,

    /// Bound on how far the target may lead the current position, as a
    /// multiple of `max_speed`. Zero disables the bound.
    #[serde(default = "default_max_offset_factor")]
    pub max_offset_factor: f64,
}

/// Motion parameters for linear joints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LinMotionParams {
    /// Largest target step per tick of full input.
    ///
    /// Units: offset units
    #[serde(default = "default_lin_sensitivity")]
    pub sensitivity: f64,

    /// Velocity command saturation.
    ///
    /// Units: units/second
    #[serde(default = "default_lin_max_speed")]
    pub max_speed: f64,

    /// Bound on how far the target may lead the current position, as a
    /// multiple of `max_speed`. Zero disables the bound.
    #[serde(default = "default_max_offset_factor")]
    pub max_offset_factor: f64,
}

/// Per-axis enable flags for axis assignment.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AxisEnable {
    #[serde(default = "default_true")]
    pub rot_x: bool,
    #[serde(default = "default_true")]
    pub rot_y: bool,
    #[serde(default = "default_true")]
    pub mov_x: bool,
    #[serde(default = "default_true")]
    pub mov_y: bool,
    #[serde(default = "default_true")]
    pub mov_z: bool,
    #[serde(default = "default_true")]
    pub roll: bool,
}

/// Configuration block for one group.
///
/// A group overrides the segment configuration wholesale for its members.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupConfig {
    #[serde(flatten)]
    pub config: SegmentConfig,

    /// Mirrored groups derive opposing signs for symmetric members
    #[serde(default)]
    pub mirrored: bool,
}

/// Resolved motion triple for one joint, independent of kind.
#[derive(Debug, Clone, Copy)]
pub struct MotionCfg {
    pub sensitivity: f64,
    pub max_speed: f64,
    pub max_offset_factor: f64,
}

// ---------------------------------------------------------------------------
// DEFAULT VALUE FUNCTIONS
// ---------------------------------------------------------------------------

fn default_arm_tag() -> String {
    "ARM".to_string()
}

fn default_true() -> bool {
    true
}

fn default_pose_file() -> String {
    "poses.json".to_string()
}

fn default_scene_file() -> String {
    "scene.toml".to_string()
}

fn default_rot_sensitivity() -> f64 {
    2.0
}

fn default_rot_max_speed() -> f64 {
    30.0
}

fn default_lin_sensitivity() -> f64 {
    0.05
}

fn default_lin_max_speed() -> f64 {
    0.5
}

fn default_max_offset_factor() -> f64 {
    2.0
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Params {
            arm_tag: default_arm_tag(),
            lock_on_pause: default_true(),
            staged_restore: default_true(),
            pose_file: default_pose_file(),
            scene_file: default_scene_file(),
            default_segment: SegmentConfig::default(),
            segments: BTreeMap::new(),
            groups: BTreeMap::new(),
        }
    }
}

impl Default for SegmentConfig {
    fn default() -> Self {
        SegmentConfig {
            rot: RotMotionParams::default(),
            lin: LinMotionParams::default(),
            enabled: AxisEnable::default(),
            invert_rot: false,
            invert_lin: false,
        }
    }
}

impl Default for RotMotionParams {
    fn default() -> Self {
        RotMotionParams {
            sensitivity: default_rot_sensitivity(),
            max_speed: default_rot_max_speed(),
            max_offset_factor: default_max_offset_factor(),
        }
    }
}

impl Default for LinMotionParams {
    fn default() -> Self {
        LinMotionParams {
            sensitivity: default_lin_sensitivity(),
            max_speed: default_lin_max_speed(),
            max_offset_factor: default_max_offset_factor(),
        }
    }
}

impl Default for AxisEnable {
    fn default() -> Self {
        AxisEnable {
            rot_x: true,
            rot_y: true,
            mov_x: true,
            mov_y: true,
            mov_z: true,
            roll: true,
        }
    }
}

impl AxisEnable {
    /// True if the given logical axis may be claimed.
    pub fn is_enabled(&self, axis: Axis) -> bool {
        match axis {
            Axis::RotX => self.rot_x,
            Axis::RotY => self.rot_y,
            Axis::MovX => self.mov_x,
            Axis::MovY => self.mov_y,
            Axis::MovZ => self.mov_z,
            Axis::Roll => self.roll,
        }
    }
}

impl SegmentConfig {
    /// Get the motion triple for the given joint kind.
    pub fn motion_cfg(&self, kind: ActuatorKind) -> MotionCfg {
        match kind {
            ActuatorKind::Rotary => MotionCfg {
                sensitivity: self.rot.sensitivity,
                max_speed: self.rot.max_speed,
                max_offset_factor: self.rot.max_offset_factor,
            },
            ActuatorKind::Linear => MotionCfg {
                sensitivity: self.lin.sensitivity,
                max_speed: self.lin.max_speed,
                max_offset_factor: self.lin.max_offset_factor,
            },
        }
    }

    /// Get the input invert flag for the given joint kind.
    pub fn invert_flag(&self, kind: ActuatorKind) -> bool {
        match kind {
            ActuatorKind::Rotary => self.invert_rot,
            ActuatorKind::Linear => self.invert_lin,
        }
    }
}

impl Params {
    /// Resolve the effective configuration block for a joint.
    ///
    /// A grouped joint takes the whole of its group's block; otherwise the
    /// segment's block (or the default block for segments without an entry)
    /// applies.
    pub fn config_for(&self, segment: &str, group: Option<&str>) -> &SegmentConfig {
        if let Some(group_name) = group {
            if let Some(group_config) = self.groups.get(group_name) {
                return &group_config.config;
            }
        }

        self.segments.get(segment).unwrap_or(&self.default_segment)
    }

    /// True if the named group is flagged as mirrored.
    pub fn is_group_mirrored(&self, group: &str) -> bool {
        self.groups.get(group).map(|g| g.mirrored).unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
