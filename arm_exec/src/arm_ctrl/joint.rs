//! Joint motion engine
//!
//! A joint wraps one rotary or linear actuator and computes per-tick
//! velocity commands that track a persistent desired target. The law is a
//! saturating proportional one rather than a full PID: the physics
//! actuators already damp velocity, so error halving near the target with
//! full-speed approach from far away is sufficient and does not overshoot.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use util::maths::{clamp, get_ang_dist_360, wrap_360};

// Internal
use super::params::MotionCfg;
use super::{INPUT_SATURATION, POS_TOLERANCE};
use world_if::eqpt::{ActuatorId, ActuatorInfo, ActuatorKind, Axis, MountDir};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One joint of the arm.
#[derive(Debug, Clone)]
pub struct Joint {
    /// Stable id of the wrapped actuator
    pub act_id: ActuatorId,

    /// Display name of the wrapped actuator
    pub name: String,

    /// Kind of the wrapped actuator
    pub kind: ActuatorKind,

    /// Mount direction relative to the arm's reference frame
    pub mount_dir: MountDir,

    /// Hop count from the arm's root along the actuation chain
    pub distance: u32,

    /// Index of the owning segment in the arm's segment table
    pub segment: usize,

    /// Index of the owning group in the arm's group table, if any
    pub group: Option<usize>,

    /// Assigned logical control axis, or `None` if excluded from live input
    pub axis: Option<Axis>,

    /// Input opposes nominal control-positive motion for this mount
    pub inverted: bool,

    /// Sign flipped for mirrored-group symmetry
    pub block_inverted: bool,

    /// Actuator position limits (min, max), `None` for free rotation.
    ///
    /// Units: degrees for rotary, offset units for linear.
    pub limits: Option<(f64, f64)>,

    /// Persistent desired target, seeded from the first sensed position.
    ///
    /// Units: degrees for rotary, offset units for linear.
    pub desired: Option<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Joint {
    /// Create a joint for a scanned actuator at the given chain distance.
    ///
    /// Segment, group and axis data are filled in by the topology builder
    /// and the axis assigner.
    pub fn new(info: &ActuatorInfo, distance: u32) -> Self {
        Joint {
            act_id: info.id,
            name: info.name.clone(),
            kind: info.kind,
            mount_dir: info.mount_dir,
            distance,
            segment: 0,
            group: None,
            axis: None,
            inverted: false,
            block_inverted: false,
            limits: info.limits,
            desired: None,
        }
    }

    /// Incremental control: step the desired target by the given raw input
    /// and return the velocity command for this tick.
    ///
    /// `invert_flag` is the configuration-level input inversion for the
    /// joint's kind. `current` is the actuator position sensed this tick.
    pub fn move_by(
        &mut self,
        raw: f64,
        invert_flag: bool,
        cfg: &MotionCfg,
        current: f64,
    ) -> f64 {
        let raw = normalise_input(raw);

        match self.kind {
            ActuatorKind::Rotary => {
                let step = clamp(raw, -cfg.sensitivity, cfg.sensitivity)
                    * flag_sign(self.inverted)
                    * flag_sign(invert_flag)
                    * flag_sign(self.block_inverted);

                let mut desired = wrap_360(self.desired.unwrap_or(current) + step);

                if let Some((min, max)) = self.limits {
                    desired = clamp(desired, min, max);
                }

                // Bound how far the target can lead the position, which
                // prevents setpoint windup while input is held
                if cfg.max_offset_factor > 0.0 {
                    let lead = cfg.max_offset_factor * cfg.max_speed;
                    let err = get_ang_dist_360(current, desired);
                    if err.abs() > lead {
                        desired = wrap_360(current + lead * err.signum());
                    }
                }

                self.desired = Some(desired);
                self.rot_velocity(cfg, current)
            }
            ActuatorKind::Linear => {
                let step =
                    raw * cfg.sensitivity * flag_sign(self.inverted) * flag_sign(invert_flag);

                // Block inversion flips the base sign of the step
                let target = if self.block_inverted {
                    current - step
                } else {
                    current + step
                };

                let (min, max) = self.limits.unwrap_or((f64::NEG_INFINITY, f64::INFINITY));
                let mut desired = clamp(target, min, max);

                if cfg.max_offset_factor > 0.0 {
                    let lead = cfg.max_offset_factor * cfg.max_speed;
                    desired = clamp(desired, current - lead, current + lead);
                }

                self.desired = Some(desired);
                self.lin_velocity(cfg, current)
            }
        }
    }

    /// Direct control: set the desired target and return the velocity
    /// command for this tick. Used by pose restore.
    pub fn move_to_target(&mut self, value: f64, cfg: &MotionCfg, current: f64) -> f64 {
        match self.kind {
            ActuatorKind::Rotary => {
                self.desired = Some(wrap_360(value));
                self.rot_velocity(cfg, current)
            }
            ActuatorKind::Linear => {
                self.desired = Some(value);
                self.lin_velocity(cfg, current)
            }
        }
    }

    /// True if the sensed position is within tolerance of the given value.
    pub fn is_at_position(&self, value: f64, current: f64) -> bool {
        match self.kind {
            ActuatorKind::Rotary => {
                get_ang_dist_360(current, wrap_360(value)).abs() <= POS_TOLERANCE
            }
            ActuatorKind::Linear => (value - current).abs() <= POS_TOLERANCE,
        }
    }

    /// Velocity command tracking the current desired target.
    fn rot_velocity(&self, cfg: &MotionCfg, current: f64) -> f64 {
        let desired = match self.desired {
            Some(d) => d,
            None => return 0.0,
        };

        let error = get_ang_dist_360(current, desired);

        if error.abs() <= POS_TOLERANCE {
            0.0
        } else if error.abs() < cfg.max_speed {
            error * 0.5
        } else {
            cfg.max_speed * error.signum()
        }
    }

    /// Velocity command tracking the current desired target.
    fn lin_velocity(&self, cfg: &MotionCfg, current: f64) -> f64 {
        let desired = match self.desired {
            Some(d) => d,
            None => return 0.0,
        };

        let error = desired - current;

        if error.abs() < POS_TOLERANCE {
            0.0
        } else {
            clamp(error, -cfg.max_speed, cfg.max_speed)
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Raw input at or beyond the device's saturation magnitude is a digital
/// "held key" and carries sign only.
fn normalise_input(raw: f64) -> f64 {
    if raw.abs() >= INPUT_SATURATION {
        raw.signum()
    } else {
        raw
    }
}

/// Sign multiplier for an inversion flag.
fn flag_sign(flag: bool) -> f64 {
    if flag {
        -1.0
    } else {
        1.0
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
