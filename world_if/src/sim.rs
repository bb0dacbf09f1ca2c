//! # Simulated world
//!
//! A deterministic stand-in for the physics world the arm lives in. Scenes
//! are described in TOML (see `params/scene.toml`), and the world integrates
//! demanded velocities into positions each step. The executable and the
//! integration tests both drive this world; nothing in the control core
//! depends on it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::{debug, warn};
use nalgebra::Vector3;
use serde::Deserialize;
use std::collections::BTreeMap;

// Internal
use crate::eqpt::{
    ActuatorId, ActuatorInfo, ActuatorKind, ActuatorSense, ArmDems, ArmSense, MountDir, StructId,
};
use crate::scan::TopologyScan;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Extension limits applied to linear actuators whose scene entry gives none.
const DEFAULT_LINEAR_LIMITS: (f64, f64) = (0.0, 10.0);

// ------------------------------------------------------------------------------------------------
// SCENE DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// A simulated scene, deserialised from a scene parameter file.
#[derive(Debug, Clone, Deserialize)]
pub struct SimScene {
    /// Tag identifying the arm within the scene
    #[serde(default = "default_tag")]
    pub tag: String,

    /// The sub-structure carrying the arm's reference point
    pub reference_struct: StructId,

    /// Every actuator declared as part of the arm
    pub actuators: Vec<SimActuator>,

    /// Named segment sub-groups
    #[serde(default)]
    pub segments: BTreeMap<String, Vec<ActuatorId>>,

    /// Named group sub-groups
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<ActuatorId>>,

    /// Timers bound to pose names
    #[serde(default)]
    pub timers: BTreeMap<String, SimTimer>,
}

/// One actuator in a simulated scene.
#[derive(Debug, Clone, Deserialize)]
pub struct SimActuator {
    pub id: ActuatorId,

    #[serde(default)]
    pub name: String,

    pub kind: ActuatorKind,

    pub base_struct: StructId,

    pub head_struct: StructId,

    /// Mount direction, already quantised. Scenes may give `mount_vec`
    /// instead.
    #[serde(default)]
    pub mount_dir: Option<MountDir>,

    /// Raw mount vector in the reference frame, quantised to the closest
    /// axis-aligned direction. Ignored when `mount_dir` is given.
    #[serde(default)]
    pub mount_vec: Option<[f64; 3]>,

    /// Position limits (min, max). Rotary actuators without limits turn
    /// freely; linear actuators without limits get the defaults.
    #[serde(default)]
    pub limits: Option<(f64, f64)>,

    /// Initial position
    #[serde(default)]
    pub position: f64,

    /// Initial lock state (rotary only)
    #[serde(default)]
    pub locked: bool,
}

/// A timer bound to a pose name.
#[derive(Debug, Clone, Deserialize)]
pub struct SimTimer {
    /// A one-shot timer triggers immediately when fired; otherwise firing
    /// starts the countdown.
    #[serde(default)]
    pub one_shot: bool,

    /// Countdown duration for non one-shot timers.
    ///
    /// Units: seconds
    #[serde(default = "default_countdown_s")]
    pub countdown_s: f64,
}

fn default_tag() -> String {
    "ARM".to_string()
}

fn default_countdown_s() -> f64 {
    10.0
}

// ------------------------------------------------------------------------------------------------
// WORLD DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// The simulated world.
pub struct SimWorld {
    tag: String,
    reference_struct: StructId,
    acts: BTreeMap<ActuatorId, SimActState>,
    segments: BTreeMap<String, Vec<ActuatorId>>,
    groups: BTreeMap<String, Vec<ActuatorId>>,
    timers: BTreeMap<String, TimerState>,
    display: String,
    tool_mode: bool,
}

struct SimActState {
    info: ActuatorInfo,
    position: f64,
    velocity: f64,
    locked: bool,
    destroyed: bool,
}

struct TimerState {
    one_shot: bool,
    countdown_s: f64,
    remaining: Option<f64>,
    fire_count: u32,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimWorld {
    /// Build a world from a scene description.
    pub fn new(scene: SimScene) -> Self {
        let mut acts = BTreeMap::new();

        for act in scene.actuators {
            let limits = match act.kind {
                ActuatorKind::Rotary => act.limits,
                ActuatorKind::Linear => Some(act.limits.unwrap_or(DEFAULT_LINEAR_LIMITS)),
            };

            let name = if act.name.is_empty() {
                format!("act_{}", act.id)
            } else {
                act.name
            };

            let mount_dir = match (act.mount_dir, act.mount_vec) {
                (Some(dir), _) => dir,
                (None, Some(v)) => {
                    MountDir::from_unit_vector(&Vector3::new(v[0], v[1], v[2]))
                }
                (None, None) => {
                    warn!(
                        "Actuator {} declares neither mount_dir nor mount_vec, skipping",
                        act.id
                    );
                    continue;
                }
            };

            acts.insert(
                act.id,
                SimActState {
                    info: ActuatorInfo {
                        id: act.id,
                        name,
                        kind: act.kind,
                        base_struct: act.base_struct,
                        head_struct: act.head_struct,
                        mount_dir,
                        limits,
                    },
                    position: act.position,
                    velocity: 0.0,
                    locked: act.locked,
                    destroyed: false,
                },
            );
        }

        let timers = scene
            .timers
            .into_iter()
            .map(|(name, t)| {
                (
                    name,
                    TimerState {
                        one_shot: t.one_shot,
                        countdown_s: t.countdown_s,
                        remaining: None,
                        fire_count: 0,
                    },
                )
            })
            .collect();

        SimWorld {
            tag: scene.tag,
            reference_struct: scene.reference_struct,
            acts,
            segments: scene.segments,
            groups: scene.groups,
            timers,
            display: String::new(),
            tool_mode: false,
        }
    }

    /// Perform a topology scan of the arm.
    pub fn scan(&self) -> TopologyScan {
        TopologyScan {
            tag: self.tag.clone(),
            reference_struct: self.reference_struct,
            actuators: self
                .acts
                .values()
                .filter(|a| !a.destroyed)
                .map(|a| a.info.clone())
                .collect(),
            segments: self.segments.clone(),
            groups: self.groups.clone(),
        }
    }

    /// Sense the current state of every surviving actuator.
    pub fn sense(&self) -> ArmSense {
        let mut sense = ArmSense::default();

        for (id, act) in self.acts.iter().filter(|(_, a)| !a.destroyed) {
            sense.actuators.insert(
                *id,
                ActuatorSense {
                    position: act.position,
                    locked: act.locked,
                },
            );
        }

        sense
    }

    /// Apply a set of demands to the world.
    ///
    /// Velocity demands are per-cycle: an actuator without a fresh demand
    /// holds still, standing in for the damping a physical actuator gives.
    /// Demands for destroyed actuators are dropped silently.
    pub fn apply(&mut self, dems: &ArmDems) {
        for act in self.acts.values_mut() {
            act.velocity = 0.0;
        }

        for (id, vel) in dems.velocity.iter() {
            if let Some(act) = self.acts.get_mut(id) {
                if !act.destroyed {
                    act.velocity = *vel;
                }
            }
        }

        for (id, locked) in dems.lock.iter() {
            match self.acts.get_mut(id) {
                Some(act) if !act.destroyed => {
                    if act.info.kind == ActuatorKind::Rotary {
                        act.locked = *locked;
                    } else {
                        warn!("Lock demand for linear actuator {} ignored", id);
                    }
                }
                _ => (),
            }
        }

        if let Some(name) = &dems.timer {
            self.fire_timer(name);
        }

        if let Some(tool_mode) = dems.tool_mode {
            self.tool_mode = tool_mode;
        }
    }

    /// Advance the world by `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        for act in self.acts.values_mut().filter(|a| !a.destroyed) {
            // A locked rotary actuator holds its position regardless of the
            // demanded velocity
            if act.locked && act.info.kind == ActuatorKind::Rotary {
                continue;
            }

            let raw = act.position + act.velocity * dt;

            act.position = match act.info.limits {
                Some((min, max)) => raw.max(min).min(max),
                None => raw.rem_euclid(360.0),
            };
        }

        // Tick countdown timers
        for (name, timer) in self.timers.iter_mut() {
            if let Some(remaining) = timer.remaining {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    debug!("Timer \"{}\" countdown elapsed, triggering", name);
                    timer.fire_count += 1;
                    timer.remaining = None;
                } else {
                    timer.remaining = Some(remaining);
                }
            }
        }
    }

    /// Remove an actuator from the world, as if its physical block had been
    /// destroyed.
    pub fn destroy(&mut self, id: ActuatorId) {
        if let Some(act) = self.acts.get_mut(&id) {
            act.destroyed = true;
            act.velocity = 0.0;
        }
    }

    /// Set the text shown on the arm's status display.
    pub fn set_display(&mut self, text: String) {
        self.display = text;
    }

    /// Get the current status display text.
    pub fn display(&self) -> &str {
        &self.display
    }

    /// Get the current tool-mode flag.
    pub fn tool_mode(&self) -> bool {
        self.tool_mode
    }

    /// Get the position of an actuator, or `None` if destroyed or unknown.
    pub fn position(&self, id: ActuatorId) -> Option<f64> {
        self.acts
            .get(&id)
            .filter(|a| !a.destroyed)
            .map(|a| a.position)
    }

    /// Directly set the position of an actuator.
    pub fn set_position(&mut self, id: ActuatorId, position: f64) {
        if let Some(act) = self.acts.get_mut(&id) {
            act.position = position;
        }
    }

    /// True if the actuator exists and is locked.
    pub fn is_locked(&self, id: ActuatorId) -> bool {
        self.acts
            .get(&id)
            .filter(|a| !a.destroyed)
            .map(|a| a.locked)
            .unwrap_or(false)
    }

    /// Number of times the named timer has triggered.
    pub fn timer_fire_count(&self, name: &str) -> u32 {
        self.timers.get(name).map(|t| t.fire_count).unwrap_or(0)
    }

    /// True if the named timer is currently counting down.
    pub fn timer_counting(&self, name: &str) -> bool {
        self.timers
            .get(name)
            .map(|t| t.remaining.is_some())
            .unwrap_or(false)
    }

    fn fire_timer(&mut self, name: &str) {
        match self.timers.get_mut(name) {
            Some(timer) => {
                if timer.one_shot {
                    debug!("Timer \"{}\" triggered", name);
                    timer.fire_count += 1;
                } else {
                    debug!("Timer \"{}\" countdown started", name);
                    timer.remaining = Some(timer.countdown_s);
                }
            }
            // No timer bound to this pose name
            None => (),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashMap;

    fn single_rotary_scene() -> SimScene {
        SimScene {
            tag: "ARM".to_string(),
            reference_struct: 0,
            actuators: vec![SimActuator {
                id: 1,
                name: "base".to_string(),
                kind: ActuatorKind::Rotary,
                base_struct: 0,
                head_struct: 1,
                mount_dir: Some(MountDir::Up),
                mount_vec: None,
                limits: None,
                position: 350.0,
                locked: false,
            }],
            segments: BTreeMap::new(),
            groups: BTreeMap::new(),
            timers: BTreeMap::new(),
        }
    }

    #[test]
    fn test_step_integrates_and_wraps() {
        let mut world = SimWorld::new(single_rotary_scene());

        let mut dems = ArmDems::default();
        dems.velocity = {
            let mut m = HashMap::new();
            m.insert(1, 20.0);
            m
        };
        world.apply(&dems);
        world.step(1.0);

        // 350 + 20 wraps to 10
        assert!((world.position(1).unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_locked_rotary_holds() {
        let mut world = SimWorld::new(single_rotary_scene());

        let mut dems = ArmDems::default();
        dems.velocity.insert(1, 20.0);
        dems.lock.insert(1, true);
        world.apply(&dems);
        world.step(1.0);

        assert!((world.position(1).unwrap() - 350.0).abs() < 1e-9);
    }

    #[test]
    fn test_destroyed_actuator_absent_from_sense() {
        let mut world = SimWorld::new(single_rotary_scene());
        world.destroy(1);

        assert!(!world.sense().exists(1));
        assert_eq!(world.position(1), None);
    }

    #[test]
    fn test_mount_vec_quantised_in_scan() {
        let scene: SimScene = toml::from_str(
            r#"
            tag = "ARM"
            reference_struct = 0

            [[actuators]]
            id = 1
            kind = "Rotary"
            base_struct = 0
            head_struct = 1
            mount_vec = [-0.9, 0.1, 0.0]

            [[actuators]]
            id = 2
            kind = "Linear"
            base_struct = 1
            head_struct = 2
            "#,
        )
        .unwrap();

        let world = SimWorld::new(scene);
        let scan = world.scan();

        let act = scan.actuators.iter().find(|a| a.id == 1).unwrap();
        assert_eq!(act.mount_dir, MountDir::Left);

        // Neither mount_dir nor mount_vec drops the actuator
        assert!(scan.actuators.iter().find(|a| a.id == 2).is_none());
    }
}
