//! Implementations for the ArmCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

// Internal
use super::{axis_assign, restore, topology, Arm, ArmCtrlError, Params, Pose, PoseStore,
    PoseStoreError, TopologyError};
use util::{host, module::State, params, session::Session};
use world_if::eqpt::{ActuatorId, ArmDems, ArmSense, AxisInput};
use world_if::scan::TopologyScan;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Arm control module state
pub struct ArmCtrl {
    pub(crate) params: Params,

    pub(crate) arm: Arm,

    pub(crate) poses: PoseStore,

    pub(crate) report: StatusReport,

    /// True while the operator holds the arm paused
    manually_paused: bool,

    /// True while the controller has paused itself for a restore
    auto_paused: bool,

    /// True while the restore sequencer is running
    restoring: bool,

    /// Name of the pose being restored, if any
    restore_target: Option<String>,

    /// Rotary actuators which were already locked when the pause began.
    /// These keep their lock across the unpause.
    prelocked: HashSet<ActuatorId>,

    /// Lock state changes to emit on the next cycle
    pending_locks: Vec<(ActuatorId, bool)>,

    /// Tool-mode change to emit on the next cycle
    pending_tool_mode: Option<bool>,

    /// Parameter file to re-read on a reload, `None` for controllers built
    /// directly from parts
    params_file: Option<&'static str>,
}

/// Initialisation data for ArmCtrl.
pub struct ArmCtrlInit {
    /// Name of the parameter file under the software root's params dir
    pub params_file: &'static str,

    /// Result of the world's topology scan
    pub scan: TopologyScan,
}

/// Input data to ArmCtrl.
#[derive(Default)]
pub struct InputData {
    /// Operator input on the logical axes, held until changed
    pub axes: AxisInput,

    /// Sense snapshot taken at the start of this cycle
    pub sense: ArmSense,
}

/// Controller state, as visible in the status report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CtrlState {
    Normal,
    ManuallyPaused,
    AutoPaused,
    Restoring,
}

/// Status report for ArmCtrl processing.
#[derive(Clone, Debug, Default, Serialize)]
pub struct StatusReport {
    pub state: CtrlState,

    pub active_segment: String,

    /// Name of the pose being restored, if any
    pub restoring_pose: Option<String>,

    /// Effective distance of the restore stage driven this cycle, staged
    /// restores only
    pub active_stage: Option<u32>,

    /// Number of joints commanded by live input this cycle
    pub joints_driven: usize,

    /// Number of joints explicitly stopped this cycle
    pub joints_stopped: usize,
}

/// Errors which can occur during ArmCtrl initialisation.
#[derive(Debug, Error)]
pub enum ArmCtrlInitError {
    #[error("Cannot load ArmCtrl parameters: {0}")]
    Params(#[from] params::LoadError),

    #[error("Cannot build the arm model: {0}")]
    Topology(#[from] TopologyError),

    #[error("Cannot load the pose store: {0}")]
    PoseStore(#[from] PoseStoreError),

    #[error("Cannot locate the software root: {0}")]
    Host(#[from] host::HostError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for CtrlState {
    fn default() -> Self {
        CtrlState::Normal
    }
}

impl Default for ArmCtrl {
    fn default() -> Self {
        ArmCtrl {
            params: Params::default(),
            arm: Arm::default(),
            poses: PoseStore::in_memory(),
            report: StatusReport::default(),
            manually_paused: false,
            auto_paused: false,
            restoring: false,
            restore_target: None,
            prelocked: HashSet::new(),
            pending_locks: Vec::new(),
            pending_tool_mode: None,
            params_file: None,
        }
    }
}

impl State for ArmCtrl {
    type InitData = ArmCtrlInit;
    type InitError = ArmCtrlInitError;

    type InputData = InputData;
    type OutputData = ArmDems;
    type StatusReport = StatusReport;
    type ProcError = ArmCtrlError;

    /// Initialise the ArmCtrl module.
    ///
    /// Loads the parameters, builds the arm model from the topology scan and
    /// opens the pose store.
    fn init(
        &mut self,
        init_data: Self::InitData,
        _session: &Session,
    ) -> Result<(), Self::InitError> {
        self.params = params::load(init_data.params_file)?;
        self.params_file = Some(init_data.params_file);

        self.arm = topology::build(&init_data.scan)?;
        axis_assign::assign(&mut self.arm, &self.params);

        let mut pose_path = host::get_arm_sw_root()?;
        pose_path.push(&self.params.pose_file);
        self.poses = PoseStore::load_or_new(pose_path)?;

        Ok(())
    }

    /// Perform cyclic processing of ArmCtrl.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let mut dems = ArmDems::default();

        self.report = StatusReport {
            active_segment: self.arm.active_segment_name().to_string(),
            restoring_pose: self.restore_target.clone(),
            ..StatusReport::default()
        };

        // Deferred lock and tool-mode changes go out first
        for (id, locked) in self.pending_locks.drain(..) {
            dems.lock.insert(id, locked);
        }
        if let Some(tool_mode) = self.pending_tool_mode.take() {
            dems.tool_mode = Some(tool_mode);
        }

        // Joints created by the scan carry no position, so desired targets
        // are seeded from the first sense snapshot
        for joint in self.arm.joints.iter_mut() {
            if joint.desired.is_none() {
                joint.desired = input_data.sense.position(joint.act_id);
            }
        }

        if self.manually_paused || (self.auto_paused && !self.restoring) {
            // Paused, the arm holds still and no demands are issued
        } else if input_data.axes.is_active() && !self.restoring {
            self.route_input(&input_data.axes, &input_data.sense, &mut dems);
        } else if !self.restoring {
            self.stop_all(&input_data.sense, &mut dems);
        } else {
            self.restore_step(&input_data.sense, &mut dems);
        }

        self.report.state = self.current_state();
        self.report.restoring_pose = self.restore_target.clone();

        Ok((dems, self.report.clone()))
    }
}

impl ArmCtrl {
    /// Build a controller directly from parts, without touching the
    /// filesystem. Used in tests.
    pub fn from_parts(
        params: Params,
        scan: &TopologyScan,
        poses: PoseStore,
    ) -> Result<Self, TopologyError> {
        let mut arm = topology::build(scan)?;
        axis_assign::assign(&mut arm, &params);

        Ok(ArmCtrl {
            params,
            arm,
            poses,
            ..ArmCtrl::default()
        })
    }

    /// The built arm model.
    pub fn arm(&self) -> &Arm {
        &self.arm
    }

    /// Current controller state.
    pub fn current_state(&self) -> CtrlState {
        if self.manually_paused {
            CtrlState::ManuallyPaused
        } else if self.restoring {
            CtrlState::Restoring
        } else if self.auto_paused {
            CtrlState::AutoPaused
        } else {
            CtrlState::Normal
        }
    }

    /// Manually pause the arm.
    ///
    /// If configured to lock on pause, every rotary actuator is locked and
    /// the set already locked beforehand is recorded, so a later unpause
    /// leaves those untouched.
    pub fn pause(&mut self, sense: &ArmSense) {
        if self.manually_paused {
            return;
        }

        info!("Arm manually paused");
        self.manually_paused = true;

        if self.params.lock_on_pause {
            self.prelocked = self
                .arm
                .rotary_ids()
                .into_iter()
                .filter(|&id| sense.is_locked(id))
                .collect();

            for id in self.arm.rotary_ids() {
                self.pending_locks.push((id, true));
            }
        }
    }

    /// Release a manual pause, unlocking only the rotary actuators the pause
    /// itself locked.
    pub fn unpause(&mut self) {
        if !self.manually_paused {
            return;
        }

        info!("Arm unpaused");
        self.manually_paused = false;

        if self.params.lock_on_pause {
            for id in self.arm.rotary_ids() {
                if !self.prelocked.contains(&id) {
                    self.pending_locks.push((id, false));
                }
            }
            self.prelocked.clear();
        }
    }

    /// Start restoring a named pose.
    ///
    /// A name with no stored pose is a silent no-op. Calling again mid
    /// restore simply retargets the sequencer.
    pub fn go(&mut self, name: &str) {
        if !self.poses.contains(name) {
            debug!("No pose named \"{}\" stored, go ignored", name);
            return;
        }

        info!("Restoring pose \"{}\"", name);
        self.auto_paused = true;
        self.restoring = true;
        self.restore_target = Some(name.to_string());
    }

    /// Store every joint's current target under a pose name.
    pub fn store_pose(&mut self, name: &str, sense: &ArmSense) -> Result<(), PoseStoreError> {
        let mut pose = Pose::default();

        for joint in self.arm.joints.iter() {
            if let Some(value) = joint.desired.or_else(|| sense.position(joint.act_id)) {
                pose.set(joint.act_id, value);
            }
        }

        info!("Storing pose \"{}\" ({} targets)", name, pose.targets.len());
        self.poses.set(name, pose)
    }

    /// Select the segment live input is routed to.
    pub fn set_active_segment(&mut self, name: &str) -> Result<(), ArmCtrlError> {
        self.arm.set_active_segment(name)?;
        info!("Active segment is now \"{}\"", name);
        Ok(())
    }

    /// Set the tool-mode flag, passed through to the world on the next
    /// cycle.
    pub fn set_tool_mode(&mut self, enabled: bool) {
        self.pending_tool_mode = Some(enabled);
    }

    /// Lock or unlock every rotary actuator on the next cycle.
    pub fn toggle_lock(&mut self, locked: bool) {
        for id in self.arm.rotary_ids() {
            self.pending_locks.push((id, locked));
        }
    }

    /// Re-read the parameter file and re-run axis assignment.
    ///
    /// The arm model itself is kept, only configuration-driven data
    /// changes.
    pub fn reload(&mut self) -> Result<(), params::LoadError> {
        if let Some(file) = self.params_file {
            self.params = params::load(file)?;
            info!("ArmCtrl parameters reloaded");
        }

        axis_assign::assign(&mut self.arm, &self.params);
        Ok(())
    }

    /// One-line status text for the slow display refresh.
    pub fn display_text(&self, sense: &ArmSense) -> String {
        let alive = self
            .arm
            .joints
            .iter()
            .filter(|j| sense.exists(j.act_id))
            .count();

        let mut text = format!(
            "[{:?}] seg {} | {}/{} joints",
            self.current_state(),
            self.arm.active_segment_name(),
            alive,
            self.arm.joints.len()
        );

        if let Some(name) = &self.restore_target {
            text.push_str(&format!(" | restoring \"{}\"", name));
        }

        text
    }

    /// Route live input to the active segment, stopping every other
    /// segment's joints.
    fn route_input(&mut self, axes: &AxisInput, sense: &ArmSense, dems: &mut ArmDems) {
        for si in 0..self.arm.segments.len() {
            let members = self.arm.segments[si].joints.clone();

            if si == self.arm.active_segment {
                let segment_name = self.arm.segments[si].name.clone();

                for ji in members {
                    let current = match sense.position(self.arm.joints[ji].act_id) {
                        Some(c) => c,
                        None => continue,
                    };

                    let kind = self.arm.joints[ji].kind;
                    let group_name = self.arm.group_name(ji).map(str::to_string);
                    let config = self.params.config_for(&segment_name, group_name.as_deref());
                    let invert = config.invert_flag(kind);
                    let motion = config.motion_cfg(kind);

                    let joint = &mut self.arm.joints[ji];
                    let raw = joint.axis.map(|a| axes.get(a)).unwrap_or(0.0);
                    let velocity = joint.move_by(raw, invert, &motion, current);

                    dems.velocity.insert(joint.act_id, velocity);
                    self.report.joints_driven += 1;
                }
            } else {
                for ji in members {
                    let id = self.arm.joints[ji].act_id;
                    if sense.exists(id) {
                        dems.velocity.insert(id, 0.0);
                        self.report.joints_stopped += 1;
                    }
                }
            }
        }
    }

    /// Stop every surviving joint.
    fn stop_all(&mut self, sense: &ArmSense, dems: &mut ArmDems) {
        for joint in self.arm.joints.iter() {
            if sense.exists(joint.act_id) {
                dems.velocity.insert(joint.act_id, 0.0);
                self.report.joints_stopped += 1;
            }
        }
    }

    /// Run one restore sequencer tick, handling completion.
    fn restore_step(&mut self, sense: &ArmSense, dems: &mut ArmDems) {
        let name = match self.restore_target.clone() {
            Some(n) => n,
            None => {
                warn!("Restoring with no target pose, clearing restore state");
                self.restoring = false;
                self.auto_paused = false;
                return;
            }
        };

        let pose = match self.poses.get(&name) {
            Some(p) => p.clone(),
            None => {
                warn!("Pose \"{}\" vanished from the store, abandoning restore", name);
                self.restoring = false;
                self.auto_paused = false;
                self.restore_target = None;
                return;
            }
        };

        let outcome = restore::step(&mut self.arm, &self.params, &pose, sense, dems);
        self.report.active_stage = outcome.active_stage;

        if outcome.complete {
            info!("Pose \"{}\" restored", name);

            // The bound timer, if any, fires exactly once on completion
            dems.timer = Some(name);

            self.restoring = false;
            self.auto_paused = false;
            self.restore_target = None;
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::arm_ctrl::POS_TOLERANCE;
    use std::collections::{BTreeMap, HashMap};
    use util::maths::get_ang_dist_360;
    use world_if::eqpt::{ActuatorInfo, ActuatorKind, ActuatorSense, Axis, MountDir, StructId};

    fn act(
        id: ActuatorId,
        base: StructId,
        head: StructId,
        kind: ActuatorKind,
        dir: MountDir,
    ) -> ActuatorInfo {
        ActuatorInfo {
            id,
            name: format!("act_{}", id),
            kind,
            base_struct: base,
            head_struct: head,
            mount_dir: dir,
            limits: match kind {
                ActuatorKind::Rotary => None,
                ActuatorKind::Linear => Some((0.0, 10.0)),
            },
        }
    }

    /// Chain of three rotaries: act 1 is the root (distance 0), act 2 at
    /// distance 1, act 3 at distance 2.
    fn chain_scan() -> TopologyScan {
        TopologyScan {
            tag: "ARM".to_string(),
            reference_struct: 1,
            actuators: vec![
                act(1, 0, 1, ActuatorKind::Rotary, MountDir::Up),
                act(2, 1, 2, ActuatorKind::Rotary, MountDir::Right),
                act(3, 2, 3, ActuatorKind::Rotary, MountDir::Forward),
            ],
            segments: BTreeMap::new(),
            groups: BTreeMap::new(),
        }
    }

    fn sense_of(positions: &HashMap<ActuatorId, f64>) -> ArmSense {
        let mut sense = ArmSense::default();
        for (&id, &position) in positions {
            sense.actuators.insert(
                id,
                ActuatorSense {
                    position,
                    locked: false,
                },
            );
        }
        sense
    }

    /// Run one controller cycle and integrate the demanded velocities into
    /// the position map, standing in for the physics world.
    fn tick(
        ctrl: &mut ArmCtrl,
        axes: AxisInput,
        positions: &mut HashMap<ActuatorId, f64>,
        dt: f64,
    ) -> ArmDems {
        let input = InputData {
            axes,
            sense: sense_of(positions),
        };

        let (dems, _) = ctrl.proc(&input).unwrap();

        for (&id, position) in positions.iter_mut() {
            if let Some(vel) = dems.velocity.get(&id) {
                *position = (*position + vel * dt).rem_euclid(360.0);
            }
        }

        dems
    }

    fn zero_pose_store() -> PoseStore {
        let mut store = PoseStore::in_memory();
        let mut pose = Pose::default();
        pose.set(1, 0.0);
        pose.set(2, 0.0);
        pose.set(3, 0.0);
        store.set("zero", pose).unwrap();
        store
    }

    #[test]
    fn test_staged_restore_runs_tip_to_base() {
        let mut ctrl =
            ArmCtrl::from_parts(Params::default(), &chain_scan(), zero_pose_store()).unwrap();

        let mut positions: HashMap<ActuatorId, f64> =
            vec![(1, 45.0), (2, 45.0), (3, 90.0)].into_iter().collect();

        ctrl.go("zero");
        assert_eq!(ctrl.current_state(), CtrlState::Restoring);

        let mut timer_fires = 0;
        let mut c_done_at = None;
        let mut b_done_at = None;

        for cycle in 0..4000 {
            let dems = tick(&mut ctrl, AxisInput::default(), &mut positions, 0.1);
            if dems.timer.is_some() {
                timer_fires += 1;
            }

            let a_err = get_ang_dist_360(positions[&1], 0.0).abs();
            let b_err = get_ang_dist_360(positions[&2], 0.0).abs();
            let c_err = get_ang_dist_360(positions[&3], 0.0).abs();

            if c_done_at.is_none() {
                if c_err <= POS_TOLERANCE {
                    c_done_at = Some(cycle);
                } else {
                    // Inner joints must not move until the tip is done
                    assert_eq!(positions[&1], 45.0);
                    assert_eq!(positions[&2], 45.0);
                }
            } else if b_done_at.is_none() {
                if b_err <= POS_TOLERANCE {
                    b_done_at = Some(cycle);
                } else {
                    assert_eq!(positions[&1], 45.0);
                }
            }

            if ctrl.current_state() == CtrlState::Normal {
                assert!(a_err <= POS_TOLERANCE);
                break;
            }
        }

        assert!(c_done_at.is_some());
        assert!(b_done_at.is_some());
        assert!(c_done_at.unwrap() <= b_done_at.unwrap());
        assert_eq!(timer_fires, 1);
        assert_eq!(ctrl.current_state(), CtrlState::Normal);
    }

    #[test]
    fn test_fast_restore_moves_all_joints_at_once() {
        let mut params = Params::default();
        params.staged_restore = false;

        let mut ctrl = ArmCtrl::from_parts(params, &chain_scan(), zero_pose_store()).unwrap();

        let mut positions: HashMap<ActuatorId, f64> =
            vec![(1, 45.0), (2, 45.0), (3, 90.0)].into_iter().collect();

        ctrl.go("zero");
        let dems = tick(&mut ctrl, AxisInput::default(), &mut positions, 0.1);

        // All three receive non-zero velocity on the very first cycle
        for id in 1..=3 {
            assert!(dems.velocity.get(&id).copied().unwrap_or(0.0).abs() > 0.0);
        }

        let mut timer_fires = 0;
        for _ in 0..4000 {
            let dems = tick(&mut ctrl, AxisInput::default(), &mut positions, 0.1);
            if dems.timer.is_some() {
                timer_fires += 1;
            }
            if ctrl.current_state() == CtrlState::Normal {
                break;
            }
        }

        assert_eq!(timer_fires, 1);
        for id in 1..=3 {
            assert!(get_ang_dist_360(positions[&id], 0.0).abs() <= POS_TOLERANCE);
        }
    }

    #[test]
    fn test_go_on_unknown_pose_is_a_noop() {
        let mut ctrl =
            ArmCtrl::from_parts(Params::default(), &chain_scan(), PoseStore::in_memory())
                .unwrap();

        ctrl.go("nope");
        assert_eq!(ctrl.current_state(), CtrlState::Normal);
    }

    #[test]
    fn test_pause_preserves_pre_existing_locks() {
        let mut ctrl =
            ArmCtrl::from_parts(Params::default(), &chain_scan(), PoseStore::in_memory())
                .unwrap();

        // Actuator 1 is already locked before the pause
        let mut sense = sense_of(
            &vec![(1, 0.0), (2, 0.0), (3, 0.0)].into_iter().collect(),
        );
        sense.actuators.get_mut(&1).unwrap().locked = true;

        ctrl.pause(&sense);
        let (dems, _) = ctrl
            .proc(&InputData {
                axes: AxisInput::default(),
                sense: sense.clone(),
            })
            .unwrap();

        // Everything locks on pause
        for id in 1..=3 {
            assert_eq!(dems.lock.get(&id), Some(&true));
        }
        assert_eq!(ctrl.current_state(), CtrlState::ManuallyPaused);

        ctrl.unpause();
        let (dems, _) = ctrl
            .proc(&InputData {
                axes: AxisInput::default(),
                sense,
            })
            .unwrap();

        // Only the locks the pause itself added are released
        assert_eq!(dems.lock.get(&1), None);
        assert_eq!(dems.lock.get(&2), Some(&false));
        assert_eq!(dems.lock.get(&3), Some(&false));
    }

    #[test]
    fn test_input_routed_to_active_segment_only() {
        let mut scan = chain_scan();
        scan.segments.insert("Tip".to_string(), vec![3]);

        let mut ctrl =
            ArmCtrl::from_parts(Params::default(), &scan, PoseStore::in_memory()).unwrap();

        let mut positions: HashMap<ActuatorId, f64> =
            vec![(1, 0.0), (2, 0.0), (3, 0.0)].into_iter().collect();

        // Act 1 is an up rotary on RotY in the main segment
        let mut axes = AxisInput::default();
        axes.set(Axis::RotY, 1.0);

        let dems = tick(&mut ctrl, axes, &mut positions, 0.1);
        assert!(dems.velocity[&1].abs() > 0.0);
        assert_eq!(dems.velocity[&3], 0.0);

        // Switching segments flips who is driven
        ctrl.set_active_segment("Tip").unwrap();
        let mut axes = AxisInput::default();
        axes.set(Axis::Roll, 1.0);

        let dems = tick(&mut ctrl, axes, &mut positions, 0.1);
        assert!(dems.velocity[&3].abs() > 0.0);
        assert_eq!(dems.velocity[&1], 0.0);

        assert!(ctrl.set_active_segment("Elbow").is_err());
    }

    #[test]
    fn test_mirrored_group_opposes_velocities() {
        let mut scan = TopologyScan {
            tag: "ARM".to_string(),
            reference_struct: 0,
            actuators: vec![
                act(1, 0, 1, ActuatorKind::Linear, MountDir::Left),
                act(2, 0, 2, ActuatorKind::Linear, MountDir::Right),
            ],
            segments: BTreeMap::new(),
            groups: BTreeMap::new(),
        };
        scan.groups.insert("Claw".to_string(), vec![1, 2]);

        let mut params = Params::default();
        params.groups.insert(
            "Claw".to_string(),
            toml::from_str("mirrored = true\n[lin]\nsensitivity = 1.0").unwrap(),
        );

        let mut ctrl = ArmCtrl::from_parts(params, &scan, PoseStore::in_memory()).unwrap();

        let mut positions: HashMap<ActuatorId, f64> =
            vec![(1, 5.0), (2, 5.0)].into_iter().collect();

        let shared_axis = ctrl.arm.joint_by_id(1).unwrap().axis.unwrap();
        let mut axes = AxisInput::default();
        axes.set(shared_axis, 1.0);

        let dems = tick(&mut ctrl, axes, &mut positions, 0.1);
        let v1 = dems.velocity[&1];
        let v2 = dems.velocity[&2];

        assert!(v1.abs() > 0.0);
        assert!((v1 + v2).abs() < 1e-9);
    }

    #[test]
    fn test_store_then_go_round_trip() {
        let mut ctrl =
            ArmCtrl::from_parts(Params::default(), &chain_scan(), PoseStore::in_memory())
                .unwrap();

        let mut positions: HashMap<ActuatorId, f64> =
            vec![(1, 10.0), (2, 20.0), (3, 30.0)].into_iter().collect();

        // Seed desired targets with one idle cycle, then snapshot
        tick(&mut ctrl, AxisInput::default(), &mut positions, 0.1);
        ctrl.store_pose("work", &sense_of(&positions)).unwrap();

        // Disturb the arm, then restore
        positions.insert(1, 100.0);
        positions.insert(2, 200.0);
        positions.insert(3, 300.0);
        ctrl.go("work");

        for _ in 0..4000 {
            tick(&mut ctrl, AxisInput::default(), &mut positions, 0.1);
            if ctrl.current_state() == CtrlState::Normal {
                break;
            }
        }

        assert!(get_ang_dist_360(positions[&1], 10.0).abs() <= POS_TOLERANCE);
        assert!(get_ang_dist_360(positions[&2], 20.0).abs() <= POS_TOLERANCE);
        assert!(get_ang_dist_360(positions[&3], 30.0).abs() <= POS_TOLERANCE);
    }

    #[test]
    fn test_reload_reruns_axis_assignment() {
        let mut ctrl =
            ArmCtrl::from_parts(Params::default(), &chain_scan(), PoseStore::in_memory())
                .unwrap();

        assert_eq!(ctrl.arm.joint_by_id(1).unwrap().axis, Some(Axis::RotY));

        // Disabling RotY pushes the shoulder onto its fallback candidate
        ctrl.params.default_segment.enabled.rot_y = false;
        ctrl.reload().unwrap();

        assert_eq!(ctrl.arm.joint_by_id(1).unwrap().axis, Some(Axis::MovX));
    }

    #[test]
    fn test_destroyed_actuator_never_wedges_a_restore() {
        let mut ctrl =
            ArmCtrl::from_parts(Params::default(), &chain_scan(), zero_pose_store()).unwrap();

        // Actuator 3 has been destroyed, it never appears in sense
        let mut positions: HashMap<ActuatorId, f64> =
            vec![(1, 45.0), (2, 45.0)].into_iter().collect();

        ctrl.go("zero");

        for _ in 0..4000 {
            tick(&mut ctrl, AxisInput::default(), &mut positions, 0.1);
            if ctrl.current_state() == CtrlState::Normal {
                break;
            }
        }

        assert_eq!(ctrl.current_state(), CtrlState::Normal);
        assert!(get_ang_dist_360(positions[&1], 0.0).abs() <= POS_TOLERANCE);
        assert!(get_ang_dist_360(positions[&2], 0.0).abs() <= POS_TOLERANCE);
    }
}
