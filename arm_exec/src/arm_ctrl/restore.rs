//! Pose restore sequencer
//!
//! Drives every joint towards a stored pose, either all at once (fast mode)
//! or outside-in by chain distance (staged mode, the default). Staging stops
//! the base of the arm swinging before the tip has cleared, which would
//! otherwise risk the arm folding into itself.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::arm::Arm;
use super::params::{MotionCfg, Params};
use super::pose::Pose;
use world_if::eqpt::{ArmDems, ArmSense};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Result of one sequencer tick.
pub struct RestoreOutcome {
    /// Every joint with a stored target is within tolerance
    pub complete: bool,

    /// Effective distance of the stage currently being driven, staged mode
    /// only
    pub active_stage: Option<u32>,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Run one tick of the restore sequencer.
///
/// Joints whose actuator no longer exists, or which have no stored target,
/// count as satisfied so a damaged arm can never wedge a restore.
pub fn step(
    arm: &mut Arm,
    params: &Params,
    pose: &Pose,
    sense: &ArmSense,
    dems: &mut ArmDems,
) -> RestoreOutcome {
    let plan = joint_plan(arm, params);

    if params.staged_restore {
        staged_step(arm, &plan, pose, sense, dems)
    } else {
        fast_step(arm, &plan, pose, sense, dems)
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Per-joint restore data: joint index, effective distance, motion config.
fn joint_plan(arm: &Arm, params: &Params) -> Vec<(usize, u32, MotionCfg)> {
    (0..arm.joints.len())
        .map(|ji| {
            let joint = &arm.joints[ji];
            let segment_name = &arm.segments[joint.segment].name;
            let cfg = params
                .config_for(segment_name, arm.group_name(ji))
                .motion_cfg(joint.kind);

            (ji, arm.effective_distance(ji), cfg)
        })
        .collect()
}

/// True if the joint needs no further driving towards the pose.
fn is_satisfied(arm: &Arm, ji: usize, pose: &Pose, sense: &ArmSense) -> bool {
    let joint = &arm.joints[ji];

    let target = match pose.target_for(joint.act_id) {
        Some(t) => t,
        None => return true,
    };

    match sense.position(joint.act_id) {
        Some(current) => joint.is_at_position(target, current),
        None => true,
    }
}

/// Staged mode: drive only the outermost unsatisfied stage.
fn staged_step(
    arm: &mut Arm,
    plan: &[(usize, u32, MotionCfg)],
    pose: &Pose,
    sense: &ArmSense,
    dems: &mut ArmDems,
) -> RestoreOutcome {
    // Scan stages by strictly descending effective distance, halting at the
    // first stage not fully satisfied
    let mut stages: Vec<u32> = plan.iter().map(|&(_, d, _)| d).collect();
    stages.sort_unstable_by(|a, b| b.cmp(a));
    stages.dedup();

    for stage in stages {
        let members: Vec<&(usize, u32, MotionCfg)> =
            plan.iter().filter(|&&(_, d, _)| d == stage).collect();

        if members.iter().all(|&&(ji, _, _)| is_satisfied(arm, ji, pose, sense)) {
            continue;
        }

        // The active stage. Joints in other stages are left untouched, not
        // stopped.
        for &&(ji, _, cfg) in &members {
            drive(arm, ji, &cfg, pose, sense, dems);
        }

        return RestoreOutcome {
            complete: false,
            active_stage: Some(stage),
        };
    }

    RestoreOutcome {
        complete: true,
        active_stage: None,
    }
}

/// Fast mode: drive every joint at once.
fn fast_step(
    arm: &mut Arm,
    plan: &[(usize, u32, MotionCfg)],
    pose: &Pose,
    sense: &ArmSense,
    dems: &mut ArmDems,
) -> RestoreOutcome {
    let mut complete = true;

    for &(ji, _, cfg) in plan {
        if !is_satisfied(arm, ji, pose, sense) {
            complete = false;
        }
        drive(arm, ji, &cfg, pose, sense, dems);
    }

    RestoreOutcome {
        complete,
        active_stage: None,
    }
}

/// Command one joint towards its stored target, if it has one and still
/// exists in the world.
fn drive(
    arm: &mut Arm,
    ji: usize,
    cfg: &MotionCfg,
    pose: &Pose,
    sense: &ArmSense,
    dems: &mut ArmDems,
) {
    let joint = &mut arm.joints[ji];

    let target = match pose.target_for(joint.act_id) {
        Some(t) => t,
        None => return,
    };

    if let Some(current) = sense.position(joint.act_id) {
        let velocity = joint.move_to_target(target, cfg, current);
        dems.velocity.insert(joint.act_id, velocity);
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::arm_ctrl::{topology, Params, POS_TOLERANCE};
    use std::collections::{BTreeMap, HashMap};
    use util::maths::get_ang_dist_360;
    use world_if::eqpt::{
        ActuatorId, ActuatorInfo, ActuatorKind, ActuatorSense, MountDir, StructId,
    };
    use world_if::scan::TopologyScan;

    fn act(id: ActuatorId, base: StructId, head: StructId) -> ActuatorInfo {
        ActuatorInfo {
            id,
            name: format!("act_{}", id),
            kind: ActuatorKind::Rotary,
            base_struct: base,
            head_struct: head,
            mount_dir: MountDir::Up,
            limits: None,
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

    fn zero_pose(ids: &[ActuatorId]) -> Pose {
        let mut pose = Pose::default();
        for &id in ids {
            pose.set(id, 0.0);
        }
        pose
    }

    #[test]
    fn test_grouped_joint_moves_in_the_group_max_stage() {
        // Act 1 at distance 1 is grouped with act 3 at distance 2, so both
        // take the group's maximum distance and move in the outermost
        // stage. Act 2 is an ungrouped rotary at distance 1 and must hold
        // until the pair has finished.
        let mut groups = BTreeMap::new();
        groups.insert("Wrist".to_string(), vec![1, 3]);

        let scan = TopologyScan {
            tag: "ARM".to_string(),
            reference_struct: 0,
            actuators: vec![act(1, 0, 1), act(2, 0, 2), act(3, 1, 3)],
            segments: BTreeMap::new(),
            groups,
        };

        let mut arm = topology::build(&scan).unwrap();
        let params = Params::default();
        let pose = zero_pose(&[1, 2, 3]);

        let mut positions: HashMap<ActuatorId, f64> =
            vec![(1, 45.0), (2, 45.0), (3, 90.0)].into_iter().collect();

        let dt = 0.1;
        let mut completed = false;

        for _ in 0..4000 {
            let mut dems = ArmDems::default();
            let sense = sense_of(&positions);
            let outcome = step(&mut arm, &params, &pose, &sense, &mut dems);

            for (&id, position) in positions.iter_mut() {
                if let Some(vel) = dems.velocity.get(&id) {
                    *position = (*position + vel * dt).rem_euclid(360.0);
                }
            }

            let pair_done = get_ang_dist_360(positions[&1], 0.0).abs() <= POS_TOLERANCE
                && get_ang_dist_360(positions[&3], 0.0).abs() <= POS_TOLERANCE;

            if !pair_done {
                assert_eq!(outcome.active_stage, Some(2));
                assert_eq!(positions[&2], 45.0);
            }

            if outcome.complete {
                completed = true;
                break;
            }
        }

        assert!(completed);
        for id in 1..=3 {
            assert!(get_ang_dist_360(positions[&id], 0.0).abs() <= POS_TOLERANCE);
        }
    }
}
