//! Topology builder
//!
//! Turns a raw topology scan into the arm model. The scan is a flat list of
//! actuators joining pairs of sub-structures; this module finds the arm's
//! root, walks outward assigning chain distances, and resolves segment and
//! group membership.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use std::collections::{BTreeMap, HashSet, VecDeque};
use thiserror::Error;

// Internal
use super::arm::{Arm, Group, Segment};
use super::joint::Joint;
use world_if::eqpt::{ActuatorId, ActuatorInfo, StructId};
use world_if::scan::TopologyScan;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which may occur while building the arm model.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error(
        "Actuator {id} is claimed by both group \"{first}\" and group \
        \"{second}\", group membership must be exclusive"
    )]
    ActuatorInTwoGroups {
        id: ActuatorId,
        first: String,
        second: String,
    },
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Build the arm model from a topology scan.
pub fn build(scan: &TopologyScan) -> Result<Arm, TopologyError> {
    // Group membership must be exclusive, checked before anything else so a
    // bad declaration fails fast
    check_group_exclusivity(scan)?;

    let by_id: BTreeMap<ActuatorId, &ActuatorInfo> =
        scan.actuators.iter().map(|a| (a.id, a)).collect();

    let mut arm = Arm {
        tag: scan.tag.clone(),
        ..Arm::default()
    };

    // Walk from the reference point towards the base. Each step follows the
    // actuator whose moving side carries the current sub-structure, so the
    // walk strictly ascends the chain.
    let mut current_struct = scan.reference_struct;
    let mut root_act: Option<&ActuatorInfo> = None;
    let mut walked: HashSet<StructId> = HashSet::new();
    walked.insert(current_struct);

    while let Some(act) = carrier_of(&by_id, current_struct) {
        if !walked.insert(act.base_struct) {
            break;
        }
        root_act = Some(act);
        current_struct = act.base_struct;
    }

    // Breadth-first expansion over sub-structures, each hop adding one to
    // the chain distance. Worklist entries are (structure, joint distance
    // for actuators based on it).
    let mut worklist: VecDeque<(StructId, u32)> = VecDeque::new();
    let mut visited_acts: HashSet<ActuatorId> = HashSet::new();
    let mut seen_structs: HashSet<StructId> = HashSet::new();

    match root_act {
        // A distinct root actuator starts the chain at distance zero and
        // expansion continues from its moving side
        Some(root) => {
            info!(
                "Arm root is actuator {} (\"{}\") at distance 0",
                root.id, root.name
            );
            arm.joints.push(Joint::new(root, 0));
            visited_acts.insert(root.id);
            seen_structs.insert(root.base_struct);
            seen_structs.insert(root.head_struct);
            worklist.push_back((root.head_struct, 1));
        }
        // No actuator precedes the reference point, so the reference
        // structure itself is the root and its actuators sit at distance 1
        None => {
            info!(
                "Arm root is the reference structure {}",
                scan.reference_struct
            );
            seen_structs.insert(scan.reference_struct);
            worklist.push_back((scan.reference_struct, 1));
        }
    }

    while let Some((struct_id, distance)) = worklist.pop_front() {
        // Ascending id order keeps discovery deterministic
        let mut based_here: Vec<&ActuatorInfo> = by_id
            .values()
            .filter(|a| a.base_struct == struct_id && !visited_acts.contains(&a.id))
            .copied()
            .collect();
        based_here.sort_by_key(|a| a.id);

        for act in based_here {
            debug!(
                "Discovered actuator {} (\"{}\") at distance {}",
                act.id, act.name, distance
            );
            arm.joints.push(Joint::new(act, distance));
            visited_acts.insert(act.id);

            if seen_structs.insert(act.head_struct) {
                worklist.push_back((act.head_struct, distance + 1));
            }
        }
    }

    assign_segments(&mut arm, scan);
    assign_groups(&mut arm, scan);

    // A grouped root drags its siblings into its own segment, so the whole
    // group answers to the same input routing
    pull_root_group_into_root_segment(&mut arm, root_act.map(|a| a.id));

    info!(
        "Arm \"{}\" built: {} joints over {} segments and {} groups",
        arm.tag,
        arm.joints.len(),
        arm.segments.len(),
        arm.groups.len()
    );

    Ok(arm)
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Find the actuator whose moving side carries the given sub-structure,
/// tie-broken by ascending id.
fn carrier_of<'a>(
    by_id: &BTreeMap<ActuatorId, &'a ActuatorInfo>,
    struct_id: StructId,
) -> Option<&'a ActuatorInfo> {
    // BTreeMap iteration is id-ascending already
    by_id
        .values()
        .find(|a| a.head_struct == struct_id)
        .copied()
}

/// Raise an error if any actuator appears in more than one declared group.
fn check_group_exclusivity(scan: &TopologyScan) -> Result<(), TopologyError> {
    let mut owner: BTreeMap<ActuatorId, &str> = BTreeMap::new();

    for (name, members) in scan.groups.iter() {
        for id in members {
            if let Some(first) = owner.insert(*id, name) {
                return Err(TopologyError::ActuatorInTwoGroups {
                    id: *id,
                    first: first.to_string(),
                    second: name.clone(),
                });
            }
        }
    }

    Ok(())
}

/// Resolve each joint's owning segment.
///
/// The first declared segment (in name order) claiming the joint's actuator
/// wins; unclaimed joints fall to the main segment.
fn assign_segments(arm: &mut Arm, scan: &TopologyScan) {
    for name in scan.segments.keys() {
        arm.segments.push(Segment {
            name: name.clone(),
            joints: Vec::new(),
        });
    }

    for (ji, joint) in arm.joints.iter_mut().enumerate() {
        let seg_index = scan
            .segments
            .keys()
            .position(|name| scan.segments[name].contains(&joint.act_id))
            // Named segments start at index 1, after the main segment
            .map(|p| p + 1)
            .unwrap_or(0);

        joint.segment = seg_index;
        arm.segments[seg_index].joints.push(ji);
    }
}

/// Resolve each joint's group, if any.
fn assign_groups(arm: &mut Arm, scan: &TopologyScan) {
    for name in scan.groups.keys() {
        arm.groups.push(Group {
            name: name.clone(),
            joints: Vec::new(),
        });
    }

    for (ji, joint) in arm.joints.iter_mut().enumerate() {
        let group_index = scan
            .groups
            .keys()
            .position(|name| scan.groups[name].contains(&joint.act_id));

        if let Some(gi) = group_index {
            joint.group = Some(gi);
            arm.groups[gi].joints.push(ji);
        }
    }
}

/// Move the root's group siblings into the root's segment.
fn pull_root_group_into_root_segment(arm: &mut Arm, root_id: Option<ActuatorId>) {
    let root_ji = match root_id.and_then(|id| arm.joints.iter().position(|j| j.act_id == id)) {
        Some(ji) => ji,
        None => return,
    };

    let group_index = match arm.joints[root_ji].group {
        Some(gi) => gi,
        None => return,
    };

    let target_segment = arm.joints[root_ji].segment;
    let siblings = arm.groups[group_index].joints.clone();

    for ji in siblings {
        let old_segment = arm.joints[ji].segment;
        if old_segment == target_segment {
            continue;
        }

        arm.segments[old_segment].joints.retain(|&j| j != ji);
        arm.joints[ji].segment = target_segment;
        arm.segments[target_segment].joints.push(ji);
    }

    // Keep segment member lists in joint arena order
    arm.segments[target_segment].joints.sort_unstable();
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::arm_ctrl::arm::MAIN_SEGMENT;
    use world_if::eqpt::{ActuatorKind, MountDir};

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

    fn scan(
        reference_struct: StructId,
        actuators: Vec<ActuatorInfo>,
        segments: Vec<(&str, Vec<ActuatorId>)>,
        groups: Vec<(&str, Vec<ActuatorId>)>,
    ) -> TopologyScan {
        TopologyScan {
            tag: "ARM".to_string(),
            reference_struct,
            actuators,
            segments: segments
                .into_iter()
                .map(|(n, m)| (n.to_string(), m))
                .collect(),
            groups: groups
                .into_iter()
                .map(|(n, m)| (n.to_string(), m))
                .collect(),
        }
    }

    #[test]
    fn test_reference_is_root() {
        // Chain: struct 0 (reference) -> act 1 -> struct 1 -> act 2 ->
        // struct 2. Nothing carries struct 0, so the reference is the root
        // and distances start at 1.
        let scan = scan(0, vec![act(1, 0, 1), act(2, 1, 2)], vec![], vec![]);

        let arm = build(&scan).unwrap();

        assert_eq!(arm.joints.len(), 2);
        assert_eq!(arm.joint_by_id(1).unwrap().distance, 1);
        assert_eq!(arm.joint_by_id(2).unwrap().distance, 2);
    }

    #[test]
    fn test_distinct_root_actuator() {
        // Act 1 carries the reference structure 1, so it is the root at
        // distance 0 and expansion continues from its moving side
        let scan = scan(
            1,
            vec![act(1, 0, 1), act(2, 1, 2), act(3, 2, 3)],
            vec![],
            vec![],
        );

        let arm = build(&scan).unwrap();

        assert_eq!(arm.joint_by_id(1).unwrap().distance, 0);
        assert_eq!(arm.joint_by_id(2).unwrap().distance, 1);
        assert_eq!(arm.joint_by_id(3).unwrap().distance, 2);
    }

    #[test]
    fn test_distances_form_layering() {
        // Branching arm: two actuators fan out from struct 1
        let scan = scan(
            0,
            vec![act(1, 0, 1), act(2, 1, 2), act(3, 1, 3), act(4, 3, 4)],
            vec![],
            vec![],
        );

        let arm = build(&scan).unwrap();

        for joint in &arm.joints {
            let parent = arm
                .joints
                .iter()
                .find(|p| p.act_id != joint.act_id && arm_parent(&scan, joint.act_id, p.act_id));

            if let Some(parent) = parent {
                assert_eq!(joint.distance, parent.distance + 1);
            }
        }
    }

    /// True if `parent_id`'s moving side carries `child_id`'s base.
    fn arm_parent(scan: &TopologyScan, child_id: ActuatorId, parent_id: ActuatorId) -> bool {
        let child = scan.actuators.iter().find(|a| a.id == child_id).unwrap();
        let parent = scan.actuators.iter().find(|a| a.id == parent_id).unwrap();
        parent.head_struct == child.base_struct
    }

    #[test]
    fn test_segment_and_group_membership() {
        let scan = scan(
            0,
            vec![act(1, 0, 1), act(2, 1, 2), act(3, 1, 3)],
            vec![("Boom", vec![2, 3])],
            vec![("Claw", vec![3])],
        );

        let arm = build(&scan).unwrap();

        assert_eq!(arm.joint_by_id(1).unwrap().segment, 0);
        assert_eq!(arm.segments[arm.joint_by_id(2).unwrap().segment].name, "Boom");
        assert_eq!(arm.joint_by_id(3).unwrap().group, Some(0));
        assert_eq!(arm.joint_by_id(2).unwrap().group, None);
        assert_eq!(arm.segments[0].name, MAIN_SEGMENT);
    }

    #[test]
    fn test_duplicate_group_is_fatal() {
        let scan = scan(
            0,
            vec![act(1, 0, 1)],
            vec![],
            vec![("A", vec![1]), ("B", vec![1])],
        );

        assert!(matches!(
            build(&scan),
            Err(TopologyError::ActuatorInTwoGroups { id: 1, .. })
        ));
    }

    #[test]
    fn test_root_group_pulls_siblings_into_segment() {
        // Act 1 is the distinct root and shares a group with act 3, which a
        // named segment would otherwise claim
        let scan = scan(
            1,
            vec![act(1, 0, 1), act(2, 1, 2), act(3, 2, 3)],
            vec![("Tip", vec![3])],
            vec![("Base", vec![1, 3])],
        );

        let arm = build(&scan).unwrap();

        let root_segment = arm.joint_by_id(1).unwrap().segment;
        assert_eq!(arm.joint_by_id(3).unwrap().segment, root_segment);
        assert!(arm.segments[root_segment].joints.windows(2).all(|w| w[0] < w[1]));
    }
}
