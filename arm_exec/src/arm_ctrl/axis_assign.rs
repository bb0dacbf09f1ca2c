//! Axis assignment
//!
//! Maps every joint onto one of the six logical control axes (or none) from
//! its mount direction and kind. Runs at build time and again whenever the
//! configuration is reloaded, since enable flags may have changed.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use std::collections::HashSet;

// Internal
use super::arm::Arm;
use super::params::Params;
use world_if::eqpt::{ActuatorKind, Axis, MountDir};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Assign logical axes and inversion flags across the whole arm.
pub fn assign(arm: &mut Arm, params: &Params) {
    for joint in arm.joints.iter_mut() {
        joint.axis = None;
        joint.inverted = joint.mount_dir.opposes_control_positive();
        joint.block_inverted = false;
    }

    // Claim axes segment by segment. Within a segment an axis belongs to at
    // most one claimant, a group counting as a single claimant through its
    // first member.
    for si in 0..arm.segments.len() {
        let segment_name = arm.segments[si].name.clone();
        let members = arm.segments[si].joints.clone();
        let mut claimed: HashSet<Axis> = HashSet::new();

        for ji in members {
            // Non-first group members inherit their axis afterwards
            if let Some(gi) = arm.joints[ji].group {
                if arm.groups[gi].joints.first() != Some(&ji) {
                    continue;
                }
            }

            let group_name = arm.group_name(ji).map(str::to_string);
            let config = params.config_for(&segment_name, group_name.as_deref());

            let joint = &mut arm.joints[ji];
            let axis = candidates(joint.mount_dir, joint.kind)
                .iter()
                .copied()
                .find(|a| config.enabled.is_enabled(*a) && !claimed.contains(a));

            if let Some(axis) = axis {
                claimed.insert(axis);
                joint.axis = Some(axis);
                debug!("Joint \"{}\" assigned axis {}", joint.name, axis.name());
            } else {
                debug!(
                    "Joint \"{}\" left without an axis, excluded from live input",
                    joint.name
                );
            }
        }
    }

    // Group members beyond the first reuse the first member's axis
    for gi in 0..arm.groups.len() {
        let members = arm.groups[gi].joints.clone();
        let shared = match members.first() {
            Some(&first) => arm.joints[first].axis,
            None => continue,
        };

        for &ji in members.iter().skip(1) {
            arm.joints[ji].axis = shared;
        }

        if params.is_group_mirrored(&arm.groups[gi].name) {
            mirror_group(arm, &members);
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Candidate axes for one mount direction and kind, in preference order.
fn candidates(dir: MountDir, kind: ActuatorKind) -> &'static [Axis] {
    use ActuatorKind::*;
    use Axis::*;
    use MountDir::*;

    match (dir, kind) {
        (Up, Rotary) | (Down, Rotary) => &[RotY, MovX],
        (Up, Linear) | (Down, Linear) => &[MovY, MovZ, RotX],
        (Left, Rotary) | (Right, Rotary) => &[RotX, MovZ, MovY],
        (Left, Linear) | (Right, Linear) => &[MovX, RotY, Roll],
        (Forward, Rotary) | (Backward, Rotary) => &[Roll],
        (Forward, Linear) | (Backward, Linear) => &[MovZ, RotX, MovY],
    }
}

/// Derive block-inversion flags for a mirrored group.
///
/// A mirrored linear joint must oppose the group's first member under
/// identical input. Mount inversion already opposes members whose mount
/// parity differs from the first member's, so the block flag goes on the
/// members whose parity matches. A mirrored rotary joint opposes its
/// symmetric partner, identified as an earlier rotary joint at the same
/// chain distance in the same segment.
fn mirror_group(arm: &mut Arm, members: &[usize]) {
    let first_inverted = match members.first() {
        Some(&first) => arm.joints[first].inverted,
        None => return,
    };

    for (mi, &ji) in members.iter().enumerate() {
        match arm.joints[ji].kind {
            ActuatorKind::Linear => {
                arm.joints[ji].block_inverted =
                    mi > 0 && arm.joints[ji].inverted == first_inverted;
            }
            ActuatorKind::Rotary => {
                let segment = arm.joints[ji].segment;
                let distance = arm.joints[ji].distance;

                let has_earlier_partner = arm.segments[segment]
                    .joints
                    .iter()
                    .take_while(|&&other| other != ji)
                    .any(|&other| {
                        arm.joints[other].kind == ActuatorKind::Rotary
                            && arm.joints[other].distance == distance
                    });

                arm.joints[ji].block_inverted = has_earlier_partner;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::arm_ctrl::topology;
    use std::collections::BTreeMap;
    use world_if::eqpt::{ActuatorId, ActuatorInfo, StructId};
    use world_if::scan::TopologyScan;

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
            limits: None,
        }
    }

    fn scan_of(
        actuators: Vec<ActuatorInfo>,
        groups: Vec<(&str, Vec<ActuatorId>)>,
    ) -> TopologyScan {
        TopologyScan {
            tag: "ARM".to_string(),
            reference_struct: 0,
            actuators,
            segments: BTreeMap::new(),
            groups: groups
                .into_iter()
                .map(|(n, m)| (n.to_string(), m))
                .collect(),
        }
    }

    #[test]
    fn test_axes_unique_within_segment() {
        // Two up-mounted rotaries compete: the first takes RotY, the second
        // falls back to MovX
        let scan = scan_of(
            vec![
                act(1, 0, 1, ActuatorKind::Rotary, MountDir::Up),
                act(2, 1, 2, ActuatorKind::Rotary, MountDir::Up),
            ],
            vec![],
        );

        let mut arm = topology::build(&scan).unwrap();
        assign(&mut arm, &Params::default());

        assert_eq!(arm.joint_by_id(1).unwrap().axis, Some(Axis::RotY));
        assert_eq!(arm.joint_by_id(2).unwrap().axis, Some(Axis::MovX));
    }

    #[test]
    fn test_exhausted_candidates_leave_no_axis() {
        // Three forward rotaries, but forward rotary has a single candidate
        let scan = scan_of(
            vec![
                act(1, 0, 1, ActuatorKind::Rotary, MountDir::Forward),
                act(2, 1, 2, ActuatorKind::Rotary, MountDir::Forward),
            ],
            vec![],
        );

        let mut arm = topology::build(&scan).unwrap();
        assign(&mut arm, &Params::default());

        assert_eq!(arm.joint_by_id(1).unwrap().axis, Some(Axis::Roll));
        assert_eq!(arm.joint_by_id(2).unwrap().axis, None);
    }

    #[test]
    fn test_disabled_axis_skipped() {
        let scan = scan_of(
            vec![act(1, 0, 1, ActuatorKind::Rotary, MountDir::Up)],
            vec![],
        );

        let mut arm = topology::build(&scan).unwrap();
        let mut params = Params::default();
        params.default_segment.enabled.rot_y = false;
        assign(&mut arm, &params);

        assert_eq!(arm.joint_by_id(1).unwrap().axis, Some(Axis::MovX));
    }

    #[test]
    fn test_inversion_from_mount_direction() {
        let scan = scan_of(
            vec![
                act(1, 0, 1, ActuatorKind::Linear, MountDir::Down),
                act(2, 1, 2, ActuatorKind::Linear, MountDir::Right),
            ],
            vec![],
        );

        let mut arm = topology::build(&scan).unwrap();
        assign(&mut arm, &Params::default());

        assert!(arm.joint_by_id(1).unwrap().inverted);
        assert!(!arm.joint_by_id(2).unwrap().inverted);
    }

    #[test]
    fn test_group_members_share_axis() {
        let scan = scan_of(
            vec![
                act(1, 0, 1, ActuatorKind::Linear, MountDir::Left),
                act(2, 0, 2, ActuatorKind::Linear, MountDir::Right),
            ],
            vec![("Claw", vec![1, 2])],
        );

        let mut arm = topology::build(&scan).unwrap();
        assign(&mut arm, &Params::default());

        let a = arm.joint_by_id(1).unwrap().axis;
        let b = arm.joint_by_id(2).unwrap().axis;
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[test]
    fn test_mirrored_linear_net_signs_oppose() {
        // Opposite mounts already oppose through mount inversion, so no
        // block flag is needed
        let scan = scan_of(
            vec![
                act(1, 0, 1, ActuatorKind::Linear, MountDir::Left),
                act(2, 0, 2, ActuatorKind::Linear, MountDir::Right),
            ],
            vec![("Claw", vec![1, 2])],
        );

        let mut arm = topology::build(&scan).unwrap();
        let mut params = Params::default();
        params.groups.insert(
            "Claw".to_string(),
            toml::from_str("mirrored = true").unwrap(),
        );
        assign(&mut arm, &params);

        assert!(arm.joint_by_id(1).unwrap().inverted);
        assert!(!arm.joint_by_id(1).unwrap().block_inverted);
        assert!(!arm.joint_by_id(2).unwrap().inverted);
        assert!(!arm.joint_by_id(2).unwrap().block_inverted);

        // Identical mounts need the block flag to oppose
        let scan = scan_of(
            vec![
                act(1, 0, 1, ActuatorKind::Linear, MountDir::Right),
                act(2, 0, 2, ActuatorKind::Linear, MountDir::Right),
            ],
            vec![("Claw", vec![1, 2])],
        );

        let mut arm = topology::build(&scan).unwrap();
        assign(&mut arm, &params);

        assert!(!arm.joint_by_id(1).unwrap().block_inverted);
        assert!(arm.joint_by_id(2).unwrap().block_inverted);
    }

    #[test]
    fn test_mirrored_rotary_pair_opposes() {
        // Two rotaries at the same distance fan out from the reference
        let scan = scan_of(
            vec![
                act(1, 0, 1, ActuatorKind::Rotary, MountDir::Up),
                act(2, 0, 2, ActuatorKind::Rotary, MountDir::Up),
            ],
            vec![("Twist", vec![1, 2])],
        );

        let mut arm = topology::build(&scan).unwrap();
        let mut params = Params::default();
        params.groups.insert(
            "Twist".to_string(),
            toml::from_str("mirrored = true").unwrap(),
        );
        assign(&mut arm, &params);

        assert!(!arm.joint_by_id(1).unwrap().block_inverted);
        assert!(arm.joint_by_id(2).unwrap().block_inverted);
    }
}
