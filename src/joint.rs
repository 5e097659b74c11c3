//! Point-to-point joints (spec §3, §4.9) and their free-list allocator.
//!
//! The allocator mirrors `body::BodySet`'s free-list, which is itself grounded on the
//! source's `m_firstFreeBodyId` pattern (`examples/original_source/Physics/physicsWorld.h`);
//! the spec notes the same lifecycle applies to joints as to bodies (§3, "Joints likewise").

use crate::body::BodyId;
use crate::error::PhysicsError;
use crate::math::Vec2;

/// Stable identifier for a joint, valid for the joint's lifetime in the `World`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JointId(pub(crate) u32);

/// A fixed point-to-point constraint between two bodies, anchored in each body's own local
/// frame at creation time so the two anchors track their bodies' poses independently —
/// the positional error the solver corrects is the world-space gap between them, which is
/// only ever zero when the joint is perfectly satisfied.
#[derive(Debug, Clone, Copy)]
pub struct Joint {
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
}

#[derive(Debug)]
enum Slot {
    Occupied(Joint),
    Free(Option<u32>),
}

/// Owns the population of joints and issues/reuses `JointId`s via a free list.
#[derive(Debug, Default)]
pub struct JointSet {
    slots: Vec<Slot>,
    first_free: Option<u32>,
}

impl JointSet {
    pub fn new() -> Self {
        JointSet {
            slots: Vec::new(),
            first_free: None,
        }
    }

    pub fn add(&mut self, joint: Joint) -> JointId {
        if let Some(index) = self.first_free {
            let next_free = match self.slots[index as usize] {
                Slot::Free(next) => next,
                Slot::Occupied(_) => unreachable!("free list pointed at an occupied slot"),
            };
            self.first_free = next_free;
            self.slots[index as usize] = Slot::Occupied(joint);
            JointId(index)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot::Occupied(joint));
            JointId(index)
        }
    }

    pub fn remove(&mut self, id: JointId) -> Result<(), PhysicsError> {
        let slot = self
            .slots
            .get_mut(id.0 as usize)
            .ok_or(PhysicsError::InvalidJointId)?;
        match slot {
            Slot::Occupied(_) => {
                *slot = Slot::Free(self.first_free);
                self.first_free = Some(id.0);
                Ok(())
            }
            Slot::Free(_) => Err(PhysicsError::InvalidJointId),
        }
    }

    /// All currently-live joints, in ascending id order, for deterministic iteration.
    pub fn active(&self) -> impl Iterator<Item = (JointId, &Joint)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| match s {
            Slot::Occupied(j) => Some((JointId(i as u32), j)),
            Slot::Free(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodyId;

    #[test]
    fn freed_joint_slot_is_reused() {
        let mut set = JointSet::new();
        let joint = Joint {
            body_a: BodyId(0),
            body_b: BodyId(1),
            local_anchor_a: Vec2::ZERO,
            local_anchor_b: Vec2::ZERO,
        };
        let first = set.add(joint);
        set.remove(first).unwrap();
        let second = set.add(joint);
        assert_eq!(first, second);
    }

    #[test]
    fn removing_unknown_joint_is_an_error() {
        let mut set = JointSet::new();
        assert!(matches!(
            set.remove(JointId(7)),
            Err(PhysicsError::InvalidJointId)
        ));
    }
}
