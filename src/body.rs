//! Bodies, body identifiers, and the free-list allocator that issues them.
//!
//! The free-list reuse scheme mirrors the source's `m_firstFreeBodyId` linked-list-through-
//! a-vector pattern: a removed slot's storage is overwritten with a link to the previous
//! head of the free list, and `create_body` pops from that list before growing the vector.

use std::rc::Rc;

use crate::error::PhysicsError;
use crate::math::{normalize_angle, Real, Transform, Vec2};
use crate::shape::Shape;

/// Stable identifier for a body, valid for the body's lifetime in the `World`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(pub(crate) u32);

/// How a body participates in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionType {
    /// Infinite mass; never moved by the solver. `mInv = iInv = 0`.
    Static,
    /// Ignores forces and impulses but integrates an externally-set velocity every step.
    /// `mInv = iInv = 0`.
    Keyframed,
    /// Integrates forces, impulses, and velocity normally.
    Dynamic,
}

/// A simulated rigid body.
#[derive(Debug, Clone)]
pub struct Body {
    pub motion_type: MotionType,
    pub position: Vec2,
    pub orientation: Real,
    pub linear_velocity: Vec2,
    pub angular_velocity: Real,
    mass: Real,
    inv_mass: Real,
    inertia: Real,
    inv_inertia: Real,
    pub shape: Rc<Shape>,
}

impl Body {
    pub fn inv_mass(&self) -> Real {
        self.inv_mass
    }

    pub fn inv_inertia(&self) -> Real {
        self.inv_inertia
    }

    pub fn mass(&self) -> Real {
        self.mass
    }

    pub fn inertia(&self) -> Real {
        self.inertia
    }

    pub fn transform(&self) -> Transform {
        Transform::from_position_angle(self.position, self.orientation)
    }

    pub(crate) fn integrate_pose(&mut self, dt: Real) {
        self.position = self.position + self.linear_velocity * dt;
        self.orientation = normalize_angle(self.orientation + self.angular_velocity * dt);
    }

    fn set_motion_type(&mut self, motion_type: MotionType) {
        self.motion_type = motion_type;
        match motion_type {
            MotionType::Static | MotionType::Keyframed => {
                self.inv_mass = 0.0;
                self.inv_inertia = 0.0;
            }
            MotionType::Dynamic => {
                self.inv_mass = if self.mass > 0.0 { 1.0 / self.mass } else { 0.0 };
                self.inv_inertia = if self.inertia > 0.0 {
                    1.0 / self.inertia
                } else {
                    0.0
                };
            }
        }
    }
}

/// Construction parameters for a new body.
#[derive(Debug, Clone)]
pub struct BodyInfo {
    pub motion_type: MotionType,
    pub position: Vec2,
    pub orientation: Real,
    pub linear_velocity: Vec2,
    pub angular_velocity: Real,
    pub mass: Real,
    pub inertia: Real,
    pub shape: Rc<Shape>,
}

impl BodyInfo {
    pub fn new(shape: Rc<Shape>) -> Self {
        BodyInfo {
            motion_type: MotionType::Dynamic,
            position: Vec2::ZERO,
            orientation: 0.0,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            mass: 1.0,
            inertia: 1.0,
            shape,
        }
    }

    pub fn with_motion_type(mut self, motion_type: MotionType) -> Self {
        self.motion_type = motion_type;
        self
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_mass(mut self, mass: Real, inertia: Real) -> Self {
        self.mass = mass;
        self.inertia = inertia;
        self
    }

    pub fn with_velocity(mut self, linear: Vec2, angular: Real) -> Self {
        self.linear_velocity = linear;
        self.angular_velocity = angular;
        self
    }
}

#[derive(Debug)]
enum Slot {
    Occupied(Body),
    /// Free slot; carries the index of the next-most-recently-freed slot, or `None` if it
    /// is the tail of the free list.
    Free(Option<u32>),
}

/// Owns the population of bodies and issues/reuses `BodyId`s via a free list.
#[derive(Debug, Default)]
pub struct BodySet {
    slots: Vec<Slot>,
    first_free: Option<u32>,
}

impl BodySet {
    pub fn new() -> Self {
        BodySet {
            slots: Vec::new(),
            first_free: None,
        }
    }

    pub fn create(&mut self, info: BodyInfo) -> BodyId {
        let mut body = Body {
            motion_type: info.motion_type,
            position: info.position,
            orientation: normalize_angle(info.orientation),
            linear_velocity: info.linear_velocity,
            angular_velocity: info.angular_velocity,
            mass: info.mass,
            inv_mass: 0.0,
            inertia: info.inertia,
            inv_inertia: 0.0,
            shape: info.shape,
        };
        body.set_motion_type(info.motion_type);

        if let Some(index) = self.first_free {
            let next_free = match self.slots[index as usize] {
                Slot::Free(next) => next,
                Slot::Occupied(_) => unreachable!("free list pointed at an occupied slot"),
            };
            self.first_free = next_free;
            self.slots[index as usize] = Slot::Occupied(body);
            BodyId(index)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot::Occupied(body));
            BodyId(index)
        }
    }

    pub fn remove(&mut self, id: BodyId) -> Result<(), PhysicsError> {
        let slot = self
            .slots
            .get_mut(id.0 as usize)
            .ok_or(PhysicsError::InvalidBodyId)?;
        match slot {
            Slot::Occupied(_) => {
                *slot = Slot::Free(self.first_free);
                self.first_free = Some(id.0);
                Ok(())
            }
            Slot::Free(_) => Err(PhysicsError::InvalidBodyId),
        }
    }

    pub fn get(&self, id: BodyId) -> Result<&Body, PhysicsError> {
        match self.slots.get(id.0 as usize) {
            Some(Slot::Occupied(b)) => Ok(b),
            _ => Err(PhysicsError::InvalidBodyId),
        }
    }

    pub fn get_mut(&mut self, id: BodyId) -> Result<&mut Body, PhysicsError> {
        match self.slots.get_mut(id.0 as usize) {
            Some(Slot::Occupied(b)) => Ok(b),
            _ => Err(PhysicsError::InvalidBodyId),
        }
    }

    pub fn set_position(&mut self, id: BodyId, position: Vec2) -> Result<(), PhysicsError> {
        self.get_mut(id).map(|b| b.position = position)
    }

    pub fn set_motion_type(
        &mut self,
        id: BodyId,
        motion_type: MotionType,
    ) -> Result<(), PhysicsError> {
        self.get_mut(id).map(|b| b.set_motion_type(motion_type))
    }

    /// All currently-live body ids, in ascending order, for deterministic iteration.
    pub fn active_ids(&self) -> Vec<BodyId> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| match s {
                Slot::Occupied(_) => Some(BodyId(i as u32)),
                Slot::Free(_) => None,
            })
            .collect()
    }
}

/// An unordered pair of body ids, canonicalized so that `a < b`. Equality and hashing
/// ignore the order the ids were originally given in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyIdPair {
    pub a: BodyId,
    pub b: BodyId,
}

impl BodyIdPair {
    pub fn new(x: BodyId, y: BodyId) -> Self {
        if x < y {
            BodyIdPair { a: x, b: y }
        } else {
            BodyIdPair { a: y, b: x }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;

    fn circle() -> Rc<Shape> {
        Rc::new(Shape::new_circle(1.0))
    }

    #[test]
    fn static_body_has_zero_inverse_mass_and_inertia() {
        let mut set = BodySet::new();
        let id = set.create(
            BodyInfo::new(circle())
                .with_motion_type(MotionType::Static)
                .with_mass(5.0, 5.0),
        );
        let b = set.get(id).unwrap();
        assert_eq!(b.inv_mass(), 0.0);
        assert_eq!(b.inv_inertia(), 0.0);
    }

    #[test]
    fn dynamic_body_has_reciprocal_inverse_mass() {
        let mut set = BodySet::new();
        let id = set.create(BodyInfo::new(circle()).with_mass(2.0, 4.0));
        let b = set.get(id).unwrap();
        assert_eq!(b.inv_mass(), 0.5);
        assert_eq!(b.inv_inertia(), 0.25);
    }

    #[test]
    fn freed_slot_is_reused_by_next_create() {
        let mut set = BodySet::new();
        let first = set.create(BodyInfo::new(circle()));
        let second = set.create(BodyInfo::new(circle()));
        set.remove(first).unwrap();
        let third = set.create(BodyInfo::new(circle()));
        assert_eq!(third, first);
        assert_ne!(second, third);
    }

    #[test]
    fn removing_unknown_id_is_an_error() {
        let mut set = BodySet::new();
        assert!(matches!(
            set.remove(BodyId(42)),
            Err(PhysicsError::InvalidBodyId)
        ));
    }

    #[test]
    fn removing_twice_is_an_error() {
        let mut set = BodySet::new();
        let id = set.create(BodyInfo::new(circle()));
        set.remove(id).unwrap();
        assert!(matches!(set.remove(id), Err(PhysicsError::InvalidBodyId)));
    }

    #[test]
    fn body_id_pair_canonicalizes_order() {
        let a = BodyId(3);
        let b = BodyId(1);
        assert_eq!(BodyIdPair::new(a, b), BodyIdPair::new(b, a));
    }
}
