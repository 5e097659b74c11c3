//! The simulation world: owns all bodies, joints, and per-pair contact caches, and drives
//! the six-stage step pipeline (spec §2).
//!
//! Grounded on `examples/other_examples/.../Particle_Accelerator__src-world.rs.rs`'s
//! fixed-step `World::step` shape (plain config struct, per-stage `trace!`/`debug!`
//! logging) and `examples/original_source/Physics/physicsWorld.h`'s method list
//! (`createBody`/`removeBody`/`addJoint`/`removeJoint`/`setPosition`/`setMotionType`).

use std::collections::{HashMap, HashSet};

use log::{debug, trace};

use crate::body::{Body, BodyId, BodyIdPair, BodyInfo, BodySet, MotionType};
use crate::broadphase::{self, BroadphaseResult};
use crate::cache::CachedPair;
use crate::collide::narrow_phase;
use crate::draw::{ContactDraw, DrawSink, NullDrawSink};
use crate::error::PhysicsError;
use crate::joint::{Joint, JointId, JointSet};
use crate::math::{Real, Vec2};
use crate::solver::{self, SolverBody};

/// In-memory configuration for a `World` (spec §6.3). There is no file- or environment-
/// based configuration; this struct is the entire configuration surface.
#[derive(Debug, Clone, Copy)]
pub struct WorldConfig {
    pub gravity: Vec2,
    pub delta_time: Real,
    pub restitution: Real,
    pub num_iterations: u32,
    /// Distance threshold τ used by the contact cache to decide whether a fresh contact
    /// point is "the same" as a previously cached one (spec §4.8, §9).
    pub contact_merge_threshold: Real,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            gravity: Vec2::ZERO,
            delta_time: 1.0 / 60.0,
            restitution: 1.0,
            num_iterations: 8,
            contact_merge_threshold: 5.0,
        }
    }
}

/// Owns every body, joint, and persistent contact cache, and advances them one step at a
/// time.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    bodies: BodySet,
    joints: JointSet,
    cached_pairs: HashMap<BodyIdPair, CachedPair>,
    overlapping_pairs: HashSet<BodyIdPair>,
}

impl World {
    pub fn new(config: WorldConfig) -> Self {
        World {
            config,
            bodies: BodySet::new(),
            joints: JointSet::new(),
            cached_pairs: HashMap::new(),
            overlapping_pairs: HashSet::new(),
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn create_body(&mut self, info: BodyInfo) -> BodyId {
        self.bodies.create(info)
    }

    pub fn remove_body(&mut self, id: BodyId) -> Result<(), PhysicsError> {
        self.bodies.remove(id)
    }

    /// Creates a point-to-point joint pinning `body_a` and `body_b` together at the given
    /// world-space pivot. The pivot is converted to each body's local frame immediately and
    /// not stored itself, so the two anchors track their own body's pose from then on.
    pub fn add_joint(&mut self, body_a: BodyId, body_b: BodyId, pivot: Vec2) -> JointId {
        let local_anchor_a = self
            .bodies
            .get(body_a)
            .expect("valid body id")
            .transform()
            .transform_point_inverse(pivot)
            .expect("body transform is always invertible");
        let local_anchor_b = self
            .bodies
            .get(body_b)
            .expect("valid body id")
            .transform()
            .transform_point_inverse(pivot)
            .expect("body transform is always invertible");
        self.joints.add(Joint {
            body_a,
            body_b,
            local_anchor_a,
            local_anchor_b,
        })
    }

    pub fn remove_joint(&mut self, id: JointId) -> Result<(), PhysicsError> {
        self.joints.remove(id)
    }

    pub fn set_position(&mut self, id: BodyId, position: Vec2) -> Result<(), PhysicsError> {
        self.bodies.set_position(id, position)
    }

    pub fn set_motion_type(
        &mut self,
        id: BodyId,
        motion_type: MotionType,
    ) -> Result<(), PhysicsError> {
        self.bodies.set_motion_type(id, motion_type)
    }

    /// All currently-live body ids, in ascending order (spec §5's determinism contract).
    pub fn active_body_ids(&self) -> Vec<BodyId> {
        self.bodies.active_ids()
    }

    pub fn body(&self, id: BodyId) -> Result<&Body, PhysicsError> {
        self.bodies.get(id)
    }

    /// Advances the world by `delta_time`, discarding debug-draw output.
    pub fn step(&mut self) {
        self.step_with_draw(&mut NullDrawSink);
    }

    /// Advances the world by `delta_time`, reporting per-body poses and per-contact draw
    /// data to `sink` as they are produced (spec §6's debug-draw contract).
    pub fn step_with_draw(&mut self, sink: &mut dyn DrawSink) {
        let dt = self.config.delta_time;
        let ids = self.bodies.active_ids();

        trace!("step: integrate forces ({} active bodies)", ids.len());
        for &id in &ids {
            let body = self.bodies.get_mut(id).expect("active id is valid");
            if body.motion_type == MotionType::Dynamic {
                body.linear_velocity = body.linear_velocity + self.config.gravity * dt;
            }
        }
        for &id in &ids {
            sink.body(id, self.bodies.get(id).expect("active id is valid"));
        }

        trace!("step: broadphase");
        let BroadphaseResult {
            new_pairs,
            existing_pairs,
            destroyed_pairs,
        } = broadphase::compute(&ids, &self.bodies, &self.overlapping_pairs);

        for pair in &destroyed_pairs {
            debug!("destroying cached pair {:?}", pair);
            self.cached_pairs.remove(pair);
        }
        self.overlapping_pairs = new_pairs
            .iter()
            .chain(existing_pairs.iter())
            .copied()
            .collect();

        trace!("step: narrow-phase + contact caching");
        for &pair in new_pairs.iter().chain(existing_pairs.iter()) {
            let a = self.bodies.get(pair.a).expect("active id is valid");
            let b = self.bodies.get(pair.b).expect("active id is valid");
            let ta = a.transform();
            let tb = b.transform();
            let contacts = narrow_phase(&a.shape, &ta, &b.shape, &tb);

            let is_new = !self.cached_pairs.contains_key(&pair);
            if is_new {
                debug!("creating cached pair {:?}", pair);
            }
            let entry = self.cached_pairs.entry(pair).or_insert_with(CachedPair::new);
            for cp in &contacts {
                sink.contact(ContactDraw {
                    body_a: pair.a,
                    body_b: pair.b,
                    world_point: ta.transform_point(cp.local_a),
                    world_normal: cp.normal,
                    depth: cp.depth,
                });
                entry.add_contact(*cp, self.config.contact_merge_threshold);
            }
        }

        trace!("step: constraint assembly");
        let mut solver_bodies: HashMap<BodyId, SolverBody> = ids
            .iter()
            .map(|&id| {
                (
                    id,
                    SolverBody::from_body(self.bodies.get(id).expect("active id is valid")),
                )
            })
            .collect();

        // Ascending pair/joint-id order throughout, never hash order, per spec §5.
        let mut pairs: Vec<BodyIdPair> = self.cached_pairs.keys().copied().collect();
        pairs.sort();

        let mut constrained_pairs = Vec::with_capacity(pairs.len() + self.joints.active().count());
        for pair in pairs {
            let cached = &self.cached_pairs[&pair];
            if cached.is_empty() {
                continue;
            }
            constrained_pairs.push(solver::assemble_contact_constraints(
                pair,
                cached,
                &mut solver_bodies,
                dt,
                self.config.restitution,
            ));
        }
        for (_, joint) in self.joints.active() {
            constrained_pairs.push(solver::assemble_joint_constraints(joint, &solver_bodies, dt));
        }

        trace!("step: iterative solve ({} constrained pairs)", constrained_pairs.len());
        solver::solve(&mut constrained_pairs, &mut solver_bodies, self.config.num_iterations);

        for cp in &constrained_pairs {
            if let Some(cached) = self.cached_pairs.get_mut(&cp.pair) {
                cp.write_back_impulses(cached);
            }
        }

        trace!("step: integrate pose");
        for &id in &ids {
            if let Some(sb) = solver_bodies.get(&id) {
                let body = self.bodies.get_mut(id).expect("active id is valid");
                body.linear_velocity = sb.linear_velocity;
                body.angular_velocity = sb.angular_velocity;
                body.integrate_pose(dt);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;
    use std::rc::Rc;

    fn circle(radius: Real) -> Rc<Shape> {
        Rc::new(Shape::new_circle(radius))
    }

    fn boxed(half_extents: Vec2) -> Rc<Shape> {
        Rc::new(Shape::new_box(half_extents))
    }

    #[test]
    fn static_body_never_moves() {
        let mut world = World::new(WorldConfig {
            gravity: Vec2::new(0.0, -10.0),
            ..Default::default()
        });
        let id = world.create_body(
            BodyInfo::new(boxed(Vec2::new(5.0, 0.5)))
                .with_motion_type(MotionType::Static)
                .with_position(Vec2::new(0.0, 0.0)),
        );
        let before = world.body(id).unwrap().position;
        for _ in 0..10 {
            world.step();
        }
        let after = world.body(id).unwrap().position;
        assert_eq!(before, after);
    }

    /// Scenario 2 (spec §8): circle falling on a static box under gravity settles near
    /// y ~= 1.5 (box top at 0.5, circle radius 1) with near-zero vertical velocity.
    #[test]
    fn circle_falls_and_rests_on_box() {
        let mut world = World::new(WorldConfig {
            gravity: Vec2::new(0.0, -10.0),
            delta_time: 1.0 / 60.0,
            num_iterations: 8,
            restitution: 0.0,
            ..Default::default()
        });
        world.create_body(
            BodyInfo::new(boxed(Vec2::new(5.0, 0.5)))
                .with_motion_type(MotionType::Static)
                .with_position(Vec2::new(0.0, 0.0)),
        );
        let ball = world.create_body(
            BodyInfo::new(circle(1.0))
                .with_position(Vec2::new(0.0, 5.0))
                .with_mass(1.0, 1.0),
        );

        for _ in 0..120 {
            world.step();
        }

        let resting = world.body(ball).unwrap();
        assert!(resting.position.y > 1.3 && resting.position.y < 1.7);
        assert!(resting.linear_velocity.y.abs() < 1.0);
    }

    /// Scenario 3 (spec §8): a point-to-point joint keeps two bodies at the pivot's
    /// distance apart after a step under gravity.
    #[test]
    fn joint_keeps_bodies_at_pivot_distance() {
        let mut world = World::new(WorldConfig {
            gravity: Vec2::new(0.0, -10.0),
            ..Default::default()
        });
        let a = world.create_body(
            BodyInfo::new(circle(0.2))
                .with_motion_type(MotionType::Static)
                .with_position(Vec2::ZERO),
        );
        let b = world.create_body(
            BodyInfo::new(circle(0.2))
                .with_position(Vec2::new(2.0, 0.0))
                .with_mass(1.0, 1.0),
        );
        world.add_joint(a, b, Vec2::new(1.0, 0.0));

        world.step();

        let pa = world.body(a).unwrap().position;
        let pb = world.body(b).unwrap().position;
        let distance = (pb - pa).length();
        assert!((distance - 2.0).abs() < 0.05, "distance was {}", distance);
    }

    /// Scenario 6 (spec §8): equal-mass circles approaching head-on at restitution 1
    /// reverse their velocities after colliding.
    #[test]
    fn head_on_collision_with_full_restitution_reverses_velocity() {
        let mut world = World::new(WorldConfig {
            gravity: Vec2::ZERO,
            delta_time: 1.0 / 60.0,
            num_iterations: 16,
            restitution: 1.0,
            ..Default::default()
        });
        let a = world.create_body(
            BodyInfo::new(circle(0.5))
                .with_position(Vec2::new(-0.6, 0.0))
                .with_mass(1.0, 1.0)
                .with_velocity(Vec2::new(2.0, 0.0), 0.0),
        );
        let b = world.create_body(
            BodyInfo::new(circle(0.5))
                .with_position(Vec2::new(0.6, 0.0))
                .with_mass(1.0, 1.0)
                .with_velocity(Vec2::new(-2.0, 0.0), 0.0),
        );

        for _ in 0..5 {
            world.step();
        }

        let va = world.body(a).unwrap().linear_velocity.x;
        let vb = world.body(b).unwrap().linear_velocity.x;
        assert!(va < 0.0, "A should have bounced back, got {}", va);
        assert!(vb > 0.0, "B should have bounced back, got {}", vb);
    }

    /// Momentum conservation (spec §8 universal invariant): two dynamic bodies, no
    /// gravity, no joints — total linear momentum is conserved across one step.
    #[test]
    fn momentum_is_conserved_without_gravity_or_joints() {
        let mut world = World::new(WorldConfig {
            gravity: Vec2::ZERO,
            ..Default::default()
        });
        let a = world.create_body(
            BodyInfo::new(circle(0.5))
                .with_position(Vec2::new(-0.6, 0.0))
                .with_mass(2.0, 1.0)
                .with_velocity(Vec2::new(1.0, 0.0), 0.0),
        );
        let b = world.create_body(
            BodyInfo::new(circle(0.5))
                .with_position(Vec2::new(0.6, 0.0))
                .with_mass(3.0, 1.0)
                .with_velocity(Vec2::new(-0.5, 0.0), 0.0),
        );

        let before = {
            let ba = world.body(a).unwrap();
            let bb = world.body(b).unwrap();
            ba.linear_velocity * ba.mass() + bb.linear_velocity * bb.mass()
        };

        world.step();

        let after = {
            let ba = world.body(a).unwrap();
            let bb = world.body(b).unwrap();
            ba.linear_velocity * ba.mass() + bb.linear_velocity * bb.mass()
        };

        assert!((before.x - after.x).abs() < 1e-3, "before {:?} after {:?}", before, after);
    }

    /// Non-penetration (spec §8 universal invariant): with no external force pushing two
    /// overlapping circles further together, the cached contact depth never grows from one
    /// step to the next — the solver only ever pushes penetration down.
    #[test]
    fn cached_contact_depth_never_increases_absent_driving_force() {
        let mut world = World::new(WorldConfig {
            gravity: Vec2::ZERO,
            ..Default::default()
        });
        let a = world.create_body(
            BodyInfo::new(circle(1.0))
                .with_position(Vec2::new(-0.3, 0.0))
                .with_mass(1.0, 1.0),
        );
        let b = world.create_body(
            BodyInfo::new(circle(1.0))
                .with_position(Vec2::new(0.3, 0.0))
                .with_mass(1.0, 1.0),
        );

        let mut previous_depth = Real::INFINITY;
        for _ in 0..30 {
            world.step();
            let pair = BodyIdPair::new(a, b);
            if let Some(cached) = world.cached_pairs.get(&pair) {
                if let Some(max_depth) = cached.contacts().map(|c| c.point.depth).fold(None, |m, d| {
                    Some(m.map_or(d, |existing: Real| existing.max(d)))
                }) {
                    assert!(
                        max_depth <= previous_depth + 1e-3,
                        "penetration depth grew from {} to {}",
                        previous_depth,
                        max_depth
                    );
                    previous_depth = max_depth;
                }
            }
        }
    }

    /// Warm-start stability (spec §8 universal invariant): a body resting on a static box
    /// settles with less residual penetration as `num_iterations` grows, converging toward
    /// zero rather than drifting further apart or oscillating.
    #[test]
    fn more_iterations_yields_less_residual_penetration_at_rest() {
        fn settle(num_iterations: u32) -> Real {
            let mut world = World::new(WorldConfig {
                gravity: Vec2::new(0.0, -10.0),
                delta_time: 1.0 / 60.0,
                num_iterations,
                restitution: 0.0,
                ..Default::default()
            });
            world.create_body(
                BodyInfo::new(boxed(Vec2::new(5.0, 0.5)))
                    .with_motion_type(MotionType::Static)
                    .with_position(Vec2::new(0.0, 0.0)),
            );
            let ball = world.create_body(
                BodyInfo::new(circle(1.0))
                    .with_position(Vec2::new(0.0, 5.0))
                    .with_mass(1.0, 1.0),
            );
            for _ in 0..180 {
                world.step();
            }
            let resting_y = world.body(ball).unwrap().position.y;
            (1.5 - resting_y).abs()
        }

        let low_iter_error = settle(1);
        let high_iter_error = settle(32);
        assert!(
            high_iter_error <= low_iter_error + 1e-3,
            "low-iteration error {} should not be smaller than high-iteration error {}",
            low_iter_error,
            high_iter_error
        );
    }

    #[test]
    fn broadphase_pair_is_destroyed_once_bodies_separate() {
        let mut world = World::new(WorldConfig::default());
        let a = world.create_body(BodyInfo::new(boxed(Vec2::new(1.0, 1.0))).with_position(Vec2::new(0.0, 0.0)));
        let b = world.create_body(BodyInfo::new(boxed(Vec2::new(1.0, 1.0))).with_position(Vec2::new(1.5, 0.0)));
        world.step();
        assert!(world.cached_pairs.contains_key(&BodyIdPair::new(a, b)));

        world.set_position(b, Vec2::new(50.0, 0.0)).unwrap();
        world.step();
        assert!(!world.cached_pairs.contains_key(&BodyIdPair::new(a, b)));
    }
}
