//! Constraint assembly (spec §4.9) and the Gauss-Seidel / sequential-impulse solver
//! (spec §4.10).
//!
//! Grounded on `examples/original_source/Physics/physicsSolver.h`'s `Jacobian`,
//! `Constraint`, `ConstrainedPair`, `SolverBody`, and `SolverInfo` types, which this
//! module's `Constraint`/`ConstrainedPair`/`SolverBody`/`SolverConfig` mirror field-for-
//! field. The Baumgarte bias shape is cross-checked against
//! `rhusics-core/src/physics/resolution.rs`'s `resolve_contact`, though that file solves a
//! single contact directly rather than assembling a general row list, so it is used for
//! texture only.

use std::collections::HashMap;

use crate::body::{Body, BodyId, BodyIdPair};
use crate::cache::CachedPair;
use crate::joint::Joint;
use crate::math::Real;
use crate::math::Vec2;

/// Baumgarte stabilization factor (spec §4.9 example value).
const BAUMGARTE_BETA: Real = 0.1;

/// Scratch velocity/pose state for one body during a solve, written back to the owning
/// `Body` at the end of `World::step`.
#[derive(Debug, Clone, Copy)]
pub struct SolverBody {
    pub linear_velocity: Vec2,
    pub angular_velocity: Real,
    pub position: Vec2,
    pub orientation: Real,
    pub inv_mass: Real,
    pub inv_inertia: Real,
}

impl SolverBody {
    pub fn from_body(body: &Body) -> Self {
        SolverBody {
            linear_velocity: body.linear_velocity,
            angular_velocity: body.angular_velocity,
            position: body.position,
            orientation: body.orientation,
            inv_mass: body.inv_mass(),
            inv_inertia: body.inv_inertia(),
        }
    }
}

/// One solver row: a 1x6 Jacobian over `[vA, wA, vB, wB]`, plus the state carried between
/// Gauss-Seidel passes.
#[derive(Debug, Clone, Copy)]
pub struct Constraint {
    lin_a: Vec2,
    ang_a: Real,
    lin_b: Vec2,
    ang_b: Real,
    /// Velocity-level bias added to `Jv` before solving (Baumgarte positional
    /// correction). Negative when the bodies need to separate, so that `lambda =
    /// -m_eff * (Jv + bias)` comes out positive (a separating impulse).
    bias: Real,
    accum_impulse: Real,
    /// Contact rows clamp their accumulated impulse to `[0, inf)`; joint rows do not.
    clamp_non_negative: bool,
}

impl Constraint {
    fn effective_mass(&self, a: &SolverBody, b: &SolverBody) -> Real {
        let k = a.inv_mass * self.lin_a.length_squared()
            + a.inv_inertia * self.ang_a * self.ang_a
            + b.inv_mass * self.lin_b.length_squared()
            + b.inv_inertia * self.ang_b * self.ang_b;
        if k > Real::EPSILON {
            1.0 / k
        } else {
            0.0
        }
    }

    fn jv(&self, a: &SolverBody, b: &SolverBody) -> Real {
        self.lin_a.dot(a.linear_velocity)
            + self.ang_a * a.angular_velocity
            + self.lin_b.dot(b.linear_velocity)
            + self.ang_b * b.angular_velocity
    }

    fn apply(&self, a: &mut SolverBody, b: &mut SolverBody, applied: Real) {
        a.linear_velocity = a.linear_velocity + self.lin_a * (a.inv_mass * applied);
        a.angular_velocity += a.inv_inertia * self.ang_a * applied;
        b.linear_velocity = b.linear_velocity + self.lin_b * (b.inv_mass * applied);
        b.angular_velocity += b.inv_inertia * self.ang_b * applied;
    }

    /// Runs one sequential-impulse pass over this row, per spec §4.10 steps 1-5.
    fn solve(&mut self, a: &mut SolverBody, b: &mut SolverBody) {
        let m_eff = self.effective_mass(a, b);
        let lambda = -m_eff * (self.jv(a, b) + self.bias);
        let applied = if self.clamp_non_negative {
            let new_accum = (self.accum_impulse + lambda).max(0.0);
            let applied = new_accum - self.accum_impulse;
            self.accum_impulse = new_accum;
            applied
        } else {
            self.accum_impulse += lambda;
            lambda
        };
        self.apply(a, b, applied);
    }

    pub fn accum_impulse(&self) -> Real {
        self.accum_impulse
    }
}

/// A `BodyIdPair` plus its ordered list of constraint rows (spec's `ConstrainedPair`).
#[derive(Debug)]
pub struct ConstrainedPair {
    pub pair: BodyIdPair,
    pub constraints: Vec<Constraint>,
    /// Index into the row back to its originating manifold slot (0 or 1), so the solved
    /// impulse can be written back into the `CachedPair` for next frame's warm start.
    /// `None` for joint rows, which have no manifold slot.
    slot_of_row: Vec<Option<usize>>,
}

/// Builds one contact row per cached manifold point for `pair`, warm-starting each row's
/// accumulated impulse from the cache and applying that impulse immediately (spec §4.8's
/// warm-start contract).
pub fn assemble_contact_constraints(
    pair: BodyIdPair,
    cached: &CachedPair,
    bodies: &mut HashMap<BodyId, SolverBody>,
    dt: Real,
    restitution: Real,
) -> ConstrainedPair {
    let mut constraints = Vec::new();
    let mut slot_of_row = Vec::new();

    for (slot_index, cached_contact) in cached.contacts().enumerate() {
        let cp = &cached_contact.point;
        let n = cp.normal;

        // rA/rB: vectors from each body's center of mass to the contact point, in world
        // space. The contact point itself is stored in each body's local frame (spec
        // §3), so recompute its world position from the body's current pose before
        // taking the offset — local_a/local_b are *positions*, not anchors relative to
        // the COM, so we can't skip the transform.
        let a_body = &bodies[&pair.a];
        let b_body = &bodies[&pair.b];
        let r_a = crate::math::Transform::from_position_angle(a_body.position, a_body.orientation)
            .transform_point(cp.local_a)
            - a_body.position;
        let r_b = crate::math::Transform::from_position_angle(b_body.position, b_body.orientation)
            .transform_point(cp.local_b)
            - b_body.position;

        let lin_a = -n;
        let ang_a = -r_a.cross(n);
        let lin_b = n;
        let ang_b = r_b.cross(n);

        // Closing velocity along the normal before this step's impulses are applied.
        // Folded into the bias alongside Baumgarte so an approaching pair separates at
        // `restitution` times its incoming speed (spec §6.3's `restitution` field; §4.9
        // only specifies the Baumgarte term explicitly, so this is a supplementing
        // decision recorded in DESIGN.md).
        let closing_velocity = lin_a.dot(a_body.linear_velocity)
            + ang_a * a_body.angular_velocity
            + lin_b.dot(b_body.linear_velocity)
            + ang_b * b_body.angular_velocity;
        let restitution_bias = restitution * closing_velocity.min(0.0);

        let mut constraint = Constraint {
            lin_a,
            ang_a,
            lin_b,
            ang_b,
            bias: restitution_bias - BAUMGARTE_BETA * cp.depth.max(0.0) / dt,
            accum_impulse: cached_contact.accum_normal_impulse,
            clamp_non_negative: true,
        };

        // Warm start: apply the carried-over impulse immediately on creation.
        let applied = constraint.accum_impulse;
        with_pair_mut(bodies, pair.a, pair.b, |a_body, b_body| {
            constraint.apply(a_body, b_body, applied);
        });

        constraints.push(constraint);
        slot_of_row.push(Some(slot_index));
    }

    ConstrainedPair {
        pair,
        constraints,
        slot_of_row,
    }
}

/// Builds the two axis-aligned rows for a point-to-point joint (spec §4.9). Each body's
/// anchor is carried in its own local frame (`Joint::local_anchor_a/b`) and re-expressed in
/// world space from its current pose every call, so `error` is the true world-space gap
/// between the two anchors rather than a value that is zero by construction.
pub fn assemble_joint_constraints(joint: &Joint, bodies: &HashMap<BodyId, SolverBody>, dt: Real) -> ConstrainedPair {
    let a_body = &bodies[&joint.body_a];
    let b_body = &bodies[&joint.body_b];
    let r_a = crate::math::Transform::from_position_angle(a_body.position, a_body.orientation)
        .transform_point(joint.local_anchor_a)
        - a_body.position;
    let r_b = crate::math::Transform::from_position_angle(b_body.position, b_body.orientation)
        .transform_point(joint.local_anchor_b)
        - b_body.position;

    let anchor_a = a_body.position + r_a;
    let anchor_b = b_body.position + r_b;
    let error = anchor_b - anchor_a;

    let mut constraints = Vec::with_capacity(2);
    for axis in [Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)] {
        let error_along_axis = error.dot(axis);
        constraints.push(Constraint {
            lin_a: -axis,
            ang_a: -r_a.cross(axis),
            lin_b: axis,
            ang_b: r_b.cross(axis),
            bias: -(BAUMGARTE_BETA * error_along_axis / dt),
            accum_impulse: 0.0,
            clamp_non_negative: false,
        });
    }

    ConstrainedPair {
        pair: BodyIdPair::new(joint.body_a, joint.body_b),
        constraints,
        slot_of_row: vec![None, None],
    }
}

/// Gives `f` simultaneous mutable access to two distinct map entries. `HashMap` has no
/// built-in way to borrow two entries at once, so the pair is taken out, handed to `f`,
/// and put back.
fn with_pair_mut<F>(bodies: &mut HashMap<BodyId, SolverBody>, a: BodyId, b: BodyId, f: F)
where
    F: FnOnce(&mut SolverBody, &mut SolverBody),
{
    assert_ne!(a, b, "a constrained pair must never reference the same body twice");
    let mut a_body = bodies.remove(&a).expect("body must be present for the duration of the solve");
    let mut b_body = bodies.remove(&b).expect("body must be present for the duration of the solve");
    f(&mut a_body, &mut b_body);
    bodies.insert(a, a_body);
    bodies.insert(b, b_body);
}

/// Runs `num_iterations` Gauss-Seidel passes over every constrained pair's rows,
/// mutating `bodies` in place, then writes the final accumulated contact impulses back
/// into `cached_pairs` for next frame's warm start (spec §4.10, §4.8).
pub fn solve(
    constrained_pairs: &mut [ConstrainedPair],
    bodies: &mut HashMap<BodyId, SolverBody>,
    num_iterations: u32,
) {
    for _ in 0..num_iterations {
        for cp in constrained_pairs.iter_mut() {
            with_pair_mut(bodies, cp.pair.a, cp.pair.b, |a_body, b_body| {
                for constraint in cp.constraints.iter_mut() {
                    constraint.solve(a_body, b_body);
                }
            });
        }
    }
}

impl ConstrainedPair {
    /// Writes this pair's solved contact-row impulses back into `cached`, keyed by
    /// manifold slot, so the next frame's contact cache warm-starts from them.
    pub fn write_back_impulses(&self, cached: &mut CachedPair) {
        for (constraint, slot) in self.constraints.iter().zip(self.slot_of_row.iter()) {
            if let Some(slot) = slot {
                cached.set_accum_impulse(*slot, constraint.accum_impulse());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collide::ContactPoint;

    fn dynamic_solver_body(position: Vec2, velocity: Vec2) -> SolverBody {
        SolverBody {
            linear_velocity: velocity,
            angular_velocity: 0.0,
            position,
            orientation: 0.0,
            inv_mass: 1.0,
            inv_inertia: 1.0,
        }
    }

    #[test]
    fn head_on_equal_mass_contact_reverses_closing_velocity() {
        // Two unit masses approaching each other along x, restitution baked in by the
        // accumulated-impulse clamp alone is not modeled here (spec's solver has no
        // explicit restitution term beyond the bias); this test exercises row mechanics.
        let mut a = dynamic_solver_body(Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0));
        let mut b = dynamic_solver_body(Vec2::new(1.0, 0.0), Vec2::new(-1.0, 0.0));
        let n = Vec2::new(1.0, 0.0);
        let mut constraint = Constraint {
            lin_a: -n,
            ang_a: 0.0,
            lin_b: n,
            ang_b: 0.0,
            bias: 0.0,
            accum_impulse: 0.0,
            clamp_non_negative: true,
        };
        for _ in 0..20 {
            constraint.solve(&mut a, &mut b);
        }
        // Separating velocity should no longer be negative (closing).
        let closing = constraint.jv(&a, &b);
        assert!(closing >= -1e-4);
    }

    #[test]
    fn static_body_never_receives_velocity() {
        let mut a = SolverBody {
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            position: Vec2::ZERO,
            orientation: 0.0,
            inv_mass: 0.0,
            inv_inertia: 0.0,
        };
        let mut b = dynamic_solver_body(Vec2::new(1.0, 0.0), Vec2::new(-5.0, 0.0));
        let n = Vec2::new(1.0, 0.0);
        let mut constraint = Constraint {
            lin_a: -n,
            ang_a: 0.0,
            lin_b: n,
            ang_b: 0.0,
            bias: 0.0,
            accum_impulse: 0.0,
            clamp_non_negative: true,
        };
        for _ in 0..10 {
            constraint.solve(&mut a, &mut b);
        }
        assert_eq!(a.linear_velocity, Vec2::ZERO);
    }

    #[test]
    fn joint_constraint_bias_is_nonzero_once_anchors_drift_apart() {
        let joint = Joint {
            body_a: BodyId(0),
            body_b: BodyId(1),
            local_anchor_a: Vec2::new(1.0, 0.0),
            local_anchor_b: Vec2::new(-1.0, 0.0),
        };

        let mut bodies = HashMap::new();
        bodies.insert(BodyId(0), dynamic_solver_body(Vec2::ZERO, Vec2::ZERO));
        bodies.insert(BodyId(1), dynamic_solver_body(Vec2::new(2.0, 0.0), Vec2::ZERO));
        let satisfied = assemble_joint_constraints(&joint, &bodies, 1.0 / 60.0);
        assert!(satisfied.constraints.iter().all(|c| c.bias.abs() < 1e-6));

        // Body B has drifted away from the pivot distance the joint was created at.
        bodies.insert(BodyId(1), dynamic_solver_body(Vec2::new(3.0, 0.0), Vec2::ZERO));
        let drifted = assemble_joint_constraints(&joint, &bodies, 1.0 / 60.0);
        assert!(
            drifted.constraints[0].bias.abs() > 1e-3,
            "expected a nonzero positional bias once the anchors no longer coincide"
        );
    }

    #[test]
    fn assemble_contact_constraints_warm_starts_from_cache() {
        let mut bodies = HashMap::new();
        bodies.insert(BodyId(0), dynamic_solver_body(Vec2::new(0.0, 0.0), Vec2::ZERO));
        bodies.insert(BodyId(1), dynamic_solver_body(Vec2::new(1.5, 0.0), Vec2::ZERO));
        let pair = BodyIdPair::new(BodyId(0), BodyId(1));

        let mut cached = CachedPair::new();
        cached.add_contact(
            ContactPoint {
                depth: 0.5,
                local_a: Vec2::new(1.0, 0.0),
                local_b: Vec2::new(-1.0, 0.0),
                normal: Vec2::new(1.0, 0.0),
            },
            5.0,
        );
        cached.set_accum_impulse(0, 2.0);

        let constrained = assemble_contact_constraints(pair, &cached, &mut bodies, 1.0 / 60.0, 1.0);
        assert_eq!(constrained.constraints.len(), 1);
        // Warm start should have already pushed the bodies apart along the normal.
        assert!(bodies[&BodyId(0)].linear_velocity.x < 0.0);
        assert!(bodies[&BodyId(1)].linear_velocity.x > 0.0);
    }
}
