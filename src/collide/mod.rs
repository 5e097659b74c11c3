//! Narrow-phase dispatch.
//!
//! Grounded on `examples/original_source/Physics/physicsWorld.h`'s
//! `m_dispatchTable[NUM_SHAPES][NUM_SHAPES]`, but built symmetric by construction rather
//! than left undocumented: only the upper triangle (`tagA <= tagB`) is populated, and a
//! pair presented in the other order is dispatched by swapping the call and flipping the
//! resulting normals, per spec §4.3/§9.

pub mod circle;
pub mod convex;

use crate::math::{Real, Transform, Vec2};
use crate::shape::{Shape, ShapeTag};

/// One point of a contact manifold between two shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPoint {
    /// Penetration depth, always >= 0.
    pub depth: Real,
    /// Contact position on body A, in A's local frame.
    pub local_a: Vec2,
    /// Contact position on body B, in B's local frame.
    pub local_b: Vec2,
    /// Unit normal pointing from A to B, in world space.
    pub normal: Vec2,
}

impl ContactPoint {
    fn flip(self) -> ContactPoint {
        ContactPoint {
            depth: self.depth,
            local_a: self.local_b,
            local_b: self.local_a,
            normal: -self.normal,
        }
    }
}

type ColliderFn = fn(&Shape, &Transform, &Shape, &Transform) -> Vec<ContactPoint>;

/// Returns the collider for an already-canonicalized `(tagA, tagB)` with `tagA <= tagB`.
///
/// Circle-circle and circle-box have dedicated analytic colliders (spec §4.4/§4.5); every
/// other combination — including box-box and anything touching a `ConvexPolygon` — goes
/// through the generic GJK/EPA convex path (spec §4.6/§4.7), since `Shape::support` is
/// defined uniformly for all three variants and a circle is itself a perfectly good convex
/// support shape.
fn table_entry(tag_a: ShapeTag, tag_b: ShapeTag) -> ColliderFn {
    debug_assert!(tag_a <= tag_b, "table_entry expects a canonicalized tag order");
    match (tag_a, tag_b) {
        (ShapeTag::Circle, ShapeTag::Circle) => circle::circle_circle,
        (ShapeTag::Circle, ShapeTag::Box) => circle::circle_box,
        _ => convex::convex_convex,
    }
}

/// Computes the contact manifold between two shapes at the given poses. Dispatches via
/// the (conceptual) table keyed by `(shape_a.tag(), shape_b.tag())`, swapping and
/// flipping normals when the pair is presented in descending tag order so the table only
/// needs to carry its upper triangle.
pub fn narrow_phase(
    shape_a: &Shape,
    transform_a: &Transform,
    shape_b: &Shape,
    transform_b: &Transform,
) -> Vec<ContactPoint> {
    let tag_a = shape_a.tag();
    let tag_b = shape_b.tag();
    if tag_a <= tag_b {
        table_entry(tag_a, tag_b)(shape_a, transform_a, shape_b, transform_b)
    } else {
        table_entry(tag_b, tag_a)(shape_b, transform_b, shape_a, transform_a)
            .into_iter()
            .map(ContactPoint::flip)
            .collect()
    }
}
