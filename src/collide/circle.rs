//! Circle-circle and circle-box colliders (spec §4.4, §4.5).

use super::ContactPoint;
use crate::math::{Transform, Vec2};
use crate::shape::Shape;

fn radius_of(shape: &Shape) -> crate::math::Real {
    match shape {
        Shape::Circle { radius } => *radius,
        _ => panic!("circle collider invoked with a non-circle shape"),
    }
}

/// Circle-circle contact, per spec §4.4.
pub fn circle_circle(
    shape_a: &Shape,
    transform_a: &Transform,
    shape_b: &Shape,
    transform_b: &Transform,
) -> Vec<ContactPoint> {
    let ra = radius_of(shape_a);
    let rb = radius_of(shape_b);
    let ca = transform_a.position();
    let cb = transform_b.position();
    let d = cb - ca;
    let len = d.length();
    if len >= ra + rb {
        return Vec::new();
    }
    let normal = if len > crate::math::Real::EPSILON {
        d / len
    } else {
        Vec2::new(1.0, 0.0)
    };
    let depth = ra + rb - len;
    let world_on_a = ca + normal * ra;
    let world_on_b = cb - normal * rb;
    let local_a = transform_a
        .transform_point_inverse(world_on_a)
        .expect("body transform is always invertible");
    let local_b = transform_b
        .transform_point_inverse(world_on_b)
        .expect("body transform is always invertible");
    vec![ContactPoint {
        depth,
        local_a,
        local_b,
        normal,
    }]
}

/// Circle-box contact, per spec §4.5. `shape_a` must be the circle, `shape_b` the box.
pub fn circle_box(
    shape_a: &Shape,
    transform_a: &Transform,
    shape_b: &Shape,
    transform_b: &Transform,
) -> Vec<ContactPoint> {
    let radius = radius_of(shape_a);
    let half_extents = match shape_b {
        Shape::Box { half_extents } => *half_extents,
        _ => panic!("circle_box invoked with a non-box second shape"),
    };

    let world_center = transform_a.position();
    let local_center = transform_b
        .transform_point_inverse(world_center)
        .expect("body transform is always invertible");

    let clamped = Vec2::new(
        local_center.x.clamp(-half_extents.x, half_extents.x),
        local_center.y.clamp(-half_extents.y, half_extents.y),
    );

    let (local_normal, depth) = if clamped == local_center {
        // Center is inside the box: the separating normal (A -> B) points from the circle
        // through the nearer face, into the box, along the axis of minimum penetration.
        let dx = half_extents.x - local_center.x.abs();
        let dy = half_extents.y - local_center.y.abs();
        if dx < dy {
            let sign = if local_center.x < 0.0 { -1.0 } else { 1.0 };
            (Vec2::new(-sign, 0.0), dx + radius)
        } else {
            let sign = if local_center.y < 0.0 { -1.0 } else { 1.0 };
            (Vec2::new(0.0, -sign), dy + radius)
        }
    } else {
        // A -> B: from the circle's center toward the closest point on the box.
        let diff = clamped - local_center;
        let dist = diff.length();
        if dist >= radius {
            return Vec::new();
        }
        let normal = if dist > crate::math::Real::EPSILON {
            diff / dist
        } else {
            Vec2::new(-1.0, 0.0)
        };
        (normal, radius - dist)
    };

    let world_normal = transform_b.transform_direction(local_normal);
    let world_normal = world_normal
        .normalize()
        .unwrap_or_else(|_| Vec2::new(-1.0, 0.0));

    let world_on_a = world_center + world_normal * radius;
    let local_a = transform_a
        .transform_point_inverse(world_on_a)
        .expect("body transform is always invertible");
    // `clamped` was computed directly in B's local frame, so it is already `local_b`.
    let local_b = clamped;

    vec![ContactPoint {
        depth,
        local_a,
        local_b,
        normal: world_normal,
    }]
}
