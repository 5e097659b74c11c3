//! The generic GJK/EPA convex collider (spec §4.7), used for every shape pair except
//! circle-circle and circle-box.
//!
//! Grounded on the teacher's legacy (pre-`collision`-crate-delegation) implementation:
//! `examples/rustgd-rhusics/src/collide/narrow/gjk/mod.rs` for the overall GJK loop and
//! `SupportPoint` shape, `.../gjk/simplex/simplex2d.rs` for `check_origin` (simplex
//! evolution) via `triple_product`, and `.../gjk/epa/epa2d.rs` for the EPA expansion loop
//! and closest-edge search. The contact reconstruction is extended relative to the
//! teacher to recover *both* witness points (`sup_a` and `sup_b`), since the teacher's
//! `epa2d::point` only reconstructed the `A`-side projection.

use log::warn;

use super::ContactPoint;
use crate::math::{triple_product, Real, Transform, Vec2};
use crate::shape::Shape;

const GJK_MAX_ITERATIONS: u32 = 100;
const EPA_MAX_ITERATIONS: u32 = 32;
const EPA_TOLERANCE: Real = 0.000_1;

/// One vertex of a GJK/EPA simplex: the Minkowski difference point, plus the two witness
/// supports on A and B (in world space) that produced it. The witnesses are what let EPA
/// reconstruct a contact point on each shape, not just the depth/normal.
#[derive(Debug, Clone, Copy)]
struct SimplexVertex {
    v: Vec2,
    sup_a: Vec2,
    sup_b: Vec2,
}

fn support(
    shape_a: &Shape,
    transform_a: &Transform,
    shape_b: &Shape,
    transform_b: &Transform,
    d: Vec2,
) -> SimplexVertex {
    let local_d_a = transform_a.transform_direction_inverse(d).unwrap_or(d);
    let sup_a = transform_a.transform_point(shape_a.support(local_d_a));

    let neg_d = -d;
    let local_d_b = transform_b.transform_direction_inverse(neg_d).unwrap_or(neg_d);
    let sup_b = transform_b.transform_point(shape_b.support(local_d_b));

    SimplexVertex {
        v: sup_a - sup_b,
        sup_a,
        sup_b,
    }
}

/// Evolves the simplex toward the origin. Returns `true` when the simplex encloses the
/// origin (the shapes overlap). Mirrors the teacher's `SimplexProcessor2D::check_origin`.
fn check_origin(simplex: &mut Vec<SimplexVertex>, d: &mut Vec2) -> bool {
    if simplex.len() == 3 {
        let a = simplex[2].v;
        let ao = -a;
        let b = simplex[1].v;
        let c = simplex[0].v;
        let ab = b - a;
        let ac = c - a;
        let ab_perp = triple_product(ac, ab, ab);
        if ab_perp.dot(ao) > 0.0 {
            simplex.remove(0);
            *d = ab_perp;
        } else {
            let ac_perp = triple_product(ab, ac, ac);
            if ac_perp.dot(ao) > 0.0 {
                simplex.remove(1);
                *d = ac_perp;
            } else {
                return true;
            }
        }
    } else if simplex.len() == 2 {
        let a = simplex[1].v;
        let ao = -a;
        let b = simplex[0].v;
        let ab = b - a;
        *d = triple_product(ab, ao, ab);
    }
    false
}

/// Phase 1 (spec §4.7): decides whether the shapes overlap, returning the enclosing
/// simplex if so.
fn gjk(
    shape_a: &Shape,
    transform_a: &Transform,
    shape_b: &Shape,
    transform_b: &Transform,
) -> Option<Vec<SimplexVertex>> {
    let mut d = Vec2::new(1.0, 0.0);
    let first = support(shape_a, transform_a, shape_b, transform_b, d);
    let mut simplex = vec![first];
    d = -first.v;

    for _ in 0..GJK_MAX_ITERATIONS {
        if d.is_near_zero() {
            // Origin coincides with the current feature; treat as touching/overlapping.
            return Some(simplex);
        }
        let candidate = support(shape_a, transform_a, shape_b, transform_b, d);
        if candidate.v.dot(d) < 0.0 {
            // Candidate support did not pass the origin: shapes are disjoint.
            return None;
        }
        simplex.push(candidate);
        if check_origin(&mut simplex, &mut d) {
            return Some(simplex);
        }
    }
    None
}

struct Edge {
    normal: Vec2,
    distance: Real,
    index: usize,
}

/// Finds the polytope edge closest to the origin, mirroring the teacher's
/// `EPA2::closest_edge` / `SimplexProcessor2D::closest_feature` (the two were duplicated
/// in the teacher; this crate keeps one copy since EPA is the only caller).
fn closest_edge(polytope: &[SimplexVertex]) -> Edge {
    let mut best = Edge {
        normal: Vec2::new(0.0, 0.0),
        distance: Real::MAX,
        index: 0,
    };
    for i in 0..polytope.len() {
        let j = if i + 1 == polytope.len() { 0 } else { i + 1 };
        let a = polytope[i].v;
        let b = polytope[j].v;
        let e = b - a;
        let oa = a;
        let n = match triple_product(e, oa, e).normalize() {
            Ok(n) => n,
            Err(_) => continue,
        };
        let d = n.dot(a);
        if d < best.distance {
            best = Edge {
                normal: n,
                distance: d,
                index: j,
            };
        }
    }
    best
}

struct Penetration {
    normal: Vec2,
    depth: Real,
    contact_a_world: Vec2,
    contact_b_world: Vec2,
    converged: bool,
}

/// Phase 2 (spec §4.7): expands the simplex into a polytope until the closest edge's
/// normal stops improving, then reconstructs both witness contact points by projecting
/// the origin onto that edge.
fn epa(
    shape_a: &Shape,
    transform_a: &Transform,
    shape_b: &Shape,
    transform_b: &Transform,
    mut polytope: Vec<SimplexVertex>,
) -> Penetration {
    let mut edge = closest_edge(&polytope);
    let mut converged = false;

    for _ in 0..EPA_MAX_ITERATIONS {
        edge = closest_edge(&polytope);
        let candidate = support(shape_a, transform_a, shape_b, transform_b, edge.normal);
        let d = candidate.v.dot(edge.normal);
        if d - edge.distance < EPA_TOLERANCE {
            converged = true;
            break;
        }
        polytope.insert(edge.index, candidate);
    }

    let i0 = if edge.index == 0 {
        polytope.len() - 1
    } else {
        edge.index - 1
    };
    let v0 = polytope[i0];
    let v1 = polytope[edge.index % polytope.len()];

    let e = v1.v - v0.v;
    let len_sq = e.length_squared();
    let t = if len_sq > Real::EPSILON {
        (-v0.v.dot(e) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let lambda0 = 1.0 - t;
    let lambda1 = t;

    Penetration {
        normal: edge.normal,
        depth: edge.distance.max(0.0),
        contact_a_world: v0.sup_a * lambda0 + v1.sup_a * lambda1,
        contact_b_world: v0.sup_b * lambda0 + v1.sup_b * lambda1,
        converged,
    }
}

/// Generic convex-convex contact via GJK existence test + EPA penetration extraction.
/// Used for box-box, polygon-polygon, box-polygon, and circle-polygon, since every
/// `Shape` variant (including `Circle`) answers a support query.
pub fn convex_convex(
    shape_a: &Shape,
    transform_a: &Transform,
    shape_b: &Shape,
    transform_b: &Transform,
) -> Vec<ContactPoint> {
    let simplex = match gjk(shape_a, transform_a, shape_b, transform_b) {
        Some(s) if s.len() == 3 => s,
        _ => return Vec::new(),
    };

    let result = epa(shape_a, transform_a, shape_b, transform_b, simplex);
    if !result.converged {
        warn!(
            "EPA did not converge within {} iterations; emitting best candidate",
            EPA_MAX_ITERATIONS
        );
    }

    let local_a = transform_a
        .transform_point_inverse(result.contact_a_world)
        .expect("body transform is always invertible");
    let local_b = transform_b
        .transform_point_inverse(result.contact_b_world)
        .expect("body transform is always invertible");

    vec![ContactPoint {
        depth: result.depth,
        local_a,
        local_b,
        normal: result.normal,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box() -> Shape {
        Shape::new_box(Vec2::new(0.5, 0.5))
    }

    #[test]
    fn separated_boxes_have_no_contact() {
        let a = unit_box();
        let b = unit_box();
        let ta = Transform::from_position_angle(Vec2::new(0.0, 0.0), 0.0);
        let tb = Transform::from_position_angle(Vec2::new(5.0, 0.0), 0.0);
        assert!(convex_convex(&a, &ta, &b, &tb).is_empty());
    }

    #[test]
    fn overlapping_boxes_report_depth_and_axis_normal() {
        let a = unit_box();
        let b = unit_box();
        let ta = Transform::from_position_angle(Vec2::new(0.0, 0.0), 0.0);
        // Overlap of 0.2 along x: boxes are 1 unit wide, centers 0.8 apart.
        let tb = Transform::from_position_angle(Vec2::new(0.8, 0.0), 0.0);

        let contacts = convex_convex(&a, &ta, &b, &tb);
        assert_eq!(contacts.len(), 1);
        assert_relative_eq!(contacts[0].depth, 0.2, epsilon = 1e-3);
        assert!(contacts[0].normal.x.abs() > 0.9);
    }

    #[test]
    fn overlapping_triangles_produce_positive_depth() {
        let a = Shape::new_convex_polygon(vec![
            Vec2::new(0.5, -0.3),
            Vec2::new(0.0, 0.6),
            Vec2::new(-0.5, -0.3),
        ])
        .unwrap();
        let b = a.clone();
        let ta = Transform::from_position_angle(Vec2::new(0.0, 0.0), 0.0);
        let tb = Transform::from_position_angle(Vec2::new(0.3, 0.0), 0.0);

        let contacts = convex_convex(&a, &ta, &b, &tb);
        assert_eq!(contacts.len(), 1);
        assert!(contacts[0].depth > 0.0);
    }

    #[test]
    fn circle_and_polygon_use_the_generic_path() {
        let circle = Shape::new_circle(1.0);
        let triangle = Shape::new_convex_polygon(vec![
            Vec2::new(2.0, -1.0),
            Vec2::new(2.0, 1.0),
            Vec2::new(0.0, 0.0),
        ])
        .unwrap();
        let ta = Transform::from_position_angle(Vec2::new(0.0, 0.0), 0.0);
        let tb = Transform::from_position_angle(Vec2::new(0.0, 0.0), 0.0);
        let contacts = convex_convex(&circle, &ta, &triangle, &tb);
        assert_eq!(contacts.len(), 1);
        assert!(contacts[0].depth > 0.0);
    }
}
