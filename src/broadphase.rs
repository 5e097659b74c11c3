//! Brute-force AABB broadphase.
//!
//! Grounded on the teacher's `BruteForce::compute` (`collide/broad/brute_force.rs`): an
//! O(n^2) double loop over all bodies, testing AABB overlap. No acceleration structure is
//! added, per the spec's explicit Non-goal.

use std::collections::HashSet;

use crate::body::{Body, BodyId, BodyIdPair, BodySet};
use crate::math::Vec2;
use crate::shape::Aabb;

/// World-space AABB for a body, expanded from its shape's local bound through the body's
/// pose. For rotated boxes/polygons this takes the extent of the transformed corners;
/// for circles it is trivial (translation only, since a circle's bound is rotation-
/// invariant).
pub fn world_bound(body: &Body) -> Aabb {
    let local = body.shape.local_bound();
    let t = body.transform();
    let corners = [
        Vec2::new(local.min.x, local.min.y),
        Vec2::new(local.max.x, local.min.y),
        Vec2::new(local.min.x, local.max.y),
        Vec2::new(local.max.x, local.max.y),
    ];
    let mut iter = corners.iter().map(|&c| t.transform_point(c));
    let first = iter.next().unwrap();
    let mut bound = Aabb {
        min: first,
        max: first,
    };
    for p in iter {
        bound.min.x = bound.min.x.min(p.x);
        bound.min.y = bound.min.y.min(p.y);
        bound.max.x = bound.max.x.max(p.x);
        bound.max.y = bound.max.y.max(p.y);
    }
    bound
}

/// The result of one broadphase pass: pairs overlapping this frame, partitioned against
/// what overlapped last frame.
pub struct BroadphaseResult {
    pub new_pairs: Vec<BodyIdPair>,
    pub existing_pairs: Vec<BodyIdPair>,
    /// Pairs that overlapped last frame but not this one; their `CachedPair` must be
    /// destroyed.
    pub destroyed_pairs: Vec<BodyIdPair>,
}

/// Enumerates all pairs of active bodies whose world AABBs overlap and partitions them
/// relative to `previous` (the overlapping-pair set from the prior frame).
pub fn compute(
    ids: &[BodyId],
    bodies: &BodySet,
    previous: &HashSet<BodyIdPair>,
) -> BroadphaseResult {
    let bounds: Vec<(BodyId, Aabb)> = ids
        .iter()
        .map(|&id| (id, world_bound(bodies.get(id).expect("active id is valid"))))
        .collect();

    let mut current = HashSet::new();
    let mut new_pairs = Vec::new();
    let mut existing_pairs = Vec::new();

    for i in 0..bounds.len() {
        for j in (i + 1)..bounds.len() {
            let (id_a, bound_a) = bounds[i];
            let (id_b, bound_b) = bounds[j];
            if bound_a.overlaps(&bound_b) {
                let pair = BodyIdPair::new(id_a, id_b);
                current.insert(pair);
                if previous.contains(&pair) {
                    existing_pairs.push(pair);
                } else {
                    new_pairs.push(pair);
                }
            }
        }
    }

    let destroyed_pairs = previous.difference(&current).copied().collect();

    BroadphaseResult {
        new_pairs,
        existing_pairs,
        destroyed_pairs,
    }
}
