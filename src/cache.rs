//! Per-pair contact manifold cache (spec §4.8).
//!
//! Grounded on `examples/original_source/Physics/physicsWorld.h`'s
//! `CachedPair::addContact`, which offers two alternative merge strategies (one commented
//! out, round-robin). Only the distance-thresholded strategy is ported, per spec §9 —
//! the round-robin alternative is not implemented at all, not even as dead code.

use crate::collide::ContactPoint;
use crate::math::Real;

/// Weight applied to normal-angle disagreement when judging whether two contact points
/// are "the same" contact across frames, so that points on opposite faces of a shape
/// (same position, opposite normal) are never merged into one slot.
const NORMAL_DISAGREEMENT_WEIGHT: Real = 1.0;

fn contact_distance(a: &ContactPoint, b: &ContactPoint) -> Real {
    let position_distance = (a.local_a - b.local_a).length();
    let normal_disagreement = 1.0 - a.normal.dot(b.normal);
    position_distance + NORMAL_DISAGREEMENT_WEIGHT * normal_disagreement
}

/// A single manifold slot: the contact point plus the impulse accumulated against it in
/// the most recent solve, carried forward as the warm-start seed for the next frame's
/// constraint.
#[derive(Debug, Clone, Copy)]
pub struct CachedContact {
    pub point: ContactPoint,
    pub accum_normal_impulse: Real,
}

impl CachedContact {
    fn fresh(point: ContactPoint) -> Self {
        CachedContact {
            point,
            accum_normal_impulse: 0.0,
        }
    }

    fn warm_started(point: ContactPoint, accum_normal_impulse: Real) -> Self {
        CachedContact {
            point,
            accum_normal_impulse,
        }
    }
}

/// Persistent per-pair contact state: up to two manifold points, each carrying its own
/// warm-start impulse.
#[derive(Debug, Clone, Default)]
pub struct CachedPair {
    pub slot_a: Option<CachedContact>,
    pub slot_b: Option<CachedContact>,
}

impl CachedPair {
    pub fn new() -> Self {
        CachedPair {
            slot_a: None,
            slot_b: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slot_a.is_none() && self.slot_b.is_none()
    }

    /// Merges a freshly-detected contact point into the manifold, per spec §4.8.
    pub fn add_contact(&mut self, cp: ContactPoint, tau: Real) {
        match (self.slot_a, self.slot_b) {
            (None, _) => {
                self.slot_a = Some(CachedContact::fresh(cp));
            }
            (Some(a), None) => {
                if contact_distance(&cp, &a.point) < tau {
                    self.slot_a = Some(CachedContact::warm_started(cp, a.accum_normal_impulse));
                } else {
                    self.slot_b = Some(CachedContact::fresh(cp));
                }
            }
            (Some(a), Some(b)) => {
                let da = contact_distance(&cp, &a.point);
                let db = contact_distance(&cp, &b.point);
                if da <= db {
                    if da < tau {
                        self.slot_a =
                            Some(CachedContact::warm_started(cp, a.accum_normal_impulse));
                    } else {
                        self.slot_a = Some(CachedContact::fresh(cp));
                        self.slot_b = None;
                    }
                } else if db < tau {
                    self.slot_b = Some(CachedContact::warm_started(cp, b.accum_normal_impulse));
                } else {
                    self.slot_a = Some(CachedContact::fresh(cp));
                    self.slot_b = None;
                }
            }
        }
    }

    /// Iterates the (up to two) live manifold points.
    pub fn contacts(&self) -> impl Iterator<Item = &CachedContact> {
        self.slot_a.iter().chain(self.slot_b.iter())
    }

    /// Writes back the accumulated impulse found by the solver for the point in the given
    /// slot index (0 or 1), so the next frame's `add_contact` can warm-start from it.
    pub fn set_accum_impulse(&mut self, slot: usize, impulse: Real) {
        match slot {
            0 => {
                if let Some(c) = &mut self.slot_a {
                    c.accum_normal_impulse = impulse;
                }
            }
            1 => {
                if let Some(c) = &mut self.slot_b {
                    c.accum_normal_impulse = impulse;
                }
            }
            _ => unreachable!("a manifold has at most two slots"),
        }
    }
}
