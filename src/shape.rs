//! Shape variants and their support queries.
//!
//! Per the spec's redesign note, the source's `physicsCollider` inheritance hierarchy
//! (`CircleCollider`/`BoxCollider`/`ConvexCollider`) is replaced with a single tagged
//! `enum Shape` and a match over it, rather than a trait-object hierarchy.

use crate::error::PhysicsError;
use crate::math::{Real, Vec2};

/// An axis-aligned bounding box, in whatever frame it was computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    fn union_point(&mut self, p: Vec2) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }
}

/// A shape's tag, used to key the narrow-phase dispatch table. Ordered so that the table
/// can be built symmetric: entries with `a.tag() > b.tag()` are derived from the
/// `(b, a)` entry by swapping arguments and flipping the resulting normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShapeTag {
    Circle,
    Box,
    ConvexPolygon,
}

/// A shape usable by a `Body`. Shapes are immutable once constructed and are commonly
/// shared between multiple bodies via `Rc<Shape>`.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle { radius: Real },
    Box { half_extents: Vec2 },
    ConvexPolygon { vertices: Vec<Vec2> },
}

impl Shape {
    pub fn new_circle(radius: Real) -> Self {
        Shape::Circle { radius }
    }

    pub fn new_box(half_extents: Vec2) -> Self {
        Shape::Box { half_extents }
    }

    /// Constructs a convex polygon shape. Fails with `DegenerateShape` if there are fewer
    /// than 3 vertices, the vertices do not form a convex CCW hull, or the local origin
    /// does not lie inside the hull.
    pub fn new_convex_polygon(vertices: Vec<Vec2>) -> Result<Self, PhysicsError> {
        if vertices.len() < 3 {
            return Err(PhysicsError::DegenerateShape);
        }
        let n = vertices.len();
        for i in 0..n {
            let a = vertices[i];
            let b = vertices[(i + 1) % n];
            let c = vertices[(i + 2) % n];
            // CCW turn at every vertex: consecutive edge cross products must agree in sign.
            if (b - a).cross(c - b) <= 0.0 {
                return Err(PhysicsError::DegenerateShape);
            }
            // The local origin must lie on the interior (left) side of every directed edge.
            if (b - a).cross(Vec2::ZERO - a) < 0.0 {
                return Err(PhysicsError::DegenerateShape);
            }
        }
        Ok(Shape::ConvexPolygon { vertices })
    }

    pub fn tag(&self) -> ShapeTag {
        match self {
            Shape::Circle { .. } => ShapeTag::Circle,
            Shape::Box { .. } => ShapeTag::Box,
            Shape::ConvexPolygon { .. } => ShapeTag::ConvexPolygon,
        }
    }

    /// Returns the vertex of the shape (in local space) furthest along direction `d`.
    /// `d` need not be normalized.
    pub fn support(&self, d: Vec2) -> Vec2 {
        match self {
            Shape::Circle { radius } => match d.normalize() {
                Ok(n) => n * *radius,
                Err(_) => Vec2::new(*radius, 0.0),
            },
            Shape::Box { half_extents } => Vec2::new(
                half_extents.x.copysign_to(d.x),
                half_extents.y.copysign_to(d.y),
            ),
            Shape::ConvexPolygon { vertices } => {
                let mut best = vertices[0];
                let mut best_dot = best.dot(d);
                for &v in vertices.iter().skip(1) {
                    let dot = v.dot(d);
                    if dot > best_dot {
                        best_dot = dot;
                        best = v;
                    }
                }
                best
            }
        }
    }

    /// Local-space AABB of the shape.
    pub fn local_bound(&self) -> Aabb {
        match self {
            Shape::Circle { radius } => Aabb {
                min: Vec2::new(-*radius, -*radius),
                max: Vec2::new(*radius, *radius),
            },
            Shape::Box { half_extents } => Aabb {
                min: Vec2::new(-half_extents.x, -half_extents.y),
                max: Vec2::new(half_extents.x, half_extents.y),
            },
            Shape::ConvexPolygon { vertices } => {
                let mut bound = Aabb {
                    min: vertices[0],
                    max: vertices[0],
                };
                for &v in vertices.iter().skip(1) {
                    bound.union_point(v);
                }
                bound
            }
        }
    }
}

trait CopySign {
    fn copysign_to(self, sign_of: Real) -> Real;
}

impl CopySign for Real {
    fn copysign_to(self, sign_of: Real) -> Real {
        if sign_of < 0.0 {
            -self
        } else {
            self
        }
    }
}
