//! A 2D rigid-body physics core: broadphase, narrow-phase (circle/box/convex via
//! GJK/EPA), a contact manifold cache, and a sequential-impulse constraint solver with
//! point-to-point joints.
//!
//! The crate has no renderer, no file I/O, and no application loop — see `World` for the
//! programmatic surface a host application drives.

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod body;
pub mod broadphase;
pub mod cache;
pub mod collide;
pub mod draw;
pub mod error;
pub mod joint;
pub mod math;
pub mod shape;
pub mod solver;
pub mod world;

pub use body::{Body, BodyId, BodyIdPair, BodyInfo, MotionType};
pub use collide::ContactPoint;
pub use draw::{ContactDraw, DrawSink, NullDrawSink};
pub use error::PhysicsError;
pub use joint::{Joint, JointId};
pub use math::{Real, Transform, Vec2};
pub use shape::{Aabb, Shape, ShapeTag};
pub use world::{World, WorldConfig};
