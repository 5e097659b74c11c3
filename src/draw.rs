//! Debug-draw sink (spec §6).
//!
//! The core never renders anything itself; it only exposes enough state for a host
//! application to draw a frame, and optionally calls into an injected sink for contact
//! points and normals while stepping. Grounded on
//! `examples/other_examples/.../Particle_Accelerator__src-world.rs.rs`'s pattern of taking
//! an optional observer trait object into its step function rather than owning a renderer.

use crate::body::{Body, BodyId};
use crate::math::Vec2;

/// A single contact event emitted during narrow-phase, for visualization.
#[derive(Debug, Clone, Copy)]
pub struct ContactDraw {
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub world_point: Vec2,
    pub world_normal: Vec2,
    pub depth: crate::math::Real,
}

/// Host-supplied sink for per-step debug draw data. `World::step` calls `body` for every
/// active body and `contact` for every narrow-phase contact found that step, in that
/// order, before the constraint solve touches velocities.
pub trait DrawSink {
    fn body(&mut self, id: BodyId, body: &Body) {
        let _ = (id, body);
    }

    fn contact(&mut self, contact: ContactDraw) {
        let _ = contact;
    }
}

/// Draws nothing. Used when a caller does not pass a sink to `World::step_with_draw`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDrawSink;

impl DrawSink for NullDrawSink {}
