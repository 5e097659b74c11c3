//! Error taxonomy for the physics core.
//!
//! Precondition violations (`SingularTransform`, `ZeroVector`, `InvalidBodyId`,
//! `InvalidJointId`, `DegenerateShape`) are returned as `Err` rather than panicking, so a
//! host application holding a stale `BodyId` can recover instead of crashing. Runtime
//! degenerate cases inside the solver (`SolverNonConvergent`) never reach the caller as an
//! `Err`; they are logged and the step completes with a best-effort contact.

use thiserror::Error;

/// Errors produced by the physics core.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PhysicsError {
    /// Attempted to invert a `Transform` whose determinant is (numerically) zero.
    #[error("transform is not invertible")]
    SingularTransform,

    /// Attempted to normalize, or give a positive length to, a zero vector.
    #[error("cannot give a direction to the zero vector")]
    ZeroVector,

    /// Looked up or removed a `BodyId` that was never issued or has already been freed.
    #[error("invalid or stale body id")]
    InvalidBodyId,

    /// Looked up or removed a `JointId` that was never issued or has already been freed.
    #[error("invalid or stale joint id")]
    InvalidJointId,

    /// Attempted to construct a `Shape::ConvexPolygon` that is not a convex hull with at
    /// least 3 vertices containing its own local origin.
    #[error("shape is not a valid convex polygon")]
    DegenerateShape,
}
