//! Burrow Physics -- axis-aligned rigid bodies for a 2D side-scroller.
//!
//! The [`PhysicsEngine`](engine::PhysicsEngine) owns every
//! [`RigidBody`](body::RigidBody) in an arena and hands out generational
//! [`BodyHandle`](handle::BodyHandle)s. Each call to
//! [`update`](engine::PhysicsEngine::update) integrates motion with explicit
//! Euler, resolves box overlaps along the axis of least penetration (with
//! mass-ordered pushing of crate chains), collects pickable items and
//! recomputes ground contact.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use burrow_events::prelude::*;
//! use burrow_physics::prelude::*;
//!
//! let events = Arc::new(EventManager::new(EventConfig::default()));
//! let mut engine = PhysicsEngine::new(
//!     PhysicsConfig { floor_y: 500.0, ..Default::default() },
//!     events,
//! );
//!
//! let player = engine
//!     .add_rigid_body(
//!         RigidBody::new("player", Vector2D::new(0.0, 490.0), Vector2D::new(8.0, 16.0), 1.0, false)
//!             .unwrap(),
//!     )
//!     .unwrap();
//!
//! engine.update(1.0);
//! assert_eq!(engine[player].position.y, 500.0);
//! assert!(engine[player].on_ground);
//! ```

#![deny(unsafe_code)]

pub mod body;
pub mod collision;
pub mod engine;
pub mod handle;
pub mod vector;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced when building or registering bodies.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PhysicsError {
    /// A dynamic body needs a positive, finite mass.
    #[error("body '{identifier}' has invalid mass {mass}; dynamic bodies need a positive, finite mass")]
    InvalidMass { identifier: String, mass: f64 },

    /// Width and height must be finite and non-negative.
    #[error("body '{identifier}' has invalid size {width}x{height}")]
    InvalidSize {
        identifier: String,
        width: f64,
        height: f64,
    },

    /// Another body in the same engine already uses this identifier.
    #[error("a body named '{identifier}' is already registered")]
    DuplicateIdentifier { identifier: String },

    /// A persisted body record could not be decoded.
    #[error("malformed record for body '{identifier}': {details}")]
    MalformedRecord { identifier: String, details: String },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::body::{RigidBody, RigidBodyBuilder, GRAVITY};
    pub use crate::collision::{
        check_collision_on_x, check_collision_on_y, check_if_on_top, detect_collision, Axis,
        Bounds,
    };
    pub use crate::engine::{
        CollisionPair, ItemEquipped, PhysicsConfig, PhysicsEngine, Resolution, StepReport,
    };
    pub use crate::handle::{BodyArena, BodyHandle};
    pub use crate::vector::Vector2D;
    pub use crate::PhysicsError;
}
