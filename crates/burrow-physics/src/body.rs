//! Rigid body state and single-body integration.

use serde::{Deserialize, Serialize};

use crate::collision::Bounds;
use crate::handle::BodyHandle;
use crate::vector::Vector2D;
use crate::PhysicsError;

/// Gravitational acceleration applied by [`RigidBody::update`] to airborne
/// bodies, on top of the engine-level gravity force.
pub const GRAVITY: f64 = 9.8;

// ---------------------------------------------------------------------------
// RigidBody
// ---------------------------------------------------------------------------

/// An axis-aligned box with mass, velocity and collision flags.
///
/// `position` is the top-left corner; `size` is the full extent. Mass and
/// the static flag are private because they carry an invariant: any body
/// that can receive a force has a positive, finite mass.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    identifier: String,
    /// Top-left corner.
    pub position: Vector2D,
    /// Units per second.
    pub velocity: Vector2D,
    /// Accumulated by [`apply_force`](Self::apply_force); cleared each tick.
    pub acceleration: Vector2D,
    /// Full width and height.
    pub size: Vector2D,
    mass: f64,
    is_static: bool,
    /// Takes part in the pairwise collision scan.
    pub is_collidable: bool,
    /// Can be shoved by a heavier body.
    pub is_pushable: bool,
    /// Is collected when touched by a body that [`can_pick`](Self::can_pick).
    pub is_pickable: bool,
    /// Collects pickable bodies on contact.
    pub can_pick: bool,
    /// Resting on the floor plane or on a static body. Recomputed every tick.
    pub on_ground: bool,
    pub(crate) colliding: Vec<BodyHandle>,
}

impl RigidBody {
    /// Create a collidable, non-pushable body.
    ///
    /// Fails if a non-static body has a mass that is not positive and
    /// finite, or if the size is negative or not finite.
    pub fn new(
        identifier: impl Into<String>,
        position: Vector2D,
        size: Vector2D,
        mass: f64,
        is_static: bool,
    ) -> Result<Self, PhysicsError> {
        let identifier = identifier.into();
        validate_mass(&identifier, mass, is_static)?;
        validate_size(&identifier, size)?;
        Ok(Self {
            identifier,
            position,
            velocity: Vector2D::ZERO,
            acceleration: Vector2D::ZERO,
            size,
            mass,
            is_static,
            is_collidable: true,
            is_pushable: false,
            is_pickable: false,
            can_pick: false,
            on_ground: false,
            colliding: Vec::new(),
        })
    }

    /// Start a [`RigidBodyBuilder`].
    pub fn builder(identifier: impl Into<String>) -> RigidBodyBuilder {
        RigidBodyBuilder::new(identifier)
    }

    /// Unique name within an engine.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Mass in arbitrary units.
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Change the mass, keeping the positive-mass invariant.
    pub fn set_mass(&mut self, mass: f64) -> Result<(), PhysicsError> {
        validate_mass(&self.identifier, mass, self.is_static)?;
        self.mass = mass;
        Ok(())
    }

    /// Static bodies never move.
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Bodies currently overlapping or touching this one, as of the last
    /// collision scan.
    pub fn colliding_bodies(&self) -> &[BodyHandle] {
        &self.colliding
    }

    /// The body's box.
    #[inline]
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.position, self.size)
    }

    /// Accumulate `force / mass` into the acceleration. No-op when static.
    pub fn apply_force(&mut self, force: Vector2D) {
        if self.is_static {
            return;
        }
        debug_assert!(self.mass > 0.0, "force applied to body with non-positive mass");
        self.acceleration += force / self.mass;
    }

    /// Advance the body by `dt` seconds with the default [`GRAVITY`].
    pub fn update(&mut self, dt: f64) {
        self.update_with_gravity(dt, GRAVITY);
    }

    /// Advance the body by `dt` seconds.
    ///
    /// Airborne bodies gain `gravity * dt` of downward velocity, then the
    /// position integrates with explicit Euler. No-op when static.
    pub fn update_with_gravity(&mut self, dt: f64, gravity: f64) {
        if self.is_static {
            return;
        }
        if !self.on_ground {
            self.velocity.y += gravity * dt;
        }
        self.position += self.velocity * dt;
    }

    /// Flat keyed record of the persistent fields.
    pub fn serialize(&self) -> serde_json::Value {
        let record = BodyRecord {
            position: self.position,
            size: self.size,
            velocity: self.velocity,
            mass: self.mass,
            is_static: self.is_static,
        };
        // A struct of finite-or-not floats and a bool always serializes.
        serde_json::to_value(record).unwrap_or(serde_json::Value::Null)
    }

    /// Overlay the fields present in `data` onto this body.
    ///
    /// Missing fields (and missing vector components) keep their current
    /// values. The result must still satisfy the mass and size invariants,
    /// otherwise the body is left unchanged.
    pub fn deserialize(&mut self, data: &serde_json::Value) -> Result<(), PhysicsError> {
        let record: PartialBodyRecord =
            serde_json::from_value(data.clone()).map_err(|e| PhysicsError::MalformedRecord {
                identifier: self.identifier.clone(),
                details: e.to_string(),
            })?;

        let is_static = record.is_static.unwrap_or(self.is_static);
        let mass = record.mass.unwrap_or(self.mass);
        let size = record.size.overlay(self.size);
        validate_mass(&self.identifier, mass, is_static)?;
        validate_size(&self.identifier, size)?;

        self.position = record.position.overlay(self.position);
        self.velocity = record.velocity.overlay(self.velocity);
        self.size = size;
        self.mass = mass;
        self.is_static = is_static;
        Ok(())
    }
}

fn validate_mass(identifier: &str, mass: f64, is_static: bool) -> Result<(), PhysicsError> {
    if is_static || (mass.is_finite() && mass > 0.0) {
        Ok(())
    } else {
        Err(PhysicsError::InvalidMass {
            identifier: identifier.to_owned(),
            mass,
        })
    }
}

fn validate_size(identifier: &str, size: Vector2D) -> Result<(), PhysicsError> {
    if size.is_finite() && size.x >= 0.0 && size.y >= 0.0 {
        Ok(())
    } else {
        Err(PhysicsError::InvalidSize {
            identifier: identifier.to_owned(),
            width: size.x,
            height: size.y,
        })
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BodyRecord {
    position: Vector2D,
    size: Vector2D,
    velocity: Vector2D,
    mass: f64,
    is_static: bool,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct PartialVector {
    x: Option<f64>,
    y: Option<f64>,
}

impl PartialVector {
    fn overlay(&self, base: Vector2D) -> Vector2D {
        Vector2D::new(self.x.unwrap_or(base.x), self.y.unwrap_or(base.y))
    }
}

#[derive(Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PartialBodyRecord {
    position: PartialVector,
    size: PartialVector,
    velocity: PartialVector,
    mass: Option<f64>,
    is_static: Option<bool>,
}

// ---------------------------------------------------------------------------
// RigidBodyBuilder
// ---------------------------------------------------------------------------

/// Fluent constructor for bodies with non-default flags.
///
/// ```
/// use burrow_physics::prelude::*;
///
/// let crate_body = RigidBody::builder("crate")
///     .position(Vector2D::new(10.0, 0.0))
///     .size(Vector2D::new(16.0, 16.0))
///     .mass(5.0)
///     .pushable(true)
///     .build()
///     .unwrap();
/// assert!(crate_body.is_pushable);
/// ```
#[derive(Debug, Clone)]
pub struct RigidBodyBuilder {
    identifier: String,
    position: Vector2D,
    velocity: Vector2D,
    size: Vector2D,
    mass: f64,
    is_static: bool,
    is_collidable: bool,
    is_pushable: bool,
    is_pickable: bool,
    can_pick: bool,
}

impl RigidBodyBuilder {
    /// Defaults: origin, zero velocity, 1x1, mass 1, dynamic, collidable.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            position: Vector2D::ZERO,
            velocity: Vector2D::ZERO,
            size: Vector2D::new(1.0, 1.0),
            mass: 1.0,
            is_static: false,
            is_collidable: true,
            is_pushable: false,
            is_pickable: false,
            can_pick: false,
        }
    }

    pub fn position(mut self, position: Vector2D) -> Self {
        self.position = position;
        self
    }

    pub fn velocity(mut self, velocity: Vector2D) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn size(mut self, size: Vector2D) -> Self {
        self.size = size;
        self
    }

    pub fn mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    pub fn static_body(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn collidable(mut self, is_collidable: bool) -> Self {
        self.is_collidable = is_collidable;
        self
    }

    pub fn pushable(mut self, is_pushable: bool) -> Self {
        self.is_pushable = is_pushable;
        self
    }

    pub fn pickable(mut self, is_pickable: bool) -> Self {
        self.is_pickable = is_pickable;
        self
    }

    pub fn can_pick(mut self, can_pick: bool) -> Self {
        self.can_pick = can_pick;
        self
    }

    /// Validate and produce the body.
    pub fn build(self) -> Result<RigidBody, PhysicsError> {
        let mut body = RigidBody::new(
            self.identifier,
            self.position,
            self.size,
            self.mass,
            self.is_static,
        )?;
        body.velocity = self.velocity;
        body.is_collidable = self.is_collidable;
        body.is_pushable = self.is_pushable;
        body.is_pickable = self.is_pickable;
        body.can_pick = self.can_pick;
        Ok(body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
