//! Level geometry: platforms, obstacles (optionally patrolling) and items
//! waiting to be picked up.
//!
//! A [`Level`] is plain data decoded from JSON. [`Level::spawn_into`]
//! validates it, registers one static body per object and returns a
//! [`LoadedLevel`] that drives the patrolling obstacles each tick.
//!
//! ```
//! use std::sync::Arc;
//!
//! use burrow_abilities::prelude::*;
//! use burrow_engine::level::Level;
//! use burrow_events::prelude::*;
//! use burrow_physics::prelude::*;
//!
//! let level = Level::from_json_str(r#"{ "objects": [
//!     { "kind": "platform", "position": { "x": 0.0, "y": 300.0 }, "size": { "x": 400.0, "y": 20.0 } },
//!     { "kind": "item", "name": "Shovel", "position": { "x": 50.0, "y": 280.0 }, "size": { "x": 16.0, "y": 16.0 } }
//! ] }"#).unwrap();
//!
//! let mut catalog = ItemCatalog::new();
//! catalog.add_item(Item::new("Shovel", vec!["Dig".to_owned()]));
//!
//! let events = Arc::new(EventManager::new(EventConfig { workers: 0, ..Default::default() }));
//! let mut engine = PhysicsEngine::new(PhysicsConfig::default(), events);
//! let loaded = level.spawn_into(&mut engine, &catalog).unwrap();
//!
//! assert!(engine.find("platform0").is_some());
//! assert_eq!(loaded.remaining_items(&engine), vec!["Shovel"]);
//! ```

use std::collections::HashSet;

use burrow_abilities::prelude::ItemProvider;
use burrow_physics::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::EngineError;

// ---------------------------------------------------------------------------
// Level data
// ---------------------------------------------------------------------------

/// Axis a patrolling obstacle moves along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Horizontal,
    Vertical,
}

/// Back-and-forth motion about an obstacle's spawn point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    #[serde(rename = "type")]
    pub direction: Direction,
    /// Maximum offset from the spawn point before the obstacle turns round.
    pub distance: f64,
    /// Signed speed in units per second.
    pub speed: f64,
}

/// One placed object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LevelObject {
    Platform {
        position: Vector2D,
        size: Vector2D,
    },
    Obstacle {
        position: Vector2D,
        size: Vector2D,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        movement: Option<Movement>,
    },
    /// A pickable body named after the item it grants.
    Item {
        name: String,
        position: Vector2D,
        size: Vector2D,
    },
}

impl LevelObject {
    fn placement(&self) -> (Vector2D, Vector2D) {
        match *self {
            Self::Platform { position, size }
            | Self::Obstacle { position, size, .. }
            | Self::Item { position, size, .. } => (position, size),
        }
    }
}

/// A complete level description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Level {
    /// Background image path. Carried for front ends; the simulation ignores it.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub background: String,
    pub objects: Vec<LevelObject>,
}

impl Level {
    /// Decode a level. Use [`validate`](Self::validate) or
    /// [`spawn_into`](Self::spawn_into) to check its contents.
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check geometry and that every item is known to `items`.
    pub fn validate(&self, items: &dyn ItemProvider) -> Result<(), EngineError> {
        let mut item_names = HashSet::new();
        for (index, object) in self.objects.iter().enumerate() {
            let (position, size) = object.placement();
            if !(position.x.is_finite() && position.y.is_finite()) {
                return Err(invalid(index, "position must be finite"));
            }
            if !(size.x > 0.0 && size.y > 0.0 && size.x.is_finite() && size.y.is_finite()) {
                return Err(invalid(
                    index,
                    format!("size must be positive, got {}x{}", size.x, size.y),
                ));
            }
            match object {
                LevelObject::Obstacle {
                    movement: Some(movement),
                    ..
                } => {
                    if !(movement.distance >= 0.0 && movement.distance.is_finite()) {
                        return Err(invalid(index, "movement distance must be non-negative"));
                    }
                    if !movement.speed.is_finite() {
                        return Err(invalid(index, "movement speed must be finite"));
                    }
                }
                LevelObject::Item { name, .. } => {
                    if !item_names.insert(name.as_str()) {
                        return Err(invalid(index, format!("item '{name}' is placed twice")));
                    }
                    items.get_item(name)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Validate, then register every object as a static body.
    ///
    /// Platforms are named `platform{i}` and obstacles `obstacle{i}`, with
    /// `i` counting objects of that kind. Items become pickable bodies named
    /// after the item. Nothing is registered if validation fails; a clash with
    /// a body already in `engine` stops spawning at that object.
    pub fn spawn_into(
        &self,
        engine: &mut PhysicsEngine,
        items: &dyn ItemProvider,
    ) -> Result<LoadedLevel, EngineError> {
        self.validate(items)?;

        let mut loaded = LoadedLevel::default();
        let (mut platforms, mut obstacles) = (0usize, 0usize);
        for object in &self.objects {
            let (position, size) = object.placement();
            match object {
                LevelObject::Platform { .. } => {
                    let body = fixture(format!("platform{platforms}"), position, size).build()?;
                    engine.add_rigid_body(body)?;
                    platforms += 1;
                }
                LevelObject::Obstacle { movement, .. } => {
                    let body = fixture(format!("obstacle{obstacles}"), position, size).build()?;
                    let handle = engine.add_rigid_body(body)?;
                    obstacles += 1;
                    if let Some(movement) = *movement {
                        loaded.patrols.push(Patrol::new(handle, position, movement));
                    }
                }
                LevelObject::Item { name, .. } => {
                    let body = fixture(name.clone(), position, size).pickable(true).build()?;
                    let handle = engine.add_rigid_body(body)?;
                    loaded.items.push((name.clone(), handle));
                }
            }
        }

        info!(
            platforms,
            obstacles,
            patrols = loaded.patrols.len(),
            items = loaded.items.len(),
            "level spawned"
        );
        Ok(loaded)
    }
}

fn fixture(identifier: String, position: Vector2D, size: Vector2D) -> RigidBodyBuilder {
    RigidBody::builder(identifier)
        .position(position)
        .size(size)
        .mass(1.0)
        .static_body(true)
}

fn invalid(index: usize, details: impl std::fmt::Display) -> EngineError {
    EngineError::InvalidLevel {
        details: format!("object {index}: {details}"),
    }
}

// ---------------------------------------------------------------------------
// Patrol
// ---------------------------------------------------------------------------

/// A static body moved back and forth by the level rather than by physics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Patrol {
    body: BodyHandle,
    origin: Vector2D,
    movement: Movement,
}

impl Patrol {
    pub fn new(body: BodyHandle, origin: Vector2D, movement: Movement) -> Self {
        Self {
            body,
            origin,
            movement,
        }
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    /// Current signed speed. Flips each time the body leaves its range.
    pub fn speed(&self) -> f64 {
        self.movement.speed
    }

    /// Step the body by `speed * dt`, then turn round if it ended up more
    /// than `distance` from its origin. The step that crosses the limit is
    /// kept, so the body may overshoot by up to one step.
    ///
    /// Returns `false` once the body is no longer in `engine`.
    pub fn advance(&mut self, engine: &mut PhysicsEngine, dt: f64) -> bool {
        let Some(body) = engine.body_mut(self.body) else {
            return false;
        };
        let (coordinate, origin) = match self.movement.direction {
            Direction::Horizontal => (&mut body.position.x, self.origin.x),
            Direction::Vertical => (&mut body.position.y, self.origin.y),
        };
        *coordinate += self.movement.speed * dt;
        let offset = *coordinate - origin;
        if offset > self.movement.distance || offset < -self.movement.distance {
            self.movement.speed = -self.movement.speed;
            trace!(identifier = %body.identifier(), speed = self.movement.speed, "patrol reversed");
        }
        true
    }
}

// ---------------------------------------------------------------------------
// LoadedLevel
// ---------------------------------------------------------------------------

/// The live part of a spawned level.
#[derive(Debug, Clone, Default)]
pub struct LoadedLevel {
    patrols: Vec<Patrol>,
    items: Vec<(String, BodyHandle)>,
}

impl LoadedLevel {
    /// Move every patrolling obstacle. Patrols whose body was removed are
    /// dropped.
    pub fn update(&mut self, engine: &mut PhysicsEngine, dt: f64) {
        let before = self.patrols.len();
        self.patrols.retain_mut(|patrol| patrol.advance(engine, dt));
        if self.patrols.len() != before {
            debug!(dropped = before - self.patrols.len(), "patrols without a body dropped");
        }
    }

    pub fn patrols(&self) -> &[Patrol] {
        &self.patrols
    }

    /// Items of this level that have not been picked up yet, in placement
    /// order.
    pub fn remaining_items<'a>(&'a self, engine: &PhysicsEngine) -> Vec<&'a str> {
        self.items
            .iter()
            .filter(|(_, handle)| engine.body(*handle).is_some())
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
