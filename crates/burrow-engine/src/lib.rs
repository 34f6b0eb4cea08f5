//! Burrow Engine -- the facade that assembles events, physics and abilities
//! into a playable world.
//!
//! A [`Simulation`](simulation::Simulation) owns one event bus, one
//! [`PhysicsEngine`](burrow_physics::engine::PhysicsEngine) and one
//! [`AbilitiesManager`](burrow_abilities::manager::AbilitiesManager). Levels
//! decoded from JSON spawn platforms, patrolling obstacles and items into
//! the physics world; when a picker touches an item, the
//! [`Inventory`](inventory::Inventory) equips it and records the abilities it
//! grants.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use burrow_engine::prelude::*;
//!
//! let mut catalog = ItemCatalog::new();
//! catalog.add_item(Item::new("Jetpack", vec!["Fly".to_owned()]));
//!
//! let config = EngineConfig::from_json_str(r#"{ "events": { "workers": 0 } }"#).unwrap();
//! let mut sim = Simulation::new(config, Arc::new(catalog));
//! sim.load_level(&Level::from_json_str(r#"{ "objects": [
//!     { "kind": "item", "name": "Jetpack", "position": { "x": 0.0, "y": 0.0 }, "size": { "x": 8.0, "y": 8.0 } }
//! ] }"#).unwrap()).unwrap();
//!
//! let player = RigidBody::builder("player")
//!     .position(Vector2D::new(4.0, 4.0))
//!     .size(Vector2D::new(8.0, 16.0))
//!     .can_pick(true)
//!     .build()
//!     .unwrap();
//! sim.physics_mut().add_rigid_body(player).unwrap();
//!
//! sim.tick();
//! assert!(sim.inventory().has_ability("Fly"));
//! assert!(sim.remaining_items().is_empty());
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod inventory;
pub mod level;
pub mod logging;
pub mod simulation;

use burrow_abilities::{AbilityError, ItemError};
use burrow_events::EventError;
use burrow_physics::PhysicsError;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while configuring or loading a simulation.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A JSON document could not be decoded.
    #[error("malformed JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A configuration value is out of range.
    #[error("invalid engine config: {details}")]
    InvalidConfig { details: String },

    /// A level object has impossible geometry or is placed twice.
    #[error("invalid level: {details}")]
    InvalidLevel { details: String },

    #[error(transparent)]
    Physics(#[from] PhysicsError),

    #[error(transparent)]
    Ability(#[from] AbilityError),

    #[error(transparent)]
    Item(#[from] ItemError),

    #[error(transparent)]
    Event(#[from] EventError),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports of this crate and its subsystems.
pub mod prelude {
    pub use burrow_abilities::prelude::*;
    pub use burrow_events::prelude::*;
    pub use burrow_physics::prelude::*;

    pub use crate::config::EngineConfig;
    pub use crate::inventory::Inventory;
    pub use crate::level::{Direction, Level, LevelObject, LoadedLevel, Movement, Patrol};
    pub use crate::logging::init_tracing;
    pub use crate::simulation::{Simulation, TickDiagnostics};
    pub use crate::EngineError;
}
