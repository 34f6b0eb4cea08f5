//! Top-level engine configuration.
//!
//! Every field has a default, so a config file only needs to mention what it
//! changes:
//!
//! ```
//! use burrow_engine::config::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{ "physics": { "floor_y": 640.0 } }"#).unwrap();
//! assert_eq!(config.physics.floor_y, 640.0);
//! assert_eq!(config.fixed_dt, 1.0 / 60.0);
//! ```

use burrow_events::prelude::{EventConfig, OverflowPolicy};
use burrow_physics::prelude::PhysicsConfig;
use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Directive used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Configuration for a [`Simulation`](crate::simulation::Simulation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seconds per tick. Must be positive and finite.
    pub fixed_dt: f64,
    /// `tracing` filter directive applied by
    /// [`init_tracing`](crate::logging::init_tracing).
    pub log_filter: String,
    pub physics: PhysicsConfig,
    pub events: EventConfig,
}

impl Default for EngineConfig {
    /// 60 Hz ticks with default physics and event settings.
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            physics: PhysicsConfig::default(),
            events: EventConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.fixed_dt > 0.0 && self.fixed_dt.is_finite()) {
            return Err(invalid(format!(
                "fixed_dt must be positive and finite, got {}",
                self.fixed_dt
            )));
        }
        let physics = &self.physics;
        if !(physics.gravity.x.is_finite() && physics.gravity.y.is_finite()) {
            return Err(invalid("physics.gravity must be finite"));
        }
        if !physics.floor_y.is_finite() {
            return Err(invalid("physics.floor_y must be finite"));
        }
        if !physics.body_gravity.is_finite() {
            return Err(invalid("physics.body_gravity must be finite"));
        }
        if !(physics.on_top_tolerance >= 0.0 && physics.on_top_tolerance.is_finite()) {
            return Err(invalid("physics.on_top_tolerance must be non-negative"));
        }
        if self.events.queue_capacity == Some(0) {
            return Err(invalid("events.queue_capacity must be at least 1"));
        }
        if self.events.workers == 0
            && self.events.queue_capacity.is_some()
            && self.events.overflow == OverflowPolicy::Block
        {
            // Nothing would ever drain the queue while the ticking thread waits.
            return Err(invalid(
                "events.overflow \"block\" needs at least one worker when the queue is bounded",
            ));
        }
        Ok(())
    }
}

fn invalid(details: impl Into<String>) -> EngineError {
    EngineError::InvalidConfig {
        details: details.into(),
    }
}
