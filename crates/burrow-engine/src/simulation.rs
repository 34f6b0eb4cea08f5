//! Fixed-timestep driver tying the subsystems together.
//!
//! Each [`Simulation::tick`]:
//!
//! 1. Moves the level's patrolling obstacles.
//! 2. Steps the [`PhysicsEngine`] by `fixed_dt` (integration, collisions and
//!    pickups, ground contact).
//! 3. Advances the abilities' per-tick hooks.
//! 4. With an inline event bus (`events.workers == 0`), delivers every event
//!    dispatched during the tick before returning.
//!
//! With worker threads, events are handled concurrently with the next ticks;
//! call [`settle`](Simulation::settle) to wait for them.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use burrow_engine::prelude::*;
//!
//! let config = EngineConfig {
//!     events: EventConfig { workers: 0, ..Default::default() },
//!     ..Default::default()
//! };
//! let mut sim = Simulation::new(config, Arc::new(ItemCatalog::new()));
//! sim.run_ticks(60);
//!
//! assert_eq!(sim.tick_count(), 60);
//! assert!((sim.sim_time() - 1.0).abs() < 1e-12);
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use burrow_abilities::prelude::*;
use burrow_events::prelude::*;
use burrow_physics::prelude::*;
use tracing::{debug, info, trace};

use crate::config::EngineConfig;
use crate::inventory::Inventory;
use crate::level::{Level, LoadedLevel};
use crate::EngineError;

// ---------------------------------------------------------------------------
// TickDiagnostics
// ---------------------------------------------------------------------------

/// Wall-clock timing of the last tick.
#[derive(Debug, Clone, Default)]
pub struct TickDiagnostics {
    pub level_time: Duration,
    pub physics_time: Duration,
    pub abilities_time: Duration,
    /// Time spent delivering events inline. Zero with a worker pool.
    pub events_time: Duration,
    pub total_time: Duration,
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// A running game world: event bus, physics, abilities, level and inventory.
pub struct Simulation {
    config: EngineConfig,
    events: Arc<EventManager>,
    physics: PhysicsEngine,
    abilities: AbilitiesManager,
    items: Arc<dyn ItemProvider>,
    inventory: Inventory,
    level: Option<LoadedLevel>,
    tick_counter: u64,
    last_report: StepReport,
    last_diagnostics: TickDiagnostics,
}

impl Simulation {
    /// Create a simulation whose cooldowns run on wall-clock time.
    ///
    /// # Panics
    ///
    /// Panics if `config.fixed_dt` is not positive and finite.
    pub fn new(config: EngineConfig, items: Arc<dyn ItemProvider>) -> Self {
        Self::with_clock(config, items, Arc::new(SystemClock::new()))
    }

    /// Create a simulation whose cooldowns run on `clock`.
    ///
    /// # Panics
    ///
    /// Panics if `config.fixed_dt` is not positive and finite.
    pub fn with_clock(
        config: EngineConfig,
        items: Arc<dyn ItemProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        assert!(
            config.fixed_dt > 0.0 && config.fixed_dt.is_finite(),
            "fixed_dt must be positive and finite, got {}",
            config.fixed_dt
        );

        let events = Arc::new(EventManager::new(config.events.clone()));
        let physics = PhysicsEngine::new(config.physics.clone(), Arc::clone(&events));
        let abilities = AbilitiesManager::new(ActionManager::new(), Arc::clone(&events), clock);
        let inventory = Inventory::attach(&events, Arc::clone(&items));

        info!(
            fixed_dt = config.fixed_dt,
            workers = events.worker_count(),
            "simulation created"
        );
        Self {
            config,
            events,
            physics,
            abilities,
            items,
            inventory,
            level: None,
            tick_counter: 0,
            last_report: StepReport::default(),
            last_diagnostics: TickDiagnostics::default(),
        }
    }

    /// Spawn `level` into the physics world. A previously loaded level's
    /// patrols stop; its bodies stay.
    pub fn load_level(&mut self, level: &Level) -> Result<(), EngineError> {
        let loaded = level.spawn_into(&mut self.physics, self.items.as_ref())?;
        if self.level.replace(loaded).is_some() {
            debug!("previous level replaced");
        }
        Ok(())
    }

    /// Run one tick and return what physics reported for it.
    pub fn tick(&mut self) -> &StepReport {
        let tick_start = Instant::now();
        let dt = self.config.fixed_dt;

        let level_start = Instant::now();
        if let Some(level) = self.level.as_mut() {
            level.update(&mut self.physics, dt);
        }
        let level_time = level_start.elapsed();

        let physics_start = Instant::now();
        self.last_report = self.physics.update(dt);
        let physics_time = physics_start.elapsed();

        let abilities_start = Instant::now();
        self.abilities.update(dt);
        let abilities_time = abilities_start.elapsed();

        let events_start = Instant::now();
        if self.events.worker_count() == 0 {
            self.events.run_pending();
        }
        let events_time = events_start.elapsed();

        self.tick_counter += 1;
        self.last_diagnostics = TickDiagnostics {
            level_time,
            physics_time,
            abilities_time,
            events_time,
            total_time: tick_start.elapsed(),
        };
        trace!(tick = self.tick_counter, "tick complete");
        &self.last_report
    }

    /// Run `count` ticks. Returns the identifiers picked up across them.
    pub fn run_ticks(&mut self, count: u64) -> Vec<String> {
        let mut picked_up = Vec::new();
        for _ in 0..count {
            picked_up.extend(self.tick().picked_up.iter().cloned());
        }
        picked_up
    }

    /// Block until every dispatched event has been handled.
    pub fn settle(&self) {
        self.events.wait();
    }

    // -- accessors ----------------------------------------------------------

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// Simulated seconds, computed as `tick_count * fixed_dt`.
    pub fn sim_time(&self) -> f64 {
        self.tick_counter as f64 * self.config.fixed_dt
    }

    pub fn fixed_dt(&self) -> f64 {
        self.config.fixed_dt
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn events(&self) -> &Arc<EventManager> {
        &self.events
    }

    pub fn physics(&self) -> &PhysicsEngine {
        &self.physics
    }

    /// Mutable access for setup and for input handling between ticks.
    pub fn physics_mut(&mut self) -> &mut PhysicsEngine {
        &mut self.physics
    }

    pub fn abilities(&self) -> &AbilitiesManager {
        &self.abilities
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn level(&self) -> Option<&LoadedLevel> {
        self.level.as_ref()
    }

    /// Level items still waiting to be picked up.
    pub fn remaining_items(&self) -> Vec<&str> {
        self.level
            .as_ref()
            .map(|level| level.remaining_items(&self.physics))
            .unwrap_or_default()
    }

    pub fn last_report(&self) -> &StepReport {
        &self.last_report
    }

    pub fn last_diagnostics(&self) -> &TickDiagnostics {
        &self.last_diagnostics
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &self.tick_counter)
            .field("bodies", &self.physics.len())
            .field("abilities", &self.abilities)
            .field("inventory", &self.inventory)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
