//! Burrow Abilities -- cooldown-gated powers, the actions they run and the
//! items that grant them.
//!
//! An [`Ability`](ability::Ability) names an action in the
//! [`ActionManager`](action::ActionManager) and may fire at most once per
//! cooldown, measured on an injectable [`Clock`](clock::Clock). The
//! [`AbilitiesManager`](manager::AbilitiesManager) owns both registries and
//! is wired into the event bus so abilities can be triggered directly or by
//! dispatching an `AbilityUsed` event.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use burrow_abilities::prelude::*;
//! use burrow_events::prelude::*;
//!
//! let events = Arc::new(EventManager::new(EventConfig { workers: 0, ..Default::default() }));
//! let clock = Arc::new(ManualClock::new());
//! let abilities = AbilitiesManager::new(ActionManager::new(), events, clock.clone());
//!
//! abilities.register_action("fly", |user| println!("{} takes off", user.name()));
//! abilities.add("Fly", "fly", Duration::from_secs(2));
//!
//! let gopher: Arc<dyn Entity> = Arc::new(NamedEntity::new("gopher"));
//! abilities.activate("Fly", gopher.clone()).unwrap();
//! assert!(abilities.activate("Fly", gopher.clone()).is_err());
//!
//! clock.advance(Duration::from_secs(2));
//! assert!(abilities.activate("Fly", gopher).is_ok());
//! ```

#![deny(unsafe_code)]

use std::time::Duration;

pub mod ability;
pub mod action;
pub mod clock;
pub mod item;
pub mod manager;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Why an ability could not be used or loaded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AbilityError {
    /// The ability fired too recently.
    #[error("ability '{ability}' is on cooldown for another {remaining:?}")]
    OnCooldown { ability: String, remaining: Duration },

    /// The ability's action is not registered.
    #[error("ability '{ability}' refers to unknown action '{action}'")]
    UnknownAction { ability: String, action: String },

    /// No ability with this name is registered.
    #[error("unknown ability '{ability}'")]
    UnknownAbility { ability: String },

    /// Cooldowns must be finite and non-negative.
    #[error("ability '{ability}' has invalid cooldown {seconds}s")]
    InvalidCooldown { ability: String, seconds: f64 },

    /// A persisted ability record is unusable.
    #[error("invalid ability definition: {details}")]
    InvalidDefinition { details: String },
}

/// Item lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemError {
    #[error("item not found: {name}")]
    NotFound { name: String },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::ability::{Ability, AbilityDefinition};
    pub use crate::action::{Action, ActionManager, Entity, NamedEntity};
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::item::{Appearance, Item, ItemCatalog, ItemProvider};
    pub use crate::manager::{AbilitiesManager, AbilityUsed};
    pub use crate::{AbilityError, ItemError};
}
