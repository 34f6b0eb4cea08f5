//! Cooldown-gated abilities.
//!
//! An ability is `Ready` when at least `cooldown` has elapsed since its last
//! successful activation and `OnCooldown` otherwise. There is no timer: the
//! state is a pure function of the clock reading. An ability that was never
//! used is always ready.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::action::{ActionManager, Entity};
use crate::clock::Clock;
use crate::AbilityError;

// ---------------------------------------------------------------------------
// AbilityDefinition
// ---------------------------------------------------------------------------

/// Persisted description of an ability. Cooldown is in seconds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AbilityDefinition {
    pub name: String,
    pub image: String,
    pub icon: String,
    pub description: String,
    pub cooldown: f64,
    pub action_name: String,
}

// ---------------------------------------------------------------------------
// Ability
// ---------------------------------------------------------------------------

/// A named power bound to an action, usable at most once per cooldown.
#[derive(Debug, Clone)]
pub struct Ability {
    name: String,
    image: String,
    icon: String,
    description: String,
    action_name: String,
    cooldown: Duration,
    last_used: Option<Duration>,
    clock: Arc<dyn Clock>,
}

impl Ability {
    /// Create a ready ability.
    pub fn new(
        name: impl Into<String>,
        action_name: impl Into<String>,
        cooldown: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            name: name.into(),
            image: String::new(),
            icon: String::new(),
            description: String::new(),
            action_name: action_name.into(),
            cooldown,
            last_used: None,
            clock,
        }
    }

    /// Build from a persisted record, validating name and cooldown.
    pub fn from_definition(
        definition: AbilityDefinition,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AbilityError> {
        if definition.name.trim().is_empty() {
            return Err(AbilityError::InvalidDefinition {
                details: "ability name is empty".to_owned(),
            });
        }
        let cooldown = cooldown_from_secs(&definition.name, definition.cooldown)?;
        Ok(Self {
            name: definition.name,
            image: definition.image,
            icon: definition.icon,
            description: definition.description,
            action_name: definition.action_name,
            cooldown,
            last_used: None,
            clock,
        })
    }

    /// The record this ability would be persisted as.
    pub fn definition(&self) -> AbilityDefinition {
        AbilityDefinition {
            name: self.name.clone(),
            image: self.image.clone(),
            icon: self.icon.clone(),
            description: self.description.clone(),
            cooldown: self.cooldown.as_secs_f64(),
            action_name: self.action_name.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn action_name(&self) -> &str {
        &self.action_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    /// When the ability last fired, on its clock. `None` if never.
    pub fn last_used(&self) -> Option<Duration> {
        self.last_used
    }

    /// Cooldown in seconds.
    pub fn cooldown(&self) -> f64 {
        self.cooldown.as_secs_f64()
    }

    /// Change the cooldown. Fractional seconds are kept.
    pub fn set_cooldown(&mut self, seconds: f64) -> Result<(), AbilityError> {
        self.cooldown = cooldown_from_secs(&self.name, seconds)?;
        Ok(())
    }

    /// Time left before the ability is ready again. Zero when ready.
    pub fn remaining_cooldown(&self) -> Duration {
        match self.last_used {
            None => Duration::ZERO,
            Some(used) => {
                let elapsed = self.clock.now().saturating_sub(used);
                self.cooldown.saturating_sub(elapsed)
            }
        }
    }

    /// `true` once the cooldown has fully elapsed.
    pub fn can_activate(&self) -> bool {
        self.remaining_cooldown().is_zero()
    }

    pub fn is_on_cooldown(&self) -> bool {
        !self.can_activate()
    }

    /// Run the bound action against `user` and start the cooldown.
    ///
    /// Fails without side effects when the ability is still cooling down or
    /// its action is not registered in `actions`.
    pub fn activate(
        &mut self,
        user: &dyn Entity,
        actions: &ActionManager,
    ) -> Result<(), AbilityError> {
        let remaining = self.remaining_cooldown();
        if !remaining.is_zero() {
            trace!(ability = %self.name, ?remaining, "ability on cooldown");
            return Err(AbilityError::OnCooldown {
                ability: self.name.clone(),
                remaining,
            });
        }
        let action = actions
            .action(&self.action_name)
            .ok_or_else(|| AbilityError::UnknownAction {
                ability: self.name.clone(),
                action: self.action_name.clone(),
            })?;

        action(user);
        self.last_used = Some(self.clock.now());
        debug!(ability = %self.name, user = %user.name(), "ability activated");
        Ok(())
    }

    /// End any lingering effect. Abilities currently have none.
    pub fn deactivate(&mut self) -> Result<(), AbilityError> {
        Ok(())
    }

    /// Per-tick hook for ongoing effects. Abilities currently have none.
    pub fn update(&mut self, _dt: f64) {}
}

fn cooldown_from_secs(ability: &str, seconds: f64) -> Result<Duration, AbilityError> {
    Duration::try_from_secs_f64(seconds).map_err(|_| AbilityError::InvalidCooldown {
        ability: ability.to_owned(),
        seconds,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
