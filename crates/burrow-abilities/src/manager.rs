//! The abilities manager: ability registry, action registry and event wiring.
//!
//! Abilities can be triggered two ways. [`AbilitiesManager::activate`] runs
//! the ability directly and, on success, broadcasts an
//! [`ABILITY_USED`](EventType::ABILITY_USED) event. Any component may also
//! dispatch that event itself: the manager subscribes to it and activates
//! the named ability for the named user. The event path re-checks the
//! cooldown, so the echo of a direct activation is declined, and it never
//! broadcasts again.
//!
//! Actions run while the ability registry is locked. An action must not call
//! back into the manager that invoked it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::time::Duration;

use burrow_events::prelude::*;
use tracing::{debug, info, trace, warn};

use crate::ability::{Ability, AbilityDefinition};
use crate::action::{ActionManager, Entity};
use crate::clock::Clock;
use crate::AbilityError;

/// Priority of the [`ABILITY_USED`](EventType::ABILITY_USED) broadcast.
pub const ABILITY_USED_PRIORITY: i32 = 1;

/// Payload of the [`ABILITY_USED`](EventType::ABILITY_USED) event.
#[derive(Debug, Clone)]
pub struct AbilityUsed {
    pub ability_name: String,
    pub user: Arc<dyn Entity>,
}

struct Inner {
    abilities: Mutex<HashMap<String, Ability>>,
    actions: RwLock<ActionManager>,
    clock: Arc<dyn Clock>,
}

impl Inner {
    fn abilities(&self) -> MutexGuard<'_, HashMap<String, Ability>> {
        self.abilities.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn activate(&self, name: &str, user: &dyn Entity) -> Result<(), AbilityError> {
        let mut abilities = self.abilities();
        let ability = abilities
            .get_mut(name)
            .ok_or_else(|| AbilityError::UnknownAbility {
                ability: name.to_owned(),
            })?;
        let actions = self.actions.read().unwrap_or_else(PoisonError::into_inner);
        ability.activate(user, &actions)
    }
}

/// Owns every ability and the actions they invoke.
pub struct AbilitiesManager {
    inner: Arc<Inner>,
    events: Arc<EventManager>,
}

impl AbilitiesManager {
    /// Create a manager and subscribe it to
    /// [`ABILITY_USED`](EventType::ABILITY_USED).
    pub fn new(actions: ActionManager, events: Arc<EventManager>, clock: Arc<dyn Clock>) -> Self {
        let inner = Arc::new(Inner {
            abilities: Mutex::new(HashMap::new()),
            actions: RwLock::new(actions),
            clock,
        });

        // Weak, so the registered handler does not keep the registry alive.
        let weak: Weak<Inner> = Arc::downgrade(&inner);
        events.register_handler(EventType::ABILITY_USED, move |event| {
            let Some(used) = event.payload::<AbilityUsed>() else {
                return;
            };
            let Some(inner) = weak.upgrade() else {
                return;
            };
            match inner.activate(&used.ability_name, used.user.as_ref()) {
                Ok(()) => debug!(
                    ability = %used.ability_name,
                    user = %used.user.name(),
                    "ability activated from event"
                ),
                Err(e) => trace!(error = %e, "event-triggered activation declined"),
            }
        });

        Self { inner, events }
    }

    /// Add every record, replacing abilities with the same name.
    ///
    /// All records are validated first; on error nothing is added.
    pub fn load_abilities(
        &self,
        definitions: impl IntoIterator<Item = AbilityDefinition>,
    ) -> Result<usize, AbilityError> {
        let abilities = definitions
            .into_iter()
            .map(|d| Ability::from_definition(d, Arc::clone(&self.inner.clock)))
            .collect::<Result<Vec<_>, _>>()?;
        let count = abilities.len();

        let mut registry = self.inner.abilities();
        for ability in abilities {
            registry.insert(ability.name().to_owned(), ability);
        }
        info!(count, total = registry.len(), "abilities loaded");
        Ok(count)
    }

    /// Add or replace one ability.
    pub fn add_ability(&self, ability: Ability) {
        self.inner
            .abilities()
            .insert(ability.name().to_owned(), ability);
    }

    /// Create a ready ability on the manager's clock and add it.
    pub fn add(&self, name: &str, action_name: &str, cooldown: Duration) {
        let ability = Ability::new(name, action_name, cooldown, Arc::clone(&self.inner.clock));
        self.add_ability(ability);
    }

    /// A copy of the ability's current state.
    pub fn ability(&self, name: &str) -> Option<Ability> {
        self.inner.abilities().get(name).cloned()
    }

    /// Names of all abilities, sorted.
    pub fn ability_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.abilities().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.inner.abilities().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `name` exists and is off cooldown.
    pub fn can_activate(&self, name: &str) -> bool {
        self.inner
            .abilities()
            .get(name)
            .is_some_and(Ability::can_activate)
    }

    /// Activate `name` for `user` and broadcast
    /// [`ABILITY_USED`](EventType::ABILITY_USED).
    ///
    /// The broadcast is fire-and-forget: this does not wait for handlers.
    pub fn activate(&self, name: &str, user: Arc<dyn Entity>) -> Result<(), AbilityError> {
        self.inner.activate(name, user.as_ref())?;

        let event = Event::new(EventType::ABILITY_USED, ABILITY_USED_PRIORITY).with_payload(
            AbilityUsed {
                ability_name: name.to_owned(),
                user,
            },
        );
        if let Err(e) = self.events.dispatch(event) {
            warn!(ability = %name, error = %e, "ability-used broadcast dropped");
        }
        Ok(())
    }

    /// Register or replace an action.
    pub fn register_action<F>(&self, name: impl Into<String>, action: F)
    where
        F: Fn(&dyn Entity) + Send + Sync + 'static,
    {
        self.inner
            .actions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register_action(name, action);
    }

    pub fn has_action(&self, name: &str) -> bool {
        self.inner
            .actions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .action(name)
            .is_some()
    }

    /// Advance every ability's per-tick hook.
    pub fn update(&self, dt: f64) {
        for ability in self.inner.abilities().values_mut() {
            ability.update(dt);
        }
    }

    /// The clock cooldowns are measured on.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.inner.clock
    }
}

impl std::fmt::Debug for AbilitiesManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbilitiesManager")
            .field("abilities", &self.ability_names())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
