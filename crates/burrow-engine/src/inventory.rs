//! Items the player has equipped and the abilities they grant.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use burrow_abilities::prelude::{Item, ItemProvider};
use burrow_events::prelude::*;
use burrow_physics::prelude::ItemEquipped;
use tracing::{info, warn};

#[derive(Debug, Default)]
struct Equipped {
    items: Vec<Item>,
    abilities: Vec<String>,
}

impl Equipped {
    fn equip(&mut self, item: Item) {
        for ability in &item.abilities {
            if !self.abilities.contains(ability) {
                self.abilities.push(ability.clone());
            }
        }
        info!(item = %item.name, abilities = ?item.abilities, "item equipped");
        self.items.push(item);
    }
}

/// Equips items as they are picked up.
///
/// On every [`ITEM_EQUIPPED`](EventType::ITEM_EQUIPPED) event carrying an
/// [`ItemEquipped`] payload the named item is looked up in the provider and
/// recorded. Unknown names are logged and skipped.
#[derive(Clone)]
pub struct Inventory {
    state: Arc<Mutex<Equipped>>,
}

impl Inventory {
    /// Create an empty inventory subscribed to `events`.
    pub fn attach(events: &EventManager, items: Arc<dyn ItemProvider>) -> Self {
        let state = Arc::new(Mutex::new(Equipped::default()));

        let weak: Weak<Mutex<Equipped>> = Arc::downgrade(&state);
        events.register_handler(EventType::ITEM_EQUIPPED, move |event| {
            let Some(picked) = event.payload::<ItemEquipped>() else {
                return;
            };
            let Some(state) = weak.upgrade() else {
                return;
            };
            match items.get_item(&picked.item_name) {
                Ok(item) => lock(&state).equip(item),
                Err(e) => warn!(error = %e, "picked-up item cannot be equipped"),
            }
        });

        Self { state }
    }

    /// Record `item` directly, bypassing the event bus.
    pub fn equip(&self, item: Item) {
        lock(&self.state).equip(item);
    }

    /// Equipped items in pickup order.
    pub fn items(&self) -> Vec<Item> {
        lock(&self.state).items.clone()
    }

    pub fn item_names(&self) -> Vec<String> {
        lock(&self.state)
            .items
            .iter()
            .map(|item| item.name.clone())
            .collect()
    }

    /// Abilities granted so far, without duplicates, in the order first
    /// granted.
    pub fn abilities(&self) -> Vec<String> {
        lock(&self.state).abilities.clone()
    }

    pub fn has_ability(&self, name: &str) -> bool {
        lock(&self.state).abilities.iter().any(|a| a == name)
    }

    pub fn len(&self) -> usize {
        lock(&self.state).items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Inventory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inventory")
            .field("items", &self.item_names())
            .field("abilities", &self.abilities())
            .finish()
    }
}

fn lock(state: &Mutex<Equipped>) -> MutexGuard<'_, Equipped> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
