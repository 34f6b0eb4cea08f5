//! Equippable items and their lookup.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ItemError;

/// Visual description of an item. Opaque to the simulation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Appearance {
    #[serde(rename = "type")]
    pub kind: String,
    pub color: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub material: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub special_effects: String,
}

/// An item that can be picked up and equipped. Equipping grants the
/// abilities it names.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    pub name: String,
    pub image: String,
    pub icon: String,
    pub description: String,
    pub appearance: Appearance,
    pub abilities: Vec<String>,
    pub version: i32,
}

impl Item {
    /// An item with only a name and the abilities it grants.
    pub fn new(name: impl Into<String>, abilities: Vec<String>) -> Self {
        Self {
            name: name.into(),
            abilities,
            ..Default::default()
        }
    }
}

/// Source of item definitions, consulted when a pickup names an item.
pub trait ItemProvider: Send + Sync {
    /// Look up an item by name.
    fn get_item(&self, name: &str) -> Result<Item, ItemError>;
}

/// In-memory [`ItemProvider`].
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    items: HashMap<String, Item>,
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert decoded records. Later records replace earlier ones with the
    /// same name. Returns how many were inserted.
    pub fn load_items(&mut self, records: impl IntoIterator<Item = Item>) -> usize {
        let mut count = 0;
        for item in records {
            self.add_item(item);
            count += 1;
        }
        debug!(count, total = self.items.len(), "items loaded");
        count
    }

    pub fn add_item(&mut self, item: Item) {
        self.items.insert(item.name.clone(), item);
    }

    pub fn remove_item(&mut self, name: &str) -> Option<Item> {
        self.items.remove(name)
    }

    /// Every item, sorted by name.
    pub fn all_items(&self) -> Vec<&Item> {
        let mut items: Vec<&Item> = self.items.values().collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        items
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl ItemProvider for ItemCatalog {
    fn get_item(&self, name: &str) -> Result<Item, ItemError> {
        self.items
            .get(name)
            .cloned()
            .ok_or_else(|| ItemError::NotFound {
                name: name.to_owned(),
            })
    }
}
