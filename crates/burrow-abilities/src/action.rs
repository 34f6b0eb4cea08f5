//! Named actions and the entities they act upon.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

/// Anything an ability can be used by: the player, a pet, an enemy.
pub trait Entity: fmt::Debug + Send + Sync {
    /// Display name, used in logs.
    fn name(&self) -> &str;
}

/// Minimal [`Entity`] that is nothing but a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedEntity(pub String);

impl NamedEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl Entity for NamedEntity {
    fn name(&self) -> &str {
        &self.0
    }
}

/// A side effect applied to the user of an ability.
pub type Action = Arc<dyn Fn(&dyn Entity) + Send + Sync>;

/// Registry of actions by name. Abilities refer to actions through their
/// `action_name`.
#[derive(Default, Clone)]
pub struct ActionManager {
    actions: HashMap<String, Action>,
}

impl ActionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `action` under `name`, replacing any previous action with
    /// that name.
    pub fn register_action<F>(&mut self, name: impl Into<String>, action: F)
    where
        F: Fn(&dyn Entity) + Send + Sync + 'static,
    {
        let name = name.into();
        debug!(action = %name, "registering action");
        self.actions.insert(name, Arc::new(action));
    }

    /// Look up an action.
    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    /// Every registered action.
    pub fn actions(&self) -> &HashMap<String, Action> {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl fmt::Debug for ActionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.actions.keys().collect();
        names.sort();
        f.debug_struct("ActionManager")
            .field("actions", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn registered_action_is_invocable() {
        let mut actions = ActionManager::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        actions.register_action("fly", move |_user| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        let fly = actions.action("fly").unwrap();
        fly(&NamedEntity::new("gopher"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(actions.action("dig").is_none());
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn re_registration_replaces() {
        let mut actions = ActionManager::new();
        let last = Arc::new(std::sync::Mutex::new(""));
        for tag in ["old", "new"] {
            let l = Arc::clone(&last);
            actions.register_action("spawnContainer", move |_| *l.lock().unwrap() = tag);
        }
        assert_eq!(actions.len(), 1);
        actions.action("spawnContainer").unwrap()(&NamedEntity::new("p"));
        assert_eq!(*last.lock().unwrap(), "new");
    }

    #[test]
    fn debug_lists_sorted_names() {
        let mut actions = ActionManager::new();
        actions.register_action("moveContainer", |_| {});
        actions.register_action("fly", |_| {});
        assert_eq!(
            format!("{actions:?}"),
            r#"ActionManager { actions: ["fly", "moveContainer"] }"#
        );
    }
}
