//! Integration tests for cooldowns and event-driven activation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use burrow_abilities::prelude::*;
use burrow_events::prelude::*;

fn inline_events() -> Arc<EventManager> {
    Arc::new(EventManager::new(EventConfig {
        workers: 0,
        ..Default::default()
    }))
}

/// A manager with one ability `"Fly"` whose action counts invocations.
fn flying_setup(
    events: Arc<EventManager>,
    cooldown: Duration,
) -> (AbilitiesManager, Arc<ManualClock>, Arc<AtomicUsize>) {
    let clock = Arc::new(ManualClock::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let mut actions = ActionManager::new();
    let c = Arc::clone(&calls);
    actions.register_action("fly", move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    });
    let manager = AbilitiesManager::new(actions, events, clock.clone());
    manager.add("Fly", "fly", cooldown);
    (manager, clock, calls)
}

fn gopher() -> Arc<dyn Entity> {
    Arc::new(NamedEntity::new("gopher"))
}

#[test]
fn cooldown_gates_reactivation() -> anyhow::Result<()> {
    let (manager, clock, calls) = flying_setup(inline_events(), Duration::from_secs(2));

    manager.activate("Fly", gopher())?;

    clock.set(Duration::from_secs(1));
    assert!(!manager.can_activate("Fly"));
    let err = manager.activate("Fly", gopher()).unwrap_err();
    assert!(matches!(err, AbilityError::OnCooldown { .. }));

    clock.set(Duration::from_millis(2100));
    assert!(manager.can_activate("Fly"));
    manager.activate("Fly", gopher())?;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    let snapshot = manager.ability("Fly").expect("ability exists");
    assert_eq!(snapshot.last_used(), Some(Duration::from_millis(2100)));
    Ok(())
}

#[test]
fn dispatched_event_activates_ability() {
    let events = inline_events();
    let (_manager, _clock, calls) = flying_setup(Arc::clone(&events), Duration::from_secs(3));

    let event = Event::new(EventType::ABILITY_USED, 1).with_payload(AbilityUsed {
        ability_name: "Fly".to_owned(),
        user: gopher(),
    });
    events.dispatch(event.clone()).unwrap();
    events.dispatch(event).unwrap();
    events.wait();

    assert_eq!(calls.load(Ordering::SeqCst), 1, "second event hits the cooldown");
    assert_eq!(events.completed(), 2);
}

#[test]
fn echo_of_direct_activation_is_declined() {
    let events = inline_events();
    let (manager, _clock, calls) = flying_setup(Arc::clone(&events), Duration::from_secs(1));

    manager.activate("Fly", gopher()).unwrap();
    assert_eq!(events.pending(), 1);
    events.wait();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(events.dispatched(), 1);
}

#[test]
fn concurrent_events_activate_at_most_once() {
    let events = Arc::new(EventManager::new(EventConfig {
        workers: 4,
        ..Default::default()
    }));
    let (_manager, _clock, calls) = flying_setup(Arc::clone(&events), Duration::from_secs(10));

    for _ in 0..64 {
        let event = Event::new(EventType::ABILITY_USED, 1).with_payload(AbilityUsed {
            ability_name: "Fly".to_owned(),
            user: gopher(),
        });
        events.dispatch(event).unwrap();
    }
    events.wait();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn foreign_payloads_and_unknown_abilities_are_ignored() {
    let events = inline_events();
    let (_manager, _clock, calls) = flying_setup(Arc::clone(&events), Duration::ZERO);

    events
        .dispatch(Event::new(EventType::ABILITY_USED, 1).with_payload("Fly"))
        .unwrap();
    events
        .dispatch(Event::new(EventType::ABILITY_USED, 1).with_payload(AbilityUsed {
            ability_name: "Burrow".to_owned(),
            user: gopher(),
        }))
        .unwrap();
    events.wait();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn dropped_manager_leaves_handler_inert() {
    let events = inline_events();
    let (manager, _clock, calls) = flying_setup(Arc::clone(&events), Duration::ZERO);
    drop(manager);

    events
        .dispatch(Event::new(EventType::ABILITY_USED, 1).with_payload(AbilityUsed {
            ability_name: "Fly".to_owned(),
            user: gopher(),
        }))
        .unwrap();
    events.wait();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn missing_action_is_reported_distinctly() {
    let manager = AbilitiesManager::new(
        ActionManager::new(),
        inline_events(),
        Arc::new(ManualClock::new()),
    );
    manager.add("Dig", "dig", Duration::from_secs(1));
    let err = manager.activate("Dig", gopher()).unwrap_err();
    assert_eq!(
        err,
        AbilityError::UnknownAction {
            ability: "Dig".to_owned(),
            action: "dig".to_owned(),
        }
    );

    manager.register_action("dig", |_| {});
    assert!(manager.has_action("dig"));
    assert!(manager.activate("Dig", gopher()).is_ok());
}
