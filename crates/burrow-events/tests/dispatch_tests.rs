//! Integration tests for the event manager's ordering and join contracts.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use burrow_events::prelude::*;

// ---------------------------------------------------------------------------
// Priority ordering
// ---------------------------------------------------------------------------

#[test]
fn highest_priority_is_handled_first() {
    let events = EventManager::new(EventConfig {
        workers: 1,
        ..Default::default()
    });
    let order = Arc::new(Mutex::new(Vec::new()));
    let o = Arc::clone(&order);
    events.register_handler("burst", move |e| o.lock().unwrap().push(e.priority));

    // Hold the workers so all three sit in the queue together.
    events.pause();
    events.dispatch(Event::new("burst", 1)).unwrap();
    events.dispatch(Event::new("burst", 5)).unwrap();
    events.dispatch(Event::new("burst", 3)).unwrap();
    events.resume();
    events.wait();

    let order = order.lock().unwrap();
    assert_eq!(order.first(), Some(&5));
    assert_eq!(*order, vec![5, 3, 1]);
}

#[test]
fn equal_priority_burst_is_fifo_in_inline_mode() {
    let events = EventManager::new(EventConfig {
        workers: 0,
        ..Default::default()
    });
    let order = Arc::new(Mutex::new(Vec::new()));
    let o = Arc::clone(&order);
    events.register_handler("tie", move |e| {
        o.lock().unwrap().push(*e.payload::<u32>().unwrap());
    });

    for i in 0..10u32 {
        events.dispatch(Event::new("tie", 7).with_payload(i)).unwrap();
    }
    assert_eq!(events.run_pending(), 10);
    assert_eq!(*order.lock().unwrap(), (0..10).collect::<Vec<_>>());
}

// ---------------------------------------------------------------------------
// Counting join
// ---------------------------------------------------------------------------

#[test]
fn wait_joins_all_dispatches() {
    const N: usize = 500;
    let events = EventManager::new(EventConfig {
        workers: 4,
        ..Default::default()
    });
    let counter = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&counter);
    events.register_handler("count", move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    });

    for i in 0..N {
        events.dispatch(Event::new("count", (i % 7) as i32)).unwrap();
    }
    events.wait();

    assert_eq!(counter.load(Ordering::SeqCst), N);
    assert_eq!(events.completed(), N as u64);
    assert_eq!(events.dispatched(), N as u64);
}

#[test]
fn wait_joins_dispatches_from_many_threads() {
    let events = Arc::new(EventManager::new(EventConfig {
        workers: 3,
        ..Default::default()
    }));
    let counter = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&counter);
    events.register_handler(EventType::KEY_PRESSED, move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    });

    let producers: Vec<_> = (0..4)
        .map(|_| {
            let events = Arc::clone(&events);
            thread::spawn(move || {
                for _ in 0..50 {
                    events.dispatch(Event::new(EventType::KEY_PRESSED, 0)).unwrap();
                }
            })
        })
        .collect();
    for p in producers {
        p.join().unwrap();
    }
    events.wait();

    assert_eq!(counter.load(Ordering::SeqCst), 200);
}

#[test]
fn handlers_of_one_event_do_not_interleave() {
    let events = EventManager::new(EventConfig {
        workers: 4,
        ..Default::default()
    });
    let trace = Arc::new(Mutex::new(Vec::new()));
    for step in 0..3u32 {
        let t = Arc::clone(&trace);
        events.register_handler("seq", move |e| {
            let id = *e.payload::<u32>().unwrap();
            t.lock().unwrap().push((id, step));
        });
    }

    for id in 0..20u32 {
        events.dispatch(Event::new("seq", 0).with_payload(id)).unwrap();
    }
    events.wait();

    // Per event, the three handlers ran in registration order.
    let trace = trace.lock().unwrap();
    for id in 0..20u32 {
        let steps: Vec<u32> = trace.iter().filter(|(i, _)| *i == id).map(|(_, s)| *s).collect();
        assert_eq!(steps, vec![0, 1, 2], "event {id}");
    }
}

#[test]
fn dispatch_after_wait_is_joined_by_next_wait() {
    let events = EventManager::new(EventConfig::default());
    let counter = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&counter);
    events.register_handler("again", move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    });

    events.dispatch(Event::new("again", 0)).unwrap();
    events.wait();
    assert_eq!(counter.load(Ordering::SeqCst), 1);

    events.dispatch(Event::new("again", 0)).unwrap();
    events.dispatch(Event::new("again", 0)).unwrap();
    events.wait();
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}
