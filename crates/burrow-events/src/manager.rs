//! The concurrent event manager.
//!
//! [`EventManager::dispatch`] pushes an event onto the shared
//! [`EventQueue`] under a mutex and wakes one worker. A worker pops the single
//! most urgent pending event, releases the queue, then takes a read lock on
//! the handler registry and runs every handler for that type in registration
//! order without letting go of the lock in between. Handlers for one event
//! therefore never interleave, while handlers for different events may run in
//! parallel on different workers and alongside the simulation thread.
//!
//! [`EventManager::wait`] is a counting join: it returns once the number of
//! completed processing units equals the number of accepted dispatches, not
//! merely when the queue looks empty.
//!
//! # Re-entrancy
//!
//! Handlers may call [`dispatch`](EventManager::dispatch). Calling
//! [`register_handler`](EventManager::register_handler) or
//! [`wait`](EventManager::wait) from inside a handler deadlocks: the first
//! needs the registry write lock the running worker holds for reading, the
//! second waits for the very unit that is executing it.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, JoinHandle};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, trace, warn};

use crate::event::{Event, EventType};
use crate::queue::EventQueue;
use crate::EventError;

/// A subscriber callback.
pub type EventHandler = Arc<dyn Fn(&Event) + Send + Sync>;

// ---------------------------------------------------------------------------
// EventConfig
// ---------------------------------------------------------------------------

/// What [`EventManager::dispatch`] does when a bounded queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Return [`EventError::QueueFull`] and drop the event.
    #[default]
    Reject,
    /// Block the caller until a worker frees a slot.
    Block,
}

/// Configuration for the event manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Number of worker threads. `0` selects inline mode: nothing runs until
    /// [`EventManager::run_pending`] or [`EventManager::wait`] is called.
    pub workers: usize,
    /// Maximum number of pending events. `None` means unbounded.
    pub queue_capacity: Option<usize>,
    /// Behaviour when `queue_capacity` is reached.
    pub overflow: OverflowPolicy,
}

impl Default for EventConfig {
    /// Unbounded queue, one worker per core up to four.
    fn default() -> Self {
        let cores = thread::available_parallelism().map_or(1, |n| n.get());
        Self {
            workers: cores.clamp(1, 4),
            queue_capacity: None,
            overflow: OverflowPolicy::Reject,
        }
    }
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct State {
    queue: EventQueue,
    /// Accepted dispatches.
    dispatched: u64,
    /// Finished processing units.
    completed: u64,
    paused: bool,
    shutdown: bool,
}

struct Shared {
    state: Mutex<State>,
    /// Signalled when an event becomes poppable or on shutdown.
    work_ready: Condvar,
    /// Signalled when a pop frees room in a bounded queue.
    space_ready: Condvar,
    /// Signalled when `completed` catches up with `dispatched`.
    all_done: Condvar,
    handlers: RwLock<HashMap<EventType, Vec<EventHandler>>>,
    capacity: Option<usize>,
    overflow: OverflowPolicy,
}

fn lock(mutex: &Mutex<State>) -> MutexGuard<'_, State> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn wait_on<'a>(condvar: &Condvar, guard: MutexGuard<'a, State>) -> MutexGuard<'a, State> {
    condvar.wait(guard).unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    /// Block until an event can be taken, or return `None` on shutdown.
    fn next_event(&self) -> Option<Event> {
        let mut state = lock(&self.state);
        loop {
            if !state.paused {
                if let Some(event) = state.queue.pop() {
                    self.space_ready.notify_one();
                    return Some(event);
                }
            }
            if state.shutdown {
                return None;
            }
            state = wait_on(&self.work_ready, state);
        }
    }

    /// Run every handler for the event, then count the unit as complete.
    fn process(&self, event: &Event) {
        {
            let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(list) = handlers.get(&event.event_type) {
                trace!(
                    event_type = %event.event_type,
                    priority = event.priority,
                    handlers = list.len(),
                    "processing event"
                );
                for handler in list {
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(event)));
                    if outcome.is_err() {
                        error!(event_type = %event.event_type, "event handler panicked");
                    }
                }
            }
        }

        let mut state = lock(&self.state);
        state.completed += 1;
        // A paused waiter may need to run newly queued events itself.
        if state.completed == state.dispatched || state.paused {
            self.all_done.notify_all();
        }
    }

    fn worker_loop(&self) {
        while let Some(event) = self.next_event() {
            self.process(&event);
        }
    }
}

// ---------------------------------------------------------------------------
// EventManager
// ---------------------------------------------------------------------------

/// Priority-ordered, concurrently processed publish/subscribe bus.
///
/// Share it between subsystems with an `Arc`. Dropping the last handle
/// processes whatever is still queued (on the dropping thread in inline
/// mode), then stops and joins the workers.
pub struct EventManager {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl EventManager {
    /// Create a manager and start its worker pool.
    pub fn new(config: EventConfig) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(State::default()),
            work_ready: Condvar::new(),
            space_ready: Condvar::new(),
            all_done: Condvar::new(),
            handlers: RwLock::new(HashMap::new()),
            capacity: config.queue_capacity,
            overflow: config.overflow,
        });

        let mut workers = Vec::with_capacity(config.workers);
        for index in 0..config.workers {
            let worker_shared = Arc::clone(&shared);
            let spawned = thread::Builder::new()
                .name(format!("burrow-events-{index}"))
                .spawn(move || worker_shared.worker_loop());
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => warn!(error = %e, index, "failed to spawn event worker"),
            }
        }

        info!(
            workers = workers.len(),
            capacity = ?config.queue_capacity,
            "event manager started"
        );

        Self { shared, workers }
    }

    /// Subscribe `handler` to events of `event_type`.
    ///
    /// No de-duplication: registering the same closure twice runs it twice.
    /// Handlers for a type run in the order they were registered.
    pub fn register_handler<F>(&self, event_type: impl Into<EventType>, handler: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let event_type = event_type.into();
        debug!(event_type = %event_type, "registering event handler");
        self.shared
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event_type)
            .or_default()
            .push(Arc::new(handler));
    }

    /// Number of handlers registered for `event_type`.
    pub fn handler_count(&self, event_type: &EventType) -> usize {
        self.shared
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event_type)
            .map_or(0, Vec::len)
    }

    /// Queue an event for asynchronous processing.
    ///
    /// Each accepted dispatch yields exactly one processing unit, which pops
    /// whatever is most urgent at that moment -- not necessarily this event.
    pub fn dispatch(&self, event: Event) -> Result<(), EventError> {
        let mut state = lock(&self.shared.state);
        if state.shutdown {
            return Err(EventError::ShutDown);
        }

        if let Some(capacity) = self.shared.capacity {
            while state.queue.len() >= capacity {
                match self.shared.overflow {
                    OverflowPolicy::Reject => {
                        return Err(EventError::QueueFull {
                            capacity,
                            event_type: event.event_type.to_string(),
                        });
                    }
                    OverflowPolicy::Block => {
                        state = wait_on(&self.shared.space_ready, state);
                        if state.shutdown {
                            return Err(EventError::ShutDown);
                        }
                    }
                }
            }
        }

        trace!(event_type = %event.event_type, priority = event.priority, "dispatch");
        state.queue.push(event);
        state.dispatched += 1;
        drop(state);

        self.shared.work_ready.notify_one();
        Ok(())
    }

    /// Block until every accepted dispatch has been fully handled.
    ///
    /// Queued events are processed on the calling thread when there are no
    /// workers to take them: in inline mode, or while the manager is paused.
    pub fn wait(&self) {
        let inline = self.workers.is_empty();
        let mut state = lock(&self.shared.state);
        while state.completed < state.dispatched {
            if (inline || state.paused) && !state.queue.is_empty() {
                drop(state);
                self.run_pending();
                state = lock(&self.shared.state);
                continue;
            }
            state = wait_on(&self.shared.all_done, state);
        }
    }

    /// Process pending events on the calling thread until the queue is empty.
    ///
    /// Ignores [`pause`](Self::pause). Returns the number of events handled.
    pub fn run_pending(&self) -> usize {
        let mut handled = 0;
        loop {
            let next = {
                let mut state = lock(&self.shared.state);
                state.queue.pop()
            };
            let Some(event) = next else { break };
            self.shared.space_ready.notify_one();
            self.shared.process(&event);
            handled += 1;
        }
        handled
    }

    /// Stop workers from taking new events. Dispatch keeps queueing.
    pub fn pause(&self) {
        lock(&self.shared.state).paused = true;
        self.shared.all_done.notify_all();
    }

    /// Let workers drain the queue again.
    pub fn resume(&self) {
        lock(&self.shared.state).paused = false;
        self.shared.work_ready.notify_all();
    }

    /// Events queued but not yet taken by a worker.
    pub fn pending(&self) -> usize {
        lock(&self.shared.state).queue.len()
    }

    /// Total dispatches accepted so far.
    pub fn dispatched(&self) -> u64 {
        lock(&self.shared.state).dispatched
    }

    /// Total processing units finished so far.
    pub fn completed(&self) -> u64 {
        lock(&self.shared.state).completed
    }

    /// Number of running worker threads.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

impl std::fmt::Debug for EventManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.shared.state);
        f.debug_struct("EventManager")
            .field("workers", &self.workers.len())
            .field("pending", &state.queue.len())
            .field("dispatched", &state.dispatched)
            .field("completed", &state.completed)
            .finish()
    }
}

impl Drop for EventManager {
    fn drop(&mut self) {
        if self.workers.is_empty() {
            let handled = self.run_pending();
            if handled > 0 {
                debug!(handled, "processed events left queued in inline mode");
            }
        }
        {
            let mut state = lock(&self.shared.state);
            state.shutdown = true;
            state.paused = false;
        }
        self.shared.work_ready.notify_all();
        self.shared.space_ready.notify_all();

        // The last handle may be released by a handler running on a worker.
        let current = thread::current().id();
        for handle in self.workers.drain(..) {
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                error!("event worker terminated abnormally");
            }
        }
        debug!("event manager shut down");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn single_worker() -> EventConfig {
        EventConfig {
            workers: 1,
            ..Default::default()
        }
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let events = EventManager::new(single_worker());
        let log = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let log = Arc::clone(&log);
            events.register_handler("order", move |_| log.lock().unwrap().push(tag));
        }

        events.dispatch(Event::new("order", 0)).unwrap();
        events.wait();
        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn duplicate_registration_runs_twice() {
        let events = EventManager::new(single_worker());
        let hits = Arc::new(AtomicUsize::new(0));
        let handler = {
            let hits = Arc::clone(&hits);
            move |_: &Event| {
                hits.fetch_add(1, Ordering::SeqCst);
            }
        };
        events.register_handler("dup", handler.clone());
        events.register_handler("dup", handler);
        assert_eq!(events.handler_count(&EventType::new("dup")), 2);

        events.dispatch(Event::new("dup", 0)).unwrap();
        events.wait();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn events_without_handlers_still_complete() {
        let events = EventManager::new(single_worker());
        events.dispatch(Event::new("nobody-listens", 0)).unwrap();
        events.wait();
        assert_eq!(events.completed(), 1);
        assert_eq!(events.pending(), 0);
    }

    #[test]
    fn only_matching_type_is_invoked() {
        let events = EventManager::new(single_worker());
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        events.register_handler(EventType::PLAYER_JUMP, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        events.dispatch(Event::new(EventType::PLAYER_MOVE, 0)).unwrap();
        events.dispatch(Event::new(EventType::PLAYER_JUMP, 0)).unwrap();
        events.wait();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn paused_manager_orders_by_priority() {
        let events = EventManager::new(single_worker());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        events.register_handler("p", move |e| s.lock().unwrap().push(e.priority));

        events.pause();
        for p in [1, 5, 3] {
            events.dispatch(Event::new("p", p)).unwrap();
        }
        assert_eq!(events.pending(), 3);
        events.resume();
        events.wait();

        assert_eq!(*seen.lock().unwrap(), vec![5, 3, 1]);
    }

    #[test]
    fn inline_mode_processes_on_wait() {
        let events = EventManager::new(EventConfig {
            workers: 0,
            ..Default::default()
        });
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        events.register_handler("inline", move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        events.dispatch(Event::new("inline", 0)).unwrap();
        events.dispatch(Event::new("inline", 0)).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(events.pending(), 2);

        events.wait();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(events.worker_count(), 0);
    }

    #[test]
    fn bounded_queue_rejects_overflow() {
        let events = EventManager::new(EventConfig {
            workers: 0,
            queue_capacity: Some(2),
            overflow: OverflowPolicy::Reject,
        });
        events.dispatch(Event::new("x", 0)).unwrap();
        events.dispatch(Event::new("x", 0)).unwrap();
        let err = events.dispatch(Event::new("x", 0)).unwrap_err();
        assert_eq!(
            err,
            EventError::QueueFull {
                capacity: 2,
                event_type: "x".to_owned(),
            }
        );
        assert_eq!(events.dispatched(), 2);
        events.wait();
        assert_eq!(events.completed(), 2);
    }

    #[test]
    fn bounded_queue_blocks_until_room() {
        let events = Arc::new(EventManager::new(EventConfig {
            workers: 1,
            queue_capacity: Some(1),
            overflow: OverflowPolicy::Block,
        }));
        events.pause();
        events.dispatch(Event::new("x", 0)).unwrap();

        let producer = {
            let events = Arc::clone(&events);
            thread::spawn(move || events.dispatch(Event::new("x", 0)))
        };
        thread::sleep(Duration::from_millis(20));
        assert_eq!(events.dispatched(), 1, "second dispatch should be blocked");

        events.resume();
        producer.join().unwrap().unwrap();
        events.wait();
        assert_eq!(events.completed(), 2);
    }

    #[test]
    fn panicking_handler_does_not_hang_wait() {
        let events = EventManager::new(single_worker());
        let after = Arc::new(AtomicUsize::new(0));
        events.register_handler("boom", |_| panic!("handler failure"));
        let a = Arc::clone(&after);
        events.register_handler("boom", move |_| {
            a.fetch_add(1, Ordering::SeqCst);
        });

        events.dispatch(Event::new("boom", 0)).unwrap();
        events.dispatch(Event::new("boom", 0)).unwrap();
        events.wait();

        assert_eq!(events.completed(), 2);
        assert_eq!(after.load(Ordering::SeqCst), 2, "later handlers still run");
    }

    #[test]
    fn handler_may_dispatch_follow_up() {
        let events = Arc::new(EventManager::new(single_worker()));
        let hits = Arc::new(AtomicUsize::new(0));

        let weak = Arc::downgrade(&events);
        events.register_handler("first", move |_| {
            if let Some(events) = weak.upgrade() {
                events.dispatch(Event::new("second", 0)).unwrap();
            }
        });
        let h = Arc::clone(&hits);
        events.register_handler("second", move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        events.dispatch(Event::new("first", 0)).unwrap();
        // The follow-up is dispatched before the first unit completes, so a
        // single wait covers both.
        events.wait();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(events.dispatched(), 2);
    }

    #[test]
    fn drop_drains_queued_events() {
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let events = EventManager::new(single_worker());
            let h = Arc::clone(&hits);
            events.register_handler("late", move |_| {
                h.fetch_add(1, Ordering::SeqCst);
            });
            events.pause();
            for _ in 0..5 {
                events.dispatch(Event::new("late", 0)).unwrap();
            }
        }
        assert_eq!(hits.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn inline_drop_runs_queued_handlers() {
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let events = EventManager::new(EventConfig {
                workers: 0,
                ..Default::default()
            });
            let h = Arc::clone(&hits);
            events.register_handler("late", move |_| {
                h.fetch_add(1, Ordering::SeqCst);
            });
            for _ in 0..3 {
                events.dispatch(Event::new("late", 0)).unwrap();
            }
            assert_eq!(events.pending(), 3);
        }
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn wait_while_paused_handles_queue_on_caller() {
        let events = EventManager::new(single_worker());
        let caller = thread::current().id();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        events.register_handler("tick", move |_| {
            sink.lock().unwrap().push(thread::current().id());
        });

        events.pause();
        for _ in 0..4 {
            events.dispatch(Event::new("tick", 0)).unwrap();
        }
        events.wait();

        assert_eq!(events.pending(), 0);
        assert_eq!(events.completed(), events.dispatched());
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert!(seen.iter().all(|&id| id == caller));
    }

    #[test]
    fn default_config_is_unbounded() {
        let config = EventConfig::default();
        assert!(config.workers >= 1 && config.workers <= 4);
        assert_eq!(config.queue_capacity, None);
        assert_eq!(config.overflow, OverflowPolicy::Reject);
    }
}
