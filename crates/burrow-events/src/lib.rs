//! Burrow Events -- priority-ordered publish/subscribe bus.
//!
//! Gameplay systems talk to each other through the [`EventManager`] rather
//! than by holding references to one another. An [`Event`] carries a free-form
//! [`EventType`], an integer priority and an opaque [`Payload`]. Dispatching
//! pushes the event onto a shared max-heap; a persistent pool of worker
//! threads pops the most urgent pending event and hands it to every handler
//! registered for its type, in registration order.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! use burrow_events::prelude::*;
//!
//! let events = EventManager::new(EventConfig::default());
//! let seen = Arc::new(AtomicUsize::new(0));
//!
//! let counter = Arc::clone(&seen);
//! events.register_handler(EventType::PLAYER_JUMP, move |_event| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! events.dispatch(Event::new(EventType::PLAYER_JUMP, 1)).unwrap();
//! events.wait();
//! assert_eq!(seen.load(Ordering::SeqCst), 1);
//! ```

#![deny(unsafe_code)]

pub mod event;
pub mod manager;
pub mod queue;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by the event bus.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    /// A bounded queue rejected the event because it was full.
    #[error("event queue is full (capacity {capacity}); dropped event '{event_type}'")]
    QueueFull {
        capacity: usize,
        event_type: String,
    },

    /// The manager is shutting down and no longer accepts events.
    #[error("event manager is shut down")]
    ShutDown,
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::event::{Event, EventType, Payload};
    pub use crate::manager::{EventConfig, EventHandler, EventManager, OverflowPolicy};
    pub use crate::queue::EventQueue;
    pub use crate::EventError;
}
