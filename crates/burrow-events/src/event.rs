//! Event values carried by the bus.
//!
//! An [`Event`] is transient: it is created by whoever dispatches it, sits in
//! the priority queue for a while, and is consumed by exactly one processing
//! pass. The payload is type-erased so any subsystem can publish its own data
//! without the bus knowing about it.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// EventType
// ---------------------------------------------------------------------------

/// Identifies the kind of an event. Handlers subscribe per type.
///
/// The vocabulary is open: any string is a valid type. The associated
/// constants name the types the simulation core itself produces or that the
/// input layer is expected to publish.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventType(Cow<'static, str>);

impl EventType {
    /// A pickable body was collected; payload names the item.
    pub const ITEM_EQUIPPED: EventType = EventType(Cow::Borrowed("ItemEquipped"));
    /// An ability fired; payload names the ability and the user.
    pub const ABILITY_USED: EventType = EventType(Cow::Borrowed("AbilityUsed"));
    /// Input layer: jump requested.
    pub const PLAYER_JUMP: EventType = EventType(Cow::Borrowed("PlayerJump"));
    /// Input layer: horizontal movement requested.
    pub const PLAYER_MOVE: EventType = EventType(Cow::Borrowed("PlayerMove"));
    /// Input layer: a key is held.
    pub const KEY_PRESSED: EventType = EventType(Cow::Borrowed("KeyPressed"));
    /// Input layer: nothing is held this frame.
    pub const NO_KEY_PRESSED: EventType = EventType(Cow::Borrowed("NoKeyPressed"));
    /// Scene flow: switch to another scene.
    pub const SCENE_SWITCH: EventType = EventType(Cow::Borrowed("SceneSwitch"));

    /// Build a type from any string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// The type name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventType({:?})", self.as_str())
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for EventType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for EventType {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Opaque event data.
///
/// Cloning is cheap (reference counted). Consumers recover the concrete value
/// with [`Payload::downcast_ref`]; a consumer that finds a payload of the
/// wrong type should simply ignore the event.
#[derive(Clone, Default)]
pub struct Payload(Option<Arc<dyn Any + Send + Sync>>);

impl Payload {
    /// An empty payload.
    pub fn none() -> Self {
        Self(None)
    }

    /// Wrap a value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Some(Arc::new(value)))
    }

    /// Borrow the value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_deref().and_then(|v| v.downcast_ref::<T>())
    }

    /// `true` if no value is attached.
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("Payload(..)"),
            None => f.write_str("Payload(None)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// A single message on the bus.
#[derive(Debug, Clone)]
pub struct Event {
    /// Routing key; every handler registered for this type sees the event.
    pub event_type: EventType,
    /// Higher values are processed first.
    pub priority: i32,
    /// Opaque data for the handlers.
    pub payload: Payload,
}

impl Event {
    /// An event with no payload.
    pub fn new(event_type: impl Into<EventType>, priority: i32) -> Self {
        Self {
            event_type: event_type.into(),
            priority,
            payload: Payload::none(),
        }
    }

    /// Attach a payload value, replacing any previous one.
    pub fn with_payload<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.payload = Payload::new(value);
        self
    }

    /// Shorthand for `self.payload.downcast_ref::<T>()`.
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
