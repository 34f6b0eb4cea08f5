//! Body handles and the arena that owns body storage.
//!
//! Bodies live in slots. A slot that is vacated (the body was picked up or
//! removed) bumps its generation, and a [`BodyHandle`] remembers the
//! generation it was issued with, so an old handle no longer resolves once
//! its slot is reused.

use std::collections::VecDeque;
use std::fmt;

/// A slot plus the generation it was issued under. Only a
/// [`PhysicsEngine`](crate::engine::PhysicsEngine) hands these out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle {
    slot: u32,
    generation: u32,
}

impl fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.slot, self.generation)
    }
}

// ---------------------------------------------------------------------------
// BodyArena
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot storage addressed by [`BodyHandle`].
///
/// Removing a body leaves every other slot in place, so handles collected
/// at the start of a tick stay usable while bodies are picked up mid-scan.
/// Freed slots are reused oldest first.
#[derive(Debug)]
pub struct BodyArena<T> {
    slots: Vec<Slot<T>>,
    free: VecDeque<u32>,
    len: usize,
}

impl<T> BodyArena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: VecDeque::new(),
            len: 0,
        }
    }

    /// Store a body and return its handle.
    pub fn insert(&mut self, value: T) -> BodyHandle {
        self.len += 1;
        let slot = match self.free.pop_front() {
            Some(slot) => slot,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    value: None,
                });
                (self.slots.len() - 1) as u32
            }
        };
        let entry = &mut self.slots[slot as usize];
        entry.value = Some(value);
        BodyHandle {
            slot,
            generation: entry.generation,
        }
    }

    /// Take the body out and retire `handle`. `None` if the handle is stale.
    pub fn remove(&mut self, handle: BodyHandle) -> Option<T> {
        let entry = self.live_slot_mut(handle)?;
        let value = entry.value.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push_back(handle.slot);
        self.len -= 1;
        Some(value)
    }

    pub fn get(&self, handle: BodyHandle) -> Option<&T> {
        self.slots
            .get(handle.slot as usize)
            .filter(|entry| entry.generation == handle.generation)
            .and_then(|entry| entry.value.as_ref())
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut T> {
        self.live_slot_mut(handle)?.value.as_mut()
    }

    fn live_slot_mut(&mut self, handle: BodyHandle) -> Option<&mut Slot<T>> {
        self.slots
            .get_mut(handle.slot as usize)
            .filter(|entry| entry.generation == handle.generation)
    }

    /// Number of live bodies.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T> Default for BodyArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
