//! Append-only event log.
//!
//! The log is the single source of truth for what happened in a game. Ids are
//! assigned on append and increase strictly in append order. Appends take
//! `&self` so concurrent units of a fan-out can log through a shared borrow.

use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::{Event, EventDraft, Phase};
use crate::error::{CoreError, Result};

#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<Event>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, Vec<Event>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append an event stamped with `phase` and `day`.
    ///
    /// Fails with [`CoreError::LogClosed`] once the game has ended.
    pub fn append(&self, phase: Phase, day: u32, draft: EventDraft) -> Result<Event> {
        if phase == Phase::Ended {
            return Err(CoreError::LogClosed);
        }

        let mut events = self.guard();
        let event = Event {
            id: events.len() as u64 + 1,
            kind: draft.kind,
            phase,
            day,
            message: draft.message,
            player: draft.player,
            audience: draft.audience,
            priority: draft.priority,
            metadata: draft.metadata,
        };
        events.push(event.clone());
        Ok(event)
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    pub fn snapshot(&self) -> Vec<Event> {
        self.guard().clone()
    }

    /// Events appended at or after position `from`.
    pub fn since(&self, from: usize) -> Vec<Event> {
        self.guard().iter().skip(from).cloned().collect()
    }

    /// Discard every event past `len`. Only checkpoint restore calls this.
    pub fn truncate(&self, len: usize) {
        self.guard().truncate(len);
    }
}

impl Clone for EventLog {
    fn clone(&self) -> Self {
        Self {
            events: Mutex::new(self.snapshot()),
        }
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog").field("len", &self.len()).finish()
    }
}

impl Serialize for EventLog {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.guard().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EventLog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let events = Vec::<Event>::deserialize(deserializer)?;
        Ok(Self {
            events: Mutex::new(events),
        })
    }
}
