//! Sequenced, fire-and-forget status emitter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use uuid::Uuid;

use crate::bus::EventBus;
use crate::types::{EventEnvelope, PlayerActivity, StatusEvent};

/// Stamps every status event of one game with a monotonically increasing
/// sequence number before handing it to the bus.
///
/// Clones share the counter, so concurrent units of a fan-out emit into a
/// single ordered stream.
#[derive(Clone, Debug)]
pub struct StatusEmitter {
    bus: EventBus,
    game_id: Uuid,
    sequence: Arc<AtomicU64>,
}

impl StatusEmitter {
    pub fn new(bus: EventBus, game_id: Uuid) -> Self {
        Self {
            bus,
            game_id,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// An emitter whose events nobody observes.
    pub fn detached(game_id: Uuid) -> Self {
        Self::new(EventBus::new(), game_id)
    }

    pub fn emit(&self, event: StatusEvent) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        self.bus.publish(EventEnvelope::new(event).with_sequence(seq));
    }

    pub fn player_status(&self, player: &str, activity: PlayerActivity, label: &str) {
        self.emit(StatusEvent::PlayerStatus {
            game_id: self.game_id,
            player: player.to_string(),
            activity,
            label: label.to_string(),
        });
    }

    pub fn game_id(&self) -> Uuid {
        self.game_id
    }

    pub fn current_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }
}
