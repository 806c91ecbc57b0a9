//! Status event types published while a game runs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping all status events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique envelope ID
    pub id: Uuid,
    /// Emission order within one emitter
    pub sequence: u64,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: StatusEvent,
}

impl EventEnvelope {
    /// Create a new event envelope with auto-generated ID and timestamp
    pub fn new(event: StatusEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence: 0,
            timestamp: Utc::now(),
            event,
        }
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }
}

/// Whether a player is waiting on the reasoning service
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlayerActivity {
    Pending,
    Complete,
}

/// All status events emitted by the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusEvent {
    /// A remote call for a player started or finished
    #[serde(rename = "player.status")]
    PlayerStatus {
        game_id: Uuid,
        player: String,
        activity: PlayerActivity,
        /// What the call is for, e.g. "mafia_vote"
        label: String,
    },

    /// A step committed
    #[serde(rename = "game.snapshot")]
    StateSnapshot {
        game_id: Uuid,
        phase: String,
        day: u32,
        step: String,
        step_index: usize,
        alive: Vec<String>,
        event_count: usize,
    },

    /// An event was appended to the game log
    #[serde(rename = "game.event_logged")]
    EventLogged {
        game_id: Uuid,
        event_id: u64,
        kind: String,
        player: Option<String>,
        message: String,
        public: bool,
    },

    /// Discussion scheduler state after a poll round
    #[serde(rename = "discussion.status")]
    DiscussionStatus {
        game_id: Uuid,
        message_count: usize,
        max_messages: usize,
        queue: Vec<String>,
        passed: Vec<String>,
        selected: Option<String>,
    },

    /// The game was suspended and rolled back to `step`
    #[serde(rename = "game.paused")]
    Paused { game_id: Uuid, step: String },

    /// The game reached a winner
    #[serde(rename = "game.over")]
    GameOver { game_id: Uuid, winner: String },

    /// General error
    #[serde(rename = "error")]
    Error {
        message: String,
        context: Option<String>,
    },
}

impl StatusEvent {
    /// Get the game ID associated with this event, if any
    pub fn game_id(&self) -> Option<Uuid> {
        match self {
            StatusEvent::PlayerStatus { game_id, .. } => Some(*game_id),
            StatusEvent::StateSnapshot { game_id, .. } => Some(*game_id),
            StatusEvent::EventLogged { game_id, .. } => Some(*game_id),
            StatusEvent::DiscussionStatus { game_id, .. } => Some(*game_id),
            StatusEvent::Paused { game_id, .. } => Some(*game_id),
            StatusEvent::GameOver { game_id, .. } => Some(*game_id),
            StatusEvent::Error { .. } => None,
        }
    }
}
