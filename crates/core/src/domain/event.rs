use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::phase::Phase;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PhaseChange,
    Death,
    Discussion,
    Vote,
    VoteResult,
    MafiaChat,
    RoleAction,
    System,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PhaseChange => "phase_change",
            Self::Death => "death",
            Self::Discussion => "discussion",
            Self::Vote => "vote",
            Self::VoteResult => "vote_result",
            Self::MafiaChat => "mafia_chat",
            Self::RoleAction => "role_action",
            Self::System => "system",
        }
    }
}

/// Who may see an event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    #[default]
    All,
    Public,
    /// A visibility group name, or failing that a single player name.
    Named(String),
    Players(Vec<String>),
}

impl Audience {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Self::All | Self::Public)
    }
}

/// A single entry of the event log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub id: u64,
    pub kind: EventKind,
    pub phase: Phase,
    pub day: u32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<String>,
    pub audience: Audience,
    /// Speaker-declared urgency, 1 to 10.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Everything about an event except what the log assigns on append.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub kind: EventKind,
    pub message: String,
    pub player: Option<String>,
    pub audience: Audience,
    pub priority: Option<u8>,
    pub metadata: Option<Value>,
}

impl EventDraft {
    pub fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            player: None,
            audience: Audience::All,
            priority: None,
            metadata: None,
        }
    }

    pub fn system(message: impl Into<String>) -> Self {
        Self::new(EventKind::System, message)
    }

    pub fn with_player(mut self, player: impl Into<String>) -> Self {
        self.player = Some(player.into());
        self
    }

    pub fn with_audience(mut self, audience: Audience) -> Self {
        self.audience = audience;
        self
    }

    /// Restricts the event to one player (or group) by name.
    pub fn private_to(self, name: impl Into<String>) -> Self {
        self.with_audience(Audience::Named(name.into()))
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority.clamp(1, 10));
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
