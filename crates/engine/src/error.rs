use llm::LlmError;
use mafia_core::CoreError;
use thiserror::Error;

use crate::steps::Step;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The game was suspended; state is back at the last checkpoint.
    #[error("Game paused at step {step}")]
    Paused { step: Step },

    #[error("Reasoning service failed for {player}: {source}")]
    Service {
        player: String,
        #[source]
        source: LlmError,
    },

    #[error("Unknown step: {0}")]
    UnknownStep(String),

    #[error("Invariant violated at {step}: {reason}")]
    Invariant { step: Step, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    pub fn service(player: impl Into<String>, source: LlmError) -> Self {
        Self::Service {
            player: player.into(),
            source,
        }
    }

    pub fn invariant(step: Step, reason: impl Into<String>) -> Self {
        Self::Invariant {
            step,
            reason: reason.into(),
        }
    }

    /// Errors after which the runner restores the checkpoint and the game
    /// can continue later.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Paused { .. } | Self::Service { .. })
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
