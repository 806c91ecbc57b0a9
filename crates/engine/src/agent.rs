//! The single path from a player decision to the reasoning service.

use std::sync::Arc;

use events::{PlayerActivity, StatusEmitter};
use llm::{Completion, CompletionRequest, LlmError, ReasoningService};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::FailurePolicy;
use crate::error::{EngineError, Result};

/// Reports a player as pending while a call is in flight.
///
/// Emits `pending` on creation and `complete` on drop, so the presentation
/// layer sees the call end whether it succeeded, failed or was cancelled.
pub struct PendingGuard<'a> {
    emitter: &'a StatusEmitter,
    player: &'a str,
    label: &'a str,
}

impl<'a> PendingGuard<'a> {
    pub fn new(emitter: &'a StatusEmitter, player: &'a str, label: &'a str) -> Self {
        emitter.player_status(player, PlayerActivity::Pending, label);
        Self {
            emitter,
            player,
            label,
        }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.emitter
            .player_status(self.player, PlayerActivity::Complete, self.label);
    }
}

pub struct AgentCaller {
    service: Arc<dyn ReasoningService>,
    emitter: StatusEmitter,
    policy: FailurePolicy,
}

impl AgentCaller {
    pub fn new(service: Arc<dyn ReasoningService>, emitter: StatusEmitter, policy: FailurePolicy) -> Self {
        Self {
            service,
            emitter,
            policy,
        }
    }

    pub fn emitter(&self) -> &StatusEmitter {
        &self.emitter
    }

    /// Ask the service on behalf of `player`.
    ///
    /// `Ok(None)` means the call failed and the policy says to fall back to
    /// the decision's safe default. Cancellation always surfaces as an error.
    pub async fn ask(
        &self,
        player: &str,
        request: CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<Option<Completion>> {
        let label = request.label.clone();
        let _pending = PendingGuard::new(&self.emitter, player, &label);

        debug!(player = %player, label = %label, model = %request.model, "Requesting decision");

        match self.service.complete(request, cancel).await {
            Ok(completion) => Ok(Some(completion)),
            Err(LlmError::Cancelled) => Err(EngineError::service(player, LlmError::Cancelled)),
            Err(e) if self.policy == FailurePolicy::Abstain => {
                warn!(player = %player, label = %label, error = %e, "Decision failed, using default");
                Ok(None)
            }
            Err(e) => {
                warn!(player = %player, label = %label, error = %e, "Decision failed");
                Err(EngineError::service(player, e))
            }
        }
    }
}
