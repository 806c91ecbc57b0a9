//! The step-based game loop.
//!
//! [`GameRunner::execute_one_step`] runs exactly one atomic unit: it reads the
//! step pointer, checkpoints if the step will call the reasoning service,
//! dispatches, and writes the pointer back. A pause (cancellation) or a
//! service failure restores the checkpoint, so re-running the same step
//! later starts from identical state.

use std::sync::Arc;

use events::{EventBus, StatusEmitter, StatusEvent};
use llm::{LlmError, ReasoningService};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::agent::AgentCaller;
use crate::checkpoint::Checkpoint;
use crate::config::RunnerConfig;
use crate::error::{EngineError, Result};
use crate::handlers::{self, StepContext};
use crate::routing;
use crate::state::GameState;
use crate::steps::Step;
use crate::win::Winner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Advanced { from: Step, to: Step },
    /// The game is over; nothing ran.
    Finished,
}

pub struct GameRunner {
    state: GameState,
    agents: AgentCaller,
    config: RunnerConfig,
    rng: StdRng,
    last_checkpoint: Option<Checkpoint>,
}

impl GameRunner {
    pub fn new(
        state: GameState,
        service: Arc<dyn ReasoningService>,
        bus: EventBus,
        config: RunnerConfig,
    ) -> Self {
        let emitter = StatusEmitter::new(bus, state.game_id);
        let agents = AgentCaller::new(service, emitter, config.failure_policy);
        Self {
            state,
            agents,
            config,
            rng: StdRng::from_os_rng(),
            last_checkpoint: None,
        }
    }

    /// Make shuffles and MVP fallbacks reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn into_state(self) -> GameState {
        self.state
    }

    /// The checkpoint taken before the most recent suspending step.
    pub fn last_checkpoint(&self) -> Option<&Checkpoint> {
        self.last_checkpoint.as_ref()
    }

    fn emitter(&self) -> &StatusEmitter {
        self.agents.emitter()
    }

    fn pause(&self, step: Step) -> EngineError {
        info!(game_id = %self.state.game_id, step = %step, "Game paused");
        self.emitter().emit(StatusEvent::Paused {
            game_id: self.state.game_id,
            step: step.as_str().to_string(),
        });
        EngineError::Paused { step }
    }

    /// Run exactly one step.
    pub async fn execute_one_step(&mut self, cancel: &CancellationToken) -> Result<StepOutcome> {
        if self.state.game_over {
            return Ok(StepOutcome::Finished);
        }

        let step = self.state.current_step;
        let index = self.state.step_index;
        if cancel.is_cancelled() {
            return Err(self.pause(step));
        }

        let checkpoint = step.is_suspending().then(|| Checkpoint::capture(&self.state));
        let log_start = self.state.log.len();
        debug!(game_id = %self.state.game_id, step = %step, index = index, "Executing step");

        let result = {
            let mut ctx = StepContext {
                state: &mut self.state,
                agents: &self.agents,
                config: &self.config,
                rng: &mut self.rng,
                cancel,
            };
            handlers::run(step, index, &mut ctx).await
        };
        let result = result.and_then(|next| routing::settle(step, next, &self.state));

        // A pause seen during a suspending step discards everything it did.
        if let Some(checkpoint) = &checkpoint {
            let paused = cancel.is_cancelled()
                || matches!(
                    &result,
                    Err(EngineError::Service {
                        source: LlmError::Cancelled,
                        ..
                    })
                );
            if paused {
                checkpoint.restore(&mut self.state);
                return Err(self.pause(step));
            }
            if let Err(e) = &result {
                if e.is_recoverable() {
                    warn!(game_id = %self.state.game_id, step = %step, error = %e, "Step failed, rolled back");
                    checkpoint.restore(&mut self.state);
                }
            }
        }

        let (to, next_index) = result?;
        self.state.current_step = to;
        self.state.step_index = next_index;
        if checkpoint.is_some() {
            self.last_checkpoint = checkpoint;
        }

        self.publish_since(log_start);
        debug!(from = %step, to = %to, index = next_index, "Step committed");
        Ok(StepOutcome::Advanced { from: step, to })
    }

    fn publish_since(&self, log_start: usize) {
        let game_id = self.state.game_id;
        for event in self.state.log.since(log_start) {
            let public = event.audience.is_public();
            self.emitter().emit(StatusEvent::EventLogged {
                game_id,
                event_id: event.id,
                kind: event.kind.as_str().to_string(),
                player: event.player,
                message: event.message,
                public,
            });
        }

        self.emitter().emit(StatusEvent::StateSnapshot {
            game_id,
            phase: self.state.phase.as_str().to_string(),
            day: self.state.day,
            step: self.state.current_step.as_str().to_string(),
            step_index: self.state.step_index,
            alive: self.state.alive_names(),
            event_count: self.state.log.len(),
        });
    }

    /// Drive the game until it ends, a pause is requested, or a step fails.
    pub async fn run_to_completion(&mut self, cancel: &CancellationToken) -> Result<Option<Winner>> {
        info!(game_id = %self.state.game_id, players = self.state.players.len(), "Running game");
        while let StepOutcome::Advanced { .. } = self.execute_one_step(cancel).await? {}
        Ok(self.state.winner)
    }
}
