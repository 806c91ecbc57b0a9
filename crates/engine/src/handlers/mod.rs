//! Step handlers.
//!
//! Each handler runs exactly one atomic unit of the game against a
//! [`StepContext`] and returns where to go next. [`run`] is the only
//! dispatch point.

mod day;
mod night;
mod postgame;

use llm::{Completion, CompletionRequest};
use mafia_core::Player;
use rand::rngs::StdRng;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::agent::AgentCaller;
use crate::config::RunnerConfig;
use crate::coordinator::run_parallel;
use crate::error::{EngineError, Result};
use crate::parsing::parse_text;
use crate::phase_data::{DayData, NightData};
use crate::prompts::{text_schema, GamePrompts, ACTION_TEMPERATURE};
use crate::routing::Next;
use crate::state::GameState;
use crate::steps::Step;

/// Everything a handler may touch while running one step.
pub struct StepContext<'a> {
    pub state: &'a mut GameState,
    pub agents: &'a AgentCaller,
    pub config: &'a RunnerConfig,
    pub rng: &'a mut StdRng,
    pub cancel: &'a CancellationToken,
}

impl StepContext<'_> {
    /// A request carrying `player`'s prompt for one decision.
    pub fn request(&self, player: &Player, label: &str, instruction: &str) -> CompletionRequest {
        CompletionRequest::new(
            player.model.clone(),
            GamePrompts::messages(self.state, player, self.config.transcript_limit, instruction),
        )
        .with_max_tokens(self.config.max_tokens)
        .with_label(label)
    }

    pub async fn ask(&self, player: &str, request: CompletionRequest) -> Result<Option<Completion>> {
        self.agents.ask(player, request, self.cancel).await
    }

    /// Fan out independent decisions. Answers come back in request order.
    pub async fn ask_all(
        &self,
        requests: Vec<(String, CompletionRequest)>,
    ) -> Result<Vec<(String, Option<Completion>)>> {
        let agents = self.agents;
        let cancel = self.cancel;

        let mut answers = run_parallel(
            requests.into_iter().enumerate().collect(),
            cancel,
            self.config.max_concurrency,
            |(order, (player, request))| async move {
                let completion = agents.ask(&player, request, cancel).await?;
                Ok((order, player, completion))
            },
        )
        .await?;

        answers.sort_by_key(|(order, _, _)| *order);
        Ok(answers
            .into_iter()
            .map(|(_, player, completion)| (player, completion))
            .collect())
    }

    pub fn night_mut(&mut self, step: Step) -> Result<&mut NightData> {
        self.state
            .phase_data
            .night_mut()
            .ok_or_else(|| EngineError::invariant(step, "night data missing"))
    }

    pub fn day_mut(&mut self, step: Step) -> Result<&mut DayData> {
        self.state
            .phase_data
            .day_mut()
            .ok_or_else(|| EngineError::invariant(step, "day data missing"))
    }
}

/// Private strategy notes for each of `players`, written in parallel.
async fn write_scratchpads(ctx: &mut StepContext<'_>, players: Vec<String>, timing: &str) -> Result<()> {
    let instruction = GamePrompts::scratchpad(timing);
    let max_chars = ctx.state.rules.role_discussion_max_chars;

    let requests = players
        .iter()
        .filter_map(|name| ctx.state.player(name))
        .map(|player| {
            let request = ctx
                .request(player, "scratchpad", &instruction)
                .with_schema("scratchpad", text_schema("notes", max_chars))
                .with_temperature(ACTION_TEMPERATURE);
            (player.name.clone(), request)
        })
        .collect();

    let answers = ctx.ask_all(requests).await?;
    for (name, completion) in answers {
        if let Some(notes) = parse_text(completion.as_ref(), "notes", max_chars) {
            if let Some(player) = ctx.state.player_mut(&name) {
                player.notes.push(notes);
            }
        }
    }

    debug!(timing = %timing, players = players.len(), "Scratchpads written");
    Ok(())
}

/// Run `step` at `index`.
pub async fn run(step: Step, index: usize, ctx: &mut StepContext<'_>) -> Result<Next> {
    use Step::*;

    match step {
        NightStart => night::night_start(ctx),
        ScratchpadNightStart => night::scratchpad(ctx).await,
        MafiaDiscussion => night::mafia_discussion(ctx, index).await,
        MafiaVote => night::mafia_vote(ctx).await,
        EscortDiscuss | DoctorDiscuss | SheriffDiscuss | TrackerDiscuss | VigilanteDiscuss => {
            night::role_discuss(ctx, step, index).await
        }
        EscortAct | DoctorAct | SheriffAct | TrackerAct | VigilanteAct => {
            night::role_act(ctx, step, index).await
        }
        NightResolve => night::night_resolve(ctx),
        DayStart => day::day_start(ctx),
        ScratchpadDayStart => day::scratchpad_day_start(ctx).await,
        IntroductionMessage => day::introduction_message(ctx, index).await,
        DiscussionPoll => day::discussion_poll(ctx).await,
        DiscussionMessage => day::discussion_message(ctx).await,
        ScratchpadPreVote => day::scratchpad_pre_vote(ctx).await,
        Voting => day::voting(ctx).await,
        VotingResolve => day::voting_resolve(ctx),
        PostgameReveal => postgame::postgame_reveal(ctx),
        PostgameDiscussion => postgame::postgame_discussion(ctx, index).await,
        MvpVoting => postgame::mvp_voting(ctx).await,
        GameEnd => postgame::game_end(ctx),
    }
}

/// Move to the next index of an indexed step, or on once `index` was last.
fn next_index(index: usize, len: usize) -> Next {
    if index + 1 < len {
        Next::Repeat(index + 1)
    } else {
        Next::Follow
    }
}
