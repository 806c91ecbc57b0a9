use events::StatusEvent;
use mafia_core::{Audience, EventDraft, EventKind, Phase, RoleKind, Team};
use rand::seq::SliceRandom;
use serde_json::json;
use tracing::{debug, info};

use super::{next_index, write_scratchpads, StepContext};
use crate::error::{EngineError, Result};
use crate::parsing::{parse_poll, parse_priority, parse_target, parse_text};
use crate::phase_data::{Ballot, DayData, PhaseData};
use crate::prompts::{
    discussion_schema, poll_schema, target_schema, text_schema, GamePrompts, ACTION_TEMPERATURE,
    DISCUSSION_TEMPERATURE, POLL_TEMPERATURE, SOCIAL_TEMPERATURE,
};
use crate::routing::{is_round_robin_day, Next};
use crate::scheduler::{PollResponse, SelectionReason, TurnScheduler};
use crate::steps::Step;
use crate::votes::{resolve_lynch, LynchOutcome};
use crate::win::{check_winner, Winner};

pub(super) fn day_start(ctx: &mut StepContext<'_>) -> Result<Next> {
    ctx.state.day += 1;
    ctx.state.phase = Phase::Day;

    let mut order = ctx.state.alive_names();
    order.shuffle(ctx.rng);
    ctx.state.phase_data = PhaseData::Day(DayData {
        scheduler: TurnScheduler::new(order.clone(), ctx.state.rules.max_discussion_messages),
        introduction_order: order.clone(),
        ..Default::default()
    });

    let day = ctx.state.day;
    ctx.state
        .announce(EventKind::PhaseChange, format!("Day {} begins.", day))?;
    ctx.state.announce(
        EventKind::System,
        format!("Remaining players ({}): {}", order.len(), ctx.state.alive_names().join(", ")),
    )?;

    if is_round_robin_day(ctx.state) {
        ctx.state.announce(
            EventKind::System,
            "Introduction phase begins. Each player will introduce themselves.",
        )?;
    } else {
        ctx.state
            .announce(EventKind::System, format!("Day {} discussion phase begins.", day))?;
    }

    info!(game_id = %ctx.state.game_id, day = day, alive = order.len(), "Day started");
    Ok(Next::Follow)
}

pub(super) async fn scratchpad_day_start(ctx: &mut StepContext<'_>) -> Result<Next> {
    let players = ctx.state.alive_names();
    write_scratchpads(ctx, players, "start of day").await?;
    ctx.state
        .announce(EventKind::System, "Players wrote strategic notes.")?;
    Ok(Next::Follow)
}

pub(super) async fn scratchpad_pre_vote(ctx: &mut StepContext<'_>) -> Result<Next> {
    let players = ctx.state.alive_names();
    write_scratchpads(ctx, players, "before the vote").await?;
    Ok(Next::Follow)
}

pub(super) async fn introduction_message(ctx: &mut StepContext<'_>, index: usize) -> Result<Next> {
    let order = ctx.day_mut(Step::IntroductionMessage)?.introduction_order.clone();
    let Some(name) = order.get(index).cloned() else {
        return Ok(Next::Follow);
    };

    let alive = ctx.state.player(&name).is_some_and(|p| p.alive);
    if alive {
        let max_chars = ctx.state.rules.discussion_max_chars;
        let request = {
            let player = ctx
                .state
                .player(&name)
                .ok_or_else(|| EngineError::invariant(Step::IntroductionMessage, "speaker missing"))?;
            ctx.request(player, "introduction_message", &GamePrompts::introduction(ctx.state.day))
                .with_schema("introduction", text_schema("message", max_chars))
                .with_temperature(SOCIAL_TEMPERATURE)
        };

        let completion = ctx.ask(&name, request).await?;
        if let Some(message) = parse_text(completion.as_ref(), "message", max_chars) {
            ctx.state.log_event(
                EventDraft::new(EventKind::Discussion, message.clone())
                    .with_player(name.clone())
                    .with_audience(Audience::Public)
                    .with_metadata(json!({ "turn_type": "introduction" })),
            )?;
            ctx.day_mut(Step::IntroductionMessage)?
                .messages
                .push((name, message));
        }
    }

    let next = next_index(index, order.len());
    if next == Next::Follow {
        ctx.state
            .announce(EventKind::System, "Introduction phase complete.")?;
    }
    Ok(next)
}

fn discussion_over(ctx: &mut StepContext<'_>) -> Result<Next> {
    let day = ctx.state.day;
    ctx.state
        .announce(EventKind::System, format!("Day {} discussion phase ends.", day))?;
    Ok(Next::Jump(Step::ScratchpadPreVote))
}

pub(super) async fn discussion_poll(ctx: &mut StepContext<'_>) -> Result<Next> {
    let scheduler = ctx.day_mut(Step::DiscussionPoll)?.scheduler.clone();
    if scheduler.is_finished() {
        return discussion_over(ctx);
    }

    let eligible = scheduler.eligible(&ctx.state.alive_names());
    let instruction = GamePrompts::poll(scheduler.message_count(), scheduler.max_messages());
    let requests = eligible
        .iter()
        .filter_map(|name| ctx.state.player(name))
        .map(|player| {
            let request = ctx
                .request(player, "discussion_poll", &instruction)
                .with_schema("turn_poll", poll_schema())
                .with_temperature(POLL_TEMPERATURE);
            (player.name.clone(), request)
        })
        .collect();

    let answers = ctx.ask_all(requests).await?;
    let responses: Vec<PollResponse> = answers
        .iter()
        .map(|(name, completion)| parse_poll(completion.as_ref(), name))
        .collect();

    let game_id = ctx.state.game_id;
    let day = ctx.day_mut(Step::DiscussionPoll)?;
    let selection = day.scheduler.select(&eligible, &responses);
    day.pending_speaker = selection.clone();
    let status = StatusEvent::DiscussionStatus {
        game_id,
        message_count: day.scheduler.message_count(),
        max_messages: day.scheduler.max_messages(),
        queue: day.scheduler.queue(),
        passed: day.scheduler.passed(),
        selected: selection.as_ref().map(|s| s.speaker.clone()),
    };
    ctx.agents.emitter().emit(status);

    match selection {
        Some(selection) => {
            debug!(speaker = %selection.speaker, reason = ?selection.reason, "Speaker selected");
            Ok(Next::Follow)
        }
        None => discussion_over(ctx),
    }
}

pub(super) async fn discussion_message(ctx: &mut StepContext<'_>) -> Result<Next> {
    let selection = ctx
        .day_mut(Step::DiscussionMessage)?
        .pending_speaker
        .clone()
        .ok_or_else(|| EngineError::invariant(Step::DiscussionMessage, "no speaker selected"))?;
    let name = selection.speaker.clone();

    let max_chars = ctx.state.rules.discussion_max_chars;
    let request = {
        let player = ctx
            .state
            .player(&name)
            .ok_or_else(|| EngineError::invariant(Step::DiscussionMessage, "speaker missing"))?;
        ctx.request(player, "discussion_message", &GamePrompts::discussion(max_chars))
            .with_schema("discussion", discussion_schema(max_chars))
            .with_temperature(DISCUSSION_TEMPERATURE)
    };

    let completion = ctx.ask(&name, request).await?;
    let turn_type = match selection.reason {
        SelectionReason::Interrupt => "interrupt",
        SelectionReason::Respond => "respond",
        SelectionReason::Queue | SelectionReason::Forced => "turn",
    };

    match parse_text(completion.as_ref(), "message", max_chars) {
        Some(message) => {
            let mut draft = EventDraft::new(EventKind::Discussion, message.clone())
                .with_player(name.clone())
                .with_audience(Audience::Public)
                .with_metadata(json!({ "turn_type": turn_type }));
            if let Some(priority) = parse_priority(completion.as_ref()) {
                draft = draft.with_priority(priority);
            }
            ctx.state.log_event(draft)?;
            ctx.day_mut(Step::DiscussionMessage)?
                .messages
                .push((name.clone(), message));
        }
        None => {
            ctx.state.log_event(
                EventDraft::system(format!("{} failed to respond.", name))
                    .with_player(name.clone())
                    .with_audience(Audience::Public),
            )?;
        }
    }

    let day = ctx.day_mut(Step::DiscussionMessage)?;
    day.scheduler.record_message(&selection);
    day.pending_speaker = None;

    if day.scheduler.is_finished() {
        discussion_over(ctx)
    } else {
        Ok(Next::Jump(Step::DiscussionPoll))
    }
}

pub(super) async fn voting(ctx: &mut StepContext<'_>) -> Result<Next> {
    let alive = ctx.state.alive_names();

    let mut requests = Vec::new();
    for name in &alive {
        let Some(player) = ctx.state.player(name) else {
            continue;
        };
        let options: Vec<String> = alive.iter().filter(|n| *n != name).cloned().collect();
        let request = ctx
            .request(player, "voting", &GamePrompts::lynch_vote(&options))
            .with_schema("lynch_vote", target_schema(&options, true))
            .with_temperature(ACTION_TEMPERATURE);
        requests.push((name.clone(), request));
    }

    let answers = ctx.ask_all(requests).await?;
    let mut ballots = Vec::new();
    for (voter, completion) in answers {
        let options: Vec<String> = alive.iter().filter(|n| **n != voter).cloned().collect();
        let (target, reason) = parse_target(completion.as_ref(), &voter, &options);

        let mut message = match &target {
            Some(t) => format!("I vote to lynch {}.", t),
            None => "I abstain from voting.".to_string(),
        };
        if !reason.is_empty() {
            message = format!("{} {}", message, reason);
        }
        ctx.state.log_event(
            EventDraft::new(EventKind::Vote, message)
                .with_player(voter.clone())
                .with_audience(Audience::Public)
                .with_priority(8)
                .with_metadata(json!({ "target": target })),
        )?;
        ballots.push(Ballot::new(voter, target, reason));
    }

    debug!(ballots = ballots.len(), "Lynch votes collected");
    ctx.day_mut(Step::Voting)?.votes = ballots;
    Ok(Next::Follow)
}

pub(super) fn voting_resolve(ctx: &mut StepContext<'_>) -> Result<Next> {
    let votes = ctx.day_mut(Step::VotingResolve)?.votes.clone();
    let alive = ctx.state.alive_names().len();
    let outcome = resolve_lynch(&votes, alive, ctx.state.rules.require_majority);

    match &outcome {
        LynchOutcome::Eliminated { target, votes } => {
            let kind = match ctx.state.player_mut(target) {
                Some(player) => {
                    player.kill();
                    player.kind()
                }
                None => {
                    return Err(EngineError::invariant(
                        Step::VotingResolve,
                        format!("lynch target {} not in roster", target),
                    ))
                }
            };

            ctx.state.log_event(
                EventDraft::new(
                    EventKind::Death,
                    format!("{} has died. Lynched by vote ({} votes).", target, votes),
                )
                .with_player(target.clone())
                .with_metadata(json!({ "reason": "lynch", "votes": votes })),
            )?;

            if kind == RoleKind::Jester {
                ctx.state.announce(
                    EventKind::VoteResult,
                    format!("{} was the JESTER! {} wins!", target, target),
                )?;
                ctx.state.winner = Some(Winner::Jester);
                ctx.state.winning_jester = Some(target.clone());
                info!(game_id = %ctx.state.game_id, jester = %target, "Jester lynched");
                return Ok(Next::Jump(Step::PostgameReveal));
            }

            let faction = if kind.team() == Team::Mafia {
                "MAFIA"
            } else {
                "TOWN"
            };
            ctx.state
                .announce(EventKind::VoteResult, format!("{} was {}.", target, faction))?;
        }
        LynchOutcome::Tie { names } => {
            ctx.state.announce(
                EventKind::VoteResult,
                format!("Tie in voting between {}. No one was lynched.", names.join(", ")),
            )?;
        }
        LynchOutcome::AbstainWins { votes } => {
            ctx.state.announce(
                EventKind::VoteResult,
                format!("No one was lynched. Abstain received the most votes ({}).", votes),
            )?;
        }
        LynchOutcome::NoMajority { .. } => {
            ctx.state.announce(
                EventKind::VoteResult,
                "Nobody died, as no player received a majority of votes.",
            )?;
        }
        LynchOutcome::NoVotes => {
            ctx.state
                .announce(EventKind::VoteResult, "No votes were cast.")?;
        }
    }

    info!(game_id = %ctx.state.game_id, day = ctx.state.day, outcome = ?outcome, "Vote resolved");

    match check_winner(ctx.state.team_counts()) {
        Some(winner) => {
            ctx.state.winner = Some(winner);
            Ok(Next::Jump(Step::PostgameReveal))
        }
        None => Ok(Next::Follow),
    }
}
