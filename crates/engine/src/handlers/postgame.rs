use events::StatusEvent;
use mafia_core::{Audience, EventDraft, EventKind, Phase};
use tracing::info;

use super::{next_index, StepContext};
use crate::error::{EngineError, Result};
use crate::parsing::{parse_target, parse_text};
use crate::phase_data::{Ballot, PhaseData, PostgameData};
use crate::prompts::{target_schema, text_schema, GamePrompts, ACTION_TEMPERATURE, SOCIAL_TEMPERATURE};
use crate::routing::Next;
use crate::steps::Step;
use crate::votes::{resolve_mvp, sanitize_mvp_votes};
use crate::win::Winner;

fn winner_label(ctx: &StepContext<'_>, winner: Winner) -> String {
    match (winner, &ctx.state.winning_jester) {
        (Winner::Jester, Some(name)) => format!("{} the Jester", name),
        (Winner::Jester, None) => "The Jester".to_string(),
        (Winner::Mafia, _) => "The Mafia".to_string(),
        (Winner::Town, _) => "The Town".to_string(),
    }
}

pub(super) fn postgame_reveal(ctx: &mut StepContext<'_>) -> Result<Next> {
    let winner = ctx
        .state
        .winner
        .ok_or_else(|| EngineError::invariant(Step::PostgameReveal, "postgame without a winner"))?;

    ctx.state.phase = Phase::Postgame;
    ctx.state.phase_data = PhaseData::Postgame(PostgameData::default());

    let label = winner_label(ctx, winner);
    ctx.state
        .announce(EventKind::PhaseChange, format!("Game over! {} wins!", label))?;

    let roles = ctx
        .state
        .players
        .iter()
        .map(|p| {
            let status = if p.alive { "alive" } else { "dead" };
            format!("{} was {} ({})", p.name, p.kind().display_name(), status)
        })
        .collect::<Vec<_>>()
        .join("; ");
    ctx.state
        .announce(EventKind::System, format!("Final roles: {}.", roles))?;

    ctx.agents.emitter().emit(StatusEvent::GameOver {
        game_id: ctx.state.game_id,
        winner: winner.as_str().to_string(),
    });

    info!(game_id = %ctx.state.game_id, winner = %winner.as_str(), day = ctx.state.day, "Game decided");
    Ok(Next::Follow)
}

pub(super) async fn postgame_discussion(ctx: &mut StepContext<'_>, index: usize) -> Result<Next> {
    let Some(name) = ctx.state.players.get(index).map(|p| p.name.clone()) else {
        return Ok(Next::Follow);
    };
    let total = ctx.state.players.len();

    let winner = ctx.state.winner.map(|w| winner_label(ctx, w)).unwrap_or_default();
    let max_chars = ctx.state.rules.discussion_max_chars;
    let request = {
        let player = ctx
            .state
            .player(&name)
            .ok_or_else(|| EngineError::invariant(Step::PostgameDiscussion, "speaker missing"))?;
        ctx.request(player, "postgame_discussion", &GamePrompts::postgame(&winner))
            .with_schema("postgame", text_schema("message", max_chars))
            .with_temperature(SOCIAL_TEMPERATURE)
    };

    let completion = ctx.ask(&name, request).await?;
    if let Some(message) = parse_text(completion.as_ref(), "message", max_chars) {
        ctx.state
            .speak(&name, EventKind::Discussion, Audience::Public, message.clone())?;
        if let Some(data) = ctx.state.phase_data.postgame_mut() {
            data.messages.push((name, message));
        }
    }

    Ok(next_index(index, total))
}

pub(super) async fn mvp_voting(ctx: &mut StepContext<'_>) -> Result<Next> {
    let everyone: Vec<String> = ctx.state.players.iter().map(|p| p.name.clone()).collect();

    let mut requests = Vec::new();
    for player in &ctx.state.players {
        let options: Vec<String> = everyone.iter().filter(|n| **n != player.name).cloned().collect();
        let request = ctx
            .request(player, "mvp_voting", &GamePrompts::mvp_vote(&options))
            .with_schema("mvp_vote", target_schema(&options, false))
            .with_temperature(ACTION_TEMPERATURE);
        requests.push((player.name.clone(), request));
    }

    let answers = ctx.ask_all(requests).await?;
    let ballots: Vec<Ballot> = answers
        .into_iter()
        .map(|(voter, completion)| {
            let (target, reason) = parse_target(completion.as_ref(), &voter, &everyone);
            Ballot::new(voter, target, reason)
        })
        .collect();
    let ballots = sanitize_mvp_votes(ballots, &everyone, ctx.rng);

    for ballot in &ballots {
        let Some(target) = &ballot.target else {
            continue;
        };
        let mut message = format!("I vote for {} as MVP.", target);
        if !ballot.reason.is_empty() {
            message = format!("{} {}", message, ballot.reason);
        }
        ctx.state.log_event(
            EventDraft::new(EventKind::Vote, message)
                .with_player(ballot.voter.clone())
                .with_audience(Audience::Public),
        )?;
    }

    let mvp = resolve_mvp(&ballots);
    match mvp.as_slice() {
        [] => ctx.state.announce(EventKind::VoteResult, "No MVP was chosen.")?,
        [single] => ctx
            .state
            .announce(EventKind::VoteResult, format!("MVP: {}!", single))?,
        several => ctx
            .state
            .announce(EventKind::VoteResult, format!("Co-MVPs: {}!", several.join(", ")))?,
    };

    if let Some(data) = ctx.state.phase_data.postgame_mut() {
        data.mvp_votes = ballots;
    }
    ctx.state.mvp = mvp;
    Ok(Next::Follow)
}

pub(super) fn game_end(ctx: &mut StepContext<'_>) -> Result<Next> {
    ctx.state
        .announce(EventKind::System, "The game has ended. Thanks for playing!")?;
    ctx.state.phase = Phase::Ended;
    ctx.state.game_over = true;

    info!(game_id = %ctx.state.game_id, events = ctx.state.log.len(), "Game ended");
    Ok(Next::Follow)
}
