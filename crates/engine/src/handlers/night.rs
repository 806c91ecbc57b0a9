use mafia_core::{Audience, EventDraft, EventKind, Phase, Role, RoleKind, MAFIA_GROUP};
use serde_json::json;
use tracing::{debug, info};

use super::{next_index, write_scratchpads, StepContext};
use crate::error::{EngineError, Result};
use crate::parsing::{parse_target, parse_text};
use crate::phase_data::{Ballot, NightData, PhaseData};
use crate::prompts::{target_schema, text_schema, GamePrompts, ACTION_TEMPERATURE, DISCUSSION_TEMPERATURE};
use crate::resolver::{mafia_bloc_target, resolve_night, ActionKind, KillSource, NightAction, Outcome};
use crate::routing::{role_actors, Next};
use crate::steps::Step;
use crate::win::check_winner;

pub(super) fn night_start(ctx: &mut StepContext<'_>) -> Result<Next> {
    let armed: Vec<String> = ctx
        .state
        .players
        .iter()
        .filter(|p| p.alive && matches!(p.role, Role::Vigilante { bullet_used: false }))
        .map(|p| p.name.clone())
        .collect();

    ctx.state.phase = Phase::Night;
    ctx.state.phase_data = PhaseData::Night(NightData {
        armed_vigilantes: Some(armed),
        ..Default::default()
    });

    let night = ctx.state.night_number();
    ctx.state
        .announce(EventKind::PhaseChange, format!("Night {} begins.", night))?;
    ctx.state
        .tell(MAFIA_GROUP, EventKind::System, "Mafia night actions begin.")?;

    info!(game_id = %ctx.state.game_id, night = night, "Night started");
    Ok(Next::Follow)
}

pub(super) async fn scratchpad(ctx: &mut StepContext<'_>) -> Result<Next> {
    let players = ctx
        .state
        .players
        .iter()
        .filter(|p| p.alive && p.kind().has_night_action())
        .map(|p| p.name.clone())
        .collect();

    write_scratchpads(ctx, players, "start of night").await?;
    Ok(Next::Follow)
}

pub(super) async fn mafia_discussion(ctx: &mut StepContext<'_>, index: usize) -> Result<Next> {
    let mafia = ctx.state.mafia_alive();
    let Some(name) = mafia.get(index).cloned() else {
        return Ok(Next::Follow);
    };

    if index == 0 {
        ctx.state
            .tell(MAFIA_GROUP, EventKind::System, "Mafia discussion begins.")?;
    }

    let max_chars = ctx.state.rules.discussion_max_chars;
    let request = {
        let player = ctx
            .state
            .player(&name)
            .ok_or_else(|| EngineError::invariant(Step::MafiaDiscussion, "speaker missing"))?;
        ctx.request(
            player,
            "mafia_discussion",
            &GamePrompts::mafia_discussion(ctx.state.night_number()),
        )
        .with_schema("mafia_discussion", text_schema("message", max_chars))
        .with_temperature(DISCUSSION_TEMPERATURE)
    };

    let completion = ctx.ask(&name, request).await?;
    if let Some(message) = parse_text(completion.as_ref(), "message", max_chars) {
        ctx.state.speak(
            &name,
            EventKind::MafiaChat,
            Audience::named(MAFIA_GROUP),
            format!("[Mafia Discussion] {}: {}", name, message),
        )?;
        ctx.night_mut(Step::MafiaDiscussion)?
            .mafia_messages
            .push((name, message));
    }

    Ok(next_index(index, mafia.len()))
}

pub(super) async fn mafia_vote(ctx: &mut StepContext<'_>) -> Result<Next> {
    let mafia = ctx.state.mafia_alive();
    let options: Vec<String> = ctx
        .state
        .players
        .iter()
        .filter(|p| p.alive && !p.is_mafia())
        .map(|p| p.name.clone())
        .collect();
    let instruction = GamePrompts::mafia_vote(&options);

    let requests = mafia
        .iter()
        .filter_map(|name| ctx.state.player(name))
        .map(|player| {
            let request = ctx
                .request(player, "mafia_vote", &instruction)
                .with_schema("mafia_vote", target_schema(&options, true))
                .with_temperature(ACTION_TEMPERATURE);
            (player.name.clone(), request)
        })
        .collect();

    let answers = ctx.ask_all(requests).await?;
    let ballots: Vec<Ballot> = answers
        .into_iter()
        .map(|(voter, completion)| {
            let (target, reason) = parse_target(completion.as_ref(), &voter, &options);
            Ballot::new(voter, target, reason)
        })
        .collect();

    for ballot in &ballots {
        let message = match &ballot.target {
            Some(target) => format!("{} votes to kill {}.", ballot.voter, target),
            None => format!("{} abstains from the kill vote.", ballot.voter),
        };
        ctx.state.log_event(
            EventDraft::new(EventKind::MafiaChat, message)
                .with_player(ballot.voter.clone())
                .with_audience(Audience::named(MAFIA_GROUP))
                .with_priority(7),
        )?;
    }

    let target = mafia_bloc_target(ballots.iter().map(|b| b.target.as_deref()));
    let shooter = target.as_ref().and_then(|t| {
        ballots
            .iter()
            .find(|b| b.target.as_ref() == Some(t))
            .map(|b| b.voter.clone())
    });

    match (&target, shooter) {
        (Some(target), Some(shooter)) => {
            ctx.state.tell(
                MAFIA_GROUP,
                EventKind::System,
                format!("Mafia has chosen to kill {}.", target),
            )?;
            ctx.night_mut(Step::MafiaVote)?.actions.push(NightAction::kill(
                shooter,
                Some(target.clone()),
                KillSource::Mafia,
            ));
        }
        _ => {
            ctx.state.tell(
                MAFIA_GROUP,
                EventKind::System,
                "The mafia could not agree on a target. No kill tonight.",
            )?;
        }
    }
    ctx.state
        .tell(MAFIA_GROUP, EventKind::System, "Mafia night actions end.")?;

    debug!(target = ?target, votes = ballots.len(), "Mafia vote tallied");

    let night = ctx.night_mut(Step::MafiaVote)?;
    night.mafia_votes = ballots;
    night.mafia_target = target;
    Ok(Next::Follow)
}

fn role_of(step: Step) -> Result<RoleKind> {
    step.night_role()
        .ok_or_else(|| EngineError::invariant(step, "not a night role step"))
}

pub(super) async fn role_discuss(ctx: &mut StepContext<'_>, step: Step, index: usize) -> Result<Next> {
    let kind = role_of(step)?;
    let actors = role_actors(ctx.state, kind);
    let Some(name) = actors.get(index).cloned() else {
        return Ok(Next::Follow);
    };

    let max_chars = ctx.state.rules.role_discussion_max_chars;
    let request = {
        let player = ctx
            .state
            .player(&name)
            .ok_or_else(|| EngineError::invariant(step, "actor missing"))?;
        ctx.request(player, step.as_str(), &GamePrompts::role_discussion(kind.display_name()))
            .with_schema("role_discussion", text_schema("thoughts", max_chars))
            .with_temperature(DISCUSSION_TEMPERATURE)
    };

    let completion = ctx.ask(&name, request).await?;
    if let Some(thoughts) = parse_text(completion.as_ref(), "thoughts", max_chars) {
        ctx.state.log_event(
            EventDraft::new(
                EventKind::RoleAction,
                format!("[{} Discussion] {}: {}", kind.display_name(), name, thoughts),
            )
            .with_player(name.clone())
            .private_to(name.clone()),
        )?;
        ctx.night_mut(step)?.deliberations.insert(name, thoughts);
    }

    Ok(next_index(index, actors.len()))
}

/// Legal targets for `actor`'s night action, and whether abstaining is an
/// explicit option.
fn action_options(ctx: &StepContext<'_>, kind: RoleKind, actor: &str) -> (Vec<String>, bool) {
    let rules = &ctx.state.rules;
    let last_protected = match ctx.state.player(actor).map(|p| &p.role) {
        Some(Role::Doctor { last_protected }) => last_protected.clone(),
        _ => None,
    };

    let options = ctx
        .state
        .players
        .iter()
        .filter(|p| p.alive)
        .filter(|p| match kind {
            RoleKind::Doctor => {
                (p.name != actor || rules.doctor_can_self_protect)
                    && (rules.doctor_repeat_protect || last_protected.as_deref() != Some(p.name.as_str()))
            }
            _ => p.name != actor,
        })
        .map(|p| p.name.clone())
        .collect();

    (options, kind == RoleKind::Vigilante)
}

fn action_kind(kind: RoleKind) -> Option<(ActionKind, &'static str)> {
    match kind {
        RoleKind::Escort => Some((ActionKind::Block, "block")),
        RoleKind::Doctor => Some((ActionKind::Protect, "protect")),
        RoleKind::Sheriff => Some((ActionKind::Investigate, "investigate")),
        RoleKind::Tracker => Some((ActionKind::Track, "track")),
        RoleKind::Vigilante => Some((ActionKind::Kill, "shoot")),
        _ => None,
    }
}

pub(super) async fn role_act(ctx: &mut StepContext<'_>, step: Step, index: usize) -> Result<Next> {
    let kind = role_of(step)?;
    let (action, verb) =
        action_kind(kind).ok_or_else(|| EngineError::invariant(step, "role has no night action"))?;
    let actors = role_actors(ctx.state, kind);
    let Some(name) = actors.get(index).cloned() else {
        return Ok(Next::Follow);
    };

    let (options, may_abstain) = action_options(ctx, kind, &name);
    let request = {
        let player = ctx
            .state
            .player(&name)
            .ok_or_else(|| EngineError::invariant(step, "actor missing"))?;
        ctx.request(player, step.as_str(), &GamePrompts::role_action(verb, &options, may_abstain))
            .with_schema("night_action", target_schema(&options, may_abstain))
            .with_temperature(ACTION_TEMPERATURE)
    };

    let completion = ctx.ask(&name, request).await?;
    let (target, _) = parse_target(completion.as_ref(), &name, &options);

    // Role state that changes as soon as the choice is made.
    if let Some(player) = ctx.state.player_mut(&name) {
        match &mut player.role {
            Role::Doctor { last_protected } => *last_protected = target.clone(),
            Role::Vigilante { bullet_used } if target.is_some() => *bullet_used = true,
            Role::Escort { blocked } => blocked.extend(target.clone()),
            _ => {}
        }
    }

    let confirmation = match (&target, kind) {
        (Some(t), RoleKind::Vigilante) => format!("Vigilante {} shoots {} tonight.", name, t),
        (None, RoleKind::Vigilante) => format!("{} chooses not to shoot tonight.", name),
        (Some(t), _) => format!("{} {} will {} {} tonight.", kind.display_name(), name, verb, t),
        (None, _) => format!("{} {} takes no action tonight.", kind.display_name(), name),
    };
    ctx.state.tell(&name, EventKind::RoleAction, confirmation)?;

    if target.is_some() {
        let declared = if action == ActionKind::Kill {
            NightAction::kill(name.clone(), target.clone(), KillSource::Vigilante)
        } else {
            NightAction::new(name.clone(), action, target.clone())
        };
        ctx.night_mut(step)?.actions.push(declared);
    }

    debug!(actor = %name, role = %kind.as_str(), target = ?target, "Night action declared");
    Ok(next_index(index, actors.len()))
}

pub(super) fn night_resolve(ctx: &mut StepContext<'_>) -> Result<Next> {
    let actions = ctx.night_mut(Step::NightResolve)?.actions.clone();
    let outcome = resolve_night(&actions, &ctx.state.players);

    for (actor, investigation) in &outcome.investigations {
        ctx.state.tell(
            actor,
            EventKind::RoleAction,
            format!(
                "{} is {}!",
                investigation.target,
                investigation.faction.as_str().to_uppercase()
            ),
        )?;
        if let Some(player) = ctx.state.player_mut(actor) {
            if let Role::Sheriff { investigations } = &mut player.role {
                investigations.push(investigation.clone());
            }
        }
    }

    for (actor, track) in &outcome.tracks {
        let message = match &track.visited {
            Some(visited) => format!("{} visited {} last night.", track.target, visited),
            None => format!("{} did not visit anyone last night.", track.target),
        };
        ctx.state.tell(actor, EventKind::RoleAction, message)?;
        if let Some(player) = ctx.state.player_mut(actor) {
            if let Role::Tracker { results } = &mut player.role {
                results.push(track.clone());
            }
        }
    }

    for result in outcome.results.iter().filter(|r| r.outcome == Outcome::Blocked) {
        ctx.state.tell(
            &result.actor,
            EventKind::RoleAction,
            "You were roleblocked last night. Your action failed.",
        )?;
    }

    ctx.state.announce(
        EventKind::PhaseChange,
        format!("Night {} ends.", ctx.state.night_number()),
    )?;

    for (name, source) in &outcome.deaths {
        if let Some(player) = ctx.state.player_mut(name) {
            player.kill();
        }
        let reason = match source {
            KillSource::Mafia => "mafia_kill",
            KillSource::Vigilante => "vigilante_kill",
        };
        ctx.state.log_event(
            EventDraft::new(
                EventKind::Death,
                format!("{} has been found dead, killed during the night!", name),
            )
            .with_player(name.clone())
            .with_metadata(json!({ "reason": reason })),
        )?;
    }
    if outcome.deaths.is_empty() {
        ctx.state
            .announce(EventKind::System, "No one died during the night.")?;
    }

    info!(
        game_id = %ctx.state.game_id,
        night = ctx.state.night_number(),
        deaths = outcome.deaths.len(),
        actions = actions.len(),
        "Night resolved"
    );

    match check_winner(ctx.state.team_counts()) {
        Some(winner) => {
            ctx.state.winner = Some(winner);
            Ok(Next::Jump(Step::PostgameReveal))
        }
        None => Ok(Next::Follow),
    }
}
