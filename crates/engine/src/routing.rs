//! Where the step pointer goes after a step commits.
//!
//! Handlers only say *how* to move on; this module owns the static step
//! order and the rules for skipping steps that have nothing to do.

use mafia_core::{Role, RoleKind};

use crate::error::{EngineError, Result};
use crate::state::GameState;
use crate::steps::Step;

/// A handler's request for the next pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    /// Continue to the static successor.
    Follow,
    /// Run the same step again at another index.
    Repeat(usize),
    /// Jump to a specific step at index 0.
    Jump(Step),
}

/// The step after `step` in the fixed order, ignoring applicability.
pub fn successor(step: Step, state: &GameState) -> Step {
    use Step::*;

    match step {
        NightStart => ScratchpadNightStart,
        ScratchpadNightStart => MafiaDiscussion,
        MafiaDiscussion => MafiaVote,
        MafiaVote => first_role_step(state, 0),
        EscortDiscuss | DoctorDiscuss | SheriffDiscuss | TrackerDiscuss | VigilanteDiscuss => {
            step.night_role()
                .and_then(Step::role_steps)
                .map(|(_, act)| act)
                .unwrap_or(NightResolve)
        }
        EscortAct | DoctorAct | SheriffAct | TrackerAct | VigilanteAct => {
            let order = &state.rules.night_role_order;
            let position = step
                .night_role()
                .and_then(|kind| order.iter().position(|k| *k == kind));
            match position {
                Some(pos) => first_role_step(state, pos + 1),
                None => NightResolve,
            }
        }
        NightResolve => DayStart,
        DayStart => IntroductionMessage,
        IntroductionMessage => ScratchpadDayStart,
        ScratchpadDayStart => DiscussionPoll,
        DiscussionPoll => DiscussionMessage,
        DiscussionMessage => ScratchpadPreVote,
        ScratchpadPreVote => Voting,
        Voting => VotingResolve,
        VotingResolve => NightStart,
        PostgameReveal => PostgameDiscussion,
        PostgameDiscussion => MvpVoting,
        MvpVoting => GameEnd,
        GameEnd => GameEnd,
    }
}

fn first_role_step(state: &GameState, from: usize) -> Step {
    state
        .rules
        .night_role_order
        .iter()
        .skip(from)
        .find_map(|kind| Step::role_steps(*kind))
        .map(|(discuss, _)| discuss)
        .unwrap_or(Step::NightResolve)
}

pub fn is_round_robin_day(state: &GameState) -> bool {
    state.day == 1 && state.rules.day1_round_robin
}

pub fn is_no_lynch_day(state: &GameState) -> bool {
    state.day == 1 && state.rules.day1_no_lynch
}

/// Living players who act in a night role's discuss/act steps.
///
/// Vigilantes are taken from the list captured at night start, so firing
/// mid-night does not shift the step index.
pub fn role_actors(state: &GameState, kind: RoleKind) -> Vec<String> {
    let armed = state
        .phase_data
        .night()
        .and_then(|night| night.armed_vigilantes.as_ref());

    state
        .players
        .iter()
        .filter(|p| p.alive && p.kind() == kind)
        .filter(|p| match (&p.role, armed) {
            (Role::Vigilante { .. }, Some(list)) => list.contains(&p.name),
            (Role::Vigilante { bullet_used }, None) => !bullet_used,
            _ => true,
        })
        .map(|p| p.name.clone())
        .collect()
}

/// Whether `step` has anything to do in the current state.
pub fn applicable(step: Step, state: &GameState) -> bool {
    use Step::*;

    if let Some(kind) = step.night_role() {
        return !role_actors(state, kind).is_empty();
    }

    match step {
        ScratchpadNightStart => state
            .players
            .iter()
            .any(|p| p.alive && p.kind().has_night_action()),
        MafiaDiscussion | MafiaVote => !state.mafia_alive().is_empty(),
        IntroductionMessage => is_round_robin_day(state),
        ScratchpadDayStart | DiscussionPoll | DiscussionMessage => !is_round_robin_day(state),
        ScratchpadPreVote | Voting | VotingResolve => !is_no_lynch_day(state),
        _ => true,
    }
}

/// Resolve a handler's request into the next `(step, index)` pointer,
/// skipping steps with nothing to do.
pub fn settle(current: Step, next: Next, state: &GameState) -> Result<(Step, usize)> {
    let mut step = match next {
        Next::Repeat(index) => return Ok((current, index)),
        Next::Follow => successor(current, state),
        Next::Jump(step) => step,
    };

    for _ in 0..Step::ALL.len() {
        if applicable(step, state) {
            return Ok((step, 0));
        }
        step = successor(step, state);
    }

    Err(EngineError::invariant(current, "no applicable successor step"))
}
