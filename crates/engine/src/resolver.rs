//! Night-action resolution.
//!
//! All night actions are declared first and resolved together here, in fixed
//! stages: blocks, protections, visits, tracking, investigations, kills. The
//! resolver is pure: it reads the roster and returns what happened, and the
//! caller applies deaths and delivers private results.

use std::collections::BTreeSet;

use mafia_core::{Faction, Investigation, Player, Roster, TrackResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Block,
    Protect,
    Track,
    Investigate,
    Kill,
}

impl ActionKind {
    /// Lower resolves first.
    pub fn priority(&self) -> u8 {
        match self {
            Self::Block => 10,
            Self::Protect => 20,
            Self::Track => 30,
            Self::Investigate => 40,
            Self::Kill => 50,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Protect => "protect",
            Self::Track => "track",
            Self::Investigate => "investigate",
            Self::Kill => "kill",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KillSource {
    Mafia,
    Vigilante,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightAction {
    pub actor: String,
    /// `None` means the actor abstained.
    pub target: Option<String>,
    pub kind: ActionKind,
    pub priority: u8,
    pub is_visit: bool,
    #[serde(default)]
    pub blocked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<KillSource>,
}

impl NightAction {
    pub fn new(actor: impl Into<String>, kind: ActionKind, target: Option<String>) -> Self {
        Self {
            actor: actor.into(),
            target,
            kind,
            priority: kind.priority(),
            is_visit: true,
            blocked: false,
            source: None,
        }
    }

    pub fn kill(actor: impl Into<String>, target: Option<String>, source: KillSource) -> Self {
        let mut action = Self::new(actor, ActionKind::Kill, target);
        action.source = Some(source);
        action
    }

    fn live_target(&self) -> Option<&str> {
        if self.blocked {
            None
        } else {
            self.target.as_deref()
        }
    }
}

/// Why an action did or did not take effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Outcome {
    Abstained,
    Blocked,
    Blocking,
    Protecting,
    Tracked { visited: Option<String> },
    Investigated { faction: Faction },
    Killed,
    Protected,
    AlreadyDead,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Abstained => "abstained",
            Self::Blocked => "blocked",
            Self::Blocking => "blocking",
            Self::Protecting => "protecting",
            Self::Tracked { .. } => "tracked",
            Self::Investigated { .. } => "investigated",
            Self::Killed => "killed",
            Self::Protected => "protected",
            Self::AlreadyDead => "already_dead",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub actor: String,
    pub kind: ActionKind,
    pub target: Option<String>,
    pub success: bool,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NightOutcome {
    pub results: Vec<ActionResult>,
    /// Players who die, in resolution order.
    pub deaths: Vec<(String, KillSource)>,
    pub investigations: Vec<(String, Investigation)>,
    pub tracks: Vec<(String, TrackResult)>,
    /// Everyone who was protected. Never announced.
    pub protected: BTreeSet<String>,
}

/// Resolve one night's declared actions against the roster.
pub fn resolve_night(declared: &[NightAction], players: &[Player]) -> NightOutcome {
    let mut actions: Vec<NightAction> = declared.to_vec();
    actions.sort_by_key(|a| a.priority);

    // Blocks. A block always lands, even when its actor is also blocked.
    let blocked_actors: BTreeSet<String> = actions
        .iter()
        .filter(|a| a.kind == ActionKind::Block)
        .filter_map(|a| a.target.clone())
        .collect();
    for action in actions.iter_mut() {
        if action.kind != ActionKind::Block && blocked_actors.contains(&action.actor) {
            action.blocked = true;
        }
    }

    let protected: BTreeSet<String> = actions
        .iter()
        .filter(|a| a.kind == ActionKind::Protect)
        .filter_map(|a| a.live_target().map(str::to_string))
        .collect();

    // Visits that actually happened, in resolution order.
    let visits: Vec<(&str, &str)> = actions
        .iter()
        .filter(|a| a.is_visit)
        .filter_map(|a| a.live_target().map(|t| (a.actor.as_str(), t)))
        .collect();

    let mut outcome = NightOutcome {
        protected: protected.clone(),
        ..Default::default()
    };
    let mut killed: BTreeSet<String> = BTreeSet::new();

    for action in &actions {
        let result = match (&action.target, action.blocked) {
            (None, _) => Outcome::Abstained,
            (Some(_), true) => Outcome::Blocked,
            (Some(target), false) => match action.kind {
                ActionKind::Block => Outcome::Blocking,
                ActionKind::Protect => Outcome::Protecting,
                ActionKind::Track => {
                    let visited = visits
                        .iter()
                        .find(|(visitor, _)| *visitor == target.as_str())
                        .map(|(_, to)| to.to_string());
                    outcome.tracks.push((
                        action.actor.clone(),
                        TrackResult {
                            target: target.clone(),
                            visited: visited.clone(),
                        },
                    ));
                    Outcome::Tracked { visited }
                }
                ActionKind::Investigate => {
                    let faction = players
                        .player(target)
                        .map(|p| Faction::of(p.team()))
                        .unwrap_or(Faction::Town);
                    outcome.investigations.push((
                        action.actor.clone(),
                        Investigation {
                            target: target.clone(),
                            faction,
                        },
                    ));
                    Outcome::Investigated { faction }
                }
                ActionKind::Kill => {
                    let alive = players.player(target).is_some_and(|p| p.alive);
                    if !alive || killed.contains(target) {
                        Outcome::AlreadyDead
                    } else if protected.contains(target) {
                        Outcome::Protected
                    } else {
                        killed.insert(target.clone());
                        outcome.deaths.push((
                            target.clone(),
                            action.source.unwrap_or(KillSource::Mafia),
                        ));
                        Outcome::Killed
                    }
                }
            },
        };

        let success = matches!(
            result,
            Outcome::Blocking
                | Outcome::Protecting
                | Outcome::Tracked { .. }
                | Outcome::Investigated { .. }
                | Outcome::Killed
        );
        outcome.results.push(ActionResult {
            actor: action.actor.clone(),
            kind: action.kind,
            target: action.target.clone(),
            success,
            outcome: result,
        });
    }

    outcome
}

/// Target of the mafia bloc: the unique most-voted name, else nobody.
pub fn mafia_bloc_target<'a, I>(votes: I) -> Option<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let tally = crate::votes::tally(votes.into_iter().flatten().map(Some));
    match tally.leaders.as_slice() {
        [Some(name)] => Some(name.clone()),
        _ => None,
    }
}
