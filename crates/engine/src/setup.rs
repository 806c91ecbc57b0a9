//! Role distribution and game creation.

use std::collections::BTreeMap;

use mafia_core::{EventKind, Player, RoleKind};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{EngineError, Result};
use crate::rules::GameRules;
use crate::state::GameState;

pub const MIN_PLAYERS: usize = 3;

/// A seat at the table before roles are dealt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSpec {
    pub name: String,
    pub model: String,
}

impl PlayerSpec {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
        }
    }
}

/// Role counts, e.g. `{mafia = 2, sheriff = 1}`.
pub type RoleDistribution = BTreeMap<RoleKind, usize>;

/// The built-in distribution for `n` players.
pub fn default_distribution(n: usize) -> RoleDistribution {
    use RoleKind::*;

    let table: &[(RoleKind, usize)] = match n {
        0..=4 => &[(Mafia, 1)],
        5 => &[(Mafia, 1), (Sheriff, 1)],
        6 => &[(Mafia, 2), (Sheriff, 1)],
        7 | 8 => &[(Mafia, 2), (Sheriff, 1), (Doctor, 1)],
        9 => &[(Mafia, 2), (Sheriff, 1), (Doctor, 1), (Vigilante, 1)],
        10 => &[(Mafia, 3), (Sheriff, 1), (Doctor, 1)],
        11 | 12 => &[(Mafia, 3), (Sheriff, 1), (Doctor, 1), (Vigilante, 1)],
        _ => &[(Sheriff, 1), (Doctor, 1), (Vigilante, 1)],
    };

    let mut distribution: RoleDistribution = table.iter().copied().collect();
    if n > 12 {
        let mafia = ((n as f64) / 4.0).round().max(2.0) as usize;
        distribution.insert(Mafia, mafia);
    }
    distribution
}

/// Expand a distribution into exactly `n` roles.
///
/// Surplus seats become Town and excess roles are dropped. The result
/// always holds at least one Mafia.
pub fn expand_roles(distribution: &RoleDistribution, n: usize) -> Vec<RoleKind> {
    // Mafia first so truncation never drops the whole mafia.
    let mut kinds: Vec<RoleKind> = distribution.keys().copied().collect();
    kinds.sort_by_key(|k| (*k != RoleKind::Mafia, *k == RoleKind::Town));

    let mut roles: Vec<RoleKind> = kinds
        .into_iter()
        .flat_map(|kind| std::iter::repeat(kind).take(distribution[&kind]))
        .collect();
    roles.truncate(n);

    if n > 0 && !roles.contains(&RoleKind::Mafia) {
        if roles.is_empty() {
            roles.push(RoleKind::Mafia);
        } else {
            roles[0] = RoleKind::Mafia;
        }
    }
    roles.resize(n, RoleKind::Town);
    roles
}

fn validate(specs: &[PlayerSpec]) -> Result<()> {
    if specs.len() < MIN_PLAYERS {
        return Err(EngineError::InvalidConfig(format!(
            "at least {} players required, got {}",
            MIN_PLAYERS,
            specs.len()
        )));
    }

    let mut seen = std::collections::BTreeSet::new();
    for spec in specs {
        if spec.name.trim().is_empty() {
            return Err(EngineError::InvalidConfig("player name is empty".to_string()));
        }
        if !seen.insert(spec.name.as_str()) {
            return Err(EngineError::InvalidConfig(format!(
                "duplicate player name: {}",
                spec.name
            )));
        }
    }
    Ok(())
}

/// Deal roles at random and build the initial state.
pub fn new_game<R: Rng + ?Sized>(
    specs: &[PlayerSpec],
    distribution: Option<&RoleDistribution>,
    rules: GameRules,
    rng: &mut R,
) -> Result<GameState> {
    validate(specs)?;

    let distribution = match distribution {
        Some(d) => d.clone(),
        None => default_distribution(specs.len()),
    };
    let mut roles = expand_roles(&distribution, specs.len());
    roles.shuffle(rng);

    let players: Vec<Player> = specs
        .iter()
        .zip(roles)
        .map(|(spec, kind)| Player::new(spec.name.clone(), spec.model.clone(), kind))
        .collect();

    let state = GameState::new(players, rules);
    state.announce(
        EventKind::System,
        format!(
            "Game started with {} players. Roles have been distributed: {}.",
            state.players.len(),
            describe_roles(&state.players)
        ),
    )?;

    info!(
        game_id = %state.game_id,
        players = state.players.len(),
        mafia = state.mafia_alive().len(),
        "Game created"
    );

    Ok(state)
}

/// "2 mafia, 3 town, 1 sheriff" in a stable order.
fn describe_roles(players: &[Player]) -> String {
    let mut counts: BTreeMap<RoleKind, usize> = BTreeMap::new();
    for player in players {
        *counts.entry(player.kind()).or_default() += 1;
    }

    let mut kinds: Vec<RoleKind> = counts.keys().copied().collect();
    kinds.sort_by_key(|k| match k {
        RoleKind::Mafia => 0,
        RoleKind::Town => 1,
        _ => 2,
    });
    kinds
        .iter()
        .map(|k| format!("{} {}", counts[k], k.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}
