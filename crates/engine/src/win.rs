use mafia_core::{Player, Team};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Mafia,
    Town,
    /// A lynched jester.
    Jester,
}

impl Winner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mafia => "mafia",
            Self::Town => "town",
            Self::Jester => "jester",
        }
    }
}

/// Alive players per side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeamCounts {
    pub mafia: usize,
    pub others: usize,
}

impl TeamCounts {
    pub fn of(players: &[Player]) -> Self {
        players
            .iter()
            .filter(|p| p.alive)
            .fold(Self::default(), |mut counts, p| {
                if p.team() == Team::Mafia {
                    counts.mafia += 1;
                } else {
                    counts.others += 1;
                }
                counts
            })
    }
}

/// Mafia wins at parity; town wins once the mafia is gone. A third-party
/// player counts against the mafia at parity.
pub fn check_winner(counts: TeamCounts) -> Option<Winner> {
    if counts.mafia == 0 {
        Some(Winner::Town)
    } else if counts.mafia >= counts.others {
        Some(Winner::Mafia)
    } else {
        None
    }
}
