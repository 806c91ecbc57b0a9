//! Ballot tallying for lynches, the mafia bloc and MVP.

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::phase_data::Ballot;

pub const ABSTAIN_LABEL: &str = "abstain";
pub const MVP_FALLBACK_REASON: &str = "Good game.";

/// Vote counts keyed by target; `None` is abstain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    /// Candidates in first-vote order.
    pub counts: Vec<(Option<String>, usize)>,
    /// Every candidate holding the maximum count.
    pub leaders: Vec<Option<String>>,
    pub top: usize,
}

impl Tally {
    pub fn count(&self, target: Option<&str>) -> usize {
        self.counts
            .iter()
            .find(|(name, _)| name.as_deref() == target)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

pub fn tally<'a, I>(votes: I) -> Tally
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut counts: Vec<(Option<String>, usize)> = Vec::new();
    for vote in votes {
        match counts.iter_mut().find(|(name, _)| name.as_deref() == vote) {
            Some((_, n)) => *n += 1,
            None => counts.push((vote.map(str::to_string), 1)),
        }
    }

    let top = counts.iter().map(|(_, n)| *n).max().unwrap_or(0);
    let leaders = counts
        .iter()
        .filter(|(_, n)| *n == top && top > 0)
        .map(|(name, _)| name.clone())
        .collect();

    Tally {
        counts,
        leaders,
        top,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LynchOutcome {
    Eliminated { target: String, votes: usize },
    /// Shared maximum; nobody dies. Abstain appears as "abstain".
    Tie { names: Vec<String> },
    AbstainWins { votes: usize },
    /// Plurality reached but the majority rule was not met.
    NoMajority {
        leader: String,
        votes: usize,
        needed: usize,
    },
    NoVotes,
}

pub fn resolve_lynch(ballots: &[Ballot], alive: usize, require_majority: bool) -> LynchOutcome {
    let tally = tally(ballots.iter().map(|b| b.target.as_deref()));

    match tally.leaders.as_slice() {
        [] => LynchOutcome::NoVotes,
        [None] => LynchOutcome::AbstainWins { votes: tally.top },
        [Some(target)] => {
            let needed = crate::rules::GameRules::majority_threshold(alive);
            if require_majority && tally.top < needed {
                LynchOutcome::NoMajority {
                    leader: target.clone(),
                    votes: tally.top,
                    needed,
                }
            } else {
                LynchOutcome::Eliminated {
                    target: target.clone(),
                    votes: tally.top,
                }
            }
        }
        tied => LynchOutcome::Tie {
            names: tied
                .iter()
                .map(|name| name.clone().unwrap_or_else(|| ABSTAIN_LABEL.to_string()))
                .collect(),
        },
    }
}

/// Replace self-votes, abstentions and unknown names with a uniformly random
/// other player.
pub fn sanitize_mvp_votes<R: Rng + ?Sized>(
    ballots: Vec<Ballot>,
    players: &[String],
    rng: &mut R,
) -> Vec<Ballot> {
    ballots
        .into_iter()
        .map(|ballot| {
            let valid = ballot
                .target
                .as_ref()
                .is_some_and(|t| *t != ballot.voter && players.contains(t));
            if valid {
                return ballot;
            }

            let others: Vec<&String> = players.iter().filter(|p| **p != ballot.voter).collect();
            let target = others.choose(rng).map(|p| (*p).clone());
            Ballot::new(ballot.voter, target, MVP_FALLBACK_REASON)
        })
        .collect()
}

/// Most-voted players. More than one name means co-MVPs.
pub fn resolve_mvp(ballots: &[Ballot]) -> Vec<String> {
    tally(ballots.iter().map(|b| b.target.as_deref()))
        .leaders
        .into_iter()
        .flatten()
        .collect()
}
