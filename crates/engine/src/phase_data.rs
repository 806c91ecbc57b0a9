//! Per-phase scratch data carried between steps.
//!
//! Everything here is owned data so a checkpoint can clone it outright.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::resolver::NightAction;
use crate::scheduler::{Selection, TurnScheduler};

/// A ballot. `target == None` is an abstention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub voter: String,
    pub target: Option<String>,
    #[serde(default)]
    pub reason: String,
}

impl Ballot {
    pub fn new(voter: impl Into<String>, target: Option<String>, reason: impl Into<String>) -> Self {
        Self {
            voter: voter.into(),
            target,
            reason: reason.into(),
        }
    }

    pub fn abstain(voter: impl Into<String>) -> Self {
        Self::new(voter, None, "")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NightData {
    pub mafia_messages: Vec<(String, String)>,
    pub mafia_votes: Vec<Ballot>,
    pub mafia_target: Option<String>,
    /// Private deliberation per acting player.
    pub deliberations: BTreeMap<String, String>,
    /// Declared actions, resolved together at the end of the night.
    pub actions: Vec<NightAction>,
    /// Vigilantes holding a bullet when the night began.
    #[serde(default)]
    pub armed_vigilantes: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayData {
    pub scheduler: TurnScheduler,
    pub pending_speaker: Option<Selection>,
    pub messages: Vec<(String, String)>,
    pub introduction_order: Vec<String>,
    pub votes: Vec<Ballot>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostgameData {
    pub messages: Vec<(String, String)>,
    pub mvp_votes: Vec<Ballot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum PhaseData {
    Night(NightData),
    Day(DayData),
    Postgame(PostgameData),
}

impl Default for PhaseData {
    fn default() -> Self {
        Self::Night(NightData::default())
    }
}

impl PhaseData {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Night(_) => "night",
            Self::Day(_) => "day",
            Self::Postgame(_) => "postgame",
        }
    }

    pub fn night(&self) -> Option<&NightData> {
        match self {
            Self::Night(data) => Some(data),
            _ => None,
        }
    }

    pub fn night_mut(&mut self) -> Option<&mut NightData> {
        match self {
            Self::Night(data) => Some(data),
            _ => None,
        }
    }

    pub fn day(&self) -> Option<&DayData> {
        match self {
            Self::Day(data) => Some(data),
            _ => None,
        }
    }

    pub fn day_mut(&mut self) -> Option<&mut DayData> {
        match self {
            Self::Day(data) => Some(data),
            _ => None,
        }
    }

    pub fn postgame_mut(&mut self) -> Option<&mut PostgameData> {
        match self {
            Self::Postgame(data) => Some(data),
            _ => None,
        }
    }
}
