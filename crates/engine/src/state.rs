//! The complete, serializable state of one game.

use mafia_core::{
    Audience, Event, EventDraft, EventKind, EventLog, Phase, Player, Roster, VisibilityManager,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::phase_data::PhaseData;
use crate::rules::GameRules;
use crate::steps::Step;
use crate::win::{TeamCounts, Winner};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub game_id: Uuid,
    pub players: Vec<Player>,
    pub rules: GameRules,
    pub phase: Phase,
    /// 0 during the first night; incremented at each day start.
    pub day: u32,
    pub current_step: Step,
    pub step_index: usize,
    pub phase_data: PhaseData,
    pub log: EventLog,
    pub visibility: VisibilityManager,
    pub winner: Option<Winner>,
    #[serde(default)]
    pub winning_jester: Option<String>,
    #[serde(default)]
    pub mvp: Vec<String>,
    pub game_over: bool,
}

impl GameState {
    pub fn new(players: Vec<Player>, rules: GameRules) -> Self {
        let visibility = VisibilityManager::from_players(&players);
        Self {
            game_id: Uuid::new_v4(),
            players,
            rules,
            phase: Phase::Night,
            day: 0,
            current_step: Step::NightStart,
            step_index: 0,
            phase_data: PhaseData::default(),
            log: EventLog::new(),
            visibility,
            winner: None,
            winning_jester: None,
            mvp: Vec::new(),
            game_over: false,
        }
    }

    /// Append an event stamped with the current phase and day.
    pub fn log_event(&self, draft: EventDraft) -> Result<Event> {
        Ok(self.log.append(self.phase, self.day, draft)?)
    }

    pub fn announce(&self, kind: EventKind, message: impl Into<String>) -> Result<Event> {
        self.log_event(EventDraft::new(kind, message))
    }

    /// A message only `audience` (a player or group name) can see.
    pub fn tell(&self, audience: &str, kind: EventKind, message: impl Into<String>) -> Result<Event> {
        self.log_event(EventDraft::new(kind, message).private_to(audience))
    }

    pub fn speak(&self, player: &str, kind: EventKind, audience: Audience, message: impl Into<String>) -> Result<Event> {
        self.log_event(
            EventDraft::new(kind, message)
                .with_player(player)
                .with_audience(audience),
        )
    }

    pub fn night_number(&self) -> u32 {
        self.day + 1
    }

    pub fn alive_names(&self) -> Vec<String> {
        self.players.alive_names()
    }

    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.player(name)
    }

    pub fn player_mut(&mut self, name: &str) -> Option<&mut Player> {
        self.players.player_mut(name)
    }

    pub fn team_counts(&self) -> TeamCounts {
        TeamCounts::of(&self.players)
    }

    /// Living mafia members in roster order.
    pub fn mafia_alive(&self) -> Vec<String> {
        self.players
            .iter()
            .filter(|p| p.alive && p.is_mafia())
            .map(|p| p.name.clone())
            .collect()
    }

    /// The visible transcript for `player`, most recent `limit` events.
    pub fn transcript_for(&self, player: &str, limit: usize) -> Vec<Event> {
        let visible = self.visibility.visible_to(&self.log, player);
        let skip = visible.len().saturating_sub(limit);
        visible.into_iter().skip(skip).collect()
    }
}
