//! Step-boundary snapshots for pause and rollback.

use mafia_core::{Phase, Player};
use serde::{Deserialize, Serialize};

use crate::phase_data::PhaseData;
use crate::state::GameState;
use crate::steps::Step;
use crate::win::Winner;

/// Everything a suspending step can change, captured just before it runs.
///
/// The log is append-only, so its length is enough to undo a step's events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub current_step: Step,
    pub step_index: usize,
    pub phase_data: PhaseData,
    pub phase: Phase,
    pub day: u32,
    pub log_len: usize,
    pub roster: Vec<Player>,
    pub winner: Option<Winner>,
    #[serde(default)]
    pub winning_jester: Option<String>,
    #[serde(default)]
    pub mvp: Vec<String>,
}

impl Checkpoint {
    pub fn capture(state: &GameState) -> Self {
        Self {
            current_step: state.current_step,
            step_index: state.step_index,
            phase_data: state.phase_data.clone(),
            phase: state.phase,
            day: state.day,
            log_len: state.log.len(),
            roster: state.players.clone(),
            winner: state.winner,
            winning_jester: state.winning_jester.clone(),
            mvp: state.mvp.clone(),
        }
    }

    /// Put `state` back exactly as it was at capture time. Events appended
    /// since are discarded; earlier ones are untouched.
    pub fn restore(&self, state: &mut GameState) {
        state.current_step = self.current_step;
        state.step_index = self.step_index;
        state.phase_data = self.phase_data.clone();
        state.phase = self.phase;
        state.day = self.day;
        state.players = self.roster.clone();
        state.winner = self.winner;
        state.winning_jester = self.winning_jester.clone();
        state.mvp = self.mvp.clone();
        state.log.truncate(self.log_len);
    }
}
