//! Tunable game rules.

use mafia_core::RoleKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    /// Order in which lone night roles deliberate and act.
    pub night_role_order: Vec<RoleKind>,
    pub doctor_can_self_protect: bool,
    pub doctor_repeat_protect: bool,
    /// Day 1 is a round of introductions instead of polled discussion.
    pub day1_round_robin: bool,
    pub day1_no_lynch: bool,
    /// Messages per day discussion, counting failed turns.
    pub max_discussion_messages: usize,
    /// Lynch only with a strict majority of living players.
    pub require_majority: bool,
    pub discussion_max_chars: usize,
    pub role_discussion_max_chars: usize,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            night_role_order: vec![
                RoleKind::Escort,
                RoleKind::Doctor,
                RoleKind::Sheriff,
                RoleKind::Tracker,
                RoleKind::Vigilante,
            ],
            doctor_can_self_protect: true,
            doctor_repeat_protect: false,
            day1_round_robin: true,
            day1_no_lynch: true,
            max_discussion_messages: 10,
            require_majority: false,
            discussion_max_chars: 500,
            role_discussion_max_chars: 1000,
        }
    }
}

impl GameRules {
    pub fn with_max_discussion_messages(mut self, max: usize) -> Self {
        self.max_discussion_messages = max;
        self
    }

    pub fn with_day1_round_robin(mut self, enabled: bool) -> Self {
        self.day1_round_robin = enabled;
        self
    }

    pub fn with_day1_no_lynch(mut self, enabled: bool) -> Self {
        self.day1_no_lynch = enabled;
        self
    }

    pub fn with_doctor_repeat_protect(mut self, enabled: bool) -> Self {
        self.doctor_repeat_protect = enabled;
        self
    }

    pub fn with_require_majority(mut self, enabled: bool) -> Self {
        self.require_majority = enabled;
        self
    }

    /// Votes needed to lynch when a majority is required.
    pub fn majority_threshold(alive: usize) -> usize {
        alive / 2 + 1
    }
}
