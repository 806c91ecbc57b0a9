//! The atomic units a game advances through.
//!
//! Steps are plain data: the runner stores the current one in the game state
//! and dispatches on it with a single `match`. Names are the snake_case
//! strings persisted in save files.

use std::str::FromStr;

use mafia_core::{Phase, RoleKind};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    // Night
    NightStart,
    ScratchpadNightStart,
    MafiaDiscussion,
    MafiaVote,
    EscortDiscuss,
    EscortAct,
    DoctorDiscuss,
    DoctorAct,
    SheriffDiscuss,
    SheriffAct,
    TrackerDiscuss,
    TrackerAct,
    VigilanteDiscuss,
    VigilanteAct,
    NightResolve,
    // Day
    DayStart,
    ScratchpadDayStart,
    IntroductionMessage,
    DiscussionPoll,
    DiscussionMessage,
    ScratchpadPreVote,
    Voting,
    VotingResolve,
    // Postgame
    PostgameReveal,
    PostgameDiscussion,
    MvpVoting,
    GameEnd,
}

impl Step {
    pub const ALL: [Step; 27] = [
        Self::NightStart,
        Self::ScratchpadNightStart,
        Self::MafiaDiscussion,
        Self::MafiaVote,
        Self::EscortDiscuss,
        Self::EscortAct,
        Self::DoctorDiscuss,
        Self::DoctorAct,
        Self::SheriffDiscuss,
        Self::SheriffAct,
        Self::TrackerDiscuss,
        Self::TrackerAct,
        Self::VigilanteDiscuss,
        Self::VigilanteAct,
        Self::NightResolve,
        Self::DayStart,
        Self::ScratchpadDayStart,
        Self::IntroductionMessage,
        Self::DiscussionPoll,
        Self::DiscussionMessage,
        Self::ScratchpadPreVote,
        Self::Voting,
        Self::VotingResolve,
        Self::PostgameReveal,
        Self::PostgameDiscussion,
        Self::MvpVoting,
        Self::GameEnd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NightStart => "night_start",
            Self::ScratchpadNightStart => "scratchpad_night_start",
            Self::MafiaDiscussion => "mafia_discussion",
            Self::MafiaVote => "mafia_vote",
            Self::EscortDiscuss => "escort_discuss",
            Self::EscortAct => "escort_act",
            Self::DoctorDiscuss => "doctor_discuss",
            Self::DoctorAct => "doctor_act",
            Self::SheriffDiscuss => "sheriff_discuss",
            Self::SheriffAct => "sheriff_act",
            Self::TrackerDiscuss => "tracker_discuss",
            Self::TrackerAct => "tracker_act",
            Self::VigilanteDiscuss => "vigilante_discuss",
            Self::VigilanteAct => "vigilante_act",
            Self::NightResolve => "night_resolve",
            Self::DayStart => "day_start",
            Self::ScratchpadDayStart => "scratchpad_day_start",
            Self::IntroductionMessage => "introduction_message",
            Self::DiscussionPoll => "discussion_poll",
            Self::DiscussionMessage => "discussion_message",
            Self::ScratchpadPreVote => "scratchpad_pre_vote",
            Self::Voting => "voting",
            Self::VotingResolve => "voting_resolve",
            Self::PostgameReveal => "postgame_reveal",
            Self::PostgameDiscussion => "postgame_discussion",
            Self::MvpVoting => "mvp_voting",
            Self::GameEnd => "game_end",
        }
    }

    /// Parse a persisted step name. Unknown names are a fatal error.
    pub fn from_name(name: &str) -> Result<Self, EngineError> {
        Self::ALL
            .iter()
            .copied()
            .find(|step| step.as_str() == name)
            .ok_or_else(|| EngineError::UnknownStep(name.to_string()))
    }

    pub fn phase(&self) -> Phase {
        match self {
            Self::NightStart
            | Self::ScratchpadNightStart
            | Self::MafiaDiscussion
            | Self::MafiaVote
            | Self::EscortDiscuss
            | Self::EscortAct
            | Self::DoctorDiscuss
            | Self::DoctorAct
            | Self::SheriffDiscuss
            | Self::SheriffAct
            | Self::TrackerDiscuss
            | Self::TrackerAct
            | Self::VigilanteDiscuss
            | Self::VigilanteAct
            | Self::NightResolve => Phase::Night,
            Self::DayStart
            | Self::ScratchpadDayStart
            | Self::IntroductionMessage
            | Self::DiscussionPoll
            | Self::DiscussionMessage
            | Self::ScratchpadPreVote
            | Self::Voting
            | Self::VotingResolve => Phase::Day,
            Self::PostgameReveal | Self::PostgameDiscussion | Self::MvpVoting | Self::GameEnd => {
                Phase::Postgame
            }
        }
    }

    /// Steps that call the reasoning service and therefore checkpoint first.
    pub fn is_suspending(&self) -> bool {
        !matches!(
            self,
            Self::NightStart
                | Self::NightResolve
                | Self::DayStart
                | Self::VotingResolve
                | Self::PostgameReveal
                | Self::GameEnd
        )
    }

    /// The discuss/act pair of a lone night role.
    pub fn role_steps(kind: RoleKind) -> Option<(Step, Step)> {
        match kind {
            RoleKind::Escort => Some((Self::EscortDiscuss, Self::EscortAct)),
            RoleKind::Doctor => Some((Self::DoctorDiscuss, Self::DoctorAct)),
            RoleKind::Sheriff => Some((Self::SheriffDiscuss, Self::SheriffAct)),
            RoleKind::Tracker => Some((Self::TrackerDiscuss, Self::TrackerAct)),
            RoleKind::Vigilante => Some((Self::VigilanteDiscuss, Self::VigilanteAct)),
            _ => None,
        }
    }

    /// The role a discuss/act step belongs to.
    pub fn night_role(&self) -> Option<RoleKind> {
        match self {
            Self::EscortDiscuss | Self::EscortAct => Some(RoleKind::Escort),
            Self::DoctorDiscuss | Self::DoctorAct => Some(RoleKind::Doctor),
            Self::SheriffDiscuss | Self::SheriffAct => Some(RoleKind::Sheriff),
            Self::TrackerDiscuss | Self::TrackerAct => Some(RoleKind::Tracker),
            Self::VigilanteDiscuss | Self::VigilanteAct => Some(RoleKind::Vigilante),
            _ => None,
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Step {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl Serialize for Step {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Step {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Step::from_name(&name).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for step in Step::ALL {
            assert_eq!(Step::from_name(step.as_str()).unwrap(), step);
        }
    }

    #[test]
    fn test_unknown_name_fails() {
        let err = Step::from_name("twilight").unwrap_err();
        assert!(matches!(err, EngineError::UnknownStep(name) if name == "twilight"));

        let parsed: Result<Step, _> = serde_json::from_str("\"twilight\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_serializes_as_name() {
        assert_eq!(serde_json::to_string(&Step::MvpVoting).unwrap(), "\"mvp_voting\"");
    }

    #[test]
    fn test_suspending_steps() {
        assert!(Step::MafiaVote.is_suspending());
        assert!(Step::DiscussionPoll.is_suspending());
        assert!(!Step::NightResolve.is_suspending());
        assert!(!Step::GameEnd.is_suspending());
    }

    #[test]
    fn test_role_steps_pair_up() {
        for kind in [
            RoleKind::Escort,
            RoleKind::Doctor,
            RoleKind::Sheriff,
            RoleKind::Tracker,
            RoleKind::Vigilante,
        ] {
            let (discuss, act) = Step::role_steps(kind).unwrap();
            assert_eq!(discuss.night_role(), Some(kind));
            assert_eq!(act.night_role(), Some(kind));
            assert_eq!(act.phase(), Phase::Night);
        }
        assert!(Step::role_steps(RoleKind::Town).is_none());
    }
}
