//! Audience partitioning of the event log.
//!
//! Every event carries an [`Audience`]; the manager resolves it to a concrete
//! recipient set and filters the log down to what a single player may see.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::{Audience, Event, Player, Team};
use crate::log::EventLog;

/// Name of the group holding every member of the mafia team.
pub const MAFIA_GROUP: &str = "mafia";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VisibilityGroup {
    pub name: String,
    pub members: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<Team>,
}

/// Concrete recipients of an audience.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipients {
    All,
    Public,
    Only(BTreeSet<String>),
}

impl Recipients {
    pub fn includes(&self, player: &str) -> bool {
        match self {
            Self::All | Self::Public => true,
            Self::Only(names) => names.contains(player),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VisibilityManager {
    groups: BTreeMap<String, VisibilityGroup>,
}

impl VisibilityManager {
    /// Build the standard groups from the starting roster.
    ///
    /// Membership is fixed here; it is not recomputed when players die.
    pub fn from_players(players: &[Player]) -> Self {
        let mut manager = Self::default();
        let mafia = players
            .iter()
            .filter(|p| p.team() == Team::Mafia)
            .map(|p| p.name.clone());
        manager.create_group(MAFIA_GROUP, mafia, Some(Team::Mafia));
        manager
    }

    /// Create or replace an ad-hoc group.
    pub fn create_group<I, S>(&mut self, name: &str, members: I, team: Option<Team>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let group = VisibilityGroup {
            name: name.to_string(),
            members: members.into_iter().map(Into::into).collect(),
            team,
        };
        self.groups.insert(name.to_string(), group);
    }

    pub fn group(&self, name: &str) -> Option<&VisibilityGroup> {
        self.groups.get(name)
    }

    pub fn resolve(&self, audience: &Audience) -> Recipients {
        match audience {
            Audience::All => Recipients::All,
            Audience::Public => Recipients::Public,
            Audience::Players(names) => Recipients::Only(names.iter().cloned().collect()),
            Audience::Named(name) => match self.groups.get(name) {
                Some(group) => Recipients::Only(group.members.clone()),
                None => Recipients::Only(BTreeSet::from([name.clone()])),
            },
        }
    }

    pub fn can_see(&self, event: &Event, player: &str) -> bool {
        self.resolve(&event.audience).includes(player)
    }

    /// The events `player` may see, in log order.
    pub fn visible_to(&self, log: &EventLog, player: &str) -> Vec<Event> {
        self.filter(log.snapshot(), player)
    }

    pub fn filter(&self, events: Vec<Event>, player: &str) -> Vec<Event> {
        events
            .into_iter()
            .filter(|event| self.can_see(event, player))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventDraft, EventKind, Phase, RoleKind};

    fn players() -> Vec<Player> {
        vec![
            Player::new("Alice", "m", RoleKind::Mafia),
            Player::new("Bob", "m", RoleKind::Mafia),
            Player::new("Cara", "m", RoleKind::Sheriff),
            Player::new("Dan", "m", RoleKind::Town),
        ]
    }

    #[test]
    fn test_mafia_group_from_team() {
        let manager = VisibilityManager::from_players(&players());
        let group = manager.group(MAFIA_GROUP).unwrap();
        assert_eq!(group.members, BTreeSet::from(["Alice".to_string(), "Bob".to_string()]));
        assert_eq!(group.team, Some(Team::Mafia));
    }

    #[test]
    fn test_group_not_recomputed_on_death() {
        let mut roster = players();
        let manager = VisibilityManager::from_players(&roster);
        roster[0].kill();
        assert!(manager.resolve(&Audience::named(MAFIA_GROUP)).includes("Alice"));
    }

    #[test]
    fn test_resolve_variants() {
        let manager = VisibilityManager::from_players(&players());

        assert_eq!(manager.resolve(&Audience::All), Recipients::All);
        assert_eq!(manager.resolve(&Audience::Public), Recipients::Public);
        assert_eq!(
            manager.resolve(&Audience::named("Cara")),
            Recipients::Only(BTreeSet::from(["Cara".to_string()]))
        );
        let listed = manager.resolve(&Audience::Players(vec!["Dan".to_string(), "Cara".to_string()]));
        assert!(listed.includes("Dan"));
        assert!(!listed.includes("Alice"));
    }

    #[test]
    fn test_visible_to_partitions_log() {
        let manager = VisibilityManager::from_players(&players());
        let log = EventLog::new();
        log.append(Phase::Night, 0, EventDraft::system("Night 1 begins.")).unwrap();
        log.append(
            Phase::Night,
            0,
            EventDraft::new(EventKind::MafiaChat, "kill Cara?")
                .with_player("Alice")
                .private_to(MAFIA_GROUP),
        )
        .unwrap();
        log.append(
            Phase::Night,
            0,
            EventDraft::new(EventKind::RoleAction, "Dan is TOWN").private_to("Cara"),
        )
        .unwrap();
        log.append(
            Phase::Day,
            1,
            EventDraft::new(EventKind::Discussion, "morning").with_audience(Audience::Public),
        )
        .unwrap();

        let ids = |name: &str| -> Vec<u64> {
            manager.visible_to(&log, name).iter().map(|e| e.id).collect()
        };
        assert_eq!(ids("Alice"), vec![1, 2, 4]);
        assert_eq!(ids("Bob"), vec![1, 2, 4]);
        assert_eq!(ids("Cara"), vec![1, 3, 4]);
        assert_eq!(ids("Dan"), vec![1, 4]);
    }

    #[test]
    fn test_ad_hoc_group() {
        let mut manager = VisibilityManager::from_players(&players());
        manager.create_group("masons", ["Cara", "Dan"], Some(Team::Town));
        assert!(manager.resolve(&Audience::named("masons")).includes("Dan"));
        assert!(!manager.resolve(&Audience::named("masons")).includes("Bob"));
    }
}
