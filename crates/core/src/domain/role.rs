use serde::{Deserialize, Serialize};

/// Win-condition affiliation of a player.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Mafia,
    Town,
    ThirdParty,
}

impl Team {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mafia => "mafia",
            Self::Town => "town",
            Self::ThirdParty => "third_party",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mafia" => Some(Self::Mafia),
            "town" => Some(Self::Town),
            "third_party" => Some(Self::ThirdParty),
            _ => None,
        }
    }
}

/// What an investigation reveals. Only two answers exist; a third-party
/// player reads as town.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    Mafia,
    Town,
}

impl Faction {
    pub fn of(team: Team) -> Self {
        match team {
            Team::Mafia => Self::Mafia,
            Team::Town | Team::ThirdParty => Self::Town,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mafia => "mafia",
            Self::Town => "town",
        }
    }
}

/// Payload-free discriminant of [`Role`], used for configuration and ordering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    Town,
    Mafia,
    Sheriff,
    Doctor,
    Vigilante,
    Escort,
    Tracker,
    Jester,
}

impl RoleKind {
    pub const ALL: [RoleKind; 8] = [
        Self::Town,
        Self::Mafia,
        Self::Sheriff,
        Self::Doctor,
        Self::Vigilante,
        Self::Escort,
        Self::Tracker,
        Self::Jester,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Town => "town",
            Self::Mafia => "mafia",
            Self::Sheriff => "sheriff",
            Self::Doctor => "doctor",
            Self::Vigilante => "vigilante",
            Self::Escort => "escort",
            Self::Tracker => "tracker",
            Self::Jester => "jester",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "town" | "villager" => Some(Self::Town),
            "mafia" => Some(Self::Mafia),
            "sheriff" => Some(Self::Sheriff),
            "doctor" => Some(Self::Doctor),
            "vigilante" => Some(Self::Vigilante),
            "escort" => Some(Self::Escort),
            "tracker" => Some(Self::Tracker),
            "jester" => Some(Self::Jester),
            _ => None,
        }
    }

    /// Human-facing name used in announcements and prompts.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Town => "Town",
            Self::Mafia => "Mafia",
            Self::Sheriff => "Sheriff",
            Self::Doctor => "Doctor",
            Self::Vigilante => "Vigilante",
            Self::Escort => "Escort",
            Self::Tracker => "Tracker",
            Self::Jester => "Jester",
        }
    }

    pub fn team(&self) -> Team {
        match self {
            Self::Mafia => Team::Mafia,
            Self::Jester => Team::ThirdParty,
            _ => Team::Town,
        }
    }

    /// Roles that act alone at night through their own discuss/act steps.
    pub fn has_night_action(&self) -> bool {
        matches!(
            self,
            Self::Sheriff | Self::Doctor | Self::Vigilante | Self::Escort | Self::Tracker
        )
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Town => "You have no night action. Find and lynch the mafia during the day.",
            Self::Mafia => {
                "Each night you and your teammates choose one player to kill. \
                 Win when the mafia equals or outnumbers everyone else."
            }
            Self::Sheriff => "Each night you may investigate one player and learn their faction.",
            Self::Doctor => "Each night you may protect one player from being killed.",
            Self::Vigilante => "You have a single bullet. On any night you may shoot one player.",
            Self::Escort => "Each night you may visit one player and block their night action.",
            Self::Tracker => "Each night you may follow one player and learn whom they visited.",
            Self::Jester => "You win only if the town lynches you.",
        }
    }
}

impl std::fmt::Display for RoleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Investigation {
    pub target: String,
    pub faction: Faction,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackResult {
    pub target: String,
    /// Whom the tracked player visited, if anyone.
    pub visited: Option<String>,
}

/// A player's role together with its role-specific mutable state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Role {
    Town,
    Mafia,
    Sheriff {
        #[serde(default)]
        investigations: Vec<Investigation>,
    },
    Doctor {
        #[serde(default)]
        last_protected: Option<String>,
    },
    Vigilante {
        #[serde(default)]
        bullet_used: bool,
    },
    Escort {
        #[serde(default)]
        blocked: Vec<String>,
    },
    Tracker {
        #[serde(default)]
        results: Vec<TrackResult>,
    },
    Jester,
}

impl Role {
    pub fn new(kind: RoleKind) -> Self {
        match kind {
            RoleKind::Town => Self::Town,
            RoleKind::Mafia => Self::Mafia,
            RoleKind::Sheriff => Self::Sheriff {
                investigations: Vec::new(),
            },
            RoleKind::Doctor => Self::Doctor {
                last_protected: None,
            },
            RoleKind::Vigilante => Self::Vigilante { bullet_used: false },
            RoleKind::Escort => Self::Escort {
                blocked: Vec::new(),
            },
            RoleKind::Tracker => Self::Tracker {
                results: Vec::new(),
            },
            RoleKind::Jester => Self::Jester,
        }
    }

    pub fn kind(&self) -> RoleKind {
        match self {
            Self::Town => RoleKind::Town,
            Self::Mafia => RoleKind::Mafia,
            Self::Sheriff { .. } => RoleKind::Sheriff,
            Self::Doctor { .. } => RoleKind::Doctor,
            Self::Vigilante { .. } => RoleKind::Vigilante,
            Self::Escort { .. } => RoleKind::Escort,
            Self::Tracker { .. } => RoleKind::Tracker,
            Self::Jester => RoleKind::Jester,
        }
    }

    pub fn team(&self) -> Team {
        self.kind().team()
    }

    /// Role-specific facts the player privately knows, for prompt building.
    pub fn private_history(&self) -> Vec<String> {
        match self {
            Self::Sheriff { investigations } => investigations
                .iter()
                .map(|i| format!("You investigated {}: {}", i.target, i.faction.as_str().to_uppercase()))
                .collect(),
            Self::Doctor {
                last_protected: Some(name),
            } => vec![format!("Last night you protected {}", name)],
            Self::Vigilante { bullet_used: true } => vec!["You have already used your bullet".to_string()],
            Self::Escort { blocked } => blocked
                .iter()
                .map(|name| format!("You blocked {}", name))
                .collect(),
            Self::Tracker { results } => results
                .iter()
                .map(|r| match &r.visited {
                    Some(v) => format!("You tracked {}: they visited {}", r.target, v),
                    None => format!("You tracked {}: they visited no one", r.target),
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_kind_round_trip_names() {
        for kind in RoleKind::ALL {
            assert_eq!(RoleKind::parse(kind.as_str()), Some(kind));
            assert_eq!(Role::new(kind).kind(), kind);
        }
        assert_eq!(RoleKind::parse("villager"), Some(RoleKind::Town));
        assert_eq!(RoleKind::parse("godfather"), None);
    }

    #[test]
    fn test_teams() {
        assert_eq!(RoleKind::Mafia.team(), Team::Mafia);
        assert_eq!(RoleKind::Doctor.team(), Team::Town);
        assert_eq!(RoleKind::Jester.team(), Team::ThirdParty);
    }

    #[test]
    fn test_faction_hides_third_party() {
        assert_eq!(Faction::of(Team::Mafia), Faction::Mafia);
        assert_eq!(Faction::of(Team::ThirdParty), Faction::Town);
    }

    #[test]
    fn test_role_serialization_is_tagged() {
        let role = Role::Vigilante { bullet_used: true };
        let json = serde_json::to_value(&role).unwrap();
        assert_eq!(json["kind"], "vigilante");
        assert_eq!(json["bullet_used"], true);

        let parsed: Role = serde_json::from_str(r#"{"kind":"doctor"}"#).unwrap();
        assert_eq!(parsed, Role::Doctor { last_protected: None });
    }

    #[test]
    fn test_private_history() {
        let role = Role::Sheriff {
            investigations: vec![Investigation {
                target: "Bob".to_string(),
                faction: Faction::Mafia,
            }],
        };
        assert_eq!(role.private_history(), vec!["You investigated Bob: MAFIA"]);
        assert!(Role::Town.private_history().is_empty());
    }
}
