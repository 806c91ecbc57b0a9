use serde::{Deserialize, Serialize};

use super::role::{Role, RoleKind, Team};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Player {
    pub name: String,
    /// Reasoning-service model identifier driving this player.
    pub model: String,
    pub role: Role,
    pub alive: bool,
    /// Private strategy notes, newest last.
    #[serde(default)]
    pub notes: Vec<String>,
}

impl Player {
    pub fn new(name: impl Into<String>, model: impl Into<String>, kind: RoleKind) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            role: Role::new(kind),
            alive: true,
            notes: Vec::new(),
        }
    }

    pub fn team(&self) -> Team {
        self.role.team()
    }

    pub fn kind(&self) -> RoleKind {
        self.role.kind()
    }

    pub fn is_mafia(&self) -> bool {
        self.team() == Team::Mafia
    }

    /// Marks the player dead. Returns false if they were already dead;
    /// death is never reverted.
    pub fn kill(&mut self) -> bool {
        let was_alive = self.alive;
        self.alive = false;
        was_alive
    }
}

/// Lookup helpers over an ordered roster.
pub trait Roster {
    fn player(&self, name: &str) -> Option<&Player>;
    fn player_mut(&mut self, name: &str) -> Option<&mut Player>;
    fn alive(&self) -> Vec<&Player>;
    fn alive_names(&self) -> Vec<String>;
    fn has_alive(&self, kind: RoleKind) -> bool;
}

impl Roster for [Player] {
    fn player(&self, name: &str) -> Option<&Player> {
        self.iter().find(|p| p.name == name)
    }

    fn player_mut(&mut self, name: &str) -> Option<&mut Player> {
        self.iter_mut().find(|p| p.name == name)
    }

    fn alive(&self) -> Vec<&Player> {
        self.iter().filter(|p| p.alive).collect()
    }

    fn alive_names(&self) -> Vec<String> {
        self.iter()
            .filter(|p| p.alive)
            .map(|p| p.name.clone())
            .collect()
    }

    fn has_alive(&self, kind: RoleKind) -> bool {
        self.iter().any(|p| p.alive && p.kind() == kind)
    }
}
