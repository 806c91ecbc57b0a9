use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Night,
    Day,
    Postgame,
    /// Terminal phase. The event log rejects appends once reached.
    Ended,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Night => "night",
            Self::Day => "day",
            Self::Postgame => "postgame",
            Self::Ended => "ended",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "night" => Some(Self::Night),
            "day" => Some(Self::Day),
            "postgame" => Some(Self::Postgame),
            "ended" => Some(Self::Ended),
            _ => None,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
