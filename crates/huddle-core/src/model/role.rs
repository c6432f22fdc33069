use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The five fixed in-game positions a speaker can occupy for a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Top,
    Jug,
    Mid,
    Adc,
    Sup,
}

/// Every role, in the canonical order used for tallies, centralization and
/// the persisted `ROLE:count` form.
pub const ROLES: [Role; 5] = [Role::Top, Role::Jug, Role::Mid, Role::Adc, Role::Sup];

impl Role {
    /// Short tag as stored and displayed (`TOP`, `JUG`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "TOP",
            Self::Jug => "JUG",
            Self::Mid => "MID",
            Self::Adc => "ADC",
            Self::Sup => "SUP",
        }
    }

    /// Position of this role in [`ROLES`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Top => 0,
            Self::Jug => 1,
            Self::Mid => 2,
            Self::Adc => 3,
            Self::Sup => 4,
        }
    }
}

/// Error returned when a position string is not one of the five roles.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid role: '{got}'")]
pub struct ParseRoleError {
    pub got: String,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseRoleError;

    /// Accepts the short tags and the long client position names
    /// (`JUNGLE`, `MIDDLE`, `BOTTOM`, `UTILITY`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "TOP" => Ok(Self::Top),
            "JUG" | "JUNGLE" => Ok(Self::Jug),
            "MID" | "MIDDLE" => Ok(Self::Mid),
            "ADC" | "BOTTOM" => Ok(Self::Adc),
            "SUP" | "UTILITY" => Ok(Self::Sup),
            _ => Err(ParseRoleError { got: s.to_string() }),
        }
    }
}
