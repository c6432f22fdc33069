use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::{fmt, str::FromStr};

use super::pattern::TransitionPattern;
use super::role::{ROLES, Role};

/// Per-role counter that always covers all five roles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RoleTally([u32; 5]);

impl RoleTally {
    #[must_use]
    pub const fn new() -> Self {
        Self([0; 5])
    }

    #[must_use]
    pub const fn get(&self, role: Role) -> u32 {
        self.0[role.index()]
    }

    pub fn increment(&mut self, role: Role) {
        self.0[role.index()] += 1;
    }

    pub fn set(&mut self, role: Role, count: u32) {
        self.0[role.index()] = count;
    }

    /// Largest count across the five roles.
    #[must_use]
    pub fn max(&self) -> u32 {
        self.0.iter().copied().max().unwrap_or(0)
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }

    /// `(role, count)` pairs in [`ROLES`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Role, u32)> + '_ {
        ROLES.iter().map(|&role| (role, self.get(role)))
    }
}

/// Formats as the persisted `TOP:1,JUG:0,MID:0,ADC:0,SUP:0` form.
impl fmt::Display for RoleTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (role, count)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{role}:{count}")?;
        }
        Ok(())
    }
}

/// Error returned when a persisted tally string is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid role tally '{input}': {reason}")]
pub struct ParseTallyError {
    pub input: String,
    pub reason: &'static str,
}

impl FromStr for RoleTally {
    type Err = ParseTallyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fail = |reason| ParseTallyError {
            input: s.to_string(),
            reason,
        };
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != ROLES.len() {
            return Err(fail("expected five ROLE:count entries"));
        }

        let mut tally = Self::new();
        for (part, expected) in parts.into_iter().zip(ROLES) {
            let (tag, count) = part.split_once(':').ok_or_else(|| fail("missing ':'"))?;
            let role: Role = tag.parse().map_err(|_| fail("unknown role"))?;
            if role != expected {
                return Err(fail("roles out of order"));
            }
            let count: u32 = count.trim().parse().map_err(|_| fail("count is not a number"))?;
            tally.set(role, count);
        }
        Ok(tally)
    }
}

impl Serialize for RoleTally {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(ROLES.len()))?;
        for (role, count) in self.iter() {
            map.serialize_entry(role.as_str(), &count)?;
        }
        map.end()
    }
}

/// One computed coordination summary for a (match, window, pattern) tuple.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRecord {
    pub match_id: i64,
    pub window_index: u32,
    #[serde(flatten)]
    pub pattern: TransitionPattern,
    /// Edge count in batch records; utterance count in the live view.
    pub count: u32,
    pub density: f64,
    pub out_centralization: f64,
    pub in_centralization: f64,
    pub out_tally: RoleTally,
    pub in_tally: RoleTally,
}
