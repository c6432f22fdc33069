//! Turn-taking edges between roles.
//!
//! An edge `A → B` records that a player in role `B` spoke right after a
//! different player in role `A`, and that the pair of utterances matched
//! the requested dialogue-act transition.

use std::fmt;

use huddle_core::model::{Role, SpeechEvent, TransitionPattern};
use serde::Serialize;

/// One observed hand-off of the conversational turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Edge {
    pub from: Role,
    pub to: Role,
}

impl Edge {
    #[must_use]
    pub const fn new(from: Role, to: Role) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

/// Edge between two consecutive utterances, if they form a valid
/// interaction: both attributed, spoken by different players.
///
/// Two players sharing a role still interact; only the same `player_id`
/// on both sides is rejected.
#[must_use]
pub fn interaction(current: &SpeechEvent, next: &SpeechEvent) -> Option<Edge> {
    let (a, b) = (current.speaker?, next.speaker?);
    (a.player_id != b.player_id).then(|| Edge::new(a.role, b.role))
}

/// Scan consecutive pairs of `events` (chronological) and emit one edge per
/// pair matching `pattern` that is also a valid interaction. Duplicates are
/// kept.
#[must_use]
pub fn extract_edges(events: &[&SpeechEvent], pattern: TransitionPattern) -> Vec<Edge> {
    events
        .windows(2)
        .filter(|pair| pattern.matches(pair[0].act, pair[1].act))
        .filter_map(|pair| interaction(pair[0], pair[1]))
        .collect()
}
