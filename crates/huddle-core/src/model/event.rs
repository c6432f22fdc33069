use serde::{Deserialize, Serialize};

use super::{act::ActCode, role::Role};

/// The individual behind an utterance and the role they play this match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Speaker {
    pub player_id: i64,
    pub role: Role,
}

impl Speaker {
    #[must_use]
    pub const fn new(player_id: i64, role: Role) -> Self {
        Self { player_id, role }
    }
}

/// One timestamped utterance from a match's voice log.
///
/// Times are milliseconds from match start. Sequences handed to the
/// engine are sorted ascending by `start_ms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechEvent {
    /// `None` when the utterance could not be attributed to a player.
    pub speaker: Option<Speaker>,
    /// `None` when the dialogue act is unknown.
    pub act: Option<ActCode>,
    pub start_ms: u64,
    pub end_ms: u64,
    #[serde(default)]
    pub text: String,
}

impl SpeechEvent {
    #[must_use]
    pub fn new(speaker: Option<Speaker>, act: Option<ActCode>, start_ms: u64, end_ms: u64) -> Self {
        Self {
            speaker,
            act,
            start_ms,
            end_ms,
            text: String::new(),
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Role of the speaker, if attributed.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.speaker.map(|s| s.role)
    }

    /// Start time truncated to whole seconds.
    #[must_use]
    pub const fn start_sec(&self) -> u64 {
        self.start_ms / 1000
    }
}
