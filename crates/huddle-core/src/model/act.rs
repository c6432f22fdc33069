use serde::{Deserialize, Serialize};
use std::fmt;

/// A dialogue-act code classifying an utterance's communicative function.
///
/// Codes `0..=3` carry the labels `I` (inform), `Q` (question),
/// `D` (directive) and `C` (confirm). Larger codes are valid but unlabeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActCode(pub u8);

impl ActCode {
    pub const INFORM: Self = Self(0);
    pub const QUESTION: Self = Self(1);
    pub const DIRECTIVE: Self = Self(2);
    pub const CONFIRM: Self = Self(3);

    /// One-letter label, or `UNK` for codes outside `0..=3`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self.0 {
            0 => "I",
            1 => "Q",
            2 => "D",
            3 => "C",
            _ => "UNK",
        }
    }

    /// Interpret a raw integer code; negative or oversized values have no code.
    #[must_use]
    pub fn from_raw(raw: i64) -> Option<Self> {
        u8::try_from(raw).ok().map(Self)
    }
}

impl fmt::Display for ActCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
