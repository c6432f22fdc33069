//! Dialogue-act transition patterns.
//!
//! A pattern selects which consecutive utterance pairs count as an edge.
//! [`TransitionPattern::Any`] accepts every pair; it is represented on the
//! wire and in storage as the sentinel code pair `(-1, -1)` and nowhere else.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;

use super::act::ActCode;

/// Wire/storage sentinel for the "any transition" pattern.
pub const ANY_CODE: i32 = -1;

/// Which dialogue-act transitions are counted as conversational edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionPattern {
    /// Every consecutive pair, regardless of dialogue acts.
    Any,
    /// Pairs whose first utterance has act `source` and second has `target`.
    Acts { source: ActCode, target: ActCode },
}

/// The fixed catalogue analysed and persisted for every window, in
/// persistence order. [`TransitionPattern::Any`] is deliberately absent.
pub const CATALOGUE: [TransitionPattern; 6] = [
    TransitionPattern::acts(1, 0),
    TransitionPattern::acts(2, 3),
    TransitionPattern::acts(0, 0),
    TransitionPattern::acts(0, 1),
    TransitionPattern::acts(0, 2),
    TransitionPattern::acts(3, 0),
];

/// Error returned for code pairs that name neither a concrete pattern nor
/// the `(-1, -1)` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid transition pattern ({source_da}, {target_da}): use two codes in 0..=255 or -1 -1")]
pub struct PatternError {
    pub source_da: i32,
    pub target_da: i32,
}

impl TransitionPattern {
    #[must_use]
    pub const fn acts(source: u8, target: u8) -> Self {
        Self::Acts {
            source: ActCode(source),
            target: ActCode(target),
        }
    }

    /// Build a pattern from raw codes as they appear in storage and requests.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] when only one code is the sentinel or a code
    /// is otherwise out of range.
    pub fn from_codes(source_da: i32, target_da: i32) -> Result<Self, PatternError> {
        if source_da == ANY_CODE && target_da == ANY_CODE {
            return Ok(Self::Any);
        }
        let err = PatternError {
            source_da,
            target_da,
        };
        let source = u8::try_from(source_da).map_err(|_| err)?;
        let target = u8::try_from(target_da).map_err(|_| err)?;
        Ok(Self::acts(source, target))
    }

    /// Raw `(source, target)` codes, `(-1, -1)` for [`Self::Any`].
    #[must_use]
    pub fn codes(self) -> (i32, i32) {
        match self {
            Self::Any => (ANY_CODE, ANY_CODE),
            Self::Acts { source, target } => (i32::from(source.0), i32::from(target.0)),
        }
    }

    #[must_use]
    pub const fn is_any(self) -> bool {
        matches!(self, Self::Any)
    }

    /// Whether the pair `(current, next)` is a candidate transition.
    ///
    /// Unknown acts never match a concrete pattern.
    #[must_use]
    pub fn matches(self, current: Option<ActCode>, next: Option<ActCode>) -> bool {
        match self {
            Self::Any => true,
            Self::Acts { source, target } => current == Some(source) && next == Some(target),
        }
    }
}

impl fmt::Display for TransitionPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Acts { source, target } => {
                write!(f, "{}->{}", source.label(), target.label())?;
                if source.label() == "UNK" || target.label() == "UNK" {
                    write!(f, " ({source},{target})")?;
                }
                Ok(())
            }
        }
    }
}

impl Serialize for TransitionPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (source_da, target_da) = self.codes();
        let mut state = serializer.serialize_struct("TransitionPattern", 2)?;
        state.serialize_field("source_da", &source_da)?;
        state.serialize_field("target_da", &target_da)?;
        state.end()
    }
}
