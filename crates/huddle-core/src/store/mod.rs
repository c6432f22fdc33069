//! Storage boundary between the metric engine and its collaborators.
//!
//! The engine reads a match's speech events through [`EventSource`] and
//! writes its batch output through [`MetricSink`]. A sink replaces a match's
//! whole record set in one atomic step: readers observe either the previous
//! complete set or the new one, never a mix.
//!
//! Two implementations ship with the crate: [`MemoryStore`] for tests and
//! embedding, and [`crate::db::SqliteStore`] for the CLI.

pub mod memory;

use anyhow::Result;

use crate::model::{MetricRecord, SpeechEvent, TransitionPattern};

pub use memory::MemoryStore;

/// Read access to a match's voice log.
pub trait EventSource {
    /// All speech events for `match_id`, sorted ascending by start time.
    /// Unknown matches yield an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn speech_events(&self, match_id: i64) -> Result<Vec<SpeechEvent>>;
}

/// Write access for batch metric output.
pub trait MetricSink {
    /// Atomically discard every stored record for `match_id` and store
    /// `records` in their place. An empty slice leaves the match with no
    /// records.
    ///
    /// # Errors
    ///
    /// Returns an error if the replacement could not be committed; the
    /// previous record set must then still be intact.
    fn replace_match_metrics(&mut self, match_id: i64, records: &[MetricRecord]) -> Result<()>;
}

/// Read access to persisted batch output.
pub trait MetricSource {
    /// Stored records for `match_id`, optionally restricted to one pattern,
    /// ordered by window index and then by catalogue order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read or holds rows
    /// that do not decode.
    fn stored_metrics(
        &self,
        match_id: i64,
        pattern: Option<TransitionPattern>,
    ) -> Result<Vec<MetricRecord>>;
}
