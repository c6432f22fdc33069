use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;

use super::query::{self, MatchSummary, PlayerRow};
use crate::import::ParsedMatch;
use crate::model::{MetricRecord, SpeechEvent, TransitionPattern};
use crate::store::{EventSource, MetricSink, MetricSource};

/// SQLite-backed implementation of the storage traits.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            conn: super::open_store(path)?,
        })
    }

    /// Open a fresh, migrated in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if migration fails.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: super::open_in_memory()?,
        })
    }

    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Persist a parsed match and return its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the import transaction fails.
    #[tracing::instrument(skip(self, parsed), fields(match_code = %parsed.match_code))]
    pub fn insert_match(&mut self, parsed: &ParsedMatch) -> Result<i64> {
        query::insert_match(&mut self.conn, parsed)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn match_exists(&self, match_id: i64) -> Result<bool> {
        query::match_exists(&self.conn, match_id)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_match(&self, match_id: i64) -> Result<Option<MatchSummary>> {
        query::get_match(&self.conn, match_id)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_matches(&self) -> Result<Vec<MatchSummary>> {
        query::list_matches(&self.conn)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails or a stored role does not parse.
    pub fn players(&self, match_id: i64) -> Result<Vec<PlayerRow>> {
        query::load_players(&self.conn, match_id)
    }
}

impl EventSource for SqliteStore {
    fn speech_events(&self, match_id: i64) -> Result<Vec<SpeechEvent>> {
        query::load_speech_events(&self.conn, match_id)
    }
}

impl MetricSink for SqliteStore {
    fn replace_match_metrics(&mut self, match_id: i64, records: &[MetricRecord]) -> Result<()> {
        query::replace_metric_records(&mut self.conn, match_id, records)
    }
}

impl MetricSource for SqliteStore {
    fn stored_metrics(
        &self,
        match_id: i64,
        pattern: Option<TransitionPattern>,
    ) -> Result<Vec<MetricRecord>> {
        query::load_metric_records(&self.conn, match_id, pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{PlayerInfo, Utterance};
    use crate::model::{ActCode, Role, RoleTally};

    #[test]
    fn traits_round_through_sqlite() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("huddle.db");

        let match_id = {
            let mut store = SqliteStore::open(&path).expect("open");
            let parsed = ParsedMatch {
                match_code: "scrim".to_string(),
                duration_ms: 0,
                players: vec![PlayerInfo {
                    in_game_id: 4,
                    team: "red".to_string(),
                    summoner_name: "adc".to_string(),
                    role: Some(Role::Adc),
                }],
                utterances: vec![Utterance {
                    in_game_id: Some(4),
                    act: Some(ActCode::INFORM),
                    start_ms: 0,
                    end_ms: 400,
                    text: "ult up".to_string(),
                }],
            };
            let id = store.insert_match(&parsed).expect("insert");
            store
                .replace_match_metrics(
                    id,
                    &[MetricRecord {
                        match_id: id,
                        window_index: 0,
                        pattern: TransitionPattern::acts(1, 0),
                        count: 0,
                        density: 0.0,
                        out_centralization: 0.0,
                        in_centralization: 0.0,
                        out_tally: RoleTally::new(),
                        in_tally: RoleTally::new(),
                    }],
                )
                .expect("replace");
            id
        };

        let store = SqliteStore::open(&path).expect("reopen");
        assert!(store.match_exists(match_id).expect("exists"));
        let events = store.speech_events(match_id).expect("events");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].role(), Some(Role::Adc));
        let stored = store.stored_metrics(match_id, None).expect("metrics");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].out_tally, RoleTally::new());
        assert_eq!(store.list_matches().expect("list").len(), 1);
        assert_eq!(store.players(match_id).expect("players")[0].summoner_name, "adc");
    }
}
