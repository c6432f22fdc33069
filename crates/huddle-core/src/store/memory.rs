use std::collections::HashMap;

use anyhow::{Result, bail};

use super::{EventSource, MetricSink, MetricSource};
use crate::model::{MetricRecord, SpeechEvent, TransitionPattern};

/// In-process store keeping events and metric records in hash maps.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    events: HashMap<i64, Vec<SpeechEvent>>,
    metrics: HashMap<i64, Vec<MetricRecord>>,
    fail_writes: bool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `events` for `match_id`, replacing any previous log. Events are
    /// kept sorted by start time (stable, so ties keep their given order).
    pub fn insert_events(&mut self, match_id: i64, mut events: Vec<SpeechEvent>) {
        events.sort_by_key(|e| e.start_ms);
        self.events.insert(match_id, events);
    }

    /// Make every subsequent [`MetricSink`] call fail without side effects.
    pub const fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }
}

impl EventSource for MemoryStore {
    fn speech_events(&self, match_id: i64) -> Result<Vec<SpeechEvent>> {
        Ok(self.events.get(&match_id).cloned().unwrap_or_default())
    }
}

impl MetricSink for MemoryStore {
    fn replace_match_metrics(&mut self, match_id: i64, records: &[MetricRecord]) -> Result<()> {
        if self.fail_writes {
            bail!("memory store is read-only (match {match_id})");
        }
        if records.is_empty() {
            self.metrics.remove(&match_id);
        } else {
            self.metrics.insert(match_id, records.to_vec());
        }
        Ok(())
    }
}

impl MetricSource for MemoryStore {
    fn stored_metrics(
        &self,
        match_id: i64,
        pattern: Option<TransitionPattern>,
    ) -> Result<Vec<MetricRecord>> {
        let records = self.metrics.get(&match_id).map_or_else(Vec::new, |records| {
            records
                .iter()
                .filter(|r| pattern.is_none_or(|p| r.pattern == p))
                .cloned()
                .collect()
        });
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RoleTally, Role, Speaker};

    fn record(match_id: i64, window_index: u32, pattern: TransitionPattern) -> MetricRecord {
        MetricRecord {
            match_id,
            window_index,
            pattern,
            count: 0,
            density: 0.0,
            out_centralization: 0.0,
            in_centralization: 0.0,
            out_tally: RoleTally::new(),
            in_tally: RoleTally::new(),
        }
    }

    #[test]
    fn events_come_back_sorted() {
        let mut store = MemoryStore::new();
        let speaker = Some(Speaker::new(1, Role::Top));
        store.insert_events(
            3,
            vec![
                SpeechEvent::new(speaker, None, 5_000, 5_500),
                SpeechEvent::new(speaker, None, 1_000, 1_200),
            ],
        );
        let events = store.speech_events(3).expect("read");
        assert_eq!(events[0].start_ms, 1_000);
        assert_eq!(events[1].start_ms, 5_000);
        assert!(store.speech_events(4).expect("read").is_empty());
    }

    #[test]
    fn replace_discards_previous_records() {
        let mut store = MemoryStore::new();
        store
            .replace_match_metrics(1, &[record(1, 0, TransitionPattern::acts(1, 0))])
            .expect("first write");
        store
            .replace_match_metrics(1, &[record(1, 4, TransitionPattern::acts(0, 1))])
            .expect("second write");

        let all = store.stored_metrics(1, None).expect("read");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].window_index, 4);

        store.replace_match_metrics(1, &[]).expect("clear");
        assert!(store.stored_metrics(1, None).expect("read").is_empty());
    }

    #[test]
    fn failed_write_keeps_previous_records() {
        let mut store = MemoryStore::new();
        store
            .replace_match_metrics(1, &[record(1, 0, TransitionPattern::acts(1, 0))])
            .expect("first write");
        store.set_fail_writes(true);
        assert!(store.replace_match_metrics(1, &[]).is_err());
        assert_eq!(store.stored_metrics(1, None).expect("read").len(), 1);
    }

    #[test]
    fn pattern_filter_applies() {
        let mut store = MemoryStore::new();
        store
            .replace_match_metrics(
                2,
                &[
                    record(2, 0, TransitionPattern::acts(1, 0)),
                    record(2, 0, TransitionPattern::acts(2, 3)),
                    record(2, 1, TransitionPattern::acts(1, 0)),
                ],
            )
            .expect("write");
        let filtered = store
            .stored_metrics(2, Some(TransitionPattern::acts(1, 0)))
            .expect("read");
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|r| r.pattern == TransitionPattern::acts(1, 0)));
    }
}
