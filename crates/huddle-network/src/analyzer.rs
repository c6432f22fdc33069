//! Match-level orchestration: batch analysis, the unfiltered live view and
//! ad-hoc range density.
//!
//! The pure functions ([`batch_records`], [`live_records`],
//! [`range_density`]) do the work over an in-memory event slice.
//! [`NetworkAnalyzer`] wires them to a store.

use anyhow::{Context, Result};
use huddle_core::model::{CATALOGUE, MetricRecord, SpeechEvent, TransitionPattern};
use huddle_core::store::{EventSource, MetricSink, MetricSource};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::edges::{Edge, extract_edges};
use crate::metrics::{compute_metrics, density};
use crate::window::Windows;

/// Outcome of one batch analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnalysisSummary {
    pub match_id: i64,
    pub events: usize,
    pub windows: u32,
    pub records: usize,
}

// ---------------------------------------------------------------------------
// Pure computation
// ---------------------------------------------------------------------------

/// One record per (window, catalogue pattern), windows ascending and
/// patterns in catalogue order. Empty input yields no records.
#[must_use]
pub fn batch_records(match_id: i64, events: &[SpeechEvent]) -> Vec<MetricRecord> {
    let windows = Windows::partition(events);
    let span = usize::try_from(windows.span()).unwrap_or(0);
    let mut records = Vec::with_capacity(span * CATALOGUE.len());
    for (index, bucket) in windows.iter() {
        for pattern in CATALOGUE {
            let edges = extract_edges(bucket, pattern);
            records.push(compute_metrics(&edges).into_record(match_id, index, pattern));
        }
    }
    records
}

/// One unfiltered record per window; `count` is the window's utterance
/// count rather than its edge count.
#[must_use]
pub fn live_records(match_id: i64, events: &[SpeechEvent]) -> Vec<MetricRecord> {
    Windows::partition(events)
        .iter()
        .map(|(index, bucket)| {
            let edges = extract_edges(bucket, TransitionPattern::Any);
            let mut record =
                compute_metrics(&edges).into_record(match_id, index, TransitionPattern::Any);
            record.count = u32::try_from(bucket.len()).unwrap_or(u32::MAX);
            record
        })
        .collect()
}

/// Density of the distinct edges among events whose start second lies in
/// `[start_sec, end_sec]`, clamped to `1.0`. A missing bound or
/// `start_sec >= end_sec` yields `0.0`.
#[must_use]
pub fn range_density(
    events: &[SpeechEvent],
    start_sec: Option<i64>,
    end_sec: Option<i64>,
    pattern: TransitionPattern,
) -> f64 {
    let Some((start, end)) = valid_range(start_sec, end_sec) else {
        return 0.0;
    };
    let in_range: Vec<&SpeechEvent> = events
        .iter()
        .filter(|e| {
            let sec = i64::try_from(e.start_sec()).unwrap_or(i64::MAX);
            (start..=end).contains(&sec)
        })
        .collect();

    let mut edges: Vec<Edge> = extract_edges(&in_range, pattern);
    edges.sort_unstable();
    edges.dedup();
    density(edges.len()).min(1.0)
}

/// Both bounds with `start_sec < end_sec`, or `None` for a range that
/// always scores `0.0`.
#[must_use]
pub const fn valid_range(start_sec: Option<i64>, end_sec: Option<i64>) -> Option<(i64, i64)> {
    match (start_sec, end_sec) {
        (Some(start), Some(end)) if start < end => Some((start, end)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Store-backed analyzer
// ---------------------------------------------------------------------------

/// Metric engine bound to a store.
#[derive(Debug)]
pub struct NetworkAnalyzer<S> {
    store: S,
}

impl<S> NetworkAnalyzer<S> {
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    #[must_use]
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S: EventSource> NetworkAnalyzer<S> {
    fn load_events(&self, match_id: i64) -> Result<Vec<SpeechEvent>> {
        let mut events = self
            .store
            .speech_events(match_id)
            .with_context(|| format!("load speech events of match {match_id}"))?;
        events.sort_by_key(|e| e.start_ms);
        Ok(events)
    }

    /// Unfiltered per-window view computed on demand; never touches stored
    /// records.
    ///
    /// # Errors
    ///
    /// Returns an error if the events cannot be loaded.
    #[instrument(skip(self))]
    pub fn calculated_all_metrics(&self, match_id: i64) -> Result<Vec<MetricRecord>> {
        let events = self.load_events(match_id)?;
        let records = live_records(match_id, &events);
        debug!(events = events.len(), windows = records.len(), "live view computed");
        Ok(records)
    }

    /// Density over an arbitrary span of seconds.
    ///
    /// # Errors
    ///
    /// Returns an error if the events cannot be loaded. A malformed range
    /// returns `0.0` without reading the store.
    #[instrument(skip(self))]
    pub fn calculate_range_density(
        &self,
        match_id: i64,
        start_sec: Option<i64>,
        end_sec: Option<i64>,
        pattern: TransitionPattern,
    ) -> Result<f64> {
        if valid_range(start_sec, end_sec).is_none() {
            debug!("empty or inverted range");
            return Ok(0.0);
        }
        let events = self.load_events(match_id)?;
        Ok(range_density(&events, start_sec, end_sec, pattern))
    }
}

impl<S: EventSource + MetricSink> NetworkAnalyzer<S> {
    /// Recompute every (window, catalogue pattern) record of a match and
    /// replace the stored set in one atomic write.
    ///
    /// # Errors
    ///
    /// Returns an error if the events cannot be loaded or the replacement
    /// fails; in the latter case the previous record set is still stored.
    #[instrument(skip(self))]
    pub fn analyze_and_save_metrics(&mut self, match_id: i64) -> Result<AnalysisSummary> {
        let events = self.load_events(match_id)?;
        let records = batch_records(match_id, &events);

        self.store
            .replace_match_metrics(match_id, &records)
            .with_context(|| format!("replace metric records of match {match_id}"))?;

        let summary = AnalysisSummary {
            match_id,
            events: events.len(),
            windows: Windows::partition(&events).span(),
            records: records.len(),
        };
        info!(
            events = summary.events,
            windows = summary.windows,
            records = summary.records,
            "match analyzed"
        );
        Ok(summary)
    }
}

impl<S: EventSource + MetricSource> NetworkAnalyzer<S> {
    /// Records for one pattern: stored batch output for catalogue patterns,
    /// the live view for [`TransitionPattern::Any`].
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    #[instrument(skip(self))]
    pub fn metrics_for_pattern(
        &self,
        match_id: i64,
        pattern: TransitionPattern,
    ) -> Result<Vec<MetricRecord>> {
        if pattern.is_any() {
            return self.calculated_all_metrics(match_id);
        }
        self.store
            .stored_metrics(match_id, Some(pattern))
            .with_context(|| format!("load {pattern} metrics of match {match_id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huddle_core::model::{ActCode, Role, Speaker};
    use huddle_core::store::MemoryStore;

    use crate::window::MAX_WINDOWS;

    fn said(player_id: i64, role: Role, act: u8, start_ms: u64) -> SpeechEvent {
        SpeechEvent::new(
            Some(Speaker::new(player_id, role)),
            Some(ActCode(act)),
            start_ms,
            start_ms + 300,
        )
    }

    #[test]
    fn batch_covers_every_window_and_pattern() {
        let events = vec![said(1, Role::Top, 0, 0), said(2, Role::Jug, 1, 25_000)];
        let records = batch_records(5, &events);
        assert_eq!(records.len(), 3 * CATALOGUE.len());
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.window_index as usize, i / CATALOGUE.len());
            assert_eq!(record.pattern, CATALOGUE[i % CATALOGUE.len()]);
            assert_eq!(record.match_id, 5);
        }
    }

    #[test]
    fn corrupt_start_does_not_blow_up_the_batch() {
        let events = vec![said(1, Role::Top, 1, 0), said(2, Role::Jug, 0, u64::MAX - 300)];
        assert_eq!(batch_records(5, &events).len(), CATALOGUE.len());
        assert_eq!(live_records(5, &events).len(), 1);

        let last_ms = u64::from(MAX_WINDOWS - 1) * 10_000;
        let events = vec![said(1, Role::Top, 1, 0), said(2, Role::Jug, 0, last_ms)];
        assert_eq!(batch_records(5, &events).len(), MAX_WINDOWS as usize * CATALOGUE.len());
    }

    #[test]
    fn live_view_counts_utterances() {
        let events = vec![
            said(1, Role::Top, 0, 0),
            said(1, Role::Top, 0, 500),
            said(2, Role::Mid, 0, 900),
        ];
        let records = live_records(1, &events);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].count, 3);
        assert_eq!(records[0].pattern, TransitionPattern::Any);
        assert!((records[0].density - 0.1).abs() < 1e-12);
    }

    #[test]
    fn range_bounds() {
        let events = vec![
            said(1, Role::Top, 0, 4_999),
            said(2, Role::Jug, 0, 5_000),
            said(3, Role::Mid, 0, 9_999),
            said(4, Role::Adc, 0, 10_000),
        ];
        // seconds 4, 5, 9, 10; [5, 9] keeps JUG and MID only
        let d = range_density(&events, Some(5), Some(9), TransitionPattern::Any);
        assert!((d - 0.1).abs() < 1e-12);
        assert!(range_density(&events, Some(9), Some(9), TransitionPattern::Any).abs() < 1e-12);
        assert!(range_density(&events, None, Some(9), TransitionPattern::Any).abs() < 1e-12);
        assert!(range_density(&events, Some(5), None, TransitionPattern::Any).abs() < 1e-12);
    }

    #[test]
    fn range_density_is_clamped() {
        // every ordered pair of distinct roles: 20 distinct edges
        let mut events = Vec::new();
        let mut t = 0;
        let roles = huddle_core::model::ROLES;
        for (i, &a) in roles.iter().enumerate() {
            for (j, &b) in roles.iter().enumerate() {
                if i == j {
                    continue;
                }
                events.push(said(i64::try_from(i).expect("id"), a, 0, t));
                events.push(said(i64::try_from(j).expect("id"), b, 0, t + 1));
                t += 2;
            }
        }
        let d = range_density(&events, Some(0), Some(1_000), TransitionPattern::Any);
        assert!((d - 1.0).abs() < 1e-12);
    }

    #[test]
    fn malformed_range_skips_store() {
        let mut store = MemoryStore::new();
        store.insert_events(1, vec![said(1, Role::Top, 0, 0), said(2, Role::Jug, 1, 100)]);
        let analyzer = NetworkAnalyzer::new(store);
        let d = analyzer
            .calculate_range_density(1, Some(10), Some(5), TransitionPattern::Any)
            .expect("range");
        assert!(d.abs() < 1e-12);
    }

    #[test]
    fn any_pattern_routes_to_live_view() {
        let mut store = MemoryStore::new();
        store.insert_events(1, vec![said(1, Role::Top, 1, 0), said(2, Role::Jug, 0, 100)]);
        let mut analyzer = NetworkAnalyzer::new(store);
        analyzer.analyze_and_save_metrics(1).expect("analyze");

        let live = analyzer
            .metrics_for_pattern(1, TransitionPattern::Any)
            .expect("live");
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].count, 2);

        let stored = analyzer
            .metrics_for_pattern(1, TransitionPattern::acts(1, 0))
            .expect("stored");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].count, 1);
    }
}
