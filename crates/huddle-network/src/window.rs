//! Fixed-length time windows over a match's voice log.

use std::collections::BTreeMap;

use huddle_core::model::SpeechEvent;
use tracing::warn;

/// Length of one analysis window in milliseconds.
pub const WINDOW_MS: u64 = 10_000;

/// Upper bound on the windows of one match: a full day of speech.
pub const MAX_WINDOWS: u32 = 8_641;

/// Window index an event starting at `start_ms` falls into.
#[must_use]
pub fn window_index(start_ms: u64) -> u32 {
    u32::try_from(start_ms / WINDOW_MS).unwrap_or(u32::MAX)
}

/// Events bucketed by window index, each bucket in input order.
///
/// Only non-empty windows are stored; [`Windows::iter`] still yields every
/// index from zero up to the last observed one.
#[derive(Debug, Default, Clone)]
pub struct Windows<'a> {
    buckets: BTreeMap<u32, Vec<&'a SpeechEvent>>,
}

impl<'a> Windows<'a> {
    /// Bucket `events`, which must already be sorted by start time. Events
    /// past [`MAX_WINDOWS`] are left out so [`Windows::span`] stays bounded.
    #[must_use]
    pub fn partition(events: &'a [SpeechEvent]) -> Self {
        let mut buckets: BTreeMap<u32, Vec<&'a SpeechEvent>> = BTreeMap::new();
        let mut dropped = 0_usize;
        for event in events {
            let index = window_index(event.start_ms);
            if index >= MAX_WINDOWS {
                dropped += 1;
                continue;
            }
            buckets.entry(index).or_default().push(event);
        }
        if dropped > 0 {
            warn!(dropped, max_windows = MAX_WINDOWS, "ignoring events past the last window");
        }
        Self { buckets }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Highest window index holding an event.
    #[must_use]
    pub fn last_index(&self) -> Option<u32> {
        self.buckets.keys().next_back().copied()
    }

    /// Number of windows downstream analysis covers (`0..=last_index`).
    #[must_use]
    pub fn span(&self) -> u32 {
        self.last_index().map_or(0, |last| last.saturating_add(1))
    }

    /// Events of window `index`; empty for windows with no speech.
    #[must_use]
    pub fn events(&self, index: u32) -> &[&'a SpeechEvent] {
        self.buckets
            .get(&index)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every window from zero through the last observed index, empty ones
    /// included.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[&'a SpeechEvent])> + '_ {
        self.last_index()
            .into_iter()
            .flat_map(move |last| (0..=last).map(move |index| (index, self.events(index))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(start_ms: u64) -> SpeechEvent {
        SpeechEvent::new(None, None, start_ms, start_ms + 100)
    }

    #[test]
    fn index_is_floor_of_start() {
        assert_eq!(window_index(0), 0);
        assert_eq!(window_index(9_999), 0);
        assert_eq!(window_index(10_000), 1);
        assert_eq!(window_index(25_500), 2);
    }

    #[test]
    fn iter_covers_gaps() {
        let events = vec![at(500), at(1_500), at(31_000)];
        let windows = Windows::partition(&events);

        assert_eq!(windows.last_index(), Some(3));
        assert_eq!(windows.span(), 4);
        let sizes: Vec<(u32, usize)> = windows.iter().map(|(i, e)| (i, e.len())).collect();
        assert_eq!(sizes, vec![(0, 2), (1, 0), (2, 0), (3, 1)]);
    }

    #[test]
    fn empty_input_has_no_windows() {
        let windows = Windows::partition(&[]);
        assert!(windows.is_empty());
        assert_eq!(windows.last_index(), None);
        assert_eq!(windows.span(), 0);
        assert_eq!(windows.iter().count(), 0);
    }

    #[test]
    fn span_is_capped_for_far_future_starts() {
        let last_ms = u64::from(MAX_WINDOWS - 1) * WINDOW_MS;
        let events = vec![at(0), at(last_ms), at(last_ms + WINDOW_MS), at(u64::MAX - 200)];
        let windows = Windows::partition(&events);

        assert_eq!(window_index(u64::MAX - 200), u32::MAX);
        assert_eq!(windows.span(), MAX_WINDOWS);
        assert_eq!(windows.events(MAX_WINDOWS - 1).len(), 1);
        assert_eq!(windows.iter().map(|(_, e)| e.len()).sum::<usize>(), 2);
    }

    #[test]
    fn buckets_keep_input_order() {
        let events = vec![at(100), at(100), at(200)];
        let windows = Windows::partition(&events);
        let bucket = windows.events(0);
        assert!(std::ptr::eq(bucket[0], &events[0]));
        assert!(std::ptr::eq(bucket[1], &events[1]));
    }
}
