//! Coordination metrics for one window and pattern.
//!
//! - **count**: number of edges, duplicates included
//! - **density**: distinct role pairs over [`MAX_DISTINCT_EDGES`]
//! - **centralization**: `Σ (max − degree) / ((n − 1) · edges)` over the
//!   five roles, separately for out- and in-degree

use huddle_core::model::{MetricRecord, ROLES, RoleTally, TransitionPattern};
use serde::Serialize;

use crate::edges::Edge;
use crate::graph::InteractionGraph;

/// Distinct role pairs that make a window fully dense.
pub const MAX_DISTINCT_EDGES: u32 = 10;

/// Scores of one edge set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowMetrics {
    pub count: u32,
    pub density: f64,
    pub out_centralization: f64,
    pub in_centralization: f64,
    pub out_tally: RoleTally,
    pub in_tally: RoleTally,
}

impl WindowMetrics {
    /// Attach the record key.
    #[must_use]
    pub const fn into_record(
        self,
        match_id: i64,
        window_index: u32,
        pattern: TransitionPattern,
    ) -> MetricRecord {
        MetricRecord {
            match_id,
            window_index,
            pattern,
            count: self.count,
            density: self.density,
            out_centralization: self.out_centralization,
            in_centralization: self.in_centralization,
            out_tally: self.out_tally,
            in_tally: self.in_tally,
        }
    }
}

/// Score `edges`. An empty list scores zero everywhere.
#[must_use]
pub fn compute_metrics(edges: &[Edge]) -> WindowMetrics {
    let graph = InteractionGraph::from_edges(edges);
    let out_tally = graph.out_tally();
    let in_tally = graph.in_tally();
    let hand_offs = graph.hand_offs();

    WindowMetrics {
        count: hand_offs,
        density: density(graph.distinct_pairs()),
        out_centralization: centralization(&out_tally, hand_offs),
        in_centralization: centralization(&in_tally, hand_offs),
        out_tally,
        in_tally,
    }
}

/// `distinct / 10`, unclamped.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn density(distinct: usize) -> f64 {
    distinct as f64 / f64::from(MAX_DISTINCT_EDGES)
}

/// Degree centralization of `tally` for a window with `edges` hand-offs.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn centralization(tally: &RoleTally, edges: u32) -> f64 {
    if edges == 0 {
        return 0.0;
    }
    let max = tally.max();
    let spread: u32 = tally.iter().map(|(_, degree)| max - degree).sum();
    let denominator = (ROLES.len() - 1) as f64 * f64::from(edges);
    f64::from(spread) / denominator
}
