#![forbid(unsafe_code)]
//! huddle-network library.
//!
//! Conversational network metrics over a match's voice log: windowing,
//! turn-taking edge extraction, and density/centralization scoring on a
//! fixed five-role interaction graph.
//!
//! # Conventions
//!
//! - **Errors**: Use `anyhow::Result` for return types.
//! - **Logging**: Use `tracing` macros (`info!`, `debug!`).

pub mod analyzer;
pub mod edges;
pub mod graph;
pub mod metrics;
pub mod window;

pub use analyzer::{AnalysisSummary, NetworkAnalyzer};
pub use edges::Edge;
pub use metrics::{WindowMetrics, compute_metrics};
