use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use huddle_core::model::{MetricRecord, TransitionPattern};
use huddle_network::NetworkAnalyzer;

use super::{Context, PatternArgs, ratio, require_match};
use crate::output::{Renderable, pretty_kv, pretty_rule, render_list};

/// Arguments for `huddle metrics`.
#[derive(Args, Debug)]
pub struct MetricsArgs {
    /// Match id.
    pub match_id: i64,

    #[command(flatten)]
    pub pattern: PatternArgs,
}

/// Default pattern when none is given: question followed by inform.
pub const DEFAULT_PATTERN: TransitionPattern = TransitionPattern::acts(1, 0);

fn window_span(index: u32) -> String {
    let start = u64::from(index) * 10;
    format!("{start}s-{}s", start + 10)
}

impl Renderable for MetricRecord {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "window {} ({}) {}", self.window_index, window_span(self.window_index), self.pattern)?;
        pretty_kv(w, "count", self.count.to_string())?;
        pretty_kv(w, "density", ratio(self.density))?;
        pretty_kv(w, "out-central", ratio(self.out_centralization))?;
        pretty_kv(w, "in-central", ratio(self.in_centralization))?;
        pretty_kv(w, "out", self.out_tally.to_string())?;
        pretty_kv(w, "in", self.in_tally.to_string())?;
        pretty_rule(w)
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer(&mut *w, self)?;
        writeln!(w)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        let (source_da, target_da) = self.pattern.codes();
        writeln!(
            w,
            "{}  {}  {}  {}  {}  {}  {}  {}  {}",
            self.window_index,
            source_da,
            target_da,
            self.count,
            ratio(self.density),
            ratio(self.out_centralization),
            ratio(self.in_centralization),
            self.out_tally,
            self.in_tally
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &[
            "WINDOW", "SOURCE", "TARGET", "COUNT", "DENSITY", "OUT_C", "IN_C", "OUT", "IN",
        ]
    }
}

/// Print the per-window records of one pattern.
///
/// Catalogue patterns read the stored batch output; `--source-da -1
/// --target-da -1` computes the live all-utterance view instead.
///
/// # Errors
///
/// Returns an error if the pattern is malformed, the store is missing, the
/// match is unknown, or a stored record fails to decode.
pub fn run_metrics(args: &MetricsArgs, ctx: &Context) -> Result<()> {
    let pattern = args.pattern.resolve(DEFAULT_PATTERN)?;
    let store = ctx.open_store()?;
    require_match(&store, args.match_id)?;

    let analyzer = NetworkAnalyzer::new(store);
    let records = analyzer.metrics_for_pattern(args.match_id, pattern)?;
    if records.is_empty() && !ctx.output.is_json() {
        println!("no {pattern} records for match {}", args.match_id);
        return Ok(());
    }
    render_list(&records, ctx.output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use huddle_core::model::RoleTally;

    #[test]
    fn table_row_matches_headers() {
        let record = MetricRecord {
            match_id: 1,
            window_index: 2,
            pattern: DEFAULT_PATTERN,
            count: 3,
            density: 0.2,
            out_centralization: 0.25,
            in_centralization: 0.0,
            out_tally: RoleTally::new(),
            in_tally: RoleTally::new(),
        };
        let mut buf = Vec::new();
        record.render_table(&mut buf).expect("row");
        let row = String::from_utf8(buf).expect("utf8");
        assert_eq!(
            row.split_whitespace().count(),
            MetricRecord::table_headers().len()
        );
        assert!(row.starts_with("2  1  0  3  0.200  0.250  0.000"));
    }

    #[test]
    fn window_span_is_ten_seconds() {
        assert_eq!(window_span(0), "0s-10s");
        assert_eq!(window_span(3), "30s-40s");
    }
}
