use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use huddle_core::model::TransitionPattern;
use huddle_network::NetworkAnalyzer;
use huddle_network::analyzer::valid_range;
use serde::Serialize;

use super::{Context, PatternArgs, ratio, require_match};
use crate::output::render;

/// Arguments for `huddle range`.
#[derive(Args, Debug)]
pub struct RangeArgs {
    /// Match id.
    pub match_id: i64,

    /// Range start in whole seconds from the match origin (inclusive).
    #[arg(long, allow_negative_numbers = true)]
    pub start: Option<i64>,

    /// Range end in whole seconds from the match origin (inclusive).
    #[arg(long, allow_negative_numbers = true)]
    pub end: Option<i64>,

    #[command(flatten)]
    pub pattern: PatternArgs,
}

#[derive(Debug, Serialize)]
struct RangeReport {
    match_id: i64,
    start: Option<i64>,
    end: Option<i64>,
    #[serde(flatten)]
    pattern: TransitionPattern,
    density: f64,
}

/// Print the clamped interaction density over an arbitrary time range.
///
/// Without a pattern every transition counts.
///
/// # Errors
///
/// Returns an error if the pattern is malformed, or, for a well-formed
/// range, if the store is missing or the match is unknown.
pub fn run_range(args: &RangeArgs, ctx: &Context) -> Result<()> {
    let pattern = args.pattern.resolve(TransitionPattern::Any)?;
    let density = if valid_range(args.start, args.end).is_some() {
        let store = ctx.open_store()?;
        require_match(&store, args.match_id)?;
        NetworkAnalyzer::new(store).calculate_range_density(
            args.match_id,
            args.start,
            args.end,
            pattern,
        )?
    } else {
        // A missing bound or inverted range scores zero without reading the store
        0.0
    };

    let report = RangeReport {
        match_id: args.match_id,
        start: args.start,
        end: args.end,
        pattern,
        density,
    };
    render(ctx.output, &report, write_report)
}

fn write_report(report: &RangeReport, w: &mut dyn Write) -> io::Result<()> {
    let bound = |b: Option<i64>| b.map_or_else(|| "-".to_string(), |v| v.to_string());
    writeln!(
        w,
        "match {} [{}s, {}s] {}: density {}",
        report.match_id,
        bound(report.start),
        bound(report.end),
        report.pattern,
        ratio(report.density)
    )
}
