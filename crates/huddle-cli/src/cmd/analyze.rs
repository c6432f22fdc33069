use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use huddle_network::{AnalysisSummary, NetworkAnalyzer};

use super::{Context, require_match};
use crate::output::{pretty_kv, pretty_section, render};

/// Arguments for `huddle analyze`.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Match id as printed by `huddle import` or `huddle matches`.
    pub match_id: i64,
}

/// Recompute and store every windowed metric record of one match.
///
/// # Errors
///
/// Returns an error if the store is missing, the match is unknown, the
/// match lock cannot be taken, or the replacement fails.
pub fn run_analyze(args: &AnalyzeArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    require_match(&store, args.match_id)?;

    let lock = ctx.lock_match(args.match_id)?;
    let mut analyzer = NetworkAnalyzer::new(store);
    let summary = analyzer.analyze_and_save_metrics(args.match_id)?;
    lock.release();

    render(ctx.output, &summary, write_summary)
}

pub fn write_summary(summary: &AnalysisSummary, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Match {} analyzed", summary.match_id))?;
    pretty_kv(w, "events", summary.events.to_string())?;
    pretty_kv(w, "windows", summary.windows.to_string())?;
    pretty_kv(w, "records", summary.records.to_string())
}
