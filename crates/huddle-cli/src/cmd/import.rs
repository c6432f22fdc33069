use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use huddle_core::import::{ImportOptions, parse_match_dir};
use huddle_network::{AnalysisSummary, NetworkAnalyzer};
use serde::Serialize;
use tracing::info;

use super::Context;
use crate::output::{pretty_kv, pretty_section, render};

/// Arguments for `huddle import`.
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Match folder holding `info.csv` and `da_result.csv`.
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Match code to record; overrides any `match_*.txt` in the folder.
    #[arg(long)]
    pub match_code: Option<String>,

    /// Skip the metric pass after import.
    #[arg(long)]
    pub no_analyze: bool,
}

#[derive(Debug, Serialize)]
struct ImportReport {
    match_id: i64,
    match_code: String,
    players: usize,
    utterances: usize,
    duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis: Option<AnalysisSummary>,
}

/// Import one match folder into the store and, unless disabled, compute
/// its metric records.
///
/// # Errors
///
/// Returns an error if the folder cannot be parsed, the store cannot be
/// opened or written, or the follow-up analysis fails. A failed analysis
/// leaves the imported match in place.
pub fn run_import(args: &ImportArgs, ctx: &Context) -> Result<()> {
    let options = ImportOptions {
        match_code: args.match_code.clone(),
        asr_text: ctx.config.import.asr_text,
    };
    let parsed = parse_match_dir(&args.dir, &options)
        .with_context(|| format!("import {}", args.dir.display()))?;

    let mut store = ctx.open_or_create_store()?;
    let match_id = store.insert_match(&parsed)?;
    info!(match_id, code = %parsed.match_code, "match imported");

    let analysis = if ctx.config.import.analyze_after_import && !args.no_analyze {
        let lock = ctx.lock_match(match_id)?;
        let mut analyzer = NetworkAnalyzer::new(store);
        let summary = analyzer
            .analyze_and_save_metrics(match_id)
            .with_context(|| format!("analyze imported match {match_id}"))?;
        lock.release();
        Some(summary)
    } else {
        None
    };

    let report = ImportReport {
        match_id,
        match_code: parsed.match_code,
        players: parsed.players.len(),
        utterances: parsed.utterances.len(),
        duration_ms: parsed.duration_ms,
        analysis,
    };
    render(ctx.output, &report, write_report)
}

fn write_report(report: &ImportReport, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Imported match {} ({})", report.match_id, report.match_code))?;
    pretty_kv(w, "players", report.players.to_string())?;
    pretty_kv(w, "utterances", report.utterances.to_string())?;
    pretty_kv(w, "duration", format!("{} ms", report.duration_ms))?;
    match &report.analysis {
        Some(summary) => {
            pretty_kv(w, "windows", summary.windows.to_string())?;
            pretty_kv(w, "records", summary.records.to_string())
        }
        None => pretty_kv(w, "analysis", "skipped"),
    }
}
