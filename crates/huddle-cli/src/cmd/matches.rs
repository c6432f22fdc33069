use std::io::{self, Write};

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use huddle_core::db::MatchSummary;

use super::Context;
use crate::output::{Renderable, pretty_kv, pretty_rule, render_list};

/// Arguments for `huddle matches`.
#[derive(Args, Debug, Default)]
pub struct MatchesArgs {}

fn imported_at(us: i64) -> String {
    DateTime::<Utc>::from_timestamp_micros(us)
        .map_or_else(|| us.to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string())
}

fn minutes(duration_ms: u64) -> String {
    let secs = duration_ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

impl Renderable for MatchSummary {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "#{} {}", self.match_id, self.match_code)?;
        pretty_kv(w, "duration", minutes(self.duration_ms))?;
        pretty_kv(w, "players", self.player_count.to_string())?;
        pretty_kv(w, "utterances", self.event_count.to_string())?;
        pretty_kv(w, "imported", imported_at(self.imported_at_us))?;
        pretty_rule(w)
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer(&mut *w, self)?;
        writeln!(w)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}  {}  {}  {}  {}",
            self.match_id,
            self.duration_ms,
            self.player_count,
            self.event_count,
            self.match_code
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "DURATION_MS", "PLAYERS", "UTTERANCES", "CODE"]
    }
}

/// List imported matches, newest first.
///
/// # Errors
///
/// Returns an error if the store is missing or cannot be read.
pub fn run_matches(_args: &MatchesArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let matches = store.list_matches()?;
    if matches.is_empty() && !ctx.output.is_json() {
        println!("no matches imported");
        return Ok(());
    }
    render_list(&matches, ctx.output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_formats_as_minutes() {
        assert_eq!(minutes(0), "0:00");
        assert_eq!(minutes(9_999), "0:09");
        assert_eq!(minutes(125_000), "2:05");
    }

    #[test]
    fn import_time_is_utc() {
        assert_eq!(imported_at(0), "1970-01-01 00:00:00");
    }
}
