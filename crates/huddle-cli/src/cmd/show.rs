use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use huddle_core::db::{MatchSummary, PlayerRow};
use huddle_core::model::{ActCode, Role, SpeechEvent};
use huddle_core::store::EventSource;
use serde::Serialize;

use super::{CommandError, Context};
use crate::output::{Renderable, pretty_section, render};

/// Arguments for `huddle show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Match id.
    pub match_id: i64,
}

/// A match with its roster and full voice log.
#[derive(Debug, Serialize)]
struct MatchDetail {
    #[serde(flatten)]
    summary: MatchSummary,
    players: Vec<PlayerRow>,
    utterances: Vec<SpeechEvent>,
}

/// Seconds with one decimal, e.g. `12.3s`.
fn offset(ms: u64) -> String {
    format!("{}.{}s", ms / 1000, (ms % 1000) / 100)
}

fn write_detail(detail: &MatchDetail, w: &mut dyn Write) -> io::Result<()> {
    detail.summary.render_human(w)?;

    pretty_section(w, "roster")?;
    for player in &detail.players {
        let role = player.role.map_or("-", Role::as_str);
        writeln!(
            w,
            "{:>3}  {:<4}  {:<6}  {}",
            player.in_game_id, role, player.team, player.summoner_name
        )?;
    }

    writeln!(w)?;
    pretty_section(w, "utterances")?;
    for event in &detail.utterances {
        let role = event.role().map_or("-", Role::as_str);
        let act = event.act.map_or("-", ActCode::label);
        writeln!(w, "{:>8}  {:<4}  {:<3}  {}", offset(event.start_ms), role, act, event.text)?;
    }
    Ok(())
}

/// Print one match with its roster and every utterance in start order.
///
/// # Errors
///
/// Returns an error if the store is missing, the match is unknown, or a
/// stored row does not decode.
pub fn run_show(args: &ShowArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let summary = store
        .get_match(args.match_id)?
        .ok_or(CommandError::MatchNotFound(args.match_id))?;
    let detail = MatchDetail {
        summary,
        players: store.players(args.match_id)?,
        utterances: store.speech_events(args.match_id)?,
    };
    render(ctx.output, &detail, write_detail)
}
