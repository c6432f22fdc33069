//! Query and write helpers for the store database.
//!
//! All functions take a `Connection` and return `anyhow::Result<T>` with
//! typed structs (never raw rows). Writes that touch more than one row run
//! inside a single transaction.

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use std::str::FromStr;

use crate::error::ErrorCode;
use crate::import::ParsedMatch;
use crate::model::{ActCode, MetricRecord, Role, RoleTally, Speaker, SpeechEvent, TransitionPattern};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// One imported match with its headline numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub match_id: i64,
    pub match_code: String,
    pub duration_ms: u64,
    pub imported_at_us: i64,
    pub player_count: u64,
    pub event_count: u64,
}

/// A store write that did not commit. The enclosing transaction has rolled
/// back by the time this is returned.
#[derive(Debug, thiserror::Error)]
#[error("{op}")]
pub struct StoreWriteError {
    op: String,
    #[source]
    source: rusqlite::Error,
}

impl StoreWriteError {
    fn new(op: impl Into<String>, source: rusqlite::Error) -> Self {
        Self {
            op: op.into(),
            source,
        }
    }

    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::StoreWriteFailed
    }
}

fn write_failed(op: &'static str) -> impl FnOnce(rusqlite::Error) -> StoreWriteError {
    move |source| StoreWriteError::new(op, source)
}

/// One roster entry of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerRow {
    pub in_game_id: i64,
    pub team: String,
    pub summoner_name: String,
    /// `None` for a roster entry whose position did not map to a role.
    pub role: Option<Role>,
}

struct MetricRow {
    record_id: i64,
    window_index: i64,
    source_da: i64,
    target_da: i64,
    count: i64,
    density: f64,
    out_centralization: f64,
    in_centralization: f64,
    out_tally: String,
    in_tally: String,
}

// ---------------------------------------------------------------------------
// Matches
// ---------------------------------------------------------------------------

/// Insert a parsed match (row, players and speech events) in one
/// transaction and return its new id.
///
/// # Errors
///
/// Returns an error if any insert fails; nothing is written in that case.
pub fn insert_match(conn: &mut Connection, parsed: &ParsedMatch) -> Result<i64> {
    let tx = conn.transaction().map_err(write_failed("begin import transaction"))?;
    let now_us = chrono::Utc::now().timestamp_micros();

    tx.execute(
        "INSERT INTO matches (match_code, duration_ms, imported_at_us) VALUES (?1, ?2, ?3)",
        params![parsed.match_code, to_sql_ms(parsed.duration_ms)?, now_us],
    )
    .map_err(write_failed("insert match row"))?;
    let match_id = tx.last_insert_rowid();

    {
        let mut player_stmt = tx
            .prepare(
                "INSERT INTO players (match_id, in_game_id, team, summoner_name, role) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .map_err(write_failed("prepare player insert"))?;
        for player in &parsed.players {
            player_stmt
                .execute(params![
                    match_id,
                    player.in_game_id,
                    player.team,
                    player.summoner_name,
                    player.role.map(Role::as_str),
                ])
                .map_err(|e| StoreWriteError::new(format!("insert player {}", player.in_game_id), e))?;
        }

        let mut event_stmt = tx
            .prepare(
                "INSERT INTO speech_events \
                 (match_id, seq, in_game_id, act_code, start_ms, end_ms, text) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .map_err(write_failed("prepare speech event insert"))?;
        for (seq, utterance) in parsed.utterances.iter().enumerate() {
            let seq = i64::try_from(seq).context("speech event sequence overflow")?;
            event_stmt
                .execute(params![
                    match_id,
                    seq,
                    utterance.in_game_id,
                    utterance.act.map(|a| i64::from(a.0)),
                    to_sql_ms(utterance.start_ms)?,
                    to_sql_ms(utterance.end_ms)?,
                    utterance.text,
                ])
                .map_err(|e| StoreWriteError::new(format!("insert speech event {seq}"), e))?;
        }
    }

    tx.commit().map_err(write_failed("commit import transaction"))?;
    Ok(match_id)
}

/// Check whether a match exists.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn match_exists(conn: &Connection, match_id: i64) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM matches WHERE match_id = ?1)",
        params![match_id],
        |row| row.get(0),
    )
    .context("check match_exists")
}

/// Fetch one match summary by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_match(conn: &Connection, match_id: i64) -> Result<Option<MatchSummary>> {
    let sql = format!("{MATCH_SUMMARY_SELECT} WHERE m.match_id = ?1");
    conn.query_row(&sql, params![match_id], row_to_match_summary)
        .optional()
        .with_context(|| format!("get_match for {match_id}"))
}

/// All matches, newest import first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_matches(conn: &Connection) -> Result<Vec<MatchSummary>> {
    let sql = format!("{MATCH_SUMMARY_SELECT} ORDER BY m.match_id DESC");
    let mut stmt = conn.prepare(&sql).context("prepare list_matches")?;
    let rows = stmt
        .query_map([], row_to_match_summary)
        .context("execute list_matches")?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("read list_matches rows")
}

/// Roster of a match ordered by in-game id.
///
/// # Errors
///
/// Returns an error if the query fails or a stored role does not parse.
pub fn load_players(conn: &Connection, match_id: i64) -> Result<Vec<PlayerRow>> {
    let mut stmt = conn
        .prepare(
            "SELECT in_game_id, team, summoner_name, role FROM players \
             WHERE match_id = ?1 ORDER BY in_game_id",
        )
        .context("prepare load_players")?;
    let rows = stmt
        .query_map(params![match_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })
        .context("execute load_players")?;

    let mut players = Vec::new();
    for row in rows {
        let (in_game_id, team, summoner_name, role) = row.context("read player row")?;
        let role = role
            .map(|r| Role::from_str(&r))
            .transpose()
            .with_context(|| format!("decode role of player {in_game_id}"))?;
        players.push(PlayerRow {
            in_game_id,
            team,
            summoner_name,
            role,
        });
    }
    Ok(players)
}

// ---------------------------------------------------------------------------
// Speech events
// ---------------------------------------------------------------------------

/// Load a match's speech events ordered by start time, resolving each
/// event's speaker through the `players` table. Events whose player is
/// missing or has no role come back unattributed.
///
/// # Errors
///
/// Returns an error if the query fails or a stored role does not parse.
pub fn load_speech_events(conn: &Connection, match_id: i64) -> Result<Vec<SpeechEvent>> {
    let mut stmt = conn
        .prepare(
            "SELECT e.in_game_id, p.role, e.act_code, e.start_ms, e.end_ms, e.text \
             FROM speech_events e \
             LEFT JOIN players p ON p.match_id = e.match_id AND p.in_game_id = e.in_game_id \
             WHERE e.match_id = ?1 \
             ORDER BY e.start_ms ASC, e.seq ASC",
        )
        .context("prepare load_speech_events")?;

    let rows = stmt
        .query_map(params![match_id], |row| {
            Ok((
                row.get::<_, Option<i64>>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<i64>>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, String>(5)?,
            ))
        })
        .context("execute load_speech_events")?;

    let mut events = Vec::new();
    for row in rows {
        let (in_game_id, role, act_code, start_ms, end_ms, text) =
            row.context("read speech event row")?;
        let speaker = match (in_game_id, role) {
            (Some(player_id), Some(role)) => {
                let role = Role::from_str(&role)
                    .with_context(|| format!("decode role of player {player_id}"))?;
                Some(Speaker::new(player_id, role))
            }
            _ => None,
        };
        events.push(
            SpeechEvent::new(
                speaker,
                act_code.and_then(ActCode::from_raw),
                from_sql_ms(start_ms),
                from_sql_ms(end_ms),
            )
            .with_text(text),
        );
    }
    Ok(events)
}

// ---------------------------------------------------------------------------
// Metric records
// ---------------------------------------------------------------------------

/// Replace every metric record of `match_id` with `records`: one
/// transaction that deletes the old set and inserts the new one. On any
/// failure the transaction rolls back and the previous set stays.
///
/// # Errors
///
/// Returns an error if the delete or any insert fails.
pub fn replace_metric_records(
    conn: &mut Connection,
    match_id: i64,
    records: &[MetricRecord],
) -> Result<()> {
    let tx = conn.transaction().map_err(write_failed("begin metric replace"))?;

    let removed = tx
        .execute("DELETE FROM metric_records WHERE match_id = ?1", params![match_id])
        .map_err(|e| StoreWriteError::new(format!("delete metric records of match {match_id}"), e))?;

    {
        let mut stmt = tx
            .prepare(
                "INSERT INTO metric_records \
                 (match_id, window_index, source_da, target_da, count, density, \
                  out_centralization, in_centralization, out_tally, in_tally) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )
            .map_err(write_failed("prepare metric insert"))?;
        for record in records {
            let (source_da, target_da) = record.pattern.codes();
            stmt.execute(params![
                match_id,
                record.window_index,
                source_da,
                target_da,
                record.count,
                record.density,
                record.out_centralization,
                record.in_centralization,
                record.out_tally.to_string(),
                record.in_tally.to_string(),
            ])
            .map_err(|e| {
                StoreWriteError::new(
                    format!(
                        "insert metric record for window {} pattern {}",
                        record.window_index, record.pattern
                    ),
                    e,
                )
            })?;
        }
    }

    tx.commit().map_err(write_failed("commit metric replace"))?;
    tracing::debug!(match_id, removed, inserted = records.len(), "metric records replaced");
    Ok(())
}

/// Load stored metric records of `match_id`, optionally restricted to one
/// pattern, ordered by window index and then insertion order.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row does not decode.
pub fn load_metric_records(
    conn: &Connection,
    match_id: i64,
    pattern: Option<TransitionPattern>,
) -> Result<Vec<MetricRecord>> {
    let base = "SELECT record_id, window_index, source_da, target_da, count, density, \
                out_centralization, in_centralization, out_tally, in_tally \
                FROM metric_records WHERE match_id = ?1";

    let rows: Vec<MetricRow> = if let Some(pattern) = pattern {
        let (source_da, target_da) = pattern.codes();
        let sql = format!(
            "{base} AND source_da = ?2 AND target_da = ?3 ORDER BY window_index, record_id"
        );
        let mut stmt = conn.prepare(&sql).context("prepare load_metric_records")?;
        let rows = stmt
            .query_map(params![match_id, source_da, target_da], row_to_metric_row)
            .context("execute load_metric_records")?;
        rows.collect::<rusqlite::Result<_>>()
            .context("read metric rows")?
    } else {
        let sql = format!("{base} ORDER BY window_index, record_id");
        let mut stmt = conn.prepare(&sql).context("prepare load_metric_records")?;
        let rows = stmt
            .query_map(params![match_id], row_to_metric_row)
            .context("execute load_metric_records")?;
        rows.collect::<rusqlite::Result<_>>()
            .context("read metric rows")?
    };

    rows.into_iter()
        .map(|row| decode_metric_row(match_id, row))
        .collect()
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

const MATCH_SUMMARY_SELECT: &str = "SELECT m.match_id, m.match_code, m.duration_ms, \
     m.imported_at_us, \
     (SELECT COUNT(*) FROM players p WHERE p.match_id = m.match_id), \
     (SELECT COUNT(*) FROM speech_events e WHERE e.match_id = m.match_id) \
     FROM matches m";

fn row_to_match_summary(row: &rusqlite::Row<'_>) -> rusqlite::Result<MatchSummary> {
    Ok(MatchSummary {
        match_id: row.get(0)?,
        match_code: row.get(1)?,
        duration_ms: from_sql_ms(row.get(2)?),
        imported_at_us: row.get(3)?,
        player_count: u64::try_from(row.get::<_, i64>(4)?).unwrap_or(0),
        event_count: u64::try_from(row.get::<_, i64>(5)?).unwrap_or(0),
    })
}

fn row_to_metric_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MetricRow> {
    Ok(MetricRow {
        record_id: row.get(0)?,
        window_index: row.get(1)?,
        source_da: row.get(2)?,
        target_da: row.get(3)?,
        count: row.get(4)?,
        density: row.get(5)?,
        out_centralization: row.get(6)?,
        in_centralization: row.get(7)?,
        out_tally: row.get(8)?,
        in_tally: row.get(9)?,
    })
}

fn decode_metric_row(match_id: i64, row: MetricRow) -> Result<MetricRecord> {
    let id = row.record_id;
    let window_index = u32::try_from(row.window_index)
        .with_context(|| format!("window index of metric record {id}"))?;
    let source_da =
        i32::try_from(row.source_da).with_context(|| format!("source_da of metric record {id}"))?;
    let target_da =
        i32::try_from(row.target_da).with_context(|| format!("target_da of metric record {id}"))?;
    let pattern = TransitionPattern::from_codes(source_da, target_da)
        .with_context(|| format!("pattern of metric record {id}"))?;
    let count =
        u32::try_from(row.count).with_context(|| format!("count of metric record {id}"))?;
    let out_tally = RoleTally::from_str(&row.out_tally)
        .with_context(|| format!("out_tally of metric record {id}"))?;
    let in_tally = RoleTally::from_str(&row.in_tally)
        .with_context(|| format!("in_tally of metric record {id}"))?;

    Ok(MetricRecord {
        match_id,
        window_index,
        pattern,
        count,
        density: row.density,
        out_centralization: row.out_centralization,
        in_centralization: row.in_centralization,
        out_tally,
        in_tally,
    })
}

fn to_sql_ms(ms: u64) -> Result<i64> {
    i64::try_from(ms).with_context(|| format!("time {ms}ms out of range"))
}

fn from_sql_ms(ms: i64) -> u64 {
    u64::try_from(ms).unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
