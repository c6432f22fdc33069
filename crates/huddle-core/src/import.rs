//! Match directory importer.
//!
//! A match directory holds the transcription pipeline's output:
//!
//! - `info.csv`: `team, player_id, summoner_name, position`
//! - `da_result.csv`: `speaker, text, start, end, _, act` where `speaker`
//!   looks like `3-go_ni`
//! - `asr_result_kor.csv` (optional): column 1 replaces the utterance text,
//!   paired with `da_result.csv` by row index
//! - `match_*.txt` (optional): first line is the match code
//!
//! Raw times are milliseconds on the recording clock. They are shifted so
//! the earliest real utterance starts at zero.

use std::{
    fs,
    io,
    path::{Path, PathBuf},
    str::FromStr,
};

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, warn};

use crate::error::ErrorCode;
use crate::model::{ActCode, Role};

pub const INFO_FILE: &str = "info.csv";
pub const DIALOGUE_ACT_FILE: &str = "da_result.csv";
pub const TRANSCRIPT_FILE: &str = "asr_result_kor.csv";
pub const DEFAULT_MATCH_CODE: &str = "Unknown Match";

/// Starts at or below this many ms are treated as unset when picking the
/// time origin.
const ORIGIN_FLOOR_MS: f64 = 0.1;

/// Latest normalized start an utterance may have. Later rows are dropped so
/// one corrupt timestamp cannot stretch the match over millions of windows.
pub const MAX_MATCH_MS: u64 = 24 * 60 * 60 * 1000;

/// Errors that abort an import. Individual bad rows are skipped instead.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("match directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),
    #[error("required file missing: {}", .0.display())]
    MissingFile(PathBuf),
    #[error("failed to read {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ImportError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::ImportFailed
    }
}

/// Importer switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    /// Overrides the code found in `match_*.txt`.
    pub match_code: Option<String>,
    /// Read utterance text from `asr_result_kor.csv` when it exists.
    pub asr_text: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            match_code: None,
            asr_text: true,
        }
    }
}

/// One row of `info.csv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerInfo {
    pub in_game_id: i64,
    pub team: String,
    pub summoner_name: String,
    /// `None` when the position is not one of the five roles.
    pub role: Option<Role>,
}

/// One utterance with normalized times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub in_game_id: Option<i64>,
    pub act: Option<ActCode>,
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

/// A fully parsed match directory, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMatch {
    pub match_code: String,
    pub duration_ms: u64,
    pub players: Vec<PlayerInfo>,
    /// Sorted ascending by `start_ms`.
    pub utterances: Vec<Utterance>,
}

struct RawUtterance {
    in_game_id: Option<i64>,
    act: Option<ActCode>,
    start: f64,
    end: f64,
    text: String,
}

/// Parse a match directory.
///
/// # Errors
///
/// Returns [`ImportError`] when the directory or a required file is missing
/// or a CSV file cannot be read at all.
#[tracing::instrument(skip(options))]
pub fn parse_match_dir(dir: &Path, options: &ImportOptions) -> Result<ParsedMatch, ImportError> {
    if !dir.is_dir() {
        return Err(ImportError::MissingDirectory(dir.to_path_buf()));
    }

    let players = parse_players(&read_rows(&required(dir, INFO_FILE)?)?);

    let da_rows = read_rows(&required(dir, DIALOGUE_ACT_FILE)?)?;
    let transcript_path = dir.join(TRANSCRIPT_FILE);
    let transcript = if options.asr_text && transcript_path.is_file() {
        Some(read_rows(&transcript_path)?)
    } else {
        None
    };

    let raw = parse_utterances(&da_rows, transcript.as_deref());
    let (duration_ms, utterances) = normalize_times(raw);

    let match_code = match &options.match_code {
        Some(code) if !code.trim().is_empty() => code.trim().to_string(),
        _ => read_match_code(dir)?.unwrap_or_else(|| DEFAULT_MATCH_CODE.to_string()),
    };

    debug!(
        players = players.len(),
        utterances = utterances.len(),
        duration_ms,
        "parsed match directory"
    );

    Ok(ParsedMatch {
        match_code,
        duration_ms,
        players,
        utterances,
    })
}

/// Player id encoded in a speaker field: digits before the first `-`, or
/// every digit of the field when there is no dash.
#[must_use]
pub fn speaker_id(field: &str) -> Option<i64> {
    let field = field.trim();
    if let Some((head, _)) = field.split_once('-') {
        return head.trim().parse().ok();
    }
    let digits: String = field.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

fn required(dir: &Path, name: &str) -> Result<PathBuf, ImportError> {
    let path = dir.join(name);
    if path.is_file() {
        Ok(path)
    } else {
        Err(ImportError::MissingFile(path))
    }
}

fn read_rows(path: &Path) -> Result<Vec<StringRecord>, ImportError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(|source| ImportError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| ImportError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

fn parse_players(rows: &[StringRecord]) -> Vec<PlayerInfo> {
    let mut players: Vec<PlayerInfo> = Vec::with_capacity(rows.len());
    for (line, row) in rows.iter().enumerate() {
        let Some(in_game_id) = row.get(1).and_then(|id| id.parse::<i64>().ok()) else {
            warn!(file = INFO_FILE, line, "skipping player row without a numeric id");
            continue;
        };
        if players.iter().any(|p| p.in_game_id == in_game_id) {
            warn!(file = INFO_FILE, line, in_game_id, "skipping duplicate player row");
            continue;
        }

        let position = row.get(3).unwrap_or_default();
        let role = Role::from_str(position).ok();
        if role.is_none() {
            warn!(file = INFO_FILE, line, in_game_id, position, "unknown position, speech will be unattributed");
        }

        players.push(PlayerInfo {
            in_game_id,
            team: row.get(0).unwrap_or_default().to_string(),
            summoner_name: row.get(2).unwrap_or_default().to_string(),
            role,
        });
    }
    players
}

fn parse_utterances(
    da_rows: &[StringRecord],
    transcript: Option<&[StringRecord]>,
) -> Vec<RawUtterance> {
    let paired = transcript.map_or(da_rows.len(), |t| t.len().min(da_rows.len()));
    if paired < da_rows.len() {
        warn!(
            da_rows = da_rows.len(),
            transcript_rows = paired,
            "transcript shorter than dialogue-act file, extra rows dropped"
        );
    }

    let mut raw = Vec::with_capacity(paired);
    for (line, row) in da_rows.iter().take(paired).enumerate() {
        let times = row
            .get(2)
            .and_then(|s| s.parse::<f64>().ok())
            .zip(row.get(3).and_then(|s| s.parse::<f64>().ok()));
        let Some((start, end)) = times.filter(|(s, e)| s.is_finite() && e.is_finite()) else {
            warn!(file = DIALOGUE_ACT_FILE, line, "skipping utterance with unreadable times");
            continue;
        };

        let Some(act_code) = row.get(5).and_then(|s| s.parse::<i64>().ok()) else {
            warn!(file = DIALOGUE_ACT_FILE, line, "skipping utterance with unreadable dialogue act");
            continue;
        };

        let text = transcript
            .and_then(|t| t.get(line))
            .and_then(|r| r.get(1))
            .or_else(|| row.get(1))
            .unwrap_or_default()
            .replace('"', "");

        raw.push(RawUtterance {
            in_game_id: row.get(0).and_then(speaker_id),
            act: ActCode::from_raw(act_code),
            start,
            end,
            text,
        });
    }
    raw
}

/// Shift every time so the earliest start above [`ORIGIN_FLOOR_MS`] becomes
/// zero and return `(duration_ms, utterances)` sorted by start. Utterances
/// starting after [`MAX_MATCH_MS`] are dropped.
fn normalize_times(raw: Vec<RawUtterance>) -> (u64, Vec<Utterance>) {
    let origin = raw
        .iter()
        .map(|u| u.start)
        .filter(|&t| t > ORIGIN_FLOOR_MS)
        .reduce(f64::min)
        .or_else(|| raw.first().map(|u| u.start))
        .unwrap_or(0.0);

    let mut utterances: Vec<Utterance> = raw
        .into_iter()
        .map(|u| Utterance {
            in_game_id: u.in_game_id,
            act: u.act,
            start_ms: whole_ms(u.start - origin),
            end_ms: whole_ms(u.end - origin),
            text: u.text,
        })
        .collect();
    let before = utterances.len();
    utterances.retain(|u| u.start_ms <= MAX_MATCH_MS);
    if utterances.len() < before {
        warn!(
            dropped = before - utterances.len(),
            max_ms = MAX_MATCH_MS,
            "skipping utterances that start too late"
        );
    }
    utterances.sort_by_key(|u| u.start_ms);
    let duration_ms = utterances.last().map_or(0, |u| u.start_ms);
    (duration_ms, utterances)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_ms(value: f64) -> u64 {
    value.max(0.0).trunc() as u64
}

fn read_match_code(dir: &Path) -> Result<Option<String>, ImportError> {
    let entries = fs::read_dir(dir).map_err(|source| ImportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path.file_name().and_then(|n| n.to_str()).is_some_and(|name| {
                    let name = name.to_ascii_lowercase();
                    name.starts_with("match_") && name.ends_with(".txt")
                })
        })
        .collect();
    candidates.sort();

    let Some(path) = candidates.first() else {
        return Ok(None);
    };
    let contents = fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(contents
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string))
}
