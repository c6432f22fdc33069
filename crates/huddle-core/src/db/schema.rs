//! Canonical SQLite schema for huddle.
//!
//! - `matches` holds one row per imported match
//! - `players` maps a match's in-game player ids to their role
//! - `speech_events` is the immutable voice log, ordered by `seq`
//! - `metric_records` holds the batch analyzer's output, replaced wholesale
//!   per match
//! - `store_meta` tracks the schema version

/// Migration v1: core tables plus store metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS matches (
    match_id INTEGER PRIMARY KEY AUTOINCREMENT,
    match_code TEXT NOT NULL,
    duration_ms INTEGER NOT NULL DEFAULT 0 CHECK (duration_ms >= 0),
    imported_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS players (
    match_id INTEGER NOT NULL REFERENCES matches(match_id) ON DELETE CASCADE,
    in_game_id INTEGER NOT NULL,
    team TEXT NOT NULL DEFAULT '',
    summoner_name TEXT NOT NULL DEFAULT '',
    role TEXT CHECK (role IS NULL OR role IN ('TOP', 'JUG', 'MID', 'ADC', 'SUP')),
    PRIMARY KEY (match_id, in_game_id)
);

CREATE TABLE IF NOT EXISTS speech_events (
    match_id INTEGER NOT NULL REFERENCES matches(match_id) ON DELETE CASCADE,
    seq INTEGER NOT NULL CHECK (seq >= 0),
    in_game_id INTEGER,
    act_code INTEGER CHECK (act_code IS NULL OR act_code BETWEEN 0 AND 255),
    start_ms INTEGER NOT NULL CHECK (start_ms >= 0),
    end_ms INTEGER NOT NULL CHECK (end_ms >= 0),
    text TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (match_id, seq)
);

CREATE TABLE IF NOT EXISTS metric_records (
    record_id INTEGER PRIMARY KEY AUTOINCREMENT,
    match_id INTEGER NOT NULL REFERENCES matches(match_id) ON DELETE CASCADE,
    window_index INTEGER NOT NULL CHECK (window_index >= 0),
    source_da INTEGER NOT NULL,
    target_da INTEGER NOT NULL,
    count INTEGER NOT NULL CHECK (count >= 0),
    density REAL NOT NULL,
    out_centralization REAL NOT NULL,
    in_centralization REAL NOT NULL,
    out_tally TEXT NOT NULL,
    in_tally TEXT NOT NULL,
    UNIQUE (match_id, window_index, source_da, target_da)
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL
);

INSERT OR IGNORE INTO store_meta (id, schema_version) VALUES (1, 1);
";

/// Migration v2: read-path indexes.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_speech_events_match_start
    ON speech_events(match_id, start_ms, seq);

CREATE INDEX IF NOT EXISTS idx_metric_records_match_window
    ON metric_records(match_id, window_index);

CREATE INDEX IF NOT EXISTS idx_metric_records_match_pattern
    ON metric_records(match_id, source_da, target_da, window_index);
";

/// Indexes the latest schema must contain.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_speech_events_match_start",
    "idx_metric_records_match_window",
    "idx_metric_records_match_pattern",
];
