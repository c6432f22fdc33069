//! End-to-end tests for the `huddle` binary.
//!
//! Each test imports a small synthetic match folder into an isolated temp
//! project and drives the CLI as a subprocess.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

/// Build a Command targeting the huddle binary, rooted in `root`.
fn huddle_cmd(root: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("huddle"));
    cmd.current_dir(root);
    cmd.arg("--root").arg(root);
    // Keep the user's own config out of the picture
    cmd.env("XDG_CONFIG_HOME", root.join("xdg"));
    cmd.env_remove("FORMAT");
    cmd.env("HUDDLE_LOG", "error");
    cmd
}

/// Five players; the first four speak inside window 0 as two
/// question-then-inform exchanges, the support speaks alone in window 2.
fn write_match(root: &Path) -> PathBuf {
    let dir = root.join("match-01");
    fs::create_dir_all(&dir).expect("match dir");
    fs::write(
        dir.join("info.csv"),
        "team,player_id,summoner_name,position\n\
         red,1,Zeus,TOP\n\
         red,2,Oner,JUG\n\
         red,3,Faker,MID\n\
         red,4,Gumayusi,ADC\n\
         red,5,Keria,SUP\n",
    )
    .expect("info.csv");
    fs::write(
        dir.join("da_result.csv"),
        "speaker,text,start,end,conf,act\n\
         1-zeus,where,1000.0,1500.0,0.9,1\n\
         2-oner,bot,2000.0,2500.0,0.9,0\n\
         3-faker,flash?,3000.0,3400.0,0.8,1\n\
         4-guma,down,4000.0,4300.0,0.9,0\n\
         5-keria,go,25000.0,25500.0,0.7,2\n",
    )
    .expect("da_result.csv");
    fs::write(dir.join("match_0001.txt"), "T1 vs GEN\n").expect("match code");
    dir
}

fn json_output(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("command should not crash");
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON on stdout")
}

fn import(root: &Path) -> i64 {
    let dir = write_match(root);
    let json = json_output(huddle_cmd(root).arg("import").arg(&dir).arg("--json"));
    json["match_id"].as_i64().expect("match_id")
}

// ---------------------------------------------------------------------------
// Import and analyze
// ---------------------------------------------------------------------------

#[test]
fn import_reports_match_and_analysis() {
    let tmp = TempDir::new().expect("temp dir");
    let dir = write_match(tmp.path());

    let json = json_output(huddle_cmd(tmp.path()).arg("import").arg(&dir).arg("--json"));
    assert_eq!(json["match_code"], "T1 vs GEN");
    assert_eq!(json["players"], 5);
    assert_eq!(json["utterances"], 5);
    assert_eq!(json["duration_ms"], 24_000);
    assert_eq!(json["analysis"]["windows"], 3);
    assert_eq!(json["analysis"]["records"], 18);
    assert!(tmp.path().join(".huddle/huddle.db").exists());
}

#[test]
fn import_without_analysis_has_no_records() {
    let tmp = TempDir::new().expect("temp dir");
    let dir = write_match(tmp.path());

    let json = json_output(
        huddle_cmd(tmp.path())
            .arg("import")
            .arg(&dir)
            .args(["--match-code", "scrim-7", "--no-analyze", "--json"]),
    );
    assert_eq!(json["match_code"], "scrim-7");
    assert!(json.get("analysis").is_none());
    let id = json["match_id"].as_i64().expect("id").to_string();

    let records = json_output(huddle_cmd(tmp.path()).args(["metrics", &id, "--json"]));
    assert_eq!(records, serde_json::json!([]));

    let summary = json_output(huddle_cmd(tmp.path()).args(["analyze", &id, "--json"]));
    assert_eq!(summary["records"], 18);
    assert_eq!(summary["events"], 5);
}

#[test]
fn import_of_missing_folder_fails_with_code() {
    let tmp = TempDir::new().expect("temp dir");
    huddle_cmd(tmp.path())
        .args(["import", "nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E3001"));
}

#[test]
fn reanalysis_is_idempotent() {
    let tmp = TempDir::new().expect("temp dir");
    let id = import(tmp.path()).to_string();

    let before = json_output(huddle_cmd(tmp.path()).args(["metrics", &id, "--json"]));
    huddle_cmd(tmp.path()).args(["analyze", &id]).assert().success();
    let after = json_output(huddle_cmd(tmp.path()).args(["metrics", &id, "--json"]));
    assert_eq!(before, after);
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

#[test]
fn matches_lists_newest_first() {
    let tmp = TempDir::new().expect("temp dir");
    let first = import(tmp.path());
    let second = import(tmp.path());

    let json = json_output(huddle_cmd(tmp.path()).args(["matches", "--json"]));
    let rows = json.as_array().expect("array");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["match_id"].as_i64(), Some(second));
    assert_eq!(rows[1]["match_id"].as_i64(), Some(first));
    assert_eq!(rows[0]["event_count"], 5);
}

#[test]
fn show_lists_roster_and_voice_log() {
    let tmp = TempDir::new().expect("temp dir");
    let id = import(tmp.path());

    let json = json_output(huddle_cmd(tmp.path()).args(["show", &id.to_string(), "--json"]));
    assert_eq!(json["match_id"].as_i64(), Some(id));
    assert_eq!(json["match_code"], "T1 vs GEN");

    let players = json["players"].as_array().expect("players");
    assert_eq!(players.len(), 5);
    assert_eq!(players[0]["summoner_name"], "Zeus");
    assert_eq!(players[4]["role"], "SUP");

    let utterances = json["utterances"].as_array().expect("utterances");
    assert_eq!(utterances.len(), 5);
    assert_eq!(utterances[0]["speaker"]["player_id"], 1);
    assert_eq!(utterances[0]["speaker"]["role"], "TOP");
    assert_eq!(utterances[0]["act"], 1);
    assert_eq!(utterances[0]["text"], "where");
    assert_eq!(utterances[4]["start_ms"], 24_000);

    huddle_cmd(tmp.path())
        .env("FORMAT", "pretty")
        .args(["show", &id.to_string()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Keria"));
}

#[test]
fn show_of_unknown_match_fails() {
    let tmp = TempDir::new().expect("temp dir");
    import(tmp.path());

    huddle_cmd(tmp.path())
        .args(["show", "999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2001"));
}

#[test]
fn default_metrics_are_question_then_inform() {
    let tmp = TempDir::new().expect("temp dir");
    let id = import(tmp.path()).to_string();

    let json = json_output(huddle_cmd(tmp.path()).args(["metrics", &id, "--json"]));
    let rows = json.as_array().expect("array");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["source_da"], 1);
    assert_eq!(rows[0]["target_da"], 0);
    assert_eq!(rows[0]["count"], 2);
    assert!((rows[0]["density"].as_f64().expect("density") - 0.2).abs() < 1e-9);
    assert_eq!(rows[0]["out_tally"]["TOP"], 1);
    assert_eq!(rows[0]["in_tally"]["ADC"], 1);
    assert_eq!(rows[1]["count"], 0);
    assert_eq!(rows[2]["window_index"], 2);
}

#[test]
fn live_view_counts_utterances() {
    let tmp = TempDir::new().expect("temp dir");
    let id = import(tmp.path()).to_string();

    let json = json_output(huddle_cmd(tmp.path()).args([
        "metrics",
        &id,
        "--source-da",
        "-1",
        "--target-da",
        "-1",
        "--json",
    ]));
    let counts: Vec<i64> = json
        .as_array()
        .expect("array")
        .iter()
        .map(|r| r["count"].as_i64().expect("count"))
        .collect();
    assert_eq!(counts, vec![4, 0, 1]);
}

#[test]
fn range_density_over_first_seconds() {
    let tmp = TempDir::new().expect("temp dir");
    let id = import(tmp.path()).to_string();

    let json = json_output(huddle_cmd(tmp.path()).args([
        "range", &id, "--start", "0", "--end", "3", "--json",
    ]));
    assert!((json["density"].as_f64().expect("density") - 0.3).abs() < 1e-9);

    let json = json_output(huddle_cmd(tmp.path()).args([
        "range", &id, "--start", "5", "--end", "5", "--json",
    ]));
    assert!(json["density"].as_f64().expect("density").abs() < 1e-12);

    let json = json_output(huddle_cmd(tmp.path()).args(["range", &id, "--start", "0", "--json"]));
    assert!(json["density"].as_f64().expect("density").abs() < 1e-12);
}

#[test]
fn inverted_range_is_zero_without_a_match() {
    let tmp = TempDir::new().expect("temp dir");
    import(tmp.path());

    let json = json_output(huddle_cmd(tmp.path()).args([
        "range", "999", "--start", "10", "--end", "5", "--json",
    ]));
    assert!(json["density"].as_f64().expect("density").abs() < 1e-12);

    let empty = TempDir::new().expect("temp dir");
    let json = json_output(huddle_cmd(empty.path()).args(["range", "1", "--end", "5", "--json"]));
    assert!(json["density"].as_f64().expect("density").abs() < 1e-12);
    assert!(!empty.path().join(".huddle/huddle.db").exists());
}

#[test]
fn well_formed_range_on_unknown_match_fails() {
    let tmp = TempDir::new().expect("temp dir");
    import(tmp.path());

    huddle_cmd(tmp.path())
        .args(["range", "999", "--start", "0", "--end", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2001"));
}

#[test]
fn text_output_has_headers() {
    let tmp = TempDir::new().expect("temp dir");
    let id = import(tmp.path()).to_string();

    huddle_cmd(tmp.path())
        .env("FORMAT", "text")
        .args(["metrics", &id])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("WINDOW  SOURCE  TARGET"));
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn read_before_import_is_not_initialized() {
    let tmp = TempDir::new().expect("temp dir");
    huddle_cmd(tmp.path())
        .args(["matches"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E1001]"));
}

#[test]
fn unknown_match_is_reported_as_json() {
    let tmp = TempDir::new().expect("temp dir");
    import(tmp.path());

    let output = huddle_cmd(tmp.path())
        .args(["metrics", "999", "--json"])
        .output()
        .expect("run");
    assert!(!output.status.success());
    let json: Value = serde_json::from_slice(&output.stderr).expect("JSON error");
    assert_eq!(json["error"]["error_code"], "E2001");
    assert!(output.stdout.is_empty());
}

#[test]
fn half_sentinel_pattern_is_rejected() {
    let tmp = TempDir::new().expect("temp dir");
    let id = import(tmp.path()).to_string();

    huddle_cmd(tmp.path())
        .args(["metrics", &id, "--source-da", "-1", "--target-da", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2002"));
}

#[test]
fn malformed_project_config_fails() {
    let tmp = TempDir::new().expect("temp dir");
    fs::create_dir_all(tmp.path().join(".huddle")).expect("dir");
    fs::write(tmp.path().join(".huddle/config.toml"), "storage = [").expect("config");

    huddle_cmd(tmp.path())
        .args(["matches"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1002"));
}

#[test]
fn completions_are_generated() {
    let tmp = TempDir::new().expect("temp dir");
    huddle_cmd(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("huddle"));
}
