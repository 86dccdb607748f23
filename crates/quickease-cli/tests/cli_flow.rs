//! CLI E2E tests.
//!
//! Each test runs the built binary against its own throwaway data directory.

use std::process::Command;

use chrono::{Duration, Utc};
use quickease_core::{LocalStore, SessionState, TimerEngine, TimerSettings};
use serde_json::Value;
use tempfile::TempDir;

struct Cli {
    dir: TempDir,
}

impl Cli {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn run(&self, args: &[&str]) -> (String, String, i32) {
        let output = Command::new(env!("CARGO_BIN_EXE_quickease-cli"))
            .args(args)
            .env("QUICKEASE_DATA_DIR", self.dir.path())
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to execute CLI command");
        (
            String::from_utf8_lossy(&output.stdout).to_string(),
            String::from_utf8_lossy(&output.stderr).to_string(),
            output.status.code().unwrap_or(-1),
        )
    }

    fn ok(&self, args: &[&str]) -> String {
        let (stdout, stderr, code) = self.run(args);
        assert_eq!(code, 0, "{args:?} failed: {stderr}");
        stdout
    }

    fn json(&self, args: &[&str]) -> Value {
        serde_json::from_str(&self.ok(args)).expect("Failed to parse JSON output")
    }

    /// Every JSON document printed by one invocation, in order.
    fn json_stream(&self, args: &[&str]) -> Vec<Value> {
        serde_json::Deserializer::from_str(&self.ok(args))
            .into_iter::<Value>()
            .collect::<Result<_, _>>()
            .expect("Failed to parse JSON output")
    }

    /// Seed the cache as if a previous run had left this timer behind.
    fn seed_timer(&self, timer: TimerEngine) {
        let local = LocalStore::open_at(&self.dir.path().join("quickease.db")).unwrap();
        let state = SessionState {
            timer,
            ..SessionState::default()
        };
        local.save_session_state(&state).unwrap();
    }
}

#[test]
fn timer_walks_through_a_study_session() {
    let cli = Cli::new();

    let status = cli.json(&["timer", "status"]);
    assert_eq!(status["type"], "state_snapshot");
    assert_eq!(status["status"], "idle");
    assert_eq!(status["remaining_secs"], 1500);

    let started = cli.json(&["timer", "start"]);
    assert_eq!(started["type"], "timer_started");
    assert_eq!(started["session_kind"], "study");

    let paused = cli.json(&["timer", "pause"]);
    assert_eq!(paused["type"], "timer_paused");

    let skipped = cli.json(&["timer", "skip"]);
    assert_eq!(skipped["type"], "session_completed");
    assert_eq!(skipped["to"], "short_break");
    assert_eq!(skipped["cycle_count"], 1);

    let status = cli.json(&["timer", "status"]);
    assert_eq!(status["status"], "break_pending");
    assert_eq!(status["remaining_secs"], 300);

    let closed = cli.json(&["timer", "close-break"]);
    assert_eq!(closed["type"], "break_acknowledged");

    let reset = cli.json(&["timer", "reset"]);
    assert_eq!(reset["type"], "timer_reset");
    let status = cli.json(&["timer", "status"]);
    assert_eq!(status["cycle_count"], 0);
    assert_eq!(status["session_kind"], "study");
}

#[test]
fn watch_refuses_idle_timer() {
    let cli = Cli::new();
    let (_, stderr, code) = cli.run(&["timer", "watch"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("not running"), "stderr: {stderr}");
}

#[test]
fn config_timer_defaults_feed_fresh_state() {
    let cli = Cli::new();
    assert_eq!(cli.ok(&["config", "get", "timer.study_minutes"]).trim(), "25");
    cli.ok(&["config", "set", "timer.study_minutes", "40"]);
    assert_eq!(cli.ok(&["config", "get", "timer.study_minutes"]).trim(), "40");

    let status = cli.json(&["timer", "status"]);
    assert_eq!(status["total_secs"], 2400);

    let settings = cli.json(&["settings", "show"]);
    assert_eq!(settings["active"]["study_minutes"], 40);
    assert!(settings["pending"].is_null());
}

#[test]
fn config_rejects_bad_values() {
    let cli = Cli::new();
    let (_, stderr, code) = cli.run(&["config", "set", "timer.study_minutes", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.starts_with("error:"), "stderr: {stderr}");

    let (_, _, code) = cli.run(&["config", "get", "timer.nope"]);
    assert_eq!(code, 1);
}

#[test]
fn backend_commands_require_login() {
    let cli = Cli::new();
    assert_eq!(cli.ok(&["auth", "status"]).trim(), "not authenticated");

    let (_, stderr, code) = cli.run(&["achievements", "refresh"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("not logged in"), "stderr: {stderr}");

    let (_, _, code) = cli.run(&["settings", "set", "--study", "30"]);
    assert_eq!(code, 1);
}

#[test]
fn achievements_list_without_session() {
    let cli = Cli::new();
    let badges = cli.json(&["achievements", "list"]);
    let badges = badges.as_array().unwrap();
    assert_eq!(badges.len(), 8);
    assert_eq!(badges[0]["id"], "first-note");
    assert!(badges.iter().all(|b| b["earned"] == false));

    assert_eq!(cli.ok(&["achievements", "current"]).trim(), "no badge pending");
    assert_eq!(cli.ok(&["achievements", "ack"]).trim(), "no badge pending");
}

#[test]
fn completions_are_generated() {
    let cli = Cli::new();
    let script = cli.ok(&["completions", "bash"]);
    assert!(script.contains("quickease-cli"));
}

#[test]
fn command_after_overrun_completes_session_first() {
    let cli = Cli::new();
    let mut timer = TimerEngine::new(TimerSettings::default());
    timer.start(Utc::now() - Duration::minutes(30));
    cli.seed_timer(timer);

    let out = cli.json_stream(&["timer", "pause"]);
    assert_eq!(out.len(), 2, "output: {out:?}");
    assert_eq!(out[0]["type"], "session_completed");
    assert_eq!(out[0]["from"], "study");
    assert_eq!(out[0]["to"], "short_break");
    assert_eq!(out[0]["cycle_count"], 1);
    // Nothing left to pause, so the snapshot follows.
    assert_eq!(out[1]["type"], "state_snapshot");
    assert_eq!(out[1]["status"], "break_pending");
    assert_eq!(out[1]["break_pending"], true);

    let started = cli.json(&["timer", "start"]);
    assert_eq!(started["type"], "timer_started");
    assert_eq!(started["session_kind"], "short_break");
    assert_eq!(started["duration_secs"], 300);
}

#[test]
fn status_reports_overrun_completion() {
    let cli = Cli::new();
    let mut timer = TimerEngine::new(TimerSettings::default());
    timer.start(Utc::now() - Duration::minutes(26));
    cli.seed_timer(timer);

    let out = cli.json_stream(&["timer", "status"]);
    assert_eq!(out[0]["type"], "session_completed");
    assert_eq!(out[1]["status"], "break_pending");
}
